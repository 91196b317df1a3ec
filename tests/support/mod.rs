// ABOUTME: In-memory fake host implementing RemoteExecutor for tests.
// ABOUTME: Interprets the engine's shell commands against a simulated filesystem.

// Each test binary only uses some of these helpers, so allow dead_code.
#![allow(dead_code)]

use async_trait::async_trait;
use capstan::deploy::{AppKind, Application, ApplicationStatus};
use capstan::exec::{CommandOutput, ExecError, RemoteExecutor};
use capstan::types::AppName;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;

/// Simulated remote filesystem: directories, files, and symlinks.
#[derive(Debug, Default)]
pub struct RemoteFs {
    pub dirs: BTreeSet<String>,
    pub files: BTreeMap<String, String>,
    pub links: BTreeMap<String, String>,
}

impl RemoteFs {
    pub fn mkdirp(&mut self, path: &str) {
        let mut acc = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            acc.push('/');
            acc.push_str(part);
            self.dirs.insert(acc.clone());
        }
    }

    /// Follow symlinks to the final path.
    pub fn resolve(&self, path: &str) -> String {
        let mut current = path.to_string();
        for _ in 0..16 {
            match self.links.get(&current) {
                Some(target) => current = target.clone(),
                None => break,
            }
        }
        current
    }

    pub fn dir_exists(&self, path: &str) -> bool {
        self.dirs.contains(&self.resolve(path))
    }

    pub fn entry_exists(&self, path: &str) -> bool {
        self.dirs.contains(path) || self.files.contains_key(path) || self.links.contains_key(path)
    }

    /// Names of entries directly under `path`.
    pub fn children(&self, path: &str) -> Vec<String> {
        let prefix = format!("{}/", path);
        let mut names = BTreeSet::new();
        for key in self
            .dirs
            .iter()
            .chain(self.files.keys())
            .chain(self.links.keys())
        {
            if let Some(rest) = key.strip_prefix(&prefix)
                && !rest.is_empty()
                && !rest.contains('/')
            {
                names.insert(rest.to_string());
            }
        }
        names.into_iter().collect()
    }

    pub fn remove_subtree(&mut self, path: &str) {
        let prefix = format!("{}/", path);
        self.dirs.retain(|d| d != path && !d.starts_with(&prefix));
        self.files.retain(|f, _| f != path && !f.starts_with(&prefix));
        self.links.retain(|l, _| l != path && !l.starts_with(&prefix));
    }
}

/// A fake host that executes the deploy engine's command vocabulary.
///
/// Unknown commands succeed with empty output (or fail when
/// `fail_unknown_commands` is set), so best-effort steps like post-activation
/// tasks can be exercised both ways.
pub struct FakeHost {
    pub fs: Mutex<RemoteFs>,
    pub history: Mutex<Vec<String>>,
    /// Exit code returned by deploy-script runs.
    pub script_exit: Mutex<u32>,
    /// Stdout returned by deploy-script runs.
    pub script_output: Mutex<String>,
    /// Make git clone fail like a missing branch.
    pub fail_clone: Mutex<bool>,
    /// Entries (relative; trailing slash means directory) a clone produces,
    /// besides `.git/`.
    pub clone_payload: Mutex<Vec<String>>,
    /// Make commands outside the filesystem vocabulary exit non-zero.
    pub fail_unknown_commands: Mutex<bool>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            fs: Mutex::new(RemoteFs::default()),
            history: Mutex::new(Vec::new()),
            script_exit: Mutex::new(0),
            script_output: Mutex::new(String::new()),
            fail_clone: Mutex::new(false),
            clone_payload: Mutex::new(vec!["index.php".to_string(), "storage/".to_string()]),
            fail_unknown_commands: Mutex::new(false),
        }
    }

    pub fn set_script_exit(&self, code: u32) {
        *self.script_exit.lock().unwrap() = code;
    }

    pub fn set_fail_clone(&self, fail: bool) {
        *self.fail_clone.lock().unwrap() = fail;
    }

    /// Where the `current` symlink points, fully resolved.
    pub fn current_target(&self, app: &Application) -> Option<String> {
        let fs = self.fs.lock().unwrap();
        fs.links.get(&app.current_link()).cloned()
    }

    pub fn dir_exists(&self, path: &str) -> bool {
        self.fs.lock().unwrap().dir_exists(path)
    }

    pub fn link_target(&self, path: &str) -> Option<String> {
        self.fs.lock().unwrap().links.get(path).cloned()
    }

    pub fn file_content(&self, path: &str) -> Option<String> {
        self.fs.lock().unwrap().files.get(path).cloned()
    }

    pub fn release_names(&self, app: &Application) -> Vec<String> {
        self.fs.lock().unwrap().children(&app.releases_root())
    }

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn fail(exit_code: u32, stderr: &str) -> CommandOutput {
        CommandOutput {
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    fn run_clone(&self, fs: &mut RemoteFs, part: &str) -> CommandOutput {
        if *self.fail_clone.lock().unwrap() {
            return Self::fail(128, "fatal: Remote branch not found in upstream origin");
        }

        let tokens: Vec<&str> = part.split_whitespace().collect();
        // git clone [--depth 1] --branch <b> <repo> <dest> 2>&1
        let dest = tokens[tokens.len() - 2];

        if fs.dir_exists(dest) && !fs.children(dest).is_empty() {
            return Self::fail(
                128,
                "fatal: destination path already exists and is not an empty directory",
            );
        }

        fs.mkdirp(dest);
        fs.mkdirp(&format!("{}/.git", dest));
        for entry in self.clone_payload.lock().unwrap().iter() {
            if let Some(dir) = entry.strip_suffix('/') {
                fs.mkdirp(&format!("{}/{}", dest, dir));
            } else {
                fs.files.insert(format!("{}/{}", dest, entry), String::new());
            }
        }
        Self::ok("")
    }

    /// Execute one `&&`-free command fragment.
    fn run_part(&self, fs: &mut RemoteFs, part: &str) -> CommandOutput {
        if let Some(path) = part.strip_prefix("mkdir -p ") {
            fs.mkdirp(path.trim());
            return Self::ok("");
        }

        if let Some(path) = part.strip_prefix("test -d ") {
            return if fs.dir_exists(path.trim()) {
                Self::ok("")
            } else {
                Self::fail(1, "")
            };
        }

        if part == "echo exists" {
            return Self::ok("exists");
        }

        if part.starts_with("git clone ") {
            return self.run_clone(fs, part);
        }

        if let Some(path) = part.strip_prefix("rm -rf ") {
            fs.remove_subtree(path.trim());
            return Self::ok("");
        }

        if let Some(rest) = part.strip_prefix("ln -sfn ") {
            let mut tokens = rest.split_whitespace();
            let (Some(target), Some(link)) = (tokens.next(), tokens.next()) else {
                return Self::fail(1, "ln: missing operand");
            };
            fs.files.remove(link);
            fs.links.insert(link.to_string(), target.to_string());
            return Self::ok("");
        }

        if let Some(rest) = part.strip_prefix("mv -Tf ") {
            let mut tokens = rest.split_whitespace();
            let (Some(src), Some(dst)) = (tokens.next(), tokens.next()) else {
                return Self::fail(1, "mv: missing operand");
            };
            let Some(target) = fs.links.remove(src) else {
                return Self::fail(1, "mv: cannot stat source");
            };
            fs.links.insert(dst.to_string(), target);
            return Self::ok("");
        }

        if let Some(path) = part.strip_prefix("ls -1 ") {
            let path = path.trim();
            if !fs.dir_exists(path) {
                return Self::fail(2, "ls: cannot access: No such file or directory");
            }
            let mut listing = fs.children(path).join("\n");
            if !listing.is_empty() {
                listing.push('\n');
            }
            return Self::ok(&listing);
        }

        if let Some(path) = part.strip_prefix("readlink -f ") {
            let path = path.trim();
            if let Some(target) = fs.links.get(path) {
                return Self::ok(&format!("{}\n", target));
            }
            if fs.entry_exists(path) {
                return Self::ok(&format!("{}\n", path));
            }
            return Self::fail(1, "");
        }

        if let Some(path) = part.strip_prefix("chmod -R ug+rwX ") {
            let resolved = fs.resolve(path.trim());
            return if fs.entry_exists(&resolved) {
                Self::ok("")
            } else {
                Self::fail(1, "chmod: No such file or directory")
            };
        }

        if let Some(path) = part.strip_prefix("cd ") {
            return if fs.dir_exists(path.trim()) {
                Self::ok("")
            } else {
                Self::fail(1, "cd: no such directory")
            };
        }

        if part.starts_with("git remote set-url ") {
            return Self::ok("");
        }

        if *self.fail_unknown_commands.lock().unwrap() {
            return Self::fail(1, "command failed");
        }
        Self::ok("")
    }
}

#[async_trait]
impl RemoteExecutor for FakeHost {
    async fn execute(
        &self,
        command: &str,
        _timeout: Duration,
    ) -> Result<CommandOutput, ExecError> {
        self.history.lock().unwrap().push(command.to_string());
        let mut fs = self.fs.lock().unwrap();

        // Deploy script runs arrive as `set -e\ncd <dir>\n<script>`.
        if let Some(rest) = command.strip_prefix("set -e\ncd ") {
            let (dir, _script) = rest.split_once('\n').unwrap_or((rest, ""));
            if !fs.dir_exists(dir) {
                return Ok(Self::fail(1, "cd: no such directory"));
            }
            return Ok(CommandOutput {
                exit_code: *self.script_exit.lock().unwrap(),
                stdout: self.script_output.lock().unwrap().clone(),
                stderr: String::new(),
            });
        }

        let mut last = Self::ok("");
        for part in command.split(" && ") {
            last = self.run_part(&mut fs, part);
            if !last.success() {
                return Ok(last);
            }
        }
        Ok(last)
    }

    async fn upload(&self, content: &str, remote_path: &str) -> Result<(), ExecError> {
        let mut fs = self.fs.lock().unwrap();
        let parent = remote_path
            .rsplit_once('/')
            .map(|(dir, _)| dir.to_string())
            .unwrap_or_default();
        if !fs.dir_exists(&parent) {
            return Err(ExecError::Upload(format!(
                "{}: No such file or directory",
                remote_path
            )));
        }
        fs.files.insert(remote_path.to_string(), content.to_string());
        Ok(())
    }
}

/// A web-framework application fixture using the atomic strategy.
pub fn web_app() -> Application {
    Application {
        name: AppName::new("shop").unwrap(),
        kind: AppKind::WebFramework,
        repository: "https://github.com/acme/shop.git".to_string(),
        branch: "main".to_string(),
        deploy_path: "/var/www/shop".to_string(),
        keep_releases: 5,
        zero_downtime: true,
        script: "composer install --no-dev\nphp artisan migrate --force\n".to_string(),
        environment: "APP_ENV=production\n".to_string(),
        runtime_version: Some("8.3".to_string()),
        status: ApplicationStatus::Idle,
    }
}

/// A static-site fixture (stateless kind).
pub fn static_app() -> Application {
    Application {
        name: AppName::new("docs").unwrap(),
        kind: AppKind::StaticSite,
        repository: "https://github.com/acme/docs.git".to_string(),
        branch: "main".to_string(),
        deploy_path: "/srv/docs".to_string(),
        keep_releases: 5,
        zero_downtime: true,
        script: String::new(),
        environment: String::new(),
        runtime_version: None,
        status: ApplicationStatus::Idle,
    }
}

/// A node-service fixture.
pub fn node_app() -> Application {
    Application {
        name: AppName::new("billing-api").unwrap(),
        kind: AppKind::NodeService,
        repository: "https://github.com/acme/billing.git".to_string(),
        branch: "main".to_string(),
        deploy_path: "/srv/billing".to_string(),
        keep_releases: 5,
        zero_downtime: true,
        script: "npm ci --omit=dev\n".to_string(),
        environment: "PORT=3000\n".to_string(),
        runtime_version: Some("22".to_string()),
        status: ApplicationStatus::Idle,
    }
}
