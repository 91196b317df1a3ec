// ABOUTME: Configuration types and parsing for capstan.yml.
// ABOUTME: Maps operator YAML onto the deploy engine's Application value.

mod server;

pub use server::ServerConfig;

use crate::deploy::{AppKind, Application, ApplicationStatus};
use crate::error::{Error, Result};
use crate::types::AppName;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "capstan.yml";
pub const CONFIG_FILENAME_ALT: &str = "capstan.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".capstan/config.yml";

fn default_branch() -> String {
    "main".to_string()
}

fn default_keep_releases() -> usize {
    5
}

fn default_zero_downtime() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_app_name")]
    pub app: AppName,

    pub kind: AppKind,

    /// Git URL carrying whatever authentication the operator configured.
    pub repository: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    pub deploy_path: String,

    #[serde(default = "default_keep_releases")]
    pub keep_releases: usize,

    #[serde(default = "default_zero_downtime")]
    pub zero_downtime: bool,

    #[serde(deserialize_with = "deserialize_server")]
    pub server: ServerConfig,

    /// Deploy script; a kind-specific default is used when absent.
    #[serde(default)]
    pub script: Option<String>,

    /// Inline environment file content. Takes precedence over `env_file`.
    #[serde(default)]
    pub environment: Option<String>,

    /// Local file whose content is uploaded as the environment file.
    #[serde(default)]
    pub env_file: Option<String>,

    /// Runtime version exposed to the script (PHP or Node version).
    #[serde(default)]
    pub runtime_version: Option<String>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;

        // Resolve env_file relative to the config file's directory so the
        // rendered content travels with the Application value.
        if config.environment.is_none()
            && let Some(env_file) = &config.env_file
        {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.environment = Some(std::fs::read_to_string(base.join(env_file))?);
        }

        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// The deploy script to run: the configured one, or the kind default.
    pub fn resolved_script(&self) -> String {
        match &self.script {
            Some(script) => script.clone(),
            None => default_script(self.kind).to_string(),
        }
    }

    /// Build the deploy engine's view of this target.
    pub fn to_application(&self) -> Application {
        Application {
            name: self.app.clone(),
            kind: self.kind,
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            deploy_path: self.deploy_path.trim_end_matches('/').to_string(),
            keep_releases: self.keep_releases,
            zero_downtime: self.zero_downtime,
            script: self.resolved_script(),
            environment: self.environment.clone().unwrap_or_default(),
            runtime_version: self.runtime_version.clone(),
            status: ApplicationStatus::Idle,
        }
    }

    pub fn template() -> Self {
        Config {
            app: AppName::new("my-app").expect("template name is valid"),
            kind: AppKind::WebFramework,
            repository: "git@github.com:acme/my-app.git".to_string(),
            branch: default_branch(),
            deploy_path: "/var/www/my-app".to_string(),
            keep_releases: default_keep_releases(),
            zero_downtime: default_zero_downtime(),
            server: ServerConfig {
                host: "server.example.com".to_string(),
                port: 22,
                user: Some("deploy".to_string()),
                key_path: None,
                trust_first_connection: true,
            },
            script: None,
            environment: None,
            env_file: None,
            runtime_version: None,
        }
    }
}

/// Default deploy script per application kind.
fn default_script(kind: AppKind) -> &'static str {
    match kind {
        AppKind::WebFramework => {
            "composer install --no-interaction --prefer-dist --optimize-autoloader\n\
             php artisan migrate --force\n\
             php artisan config:cache\n"
        }
        AppKind::NodeService => "npm ci --omit=dev\nnpm run build --if-present\n",
        AppKind::StaticSite => "",
    }
}

pub fn init_config(dir: &Path, app: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(name) = app {
        config.app = AppName::new(name).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    std::fs::write(&config_path, generate_template_yaml(&config))?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"app: {}
kind: {}
repository: {}
branch: {}
deploy_path: /var/www/{}
keep_releases: {}
zero_downtime: {}
server:
  host: {}
  port: {}
  user: {}
"#,
        config.app,
        config.kind,
        config.repository,
        config.branch,
        config.app,
        config.keep_releases,
        config.zero_downtime,
        config.server.host,
        config.server.port,
        config.server.user.as_deref().unwrap_or("deploy")
    )
}

// Custom deserializers

fn deserialize_app_name<'de, D>(deserializer: D) -> std::result::Result<AppName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    AppName::new(&s).map_err(serde::de::Error::custom)
}

fn deserialize_server<'de, D>(deserializer: D) -> std::result::Result<ServerConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ServerEntry {
        Simple(String),
        Detailed(ServerConfig),
    }

    match ServerEntry::deserialize(deserializer)? {
        ServerEntry::Simple(s) => ServerConfig::parse(&s).map_err(serde::de::Error::custom),
        ServerEntry::Detailed(c) => Ok(c),
    }
}
