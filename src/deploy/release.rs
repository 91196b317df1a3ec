// ABOUTME: Release directory lifecycle on the remote host.
// ABOUTME: Owns the releases/, shared/, and current symlink layout.

use super::application::Application;
use super::error::DeployError;
use super::{BUILD_TIMEOUT, PROBE_TIMEOUT, exec_checked};
use crate::exec::RemoteExecutor;
use crate::types::ReleaseId;

/// Creates, links, activates, and retires release directories for one
/// application. Stateless itself; every call goes through the executor
/// handle it was constructed with.
pub struct ReleaseManager<'a, E: RemoteExecutor> {
    exec: &'a E,
    app: &'a Application,
}

impl<'a, E: RemoteExecutor> ReleaseManager<'a, E> {
    pub fn new(exec: &'a E, app: &'a Application) -> Self {
        Self { exec, app }
    }

    /// Create `releases/`, and for stateful kinds `shared/` plus every shared
    /// subdirectory except the secrets file. Idempotent.
    pub async fn initialize_structure(&self) -> Result<(), DeployError> {
        exec_checked(
            self.exec,
            &format!("mkdir -p {}", self.app.releases_root()),
            PROBE_TIMEOUT,
        )
        .await?;

        if self.app.kind.is_stateful() {
            exec_checked(
                self.exec,
                &format!("mkdir -p {}", self.app.shared_root()),
                PROBE_TIMEOUT,
            )
            .await?;

            for subpath in self.app.kind.shared_paths() {
                // The secrets file is uploaded, not pre-created as a directory.
                if *subpath == self.app.kind.secrets_file() {
                    continue;
                }
                exec_checked(
                    self.exec,
                    &format!("mkdir -p {}", self.app.shared_path(subpath)),
                    PROBE_TIMEOUT,
                )
                .await?;
            }
        }

        Ok(())
    }

    /// Whether the release layout exists on the host.
    pub async fn is_initialized(&self) -> Result<bool, DeployError> {
        self.dir_exists(&self.app.releases_root()).await
    }

    /// Allocate a release id and clone the configured branch into
    /// `releases/<id>/`. Returns the id and the absolute release path.
    pub async fn create_release(&self) -> Result<(ReleaseId, String), DeployError> {
        let id = ReleaseId::allocate();
        let path = self.app.release_path(id);

        exec_checked(self.exec, &format!("mkdir -p {}", path), PROBE_TIMEOUT).await?;

        let clone_cmd = format!(
            "git clone --depth 1 --branch {} {} {} 2>&1",
            self.app.branch, self.app.repository, path
        );
        let output = self.exec.execute(&clone_cmd, BUILD_TIMEOUT).await?;
        if !output.success() {
            return Err(DeployError::CloneFailed {
                repository: self.app.repository.clone(),
                branch: self.app.branch.clone(),
                output: output.combined().trim().to_string(),
            });
        }

        Ok((id, path))
    }

    /// Replace every shared subpath inside the release with a symlink into
    /// `shared/`. The fresh clone may have produced a real entry under the
    /// same name; it is deleted first. No-op for stateless kinds. Idempotent:
    /// re-running replaces the links with identical ones.
    pub async fn link_shared_paths(&self, release_path: &str) -> Result<(), DeployError> {
        for subpath in self.app.kind.shared_paths() {
            let in_release = format!("{}/{}", release_path, subpath);
            let in_shared = self.app.shared_path(subpath);
            exec_checked(
                self.exec,
                &format!("rm -rf {} && ln -sfn {} {}", in_release, in_shared, in_release),
                PROBE_TIMEOUT,
            )
            .await?;
        }
        Ok(())
    }

    /// Point `current` at the release with an atomic swap.
    ///
    /// The new symlink is built at a scratch path and renamed over `current`,
    /// so the pointer is replaced by a single rename: before the call it
    /// targets the old release (or nothing), after the call the new one, with
    /// no observable intermediate state.
    pub async fn activate_release(&self, release_path: &str) -> Result<(), DeployError> {
        let current = self.app.current_link();
        let scratch = format!("{}.new", current);
        exec_checked(
            self.exec,
            &format!(
                "ln -sfn {} {} && mv -Tf {} {}",
                release_path, scratch, scratch, current
            ),
            PROBE_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    /// Remove releases beyond the retention count, oldest first.
    ///
    /// All release directories count against retention whether their
    /// deployment succeeded or not; the one `current` points to is never
    /// deleted. Returns the ids that were removed.
    pub async fn cleanup_old_releases(&self) -> Result<Vec<ReleaseId>, DeployError> {
        let releases = self.list_releases().await?;
        if releases.len() <= self.app.keep_releases {
            return Ok(Vec::new());
        }

        let live = self.current_release_path().await?;

        let mut removed = Vec::new();
        for id in &releases[self.app.keep_releases..] {
            let path = self.app.release_path(*id);
            if live.as_deref() == Some(path.as_str()) {
                tracing::warn!(release = %id, "retention would remove the live release; skipping");
                continue;
            }
            exec_checked(self.exec, &format!("rm -rf {}", path), PROBE_TIMEOUT).await?;
            removed.push(*id);
        }

        Ok(removed)
    }

    /// All release ids present under `releases/`, newest first.
    ///
    /// Directory entries that do not parse as release ids are not releases
    /// and are left alone.
    pub async fn list_releases(&self) -> Result<Vec<ReleaseId>, DeployError> {
        let output = exec_checked(
            self.exec,
            &format!("ls -1 {}", self.app.releases_root()),
            PROBE_TIMEOUT,
        )
        .await?;

        let mut ids: Vec<ReleaseId> = output
            .stdout
            .lines()
            .filter_map(|line| line.trim().parse().ok())
            .collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    /// Whether a specific release directory still exists on the host.
    pub async fn release_exists(&self, release_path: &str) -> Result<bool, DeployError> {
        self.dir_exists(release_path).await
    }

    /// Resolve the release path `current` points at, following the symlink.
    /// Returns `None` when `current` is missing or cannot be resolved.
    pub async fn current_release_path(&self) -> Result<Option<String>, DeployError> {
        let output = self
            .exec
            .execute(
                &format!("readlink -f {}", self.app.current_link()),
                PROBE_TIMEOUT,
            )
            .await?;

        if !output.success() {
            return Ok(None);
        }

        let target = output.stdout.trim();
        if target.is_empty() {
            Ok(None)
        } else {
            Ok(Some(target.to_string()))
        }
    }

    async fn dir_exists(&self, path: &str) -> Result<bool, DeployError> {
        let output = self
            .exec
            .execute(&format!("test -d {} && echo exists", path), PROBE_TIMEOUT)
            .await?;
        Ok(output.success() && output.stdout.trim() == "exists")
    }
}
