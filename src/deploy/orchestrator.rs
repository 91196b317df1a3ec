// ABOUTME: Top-level deployment driver.
// ABOUTME: Sequences release creation, build, activation, and retention, reconciling record status.

use super::application::{Application, ApplicationStatus};
use super::deployment::{Deployment, DeploymentStatus};
use super::error::DeployError;
use super::release::ReleaseManager;
use super::script::{echo_lines, script_vars, substitute};
use super::strategy::DeployStrategy;
use super::{BUILD_TIMEOUT, PROBE_TIMEOUT, exec_checked};
use crate::exec::RemoteExecutor;

/// Drives one deployment attempt from `pending` to a terminal state.
///
/// Every remote operation is attempted at most once; there is no retry. The
/// one property every failure path preserves is that the remote `current`
/// pointer is left exactly as it was before the attempt: activation is the
/// last mutating step before retention cleanup.
pub struct DeploymentOrchestrator<'a, E: RemoteExecutor> {
    exec: &'a E,
}

impl<'a, E: RemoteExecutor> DeploymentOrchestrator<'a, E> {
    pub fn new(exec: &'a E) -> Self {
        Self { exec }
    }

    /// Run the deployment, mutating the records to reflect the outcome.
    ///
    /// On failure the error text is appended to the log as an `ERROR:` line,
    /// the deployment is marked `failed`, the application `failed`, and the
    /// typed error is returned for the caller to react to.
    pub async fn run(
        &self,
        app: &mut Application,
        deployment: &mut Deployment,
    ) -> Result<(), DeployError> {
        if deployment.status != DeploymentStatus::Pending {
            return Err(DeployError::State(format!(
                "deployment {} is {}, expected pending",
                deployment.id, deployment.status
            )));
        }

        let strategy = DeployStrategy::for_application(app);
        app.status = ApplicationStatus::Deploying;
        deployment.mark_running();
        deployment.append_log(&format!(
            "Deploying {} ({} branch of {})",
            app.name, app.branch, app.repository
        ));
        if let Some(hash) = deployment.commit_hash.clone() {
            let message = deployment.commit_message.clone().unwrap_or_default();
            deployment.append_log(&format!("Commit {} {}", hash, message));
        }
        tracing::info!(app = %app.name, ?strategy, "deployment started");

        let result = match strategy {
            DeployStrategy::Atomic => self.run_atomic(app, deployment).await,
            DeployStrategy::InPlace => self.run_in_place(app, deployment).await,
        };

        match result {
            Ok(()) => {
                deployment.mark_success();
                if strategy == DeployStrategy::Atomic {
                    deployment.is_active = true;
                }
                app.status = ApplicationStatus::Active;
                deployment.append_log("Deployment finished successfully");
                tracing::info!(app = %app.name, "deployment succeeded");
                Ok(())
            }
            Err(e) => {
                deployment.append_log(&format!("ERROR: {}", e));
                deployment.mark_failed();
                app.status = ApplicationStatus::Failed;
                tracing::error!(app = %app.name, error = %e, "deployment failed");
                Err(e)
            }
        }
    }

    /// Atomic strategy: clone into a fresh release, build it off to the side,
    /// then swap `current` and enforce retention.
    async fn run_atomic(
        &self,
        app: &Application,
        deployment: &mut Deployment,
    ) -> Result<(), DeployError> {
        let releases = ReleaseManager::new(self.exec, app);

        if !releases.is_initialized().await? {
            deployment.append_log("Initializing release layout");
        }
        releases.initialize_structure().await?;

        let (id, release_path) = releases.create_release().await?;
        deployment.release_id = Some(id);
        deployment.release_path = Some(release_path.clone());
        deployment.append_log(&format!("Created release {}", id));

        let secrets_path = if app.kind.is_stateful() {
            app.shared_path(app.kind.secrets_file())
        } else {
            format!("{}/{}", release_path, app.kind.secrets_file())
        };
        self.exec.upload(&app.environment, &secrets_path).await?;
        deployment.append_log("Uploaded environment file");

        if app.kind.is_stateful() {
            releases.link_shared_paths(&release_path).await?;
            deployment.append_log("Linked shared paths");
        }

        self.run_script(app, deployment, DeployStrategy::Atomic, &release_path)
            .await?;

        if app.kind.is_stateful() {
            self.fix_permissions(app, &release_path, true).await?;
            deployment.append_log("Fixed permissions on writable paths");
        }

        releases.activate_release(&release_path).await?;
        deployment.append_log(&format!("Activated release {} (current -> {})", id, release_path));

        let removed = releases.cleanup_old_releases().await?;
        if !removed.is_empty() {
            let names: Vec<String> = removed.iter().map(|r| r.to_string()).collect();
            deployment.append_log(&format!("Removed old releases: {}", names.join(", ")));
        }

        Ok(())
    }

    /// Legacy in-place strategy: a single working tree, refreshed in place.
    /// No release history and no rollback; a script failure leaves the tree
    /// as the script left it.
    async fn run_in_place(
        &self,
        app: &Application,
        deployment: &mut Deployment,
    ) -> Result<(), DeployError> {
        exec_checked(
            self.exec,
            &format!("mkdir -p {}", app.deploy_path),
            PROBE_TIMEOUT,
        )
        .await?;

        let probe = self
            .exec
            .execute(
                &format!("test -d {}/.git && echo exists", app.deploy_path),
                PROBE_TIMEOUT,
            )
            .await?;

        if !(probe.success() && probe.stdout.trim() == "exists") {
            deployment.append_log(&format!("Cloning {} into {}", app.repository, app.deploy_path));
            let clone_cmd = format!(
                "git clone --branch {} {} {} 2>&1",
                app.branch, app.repository, app.deploy_path
            );
            let output = self.exec.execute(&clone_cmd, BUILD_TIMEOUT).await?;
            if !output.success() {
                return Err(DeployError::CloneFailed {
                    repository: app.repository.clone(),
                    branch: app.branch.clone(),
                    output: output.combined().trim().to_string(),
                });
            }
        } else {
            // Keep the origin URL in sync with the configured (authenticated)
            // repository URL so the script's git pull works.
            exec_checked(
                self.exec,
                &format!(
                    "cd {} && git remote set-url origin {}",
                    app.deploy_path, app.repository
                ),
                PROBE_TIMEOUT,
            )
            .await?;
            deployment.append_log("Refreshed origin remote URL");
        }

        self.exec
            .upload(
                &app.environment,
                &format!("{}/{}", app.deploy_path, app.kind.secrets_file()),
            )
            .await?;
        deployment.append_log("Uploaded environment file");

        self.run_script(app, deployment, DeployStrategy::InPlace, &app.deploy_path)
            .await?;

        if app.kind.is_stateful() {
            // No shared/ tree in this layout; only the working tree's own
            // storage and cache directories need fixing.
            self.fix_permissions(app, &app.deploy_path, false).await?;
            deployment.append_log("Fixed permissions on writable paths");
        }

        Ok(())
    }

    /// Render and run the deploy script in `work_path`.
    ///
    /// Every non-empty, non-comment line is echoed to the log before the
    /// script runs; the combined output is appended verbatim afterwards.
    async fn run_script(
        &self,
        app: &Application,
        deployment: &mut Deployment,
        strategy: DeployStrategy,
        work_path: &str,
    ) -> Result<(), DeployError> {
        let rendered = substitute(&app.script, &script_vars(app, strategy, work_path));
        if rendered.trim().is_empty() {
            deployment.append_log("No deploy script configured, skipping build step");
            return Ok(());
        }

        for line in echo_lines(&rendered) {
            deployment.append_log(&format!("$ {}", line));
        }

        let command = format!("set -e\ncd {}\n{}", work_path, rendered);
        let output = self.exec.execute(&command, BUILD_TIMEOUT).await?;

        let combined = output.combined();
        if !combined.trim().is_empty() {
            deployment.append_log(combined.trim_end());
        }

        if !output.success() {
            return Err(match strategy {
                DeployStrategy::Atomic => DeployError::ScriptFailed(output.exit_code),
                DeployStrategy::InPlace => DeployError::InPlaceScriptFailed(output.exit_code),
            });
        }

        Ok(())
    }

    /// Make writable subpaths and the shared tree group-writable so the web
    /// server and deploy user can both touch them.
    async fn fix_permissions(
        &self,
        app: &Application,
        root: &str,
        include_shared: bool,
    ) -> Result<(), DeployError> {
        for subpath in app.kind.writable_paths() {
            let path = format!("{}/{}", root, subpath);
            exec_checked(
                self.exec,
                &format!("mkdir -p {} && chmod -R ug+rwX {}", path, path),
                PROBE_TIMEOUT,
            )
            .await?;
        }
        if include_shared {
            exec_checked(
                self.exec,
                &format!("chmod -R ug+rwX {}", app.shared_root()),
                PROBE_TIMEOUT,
            )
            .await?;
        }
        Ok(())
    }
}
