// ABOUTME: Rollback to a previously materialized release.
// ABOUTME: Re-points current at a prior release path, then runs kind-specific post-activation tasks.

use super::application::{Application, ApplicationStatus};
use super::deployment::{Deployment, DeploymentStatus, mark_sole_active};
use super::error::DeployError;
use super::release::ReleaseManager;
use super::POST_TASK_TIMEOUT;
use crate::exec::RemoteExecutor;
use crate::types::ReleaseId;

/// A release still present on the host, for operator display.
#[derive(Debug, Clone)]
pub struct AvailableRelease {
    pub id: ReleaseId,
    pub path: String,
    /// Whether `current` points at this release.
    pub active: bool,
    /// The successful deployment that produced it, when one is recorded.
    pub deployment_id: Option<u64>,
}

/// Re-points `current` at a prior release without cloning or building.
///
/// Reuses the release manager's layout knowledge; only the symlink swap is
/// gating, post-activation tasks are best-effort log entries.
pub struct RollbackManager<'a, E: RemoteExecutor> {
    exec: &'a E,
}

impl<'a, E: RemoteExecutor> RollbackManager<'a, E> {
    pub fn new(exec: &'a E) -> Self {
        Self { exec }
    }

    /// Roll the application back to `target`'s release, tracking the attempt
    /// in `record`. `history` is the application's deployment records; the
    /// previously active one loses its `is_active` flag on success.
    pub async fn rollback(
        &self,
        app: &mut Application,
        target: &Deployment,
        record: &mut Deployment,
        history: &mut [Deployment],
    ) -> Result<(), DeployError> {
        record.mark_running();
        record.append_log(&format!(
            "Rolling back {} to release {}",
            app.name,
            target
                .release_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "<unrecorded>".to_string())
        ));

        match self.rollback_inner(app, target, record).await {
            Ok(()) => {
                record.release_id = target.release_id;
                record.release_path = target.release_path.clone();
                record.mark_success();
                mark_sole_active(history, record.id);
                record.is_active = true;
                app.status = ApplicationStatus::Active;
                record.append_log("Rollback complete");
                tracing::info!(app = %app.name, "rollback succeeded");
                Ok(())
            }
            Err(e) => {
                record.append_log(&format!("ERROR: {}", e));
                record.mark_failed();
                app.status = ApplicationStatus::Failed;
                tracing::error!(app = %app.name, error = %e, "rollback failed");
                Err(e)
            }
        }
    }

    async fn rollback_inner(
        &self,
        app: &Application,
        target: &Deployment,
        record: &mut Deployment,
    ) -> Result<(), DeployError> {
        if !app.zero_downtime {
            return Err(DeployError::State(
                "rollback requires the atomic release strategy".to_string(),
            ));
        }

        let release_path = target.release_path.as_deref().ok_or_else(|| {
            DeployError::State(format!(
                "deployment {} has no recorded release path",
                target.id
            ))
        })?;

        let releases = ReleaseManager::new(self.exec, app);

        // Retention cleanup may have removed the target since it was recorded.
        if !releases.release_exists(release_path).await? {
            return Err(DeployError::ReleaseMissing(
                target
                    .release_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| release_path.to_string()),
            ));
        }

        releases.activate_release(release_path).await?;
        record.append_log(&format!("current -> {}", release_path));

        // Post-activation tasks rebuild caches and bounce workers so the
        // restored release actually serves. Their failure is logged, not
        // propagated; the swap already happened.
        for command in app
            .kind
            .post_activation_commands(&app.name, &app.current_link())
        {
            record.append_log(&format!("$ {}", command));
            match self.exec.execute(&command, POST_TASK_TIMEOUT).await {
                Ok(output) => {
                    let combined = output.combined();
                    if !combined.trim().is_empty() {
                        record.append_log(combined.trim_end());
                    }
                    if !output.success() {
                        record.append_log(&format!(
                            "warning: task exited with status {} (ignored)",
                            output.exit_code
                        ));
                    }
                }
                Err(e) => {
                    record.append_log(&format!("warning: {} (ignored)", e));
                }
            }
        }

        Ok(())
    }

    /// Roll back to the most recent successful deployment that is not the
    /// active one. Fails when no such deployment exists.
    pub async fn rollback_to_previous(
        &self,
        app: &mut Application,
        record: &mut Deployment,
        history: &mut [Deployment],
    ) -> Result<(), DeployError> {
        let target = match Self::select_previous(history) {
            Ok(target) => target.clone(),
            Err(e) => {
                record.append_log(&format!("ERROR: {}", e));
                record.mark_failed();
                return Err(e);
            }
        };
        self.rollback(app, &target, record, history).await
    }

    /// The most recent `success` deployment, excluding the currently active
    /// one, that still has a recorded release path.
    pub fn select_previous(history: &[Deployment]) -> Result<&Deployment, DeployError> {
        history
            .iter()
            .filter(|d| {
                d.status == DeploymentStatus::Success && !d.is_active && d.release_path.is_some()
            })
            .max_by_key(|d| d.created_at)
            .ok_or(DeployError::NoPreviousDeployment)
    }

    /// Every release still physically present, newest first, annotated with
    /// the deployment that produced it and whether it is live.
    pub async fn available_releases(
        &self,
        app: &Application,
        history: &[Deployment],
    ) -> Result<Vec<AvailableRelease>, DeployError> {
        let releases = ReleaseManager::new(self.exec, app);
        let ids = releases.list_releases().await?;
        let current = releases.current_release_path().await?;

        Ok(ids
            .into_iter()
            .map(|id| {
                let path = app.release_path(id);
                let deployment_id = history
                    .iter()
                    .find(|d| d.status == DeploymentStatus::Success && d.release_id == Some(id))
                    .map(|d| d.id);
                AvailableRelease {
                    id,
                    active: current.as_deref() == Some(path.as_str()),
                    path,
                    deployment_id,
                }
            })
            .collect())
    }
}
