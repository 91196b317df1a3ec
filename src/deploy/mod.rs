// ABOUTME: The atomic release and deployment orchestration engine.
// ABOUTME: Exports the orchestrator, release manager, rollback manager, and their records.

mod application;
mod deployment;
mod error;
mod kind;
mod orchestrator;
mod release;
mod rollback;
mod script;
mod strategy;

pub use application::{Application, ApplicationStatus};
pub use deployment::{Deployment, DeploymentStatus, mark_sole_active};
pub use error::{DeployError, DeployErrorKind};
pub use kind::AppKind;
pub use orchestrator::DeploymentOrchestrator;
pub use release::ReleaseManager;
pub use rollback::{AvailableRelease, RollbackManager};
pub use script::{echo_lines, script_vars, substitute};
pub use strategy::DeployStrategy;

use crate::exec::{CommandOutput, RemoteExecutor};
use std::time::Duration;

/// Timeout for quick probes and filesystem mutations.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for git clone and the deploy script.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(600);

/// Timeout for best-effort post-activation tasks after a rollback.
pub const POST_TASK_TIMEOUT: Duration = Duration::from_secs(60);

/// Run a remote command and turn a non-zero exit into a `DeployError`.
pub(crate) async fn exec_checked<E: RemoteExecutor>(
    exec: &E,
    command: &str,
    timeout: Duration,
) -> Result<CommandOutput, DeployError> {
    let output = exec.execute(command, timeout).await?;
    if !output.success() {
        return Err(DeployError::CommandFailed {
            command: command.to_string(),
            exit_code: output.exit_code,
            stderr: output.combined().trim().to_string(),
        });
    }
    Ok(output)
}
