// ABOUTME: Error types for deployment and rollback operations.
// ABOUTME: Variants map onto the transport / precondition / script / state taxonomy.

use crate::exec::ExecError;

/// Broad category of a deployment failure, for callers that react to the
/// class of error rather than the specific variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// Cannot reach or talk to the host.
    Transport,
    /// A required remote state is missing (e.g. rollback target cleaned up).
    Precondition,
    /// A remote command or the deploy script returned non-zero or timed out.
    Script,
    /// The engine was asked to do something its contract forbids.
    State,
}

/// Errors from deployment orchestration and rollback.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The transport failed underneath a remote operation.
    #[error("transport error: {0}")]
    Transport(#[from] ExecError),

    /// A remote command exited non-zero.
    #[error("command `{command}` failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: u32,
        stderr: String,
    },

    /// Cloning the repository into the release directory failed.
    #[error("git clone of {repository} ({branch}) failed: {output}")]
    CloneFailed {
        repository: String,
        branch: String,
        output: String,
    },

    /// The deploy script exited non-zero during an atomic deployment.
    /// The previously active release is still live.
    #[error("deploy script failed with exit code {0}; previous release remains live")]
    ScriptFailed(u32),

    /// The deploy script exited non-zero during an in-place deployment.
    /// The working tree is left in whatever state the script produced.
    #[error("deploy script failed with exit code {0}; working tree left partially updated")]
    InPlaceScriptFailed(u32),

    /// The rollback target's release directory no longer exists on the host.
    #[error("release {0} no longer exists on the host (removed by cleanup?)")]
    ReleaseMissing(String),

    /// No prior successful deployment is available to roll back to.
    #[error("no previous deployment available")]
    NoPreviousDeployment,

    /// The operation violates the engine's contract.
    #[error("{0}")]
    State(String),
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Transport(_) => DeployErrorKind::Transport,
            DeployError::CommandFailed { .. }
            | DeployError::CloneFailed { .. }
            | DeployError::ScriptFailed(_)
            | DeployError::InPlaceScriptFailed(_) => DeployErrorKind::Script,
            DeployError::ReleaseMissing(_) | DeployError::NoPreviousDeployment => {
                DeployErrorKind::Precondition
            }
            DeployError::State(_) => DeployErrorKind::State,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(
            DeployError::Transport(ExecError::Timeout(Duration::from_secs(15))).kind(),
            DeployErrorKind::Transport
        );
        assert_eq!(
            DeployError::ScriptFailed(1).kind(),
            DeployErrorKind::Script
        );
        assert_eq!(
            DeployError::ReleaseMissing("20250101000000000".to_string()).kind(),
            DeployErrorKind::Precondition
        );
        assert_eq!(
            DeployError::NoPreviousDeployment.kind(),
            DeployErrorKind::Precondition
        );
        assert_eq!(
            DeployError::State("rollback requires the atomic strategy".to_string()).kind(),
            DeployErrorKind::State
        );
    }
}
