// ABOUTME: Remote command-execution capability consumed by the deploy engine.
// ABOUTME: Implemented by the SSH session in production and by fake hosts in tests.

use async_trait::async_trait;
use std::time::Duration;

/// Output from a remote command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: u32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, for verbatim log appends.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// Errors from the remote execution transport.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("channel closed unexpectedly without exit status")]
    ChannelClosed,

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Command execution on a target host.
///
/// The handle is passed explicitly into every orchestration call; nothing in
/// the deploy engine holds ambient connection state. A non-zero exit status is
/// NOT an `ExecError`: callers inspect `CommandOutput::success()` and decide
/// what a failure means for the step at hand.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Execute a shell command, blocking until it completes or the timeout
    /// elapses.
    async fn execute(&self, command: &str, timeout: Duration) -> Result<CommandOutput, ExecError>;

    /// Write `content` to `remote_path` on the host, replacing any existing
    /// file. The parent directory must already exist.
    async fn upload(&self, content: &str, remote_path: &str) -> Result<(), ExecError>;
}
