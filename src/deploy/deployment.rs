// ABOUTME: Record of one attempt to materialize a release.
// ABOUTME: Carries the append-only log and the is_active live-release flag.

use crate::types::{AppName, ReleaseId};
use chrono::{DateTime, Utc};
use std::fmt;

/// Status of a single deployment attempt.
///
/// Transitions are `pending → running → {success | failed}`; nothing moves a
/// deployment out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// One attempt to materialize a release on the host.
///
/// Mutated only by the orchestrator and rollback manager, through status
/// transitions and append-only log writes. Never deleted by the deploy
/// engine; retention applies to remote release directories, not records.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub id: u64,
    pub app: AppName,
    pub status: DeploymentStatus,
    /// Append-only text log; consumers may tail it while a run is in flight.
    pub log: String,
    pub release_id: Option<ReleaseId>,
    pub release_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Source commit, when a webhook or manual trigger supplied one.
    pub commit_hash: Option<String>,
    pub commit_message: Option<String>,
    /// True when this deployment's release is the one `current` points to.
    pub is_active: bool,
}

impl Deployment {
    pub fn new(id: u64, app: AppName) -> Self {
        Self {
            id,
            app,
            status: DeploymentStatus::Pending,
            log: String::new(),
            release_id: None,
            release_path: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            commit_hash: None,
            commit_message: None,
            is_active: false,
        }
    }

    /// Append a line to the log. The log only ever grows.
    pub fn append_log(&mut self, line: &str) {
        self.log.push_str(line);
        if !line.ends_with('\n') {
            self.log.push('\n');
        }
    }

    pub fn mark_running(&mut self) {
        self.status = DeploymentStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_success(&mut self) {
        self.status = DeploymentStatus::Success;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self) {
        self.status = DeploymentStatus::Failed;
        self.finished_at = Some(Utc::now());
    }
}

/// Make `active_id` the only deployment in `history` with `is_active` set.
///
/// At most one deployment per application is live; activating a release (by
/// deployment or rollback) clears the flag from whichever record held it.
pub fn mark_sole_active(history: &mut [Deployment], active_id: u64) {
    for deployment in history.iter_mut() {
        deployment.is_active = deployment.id == active_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64) -> Deployment {
        Deployment::new(id, AppName::new("shop").unwrap())
    }

    #[test]
    fn new_deployment_is_pending_and_inactive() {
        let d = record(1);
        assert_eq!(d.status, DeploymentStatus::Pending);
        assert!(!d.is_active);
        assert!(d.log.is_empty());
        assert!(d.started_at.is_none());
    }

    #[test]
    fn log_appends_grow_and_terminate_lines() {
        let mut d = record(1);
        d.append_log("Cloning repository");
        d.append_log("done\n");
        assert_eq!(d.log, "Cloning repository\ndone\n");
    }

    #[test]
    fn status_transitions_stamp_timestamps() {
        let mut d = record(1);
        d.mark_running();
        assert_eq!(d.status, DeploymentStatus::Running);
        assert!(d.started_at.is_some());
        d.mark_success();
        assert_eq!(d.status, DeploymentStatus::Success);
        assert!(d.finished_at.is_some());
    }

    #[test]
    fn mark_sole_active_clears_all_others() {
        let mut history = vec![record(1), record(2), record(3)];
        history[0].is_active = true;

        mark_sole_active(&mut history, 3);

        assert!(!history[0].is_active);
        assert!(!history[1].is_active);
        assert!(history[2].is_active);
    }
}
