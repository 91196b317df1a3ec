// ABOUTME: The deployment target an orchestration run operates on.
// ABOUTME: Owns the remote filesystem layout derived from the base deploy path.

use super::kind::AppKind;
use crate::types::{AppName, ReleaseId};
use std::fmt;

/// Lifecycle status of an application, reconciled by the deploy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationStatus {
    /// No deployment has run yet.
    Idle,
    /// A deployment is in flight.
    Deploying,
    /// The last deployment or rollback succeeded.
    Active,
    /// The last deployment failed.
    Failed,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplicationStatus::Idle => "idle",
            ApplicationStatus::Deploying => "deploying",
            ApplicationStatus::Active => "active",
            ApplicationStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// A deployment target: one application on one host.
///
/// Exactly one application maps to exactly one `current` symlink path on its
/// host. The CRUD layer that stores these records is out of scope; the deploy
/// engine reads the target description and reconciles `status`.
#[derive(Debug, Clone)]
pub struct Application {
    pub name: AppName,
    pub kind: AppKind,
    /// Git URL, already carrying whatever authentication the operator
    /// configured (token-in-URL or an SSH remote).
    pub repository: String,
    pub branch: String,
    /// Base path on the host under which `releases/`, `shared/` and
    /// `current` live (or the single working tree for in-place deploys).
    pub deploy_path: String,
    /// How many releases cleanup retains.
    pub keep_releases: usize,
    /// Atomic release strategy when true, legacy in-place otherwise.
    pub zero_downtime: bool,
    /// Resolved build/deploy script, `{{variable}}` placeholders included.
    pub script: String,
    /// Rendered secrets/environment file content.
    pub environment: String,
    /// Runtime version exposed to the script (PHP or Node version).
    pub runtime_version: Option<String>,
    pub status: ApplicationStatus,
}

impl Application {
    pub fn releases_root(&self) -> String {
        format!("{}/releases", self.deploy_path)
    }

    pub fn shared_root(&self) -> String {
        format!("{}/shared", self.deploy_path)
    }

    pub fn current_link(&self) -> String {
        format!("{}/current", self.deploy_path)
    }

    pub fn release_path(&self, id: ReleaseId) -> String {
        format!("{}/releases/{}", self.deploy_path, id)
    }

    pub fn shared_path(&self, subpath: &str) -> String {
        format!("{}/shared/{}", self.deploy_path, subpath)
    }
}
