// ABOUTME: Deployment strategy selection based on application configuration.
// ABOUTME: Determines whether to use atomic releases or legacy in-place deploys.

use super::application::Application;

/// Strategy for materializing a deployment on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStrategy {
    /// Release-per-attempt with an atomic `current` symlink swap.
    /// Zero downtime, instant rollback.
    Atomic,

    /// Deploy directly into a single working directory. No release history
    /// and no rollback; a failed script leaves the tree as-is.
    InPlace,
}

impl DeployStrategy {
    pub fn for_application(app: &Application) -> Self {
        if app.zero_downtime {
            DeployStrategy::Atomic
        } else {
            DeployStrategy::InPlace
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{AppKind, ApplicationStatus};
    use crate::types::AppName;

    fn app(zero_downtime: bool) -> Application {
        Application {
            name: AppName::new("shop").unwrap(),
            kind: AppKind::WebFramework,
            repository: "https://github.com/acme/shop.git".to_string(),
            branch: "main".to_string(),
            deploy_path: "/var/www/shop".to_string(),
            keep_releases: 5,
            zero_downtime,
            script: String::new(),
            environment: String::new(),
            runtime_version: None,
            status: ApplicationStatus::Idle,
        }
    }

    #[test]
    fn atomic_when_zero_downtime_enabled() {
        assert_eq!(
            DeployStrategy::for_application(&app(true)),
            DeployStrategy::Atomic
        );
    }

    #[test]
    fn in_place_when_opted_out() {
        assert_eq!(
            DeployStrategy::for_application(&app(false)),
            DeployStrategy::InPlace
        );
    }
}
