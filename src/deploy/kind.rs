// ABOUTME: Closed enumeration of deployable application kinds.
// ABOUTME: Kind-specific behavior (shared paths, permissions, post-rollback tasks) is data, not runtime checks.

use crate::types::AppName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of application a deployment target is.
///
/// Everything that varies by kind hangs off this enum: shared subpaths that
/// survive across releases, subpaths the runtime must be able to write, the
/// script variable carrying the runtime version, and the tasks to run after a
/// rollback re-points `current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppKind {
    /// A PHP web-framework application (Laravel-style layout).
    WebFramework,
    /// A long-running Node.js service managed by pm2.
    NodeService,
    /// A static site; nothing persists across releases.
    StaticSite,
}

impl AppKind {
    /// Subpaths that persist across releases under `shared/`.
    /// The secrets file is always part of this set for stateful kinds.
    pub fn shared_paths(&self) -> &'static [&'static str] {
        match self {
            AppKind::WebFramework => &["storage", ".env"],
            AppKind::NodeService => &[".env"],
            AppKind::StaticSite => &[],
        }
    }

    /// Subpaths inside a release the runtime user must be able to write.
    pub fn writable_paths(&self) -> &'static [&'static str] {
        match self {
            AppKind::WebFramework => &["storage", "bootstrap/cache"],
            AppKind::NodeService => &[],
            AppKind::StaticSite => &[],
        }
    }

    /// Name of the rendered environment/secrets file.
    pub fn secrets_file(&self) -> &'static str {
        ".env"
    }

    /// Script variable name carrying the resolved runtime version.
    pub fn runtime_var(&self) -> Option<&'static str> {
        match self {
            AppKind::WebFramework => Some("php_version"),
            AppKind::NodeService => Some("node_version"),
            AppKind::StaticSite => None,
        }
    }

    /// A kind is stateful when it has shared paths to carry across releases.
    pub fn is_stateful(&self) -> bool {
        !self.shared_paths().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppKind::WebFramework => "web-framework",
            AppKind::NodeService => "node-service",
            AppKind::StaticSite => "static-site",
        }
    }

    /// Commands to run after a rollback re-points `current`.
    ///
    /// These are best-effort: their output lands in the deployment log but a
    /// failure does not fail the rollback.
    pub fn post_activation_commands(&self, app: &AppName, current_path: &str) -> Vec<String> {
        match self {
            AppKind::WebFramework => vec![
                format!(
                    "cd {} && php artisan optimize:clear && php artisan config:cache",
                    current_path
                ),
                format!("cd {} && php artisan queue:restart", current_path),
            ],
            AppKind::NodeService => vec![format!("pm2 restart {}", app)],
            AppKind::StaticSite => vec![],
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_paths_include_secrets_for_stateful_kinds() {
        for kind in [AppKind::WebFramework, AppKind::NodeService] {
            assert!(kind.shared_paths().contains(&kind.secrets_file()));
            assert!(kind.is_stateful());
        }
    }

    #[test]
    fn static_site_is_stateless() {
        assert!(!AppKind::StaticSite.is_stateful());
        assert!(AppKind::StaticSite.shared_paths().is_empty());
        assert!(
            AppKind::StaticSite
                .post_activation_commands(&AppName::new("site").unwrap(), "/srv/site/current")
                .is_empty()
        );
    }

    #[test]
    fn node_service_restarts_by_app_name() {
        let app = AppName::new("billing-api").unwrap();
        let cmds = AppKind::NodeService.post_activation_commands(&app, "/srv/billing/current");
        assert_eq!(cmds, vec!["pm2 restart billing-api".to_string()]);
    }

    #[test]
    fn kind_parses_from_kebab_case() {
        let kind: AppKind = serde_yaml::from_str("web-framework").unwrap();
        assert_eq!(kind, AppKind::WebFramework);
    }
}
