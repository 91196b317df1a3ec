// ABOUTME: Deploy script preparation.
// ABOUTME: Plain {{variable}} substitution and log echoing of script lines.

use super::application::Application;
use super::strategy::DeployStrategy;

/// Substitute `{{name}}` placeholders in a script with their values.
///
/// Plain textual substitution; the script is operator-authored and trusted,
/// so no quoting or escaping is applied.
pub fn substitute(script: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = script.to_string();
    for (name, value) in vars {
        rendered = rendered.replace(&format!("{{{{{}}}}}", name), value);
    }
    rendered
}

/// The variables a deploy script sees, for the given working path.
///
/// `work_path` is the release directory for atomic deployments and the base
/// deploy path for in-place ones; both names are substituted so scripts work
/// under either strategy.
pub fn script_vars<'a>(
    app: &'a Application,
    strategy: DeployStrategy,
    work_path: &'a str,
) -> Vec<(&'a str, &'a str)> {
    let mut vars = vec![
        ("release_path", work_path),
        ("deploy_path", work_path),
        ("branch", app.branch.as_str()),
        ("app", app.name.as_str()),
        ("kind", app.kind.as_str()),
    ];
    // In-place scripts typically `git pull`; give them the repository too.
    if strategy == DeployStrategy::InPlace {
        vars.push(("repository", app.repository.as_str()));
    }
    if let (Some(var), Some(version)) = (app.kind.runtime_var(), app.runtime_version.as_deref()) {
        vars.push((var, version));
    }
    vars
}

/// Script lines worth echoing to the deployment log: non-empty, non-comment.
pub fn echo_lines(script: &str) -> impl Iterator<Item = &str> {
    script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_all_occurrences() {
        let rendered = substitute(
            "cd {{release_path}} && echo {{branch}} {{branch}}",
            &[("release_path", "/srv/app/releases/1"), ("branch", "main")],
        );
        assert_eq!(rendered, "cd /srv/app/releases/1 && echo main main");
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let rendered = substitute("echo {{mystery}}", &[("branch", "main")]);
        assert_eq!(rendered, "echo {{mystery}}");
    }

    #[test]
    fn vars_cover_path_branch_app_kind_and_runtime() {
        use crate::deploy::{AppKind, Application, ApplicationStatus};
        use crate::types::AppName;

        let app = Application {
            name: AppName::new("shop").unwrap(),
            kind: AppKind::WebFramework,
            repository: "https://github.com/acme/shop.git".to_string(),
            branch: "main".to_string(),
            deploy_path: "/var/www/shop".to_string(),
            keep_releases: 5,
            zero_downtime: true,
            script: String::new(),
            environment: String::new(),
            runtime_version: Some("8.3".to_string()),
            status: ApplicationStatus::Idle,
        };

        let vars = script_vars(&app, DeployStrategy::Atomic, "/var/www/shop/releases/x");
        let get = |name: &str| vars.iter().find(|(n, _)| *n == name).map(|(_, v)| *v);

        assert_eq!(get("release_path"), Some("/var/www/shop/releases/x"));
        assert_eq!(get("branch"), Some("main"));
        assert_eq!(get("app"), Some("shop"));
        assert_eq!(get("kind"), Some("web-framework"));
        assert_eq!(get("php_version"), Some("8.3"));
        // The repository is only exposed to in-place scripts.
        assert_eq!(get("repository"), None);
    }

    #[test]
    fn echo_lines_skip_blanks_and_comments() {
        let script = "# install deps\ncomposer install\n\n  php artisan migrate --force\n";
        let lines: Vec<&str> = echo_lines(script).collect();
        assert_eq!(lines, vec!["composer install", "php artisan migrate --force"]);
    }
}
