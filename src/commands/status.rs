// ABOUTME: Status command implementation.
// ABOUTME: Shows the configured target and what release is currently live.

use capstan::config::Config;
use capstan::deploy::{DeployStrategy, ReleaseManager};
use capstan::error::Result;
use capstan::output::Output;
use capstan::ssh::Session;

/// Show the application's configuration and live release.
pub async fn status(config: Config, output: Output) -> Result<()> {
    let app = config.to_application();

    output.progress(&format!("App:       {}", app.name));
    output.progress(&format!("Kind:      {}", app.kind));
    output.progress(&format!("Server:    {}", config.server.host));
    output.progress(&format!("Branch:    {}", app.branch));
    output.progress(&format!(
        "Strategy:  {:?}",
        DeployStrategy::for_application(&app)
    ));

    output.progress(&format!("  → Connecting to {}...", config.server.host));
    let session = Session::connect(config.server.ssh_session_config()).await?;

    let manager = ReleaseManager::new(&session, &app);
    let result = async {
        let initialized = manager.is_initialized().await?;
        let current = if initialized {
            manager.current_release_path().await?
        } else {
            None
        };
        Ok::<_, capstan::deploy::DeployError>((initialized, current))
    }
    .await;

    if let Err(e) = session.disconnect().await {
        output.warning(&format!("SSH disconnect failed: {}", e));
    }

    let (initialized, current) = result?;
    if !initialized {
        output.success("Not deployed yet (release layout missing)");
        return Ok(());
    }

    match current {
        Some(path) => output.success(&format!("Live release: {}", path)),
        None => output.success("Release layout present, nothing activated yet"),
    }

    Ok(())
}
