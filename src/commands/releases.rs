// ABOUTME: Releases command implementation.
// ABOUTME: Lists releases physically present on the server, marking the live one.

use capstan::config::Config;
use capstan::deploy::RollbackManager;
use capstan::error::Result;
use capstan::output::Output;
use capstan::ssh::Session;

/// List releases present on the server, newest first.
pub async fn releases(config: Config, output: Output) -> Result<()> {
    let app = config.to_application();

    output.progress(&format!("  → Connecting to {}...", config.server.host));
    let session = Session::connect(config.server.ssh_session_config()).await?;

    let manager = RollbackManager::new(&session);
    let result = manager.available_releases(&app, &[]).await;

    if let Err(e) = session.disconnect().await {
        output.warning(&format!("SSH disconnect failed: {}", e));
    }

    let available = result?;
    if available.is_empty() {
        output.success("No releases found");
        return Ok(());
    }

    for release in &available {
        let marker = if release.active { "*" } else { " " };
        output.progress(&format!(
            "{} {}  {}",
            marker,
            release.id,
            release.id.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    output.success(&format!("{} release(s)", available.len()));

    Ok(())
}
