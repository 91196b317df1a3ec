// ABOUTME: Deploy command implementation.
// ABOUTME: Connects to the configured server and runs one deployment attempt.

use capstan::config::Config;
use capstan::deploy::{Deployment, DeploymentOrchestrator};
use capstan::diagnostics::{Diagnostics, Warning};
use capstan::error::Result;
use capstan::output::Output;
use capstan::ssh::Session;

/// Deploy the application to its configured server.
pub async fn deploy(config: Config, mut output: Output) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();

    let mut app = config.to_application();
    let mut deployment = Deployment::new(1, app.name.clone());

    output.progress(&format!(
        "Deploying {} ({} branch) to {}",
        app.name, app.branch, config.server.host
    ));
    output.progress(&format!("  → Connecting to {}...", config.server.host));

    let session = Session::connect(config.server.ssh_session_config()).await?;

    let orchestrator = DeploymentOrchestrator::new(&session);
    let result = orchestrator.run(&mut app, &mut deployment).await;

    // The deployment log is the operator-facing timeline; show it whether
    // the run succeeded or not.
    for line in deployment.log.lines() {
        output.progress(&format!("  {}", line));
    }

    // Disconnect SSH session (non-fatal if it fails)
    if let Err(e) = session.disconnect().await {
        diag.warn(Warning::ssh_disconnect(format!(
            "SSH disconnect failed for {}: {}",
            config.server.host, e
        )));
    }

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    result?;
    output.success("Deployment complete!");
    Ok(())
}
