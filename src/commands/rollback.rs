// ABOUTME: Rollback command implementation.
// ABOUTME: Selects a target release from the host and re-points current at it.

use capstan::config::Config;
use capstan::deploy::{DeployError, Deployment, RollbackManager};
use capstan::diagnostics::{Diagnostics, Warning};
use capstan::error::{Error, Result};
use capstan::output::Output;
use capstan::ssh::Session;
use capstan::types::ReleaseId;

/// Roll back to a prior release.
///
/// The CLI keeps no deployment records, so the target is selected from the
/// releases physically present on the host: the one named by `--release`, or
/// the newest release that is not currently live. A CRUD layer embedding the
/// engine would pass its stored records instead.
pub async fn rollback(config: Config, release: Option<String>, mut output: Output) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();

    let mut app = config.to_application();

    output.progress(&format!(
        "Rolling back {} on {}",
        app.name, config.server.host
    ));
    output.progress(&format!("  → Connecting to {}...", config.server.host));

    let session = Session::connect(config.server.ssh_session_config()).await?;

    let manager = RollbackManager::new(&session);
    let result = rollback_inner(&manager, &mut app, release, &output).await;

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
    output.success("Rollback complete!");
    Ok(())
}

async fn rollback_inner(
    manager: &RollbackManager<'_, Session>,
    app: &mut capstan::deploy::Application,
    release: Option<String>,
    output: &Output,
) -> Result<()> {
    let available = manager.available_releases(app, &[]).await?;

    let entry = match &release {
        Some(id_str) => {
            let id: ReleaseId = id_str
                .parse()
                .map_err(|e| Error::InvalidConfig(format!("{}", e)))?;
            available
                .iter()
                .find(|r| r.id == id)
                .ok_or(DeployError::ReleaseMissing(id_str.clone()))?
        }
        None => {
            // Releases are listed newest first; the newest one that is not
            // live is "previous".
            available
                .iter()
                .find(|r| !r.active)
                .ok_or(DeployError::NoPreviousDeployment)?
        }
    };

    // Synthesize the target record from the on-host release.
    let mut target = Deployment::new(0, app.name.clone());
    target.release_id = Some(entry.id);
    target.release_path = Some(entry.path.clone());

    let mut record = Deployment::new(1, app.name.clone());
    let mut history: Vec<Deployment> = Vec::new();

    let result = manager.rollback(app, &target, &mut record, &mut history).await;

    for line in record.log.lines() {
        output.progress(&format!("  {}", line));
    }

    result?;
    Ok(())
}
