use anyhow::{Context, Result};

use crate::api::{ClinicApi, ClinicClient, DevBackend};
use crate::app::App;
use crate::config::ClinicConfig;
use crate::runtime::{self, Action};
use crate::storage::{self, SessionStorage};

const DEV_SESSION_FILE: &str = "dev-session.json";

/// Backend and session file for this run. Dev mode keeps its session apart
/// from the real one.
pub fn connect(dev: bool, config: &ClinicConfig) -> Result<(Box<dyn ClinicApi>, SessionStorage)> {
    if dev {
        tracing::info!("using in-memory dev backend");
        let storage = SessionStorage::new(storage::root_path()?.join(DEV_SESSION_FILE));
        return Ok((Box::new(DevBackend::seeded()), storage));
    }

    let client = ClinicClient::new(&config.api_url, config.request_timeout())
        .with_context(|| format!("Failed to create client for {}", config.api_url))?;
    tracing::debug!("using clinic backend at {}", client.base_url());
    Ok((Box::new(client), SessionStorage::default_location()?))
}

/// Load what the appointment grid shows when it opens: appointments and
/// the patient list.
pub async fn initialize_app_state(app: &mut App, api: &dyn ClinicApi) -> Result<()> {
    let (action_tx, mut action_rx) = runtime::channel();
    action_tx
        .send(Action::LoadAll)
        .context("Action queue closed")?;
    runtime::drain_actions(&mut action_rx, app, api).await;

    if let Some(message) = app.patients.last_error() {
        tracing::warn!("could not load patients: {}", message);
    }
    Ok(())
}
