use crate::api::ClinicApi;
use crate::app::App;

use super::action_queue::ActionRx;
use super::actions::run_action;

/// Run every queued action in order, one at a time.
pub async fn drain_actions(action_rx: &mut ActionRx, app: &mut App, api: &dyn ClinicApi) {
    while let Ok(action) = action_rx.try_recv() {
        run_action(action, app, api).await;
    }
}
