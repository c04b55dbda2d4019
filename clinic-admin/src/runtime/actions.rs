use clinic_api::AppointmentId;

use crate::api::ClinicApi;
use crate::app::{App, BatchDeleteReport};

use super::action_queue::Action;

pub(super) async fn run_action(action: Action, app: &mut App, api: &dyn ClinicApi) {
    match action {
        Action::Login(credentials) => {
            app.session.login(api, &credentials).await;
        }
        Action::Register(new_user) => {
            app.session.register(api, &new_user).await;
        }
        Action::Logout => {
            app.session.logout(api).await;
        }
        Action::FetchProfile { user_id } => {
            app.session.fetch_profile(api, &user_id).await;
        }
        Action::LoadAll => {
            fetch_appointments(app, api).await;
            fetch_patients(app, api).await;
        }
        Action::FetchPatients => {
            fetch_patients(app, api).await;
        }
        Action::SetSelection(ids) => {
            app.selection.set_selection(ids);
        }
        Action::RequestDelete => {
            if !app.selection.can_delete() {
                tracing::debug!("delete is disabled with nothing selected");
                return;
            }
            let selected = app.selection.ids().to_vec();
            app.request_delete(&selected);
        }
        Action::CancelDelete => {
            app.cancel_delete();
        }
        Action::ConfirmDelete => {
            handle_confirm_delete(app, api).await;
        }
        Action::RequestEdit => {
            if let Some(id) = single_selected(app) {
                app.request_edit(&[id]);
            }
        }
        Action::RequestView => {
            if let Some(id) = single_selected(app) {
                app.request_view(&[id]);
            }
        }
    }
}

fn single_selected(app: &App) -> Option<AppointmentId> {
    let id = app.selection.single();
    if id.is_none() {
        tracing::debug!(
            "view/edit needs exactly one selected appointment, have {}",
            app.selection.len()
        );
    }
    id
}

/// Refetch the appointment list. The selection and any pending delete refer
/// to the old snapshot, so both are dropped first.
async fn fetch_appointments(app: &mut App, api: &dyn ClinicApi) {
    app.selection.clear();
    app.delete_context = None;
    app.appointments.fetch_all(api, app.session.token()).await;
}

async fn fetch_patients(app: &mut App, api: &dyn ClinicApi) {
    app.patients.fetch_all(api, app.session.token()).await;
}

async fn handle_confirm_delete(app: &mut App, api: &dyn ClinicApi) {
    let Some(ctx) = app.delete_context.take() else {
        tracing::debug!("confirm delete without an open confirmation");
        return;
    };

    let token = app.session.token();
    let report = match ctx.ids.as_slice() {
        [id] => BatchDeleteReport {
            outcomes: vec![app.appointments.delete_one(api, token, *id).await],
        },
        ids => app.appointments.delete_many(api, token, ids).await,
    };
    app.selection.retain_present(&app.appointments);

    if report.all_succeeded() {
        tracing::info!("deleted {} appointment(s)", report.outcomes.len());
    }
    app.last_delete_report = Some(report);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DevBackend;
    use crate::app::{surface_channel, SessionStore, SurfaceRequest, SurfaceRx};
    use crate::runtime::{channel, drain_actions};
    use crate::storage::SessionStorage;
    use clinic_api::{Appointment, Credentials};

    fn appointment(id: i64) -> Appointment {
        Appointment {
            id: AppointmentId::new(id),
            description: format!("Appointment {}", id),
            schedule: "2024-05-02T09:30:00".into(),
            patient: None,
        }
    }

    fn ids(raw: &[i64]) -> Vec<AppointmentId> {
        raw.iter().copied().map(AppointmentId::new).collect()
    }

    fn app() -> (App, SurfaceRx, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = surface_channel();
        let app = App::new(
            SessionStore::signed_out(SessionStorage::in_dir(dir.path())),
            tx,
        );
        (app, rx, dir)
    }

    async fn run_all(app: &mut App, api: &DevBackend, actions: Vec<Action>) {
        let (tx, mut rx) = channel();
        for action in actions {
            tx.send(action).unwrap();
        }
        drain_actions(&mut rx, app, api).await;
    }

    #[tokio::test]
    async fn confirmed_delete_with_one_failure() {
        let api = DevBackend::default().with_appointments(vec![
            appointment(1),
            appointment(2),
            appointment(3),
        ]);
        api.fail_delete_of(AppointmentId::new(2));
        let (mut app, _surface, _dir) = app();

        run_all(
            &mut app,
            &api,
            vec![
                Action::LoadAll,
                Action::SetSelection(ids(&[1, 2, 3])),
                Action::RequestDelete,
                Action::ConfirmDelete,
            ],
        )
        .await;

        assert_eq!(app.appointments.ids(), ids(&[2]));
        assert!(app.appointments.last_error().is_some());
        assert!(!app.is_delete_dialog_open());
        assert_eq!(app.selection.ids(), ids(&[2]).as_slice());
        let report = app.last_delete_report.as_ref().unwrap();
        assert_eq!(report.deleted(), ids(&[1, 3]));
    }

    #[tokio::test]
    async fn cancel_leaves_everything_in_place() {
        let api = DevBackend::default().with_appointments(vec![appointment(1)]);
        let (mut app, _surface, _dir) = app();

        run_all(
            &mut app,
            &api,
            vec![
                Action::LoadAll,
                Action::SetSelection(ids(&[1])),
                Action::RequestDelete,
                Action::CancelDelete,
                Action::ConfirmDelete,
            ],
        )
        .await;

        assert_eq!(app.appointments.ids(), ids(&[1]));
        assert!(app.last_delete_report.is_none());
        assert!(api.requests_to("DELETE /appointments/:id").is_empty());
    }

    #[tokio::test]
    async fn fetch_clears_selection_and_pending_delete() {
        let api = DevBackend::default().with_appointments(vec![appointment(1), appointment(2)]);
        let (mut app, _surface, _dir) = app();

        run_all(
            &mut app,
            &api,
            vec![
                Action::LoadAll,
                Action::SetSelection(ids(&[1, 2])),
                Action::RequestDelete,
                Action::LoadAll,
            ],
        )
        .await;

        assert!(app.selection.is_empty());
        assert!(!app.is_delete_dialog_open());
        assert_eq!(app.appointments.len(), 2);
    }

    #[tokio::test]
    async fn edit_of_missing_id_is_a_no_op() {
        let api = DevBackend::default().with_appointments(vec![appointment(1)]);
        let (mut app, mut surface, _dir) = app();

        run_all(
            &mut app,
            &api,
            vec![
                Action::LoadAll,
                Action::SetSelection(ids(&[5])),
                Action::RequestEdit,
            ],
        )
        .await;

        assert!(surface.try_recv().is_err());
    }

    #[tokio::test]
    async fn view_of_selected_row_reaches_surface() {
        let api = DevBackend::default().with_appointments(vec![appointment(1)]);
        let (mut app, mut surface, _dir) = app();

        run_all(
            &mut app,
            &api,
            vec![
                Action::LoadAll,
                Action::SetSelection(ids(&[1])),
                Action::RequestView,
            ],
        )
        .await;

        assert!(matches!(surface.try_recv(), Ok(SurfaceRequest::View(p)) if p.id == AppointmentId::new(1)));
    }

    #[tokio::test]
    async fn signed_in_requests_carry_the_token() {
        let api = DevBackend::seeded();
        let (mut app, _surface, _dir) = app();

        run_all(
            &mut app,
            &api,
            vec![Action::Login(Credentials::new("alice", "pw")), Action::LoadAll],
        )
        .await;

        assert_eq!(app.appointments.len(), 4);
        assert_eq!(app.patients.len(), 3);
        for request in api.requests_to("GET /appointments") {
            assert_eq!(request.token.as_deref(), Some("dev-token-alice"));
        }
    }

    #[tokio::test]
    async fn logout_action_clears_session() {
        let api = DevBackend::seeded();
        let (mut app, _surface, _dir) = app();

        run_all(
            &mut app,
            &api,
            vec![Action::Login(Credentials::new("alice", "pw")), Action::Logout],
        )
        .await;

        assert!(!app.session.is_authenticated());
    }

    #[tokio::test]
    async fn single_confirmed_delete_records_server_message() {
        let api = DevBackend::default().with_appointments(vec![appointment(1), appointment(2)]);
        api.fail_delete_of(AppointmentId::new(2));
        let (mut app, _surface, _dir) = app();

        run_all(
            &mut app,
            &api,
            vec![
                Action::LoadAll,
                Action::SetSelection(ids(&[2])),
                Action::RequestDelete,
                Action::ConfirmDelete,
            ],
        )
        .await;

        assert_eq!(app.appointments.ids(), ids(&[1, 2]));
        assert_eq!(
            app.appointments.last_error(),
            Some("Could not delete appointment 2")
        );
        assert_eq!(app.selection.ids(), ids(&[2]).as_slice());
    }

    #[tokio::test]
    async fn view_with_two_selected_is_disabled() {
        let api = DevBackend::default().with_appointments(vec![appointment(1), appointment(2)]);
        let (mut app, mut surface, _dir) = app();

        run_all(
            &mut app,
            &api,
            vec![
                Action::LoadAll,
                Action::SetSelection(ids(&[1, 2])),
                Action::RequestView,
                Action::RequestEdit,
            ],
        )
        .await;

        assert!(surface.try_recv().is_err());
    }

    #[tokio::test]
    async fn delete_with_empty_selection_opens_nothing() {
        let api = DevBackend::default().with_appointments(vec![appointment(1)]);
        let (mut app, _surface, _dir) = app();

        run_all(&mut app, &api, vec![Action::LoadAll, Action::RequestDelete]).await;

        assert!(!app.is_delete_dialog_open());
    }
}
