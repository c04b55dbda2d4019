mod entities;
mod selection;
mod session;
mod status;
mod surface;

pub use entities::{AppointmentStore, BatchDeleteReport, PatientStore};
pub use selection::Selection;
pub use session::SessionStore;
pub use status::OperationStatus;
pub use surface::{surface_channel, AppointmentPayload, SurfaceRequest, SurfaceRx};

use surface::SurfaceTx;

use clinic_api::{Appointment, AppointmentId};

/// Ids captured when the delete confirmation was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteContext {
    pub ids: Vec<AppointmentId>,
}

pub struct App {
    pub session: SessionStore,
    pub appointments: AppointmentStore,
    pub patients: PatientStore,
    pub selection: Selection,
    pub delete_context: Option<DeleteContext>,
    pub last_delete_report: Option<BatchDeleteReport>,
    surface_tx: SurfaceTx,
}

impl App {
    pub fn new(session: SessionStore, surface_tx: SurfaceTx) -> Self {
        Self {
            session,
            appointments: AppointmentStore::new(),
            patients: PatientStore::new(),
            selection: Selection::default(),
            delete_context: None,
            last_delete_report: None,
            surface_tx,
        }
    }

    pub fn is_delete_dialog_open(&self) -> bool {
        self.delete_context.is_some()
    }

    /// Open the delete confirmation for `selected`. Nothing is deleted yet.
    pub fn request_delete(&mut self, selected: &[AppointmentId]) -> bool {
        if selected.is_empty() {
            tracing::debug!("delete requested with nothing selected");
            return false;
        }
        tracing::debug!("confirm delete of {:?}", selected);
        self.delete_context = Some(DeleteContext {
            ids: selected.to_vec(),
        });
        true
    }

    pub fn cancel_delete(&mut self) {
        self.delete_context = None;
    }

    pub fn request_edit(&self, selected: &[AppointmentId]) -> bool {
        self.forward(selected, SurfaceRequest::Edit)
    }

    pub fn request_view(&self, selected: &[AppointmentId]) -> bool {
        self.forward(selected, SurfaceRequest::View)
    }

    /// The loaded appointment behind a single-row selection.
    pub fn resolve_single(&self, selected: &[AppointmentId]) -> Option<&Appointment> {
        let [id] = selected else {
            tracing::debug!("need exactly one selected appointment, got {}", selected.len());
            return None;
        };

        let found = self.appointments.get(*id);
        if found.is_none() {
            tracing::warn!("appointment {} is not in the loaded list", id);
        }
        found
    }

    fn forward(
        &self,
        selected: &[AppointmentId],
        surface: fn(AppointmentPayload) -> SurfaceRequest,
    ) -> bool {
        let Some(appointment) = self.resolve_single(selected) else {
            return false;
        };

        let payload = AppointmentPayload::from_appointment(appointment);
        if self.surface_tx.send(surface(payload)).is_err() {
            tracing::warn!("no surface is listening for appointment {}", appointment.id);
            return false;
        }
        true
    }
}
