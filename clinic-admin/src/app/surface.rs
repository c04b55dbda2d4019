use clinic_api::{Appointment, AppointmentId};
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// What the edit and view surfaces receive for a single appointment.
///
/// `patient_response` is the nested patient reference as JSON, forwarded as the
/// server sent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPayload {
    pub id: AppointmentId,
    pub description: String,
    pub schedule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_response: Option<String>,
}

impl AppointmentPayload {
    pub fn from_appointment(appointment: &Appointment) -> Self {
        let patient_response = match &appointment.patient {
            Some(patient) => match patient.to_json() {
                Ok(json) => Some(json),
                Err(e) => {
                    tracing::warn!("could not serialize patient of {}: {}", appointment.id, e);
                    None
                }
            },
            None => {
                tracing::warn!("patient data not found for appointment {}", appointment.id);
                None
            }
        };

        Self {
            id: appointment.id,
            description: appointment.description.clone(),
            schedule: appointment.schedule.clone(),
            patient_response,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceRequest {
    Edit(AppointmentPayload),
    View(AppointmentPayload),
}

pub type SurfaceTx = UnboundedSender<SurfaceRequest>;
pub type SurfaceRx = UnboundedReceiver<SurfaceRequest>;

pub fn surface_channel() -> (SurfaceTx, SurfaceRx) {
    mpsc::unbounded_channel()
}
