use clinic_api::{AppointmentId, Credentials, NewUser, UserId};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone)]
pub enum Action {
    Login(Credentials),
    Register(NewUser),
    Logout,
    FetchProfile { user_id: UserId },
    /// Appointments and patients, as the grid loads them when opened.
    LoadAll,
    FetchPatients,
    SetSelection(Vec<AppointmentId>),
    RequestDelete,
    CancelDelete,
    ConfirmDelete,
    RequestEdit,
    RequestView,
}

pub type ActionTx = UnboundedSender<Action>;
pub type ActionRx = UnboundedReceiver<Action>;

pub fn channel() -> (ActionTx, ActionRx) {
    mpsc::unbounded_channel()
}
