mod dev_backend;

pub use clinic_api::{ClinicApi, ClinicClient};
pub use dev_backend::DevBackend;
