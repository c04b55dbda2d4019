mod appointment;
mod ids;
mod patient;
mod session;

pub use appointment::*;
pub use ids::*;
pub use patient::*;
pub use session::*;
