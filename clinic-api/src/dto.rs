use serde::Serialize;

/// Body for `POST /auth/logout`; the backend only reads the bearer header.
#[derive(Serialize)]
pub struct LogoutRequest {}
