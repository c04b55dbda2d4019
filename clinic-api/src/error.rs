use thiserror::Error;

/// Coarse classification used by callers that only care about the kind of
/// failure, not its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Auth,
    Validation,
    NotFound,
    Server,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{call} failed: {detail}")]
    Network { call: String, detail: String },
    #[error("{call} unauthorized{}", suffix(.message))]
    Auth {
        call: String,
        message: Option<String>,
    },
    #[error("{call} rejected the request{}", suffix(.message))]
    Validation {
        call: String,
        message: Option<String>,
    },
    #[error("{call} returned an unreadable response: {detail}")]
    InvalidResponse { call: String, detail: String },
    #[error("{call}: not found{}", suffix(.message))]
    NotFound {
        call: String,
        message: Option<String>,
    },
    #[error("{call} returned {status}{}", suffix(.message))]
    Server {
        call: String,
        status: u16,
        message: Option<String>,
    },
}

fn suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl ApiError {
    pub fn network(call: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Network {
            call: call.into(),
            detail: err.to_string(),
        }
    }

    pub fn invalid_response(call: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::InvalidResponse {
            call: call.into(),
            detail: err.to_string(),
        }
    }

    /// Map a non-success HTTP status onto the taxonomy.
    pub fn from_status(call: impl Into<String>, status: u16, message: Option<String>) -> Self {
        let call = call.into();
        match status {
            401 | 403 => Self::Auth { call, message },
            400 | 422 => Self::Validation { call, message },
            404 => Self::NotFound { call, message },
            _ => Self::Server {
                call,
                status,
                message,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Validation { .. } | Self::InvalidResponse { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Server { .. } => ErrorKind::Server,
        }
    }

    /// Message supplied by the server in the error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Auth { message, .. }
            | Self::Validation { message, .. }
            | Self::NotFound { message, .. }
            | Self::Server { message, .. } => message.as_deref(),
            Self::Network { .. } | Self::InvalidResponse { .. } => None,
        }
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Accepts `{"message": ...}` or `{"error": ...}` JSON, or a short plain-text
/// body. HTML error pages and empty bodies yield `None`.
pub(crate) fn extract_server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        return ["message", "error", "detail"]
            .iter()
            .find_map(|key| value.get(key)?.as_str())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
    }

    if body.starts_with('<') || body.len() > 200 {
        return None;
    }
    Some(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_taxonomy() {
        assert_eq!(ApiError::from_status("x", 401, None).kind(), ErrorKind::Auth);
        assert_eq!(ApiError::from_status("x", 403, None).kind(), ErrorKind::Auth);
        assert_eq!(
            ApiError::from_status("x", 422, None).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ApiError::from_status("x", 404, None).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(ApiError::from_status("x", 502, None).kind(), ErrorKind::Server);
    }

    #[test]
    fn display_includes_server_message() {
        let err = ApiError::from_status(
            "POST /auth/login",
            401,
            Some("Bad credentials".to_string()),
        );
        assert_eq!(err.to_string(), "POST /auth/login unauthorized: Bad credentials");
        assert_eq!(err.server_message(), Some("Bad credentials"));
    }

    #[test]
    fn network_errors_have_no_server_message() {
        let err = ApiError::network("GET /appointments", "connection refused");
        assert_eq!(err.server_message(), None);
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn extracts_message_from_json_and_text() {
        assert_eq!(
            extract_server_message(r#"{"message":"Token expired"}"#).as_deref(),
            Some("Token expired")
        );
        assert_eq!(
            extract_server_message(r#"{"status":500,"error":"Internal Server Error"}"#)
                .as_deref(),
            Some("Internal Server Error")
        );
        assert_eq!(
            extract_server_message("Username already taken").as_deref(),
            Some("Username already taken")
        );
        assert_eq!(extract_server_message("<html>oops</html>"), None);
        assert_eq!(extract_server_message("   "), None);
        assert_eq!(extract_server_message(r#"{"code":7}"#), None);
    }
}
