use clinic_api::ApiError;

/// Status of the latest operation a store ran.
///
/// Entering `Loading` drops any previous error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationStatus {
    #[default]
    Idle,
    Loading,
    Failed {
        message: String,
    },
}

impl OperationStatus {
    pub fn begin(&mut self) {
        *self = Self::Loading;
    }

    pub fn succeed(&mut self) {
        *self = Self::Idle;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        *self = Self::Failed {
            message: message.into(),
        };
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// The server's own message when it sent one, otherwise `generic`.
pub fn failure_message(err: &ApiError, generic: &str) -> String {
    err.server_message()
        .map(str::to_string)
        .unwrap_or_else(|| generic.to_string())
}
