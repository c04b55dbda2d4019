use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, num::ParseIntError, str::FromStr};

/// Server-assigned appointment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(i64);

impl AppointmentId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AppointmentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for AppointmentId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(i64);

impl PatientId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PatientId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// User identifier as issued by the auth endpoints.
///
/// Backends send either a JSON string or a number; both are kept in string
/// form so stored sessions and comparisons see one representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUserId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawUserId::deserialize(deserializer)? {
            RawUserId::Text(id) => Self(id),
            RawUserId::Signed(id) => Self(id.to_string()),
            RawUserId::Unsigned(id) => Self(id.to_string()),
        })
    }
}

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appointment_id_parses_from_cli_input() {
        assert_eq!(" 42 ".parse::<AppointmentId>().unwrap(), AppointmentId::new(42));
        assert!("forty-two".parse::<AppointmentId>().is_err());
    }

    #[test]
    fn user_id_deserializes_from_plain_string() {
        let id: UserId = serde_json::from_str("\"17\"").unwrap();
        assert_eq!(id.as_str(), "17");
    }

    #[test]
    fn user_id_accepts_numeric_json() {
        let id: UserId = serde_json::from_str("17").unwrap();
        assert_eq!(id, UserId::new("17"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"17\"");
    }

    #[test]
    fn user_id_rejects_other_json_types() {
        assert!(serde_json::from_str::<UserId>("true").is_err());
        assert!(serde_json::from_str::<UserId>("1.5").is_err());
    }
}
