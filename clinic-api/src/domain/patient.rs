use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::PatientId;

/// A patient as listed by `GET /patients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    #[serde(rename = "socialSecurity", alias = "socialSecurityId")]
    pub social_security: String,
    pub first_name: String,
    pub surname: String,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}

/// The patient reference nested inside an appointment.
///
/// Older backends omit the id on the nested record. When decoded from the
/// server, `raw` holds the record exactly as it was sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<PatientId>,
    #[serde(rename = "socialSecurity")]
    pub social_security: String,
    pub first_name: String,
    pub surname: String,
    #[serde(skip)]
    pub raw: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatientSummaryFields {
    #[serde(default)]
    id: Option<PatientId>,
    #[serde(rename = "socialSecurity", alias = "socialSecurityId")]
    social_security: String,
    first_name: String,
    surname: String,
}

impl<'de> Deserialize<'de> for PatientSummary {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let fields = PatientSummaryFields::deserialize(&raw).map_err(de::Error::custom)?;
        Ok(Self {
            id: fields.id,
            social_security: fields.social_security,
            first_name: fields.first_name,
            surname: fields.surname,
            raw: Some(raw),
        })
    }
}

impl PatientSummary {
    /// JSON of the record: the server's original when there is one.
    pub fn to_json(&self) -> serde_json::Result<String> {
        match &self.raw {
            Some(raw) => serde_json::to_string(raw),
            None => serde_json::to_string(self),
        }
    }

    /// Grid label: `"<social security> | <first name> <surname>"`.
    pub fn label(&self) -> String {
        format!(
            "{} | {} {}",
            self.social_security, self.first_name, self.surname
        )
    }
}
