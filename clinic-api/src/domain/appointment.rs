use serde::{Deserialize, Serialize};
use time::{
    format_description::{well_known::Rfc3339, BorrowedFormatItem},
    macros::format_description,
    OffsetDateTime, PrimitiveDateTime, UtcOffset,
};

use super::{AppointmentId, PatientSummary};

/// Offset-less layouts the backend has been seen to emit, tried in order.
const LOCAL_SCHEDULE_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

/// Minutes ahead of an appointment at which it counts as imminent.
pub const SOON_THRESHOLD_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub description: String,
    /// Raw schedule timestamp as sent by the server.
    pub schedule: String,
    #[serde(rename = "patientResponse", default)]
    pub patient: Option<PatientSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleUrgency {
    Overdue,
    Soon,
    Upcoming,
    Unscheduled,
}

impl Appointment {
    pub fn patient_label(&self) -> String {
        self.patient
            .as_ref()
            .map(PatientSummary::label)
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Parsed schedule. Offset-less timestamps are read in `local_offset`.
    pub fn scheduled_at(&self, local_offset: UtcOffset) -> Option<OffsetDateTime> {
        parse_schedule(&self.schedule, local_offset)
    }

    pub fn urgency_at(&self, now: OffsetDateTime) -> ScheduleUrgency {
        let Some(scheduled) = self.scheduled_at(now.offset()) else {
            return ScheduleUrgency::Unscheduled;
        };

        // Whole minutes, truncated toward zero.
        let minutes = (scheduled - now).whole_minutes();
        if minutes < 0 {
            ScheduleUrgency::Overdue
        } else if minutes <= SOON_THRESHOLD_MINUTES {
            ScheduleUrgency::Soon
        } else {
            ScheduleUrgency::Upcoming
        }
    }
}

pub fn parse_schedule(raw: &str, local_offset: UtcOffset) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt);
    }

    LOCAL_SCHEDULE_FORMATS.iter().find_map(|format| {
        PrimitiveDateTime::parse(raw, *format)
            .ok()
            .map(|dt| dt.assume_offset(local_offset))
    })
}
