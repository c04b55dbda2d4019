use clinic_api::{Appointment, ErrorKind, ProfileData, ScheduleUrgency, Session};
use time::OffsetDateTime;

use crate::app::{
    AppointmentPayload, AppointmentStore, BatchDeleteReport, OperationStatus, PatientStore,
    Selection,
};
use crate::time_utils::{format_schedule, relative_to};

const DESCRIPTION_WIDTH: usize = 32;

fn urgency_tag(urgency: ScheduleUrgency) -> &'static str {
    match urgency {
        ScheduleUrgency::Overdue => "overdue",
        ScheduleUrgency::Soon => "soon",
        ScheduleUrgency::Upcoming => "upcoming",
        ScheduleUrgency::Unscheduled => "-",
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Formatted schedule plus relative phrase, or the raw string when it does
/// not parse.
pub fn schedule_cell(appointment: &Appointment, now: OffsetDateTime) -> (String, String) {
    match appointment.scheduled_at(now.offset()) {
        Some(at) => (
            format_schedule(at.to_offset(now.offset())),
            relative_to(at, now),
        ),
        None => (appointment.schedule.clone(), String::new()),
    }
}

pub fn appointments_table(
    store: &AppointmentStore,
    selection: &Selection,
    now: OffsetDateTime,
) -> String {
    if store.is_empty() {
        return "No appointments.".to_string();
    }

    let mut lines = vec![format!(
        "  {:>5}  {:<width$}  {:<16}  {:<16}  {:<9}  {}",
        "ID",
        "DESCRIPTION",
        "SCHEDULE",
        "WHEN",
        "STATUS",
        "PATIENT",
        width = DESCRIPTION_WIDTH
    )];

    for appointment in store.items() {
        let marker = if selection.ids().contains(&appointment.id) {
            '*'
        } else {
            ' '
        };
        let (schedule, relative) = schedule_cell(appointment, now);
        lines.push(format!(
            "{} {:>5}  {:<width$}  {:<16}  {:<16}  {:<9}  {}",
            marker,
            appointment.id,
            truncate(&appointment.description, DESCRIPTION_WIDTH),
            schedule,
            relative,
            urgency_tag(appointment.urgency_at(now)),
            appointment.patient_label(),
            width = DESCRIPTION_WIDTH
        ));
    }

    lines.push(selection_footer(store.len(), selection));
    lines.join("\n")
}

/// Row count plus which grid actions the current selection enables.
fn selection_footer(rows: usize, selection: &Selection) -> String {
    if selection.is_empty() {
        return format!("{} appointment(s)", rows);
    }

    let enabled: Vec<&str> = [
        (selection.can_view_or_edit(), "view"),
        (selection.can_view_or_edit(), "edit"),
        (selection.can_delete(), "delete"),
    ]
    .into_iter()
    .filter_map(|(on, name)| on.then_some(name))
    .collect();
    format!(
        "{} appointment(s), {} selected: {}",
        rows,
        selection.len(),
        enabled.join(", ")
    )
}

pub fn patients_table(store: &PatientStore) -> String {
    if store.is_empty() {
        return "No patients.".to_string();
    }

    let mut lines = vec![format!("{:>5}  {:<16}  {}", "ID", "SOCIAL SECURITY", "NAME")];
    lines.extend(store.items().iter().map(|patient| {
        format!(
            "{:>5}  {:<16}  {}",
            patient.id,
            patient.social_security,
            patient.full_name()
        )
    }));
    lines.join("\n")
}

/// One line for a store's status, `None` while idle.
pub fn status_line(label: &str, status: &OperationStatus) -> Option<String> {
    if status.is_loading() {
        return Some(format!("{}: loading...", label));
    }
    status
        .error()
        .map(|message| format!("{}: {}", label, message))
}

pub fn payload_detail(heading: &str, payload: &AppointmentPayload) -> String {
    let mut lines = vec![
        format!("{} appointment {}", heading, payload.id),
        format!("  description: {}", payload.description),
        format!("  schedule:    {}", payload.schedule),
    ];
    match &payload.patient_response {
        Some(json) => lines.push(format!("  patient:     {}", json)),
        None => lines.push("  patient:     (not found)".to_string()),
    }
    lines.join("\n")
}

pub fn delete_report(report: &BatchDeleteReport) -> String {
    let deleted = report.deleted();
    let mut lines = Vec::new();
    if !deleted.is_empty() {
        let ids: Vec<String> = deleted.iter().map(ToString::to_string).collect();
        lines.push(format!("Deleted: {}", ids.join(", ")));
    }
    if let Some(summary) = report.failure_summary() {
        lines.push(summary);
    }
    let stale: Vec<String> = report
        .failed()
        .iter()
        .filter(|o| matches!(&o.result, Err(f) if f.kind == ErrorKind::NotFound))
        .map(|o| o.id.to_string())
        .collect();
    if !stale.is_empty() {
        lines.push(format!(
            "No longer on the server: {} (refresh the list)",
            stale.join(", ")
        ));
    }
    lines.join("\n")
}

pub fn session_summary(session: &Session) -> String {
    format!(
        "Logged in as {} ({}, {})",
        session.full_name(),
        session.email,
        session.role
    )
}

pub fn profile_detail(profile: &ProfileData) -> String {
    format!(
        "{} {}\n  email: {}\n  role:  {}",
        profile.first_name, profile.last_name, profile.email, profile.role
    )
}
