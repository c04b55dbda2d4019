use time::{OffsetDateTime, UtcOffset};

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn to_local_time(dt: OffsetDateTime) -> OffsetDateTime {
    dt.to_offset(local_offset())
}

/// `YYYY-MM-DD HH:MM` in the timestamp's own offset.
pub fn format_schedule(dt: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}",
        dt.year(),
        dt.month() as u8,
        dt.day(),
        dt.hour(),
        dt.minute()
    )
}

/// Relative phrase such as "in 20 minutes" or "3 days ago".
pub fn relative_to(target: OffsetDateTime, now: OffsetDateTime) -> String {
    let delta = target - now;
    let seconds = delta.whole_seconds().abs();
    let future = delta.is_positive();

    let minutes = (seconds as f64 / 60.0).round() as i64;
    let hours = (seconds as f64 / 3600.0).round() as i64;
    let days = (seconds as f64 / 86_400.0).round() as i64;

    let span = match seconds {
        s if s < 45 => "a few seconds".to_string(),
        s if s < 90 => "a minute".to_string(),
        s if s < 45 * 60 => format!("{} minutes", minutes),
        s if s < 90 * 60 => "an hour".to_string(),
        s if s < 22 * 3600 => format!("{} hours", hours),
        s if s < 36 * 3600 => "a day".to_string(),
        s if s < 26 * 86_400 => format!("{} days", days),
        s if s < 45 * 86_400 => "a month".to_string(),
        s if s < 320 * 86_400 => format!("{} months", (days as f64 / 30.4).round() as i64),
        s if s < 548 * 86_400 => "a year".to_string(),
        _ => format!("{} years", (days as f64 / 365.0).round() as i64),
    };

    if future {
        format!("in {}", span)
    } else {
        format!("{} ago", span)
    }
}
