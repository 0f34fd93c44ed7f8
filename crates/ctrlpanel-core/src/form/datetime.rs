//! Conversion between backend timestamps and the editable local form.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Editable representation: local date and time, minute precision.
pub const LOCAL_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Convert a backend timestamp to `YYYY-MM-DDTHH:MM`.
///
/// Timestamps with an offset are shifted to local time; naive timestamps keep
/// their wall-clock value. Input that does not parse is returned trimmed.
#[must_use]
pub fn to_local_input(server: &str) -> String {
    let normalised = server.trim().replacen(' ', "T", 1);

    if let Ok(stamp) = DateTime::parse_from_rfc3339(&normalised) {
        return stamp
            .with_timezone(&Local)
            .format(LOCAL_INPUT_FORMAT)
            .to_string();
    }
    for format in NAIVE_FORMATS {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(&normalised, format) {
            return stamp.format(LOCAL_INPUT_FORMAT).to_string();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&normalised, "%Y-%m-%d") {
        return format!("{}T00:00", date.format("%Y-%m-%d"));
    }

    tracing::debug!(value = server, "timestamp left as entered");
    server.trim().to_string()
}

/// Convert the editable form to the backend's space-separated form.
#[must_use]
pub fn to_wire(local: &str) -> String {
    local.trim().replacen('T', " ", 1)
}
