//! Text rendering for the terminal: history lines, dates, runtimes.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use qrzlog::protocol::{Qso, fields};

/// `20240102` → `Tue Jan 02, 2024`. Anything unparseable is shown as-is.
pub fn format_qso_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw, "%Y%m%d") {
        Ok(date) => date.format("%a %b %d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Prior contacts with `callsign`, or a first-contact note when there are
/// none.
pub fn history(callsign: &str, qsos: &[Qso]) -> String {
    let callsign = callsign.to_uppercase();
    if qsos.is_empty() {
        return format!("\nYou are working {callsign} for the first time!");
    }

    let mut out = format!(
        "\nYou worked {callsign} {} time(s) on the following date(s):\n",
        qsos.len()
    );
    for qso in qsos {
        let _ = write!(
            out,
            "\n\t{} between {}-{} UTC on {} {}",
            format_qso_date(qso.get_or_empty(fields::QSO_DATE)),
            qso.get_or_empty(fields::TIME_ON),
            qso.get_or_empty(fields::TIME_OFF),
            qso.get_or_empty(fields::BAND).to_uppercase(),
            qso.get_or_empty(fields::MODE).to_uppercase(),
        );
    }
    out
}

/// `HH:MM:SS`; hours keep counting past 24.
pub fn format_runtime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// UTC date as `YYYYMMDD`.
pub fn qso_date(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d").to_string()
}

/// UTC time as `HHMM`.
pub fn qso_time(at: DateTime<Utc>) -> String {
    at.format("%H%M").to_string()
}
