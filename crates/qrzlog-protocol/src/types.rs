//! Core wire types shared by the codecs and the clients.
//!
//! These mirror what actually travels between qrzlog and the remote
//! services: QSO field mappings, status mappings, and log identifiers.
//! They stay deliberately stringly-typed on the inside: the logbook service
//! is the source of truth for field semantics, and decode must never fail
//! just because a value looks unusual.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// ADIF field names the clients read or write.
pub mod fields {
    /// Server-assigned log entry identifier; drives pagination.
    pub const LOG_ID: &str = "app_qrzlog_logid";
    pub const BAND: &str = "band";
    pub const BAND_RX: &str = "band_rx";
    pub const MODE: &str = "mode";
    /// Contact date, `YYYYMMDD`.
    pub const QSO_DATE: &str = "qso_date";
    pub const CALL: &str = "call";
    /// Contact start, UTC `HHMM`.
    pub const TIME_ON: &str = "time_on";
    /// Contact end, UTC `HHMM`.
    pub const TIME_OFF: &str = "time_off";
    pub const RST_SENT: &str = "rst_sent";
    pub const RST_RCVD: &str = "rst_rcvd";
}

/// Status-line keys returned by the logbook service.
pub mod status_keys {
    pub const RESULT: &str = "RESULT";
    pub const REASON: &str = "REASON";
    pub const COUNT: &str = "COUNT";
    pub const LOGID: &str = "LOGID";
}

// ---------------------------------------------------------------------------
// LogId
// ---------------------------------------------------------------------------

/// A logbook entry identifier (`app_qrzlog_logid`).
///
/// Identifiers are assigned by the service in increasing order, which is
/// what lets them double as a pagination cursor (`AFTERLOGID`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LogId(pub u64);

impl LogId {
    /// The cursor value meaning "from the beginning of the log".
    pub const START: LogId = LogId(0);

    /// Parses an identifier as it appears on the wire.
    ///
    /// Returns `None` for anything that is not a plain decimal number.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok().map(LogId)
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Qso
// ---------------------------------------------------------------------------

/// One contact record: ADIF field name to raw value.
///
/// Only fields that were present on the wire are stored. A field that was
/// sent with an empty value (`<rst_sent:0>`) maps to `""`; a field that was
/// never sent is absent, and [`get`](Self::get) returns `None`.
///
/// Serializes as a flat JSON object, fields in name order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Qso(BTreeMap<String, String>);

impl Qso {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `field`, if the field was present.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns the value of `field`, or `""` when absent.
    ///
    /// For display code, where absent and blank render the same.
    pub fn get_or_empty(&self, field: &str) -> &str {
        self.get(field).unwrap_or_default()
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(field.into(), value.into())
    }

    /// Returns `true` if `field` was present.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// The parsed `app_qrzlog_logid`, if present and numeric.
    pub fn log_id(&self) -> Option<LogId> {
        self.get(fields::LOG_ID).and_then(LogId::parse)
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(field, value)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Qso {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// StatusResult
// ---------------------------------------------------------------------------

/// Decoded `KEY=VALUE` status line (e.g. `RESULT=OK&LOGID=12345`).
///
/// An empty mapping is a legitimate outcome: it means the body carried no
/// status pairs at all, which callers can inspect like any other status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusResult(BTreeMap<String, String>);

impl StatusResult {
    /// Creates an empty status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Sets `key`; later writes overwrite earlier ones.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// The `RESULT` field.
    pub fn result(&self) -> Option<&str> {
        self.get(status_keys::RESULT)
    }

    /// `true` only when `RESULT` is exactly `OK`.
    pub fn is_ok(&self) -> bool {
        self.result() == Some("OK")
    }

    /// The `REASON` field, present on most failures.
    pub fn reason(&self) -> Option<&str> {
        self.get(status_keys::REASON)
    }

    /// The `COUNT` field, parsed.
    pub fn count(&self) -> Option<usize> {
        self.get(status_keys::COUNT)?.parse().ok()
    }

    /// The `LOGID` assigned to an inserted record.
    pub fn log_id(&self) -> Option<LogId> {
        self.get(status_keys::LOGID).and_then(LogId::parse)
    }

    /// Number of decoded pairs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no pairs were decoded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StatusResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(no status)");
        }
        let mut first = true;
        for (k, v) in &self.0 {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StatusResult {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// ContactDraft
// ---------------------------------------------------------------------------

/// The fields required to log a new contact.
///
/// Values are sent as-is; callers are expected to have normalized case
/// (callsign, band and mode upper-cased) and formatted the date and times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDraft {
    /// The other station's callsign.
    pub call: String,
    /// Band, e.g. `20M`. Also sent as `band_rx`.
    pub band: String,
    /// Mode, e.g. `FT8`.
    pub mode: String,
    /// UTC date, `YYYYMMDD`.
    pub qso_date: String,
    /// UTC start time, `HHMM`.
    pub time_on: String,
    /// UTC end time, `HHMM`.
    pub time_off: String,
    /// Signal report sent.
    pub rst_sent: String,
    /// Signal report received.
    pub rst_rcvd: String,
}

impl ContactDraft {
    /// Returns the fields in their stable wire order.
    ///
    /// `band_rx` mirrors `band`, and `mode` appears twice (before and after
    /// `call`): that is the record shape the logbook service has always
    /// been sent, so it is kept byte-for-byte.
    pub fn to_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            (fields::BAND, self.band.as_str()),
            (fields::BAND_RX, self.band.as_str()),
            (fields::MODE, self.mode.as_str()),
            (fields::QSO_DATE, self.qso_date.as_str()),
            (fields::CALL, self.call.as_str()),
            (fields::MODE, self.mode.as_str()),
            (fields::TIME_ON, self.time_on.as_str()),
            (fields::TIME_OFF, self.time_off.as_str()),
            (fields::RST_SENT, self.rst_sent.as_str()),
            (fields::RST_RCVD, self.rst_rcvd.as_str()),
        ]
    }
}
