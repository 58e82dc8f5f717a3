//! Callsign lookups against the session-keyed XML service.

use std::fmt;
use std::sync::Arc;

use qrzlog_protocol::LookupDocument;
use qrzlog_session::{SessionError, SessionManager, SessionReply};
use qrzlog_transport::HttpTransport;
use serde::Serialize;

use crate::QrzlogError;

/// Element names in a callsign lookup response.
pub mod elements {
    pub const CALL: &str = "call";
    pub const ALIASES: &str = "aliases";
    pub const FIRST_NAME: &str = "fname";
    pub const LAST_NAME: &str = "name";
    pub const ADDR1: &str = "addr1";
    pub const ADDR2: &str = "addr2";
    pub const STATE: &str = "state";
    pub const POSTAL_CODE: &str = "zip";
    pub const COUNTRY: &str = "country";
    pub const QSL_MANAGER: &str = "qslmgr";
    pub const EQSL: &str = "eqsl";
    pub const MQSL: &str = "mqsl";
    pub const LOTW: &str = "lotw";
    pub const LICENSE_CLASS: &str = "class";
}

// ---------------------------------------------------------------------------
// QslPreference
// ---------------------------------------------------------------------------

/// Whether an operator accepts a particular QSL method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum QslPreference {
    Yes,
    No,
    #[default]
    Unknown,
}

impl QslPreference {
    /// `"1"` is yes, `"0"` is no, anything else (including absence) is
    /// unknown.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("1") => Self::Yes,
            Some("0") => Self::No,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for QslPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "Yes"),
            Self::No => write!(f, "No"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Spells out US license class codes; other codes pass through unchanged
/// and a missing class is empty.
pub fn license_class_label(code: Option<&str>) -> String {
    match code {
        Some("T") => "Technician".to_string(),
        Some("G") => "General".to_string(),
        Some("E") => "Amateur Extra".to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// CallsignRecord
// ---------------------------------------------------------------------------

/// Public metadata for one callsign.
///
/// Every field is optional on the wire; a missing one is an empty string
/// here (or [`QslPreference::Unknown`]), never an error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CallsignRecord {
    pub callsign: String,
    pub aliases: String,
    pub first_name: String,
    pub last_name: String,
    pub addr1: String,
    pub addr2: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub qsl_manager: String,
    pub eqsl: QslPreference,
    pub mqsl: QslPreference,
    pub lotw: QslPreference,
    /// Human-readable license class (see [`license_class_label`]).
    pub license_class: String,
}

impl CallsignRecord {
    /// Extracts a record from a lookup response. `requested` is used when
    /// the response carries no `call` element.
    pub fn from_document(requested: &str, doc: &LookupDocument) -> Self {
        let text = |name: &str| doc.get_or_empty(name).to_string();
        Self {
            callsign: doc.get(elements::CALL).unwrap_or(requested).to_string(),
            aliases: text(elements::ALIASES),
            first_name: text(elements::FIRST_NAME),
            last_name: text(elements::LAST_NAME),
            addr1: text(elements::ADDR1),
            addr2: text(elements::ADDR2),
            state: text(elements::STATE),
            postal_code: text(elements::POSTAL_CODE),
            country: text(elements::COUNTRY),
            qsl_manager: text(elements::QSL_MANAGER),
            eqsl: QslPreference::from_flag(doc.get(elements::EQSL)),
            mqsl: QslPreference::from_flag(doc.get(elements::MQSL)),
            lotw: QslPreference::from_flag(doc.get(elements::LOTW)),
            license_class: license_class_label(doc.get(elements::LICENSE_CLASS)),
        }
    }

    /// Given and family name joined with a space, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl fmt::Display for CallsignRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Details for {}:", self.callsign)?;
        writeln!(f)?;
        writeln!(f, "Aliases: {}", self.aliases)?;
        writeln!(f, "License class: {}", self.license_class)?;
        writeln!(f)?;
        writeln!(f, "{}", self.full_name())?;
        writeln!(f, "{}", self.addr1)?;
        writeln!(f, "{}, {} {}", self.addr2, self.state, self.postal_code)?;
        writeln!(f, "{}", self.country)?;
        writeln!(f)?;
        writeln!(f, "QSL Info: {}", self.qsl_manager)?;
        writeln!(f)?;
        writeln!(f, "QSL Preferences:")?;
        writeln!(f, "LOTW?: {}", self.lotw)?;
        writeln!(f, "eQSL?: {}", self.eqsl)?;
        write!(f, "Mail?: {}", self.mqsl)
    }
}

// ---------------------------------------------------------------------------
// CallsignDirectory
// ---------------------------------------------------------------------------

/// Looks up callsigns through a shared [`SessionManager`].
pub struct CallsignDirectory<T: HttpTransport> {
    session: Arc<SessionManager<T>>,
}

impl<T: HttpTransport> CallsignDirectory<T> {
    pub fn new(session: Arc<SessionManager<T>>) -> Self {
        Self { session }
    }

    /// Looks up `callsign`.
    ///
    /// An expired session is renewed and the lookup retried once, inside
    /// [`SessionManager::query`].
    ///
    /// # Errors
    /// - [`QrzlogError::NotFound`]: the service reported an error for this
    ///   callsign (typically no public record)
    /// - [`QrzlogError::Session`]: renewal failed or expired again
    /// - [`QrzlogError::Transport`] / [`QrzlogError::Protocol`]
    pub async fn lookup(&self, callsign: &str) -> Result<CallsignRecord, QrzlogError> {
        match self.session.query(&[("callsign", callsign)]).await? {
            SessionReply::Data(doc) => {
                let record = CallsignRecord::from_document(callsign, &doc);
                tracing::info!(callsign, "lookup succeeded");
                Ok(record)
            }
            SessionReply::ExplicitError(reason) => {
                tracing::info!(callsign, %reason, "lookup returned no record");
                Err(QrzlogError::NotFound {
                    callsign: callsign.to_string(),
                    reason,
                })
            }
            SessionReply::Expired => Err(SessionError::ExpiredAfterRenewal.into()),
        }
    }
}
