//! Wire formats for qrzlog.
//!
//! This crate defines the "languages" the two remote services speak:
//!
//! - **ADIF** ([`AdifCodec`]): tag-length-value QSO records, decoded from
//!   logbook fetches and encoded for logbook inserts.
//! - **Status lines** ([`StatusCodec`]): flat `KEY=VALUE` pairs answering
//!   logbook requests.
//! - **XML lookups** ([`LookupDocument`]): session and callsign responses.
//! - **Types** ([`Qso`], [`StatusResult`], [`LogId`], [`ContactDraft`]).
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bodies) and the session
//! and client layers. It doesn't know about HTTP or credentials; it only
//! turns body text into values and values into body text.
//!
//! ```text
//! Transport (body text) → Protocol (Qso / StatusResult / LookupDocument) → Session / Clients
//! ```

mod adif;
mod error;
mod status;
mod types;
mod xml;

pub use adif::AdifCodec;
pub use error::ProtocolError;
pub use status::StatusCodec;
pub use types::{ContactDraft, LogId, Qso, StatusResult, fields, status_keys};
pub use xml::{LookupDocument, elements};
