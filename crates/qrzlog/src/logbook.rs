//! Logbook reads and writes against the API-key authenticated endpoint.
//!
//! Every request is a GET with `KEY` and `ACTION` plus either `OPTION`
//! (FETCH) or `ADIF` (INSERT). FETCH bodies carry ADIF records, INSERT
//! bodies a `KEY=VALUE` status line.

use std::collections::HashSet;
use std::sync::Arc;

use qrzlog_protocol::{AdifCodec, ContactDraft, LogId, Qso, StatusCodec, StatusResult};
use qrzlog_transport::HttpTransport;
use serde::Serialize;

use crate::QrzlogError;

/// Records requested per FETCH page. A page this size means more may
/// follow; anything shorter is the last page.
pub const PAGE_SIZE: usize = 250;

/// `RESULT` value the logbook sends when the API key may not read the log.
const RESULT_AUTH: &str = "AUTH";

/// Every record in the logbook, deduplicated, plus how the fetch went.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FullLog {
    /// Unique records in page order.
    pub qsos: Vec<Qso>,
    /// FETCH requests issued.
    pub pages: usize,
    /// Records dropped because their log id had already been seen.
    pub duplicates_dropped: usize,
    /// `true` if paging stopped because the cursor could not advance.
    /// The log may be incomplete.
    pub stalled: bool,
}

pub struct LogbookClient<T: HttpTransport> {
    transport: Arc<T>,
    api_key: String,
    endpoint: String,
}

impl<T: HttpTransport> LogbookClient<T> {
    pub fn new(transport: Arc<T>, api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Prior contacts with `callsign`. Empty means first contact.
    pub async fn query_by_callsign(&self, callsign: &str) -> Result<Vec<Qso>, QrzlogError> {
        let qsos = self.fetch(&format!("CALL:{callsign}")).await?;
        tracing::info!(callsign, contacts = qsos.len(), "logbook history fetched");
        Ok(qsos)
    }

    /// Submits one contact.
    ///
    /// Succeeds only when the status line says `RESULT=OK`; the returned
    /// status usually carries the new `LOGID`.
    ///
    /// # Errors
    /// [`QrzlogError::LogWriteFailed`] with every status field the service
    /// sent, when `RESULT` is anything but `OK` or missing.
    pub async fn add_contact(&self, draft: &ContactDraft) -> Result<StatusResult, QrzlogError> {
        let adif = AdifCodec.encode_one(&draft.to_fields());
        let params = [
            ("KEY", self.api_key.as_str()),
            ("ACTION", "INSERT"),
            ("ADIF", adif.as_str()),
        ];
        let response = self
            .transport
            .get(&self.endpoint, &params)
            .await?
            .error_for_status()?;

        let status = StatusCodec.decode(&response.body);
        if status.is_ok() {
            tracing::info!(call = %draft.call, log_id = ?status.log_id(), "contact logged");
            Ok(status)
        } else {
            tracing::warn!(call = %draft.call, %status, "contact rejected");
            Err(QrzlogError::LogWriteFailed(status))
        }
    }

    /// Retrieves the whole logbook, [`PAGE_SIZE`] records at a time.
    ///
    /// Each full page moves the cursor to the log id of its last record.
    /// Consecutive pages usually overlap by that one record; the overlap is
    /// removed by deduplicating on log id, keeping the first occurrence.
    ///
    /// Paging stops early, with [`FullLog::stalled`] set, if a full page
    /// ends in a record without a log id or the cursor would not move
    /// forward.
    pub async fn fetch_all(&self) -> Result<FullLog, QrzlogError> {
        let mut cursor = LogId::START;
        let mut pages = 0;
        let mut stalled = false;
        let mut all = Vec::new();

        loop {
            let page = self
                .fetch(&format!("MAX:{PAGE_SIZE},AFTERLOGID:{cursor}"))
                .await?;
            pages += 1;
            let count = page.len();
            let next = page.last().and_then(Qso::log_id);
            tracing::debug!(page = pages, %cursor, records = count, "logbook page fetched");
            all.extend(page);

            if count < PAGE_SIZE {
                break;
            }
            match next {
                Some(next) if next > cursor => cursor = next,
                Some(next) => {
                    tracing::warn!(%cursor, %next, "logbook cursor did not advance, stopping");
                    stalled = true;
                    break;
                }
                None => {
                    tracing::warn!(%cursor, "full page ended without a log id, stopping");
                    stalled = true;
                    break;
                }
            }
        }

        let (qsos, duplicates_dropped) = dedup_by_log_id(all);
        tracing::info!(
            records = qsos.len(),
            pages,
            duplicates_dropped,
            stalled,
            "logbook fetched"
        );
        Ok(FullLog {
            qsos,
            pages,
            duplicates_dropped,
            stalled,
        })
    }

    async fn fetch(&self, option: &str) -> Result<Vec<Qso>, QrzlogError> {
        let params = [
            ("KEY", self.api_key.as_str()),
            ("ACTION", "FETCH"),
            ("OPTION", option),
        ];
        let response = self
            .transport
            .get(&self.endpoint, &params)
            .await?
            .error_for_status()?;

        let qsos = AdifCodec.decode_many(&response.body);
        if qsos.is_empty() {
            let status = StatusCodec.decode(&response.body);
            if status.result() == Some(RESULT_AUTH) {
                tracing::warn!(%status, "logbook refused fetch");
                return Err(QrzlogError::LogRejected(status));
            }
            if !status.is_empty() && !status.is_ok() {
                tracing::warn!(option, %status, "logbook fetch returned no records");
            }
        }
        Ok(qsos)
    }
}

/// Keeps the first record for each log id; records without one are kept.
/// Returns the survivors and how many were dropped.
fn dedup_by_log_id(qsos: Vec<Qso>) -> (Vec<Qso>, usize) {
    let mut seen = HashSet::new();
    let before = qsos.len();
    let unique: Vec<Qso> = qsos
        .into_iter()
        .filter(|qso| match qso.log_id() {
            Some(id) => seen.insert(id),
            None => true,
        })
        .collect();
    let dropped = before - unique.len();
    (unique, dropped)
}
