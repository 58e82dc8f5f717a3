//! Status-line codec.
//!
//! The logbook service answers writes (and prefixes reads) with a flat run
//! of `KEY=VALUE` pairs, e.g. `RESULT=OK&LOGID=12345&COUNT=1`. The
//! separator is not reliable across endpoints, so decoding is a scan for
//! pairs anywhere in the body rather than a split on `&`.

use std::sync::LazyLock;

use regex::Regex;

use crate::StatusResult;

static PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)=(\w+)").expect("status pattern is valid"));

/// Decodes `KEY=VALUE` status bodies into a [`StatusResult`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusCodec;

impl StatusCodec {
    /// Collects every `identifier=identifier` pair in `body`.
    ///
    /// Later duplicates overwrite earlier ones. A body with no pairs decodes
    /// to an empty mapping, never an error.
    pub fn decode(&self, body: &str) -> StatusResult {
        let mut status = StatusResult::new();
        for caps in PAIR.captures_iter(body) {
            status.insert(&caps[1], &caps[2]);
        }
        status
    }
}
