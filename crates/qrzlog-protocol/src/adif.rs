//! ADIF (Amateur Data Interchange Format) codec.
//!
//! ADIF's text form is a flat stream of tag-length-value fields:
//!
//! ```text
//! <call:4>W1AW<band:3>20M<mode:3>SSB<eor>
//!  ^^^^ ^     ^^^^
//!  tag  len   value (exactly `len` characters)
//! ```
//!
//! `<eor>` closes a record. The logbook service also separates records with
//! blank lines, and when it embeds ADIF in a fetch response it escapes the
//! angle brackets as `&lt;`/`&gt;`.
//!
//! There is no escaping for the delimiters themselves, so decoding is
//! best-effort extraction over untrusted text, not a strict grammar: an
//! unrecognizable stretch is skipped, it never aborts the surrounding
//! record.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::Qso;

/// A field header `<tag:len>` (optionally `<tag:len:T>` with an ADIF data
/// type indicator), or one of the `<eor>` / `<eoh>` markers.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:(\w+):(\d+)(?::[A-Za-z])?|([Ee][Oo][Rr])|([Ee][Oo][Hh]))>")
        .expect("ADIF token pattern is valid")
});

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r]*\n").expect("blank line pattern is valid"));

/// Decodes ADIF blobs into [`Qso`] records and encodes single records.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdifCodec;

impl AdifCodec {
    /// Decodes every record in `body`, in input order.
    ///
    /// Records end at `<eor>` or at a blank line between fields. Each field
    /// value is taken by its declared length when that span stays before the
    /// next blank line and ends at a `<`, whitespace or the end of the text.
    /// Otherwise the value runs up to the next `<` or blank line instead.
    /// Anything before an `<eoh>` marker is an ADIF header and is dropped.
    ///
    /// A body with no recognizable fields yields an empty vector, which
    /// callers read as "no contacts", not as a failure.
    pub fn decode_many(&self, body: &str) -> Vec<Qso> {
        let body = unescape_entities(body);
        let text = body.as_ref();

        let mut records = Vec::new();
        let mut current = Qso::new();
        let mut pos = 0;

        while let Some(caps) = TOKEN.captures_at(text, pos) {
            let Some(token) = caps.get(0) else { break };

            if BLANK_LINE.is_match(&text[pos..token.start()]) {
                flush(&mut records, &mut current);
            }
            pos = token.end();

            if caps.get(3).is_some() {
                flush(&mut records, &mut current);
                continue;
            }
            if caps.get(4).is_some() {
                current = Qso::new();
                continue;
            }
            let (Some(tag), Some(len)) = (caps.get(1), caps.get(2)) else {
                continue;
            };

            let rest = &text[pos..];
            let chunk_end = BLANK_LINE.find(rest).map_or(rest.len(), |m| m.start());
            let declared = len.as_str().parse::<usize>().ok();
            let (value, consumed) = match declared.and_then(|n| declared_span(rest, n, chunk_end)) {
                Some(end) => (&rest[..end], end),
                None => fallback_value(rest),
            };
            current.insert(tag.as_str(), value);
            pos += consumed;
        }
        flush(&mut records, &mut current);

        tracing::trace!(records = records.len(), "decoded ADIF body");
        records
    }

    /// Encodes one record: `<tag:len>value` per field, then `<eor>`.
    ///
    /// Lengths are character counts computed here from the value actually
    /// written. Tags are emitted in the order given, repeats included.
    pub fn encode_one(&self, fields: &[(&str, &str)]) -> String {
        let mut out = String::new();
        for (tag, value) in fields {
            out.push_str(&format!("<{tag}:{}>{value}", value.chars().count()));
        }
        out.push_str("<eor>");
        out
    }
}

fn flush(records: &mut Vec<Qso>, current: &mut Qso) {
    if !current.is_empty() {
        records.push(std::mem::take(current));
    }
}

/// Byte length of the first `n` characters of `s`, if `s` has that many.
fn char_span(s: &str, n: usize) -> Option<usize> {
    if n == 0 {
        return Some(0);
    }
    s.char_indices().nth(n - 1).map(|(i, c)| i + c.len_utf8())
}

/// Byte length of a value taken by its declared character count, if the
/// span ends no later than `chunk_end` and right before a field boundary.
fn declared_span(rest: &str, n: usize, chunk_end: usize) -> Option<usize> {
    let end = char_span(rest, n)?;
    if end > chunk_end {
        return None;
    }
    match rest[end..].chars().next() {
        None | Some('<') => Some(end),
        Some(c) if c.is_whitespace() => Some(end),
        Some(_) => None,
    }
}

/// Value for a field whose declared length can't be trusted: everything up
/// to the next `<` or blank line, without trailing line breaks.
fn fallback_value(rest: &str) -> (&str, usize) {
    let next_tag = rest.find('<').unwrap_or(rest.len());
    let next_blank = BLANK_LINE.find(rest).map_or(rest.len(), |m| m.start());
    let end = next_tag.min(next_blank);
    (rest[..end].trim_end_matches(['\r', '\n']), end)
}

/// Undoes the HTML escaping the logbook service applies to embedded ADIF.
///
/// Only applied to bodies with no raw `<` at all, so ADIF that arrived
/// unescaped is never altered.
fn unescape_entities(body: &str) -> Cow<'_, str> {
    if body.contains('<') || !body.contains("&lt;") {
        return Cow::Borrowed(body);
    }
    Cow::Owned(
        body.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&"),
    )
}
