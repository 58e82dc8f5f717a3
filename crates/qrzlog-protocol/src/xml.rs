//! Decoder for the XML documents returned by the session/lookup endpoint.
//!
//! A typical response looks like:
//!
//! ```text
//! <QRZDatabase version="1.34">
//!   <Callsign>
//!     <call>W1AW</call>
//!     <fname>Hiram Percy</fname>
//!     ...
//!   </Callsign>
//!   <Session>
//!     <Key>2331uf894c4bd29f3923f3bacf02c532d7bd9</Key>
//!     <Count>123</Count>
//!   </Session>
//! </QRZDatabase>
//! ```
//!
//! Callers only ever ask "what is the text of element X", so the document
//! is flattened into the first text seen for each element name. Nesting,
//! attributes and namespaces are ignored.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::ProtocolError;

/// Element names the session layer inspects.
pub mod elements {
    /// Session key; present on every successful session-keyed response.
    pub const KEY: &str = "Key";
    /// Explicit failure message (e.g. "Not found: XX1XX").
    pub const ERROR: &str = "Error";
    /// Informational notice from the service (subscription warnings etc).
    pub const MESSAGE: &str = "Message";
}

/// A flattened XML lookup response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupDocument {
    elements: HashMap<String, String>,
}

impl LookupDocument {
    /// Parses `body`, keeping the first text value of each element name.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedResponse`] if the body is not
    /// well-formed XML or contains no elements at all.
    pub fn parse(body: &str) -> Result<Self, ProtocolError> {
        let mut reader = Reader::from_str(body);
        reader.config_mut().trim_text(true);

        // One frame per open element: (name, accumulated text).
        let mut stack: Vec<(String, String)> = Vec::new();
        let mut elements = HashMap::new();
        let mut saw_element = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    saw_element = true;
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    stack.push((name, String::new()));
                }
                Ok(Event::Empty(e)) => {
                    saw_element = true;
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    elements.entry(name).or_insert_with(String::new);
                }
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(malformed)?;
                    if let Some((_, buf)) = stack.last_mut() {
                        buf.push_str(&text);
                    }
                }
                Ok(Event::CData(c)) => {
                    let raw = c.into_inner();
                    if let Some((_, buf)) = stack.last_mut() {
                        buf.push_str(&String::from_utf8_lossy(&raw));
                    }
                }
                Ok(Event::End(_)) => {
                    if let Some((name, text)) = stack.pop() {
                        elements
                            .entry(name)
                            .or_insert_with(|| text.trim().to_string());
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(malformed(e)),
            }
        }

        if !saw_element {
            return Err(ProtocolError::MalformedResponse(
                "no XML elements in response".into(),
            ));
        }
        Ok(Self { elements })
    }

    /// Text of the named element, if the element was present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.elements.get(name).map(String::as_str)
    }

    /// Text of the named element, or `""` when absent.
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// The session key, if present and non-empty.
    pub fn key(&self) -> Option<&str> {
        self.get(elements::KEY).filter(|k| !k.is_empty())
    }

    /// The explicit error message, if the response carries one.
    pub fn error(&self) -> Option<&str> {
        self.get(elements::ERROR)
    }

    /// The informational message, if any.
    pub fn message(&self) -> Option<&str> {
        self.get(elements::MESSAGE).filter(|m| !m.is_empty())
    }
}

fn malformed(e: impl std::fmt::Display) -> ProtocolError {
    ProtocolError::MalformedResponse(e.to_string())
}
