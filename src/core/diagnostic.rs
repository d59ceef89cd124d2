//! Purpose: The diagnostic record shipped to feedback uploads and operator logs.
//! Exports: `DiagnosticMessage`.
//! Role: Plain value type; formatting timestamps is delegated to `core::timestamp`.

use serde::Serialize;
use time::OffsetDateTime;

use crate::core::timestamp::{format_timestamp, now_timestamp};

/// One diagnostic line: free-form message text plus the wire-format timestamp
/// of the event it describes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticMessage {
    pub message: String,
    pub timestamp: String,
}

impl DiagnosticMessage {
    pub fn new(message: impl Into<String>, timestamp: impl Into<String>) -> Self {
        DiagnosticMessage {
            message: message.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Stamp `message` with an explicit instant.
    pub fn at(message: impl Into<String>, instant: OffsetDateTime) -> Self {
        DiagnosticMessage::new(message, format_timestamp(instant))
    }

    /// Stamp `message` with the current time.
    pub fn now(message: impl Into<String>) -> Self {
        DiagnosticMessage::new(message, now_timestamp())
    }
}
