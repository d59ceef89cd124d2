//! Purpose: Parse engine notice lines and render them as diagnostic messages.
//! Exports: `Notice`.
//! Role: One notice per JSON line; lines that are not notices are absent, not errors.
//! Invariants: Malformed bytes fail loudly; well-formed JSON that merely lacks
//! notice shape parses to `None` so feeders can skip it without logging noise.

use serde_json::{Map, Value};

use crate::core::diagnostic::DiagnosticMessage;
use crate::core::error::{Error, NoticeCode};

/// A structured notice emitted by the tunnel engine. `notice_type` is the only
/// required field on the wire; `timestamp` and `data` degrade to absent when
/// missing or carrying the wrong JSON type.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub notice_type: String,
    pub data: Option<Map<String, Value>>,
    pub timestamp: Option<String>,
}

impl Notice {
    pub fn new(
        notice_type: impl Into<String>,
        data: Option<Map<String, Value>>,
        timestamp: Option<String>,
    ) -> Self {
        Notice {
            notice_type: notice_type.into(),
            data,
            timestamp,
        }
    }

    /// Parse one line of engine output.
    ///
    /// Returns `Ok(Some(notice))` for a JSON object carrying a string
    /// `noticeType`, `Ok(None)` for any other well-formed JSON value, and
    /// `Err` only when the bytes are not UTF-8 or not JSON at all.
    pub fn parse(raw: &[u8]) -> Result<Option<Notice>, Error> {
        let text = std::str::from_utf8(raw).map_err(|err| {
            Error::new(NoticeCode::DecodeUtf8Failed)
                .with_message("notice line is not valid utf-8")
                .with_source(err)
        })?;
        let value: Value = serde_json::from_str(text).map_err(|err| {
            Error::new(NoticeCode::DecodeJsonFailed)
                .with_message("decoding notice json failed")
                .with_source(err)
        })?;

        let Value::Object(object) = value else {
            return Ok(None);
        };
        let Some(notice_type) = object.get("noticeType").and_then(Value::as_str) else {
            return Ok(None);
        };

        let timestamp = object
            .get("timestamp")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let data = object.get("data").and_then(Value::as_object).cloned();

        Ok(Some(Notice::new(notice_type, data, timestamp)))
    }

    /// Render this notice as a diagnostic message, `<noticeType>: <data json>`
    /// stamped with the notice's own timestamp. Checks run in a fixed order:
    /// data presence, data encoding, then timestamp presence.
    pub fn to_diagnostic_message(&self) -> Result<DiagnosticMessage, Error> {
        let Some(data) = &self.data else {
            return Err(Error::new(NoticeCode::DataMissing)
                .with_message("no data to encode diagnostic message"));
        };
        let bytes = serde_json::to_vec(data).map_err(|err| {
            Error::new(NoticeCode::EncodeJsonFailed)
                .with_message("encoding notice data failed")
                .with_source(err)
        })?;
        let payload = String::from_utf8(bytes).map_err(|err| {
            Error::new(NoticeCode::EncodeUtf8Failed)
                .with_message("rendering notice data as utf-8 failed")
                .with_source(err)
        })?;
        let Some(timestamp) = &self.timestamp else {
            return Err(Error::new(NoticeCode::DataMissing).with_message("timestamp missing"));
        };

        Ok(DiagnosticMessage::new(
            format!("{}: {payload}", self.notice_type),
            timestamp.clone(),
        ))
    }
}
