//! Purpose: Define the stable public Rust API boundary for Diagline.
//! Exports: Notice parsing, diagnostic rendering, config codec, and errors.
//! Role: Public, additive-only surface; embedders should import from here.
//! Invariants: Everything re-exported here keeps working across minor releases.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::config::{decode_config, encode_config};
pub use crate::core::diagnostic::DiagnosticMessage;
pub use crate::core::error::{ConfigCode, Domain, Error, ErrorKind, NoticeCode, MAX_CAUSE_DEPTH};
pub use crate::core::notice::Notice;
pub use crate::core::timestamp::{
    format_timestamp, now_timestamp, parse_timestamp, WIRE_TIMESTAMP_PATTERN,
};
