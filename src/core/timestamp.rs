//! Purpose: Fixed wire format for notice and diagnostic timestamps.
//! Exports: `WIRE_TIMESTAMP_PATTERN`, `format_timestamp`, `parse_timestamp`, `now_timestamp`.
//! Role: Shared timestamp contract used by the codecs and the CLI.
//! Invariants: Output is RFC3339 with exactly three subsecond digits and a `+00:00` offset.
//! Invariants: Formatting never consults platform locale or timezone state.

use time::{OffsetDateTime, UtcOffset};

/// Format description for the wire timestamp, `yyyy-MM-ddTHH:mm:ss.SSS+HH:MM`.
/// Parsing accepts exactly this shape; anything else is treated as absent.
pub const WIRE_TIMESTAMP_PATTERN: &str = "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory]:[offset_minute]";

/// Render an instant in the wire format. The instant is normalized to UTC
/// first, so every produced string carries a `+00:00` offset. Rendering works
/// from component accessors and cannot fail or vary by locale.
pub fn format_timestamp(instant: OffsetDateTime) -> String {
    let utc = instant.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}+00:00",
        utc.year(),
        u8::from(utc.month()),
        utc.day(),
        utc.hour(),
        utc.minute(),
        utc.second(),
        utc.millisecond()
    )
}

/// Parse a wire timestamp. Any deviation from the wire format (missing or
/// short milliseconds, a `Z` suffix, trailing bytes) yields `None`; callers
/// treat that as "timestamp absent", never as a hard failure.
pub fn parse_timestamp(text: &str) -> Option<OffsetDateTime> {
    let format = time::format_description::parse(WIRE_TIMESTAMP_PATTERN).ok()?;
    OffsetDateTime::parse(text, &format).ok()
}

/// The documented default-to-now policy: the current instant rendered in the
/// wire format. The only clock access in this crate.
pub fn now_timestamp() -> String {
    format_timestamp(OffsetDateTime::now_utc())
}
