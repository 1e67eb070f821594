//! Wire format for pickup and delivery timestamps.
//!
//! The partner API exchanges local wall-clock times without an offset, e.g.
//! `2024-05-01T18:30:00`.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

const WIRE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Render a timestamp the way the API expects it.
pub fn format(value: &PrimitiveDateTime) -> String {
    // The format only contains numeric components, which cannot fail to render.
    value.format(WIRE_FORMAT).unwrap_or_default()
}

/// Parse a timestamp returned by the API.
///
/// Accepts the wire format and, as a fallback, RFC 3339 (the offset is dropped).
pub fn parse(input: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    match PrimitiveDateTime::parse(input, WIRE_FORMAT) {
        Ok(value) => Ok(value),
        Err(err) => match OffsetDateTime::parse(input, &Rfc3339) {
            Ok(value) => Ok(PrimitiveDateTime::new(value.date(), value.time())),
            Err(_) => Err(err),
        },
    }
}
