//! Decoders for the card's raw field encodings.
//!
//! Text is stored in the legacy single-byte Thai codepage (TIS-620, decoded
//! here as its Windows-874 superset) with `#` as the filler between
//! segments. Dates are 8-digit Buddhist-calendar strings. Gender is a
//! single ASCII digit.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use encoding_rs::WINDOWS_874;

/// Thai-codepage text: transcode, turn `#` filler into spaces, trim.
pub fn thai_text(raw: &[u8]) -> String {
    let (text, _, _) = WINDOWS_874.decode(raw);
    text.replace('#', " ").trim().to_string()
}

/// ASCII text with the same `#` filler convention, no transcoding.
pub fn latin_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .replace('#', " ")
        .trim()
        .to_string()
}

/// Converts the card's `YYYYMMDD` Buddhist-calendar date to `YYYY-MM-DD`
/// Gregorian (year - 543). A blank field yields the empty string; anything
/// too short or non-numeric passes through trimmed. Month and day are taken
/// verbatim - the card is trusted not to write a 13th month, and if it does
/// that is the caller's problem to surface, not ours to mask.
pub fn birth_date(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if text.len() < 8 {
        return text.to_string();
    }
    match (
        text.get(..4).and_then(|y| y.parse::<i32>().ok()),
        text.get(4..6),
        text.get(6..8),
    ) {
        (Some(year), Some(month), Some(day)) => {
            format!("{:04}-{}-{}", year - 543, month, day)
        }
        _ => text.to_string(),
    }
}

/// `'1'` is male, `'2'` is female. The card defines nothing else; anything
/// else maps to the empty string, which is what kiosk frontends expect.
pub fn gender(raw: &[u8]) -> String {
    match raw.first() {
        Some(b'1') => "ชาย".to_string(),
        Some(b'2') => "หญิง".to_string(),
        _ => String::new(),
    }
}

/// Wraps photo bytes in a `data:image/jpeg` URI; empty bytes mean no photo.
pub fn photo_data_uri(raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }
    format!("data:image/jpeg;base64,{}", STANDARD.encode(raw))
}
