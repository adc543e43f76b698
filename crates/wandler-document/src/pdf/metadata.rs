// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document information — page count, `/Info` strings, and PDF dates.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use lopdf::Object;
use serde::Serialize;

use super::document::{PdfDocument, resolve};

/// Summary of a PDF's document information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfMetadata {
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub modification_date: Option<DateTime<Utc>>,
    /// Byte length of the file.
    pub size: usize,
}

impl PdfMetadata {
    pub fn read(doc: &PdfDocument) -> Self {
        let entry = |key: &[u8]| -> Option<String> {
            let info = doc.info()?;
            let value = resolve(doc.document(), info.get(key).ok()?);
            text_string(value).filter(|text| !text.is_empty())
        };

        Self {
            page_count: doc.page_count(),
            title: entry(b"Title"),
            author: entry(b"Author"),
            subject: entry(b"Subject"),
            creator: entry(b"Creator"),
            producer: entry(b"Producer"),
            creation_date: entry(b"CreationDate").and_then(|d| parse_pdf_date(&d)),
            modification_date: entry(b"ModDate").and_then(|d| parse_pdf_date(&d)),
            size: doc.original_size(),
        }
    }
}

/// Decode a PDF text string: UTF-16BE with a byte-order mark, UTF-8 with one,
/// otherwise one byte per character.
fn text_string(object: &Object) -> Option<String> {
    let Object::String(bytes, _) = object else {
        return None;
    };
    let text = if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(utf8).into_owned()
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    };
    Some(text.trim_end_matches('\0').to_string())
}

/// Parse a PDF date, `D:YYYYMMDDHHmmSSOHH'mm'`. Every field after the year is
/// optional; a missing offset means UTC.
pub fn parse_pdf_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let value = value.strip_prefix("D:").unwrap_or(value);
    let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return None;
    }

    let field = |from: usize, default: u32| {
        digits
            .get(from..from + 2)
            .and_then(|d| d.parse::<u32>().ok())
            .unwrap_or(default)
    };
    let year: i32 = digits[..4].parse().ok()?;
    let local = NaiveDate::from_ymd_opt(year, field(4, 1), field(6, 1))?.and_hms_opt(
        field(8, 0),
        field(10, 0),
        field(12, 0),
    )?;

    let zone = &value[digits.len()..];
    let offset = match zone.chars().next() {
        Some(sign @ ('+' | '-')) => {
            let tz: String = zone[1..].chars().filter(char::is_ascii_digit).collect();
            let hours: i32 = tz.get(0..2).and_then(|h| h.parse().ok()).unwrap_or(0);
            let minutes: i32 = tz.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
            let seconds = (hours * 3600 + minutes * 60) * if sign == '-' { -1 } else { 1 };
            FixedOffset::east_opt(seconds)?
        }
        _ => FixedOffset::east_opt(0)?,
    };

    let stamped = offset.from_local_datetime(&local).single()?;
    Some(stamped.with_timezone(&Utc))
}
