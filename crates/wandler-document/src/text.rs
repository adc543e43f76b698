// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text transform — reinterpret a text file as another text format.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use wandler_core::InputFile;
use wandler_core::error::Result;

/// Text targets routed here by the dispatcher.
pub const TEXT_TARGETS: [&str; 5] = ["txt", "html", "json", "csv", "xml"];

#[derive(Serialize)]
struct JsonEnvelope<'a> {
    content: &'a str,
    filename: &'a str,
    timestamp: String,
}

/// Render `input` as `target`. Invalid UTF-8 is replaced, not rejected.
///
/// `html` wraps the text in a minimal document, `json` wraps it with the file
/// name and `now`; every other target returns the text unchanged.
pub fn transform_text(input: &InputFile, target: &str, now: DateTime<Utc>) -> Result<Vec<u8>> {
    let text = String::from_utf8_lossy(input.bytes());

    let rendered = match target {
        "html" => format!(
            "<!DOCTYPE html>\n<html>\n<head>\n    <title>{}</title>\n    <meta charset=\"UTF-8\">\n</head>\n<body>\n    <pre>{}</pre>\n</body>\n</html>",
            escape_html(input.name()),
            escape_html(&text)
        ),
        "json" => serde_json::to_string_pretty(&JsonEnvelope {
            content: &text,
            filename: input.name(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        })?,
        _ => text.into_owned(),
    };
    Ok(rendered.into_bytes())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn note(body: &str) -> InputFile {
        InputFile::new("note.txt", "text/plain", body.as_bytes().to_vec())
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn plain_targets_keep_the_text() {
        for target in ["txt", "csv", "xml"] {
            assert_eq!(transform_text(&note("a,b\n1,2"), target, noon()).unwrap(), b"a,b\n1,2");
        }
    }

    #[test]
    fn html_wraps_and_escapes() {
        let html = String::from_utf8(transform_text(&note("1 < 2 & 3"), "html", noon()).unwrap())
            .unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>note.txt</title>"));
        assert!(html.contains("<pre>1 &lt; 2 &amp; 3</pre>"));
    }

    #[test]
    fn json_carries_name_and_timestamp() {
        let json = transform_text(&note("hello"), "json", noon()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["content"], "hello");
        assert_eq!(value["filename"], "note.txt");
        assert_eq!(value["timestamp"], "2026-03-01T12:00:00.000Z");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let input = InputFile::new("bad.txt", "text/plain", vec![b'o', 0xFF, b'k']);
        assert_eq!(transform_text(&input, "txt", noon()).unwrap(), "o\u{FFFD}k".as_bytes());
    }
}
