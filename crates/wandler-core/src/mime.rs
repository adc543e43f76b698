// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Static mapping between format identifiers (file extensions) and MIME types.

/// MIME type returned for any format not in the table.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Format identifier → MIME type.
const MIME_TABLE: &[(&str, &str)] = &[
    // Images
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("tiff", "image/tiff"),
    // Documents
    ("pdf", "application/pdf"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("json", "application/json"),
    ("csv", "text/csv"),
    ("xml", "application/xml"),
    ("rtf", "application/rtf"),
    // Audio
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("aac", "audio/aac"),
    ("ogg", "audio/ogg"),
    ("flac", "audio/flac"),
    ("m4a", "audio/mp4"),
    // Video
    ("mp4", "video/mp4"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("wmv", "video/x-ms-wmv"),
    // Archives
    ("zip", "application/zip"),
    ("rar", "application/vnd.rar"),
    ("7z", "application/x-7z-compressed"),
    ("tar", "application/x-tar"),
];

/// Lookup table between format identifiers and MIME types.
///
/// Lookups are case-insensitive on the format side. The registry holds no
/// state; it is a namespace over a static table.
pub struct MimeRegistry;

impl MimeRegistry {
    /// MIME type for a format identifier, `application/octet-stream` if unknown.
    pub fn mime_type(format: &str) -> &'static str {
        let format = format.trim().to_ascii_lowercase();
        MIME_TABLE
            .iter()
            .find(|(ext, _)| *ext == format)
            .map(|(_, mime)| *mime)
            .unwrap_or(OCTET_STREAM)
    }

    /// Infer a MIME type from a file name's last extension.
    pub fn from_file_name(name: &str) -> &'static str {
        match name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => Self::mime_type(ext),
            _ => OCTET_STREAM,
        }
    }
}
