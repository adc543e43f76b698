// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary-facing error reports.
//
// Every engine error is mapped to a stable machine code, a plain English
// message, and a suggestion telling the user how to correct the input. The
// HTTP layer serialises these verbatim.

use serde::Serialize;

use crate::error::{ErrorKind, ValidationKind, WandlerError};

/// A serialisable description of a failed conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Stable upper-case code, e.g. `INVALID_ROTATION`.
    pub code: &'static str,
    /// Plain English summary.
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
}

/// Convert a `WandlerError` into a report the boundary can hand to the user.
pub fn report(err: &WandlerError) -> ErrorReport {
    match err {
        WandlerError::InputValidation { kind, detail } => input_validation_report(*kind, detail),

        WandlerError::InsufficientInput { required, .. } => ErrorReport {
            code: "INSUFFICIENT_FILES",
            message: err.to_string(),
            suggestion: format!("Select at least {required} PDF files and try again."),
        },

        WandlerError::InvalidRotation(_) => ErrorReport {
            code: "INVALID_ROTATION",
            message: "Rotation must be 90, 180, or 270 degrees.".into(),
            suggestion: "Pick one of the three quarter-turn options.".into(),
        },

        WandlerError::InvalidPageRange(detail) => ErrorReport {
            code: "INVALID_PAGE_RANGE",
            message: format!("The page range could not be read ({detail})."),
            suggestion: "Use page numbers and dashes separated by commas, like 1-5,7,9-12.".into(),
        },

        WandlerError::PayloadTooLarge { name, limit, .. } => ErrorReport {
            code: "FILE_TOO_LARGE",
            message: format!("{name} is too large."),
            suggestion: format!(
                "Files must be at most {} MB.",
                limit / (1024 * 1024)
            ),
        },

        WandlerError::PageIndex { page, total } => ErrorReport {
            code: "PAGE_OUT_OF_RANGE",
            message: format!("Page {page} does not exist; the document has {total} pages."),
            suggestion: format!("Choose pages between 1 and {total}."),
        },

        WandlerError::Decode { name, .. } => ErrorReport {
            code: "DECODE_ERROR",
            message: format!("{name} could not be read."),
            suggestion: "The file may be damaged or in an unusual format. Try re-saving it and upload it again.".into(),
        },

        WandlerError::Encode { format, .. } => ErrorReport {
            code: "ENCODE_ERROR",
            message: format!("The result could not be written as {format}."),
            suggestion: "Try a different output format or quality setting.".into(),
        },

        WandlerError::Pdf(_) => ErrorReport {
            code: "PDF_ERROR",
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Open it in a PDF viewer to check it works, or try a different file.".into(),
        },

        WandlerError::UnsupportedFormat { format } => ErrorReport {
            code: "UNSUPPORTED_FORMAT",
            message: format!("This file cannot be converted to {format}."),
            suggestion: "Choose one of the formats offered for this file type.".into(),
        },

        WandlerError::Io(_) | WandlerError::Serialization(_) => ErrorReport {
            code: "INTERNAL_ERROR",
            message: "Something went wrong while processing the file.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
        },
    }
}

/// Whether the boundary should answer with a client error (4xx) rather than
/// a server error.
pub fn is_client_error(err: &WandlerError) -> bool {
    !matches!(err.kind(), ErrorKind::Internal)
}

/// Validation failures carry their own code and suggestion.
fn input_validation_report(kind: ValidationKind, detail: &str) -> ErrorReport {
    let (code, suggestion) = match kind {
        ValidationKind::MissingFile => ("NO_FILE", "Choose a file and try again."),
        ValidationKind::MissingDimensions => ("NO_DIMENSIONS", "Enter a width, a height, or both."),
        ValidationKind::Dimensions => (
            "INVALID_DIMENSIONS",
            "Use a positive width and height within the supported image size.",
        ),
        ValidationKind::PagesJson => (
            "INVALID_PAGES_JSON",
            "Send pages as a JSON array such as [1, 2, 3] or the word all.",
        ),
        ValidationKind::Pages => ("INVALID_PAGES", "Send at least one page number."),
        ValidationKind::MissingText => ("NO_TEXT", "Enter the text to place on the page."),
        ValidationKind::Output => (
            "OUTPUT_CONFLICT",
            "Choose a different output directory or target format.",
        ),
        ValidationKind::Other => ("INVALID_INPUT", "Check the request parameters and try again."),
    };

    ErrorReport {
        code,
        message: format!("Invalid input: {detail}."),
        suggestion: suggestion.into(),
    }
}
