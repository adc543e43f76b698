// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Wandler.

use thiserror::Error;

/// Top-level error type for all Wandler operations.
///
/// Every variant is terminal for the file or operation that raised it; the
/// engine never retries.
#[derive(Debug, Error)]
pub enum WandlerError {
    // -- Input validation --
    #[error("invalid input: {detail}")]
    InputValidation { kind: ValidationKind, detail: String },

    #[error("at least {required} files are required, got {provided}")]
    InsufficientInput { required: usize, provided: usize },

    #[error("rotation must be 90, 180, or 270 degrees, got {0}")]
    InvalidRotation(i64),

    #[error("invalid page range: {0}")]
    InvalidPageRange(String),

    #[error("{name} is {size} bytes, which exceeds the {limit} byte limit")]
    PayloadTooLarge { name: String, size: usize, limit: usize },

    // -- Page addressing --
    #[error("page {page} is out of range (document has {total} pages)")]
    PageIndex { page: u32, total: u32 },

    // -- Binary content --
    #[error("failed to decode {name}: {detail}")]
    Decode { name: String, detail: String },

    #[error("failed to encode {format}: {detail}")]
    Encode { format: String, detail: String },

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    // -- Dispatch --
    #[error("no conversion available to {format}")]
    UnsupportedFormat { format: String },

    // -- Plumbing --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Which input an `InputValidation` error rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// No file, or an empty one.
    MissingFile,
    /// A resize without width or height.
    MissingDimensions,
    /// Zero, or beyond the pixel limit.
    Dimensions,
    /// A page list that is not a JSON array.
    PagesJson,
    /// An empty or unusable page list.
    Pages,
    /// An overlay without text.
    MissingText,
    /// An input collides with an output.
    Output,
    Other,
}

/// Coarse error classes reported to the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing file, missing dimension, malformed page list, bad rotation,
    /// too few files, oversized payload.
    InputValidation,
    /// Source bytes could not be decoded (corrupt image or PDF).
    Decode,
    /// The target encoder rejected the parameters.
    Encode,
    /// A page index fell outside `[1, total]`.
    PageIndex,
    /// The requested target format has no conversion path.
    Unsupported,
    /// I/O or serialization trouble outside the conversion itself.
    Internal,
}

impl WandlerError {
    /// Shorthand for an `InputValidation` error.
    pub fn invalid(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::InputValidation {
            kind,
            detail: detail.into(),
        }
    }

    /// Classify this error for the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputValidation { .. }
            | Self::InsufficientInput { .. }
            | Self::InvalidRotation(_)
            | Self::InvalidPageRange(_)
            | Self::PayloadTooLarge { .. } => ErrorKind::InputValidation,
            Self::PageIndex { .. } => ErrorKind::PageIndex,
            Self::Decode { .. } | Self::Pdf(_) => ErrorKind::Decode,
            Self::Encode { .. } => ErrorKind::Encode,
            Self::UnsupportedFormat { .. } => ErrorKind::Unsupported,
            Self::Io(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WandlerError>;
