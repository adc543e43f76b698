// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// wandler-document — Conversion engines for the Wandler service.
//
// Provides the format dispatcher (classify an input/target pair and route it),
// raster image transforms (decode, resize, re-encode), structural PDF editing
// (merge, split, reorder, extract, delete, rotate, overlay, compress,
// metadata), the text and archive fallbacks, and sequential batch runners.

pub mod archive;
pub mod batch;
pub mod convert;
pub mod image;
pub mod integrity;
pub mod pdf;
pub mod text;

// Re-export the primary structs so callers can use `wandler_document::FormatDispatcher` etc.
pub use crate::batch::{
    BatchItem, BatchOutcome, BatchPdfOperation, BatchReport, BatchSource, batch_pdf, batch_resize,
    run_batch,
};
pub use crate::convert::{
    ConversionCategory, FileCategory, FormatDispatcher, file_category, supported_formats,
};
pub use crate::image::{ImageMetadata, ImageTransformEngine, TransformedImage};
pub use crate::pdf::editor::{
    PdfEditor, PdfOperation, PdfOutput, SplitMode, is_pdf, supported_operations, validate_pdf,
};
pub use crate::pdf::metadata::PdfMetadata;
pub use crate::pdf::overlay::{ImageOverlay, TextOverlay};
pub use crate::pdf::range::parse_page_range;
