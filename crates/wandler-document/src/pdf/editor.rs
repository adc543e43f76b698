// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF editor — merge, split, reorder, extract, delete, rotate, overlay,
// compress, and inspect PDF documents.
//
// Every operation loads its own `PdfDocument` from the caller's bytes, applies
// one change, serialises, and drops the document again. Page numbers are
// validated against the loaded document before anything is copied or mutated.

use std::collections::BTreeSet;

use lopdf::SaveOptions;
use serde::Serialize;
use tracing::{debug, info, instrument};
use wandler_core::error::{Result, ValidationKind, WandlerError};
use wandler_core::types::validate_pages;
use wandler_core::{InputFile, PageSelection, Rotation};

use super::assemble::PageAssembler;
use super::document::PdfDocument;
use super::metadata::PdfMetadata;
use super::overlay::{self, ImageOverlay, TextOverlay};
use super::range::{parse_page_range, range_slug};

/// Which editor operation produced an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PdfOperation {
    Merge,
    Split,
    Reorder,
    Extract,
    Rotate,
    Turn,
    Delete,
    TextOverlay,
    ImageOverlay,
    Compress,
}

impl PdfOperation {
    pub const ALL: [PdfOperation; 10] = [
        Self::Merge,
        Self::Split,
        Self::Reorder,
        Self::Extract,
        Self::Rotate,
        Self::Turn,
        Self::Delete,
        Self::TextOverlay,
        Self::ImageOverlay,
        Self::Compress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Split => "split",
            Self::Reorder => "reorder",
            Self::Extract => "extract",
            Self::Rotate => "rotate",
            Self::Turn => "turn",
            Self::Delete => "delete",
            Self::TextOverlay => "text-overlay",
            Self::ImageOverlay => "image-overlay",
            Self::Compress => "compress",
        }
    }
}

/// One produced document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfOutput {
    #[serde(skip)]
    pub data: Vec<u8>,
    pub filename: String,
    pub original_size: usize,
    pub processed_size: usize,
    pub operation: PdfOperation,
}

impl PdfOutput {
    fn new(operation: PdfOperation, filename: String, original_size: usize, data: Vec<u8>) -> Self {
        info!(
            operation = operation.as_str(),
            filename = %filename,
            original_size,
            processed_size = data.len(),
            "PDF operation complete"
        );
        Self {
            processed_size: data.len(),
            filename,
            original_size,
            operation,
            data,
        }
    }
}

/// How `split` divides a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitMode {
    /// One output per page.
    Pages,
    /// One output per range string, e.g. `["1-3", "4,6"]`.
    Ranges(Vec<String>),
}

/// Stateless front for the PDF operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfEditor;

impl PdfEditor {
    pub fn new() -> Self {
        Self
    }

    // -- Page assembly --------------------------------------------------------

    /// Concatenate every page of every input, in input order.
    #[instrument(skip_all, fields(documents = inputs.len()))]
    pub fn merge(&self, inputs: &[InputFile]) -> Result<PdfOutput> {
        if inputs.len() < 2 {
            return Err(WandlerError::InsufficientInput {
                required: 2,
                provided: inputs.len(),
            });
        }

        let docs = inputs
            .iter()
            .map(PdfDocument::load)
            .collect::<Result<Vec<_>>>()?;

        let mut assembler = PageAssembler::new();
        for doc in &docs {
            assembler.append_all(doc)?;
        }

        let original_size = inputs.iter().map(InputFile::len).sum();
        Ok(PdfOutput::new(
            PdfOperation::Merge,
            "merged.pdf".into(),
            original_size,
            assembler.finish()?,
        ))
    }

    /// Split into one document per page, or one per range string.
    #[instrument(skip_all, fields(name = input.name(), bytes_len = input.len()))]
    pub fn split(&self, input: &InputFile, mode: &SplitMode) -> Result<Vec<PdfOutput>> {
        let doc = PdfDocument::load(input)?;
        let total = doc.page_count();

        let plan: Vec<(String, Vec<u32>)> = match mode {
            SplitMode::Pages => {
                if total == 0 {
                    return Err(WandlerError::invalid(
                        ValidationKind::Pages,
                        "document has no pages to split",
                    ));
                }
                (1..=total)
                    .map(|page| (format!("page_{page}.pdf"), vec![page]))
                    .collect()
            }
            SplitMode::Ranges(ranges) => {
                if ranges.is_empty() {
                    return Err(WandlerError::invalid(
                        ValidationKind::Pages,
                        "at least one page range is required",
                    ));
                }
                ranges
                    .iter()
                    .map(|range| {
                        let pages = parse_page_range(range, total)?;
                        if pages.is_empty() {
                            return Err(WandlerError::invalid(
                                ValidationKind::Pages,
                                format!("page range '{range}' selects no pages of {total}"),
                            ));
                        }
                        Ok((format!("pages_{}.pdf", range_slug(range)), pages))
                    })
                    .collect::<Result<_>>()?
            }
        };

        debug!(outputs = plan.len(), total, "Split planned");

        plan.into_iter()
            .map(|(filename, pages)| {
                let mut assembler = PageAssembler::new();
                assembler.append_pages(&doc, &pages)?;
                Ok(PdfOutput::new(
                    PdfOperation::Split,
                    filename,
                    input.len(),
                    assembler.finish()?,
                ))
            })
            .collect()
    }

    /// Remap pages: output page `i` is input page `order[i]`. Repeats and
    /// omissions are allowed.
    #[instrument(skip_all, fields(name = input.name(), pages = order.len()))]
    pub fn reorder(&self, input: &InputFile, order: &[u32]) -> Result<PdfOutput> {
        let data = self.assemble(input, order, "page order")?;
        Ok(PdfOutput::new(
            PdfOperation::Reorder,
            format!("reordered_{}", input.name()),
            input.len(),
            data,
        ))
    }

    /// Copy the listed pages, in the listed order, into a new document.
    #[instrument(skip_all, fields(name = input.name(), pages = pages.len()))]
    pub fn extract(&self, input: &InputFile, pages: &[u32]) -> Result<PdfOutput> {
        let data = self.assemble(input, pages, "pages")?;
        let joined = pages
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("_");
        Ok(PdfOutput::new(
            PdfOperation::Extract,
            format!("extracted_pages_{joined}_{}", input.name()),
            input.len(),
            data,
        ))
    }

    /// Keep every page not listed, in ascending order.
    #[instrument(skip_all, fields(name = input.name(), pages = pages.len()))]
    pub fn delete(&self, input: &InputFile, pages: &[u32]) -> Result<PdfOutput> {
        let doc = PdfDocument::load(input)?;
        let total = doc.page_count();
        validate_pages(pages, total)?;

        let doomed: BTreeSet<u32> = pages.iter().copied().collect();
        let survivors: Vec<u32> = (1..=total).filter(|page| !doomed.contains(page)).collect();
        if survivors.is_empty() {
            return Err(WandlerError::invalid(
                ValidationKind::Pages,
                "cannot delete every page of the document",
            ));
        }
        debug!(deleted = doomed.len(), kept = survivors.len(), "Pages filtered");

        let mut assembler = PageAssembler::new();
        assembler.append_pages(&doc, &survivors)?;
        Ok(PdfOutput::new(
            PdfOperation::Delete,
            format!("filtered_{}", input.name()),
            input.len(),
            assembler.finish()?,
        ))
    }

    // -- Page attributes ------------------------------------------------------

    /// Set the absolute rotation of the selected pages. Other pages keep
    /// whatever rotation they had.
    #[instrument(skip_all, fields(name = input.name(), degrees = degrees))]
    pub fn rotate(
        &self,
        input: &InputFile,
        pages: &PageSelection,
        degrees: i64,
    ) -> Result<PdfOutput> {
        let rotation = Rotation::from_requested(degrees)?;
        let mut doc = PdfDocument::load(input)?;
        for page in pages.resolve(doc.page_count())? {
            doc.set_rotation(page, rotation)?;
        }
        Ok(PdfOutput::new(
            PdfOperation::Rotate,
            format!("rotated_{}", input.name()),
            input.len(),
            doc.into_bytes()?,
        ))
    }

    /// Add `degrees` to the current rotation of the selected pages, modulo a
    /// full turn.
    #[instrument(skip_all, fields(name = input.name(), degrees = degrees))]
    pub fn turn(&self, input: &InputFile, pages: &PageSelection, degrees: i64) -> Result<PdfOutput> {
        let by = Rotation::from_requested(degrees)?;
        let mut doc = PdfDocument::load(input)?;
        for page in pages.resolve(doc.page_count())? {
            let turned = doc.rotation(page)?.turned(by);
            doc.set_rotation(page, turned)?;
        }
        Ok(PdfOutput::new(
            PdfOperation::Turn,
            format!("rotated_{}", input.name()),
            input.len(),
            doc.into_bytes()?,
        ))
    }

    // -- Overlays -------------------------------------------------------------

    #[instrument(skip_all, fields(name = input.name(), text_len = overlay.text.len()))]
    pub fn add_text_overlay(&self, input: &InputFile, overlay: &TextOverlay) -> Result<PdfOutput> {
        let mut doc = PdfDocument::load(input)?;
        overlay::apply_text(&mut doc, overlay)?;
        Ok(PdfOutput::new(
            PdfOperation::TextOverlay,
            format!("text_overlay_{}", input.name()),
            input.len(),
            doc.into_bytes()?,
        ))
    }

    #[instrument(skip_all, fields(name = input.name(), image_len = overlay.image.len()))]
    pub fn add_image_overlay(
        &self,
        input: &InputFile,
        overlay: &ImageOverlay,
    ) -> Result<PdfOutput> {
        let mut doc = PdfDocument::load(input)?;
        overlay::apply_image(&mut doc, overlay)?;
        doc.document_mut().compress();
        Ok(PdfOutput::new(
            PdfOperation::ImageOverlay,
            format!("image_overlay_{}", input.name()),
            input.len(),
            doc.into_bytes()?,
        ))
    }

    // -- Whole-document -------------------------------------------------------

    /// Structural compression: drop unreachable and empty objects, renumber,
    /// deflate uncompressed streams, and pack the remaining dictionaries into
    /// object streams behind a cross-reference stream. Embedded images are
    /// not resampled.
    #[instrument(skip_all, fields(name = input.name(), bytes_len = input.len()))]
    pub fn compress(&self, input: &InputFile) -> Result<PdfOutput> {
        let mut doc = PdfDocument::load(input)?;
        let document = doc.document_mut();
        let pruned = document.prune_objects();
        let emptied = document.delete_zero_length_streams();
        document.renumber_objects();
        document.compress();
        debug!(pruned = pruned.len(), emptied = emptied.len(), "Objects compacted");

        let options = SaveOptions::builder()
            .use_object_streams(true)
            .use_xref_streams(true)
            .compression_level(6)
            .build();

        Ok(PdfOutput::new(
            PdfOperation::Compress,
            format!("compressed_{}", input.name()),
            input.len(),
            doc.into_bytes_with(options)?,
        ))
    }

    #[instrument(skip_all, fields(name = input.name(), bytes_len = input.len()))]
    pub fn metadata(&self, input: &InputFile) -> Result<PdfMetadata> {
        let doc = PdfDocument::load(input)?;
        Ok(PdfMetadata::read(&doc))
    }

    // -- Helpers --------------------------------------------------------------

    fn assemble(&self, input: &InputFile, pages: &[u32], what: &str) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(WandlerError::invalid(
                ValidationKind::Pages,
                format!("{what} must be a non-empty array"),
            ));
        }
        let doc = PdfDocument::load(input)?;
        let mut assembler = PageAssembler::new();
        assembler.append_pages(&doc, pages)?;
        assembler.finish()
    }
}

// -- Validation helpers -----------------------------------------------------------

/// The input declares itself a PDF by MIME type or file name.
pub fn is_pdf(input: &InputFile) -> bool {
    input.mime_type() == "application/pdf" || input.name().to_ascii_lowercase().ends_with(".pdf")
}

/// The bytes parse as a PDF.
pub fn validate_pdf(data: &[u8]) -> bool {
    lopdf::Document::load_mem(data).is_ok()
}

/// Operation names accepted by front ends.
pub fn supported_operations() -> Vec<&'static str> {
    PdfOperation::ALL.iter().map(|op| op.as_str()).collect()
}
