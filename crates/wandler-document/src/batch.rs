// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sequential batches with per-item outcomes.
//
// Items run one after another in input order. A failing item is recorded as a
// failure report and the batch moves on; the batch itself never fails. Sources
// are loaded lazily, so an unreadable entry fails alone.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use wandler_core::error::Result;
use wandler_core::error_report::{self, ErrorReport};
use wandler_core::{ConversionOptions, InputFile, PageSelection};

use crate::image::{ImageTransformEngine, TransformedImage};
use crate::pdf::document::PdfDocument;
use crate::pdf::editor::{PdfEditor, PdfOutput};
use crate::pdf::overlay::TextOverlay;

/// A batch entry that can be named up front and loaded when its turn comes.
pub trait BatchSource {
    fn name(&self) -> String;
    fn load(&self) -> Result<Cow<'_, InputFile>>;
}

impl BatchSource for InputFile {
    fn name(&self) -> String {
        InputFile::name(self).to_string()
    }

    fn load(&self) -> Result<Cow<'_, InputFile>> {
        Ok(Cow::Borrowed(self))
    }
}

/// What happened to one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchOutcome<T> {
    Success(T),
    Failure(ErrorReport),
}

/// One input's entry in a batch report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem<T> {
    pub name: String,
    pub original_size: usize,
    pub outcome: BatchOutcome<T>,
}

impl<T> BatchItem<T> {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Success(_))
    }
}

/// Per-item outcomes, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport<T> {
    pub items: Vec<BatchItem<T>>,
}

impl<T> BatchReport<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// At least one item failed. The batch still counts as answered.
    pub fn is_partial_failure(&self) -> bool {
        self.failed() > 0
    }

    /// Feed every success through `op`; an error turns that item into a
    /// failure and the rest carry on.
    pub fn and_then<U>(self, mut op: impl FnMut(&str, T) -> Result<U>) -> BatchReport<U> {
        let items = self
            .items
            .into_iter()
            .map(|item| {
                let outcome = match item.outcome {
                    BatchOutcome::Success(value) => settle(&item.name, op(&item.name, value)),
                    BatchOutcome::Failure(report) => BatchOutcome::Failure(report),
                };
                BatchItem {
                    name: item.name,
                    original_size: item.original_size,
                    outcome,
                }
            })
            .collect();
        BatchReport { items }
    }
}

fn settle<T>(name: &str, result: Result<T>) -> BatchOutcome<T> {
    match result {
        Ok(value) => BatchOutcome::Success(value),
        Err(err) => {
            warn!(name, %err, "Batch item failed");
            BatchOutcome::Failure(error_report::report(&err))
        }
    }
}

/// Load each source in order and run `op` on it, collecting each outcome.
/// A source that fails to load is recorded with an original size of zero.
pub fn run_batch<S: BatchSource, T>(
    sources: &[S],
    mut op: impl FnMut(&InputFile) -> Result<T>,
) -> BatchReport<T> {
    let items: Vec<BatchItem<T>> = sources
        .iter()
        .map(|source| {
            let name = source.name();
            let (original_size, result) = match source.load() {
                Ok(file) => (file.len(), op(&*file)),
                Err(err) => (0, Err(err)),
            };
            BatchItem {
                outcome: settle(&name, result),
                name,
                original_size,
            }
        })
        .collect();

    let report = BatchReport { items };
    info!(
        total = report.len(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Batch complete"
    );
    report
}

/// Resize every image with the same options.
#[instrument(skip_all, fields(files = sources.len()))]
pub fn batch_resize<S: BatchSource>(
    sources: &[S],
    options: &ConversionOptions,
) -> BatchReport<TransformedImage> {
    let engine = ImageTransformEngine::default();
    run_batch(sources, |file| engine.resize(file, options))
}

/// A PDF operation applied across a batch. `Merge` folds the inputs into one
/// document; the others run on each file on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum BatchPdfOperation {
    Merge,
    Compress,
    AddText(TextOverlay),
    Rotate { pages: PageSelection, degrees: i64 },
}

#[instrument(skip_all, fields(files = sources.len(), ?operation))]
pub fn batch_pdf<S: BatchSource>(
    sources: &[S],
    operation: &BatchPdfOperation,
) -> BatchReport<PdfOutput> {
    let editor = PdfEditor::new();
    match operation {
        BatchPdfOperation::Merge => batch_merge(&editor, sources),
        BatchPdfOperation::Compress => run_batch(sources, |file| editor.compress(file)),
        BatchPdfOperation::AddText(overlay) => {
            run_batch(sources, |file| editor.add_text_overlay(file, overlay))
        }
        BatchPdfOperation::Rotate { pages, degrees } => {
            run_batch(sources, |file| editor.rotate(file, pages, *degrees))
        }
    }
}

/// Every input that parses as a PDF joins the merge, in input order. The
/// report lists a failure per rejected input followed by the merged document
/// as a single item.
fn batch_merge<S: BatchSource>(editor: &PdfEditor, sources: &[S]) -> BatchReport<PdfOutput> {
    let mut accepted = Vec::new();
    let checked = run_batch(sources, |file| {
        PdfDocument::load(file)?;
        accepted.push(file.clone());
        Ok(())
    });

    let mut items: Vec<BatchItem<PdfOutput>> = checked
        .items
        .into_iter()
        .filter_map(|item| match item.outcome {
            BatchOutcome::Failure(report) => Some(BatchItem {
                name: item.name,
                original_size: item.original_size,
                outcome: BatchOutcome::Failure(report),
            }),
            BatchOutcome::Success(()) => None,
        })
        .collect();

    items.push(BatchItem {
        name: "merged.pdf".into(),
        original_size: accepted.iter().map(InputFile::len).sum(),
        outcome: settle("merged.pdf", editor.merge(&accepted)),
    });
    BatchReport { items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixture;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(name: &str, width: u32, height: u32) -> InputFile {
        let mut data = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([5, 5, 5, 255])))
            .write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
            .unwrap();
        InputFile::new(name, "image/png", data)
    }

    #[test]
    fn one_corrupt_image_does_not_stop_the_batch() {
        let files = vec![
            png("one.png", 40, 20),
            InputFile::new("two.png", "image/png", b"corrupt".to_vec()),
            png("three.png", 80, 40),
        ];
        let options = ConversionOptions::to_format("png").with_size(Some(20), None);

        let report = batch_resize(&files, &options);
        assert_eq!(report.len(), 3);
        assert!(report.is_partial_failure());
        assert_eq!((report.succeeded(), report.failed()), (2, 1));

        let names: Vec<_> = report.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["one.png", "two.png", "three.png"]);

        match &report.items[0].outcome {
            BatchOutcome::Success(image) => assert_eq!((image.width, image.height), (20, 10)),
            other => panic!("unexpected: {other:?}"),
        }
        match &report.items[1].outcome {
            BatchOutcome::Failure(err) => assert_eq!(err.code, "DECODE_ERROR"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(report.items[2].is_success());
    }

    #[test]
    fn missing_dimensions_fail_every_item_individually() {
        let files = vec![png("a.png", 4, 4), png("b.png", 4, 4)];
        let report = batch_resize(&files, &ConversionOptions::to_format("png"));
        assert_eq!(report.failed(), 2);
        for item in &report.items {
            match &item.outcome {
                BatchOutcome::Failure(err) => assert_eq!(err.code, "NO_DIMENSIONS"),
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[test]
    fn pdf_batch_rotates_each_file() {
        let files = vec![
            fixture::sample_input("a.pdf", 2),
            InputFile::new("b.pdf", "application/pdf", b"%PDF-broken".to_vec()),
            fixture::sample_input("c.pdf", 1),
        ];
        let operation = BatchPdfOperation::Rotate {
            pages: PageSelection::All,
            degrees: 270,
        };

        let report = batch_pdf(&files, &operation);
        assert_eq!(report.len(), 3);
        assert!(!report.items[1].is_success());
        match &report.items[2].outcome {
            BatchOutcome::Success(out) => {
                assert_eq!(out.filename, "rotated_c.pdf");
                assert_eq!(fixture::rotations(&out.data), vec![270]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_batch_is_not_a_failure() {
        let report = batch_pdf::<InputFile>(&[], &BatchPdfOperation::Compress);
        assert!(report.is_empty());
        assert!(!report.is_partial_failure());
    }

    #[test]
    fn merge_folds_readable_inputs_into_one_item() {
        let files = vec![
            fixture::sample_input("a.pdf", 2),
            InputFile::new("b.pdf", "application/pdf", b"%PDF-broken".to_vec()),
            fixture::sample_input("c.pdf", 3),
        ];

        let report = batch_pdf(&files, &BatchPdfOperation::Merge);
        assert_eq!(report.len(), 2);
        assert_eq!(report.items[0].name, "b.pdf");
        assert!(!report.items[0].is_success());

        let merged = &report.items[1];
        assert_eq!(merged.name, "merged.pdf");
        assert_eq!(merged.original_size, files[0].len() + files[2].len());
        match &merged.outcome {
            BatchOutcome::Success(out) => {
                assert_eq!(fixture::markers(&out.data), vec![1, 2, 1, 2, 3]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn merge_of_a_single_readable_input_fails_as_one_item() {
        let files = vec![fixture::sample_input("a.pdf", 2)];
        let report = batch_pdf(&files, &BatchPdfOperation::Merge);
        assert_eq!(report.len(), 1);
        match &report.items[0].outcome {
            BatchOutcome::Failure(err) => assert_eq!(err.code, "INSUFFICIENT_FILES"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    struct Unreadable(&'static str);

    impl BatchSource for Unreadable {
        fn name(&self) -> String {
            self.0.to_string()
        }

        fn load(&self) -> Result<Cow<'_, InputFile>> {
            Err(wandler_core::WandlerError::Decode {
                name: self.0.to_string(),
                detail: "unreadable".into(),
            })
        }
    }

    #[test]
    fn unloadable_sources_fail_alone() {
        let sources = [Unreadable("gone.png")];
        let options = ConversionOptions::to_format("png").with_size(Some(2), None);
        let report = batch_resize(&sources, &options);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.items[0].name, "gone.png");
        assert_eq!(report.items[0].original_size, 0);
    }

    #[test]
    fn and_then_turns_errors_into_failures() {
        let files = vec![png("one.png", 4, 4), png("two.png", 4, 4)];
        let options = ConversionOptions::to_format("png").with_size(Some(2), None);
        let written = batch_resize(&files, &options).and_then(|name, image| {
            if name == "two.png" {
                Err(wandler_core::WandlerError::Io(std::io::Error::other("disk full")))
            } else {
                Ok(image.width)
            }
        });
        assert_eq!(written.succeeded(), 1);
        assert_eq!(written.items[0].outcome, BatchOutcome::Success(2));
        match &written.items[1].outcome {
            BatchOutcome::Failure(err) => assert_eq!(err.code, "INTERNAL_ERROR"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn operations_deserialise_from_tagged_json() {
        let op: BatchPdfOperation = serde_json::from_str(r#"{"operation":"merge"}"#).unwrap();
        assert_eq!(op, BatchPdfOperation::Merge);

        let op: BatchPdfOperation =
            serde_json::from_str(r#"{"operation":"rotate","pages":[1,2],"degrees":90}"#).unwrap();
        assert_eq!(
            op,
            BatchPdfOperation::Rotate {
                pages: PageSelection::Pages(vec![1, 2]),
                degrees: 90
            }
        );

        let op: BatchPdfOperation =
            serde_json::from_str(r#"{"operation":"add-text","text":"Draft","pages":"all"}"#)
                .unwrap();
        match op {
            BatchPdfOperation::AddText(overlay) => {
                assert_eq!(overlay.text, "Draft");
                assert_eq!(overlay.font_size, 12.0);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
