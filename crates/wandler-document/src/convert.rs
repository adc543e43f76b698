// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format dispatcher — classify an (input, target) pair once and route it to
// the image engine, the text transform, the archive packer, or passthrough.
//
// Passthrough returns the input bytes unchanged under the target's MIME type
// and extension. It is kept for compatibility with existing callers; set
// `PassthroughPolicy::Reject` to turn it into `UnsupportedFormat`.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use wandler_core::error::{Result, ValidationKind, WandlerError};
use wandler_core::{
    ConversionOptions, ConversionResult, EngineConfig, InputFile, MimeRegistry, PassthroughPolicy,
};

use crate::archive::{self, ARCHIVE_TARGETS};
use crate::image::{ImageTransformEngine, RasterFormat};
use crate::integrity::sha256_hex;
use crate::text::{self, TEXT_TARGETS};

/// The conversion path chosen for an (input, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionCategory {
    Image,
    Text,
    Archive,
    Passthrough,
}

impl ConversionCategory {
    /// First match wins: image, then text, then archive, else passthrough.
    pub fn classify(input: &InputFile, target: &str) -> Self {
        let target = target.trim().to_ascii_lowercase();
        let target = target.as_str();

        if input.mime_type().starts_with("image/") && RasterFormat::TARGETS.contains(&target) {
            Self::Image
        } else if is_text(input) && TEXT_TARGETS.contains(&target) {
            Self::Text
        } else if ARCHIVE_TARGETS.contains(&target) {
            Self::Archive
        } else {
            Self::Passthrough
        }
    }
}

/// Broad family of an input file, for front ends grouping uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

pub fn file_category(input: &InputFile) -> FileCategory {
    let mime = input.mime_type();
    if mime.starts_with("image/") {
        FileCategory::Image
    } else if mime.starts_with("video/") {
        FileCategory::Video
    } else if mime.starts_with("audio/") {
        FileCategory::Audio
    } else if mime.contains("pdf") || mime.contains("document") || mime.starts_with("text/") {
        FileCategory::Document
    } else {
        FileCategory::Other
    }
}

/// Target formats offered to the user for an input.
pub fn supported_formats(input: &InputFile) -> &'static [&'static str] {
    let mime = input.mime_type();
    if mime.starts_with("image/") {
        &["jpg", "png", "webp", "gif", "bmp"]
    } else if is_text(input) {
        &["txt", "html", "json", "csv"]
    } else if mime.starts_with("audio/") {
        &["mp3", "wav", "aac", "ogg"]
    } else if mime.starts_with("video/") {
        &["mp4", "avi", "mov", "webm"]
    } else {
        &["txt", "json", "zip"]
    }
}

fn is_text(input: &InputFile) -> bool {
    input.mime_type().starts_with("text/") || input.name().ends_with(".txt")
}

/// Entry point for single-file conversions.
pub struct FormatDispatcher {
    config: EngineConfig,
    images: ImageTransformEngine,
}

impl Default for FormatDispatcher {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl FormatDispatcher {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_image_engine(config, ImageTransformEngine::default())
    }

    /// Use a specific image engine, e.g. one over a different codec.
    pub fn with_image_engine(config: EngineConfig, images: ImageTransformEngine) -> Self {
        Self { config, images }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn images(&self) -> &ImageTransformEngine {
        &self.images
    }

    /// Convert one file to `options.target_format`.
    #[instrument(skip_all, fields(name = input.name(), mime = input.mime_type(), bytes_len = input.len(), target = %options.target_format))]
    pub fn convert(&self, input: &InputFile, options: &ConversionOptions) -> Result<ConversionResult> {
        let target = options.target();
        if target.is_empty() {
            return Err(WandlerError::invalid(
                ValidationKind::Other,
                "a target format is required",
            ));
        }
        self.config.check_payload(input)?;

        let category = ConversionCategory::classify(input, &target);
        debug!(?category, "Conversion classified");

        let data = match category {
            ConversionCategory::Image => self.images.transform(input, options)?.data,
            ConversionCategory::Text => text::transform_text(input, &target, Utc::now())?,
            ConversionCategory::Archive => archive::pack(&[input], &target),
            ConversionCategory::Passthrough => match self.config.passthrough {
                PassthroughPolicy::Passthrough => {
                    warn!(
                        from = input.mime_type(),
                        to = %target,
                        "No converter available; relabelling input bytes"
                    );
                    input.bytes().to_vec()
                }
                PassthroughPolicy::Reject => {
                    return Err(WandlerError::UnsupportedFormat { format: target });
                }
            },
        };

        let result = ConversionResult {
            filename: input.renamed(&target),
            mime_type: MimeRegistry::mime_type(&target).to_string(),
            original_size: input.len(),
            converted_size: data.len(),
            sha256: sha256_hex(&data),
            data,
        };

        info!(
            ?category,
            filename = %result.filename,
            original_size = result.original_size,
            converted_size = result.converted_size,
            "Conversion complete"
        );
        Ok(result)
    }
}
