// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image transform engine — decode, resize per fit mode, re-encode. Pixel work
// goes through a `RasterCodec`; the geometry comes from `geometry::plan`.

use image::{DynamicImage, Rgba, RgbaImage};
use serde::Serialize;
use tracing::{debug, info, instrument};
use wandler_core::error::{Result, ValidationKind, WandlerError};
use wandler_core::{ConversionOptions, InputFile};

use super::codec::{ImageCodec, RasterCodec, RasterFormat};
use super::geometry::{self, ResizePlan};

/// Encoded output plus the dimensions reported to the caller as side data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedImage {
    #[serde(skip)]
    pub data: Vec<u8>,
    pub format: RasterFormat,
    pub original_width: u32,
    pub original_height: u32,
    pub width: u32,
    pub height: u32,
    pub original_size: usize,
    pub processed_size: usize,
}

/// Properties of an encoded image, read without transforming it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// Detected container format, e.g. `png`.
    pub format: Option<String>,
    pub size: usize,
    pub channels: u8,
    pub has_alpha: bool,
}

/// Decode → geometric resize → re-encode for raster images.
///
/// Each call decodes its own image and drops it before returning; the engine
/// itself holds nothing but the codec.
pub struct ImageTransformEngine {
    codec: Box<dyn RasterCodec + Send + Sync>,
}

impl Default for ImageTransformEngine {
    fn default() -> Self {
        Self::new(ImageCodec::default())
    }
}

impl ImageTransformEngine {
    /// Build an engine over any codec backend.
    pub fn new(codec: impl RasterCodec + Send + Sync + 'static) -> Self {
        Self {
            codec: Box::new(codec),
        }
    }

    /// Convert an image to `options.target_format`, resizing when dimensions
    /// are given. With no dimensions the image is only re-encoded.
    #[instrument(skip_all, fields(name = input.name(), bytes_len = input.len(), target = %options.target_format))]
    pub fn transform(
        &self,
        input: &InputFile,
        options: &ConversionOptions,
    ) -> Result<TransformedImage> {
        validate_dimensions(options)?;

        let source = self.codec.decode(input.name(), input.bytes())?;
        let (src_w, src_h) = (source.width(), source.height());

        let target = geometry::resolve_target(src_w, src_h, options);
        let plan = geometry::plan((src_w, src_h), target, options.effective_fit_mode());
        debug!(src_w, src_h, ?target, ?plan, "Resize planned");
        if plan.pixel_count() > geometry::MAX_PIXELS {
            return Err(WandlerError::invalid(
                ValidationKind::Dimensions,
                format!(
                    "output of {}x{} exceeds the pixel limit of {}",
                    target.0,
                    target.1,
                    geometry::MAX_PIXELS
                ),
            ));
        }

        let output = self.apply_plan(source, &plan);
        let format = RasterFormat::from_target(&options.target());
        let data = self
            .codec
            .encode(&output, format, options.clamped_quality())?;

        info!(
            from_w = src_w,
            from_h = src_h,
            to_w = output.width(),
            to_h = output.height(),
            format = format.extension(),
            output_bytes = data.len(),
            "Image transformed"
        );

        Ok(TransformedImage {
            original_width: src_w,
            original_height: src_h,
            width: output.width(),
            height: output.height(),
            original_size: input.len(),
            processed_size: data.len(),
            format,
            data,
        })
    }

    /// Resize an image; at least one of width or height is required.
    pub fn resize(&self, input: &InputFile, options: &ConversionOptions) -> Result<TransformedImage> {
        if options.width.is_none() && options.height.is_none() {
            return Err(WandlerError::invalid(
                ValidationKind::MissingDimensions,
                "width or height must be specified",
            ));
        }
        self.transform(input, options)
    }

    /// Read dimensions, format, and channel layout.
    #[instrument(skip_all, fields(name = input.name(), bytes_len = input.len()))]
    pub fn metadata(&self, input: &InputFile) -> Result<ImageMetadata> {
        let decoded = self.codec.decode(input.name(), input.bytes())?;
        let format = image::guess_format(input.bytes())
            .ok()
            .and_then(|f| f.extensions_str().first().copied())
            .map(str::to_string);
        let color = decoded.color();

        Ok(ImageMetadata {
            width: decoded.width(),
            height: decoded.height(),
            format,
            size: input.len(),
            channels: color.channel_count(),
            has_alpha: color.has_alpha(),
        })
    }

    /// Scale the source and, when the plan calls for a canvas, composite it.
    fn apply_plan(&self, source: DynamicImage, plan: &ResizePlan) -> DynamicImage {
        if plan.is_identity(source.width(), source.height()) {
            return source;
        }

        let scaled = if (plan.draw_width, plan.draw_height) == (source.width(), source.height()) {
            source
        } else {
            self.codec.resize(&source, plan.draw_width, plan.draw_height)
        };

        if plan.is_plain_scale() {
            return scaled;
        }

        let fill = Rgba(plan.background.unwrap_or([0, 0, 0, 0]));
        let mut canvas = RgbaImage::from_pixel(plan.canvas_width, plan.canvas_height, fill);
        image::imageops::overlay(&mut canvas, &scaled.to_rgba8(), plan.offset_x, plan.offset_y);
        DynamicImage::ImageRgba8(canvas)
    }
}

/// Explicit dimensions must be positive.
fn validate_dimensions(options: &ConversionOptions) -> Result<()> {
    for (label, value) in [("width", options.width), ("height", options.height)] {
        if value == Some(0) {
            return Err(WandlerError::invalid(
                ValidationKind::Dimensions,
                format!("{label} must be a positive integer"),
            ));
        }
    }
    Ok(())
}
