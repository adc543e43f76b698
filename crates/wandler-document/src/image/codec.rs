// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster codec capability — decode, resize, and encode behind one trait so the
// transform engine does not care which image backend does the pixel work.
// The default implementation uses the `image` crate on the CPU.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::debug;
use wandler_core::error::{Result, WandlerError};

/// Raster formats the engine can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
}

impl RasterFormat {
    /// Target identifiers handled by the image engine.
    pub const TARGETS: [&'static str; 7] = ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff"];

    /// Map a target identifier onto an encoder. Anything unrecognised encodes
    /// as JPEG.
    pub fn from_target(target: &str) -> Self {
        match target.trim().to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "webp" => Self::WebP,
            "gif" => Self::Gif,
            "bmp" => Self::Bmp,
            "tif" | "tiff" => Self::Tiff,
            _ => Self::Jpeg,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::WebP => ImageFormat::WebP,
            Self::Gif => ImageFormat::Gif,
            Self::Bmp => ImageFormat::Bmp,
            Self::Tiff => ImageFormat::Tiff,
        }
    }
}

/// Decode → resize → encode capability used by [`super::ImageTransformEngine`].
pub trait RasterCodec {
    /// Decode encoded bytes. `name` is only used in the error.
    fn decode(&self, name: &str, data: &[u8]) -> Result<DynamicImage>;

    /// Resample to exactly `width` x `height`.
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage;

    /// Encode at `quality` (1–100). Lossless formats may ignore quality.
    fn encode(&self, image: &DynamicImage, format: RasterFormat, quality: u8) -> Result<Vec<u8>>;
}

/// CPU codec backed by the `image` crate.
#[derive(Debug, Clone, Copy)]
pub struct ImageCodec {
    filter: FilterType,
}

impl Default for ImageCodec {
    /// Lanczos3 for high-quality downscaling.
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

impl RasterCodec for ImageCodec {
    fn decode(&self, name: &str, data: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(data).map_err(|err| WandlerError::Decode {
            name: name.to_string(),
            detail: err.to_string(),
        })
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, self.filter)
    }

    fn encode(&self, image: &DynamicImage, format: RasterFormat, quality: u8) -> Result<Vec<u8>> {
        let quality = quality.clamp(1, 100);
        let mut buffer = Vec::new();

        let outcome = match format {
            RasterFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb = image.to_rgb8();
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
                rgb.write_with_encoder(encoder)
            }
            RasterFormat::Png => {
                // PNG is lossless; low quality trades encode time for size.
                let compression = if quality < 50 {
                    CompressionType::Best
                } else {
                    CompressionType::Default
                };
                let encoder =
                    PngEncoder::new_with_quality(&mut buffer, compression, PngFilter::Adaptive);
                image.write_with_encoder(encoder)
            }
            RasterFormat::WebP => {
                debug!(quality, "WebP encoder is lossless; quality ignored");
                let rgba = image.to_rgba8();
                rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buffer))
            }
            RasterFormat::Gif | RasterFormat::Bmp | RasterFormat::Tiff => {
                let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
                rgba.write_to(&mut Cursor::new(&mut buffer), format.image_format())
            }
        };

        outcome.map_err(|err| WandlerError::Encode {
            format: format.extension().to_string(),
            detail: err.to_string(),
        })?;
        Ok(buffer)
    }
}
