// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — raster codec capability, resize geometry, and the transform engine.

pub mod codec;
pub mod geometry;
pub mod processor;

pub use codec::{ImageCodec, RasterCodec, RasterFormat};
pub use processor::{ImageMetadata, ImageTransformEngine, TransformedImage};
