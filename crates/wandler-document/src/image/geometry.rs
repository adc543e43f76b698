// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resize geometry — pure arithmetic turning source dimensions plus options into
// a canvas size, a scaled draw size, and a draw offset. No pixels are touched
// here, so the fit/fill/cover/inside rules can be checked in isolation.

use wandler_core::{ConversionOptions, FitMode};

/// Background used to letterbox `fit` output.
pub const LETTERBOX_WHITE: [u8; 4] = [255, 255, 255, 255];

/// Largest canvas or draw area a plan may allocate, 0x3FFF squared.
pub const MAX_PIXELS: u64 = 0x3FFF * 0x3FFF;

/// How to place a scaled source image onto the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub draw_width: u32,
    pub draw_height: u32,
    /// Offset of the drawn image's top-left corner; negative when `cover`
    /// crops.
    pub offset_x: i64,
    pub offset_y: i64,
    /// Solid fill painted under the image, if any.
    pub background: Option<[u8; 4]>,
}

impl ResizePlan {
    /// The plan leaves a `width` x `height` source untouched.
    pub fn is_identity(&self, width: u32, height: u32) -> bool {
        self.canvas_width == width
            && self.canvas_height == height
            && self.draw_width == width
            && self.draw_height == height
    }

    /// Pixels the plan must allocate at once: the larger of the canvas and
    /// the scaled draw area.
    pub fn pixel_count(&self) -> u64 {
        let canvas = u64::from(self.canvas_width) * u64::from(self.canvas_height);
        let draw = u64::from(self.draw_width) * u64::from(self.draw_height);
        canvas.max(draw)
    }

    /// The scaled image is the whole output; no compositing is needed.
    pub fn is_plain_scale(&self) -> bool {
        self.canvas_width == self.draw_width
            && self.canvas_height == self.draw_height
            && self.offset_x == 0
            && self.offset_y == 0
    }
}

/// Resolve the target dimensions for a `width` x `height` source.
///
/// Both given: used as-is. One given with the ratio maintained: the other is
/// derived from the source ratio. One given without the ratio: the other keeps
/// the source size. Neither: the source size.
pub fn resolve_target(width: u32, height: u32, options: &ConversionOptions) -> (u32, u32) {
    match (options.width, options.height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) if options.maintain_aspect_ratio => {
            (w, scale_dimension(height, w as f64 / width as f64))
        }
        (None, Some(h)) if options.maintain_aspect_ratio => {
            (scale_dimension(width, h as f64 / height as f64), h)
        }
        (Some(w), None) => (w, height),
        (None, Some(h)) => (width, h),
        (None, None) => (width, height),
    }
}

/// Build the placement plan for a source scaled into `target` under `mode`.
pub fn plan(source: (u32, u32), target: (u32, u32), mode: FitMode) -> ResizePlan {
    let (src_w, src_h) = source;
    let (dst_w, dst_h) = target;
    let scale_x = dst_w as f64 / src_w as f64;
    let scale_y = dst_h as f64 / src_h as f64;

    match mode {
        FitMode::Fill => ResizePlan {
            canvas_width: dst_w,
            canvas_height: dst_h,
            draw_width: dst_w,
            draw_height: dst_h,
            offset_x: 0,
            offset_y: 0,
            background: None,
        },
        FitMode::Inside => {
            let scale = scale_x.min(scale_y).min(1.0);
            let draw_w = scale_dimension(src_w, scale);
            let draw_h = scale_dimension(src_h, scale);
            ResizePlan {
                canvas_width: draw_w,
                canvas_height: draw_h,
                draw_width: draw_w,
                draw_height: draw_h,
                offset_x: 0,
                offset_y: 0,
                background: None,
            }
        }
        FitMode::Fit | FitMode::Cover => {
            let scale = if mode == FitMode::Fit {
                scale_x.min(scale_y)
            } else {
                scale_x.max(scale_y)
            };
            let draw_w = scale_dimension(src_w, scale);
            let draw_h = scale_dimension(src_h, scale);
            ResizePlan {
                canvas_width: dst_w,
                canvas_height: dst_h,
                draw_width: draw_w,
                draw_height: draw_h,
                offset_x: (dst_w as i64 - draw_w as i64) / 2,
                offset_y: (dst_h as i64 - draw_h as i64) / 2,
                background: (mode == FitMode::Fit).then_some(LETTERBOX_WHITE),
            }
        }
    }
}

/// Scale a pixel dimension, rounding to the nearest pixel and never below one.
fn scale_dimension(value: u32, scale: f64) -> u32 {
    ((value as f64 * scale).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(width: Option<u32>, height: Option<u32>, keep_ratio: bool) -> ConversionOptions {
        ConversionOptions {
            maintain_aspect_ratio: keep_ratio,
            ..ConversionOptions::default()
        }
        .with_size(width, height)
    }

    #[test]
    fn width_only_derives_height_from_ratio() {
        assert_eq!(resolve_target(800, 600, &opts(Some(400), None, true)), (400, 300));
        assert_eq!(resolve_target(800, 600, &opts(None, Some(150), true)), (200, 150));
    }

    #[test]
    fn width_only_without_ratio_keeps_source_height() {
        assert_eq!(resolve_target(800, 600, &opts(Some(400), None, false)), (400, 600));
    }

    #[test]
    fn no_dimensions_keep_the_source() {
        assert_eq!(resolve_target(640, 480, &opts(None, None, true)), (640, 480));
        assert_eq!(resolve_target(640, 480, &opts(Some(10), Some(20), true)), (10, 20));
    }

    #[test]
    fn fit_letterboxes_square_into_wide_canvas() {
        let plan = plan((400, 400), (200, 100), FitMode::Fit);
        assert_eq!((plan.canvas_width, plan.canvas_height), (200, 100));
        assert_eq!((plan.draw_width, plan.draw_height), (100, 100));
        assert_eq!((plan.offset_x, plan.offset_y), (50, 0));
        assert_eq!(plan.background, Some(LETTERBOX_WHITE));
    }

    #[test]
    fn pixel_count_covers_the_overflowing_draw() {
        let plan = plan((1, 1000), (1000, 1000), FitMode::Cover);
        assert_eq!((plan.canvas_width, plan.canvas_height), (1000, 1000));
        assert_eq!(plan.pixel_count(), 1000 * 1_000_000);
        assert!(plan.pixel_count() > MAX_PIXELS);

        let huge = super::plan((4, 4), (u32::MAX, u32::MAX), FitMode::Fill);
        assert_eq!(huge.pixel_count(), u64::from(u32::MAX) * u64::from(u32::MAX));
    }

    #[test]
    fn cover_overflows_and_centres() {
        let plan = plan((400, 200), (100, 100), FitMode::Cover);
        assert_eq!((plan.canvas_width, plan.canvas_height), (100, 100));
        assert_eq!((plan.draw_width, plan.draw_height), (200, 100));
        assert_eq!((plan.offset_x, plan.offset_y), (-50, 0));
        assert_eq!(plan.background, None);
    }

    #[test]
    fn fill_stretches_exactly() {
        let plan = plan((400, 200), (50, 300), FitMode::Fill);
        assert!(plan.is_plain_scale());
        assert_eq!((plan.draw_width, plan.draw_height), (50, 300));
    }

    #[test]
    fn inside_never_enlarges() {
        let grown = plan((100, 50), (400, 400), FitMode::Inside);
        assert!(grown.is_identity(100, 50));

        let shrunk = plan((1000, 500), (300, 300), FitMode::Inside);
        assert_eq!((shrunk.canvas_width, shrunk.canvas_height), (300, 150));
        assert!(shrunk.is_plain_scale());
    }

    #[test]
    fn tiny_scales_keep_one_pixel() {
        let plan = plan((1000, 1), (10, 10), FitMode::Fit);
        assert_eq!((plan.draw_width, plan.draw_height), (10, 1));
    }
}
