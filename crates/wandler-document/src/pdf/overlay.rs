// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text and image overlays stamped onto existing pages.
//
// The page's existing content is wrapped in `q`/`Q` so whatever graphics state
// it leaves behind cannot leak into the stamp, and the stamp is appended as a
// new content stream. Fonts, images, and transparency states are registered in
// a page-local copy of `/Resources` under names that do not clash with the
// page's own.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wandler_core::PageSelection;
use wandler_core::error::{Result, ValidationKind, WandlerError};

use super::document::{PdfDocument, inherited, owned_dictionary};

/// Text origin keeps at least this much room before the right page edge.
pub const RIGHT_MARGIN: f32 = 100.0;

/// Text stamped on selected pages.
///
/// `y` is measured down from the top edge of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextOverlay {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    /// `#RGB` or `#RRGGBB`; anything else draws black.
    pub color: String,
    pub opacity: f32,
    pub pages: PageSelection,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self {
            text: String::new(),
            x: 50.0,
            y: 50.0,
            font_size: 12.0,
            color: "#000000".into(),
            opacity: 1.0,
            pages: PageSelection::All,
        }
    }
}

impl TextOverlay {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// A raster image drawn with its lower-left corner at (`x`, `y`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageOverlay {
    #[serde(skip)]
    pub image: Vec<u8>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
    pub pages: PageSelection,
}

impl Default for ImageOverlay {
    fn default() -> Self {
        Self {
            image: Vec::new(),
            x: 50.0,
            y: 50.0,
            width: 100.0,
            height: 100.0,
            opacity: 1.0,
            pages: PageSelection::All,
        }
    }
}

impl ImageOverlay {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            ..Self::default()
        }
    }
}

// -- Colour grammar -------------------------------------------------------------

/// Parse `#RGB` or `#RRGGBB` into channels in `[0, 1]`. Anything else is black.
pub fn parse_color(value: &str) -> [f32; 3] {
    match hex_color(value) {
        Some(rgb) => rgb,
        None => {
            warn!(color = value, "Unrecognised overlay colour, drawing black");
            [0.0; 3]
        }
    }
}

fn hex_color(value: &str) -> Option<[f32; 3]> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).ok();
    let [r, g, b] = match hex.len() {
        3 => {
            let doubled: Vec<String> = hex.chars().map(|c| format!("{c}{c}")).collect();
            [channel(&doubled[0])?, channel(&doubled[1])?, channel(&doubled[2])?]
        }
        6 => [channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?],
        _ => return None,
    };
    Some([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
}

// -- Stamping -------------------------------------------------------------------

/// Stamp `overlay.text` onto every selected page.
pub fn apply_text(doc: &mut PdfDocument, overlay: &TextOverlay) -> Result<()> {
    if overlay.text.trim().is_empty() {
        return Err(WandlerError::invalid(
            ValidationKind::MissingText,
            "text content is required",
        ));
    }

    let pages = overlay.pages.resolve(doc.page_count())?;
    let [r, g, b] = parse_color(&overlay.color);
    let encoded = win_ansi(&overlay.text);

    let font_id = doc.document_mut().add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let state_id = transparency_state(doc.document_mut(), overlay.opacity);

    for page in pages {
        let (width, height) = doc.page_size(page)?;
        let x = overlay.x.min(width - RIGHT_MARGIN);
        let y = height - overlay.y;

        let mut resources = vec![("Font", "WF", font_id)];
        resources.extend(state_id.map(|id| ("ExtGState", "WG", id)));

        let page_id = doc.page_id(page)?;
        stamp_page(doc.document_mut(), page_id, &resources, |names| {
            let mut ops = vec![Operation::new("q", vec![])];
            if let Some(state) = names.get(1) {
                ops.push(Operation::new("gs", vec![Object::Name(state.clone().into_bytes())]));
            }
            ops.extend([
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(names[0].clone().into_bytes()), overlay.font_size.into()],
                ),
                Operation::new("rg", vec![r.into(), g.into(), b.into()]),
                Operation::new("Td", vec![x.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(encoded.clone())]),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ]);
            ops
        })?;
        debug!(page, x, y, "Text stamped");
    }
    Ok(())
}

/// Draw `overlay.image` onto every selected page.
pub fn apply_image(doc: &mut PdfDocument, overlay: &ImageOverlay) -> Result<()> {
    if overlay.width <= 0.0 || overlay.height <= 0.0 {
        return Err(WandlerError::invalid(
            ValidationKind::Dimensions,
            "image overlay width and height must be positive",
        ));
    }

    let pages = overlay.pages.resolve(doc.page_count())?;
    let image_id = embed_image(doc.document_mut(), &overlay.image)?;
    let state_id = transparency_state(doc.document_mut(), overlay.opacity);

    for page in pages {
        let mut resources = vec![("XObject", "WI", image_id)];
        resources.extend(state_id.map(|id| ("ExtGState", "WG", id)));

        let page_id = doc.page_id(page)?;
        stamp_page(doc.document_mut(), page_id, &resources, |names| {
            let mut ops = vec![Operation::new("q", vec![])];
            if let Some(state) = names.get(1) {
                ops.push(Operation::new("gs", vec![Object::Name(state.clone().into_bytes())]));
            }
            ops.extend([
                Operation::new(
                    "cm",
                    vec![
                        overlay.width.into(),
                        0.into(),
                        0.into(),
                        overlay.height.into(),
                        overlay.x.into(),
                        overlay.y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(names[0].clone().into_bytes())]),
                Operation::new("Q", vec![]),
            ]);
            ops
        })?;
        debug!(page, "Image stamped");
    }
    Ok(())
}

/// Register `resources` on the page and append the operations built by `draw`.
///
/// `draw` receives the resource names in the order the entries were given.
fn stamp_page(
    doc: &mut Document,
    page_id: ObjectId,
    resources: &[(&str, &str, ObjectId)],
    draw: impl FnOnce(&[String]) -> Vec<Operation>,
) -> Result<()> {
    let mut page_resources = owned_dictionary(doc, inherited(doc, page_id, b"Resources"));
    let mut names = Vec::with_capacity(resources.len());
    for &(category, prefix, id) in resources {
        let mut group = owned_dictionary(doc, page_resources.get(category.as_bytes()).ok());
        let name = unused_name(&group, prefix);
        group.set(name.clone(), Object::Reference(id));
        page_resources.set(category, Object::Dictionary(group));
        names.push(name);
    }

    let existing = content_parts(doc, page_id);
    let stamp = Content {
        operations: draw(&names),
    }
    .encode()
    .map_err(|err| WandlerError::Pdf(format!("failed to encode overlay content: {err}")))?;

    let mut tail = b"\nQ\n".to_vec();
    tail.extend(stamp);
    let head_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let tail_id = doc.add_object(Stream::new(Dictionary::new(), tail));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(head_id));
    contents.extend(existing);
    contents.push(Object::Reference(tail_id));

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|err| WandlerError::Pdf(format!("page object {page_id:?} is unreadable: {err}")))?;
    page.set("Contents", contents);
    page.set("Resources", page_resources);
    Ok(())
}

/// The page's content streams as a flat list of references.
fn content_parts(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    match page.get(b"Contents") {
        Ok(Object::Array(parts)) => parts.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(parts)) => parts.clone(),
            _ => vec![Object::Reference(*id)],
        },
        _ => Vec::new(),
    }
}

fn unused_name(group: &Dictionary, prefix: &str) -> String {
    let mut index = 0usize;
    loop {
        let name = format!("{prefix}{index}");
        if !group.has(name.as_bytes()) {
            return name;
        }
        index += 1;
    }
}

/// An `/ExtGState` carrying the fill and stroke alpha, when below opaque.
fn transparency_state(doc: &mut Document, opacity: f32) -> Option<ObjectId> {
    let alpha = opacity.clamp(0.0, 1.0);
    (alpha < 1.0).then(|| {
        doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => alpha,
            "CA" => alpha,
        })
    })
}

/// Decode a raster image and embed it as an RGB image XObject, with an
/// `/SMask` when any pixel is not fully opaque. The streams are left raw;
/// callers compress the document before saving.
fn embed_image(doc: &mut Document, data: &[u8]) -> Result<ObjectId> {
    let decoded = image::load_from_memory(data).map_err(|err| WandlerError::Decode {
        name: "overlay image".into(),
        detail: err.to_string(),
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    let mut alpha = Vec::with_capacity(rgba.len() / 4);
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };

    if alpha.iter().any(|&a| a != u8::MAX) {
        let mask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        );
        let mask_id = doc.add_object(mask);
        image_dict.set("SMask", Object::Reference(mask_id));
    }

    let image = Stream::new(image_dict, rgb);
    debug!(width, height, "Overlay image embedded");
    Ok(doc.add_object(image))
}

/// Standard 14 fonts take single-byte text; characters outside Latin-1 are
/// drawn as `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::number;
    use crate::pdf::fixture;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn load(pages: u32) -> PdfDocument {
        PdfDocument::load(&fixture::sample_input("doc.pdf", pages)).unwrap()
    }

    fn png(pixel: [u8; 4]) -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba(pixel)))
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    fn stamped_content(doc: &PdfDocument, page: u32) -> Vec<u8> {
        let id = doc.page_id(page).unwrap();
        doc.document().get_page_content(id).unwrap()
    }

    /// Numeric operands of the first `operator` in the page's content.
    fn operands(doc: &PdfDocument, page: u32, operator: &str) -> Vec<f32> {
        let content = Content::decode(&stamped_content(doc, page)).unwrap();
        content
            .operations
            .iter()
            .find(|op| op.operator == operator)
            .map(|op| op.operands.iter().filter_map(number).collect())
            .unwrap_or_default()
    }

    #[test]
    fn colours_parse_short_and_long_hex() {
        assert_eq!(parse_color("#fff"), [1.0, 1.0, 1.0]);
        assert_eq!(parse_color("#FF0000"), [1.0, 0.0, 0.0]);
        let [r, g, b] = parse_color("#336699");
        assert!((r - 0.2).abs() < 1e-6 && (g - 0.4).abs() < 1e-6 && (b - 0.6).abs() < 1e-6);
    }

    #[test]
    fn bad_colours_fall_back_to_black() {
        for bad in ["red", "#12", "#12345", "#ggg", "", "000000"] {
            assert_eq!(parse_color(bad), [0.0, 0.0, 0.0], "{bad}");
        }
    }

    #[test]
    fn text_is_measured_from_the_top_and_clamped_right() {
        let mut doc = load(1);
        let overlay = TextOverlay {
            x: 9000.0,
            y: 42.0,
            ..TextOverlay::new("Draft")
        };
        apply_text(&mut doc, &overlay).unwrap();

        let content = String::from_utf8_lossy(&stamped_content(&doc, 1)).into_owned();
        assert!(content.contains("(Draft)"), "{content}");
        // The fixture's own text is drawn at (100, 600); the stamp comes last.
        let content = Content::decode(&stamped_content(&doc, 1)).unwrap();
        let origin: Vec<f32> = content
            .operations
            .iter()
            .rev()
            .find(|op| op.operator == "Td")
            .map(|op| op.operands.iter().filter_map(number).collect())
            .unwrap();
        assert_eq!(origin, vec![495.0, 800.0]);
    }

    #[test]
    fn text_only_touches_selected_pages() {
        let mut doc = load(3);
        let overlay = TextOverlay {
            pages: PageSelection::Pages(vec![2]),
            ..TextOverlay::new("Only two")
        };
        apply_text(&mut doc, &overlay).unwrap();

        assert!(String::from_utf8_lossy(&stamped_content(&doc, 2)).contains("Only two"));
        assert!(!String::from_utf8_lossy(&stamped_content(&doc, 1)).contains("Only two"));
        assert!(!String::from_utf8_lossy(&stamped_content(&doc, 3)).contains("Only two"));
    }

    #[test]
    fn translucent_text_registers_a_graphics_state() {
        let mut doc = load(1);
        let overlay = TextOverlay {
            opacity: 0.5,
            ..TextOverlay::new("Faint")
        };
        apply_text(&mut doc, &overlay).unwrap();

        let page = doc.document().get_dictionary(doc.page_id(1).unwrap()).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        assert!(resources.get(b"ExtGState").unwrap().as_dict().unwrap().has(b"WG0"));
        // The page's own font survives alongside the overlay font.
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(b"F1") && fonts.has(b"WF0"));
    }

    #[test]
    fn empty_text_is_rejected() {
        let mut doc = load(1);
        assert!(matches!(
            apply_text(&mut doc, &TextOverlay::new("  ")),
            Err(WandlerError::InputValidation { .. })
        ));
    }

    #[test]
    fn out_of_range_page_is_rejected_before_mutation() {
        let mut doc = load(2);
        let overlay = TextOverlay {
            pages: PageSelection::Pages(vec![1, 3]),
            ..TextOverlay::new("x")
        };
        assert!(matches!(
            apply_text(&mut doc, &overlay),
            Err(WandlerError::PageIndex { page: 3, total: 2 })
        ));
        assert!(!String::from_utf8_lossy(&stamped_content(&doc, 1)).contains("(x)"));
    }

    #[test]
    fn image_is_drawn_with_explicit_size() {
        let mut doc = load(2);
        let overlay = ImageOverlay {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 40.0,
            ..ImageOverlay::new(png([255, 0, 0, 255]))
        };
        apply_image(&mut doc, &overlay).unwrap();

        for page in 1..=2 {
            assert_eq!(
                operands(&doc, page, "cm"),
                vec![30.0, 0.0, 0.0, 40.0, 10.0, 20.0]
            );
            let content = String::from_utf8_lossy(&stamped_content(&doc, page)).into_owned();
            assert!(content.contains("/WI0"), "{content}");
        }
    }

    #[test]
    fn transparent_pixels_get_a_soft_mask() {
        let mut doc = load(1);
        apply_image(&mut doc, &ImageOverlay::new(png([0, 0, 255, 100]))).unwrap();
        let masks = doc
            .document()
            .objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .filter(|stream| stream.dict.has(b"SMask"))
            .count();
        assert_eq!(masks, 1);
    }

    #[test]
    fn undecodable_image_is_a_decode_error() {
        let mut doc = load(1);
        assert!(matches!(
            apply_image(&mut doc, &ImageOverlay::new(b"nope".to_vec())),
            Err(WandlerError::Decode { .. })
        ));
    }

    #[test]
    fn non_latin_characters_become_question_marks() {
        assert_eq!(win_ansi("Café ✓"), b"Caf\xe9 ?".to_vec());
    }
}
