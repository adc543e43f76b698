// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page arena — a loaded PDF viewed as an ordered list of pages addressed by
// 1-based number. Every accessor validates the number against the current page
// count before touching the underlying `lopdf` document.

use lopdf::{Dictionary, Document, Object, ObjectId, SaveOptions};
use tracing::{debug, instrument};
use wandler_core::error::{Result, WandlerError};
use wandler_core::types::validate_pages;
use wandler_core::{InputFile, Rotation};

/// US Letter, used when a page tree carries no `/MediaBox` at all.
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Page attributes a page may inherit from its ancestors in the page tree.
pub const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Bound on `/Parent` and reference chains; real page trees are shallow.
const MAX_CHAIN: usize = 64;

/// A loaded PDF plus its page arena.
pub struct PdfDocument {
    name: String,
    document: Document,
    /// Page object ids in page order; index `n - 1` holds page `n`.
    pages: Vec<ObjectId>,
    original_size: usize,
}

impl PdfDocument {
    // -- Construction ---------------------------------------------------------

    /// Parse an input file. Unparseable bytes are a decode error naming the
    /// file.
    #[instrument(skip_all, fields(name = input.name(), bytes_len = input.len()))]
    pub fn load(input: &InputFile) -> Result<Self> {
        let document = Document::load_mem(input.bytes()).map_err(|err| WandlerError::Decode {
            name: input.name().to_string(),
            detail: err.to_string(),
        })?;
        let pages: Vec<ObjectId> = document.get_pages().into_values().collect();

        debug!(pages = pages.len(), "PDF loaded");

        Ok(Self {
            name: input.name().to_string(),
            document,
            pages,
            original_size: input.len(),
        })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Byte length of the file the document was loaded from.
    pub fn original_size(&self) -> usize {
        self.original_size
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Object id of page `page` (1-based).
    pub fn page_id(&self, page: u32) -> Result<ObjectId> {
        validate_pages(&[page], self.page_count())?;
        Ok(self.pages[page as usize - 1])
    }

    /// Effective rotation of a page, following `/Rotate` inheritance.
    pub fn rotation(&self, page: u32) -> Result<Rotation> {
        let id = self.page_id(page)?;
        let degrees = inherited(&self.document, id, b"Rotate")
            .map(|value| resolve(&self.document, value))
            .and_then(|value| value.as_i64().ok())
            .unwrap_or(0);
        Ok(Rotation::normalized(degrees))
    }

    /// Width and height of a page's media box in points.
    pub fn page_size(&self, page: u32) -> Result<(f32, f32)> {
        let id = self.page_id(page)?;
        let size = inherited(&self.document, id, b"MediaBox")
            .map(|value| resolve(&self.document, value))
            .and_then(rect_size)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Ok(size)
    }

    /// The trailer's `/Info` dictionary, if the document has one.
    pub fn info(&self) -> Option<&Dictionary> {
        let info = self.document.trailer.get(b"Info").ok()?;
        resolve(&self.document, info).as_dict().ok()
    }

    // -- Mutation -------------------------------------------------------------

    /// Set a page's absolute rotation. The value is written on the page itself
    /// so it overrides anything inherited.
    pub fn set_rotation(&mut self, page: u32, rotation: Rotation) -> Result<()> {
        let id = self.page_id(page)?;
        self.page_dict_mut(id)?
            .set("Rotate", Object::Integer(rotation.degrees()));
        Ok(())
    }

    pub(crate) fn page_dict_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary> {
        self.document
            .get_dictionary_mut(id)
            .map_err(|err| WandlerError::Pdf(format!("page object {id:?} is unreadable: {err}")))
    }

    // -- Serialisation --------------------------------------------------------

    /// Serialise the document with a classic cross-reference table, consuming it.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        self.into_bytes_with(SaveOptions::default())
    }

    /// Serialise with explicit writer options. Object streams pack
    /// non-stream objects into `/ObjStm` containers and raise the header
    /// version to 1.5.
    pub fn into_bytes_with(mut self, options: SaveOptions) -> Result<Vec<u8>> {
        let object_streams = options.use_object_streams;
        let mut output = Vec::new();
        self.document
            .save_with_options(&mut output, options)
            .map_err(|err| WandlerError::Pdf(format!("failed to serialise {}: {err}", self.name)))?;
        debug!(output_bytes = output.len(), object_streams, "PDF serialised");
        Ok(output)
    }
}

// -- Page-tree helpers ----------------------------------------------------------

/// Look up `key` on a page or, failing that, on its nearest ancestor.
pub fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_CHAIN {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Follow references until a direct object is reached. A dangling reference
/// is returned as-is.
pub fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    let mut current = object;
    for _ in 0..MAX_CHAIN {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(next) => current = next,
                Err(_) => return current,
            },
            _ => return current,
        }
    }
    current
}

/// An owned copy of a dictionary that may be given directly or by reference.
/// Anything else yields an empty dictionary.
pub fn owned_dictionary(doc: &Document, object: Option<&Object>) -> Dictionary {
    object
        .map(|value| resolve(doc, value))
        .and_then(|value| value.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new)
}

/// Numeric value of an integer or real object.
pub fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

/// Width and height of a `[llx lly urx ury]` rectangle.
fn rect_size(object: &Object) -> Option<(f32, f32)> {
    let corners = object.as_array().ok()?;
    if corners.len() != 4 {
        return None;
    }
    let values: Vec<f32> = corners.iter().filter_map(number).collect();
    match values.as_slice() {
        [llx, lly, urx, ury] => Some(((urx - llx).abs(), (ury - lly).abs())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixture::{self, FixtureSpec};

    #[test]
    fn pages_are_addressed_from_one() {
        let doc = PdfDocument::load(&fixture::sample_input("three.pdf", 3)).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert!(doc.page_id(1).is_ok());
        assert!(doc.page_id(3).is_ok());
        assert!(matches!(
            doc.page_id(0),
            Err(WandlerError::PageIndex { page: 0, total: 3 })
        ));
        assert!(matches!(
            doc.page_id(4),
            Err(WandlerError::PageIndex { page: 4, total: 3 })
        ));
    }

    #[test]
    fn media_box_is_inherited() {
        let doc = PdfDocument::load(&fixture::sample_input("a4.pdf", 1)).unwrap();
        assert_eq!(doc.page_size(1).unwrap(), (595.0, 842.0));
    }

    #[test]
    fn rotation_is_inherited_and_normalised() {
        let data = fixture::build(&FixtureSpec {
            pages: 2,
            inherited_rotate: Some(-90),
            ..FixtureSpec::default()
        });
        let mut doc =
            PdfDocument::load(&InputFile::new("r.pdf", "application/pdf", data)).unwrap();
        assert_eq!(doc.rotation(1).unwrap(), Rotation::ThreeQuarter);

        doc.set_rotation(2, Rotation::Half).unwrap();
        assert_eq!(doc.rotation(2).unwrap(), Rotation::Half);
        assert_eq!(doc.rotation(1).unwrap(), Rotation::ThreeQuarter);
    }

    #[test]
    fn garbage_is_a_decode_error_naming_the_file() {
        let input = InputFile::new("notes.pdf", "application/pdf", b"%PDF-oops".to_vec());
        match PdfDocument::load(&input) {
            Err(WandlerError::Decode { name, .. }) => assert_eq!(name, "notes.pdf"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("garbage parsed as a PDF"),
        }
    }

    #[test]
    fn serialised_output_reloads() {
        let doc = PdfDocument::load(&fixture::sample_input("two.pdf", 2)).unwrap();
        let bytes = doc.into_bytes().unwrap();
        assert_eq!(fixture::markers(&bytes), vec![1, 2]);
    }
}
