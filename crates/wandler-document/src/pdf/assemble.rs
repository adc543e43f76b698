// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page assembler — builds a new PDF by copying pages, in order, out of one or
// more loaded documents.
//
// A copied page takes its inherited attributes with it and drags along every
// object it references. Shared objects (fonts, images) are copied once per
// source batch, and `/Parent` links are never followed so a page never pulls
// in the rest of its source page tree.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, warn};
use wandler_core::error::{Result, ValidationKind, WandlerError};

use super::document::{INHERITABLE_KEYS, PdfDocument, inherited};

/// Accumulates pages for a new output document.
pub struct PageAssembler {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PageAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PageAssembler {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append `pages` (1-based, any order, repeats allowed) from `source`.
    ///
    /// Every number is validated before anything is copied, so a bad index
    /// leaves the assembler untouched.
    pub fn append_pages(&mut self, source: &PdfDocument, pages: &[u32]) -> Result<()> {
        let ids = pages
            .iter()
            .map(|&page| source.page_id(page))
            .collect::<Result<Vec<_>>>()?;

        let mut copied = HashMap::new();
        for page_id in ids {
            self.append_page(source.document(), page_id, &mut copied)?;
        }

        debug!(
            source = source.name(),
            appended = pages.len(),
            total = self.kids.len(),
            "Pages appended"
        );
        Ok(())
    }

    /// Append every page of `source` in order.
    pub fn append_all(&mut self, source: &PdfDocument) -> Result<()> {
        let pages: Vec<u32> = (1..=source.page_count()).collect();
        self.append_pages(source, &pages)
    }

    /// Write the page tree and serialise the document.
    pub fn finish(self) -> Result<Vec<u8>> {
        let Self {
            mut document,
            pages_id,
            kids,
        } = self;

        if kids.is_empty() {
            return Err(WandlerError::invalid(
                ValidationKind::Pages,
                "no pages selected for the output document",
            ));
        }

        let count = kids.len() as i64;
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let mut output = Vec::new();
        document
            .save_to(&mut output)
            .map_err(|err| WandlerError::Pdf(format!("failed to serialise assembled PDF: {err}")))?;
        Ok(output)
    }

    // -- Copying --------------------------------------------------------------

    fn append_page(
        &mut self,
        source: &Document,
        page_id: ObjectId,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> Result<()> {
        let mut page = source
            .get_dictionary(page_id)
            .map_err(|err| WandlerError::Pdf(format!("cannot read page object {page_id:?}: {err}")))?
            .clone();

        for key in INHERITABLE_KEYS {
            if !page.has(key) {
                if let Some(value) = inherited(source, page_id, key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }

        // Back-references to the page (annotation /P) land on this copy.
        let new_id = self.document.new_object_id();
        copied.insert(page_id, new_id);

        let mut page = self.copy_dictionary(source, &page, copied);
        page.set("Parent", Object::Reference(self.pages_id));
        self.document.objects.insert(new_id, Object::Dictionary(page));
        self.kids.push(Object::Reference(new_id));
        Ok(())
    }

    fn copy_object(
        &mut self,
        source: &Document,
        object: &Object,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> Object {
        match object {
            Object::Reference(id) => Object::Reference(self.copy_reference(source, *id, copied)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_object(source, item, copied))
                    .collect(),
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(source, dict, copied)),
            Object::Stream(stream) => Object::Stream(self.copy_stream(source, stream, copied)),
            other => other.clone(),
        }
    }

    fn copy_dictionary(
        &mut self,
        source: &Document,
        dict: &Dictionary,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> Dictionary {
        let mut out = Dictionary::new();
        for (key, value) in dict.iter() {
            if key == b"Parent" {
                continue;
            }
            out.set(key.clone(), self.copy_object(source, value, copied));
        }
        out
    }

    fn copy_stream(
        &mut self,
        source: &Document,
        stream: &Stream,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> Stream {
        let mut out = stream.clone();
        out.dict = self.copy_dictionary(source, &stream.dict, copied);
        out
    }

    /// Copy a referenced object once; later references reuse the copy.
    fn copy_reference(
        &mut self,
        source: &Document,
        id: ObjectId,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> ObjectId {
        if let Some(&existing) = copied.get(&id) {
            return existing;
        }

        // Reserve the id first so cycles terminate.
        let new_id = self.document.new_object_id();
        copied.insert(id, new_id);

        let object = match source.get_object(id) {
            Ok(object) => self.copy_object(source, object, copied),
            Err(err) => {
                warn!(?id, %err, "Unresolvable reference replaced with null");
                Object::Null
            }
        };
        self.document.objects.insert(new_id, object);
        new_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixture::{self, FixtureSpec};
    use wandler_core::InputFile;

    fn load(pages: u32) -> PdfDocument {
        PdfDocument::load(&fixture::sample_input("src.pdf", pages)).unwrap()
    }

    #[test]
    fn pages_keep_the_requested_order() {
        let source = load(4);
        let mut assembler = PageAssembler::new();
        assembler.append_pages(&source, &[3, 1, 3]).unwrap();
        assert_eq!(assembler.page_count(), 3);

        let bytes = assembler.finish().unwrap();
        assert_eq!(fixture::markers(&bytes), vec![3, 1, 3]);
    }

    #[test]
    fn bad_index_copies_nothing() {
        let source = load(2);
        let mut assembler = PageAssembler::new();
        assert!(matches!(
            assembler.append_pages(&source, &[1, 5]),
            Err(WandlerError::PageIndex { page: 5, total: 2 })
        ));
        assert_eq!(assembler.page_count(), 0);
    }

    #[test]
    fn empty_output_is_rejected() {
        assert!(matches!(
            PageAssembler::new().finish(),
            Err(WandlerError::InputValidation { .. })
        ));
    }

    #[test]
    fn inherited_attributes_are_materialised() {
        let data = fixture::build(&FixtureSpec {
            pages: 2,
            inherited_rotate: Some(180),
            ..FixtureSpec::default()
        });
        let source = PdfDocument::load(&InputFile::new("r.pdf", "application/pdf", data)).unwrap();
        let mut assembler = PageAssembler::new();
        assembler.append_pages(&source, &[2]).unwrap();
        let bytes = assembler.finish().unwrap();

        assert_eq!(fixture::rotations(&bytes), vec![180]);
        let copy = PdfDocument::load(&InputFile::new("c.pdf", "application/pdf", bytes)).unwrap();
        assert_eq!(copy.page_size(1).unwrap(), (595.0, 842.0));
        let page = copy.document().get_dictionary(copy.page_id(1).unwrap()).unwrap();
        assert!(page.has(b"Resources"));
    }

    #[test]
    fn shared_resources_are_copied_once_per_source() {
        let source = load(3);
        let mut assembler = PageAssembler::new();
        assembler.append_all(&source).unwrap();
        let bytes = assembler.finish().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let fonts = doc
            .objects
            .values()
            .filter(|object| {
                object
                    .as_dict()
                    .ok()
                    .and_then(|dict| dict.get(b"Type").ok())
                    .and_then(|kind| kind.as_name().ok())
                    == Some(b"Font".as_slice())
            })
            .count();
        assert_eq!(fonts, 1);
    }
}
