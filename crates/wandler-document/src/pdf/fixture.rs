// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test fixtures — small PDFs built with `lopdf` so the editor tests need no
// files on disk. Every page carries a `/Marker` integer equal to its original
// page number, which survives copying and identifies the page afterwards.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use wandler_core::InputFile;

/// Page tree settings for a generated document.
#[derive(Debug, Clone, Default)]
pub(crate) struct FixtureSpec {
    pub pages: u32,
    /// `/Rotate` placed on the `/Pages` node so every page inherits it.
    pub inherited_rotate: Option<i64>,
    /// Entries for the `/Info` dictionary.
    pub info: Option<Dictionary>,
}

pub(crate) fn sample_pdf(pages: u32) -> Vec<u8> {
    build(&FixtureSpec {
        pages,
        ..FixtureSpec::default()
    })
}

pub(crate) fn sample_input(name: &str, pages: u32) -> InputFile {
    InputFile::new(name, "application/pdf", sample_pdf(pages))
}

pub(crate) fn build(spec: &FixtureSpec) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for number in 1..=spec.pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Page {number}"))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().expect("fixture content encodes"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Marker" => number as i64,
        });
        kids.push(Object::Reference(page_id));
    }

    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => spec.pages as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    if let Some(rotate) = spec.inherited_rotate {
        pages.set("Rotate", rotate);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if let Some(info) = &spec.info {
        let info_id = doc.add_object(info.clone());
        doc.trailer.set("Info", info_id);
    }

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("fixture saves");
    out
}

/// `/Marker` of every page, in page order.
pub(crate) fn markers(data: &[u8]) -> Vec<i64> {
    page_values(data, b"Marker")
}

/// `/Rotate` set directly on every page, in page order (0 when absent).
pub(crate) fn rotations(data: &[u8]) -> Vec<i64> {
    page_values(data, b"Rotate")
}

fn page_values(data: &[u8], key: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(data).expect("output is a valid PDF");
    doc.get_pages()
        .into_values()
        .map(|id| {
            doc.get_dictionary(id)
                .ok()
                .and_then(|page| page.get(key).ok())
                .and_then(|value| value.as_i64().ok())
                .unwrap_or(0)
        })
        .collect()
}
