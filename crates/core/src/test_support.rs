//! Fixtures shared by unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::watermark::pdf::FONT_RESOURCE;

/// Build an A4 PDF with `pages` pages, each saying "Hello World!".
///
/// Resources and MediaBox live on the page tree root so pages inherit them.
pub(crate) fn sample_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::with_capacity(pages);
    for _ in 0..pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 48.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal("Hello World!")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(pages).unwrap();
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Number of pages in a serialized PDF.
pub(crate) fn page_count(pdf: &[u8]) -> usize {
    Document::load_mem(pdf).unwrap().get_pages().len()
}

/// Decoded content of every page, in page order.
fn page_contents(pdf: &[u8]) -> Vec<Content> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| Content::decode(&doc.get_page_content(*page_id).unwrap()).unwrap())
        .collect()
}

/// Operations issued while the watermark font is selected.
fn overlay_operations(content: &Content) -> Vec<&Operation> {
    let mut selected = false;
    let mut ops = Vec::new();
    for op in &content.operations {
        match op.operator.as_str() {
            "Tf" => {
                selected = matches!(
                    op.operands.first(),
                    Some(Object::Name(name)) if name.as_slice() == FONT_RESOURCE
                );
            }
            "ET" => selected = false,
            _ if selected => ops.push(op),
            _ => {}
        }
    }
    ops
}

/// Watermark strings drawn on each page, in page order.
pub(crate) fn stamped_texts(pdf: &[u8]) -> Vec<String> {
    page_contents(pdf)
        .iter()
        .flat_map(|content| {
            overlay_operations(content)
                .into_iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(bytes, _)) => String::from_utf8(bytes.clone()).ok(),
                    _ => None,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// `Td` offsets of the watermark on each page, in page order.
pub(crate) fn overlay_positions(pdf: &[u8]) -> Vec<(f32, f32)> {
    page_contents(pdf)
        .iter()
        .flat_map(|content| {
            overlay_operations(content)
                .into_iter()
                .filter(|op| op.operator == "Td")
                .filter_map(|op| match op.operands.as_slice() {
                    [x, y] => Some((x.as_float().ok()?, y.as_float().ok()?)),
                    _ => None,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
