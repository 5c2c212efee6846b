//! PDF watermarking.
//!
//! Every page gets the watermark text centered on its MediaBox, drawn in
//! Helvetica through a translucent graphics state. The original page
//! content is wrapped in `q`/`Q` so any state it leaves behind cannot move
//! or recolor the overlay.

use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use super::error::WatermarkError;
use super::metrics::helvetica_text_width;
use super::options::WatermarkOptions;

/// Resource name of the watermark font.
pub(crate) const FONT_RESOURCE: &[u8] = b"VtrWmFont";

/// Resource name of the watermark graphics state.
const GSTATE_RESOURCE: &[u8] = b"VtrWmGs";

/// US Letter, used when a page tree carries no MediaBox at all.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Parent chains longer than this are treated as cycles.
const MAX_TREE_DEPTH: usize = 64;

const PRODUCER: &str = "Vitrine Watermark System";
const CREATOR: &str = "Vitrine";

/// Stamp the watermark on every page of a PDF.
///
/// # Errors
///
/// Returns an error if the options are invalid, the document cannot be
/// parsed or has no pages, or the modified document cannot be saved.
pub fn add_watermark_to_pdf(
    pdf: &[u8],
    options: &WatermarkOptions,
) -> Result<Vec<u8>, WatermarkError> {
    options.validate()?;

    let mut doc = Document::load_mem(pdf)?;
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    if pages.is_empty() {
        return Err(WatermarkError::malformed("document has no pages"));
    }

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let gstate_id = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => options.opacity,
        "CA" => options.opacity,
    });

    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let text = encode_win_ansi(&options.text);
    let text_width = helvetica_text_width(&options.text, options.font_size);

    for page_id in pages {
        let [x0, y0, x1, y1] = page_media_box(&doc, page_id);
        let width = (x1 - x0).abs();
        let height = (y1 - y0).abs();
        let x = x0.min(x1) + (width - text_width) / 2.0;
        let y = y0.min(y1) + (height - options.font_size) / 2.0;

        register_resources(&mut doc, page_id, font_id, gstate_id)?;

        let overlay = overlay_content(&text, options, x, y).encode()?;
        let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));
        wrap_page_contents(&mut doc, page_id, save_id, overlay_id)?;
    }

    stamp_info(&mut doc, &options.text)?;

    let mut out = Vec::with_capacity(pdf.len() + 1024);
    doc.save_to(&mut out)?;
    Ok(out)
}

/// Content stream drawing the watermark with its lower-left corner at `(x, y)`.
fn overlay_content(text: &[u8], options: &WatermarkOptions, x: f32, y: f32) -> Content {
    let color = options.color;
    Content {
        operations: vec![
            // closes the q opened before the original content
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new("gs", vec![Object::Name(GSTATE_RESOURCE.to_vec())]),
            Operation::new("rg", vec![color.r.into(), color.g.into(), color.b.into()]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(FONT_RESOURCE.to_vec()), options.font_size.into()],
            ),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text.to_vec())]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    }
}

/// Encode text for a WinAnsi simple font; unmappable characters become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => u8::try_from(code).unwrap_or(b'?'),
            _ => b'?',
        })
        .collect()
}

/// Follow a reference to the object it names.
fn resolve(doc: &Document, object: &Object) -> Option<Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok().cloned(),
        other => Some(other.clone()),
    }
}

/// Look up a page attribute, walking up the page tree for inherited values.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_object(parent).ok()?.as_dict().ok()?;
    }
    None
}

fn page_media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let Some(Object::Array(items)) = inherited_attribute(doc, page_id, b"MediaBox") else {
        return DEFAULT_MEDIA_BOX;
    };

    let coords: Vec<f32> = items
        .iter()
        .filter_map(|item| resolve(doc, item))
        .filter_map(|item| item.as_float().ok())
        .collect();

    match coords.as_slice() {
        [x0, y0, x1, y1] => [*x0, *y0, *x1, *y1],
        _ => DEFAULT_MEDIA_BOX,
    }
}

/// Add the watermark font and graphics state to a page's resources.
///
/// Pages without their own `/Resources` get a copy of the inherited
/// dictionary so the original content keeps resolving its names.
fn register_resources(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    gstate_id: ObjectId,
) -> Result<(), WatermarkError> {
    let own = doc.get_object(page_id)?.as_dict()?.get(b"Resources").ok().cloned();

    let (shared_id, mut resources) = match own {
        Some(Object::Reference(id)) => {
            let dict = doc.get_object(id)?.as_dict()?.clone();
            (Some(id), dict)
        }
        Some(Object::Dictionary(dict)) => (None, dict),
        _ => {
            let inherited = match inherited_attribute(doc, page_id, b"Resources") {
                Some(Object::Dictionary(dict)) => dict,
                _ => Dictionary::new(),
            };
            (None, inherited)
        }
    };

    add_named_resource(doc, &mut resources, b"Font", FONT_RESOURCE, font_id);
    add_named_resource(doc, &mut resources, b"ExtGState", GSTATE_RESOURCE, gstate_id);

    match shared_id {
        Some(id) => {
            doc.objects.insert(id, Object::Dictionary(resources));
        }
        None => {
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Resources", Object::Dictionary(resources));
        }
    }
    Ok(())
}

fn add_named_resource(
    doc: &Document,
    resources: &mut Dictionary,
    category: &[u8],
    name: &[u8],
    id: ObjectId,
) {
    let mut entries = match resources.get(category).ok().and_then(|o| resolve(doc, o)) {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };
    entries.set(name.to_vec(), Object::Reference(id));
    resources.set(category.to_vec(), Object::Dictionary(entries));
}

/// Replace a page's contents with `[save, original..., overlay]`.
fn wrap_page_contents(
    doc: &mut Document,
    page_id: ObjectId,
    save_id: ObjectId,
    overlay_id: ObjectId,
) -> Result<(), WatermarkError> {
    let original: Vec<Object> = match doc.get_object(page_id)?.as_dict()?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut contents = Vec::with_capacity(original.len() + 2);
    contents.push(Object::Reference(save_id));
    contents.extend(original);
    contents.push(Object::Reference(overlay_id));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Encode a PDF text string: plain literal for ASCII, UTF-16BE otherwise.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value.as_bytes().to_vec());
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Record the watermark in the document information dictionary.
fn stamp_info(doc: &mut Document, text: &str) -> Result<(), WatermarkError> {
    let existing = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .ok()
        .filter(|id| doc.get_object(*id).and_then(Object::as_dict).is_ok());

    let info_id = match existing {
        Some(id) => id,
        None => {
            let id = doc.add_object(Dictionary::new());
            doc.trailer.set("Info", Object::Reference(id));
            id
        }
    };

    let modified = Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
    let info = doc.get_object_mut(info_id)?.as_dict_mut()?;
    info.set("Title", text_string(&format!("Watermarked document - {text}")));
    info.set("Subject", text_string(&format!("Watermark: {text}")));
    info.set("Keywords", text_string(&format!("{text} watermark")));
    info.set("Producer", text_string(PRODUCER));
    info.set("Creator", text_string(CREATOR));
    info.set("ModDate", text_string(&modified));
    Ok(())
}
