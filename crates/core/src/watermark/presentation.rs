//! Presentation watermarking.
//!
//! The input deck is not read: a new single-slide pptx is generated that
//! carries the watermark and a fixed caption. Overlaying onto the original
//! slides is an open product question, so the content loss is deliberate
//! for now.

use std::io::{Cursor, Write};

use chrono::{SecondsFormat, Utc};
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::WatermarkError;
use super::options::WatermarkOptions;

/// Caption drawn over the watermark.
pub const PRESENTATION_CAPTION: &str = "Watermarked presentation";

const AUTHOR: &str = "Vitrine";

/// 16:9 slide, 10in x 5.625in in EMU.
const SLIDE_WIDTH: i64 = 9_144_000;
const SLIDE_HEIGHT: i64 = 5_143_500;

const CAPTION_FONT_SIZE: u32 = 24;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_EXTENDED_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Produce a watermarked presentation.
///
/// The returned package is a fresh deck; `_presentation` is accepted so the
/// signature matches the PDF path, but its slides are not carried over.
///
/// # Errors
///
/// Returns an error if the options are invalid or the package cannot be
/// written.
pub fn add_watermark_to_presentation(
    _presentation: &[u8],
    options: &WatermarkOptions,
) -> Result<Vec<u8>, WatermarkError> {
    options.validate()?;

    let parts = [
        ("[Content_Types].xml", content_types()),
        ("_rels/.rels", root_rels()),
        ("docProps/core.xml", core_properties(&options.text)),
        ("docProps/app.xml", app_properties()),
        ("ppt/presentation.xml", presentation()),
        ("ppt/_rels/presentation.xml.rels", presentation_rels()),
        ("ppt/slideMasters/slideMaster1.xml", slide_master()),
        ("ppt/slideMasters/_rels/slideMaster1.xml.rels", slide_master_rels()),
        ("ppt/slideLayouts/slideLayout1.xml", slide_layout()),
        ("ppt/slideLayouts/_rels/slideLayout1.xml.rels", slide_layout_rels()),
        ("ppt/slides/slide1.xml", slide(options)),
        ("ppt/slides/_rels/slide1.xml.rels", slide_rels()),
        ("ppt/theme/theme1.xml", theme()),
    ];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in parts {
        writer.start_file(name, part_options())?;
        writer.write_all(body.as_bytes())?;
    }
    Ok(writer.finish()?.into_inner())
}

fn part_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn relationships(entries: &[(&str, &str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, kind, target)| {
            format!(r#"<Relationship Id="{id}" Type="{kind}" Target="{target}"/>"#)
        })
        .collect();
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{body}</Relationships>"#
    )
}

fn content_types() -> String {
    const OVERRIDES: [(&str, &str); 7] = [
        ("/ppt/presentation.xml", "presentationml.presentation.main+xml"),
        ("/ppt/slideMasters/slideMaster1.xml", "presentationml.slideMaster+xml"),
        ("/ppt/slideLayouts/slideLayout1.xml", "presentationml.slideLayout+xml"),
        ("/ppt/slides/slide1.xml", "presentationml.slide+xml"),
        ("/ppt/theme/theme1.xml", "theme+xml"),
        ("/docProps/app.xml", "extended-properties+xml"),
        ("/docProps/core.xml", ""),
    ];

    let overrides: String = OVERRIDES
        .iter()
        .map(|(part, kind)| {
            let content_type = if kind.is_empty() {
                "application/vnd.openxmlformats-package.core-properties+xml".to_string()
            } else {
                format!("application/vnd.openxmlformats-officedocument.{kind}")
            };
            format!(r#"<Override PartName="{part}" ContentType="{content_type}"/>"#)
        })
        .collect();

    format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{overrides}</Types>"#
    )
}

fn root_rels() -> String {
    relationships(&[
        ("rId1", REL_OFFICE_DOCUMENT, "ppt/presentation.xml"),
        ("rId2", REL_CORE_PROPERTIES, "docProps/core.xml"),
        ("rId3", REL_EXTENDED_PROPERTIES, "docProps/app.xml"),
    ])
}

fn core_properties(text: &str) -> String {
    let title = escape(format!("Watermarked document - {text}"));
    let subject = escape(format!("Watermarked presentation - {text}"));
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        r#"{XML_DECL}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{title}</dc:title><dc:subject>{subject}</dc:subject><dc:creator>{AUTHOR}</dc:creator><cp:lastModifiedBy>{AUTHOR}</cp:lastModifiedBy><cp:revision>1</cp:revision><dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified></cp:coreProperties>"#
    )
}

fn app_properties() -> String {
    format!(
        r#"{XML_DECL}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>{AUTHOR}</Application><Slides>1</Slides><Company>{AUTHOR}</Company></Properties>"#
    )
}

fn presentation() -> String {
    format!(
        r#"{XML_DECL}<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst><p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    )
}

fn presentation_rels() -> String {
    relationships(&[
        ("rId1", REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
        ("rId2", REL_SLIDE, "slides/slide1.xml"),
        ("rId3", REL_THEME, "theme/theme1.xml"),
    ])
}

/// Group shape header every shape tree starts with.
const SP_TREE_HEADER: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

fn slide_master() -> String {
    format!(
        r#"{XML_DECL}<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree>{SP_TREE_HEADER}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#
    )
}

fn slide_master_rels() -> String {
    relationships(&[
        ("rId1", REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
        ("rId2", REL_THEME, "../theme/theme1.xml"),
    ])
}

fn slide_layout() -> String {
    format!(
        r#"{XML_DECL}<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{SP_TREE_HEADER}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
}

fn slide_layout_rels() -> String {
    relationships(&[(
        "rId1",
        REL_SLIDE_MASTER,
        "../slideMasters/slideMaster1.xml",
    )])
}

fn slide_rels() -> String {
    relationships(&[(
        "rId1",
        REL_SLIDE_LAYOUT,
        "../slideLayouts/slideLayout1.xml",
    )])
}

/// A centered text box.
struct TextBox<'a> {
    id: u32,
    name: &'a str,
    text: &'a str,
    /// Offset and extent in EMU.
    frame: (i64, i64, i64, i64),
    /// Rotation in 60000ths of a degree, clockwise.
    rotation: i64,
    /// Font size in hundredths of a point.
    size: u32,
    color: String,
    /// Alpha in thousandths of a percent; `None` for opaque.
    alpha: Option<u32>,
}

impl TextBox<'_> {
    fn to_xml(&self) -> String {
        let (x, y, cx, cy) = self.frame;
        let text = escape(self.text);
        let alpha = self
            .alpha
            .map(|val| format!(r#"<a:alpha val="{val}"/>"#))
            .unwrap_or_default();
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm rot="{rot}"><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="none" anchor="ctr"/><a:lstStyle/><a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="{size}" dirty="0"><a:solidFill><a:srgbClr val="{color}">{alpha}</a:srgbClr></a:solidFill><a:latin typeface="Arial"/></a:rPr><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            id = self.id,
            name = self.name,
            rot = self.rotation,
            size = self.size,
            color = self.color,
        )
    }
}

/// DrawingML angle: clockwise 60000ths of a degree in `0..21600000`.
#[allow(clippy::cast_possible_truncation)]
fn drawing_angle(degrees: f32) -> i64 {
    (f64::from(degrees).rem_euclid(360.0) * 60_000.0).round() as i64 % 21_600_000
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn slide(options: &WatermarkOptions) -> String {
    let watermark = TextBox {
        id: 2,
        name: "Watermark",
        text: &options.text,
        frame: (0, 0, SLIDE_WIDTH, SLIDE_HEIGHT),
        rotation: drawing_angle(options.angle),
        size: (options.font_size * 100.0).round() as u32,
        color: options.color.to_hex(),
        alpha: Some((options.opacity * 100_000.0).round() as u32),
    };
    let caption = TextBox {
        id: 3,
        name: "Caption",
        text: PRESENTATION_CAPTION,
        frame: (
            SLIDE_WIDTH / 10,
            SLIDE_HEIGHT * 2 / 5,
            SLIDE_WIDTH * 4 / 5,
            SLIDE_HEIGHT / 5,
        ),
        rotation: 0,
        size: CAPTION_FONT_SIZE * 100,
        color: "000000".to_string(),
        alpha: None,
    };

    format!(
        r#"{XML_DECL}<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree>{SP_TREE_HEADER}{}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        watermark.to_xml(),
        caption.to_xml(),
    )
}

fn theme() -> String {
    const COLORS: [(&str, &str); 12] = [
        ("dk1", r#"<a:sysClr val="windowText" lastClr="000000"/>"#),
        ("lt1", r#"<a:sysClr val="window" lastClr="FFFFFF"/>"#),
        ("dk2", r#"<a:srgbClr val="44546A"/>"#),
        ("lt2", r#"<a:srgbClr val="E7E6E6"/>"#),
        ("accent1", r#"<a:srgbClr val="4472C4"/>"#),
        ("accent2", r#"<a:srgbClr val="ED7D31"/>"#),
        ("accent3", r#"<a:srgbClr val="A5A5A5"/>"#),
        ("accent4", r#"<a:srgbClr val="FFC000"/>"#),
        ("accent5", r#"<a:srgbClr val="5B9BD5"/>"#),
        ("accent6", r#"<a:srgbClr val="70AD47"/>"#),
        ("hlink", r#"<a:srgbClr val="0563C1"/>"#),
        ("folHlink", r#"<a:srgbClr val="954F72"/>"#),
    ];
    let colors: String = COLORS
        .iter()
        .map(|(name, value)| format!("<a:{name}>{value}</a:{name}>"))
        .collect();

    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let fills = fill.repeat(3);
    let line = r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#;
    let lines = line.repeat(3);
    let effects = "<a:effectStyle><a:effectLst/></a:effectStyle>".repeat(3);
    let fonts = r#"<a:latin typeface="Arial"/><a:ea typeface=""/><a:cs typeface=""/>"#;

    format!(
        r#"{XML_DECL}<a:theme xmlns:a="{NS_A}" name="Vitrine"><a:themeElements><a:clrScheme name="Vitrine">{colors}</a:clrScheme><a:fontScheme name="Vitrine"><a:majorFont>{fonts}</a:majorFont><a:minorFont>{fonts}</a:minorFont></a:fontScheme><a:fmtScheme name="Vitrine"><a:fillStyleLst>{fills}</a:fillStyleLst><a:lnStyleLst>{lines}</a:lnStyleLst><a:effectStyleLst>{effects}</a:effectStyleLst><a:bgFillStyleLst>{fills}</a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filetype::{FileKind, sniff};
    use std::io::Read;
    use zip::ZipArchive;

    fn read_part(package: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut body = String::new();
        part.read_to_string(&mut body).unwrap();
        body
    }

    #[test]
    fn test_output_is_pptx_package() {
        let output =
            add_watermark_to_presentation(b"PK\x03\x04", &WatermarkOptions::default()).unwrap();
        assert_eq!(sniff(&output), FileKind::Pptx);

        let archive = ZipArchive::new(Cursor::new(output.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for required in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slides/slide1.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/theme/theme1.xml",
            "docProps/core.xml",
        ] {
            assert!(names.contains(&required), "missing {required}");
        }
    }

    #[test]
    fn test_slide_contains_watermark_and_caption() {
        let options = WatermarkOptions::with_text("123").opacity(0.5).font_size(16.0);
        let output = add_watermark_to_presentation(b"", &options).unwrap();
        let slide = read_part(&output, "ppt/slides/slide1.xml");

        assert!(slide.contains("<a:t>123</a:t>"));
        assert!(slide.contains(&format!("<a:t>{PRESENTATION_CAPTION}</a:t>")));
        assert!(slide.contains(r#"sz="1600""#));
        assert!(slide.contains(r#"<a:alpha val="50000"/>"#));
        assert!(slide.contains(r#"rot="18900000""#));
    }

    #[test]
    fn test_text_is_xml_escaped() {
        let options = WatermarkOptions::with_text("<A & B>");
        let output = add_watermark_to_presentation(b"", &options).unwrap();
        let slide = read_part(&output, "ppt/slides/slide1.xml");
        assert!(slide.contains("<a:t>&lt;A &amp; B&gt;</a:t>"));

        let core = read_part(&output, "docProps/core.xml");
        assert!(core.contains("Watermarked document - &lt;A &amp; B&gt;"));
    }

    #[test]
    fn test_original_slides_are_not_carried_over() {
        let options = WatermarkOptions::default();
        let from_empty = add_watermark_to_presentation(b"", &options).unwrap();
        let from_other = add_watermark_to_presentation(b"PK\x03\x04other deck", &options).unwrap();
        assert_eq!(
            read_part(&from_empty, "ppt/slides/slide1.xml"),
            read_part(&from_other, "ppt/slides/slide1.xml")
        );
    }

    #[test]
    fn test_drawing_angle() {
        assert_eq!(drawing_angle(0.0), 0);
        assert_eq!(drawing_angle(-45.0), 18_900_000);
        assert_eq!(drawing_angle(90.0), 5_400_000);
        assert_eq!(drawing_angle(360.0), 0);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let result = add_watermark_to_presentation(b"", &WatermarkOptions::with_text(""));
        assert!(matches!(result, Err(WatermarkError::InvalidOptions(_))));
    }
}
