//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::{HashMap, HashSet};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use crate::error::{Error, Result};
use crate::layout_config::*;

const PT_TO_MM: f32 = 25.4 / 72.0;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Render a LayoutConfig into PDF bytes.
///
/// `<img>` elements whose `src` is not a base64 data URI, or whose bytes
/// cannot be decoded, are skipped with a warning. With `strict_images` they
/// fail the render instead.
pub fn render_pdf(config: &LayoutConfig, strict_images: bool) -> Result<Vec<u8>> {
    let page_w = Mm(config.page_width_pt * PT_TO_MM);
    let page_h = Mm(config.page_height_pt * PT_TO_MM);

    let meta = &config.metadata;
    let mut doc = PdfDocument::new(&meta.title);
    doc.metadata.info.author = meta.author.clone();
    doc.metadata.info.subject = meta.subject.clone();
    doc.metadata.info.keywords = meta.keywords.clone();
    doc.metadata.info.creator = meta.creator.clone();

    // ── Pre-register all images ────────────────────────────────────────────
    let mut all_srcs: HashSet<&str> = HashSet::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            collect_image_srcs(lbox, &mut all_srcs);
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for src in all_srcs {
        match load_image(src, &mut img_warnings) {
            Ok((raw, px_width, px_height)) => {
                let xobj_id = doc.add_image(&raw);
                image_resources.insert(
                    src.to_string(),
                    ImageResource {
                        xobj_id,
                        px_width,
                        px_height,
                    },
                );
            }
            Err(e) if strict_images => return Err(Error::Render(format!("image: {e}"))),
            Err(e) => log::warn!("Skipping image: {e}"),
        }
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages: Vec<PdfPage> = config
        .pages
        .iter()
        .map(|page_layout| {
            let mut ops = Vec::new();
            for lbox in &page_layout.boxes {
                render_box(&mut ops, lbox, config.page_height_pt, &image_resources);
            }
            PdfPage::new(page_w, page_h, ops)
        })
        .collect();

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    log::debug!("rendering {} page(s)", pages.len());
    doc.with_pages(pages);
    let mut save_warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut save_warnings);
    Ok(bytes)
}

/// Decode a data-URI image into a printpdf image plus its pixel size.
fn load_image(src: &str, warnings: &mut Vec<PdfWarnMsg>) -> Result<(RawImage, u32, u32), String> {
    let bytes = parse_data_uri(src)?;
    let dyn_img = ::image::load_from_memory(&bytes).map_err(|e| format!("decode error: {e}"))?;
    let raw = RawImage::decode_from_bytes(&bytes, warnings)
        .map_err(|e| format!("PDF encode error: {e}"))?;
    Ok((raw, dyn_img.width(), dyn_img.height()))
}

/// Encode a UTF-8 string as Windows-1252 for the builtin fonts, which use
/// WinAnsiEncoding (one byte per glyph, 0x00–0xFF).
fn to_win_ansi(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99, // trademark
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for the 0x80-0xFF range; printpdf
    // writes these bytes straight into the content stream.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let Some(rest) = src.strip_prefix("data:") else {
        let preview: String = src.chars().take(80).collect();
        return Err(format!(
            "src must be a base64 data URI (e.g. `data:image/png;base64,...`), got {preview:?}"
        ));
    };
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| "invalid data URI: missing `,` separator".to_string())?;
    if !header.contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(data.trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

/// Recursively collect all unique `image.src` strings from a [`LayoutBox`] tree.
fn collect_image_srcs<'a>(lbox: &'a LayoutBox, srcs: &mut HashSet<&'a str>) {
    if let Some(img) = &lbox.image {
        srcs.insert(img.src.as_str());
    }
    for child in &lbox.children {
        collect_image_srcs(child, srcs);
    }
}

fn rgb(c: &[f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn line_points(points: &[(f32, f32)]) -> Vec<LinePoint> {
    points
        .iter()
        .map(|&(x, y)| LinePoint {
            p: Point { x: Pt(x), y: Pt(y) },
            bezier: false,
        })
        .collect()
}

/// Corners of a rectangle in PDF space, counter-clockwise from bottom-left.
fn rect_points(x1: f32, y1: f32, x2: f32, y2: f32) -> Vec<LinePoint> {
    line_points(&[(x1, y1), (x2, y1), (x2, y2), (x1, y2)])
}

fn write_text(ops: &mut Vec<Op>, text: &str, x: f32, y: f32, font: BuiltinFont, size: f32, color: &[f32; 4]) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetFontSizeBuiltinFont { size: Pt(size), font });
    ops.push(Op::SetFillColor { col: rgb(color) });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(to_win_ansi(text))],
        font,
    });
    ops.push(Op::EndTextSection);
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    images: &HashMap<String, ImageResource>,
) {
    // PDF origin is bottom-left; layout origin is top-left.
    let top = page_height - lbox.y;
    let bottom = top - lbox.height;
    let right = lbox.x + lbox.width;

    if let Some(bg) = &lbox.background_color {
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: rect_points(lbox.x, bottom, right, top),
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor { col: rgb(&border.color) });
        ops.push(Op::SetOutlineThickness { pt: Pt(border.width) });
        ops.push(Op::DrawLine {
            line: Line {
                points: rect_points(lbox.x, bottom, right, top),
                is_closed: true,
            },
        });
    }

    if let Some(text) = &lbox.text {
        let font = text.face.builtin();
        let ascender = text.face.ascender(text.font_size);

        for tline in text.lines.iter().filter(|l| !l.text.is_empty()) {
            let text_x = lbox.x + tline.x_offset;
            let text_y = top - tline.y_offset - ascender;
            write_text(ops, &tline.text, text_x, text_y, font, text.font_size, &text.color);

            if text.underline {
                let underline_y = text_y - text.font_size * 0.1;
                let line_width = text.face.text_width(&tline.text, text.font_size);
                ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
                ops.push(Op::SetOutlineColor { col: rgb(&text.color) });
                ops.push(Op::DrawLine {
                    line: Line {
                        points: line_points(&[(text_x, underline_y), (text_x + line_width, underline_y)]),
                        is_closed: false,
                    },
                });
            }
        }

        if let Some(marker) = &text.list_marker {
            write_text(ops, marker, lbox.x - 16.0, top - ascender, font, text.font_size, &text.color);
        }
    }

    if let Some(img) = &lbox.image {
        if let Some(res) = images.get(&img.src) {
            // At dpi=72 printpdf renders 1 px = 1 pt.
            let scale = |want: f32, px: u32| if px > 0 { want / px as f32 } else { 1.0 };
            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(top - img.height)),
                    dpi: Some(72.0),
                    scale_x: Some(scale(img.width, res.px_width)),
                    scale_y: Some(scale(img.height, res.px_height)),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, page_height, images);
    }
}
