//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::{BTreeMap, BTreeSet};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

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
/// Images whose `src` is not a base64 data URI, or whose bytes cannot be
/// decoded, are skipped with a `log::warn`.
pub fn render_pdf(config: &LayoutConfig) -> Result<Vec<u8>, String> {
    let page_w = Mm(config.page_width_pt * PT_TO_MM);
    let page_h = Mm(config.page_height_pt * PT_TO_MM);

    let mut doc = PdfDocument::new(&config.title);

    // ── Pre-register all images ────────────────────────────────────────────
    // Labels repeat the same barcode across duplicates; each src is embedded once.
    let mut all_srcs: BTreeSet<&str> = BTreeSet::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            collect_image_srcs(lbox, &mut all_srcs);
        }
    }

    let mut image_resources: BTreeMap<String, ImageResource> = BTreeMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for src in &all_srcs {
        let bytes = match parse_data_uri(src) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Skipping image: {e}");
                continue;
            }
        };

        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Skipping image: decode error: {e}");
                continue;
            }
        };
        let (px_width, px_height) = (dyn_img.width(), dyn_img.height());

        let raw = match RawImage::decode_from_bytes(&bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping image: PDF encode error: {e}");
                continue;
            }
        };
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

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages = Vec::new();

    for page_layout in &config.pages {
        let mut ops = Vec::new();
        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, config.page_height_pt, &image_resources);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    log::debug!(
        "Rendering {} page(s), {} embedded image(s)",
        pages.len(),
        image_resources.len()
    );

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());

    Ok(bytes)
}

/// Builtin fonts draw single-byte WinAnsi text. Accented Latin letters fold
/// to their base letter and anything else outside ASCII becomes `?`.
fn to_builtin_text(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{00A0}' => ' ',
            'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
            'Á' | 'À' | 'Â' | 'Ä' | 'Ã' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ñ' => 'n',
            'Ñ' => 'N',
            'ç' => 'c',
            'Ç' => 'C',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let Some(rest) = src.strip_prefix("data:") else {
        let preview: String = src.chars().take(80).collect();
        return Err(format!(
            "image src must be a base64 data URI (e.g. `data:image/png;base64,...`), got {preview:?}"
        ));
    };
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| "invalid data URI: missing `,` after the header".to_string())?;
    if !header.contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(data.trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

/// Recursively collect all unique `image.src` strings from a [`LayoutBox`] tree.
fn collect_image_srcs<'a>(lbox: &'a LayoutBox, srcs: &mut BTreeSet<&'a str>) {
    if let Some(img) = &lbox.image {
        srcs.insert(img.src.as_str());
    }
    for child in &lbox.children {
        collect_image_srcs(child, srcs);
    }
}

fn rgb(c: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn stroke(ops: &mut Vec<Op>, from: (f32, f32), to: (f32, f32), width: f32, color: [f32; 4]) {
    ops.push(Op::SetOutlineColor { col: rgb(color) });
    ops.push(Op::SetOutlineThickness { pt: Pt(width) });
    ops.push(Op::DrawLine {
        line: Line {
            points: vec![point(from.0, from.1), point(to.0, to.1)],
            is_closed: false,
        },
    });
}

/// Draw one border side. `from`/`to` run along the outer edge and `inward`
/// is the unit normal pointing into the box.
fn draw_side(ops: &mut Vec<Op>, from: (f32, f32), to: (f32, f32), inward: (f32, f32), border: &BorderLine) {
    let w = border.width;
    let shift = |p: (f32, f32), d: f32| (p.0 + inward.0 * d, p.1 + inward.1 * d);

    match border.pattern {
        LinePattern::Solid => stroke(ops, shift(from, w / 2.0), shift(to, w / 2.0), w, border.color),
        LinePattern::Double => {
            let t = w / 3.0;
            for d in [t / 2.0, w - t / 2.0] {
                stroke(ops, shift(from, d), shift(to, d), t, border.color);
            }
        }
        LinePattern::Dashed | LinePattern::Dotted => {
            let (dash, gap) = if border.pattern == LinePattern::Dashed {
                let d = (3.0 * w).max(2.0);
                (d, d)
            } else {
                (w, w)
            };
            let (dx, dy) = (to.0 - from.0, to.1 - from.1);
            let len = (dx * dx + dy * dy).sqrt();
            if len <= 0.0 || dash <= 0.0 {
                return;
            }
            let dir = (dx / len, dy / len);
            let mut pos = 0.0;
            while pos < len {
                let end = (pos + dash).min(len);
                let a = (from.0 + dir.0 * pos, from.1 + dir.1 * pos);
                let b = (from.0 + dir.0 * end, from.1 + dir.1 * end);
                stroke(ops, shift(a, w / 2.0), shift(b, w / 2.0), w, border.color);
                pos += dash + gap;
            }
        }
    }
}

fn builtin_font(text: &TextContent) -> BuiltinFont {
    match (text.font_family.as_str(), text.bold, text.italic) {
        ("courier", true, true) => BuiltinFont::CourierBoldOblique,
        ("courier", true, false) => BuiltinFont::CourierBold,
        ("courier", false, true) => BuiltinFont::CourierOblique,
        ("courier", false, false) => BuiltinFont::Courier,
        (_, true, true) => BuiltinFont::HelveticaBoldOblique,
        (_, true, false) => BuiltinFont::HelveticaBold,
        (_, false, true) => BuiltinFont::HelveticaOblique,
        (_, false, false) => BuiltinFont::Helvetica,
    }
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    images: &BTreeMap<String, ImageResource>,
) {
    // PDF origin is bottom-left, layout origin is top-left.
    let top = page_height - lbox.y;
    let bottom = top - lbox.height;
    let (left, right) = (lbox.x, lbox.x + lbox.width);

    if let Some(bg) = lbox.background_color {
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: vec![
                        point(left, bottom),
                        point(right, bottom),
                        point(right, top),
                        point(left, top),
                    ],
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    let b = &lbox.borders;
    if let Some(side) = &b.top {
        draw_side(ops, (left, top), (right, top), (0.0, -1.0), side);
    }
    if let Some(side) = &b.bottom {
        draw_side(ops, (left, bottom), (right, bottom), (0.0, 1.0), side);
    }
    if let Some(side) = &b.left {
        draw_side(ops, (left, top), (left, bottom), (1.0, 0.0), side);
    }
    if let Some(side) = &b.right {
        draw_side(ops, (right, top), (right, bottom), (-1.0, 0.0), side);
    }

    if let Some(text) = &lbox.text {
        let font = builtin_font(text);
        for tline in &text.lines {
            let content = to_builtin_text(&tline.text);
            if content.trim().is_empty() {
                continue;
            }
            let text_x = lbox.x + tline.x_offset;
            let text_y = top - tline.y_offset - text.ascent;

            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(text_x),
                    y: Pt(text_y),
                },
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(text.font_size),
                font,
            });
            ops.push(Op::SetLineHeight {
                lh: Pt(text.line_height),
            });
            ops.push(Op::SetFillColor {
                col: rgb(text.color),
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(content)],
                font,
            });
            ops.push(Op::EndTextSection);
        }
    }

    if let Some(img) = &lbox.image {
        if let Some(res) = images.get(&img.src) {
            // At dpi=72 printpdf renders 1 px = 1 pt, so scale = pt / px.
            let scale_x = if res.px_width > 0 {
                img.width / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                img.height / res.px_height as f32
            } else {
                1.0
            };

            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(page_height - lbox.y - img.height)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, page_height, images);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::with_page_mm(100.0, 100.0);
        let bytes = render_pdf(&config).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn builtin_text_folds_accents() {
        assert_eq!(to_builtin_text("miércoles\u{00A0}Ñuñoa"), "miercoles Nunoa");
        assert_eq!(to_builtin_text("3 x 3.1Kg = 9.3Kg"), "3 x 3.1Kg = 9.3Kg");
        assert_eq!(to_builtin_text("日本"), "??");
    }

    #[test]
    fn data_uri_parsing() {
        assert_eq!(parse_data_uri("data:image/png;base64,AAEC").unwrap(), vec![0, 1, 2]);
        assert!(parse_data_uri("barcode.png").is_err());
        assert!(parse_data_uri("data:image/png,AAEC").is_err());
    }

    #[test]
    fn dashed_side_is_drawn_in_segments() {
        let mut ops = Vec::new();
        let border = BorderLine {
            width: 1.0,
            pattern: LinePattern::Dashed,
            color: [0.0, 0.0, 0.0, 1.0],
        };
        draw_side(&mut ops, (0.0, 10.0), (20.0, 10.0), (0.0, -1.0), &border);
        let lines = ops.iter().filter(|op| matches!(op, Op::DrawLine { .. })).count();
        // 3pt dash + 3pt gap over 20pt
        assert_eq!(lines, 4);
    }
}
