//! Pagination – splits a flat list of positioned boxes into pages.
//!
//! Handles:
//! - page boundaries inside the page margins
//! - page-break-before / page-break-after hints (one label per page)
//! - containers taller than a page, whose children paginate individually

use crate::fonts::{line_height_pt, FontKey};
use crate::layout::{BoxContent, PositionedBox};
use crate::layout_config::*;
use crate::style::{self, BorderSide, Edges};

/// Recursively expand any pure-container box whose height exceeds a single
/// page so its children can be split across pages individually. Each entry
/// carries whether a page break precedes it; an expanded container hands its
/// break to its first child.
fn flatten_for_pagination(
    boxes: &[PositionedBox],
    content_height: f32,
    inherited_break: bool,
) -> Vec<(&PositionedBox, bool)> {
    let mut result = Vec::new();
    let mut pending = inherited_break;
    for pbox in boxes {
        let break_before = pbox.page_break_before || std::mem::take(&mut pending);
        if pbox.height > content_height
            && matches!(pbox.content, BoxContent::None)
            && !pbox.children.is_empty()
        {
            result.extend(flatten_for_pagination(&pbox.children, content_height, break_before));
        } else {
            result.push((pbox, break_before));
        }
    }
    result
}

fn new_page(index: usize) -> PageLayout {
    PageLayout {
        page_index: index,
        boxes: Vec::new(),
    }
}

/// Convert positioned boxes into a paginated LayoutConfig.
///
/// Boxes carry page-absolute x (the left margin is already applied by the
/// layout pass) and document-space y starting at zero.
pub fn paginate(
    boxes: &[PositionedBox],
    page_width: f32,
    page_height: f32,
    margins: Edges,
    title: &str,
) -> LayoutConfig {
    let mut config = LayoutConfig {
        title: title.to_string(),
        page_width_pt: page_width,
        page_height_pt: page_height,
        pages: Vec::new(),
    };

    let content_height = (page_height - margins.top - margins.bottom).max(1.0);

    let flat = flatten_for_pagination(boxes, content_height, false);

    let mut current_page = new_page(0);
    // Document-space y at which the current page begins.
    let mut page_start_doc_y = 0.0f32;

    for &(pbox, break_before) in &flat {
        if break_before {
            // A break at the top of an empty page is already satisfied.
            if !current_page.boxes.is_empty() {
                config.pages.push(current_page);
                current_page = new_page(config.pages.len());
            }
            page_start_doc_y = pbox.y;
        }

        let y_on_page = (pbox.y - page_start_doc_y).max(0.0);
        if y_on_page + pbox.height > content_height && !current_page.boxes.is_empty() {
            config.pages.push(current_page);
            current_page = new_page(config.pages.len());
            page_start_doc_y = pbox.y;
        }
        if pbox.height > content_height {
            log::warn!(
                "Content of {:.1}pt does not fit the {:.1}pt page area and will be clipped",
                pbox.height,
                content_height
            );
        }

        let y_on_page = (pbox.y - page_start_doc_y).max(0.0);
        current_page
            .boxes
            .push(build_layout_box(pbox, margins.top + y_on_page));

        if pbox.page_break_after {
            config.pages.push(current_page);
            current_page = new_page(config.pages.len());
            page_start_doc_y = pbox.y + pbox.height;
        }
    }

    if !current_page.boxes.is_empty() {
        config.pages.push(current_page);
    }
    if config.pages.is_empty() {
        config.pages.push(new_page(0));
    }
    config
}

fn border_line(side: &BorderSide) -> Option<BorderLine> {
    let pattern = match side.line {
        _ if !side.is_visible() => return None,
        style::LineStyle::None => return None,
        style::LineStyle::Solid => LinePattern::Solid,
        style::LineStyle::Dashed => LinePattern::Dashed,
        style::LineStyle::Dotted => LinePattern::Dotted,
        style::LineStyle::Double => LinePattern::Double,
    };
    Some(BorderLine {
        width: side.width,
        pattern,
        color: side.color.to_array(),
    })
}

/// Recursively build a LayoutBox tree where every box carries *page-absolute*
/// x/y coordinates (origin = top-left of the physical page).
///
/// PositionedBox.y values are document-space absolutes, so
/// `child_abs_y = parent_abs_y + (child.y − parent.y)`.
fn build_layout_box(pbox: &PositionedBox, abs_y: f32) -> LayoutBox {
    let mut lb = LayoutBox::new(pbox.x, abs_y, pbox.width, pbox.height);
    let s = &pbox.style;

    if !s.background_color.is_transparent() {
        lb.background_color = Some(s.background_color.to_array());
    }

    lb.borders = Borders {
        top: border_line(&s.border.top),
        right: border_line(&s.border.right),
        bottom: border_line(&s.border.bottom),
        left: border_line(&s.border.left),
    };

    match &pbox.content {
        BoxContent::Text { lines } => {
            let key = FontKey::from_style(s);
            let line_height = line_height_pt(s.font_size, s.line_height);
            let inner_left = s.padding.left;
            let inner_width = (pbox.width - s.padding.left - s.padding.right).max(0.0);
            let text_lines = lines
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    let slack = (inner_width - key.measure(line, s.font_size)).max(0.0);
                    let align = match s.text_align {
                        style::TextAlign::Left => 0.0,
                        style::TextAlign::Center => slack / 2.0,
                        style::TextAlign::Right => slack,
                    };
                    TextLine {
                        text: line.clone(),
                        x_offset: inner_left + align,
                        y_offset: i as f32 * line_height,
                    }
                })
                .collect();

            // Centre the glyphs inside the line box.
            let half_leading = (line_height - s.font_size) / 2.0;
            lb.text = Some(TextContent {
                lines: text_lines,
                font_family: match s.font_family {
                    style::FontFamily::Helvetica => "helvetica".to_string(),
                    style::FontFamily::Courier => "courier".to_string(),
                },
                font_size: s.font_size,
                bold: key.bold,
                italic: key.italic,
                color: s.color.to_array(),
                line_height,
                ascent: half_leading + key.ascender() * s.font_size,
            });
        }
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: pbox.width,
                height: pbox.height,
            });
        }
        BoxContent::None => {}
    }

    for child in &pbox.children {
        let child_abs_y = abs_y + (child.y - pbox.y);
        lb.children.push(build_layout_box(child, child_abs_y));
    }

    lb
}
