//! Layout engine – uses Taffy to compute flexbox layout from a styled tree,
//! then converts the result into nested positioned boxes.
//!
//! Block elements stack as flex columns. Two patterns become rows: a block
//! whose element children all `float: left`, and a block holding only
//! inline content (text and spans), which flows as a wrapping row aligned by
//! `text-align`.

use std::collections::HashMap;

use taffy::prelude::*;

use crate::dom::Tag;
use crate::fonts::{line_height_pt, wrap_text, FontKey};
use crate::style::{self, ComputedStyle, StyledNode};

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
    pub page_break_before: bool,
    pub page_break_after: bool,
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text { lines: Vec<String> },
    Image { src: String },
}

type LayoutResult<T> = Result<T, String>;

fn taffy_err(e: taffy::TaffyError) -> String {
    format!("layout failed: {e}")
}

struct LayoutBuilder {
    taffy: TaffyTree<()>,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
}

impl LayoutBuilder {
    fn new() -> Self {
        Self {
            taffy: TaffyTree::new(),
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
        }
    }

    fn all_inline(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                style,
                children: gc,
                ..
            } => style.display == style::Display::Inline && Self::all_inline(gc),
        })
    }

    fn all_floating(children: &[StyledNode]) -> bool {
        let mut elements = children
            .iter()
            .filter(|c| matches!(c, StyledNode::Element { .. }))
            .peekable();
        elements.peek().is_some() && elements.all(|c| c.style().float_left)
    }

    /// `parent_width` is the width the node may use, for word wrapping.
    fn build_node(
        &mut self,
        styled: &StyledNode,
        parent_width: f32,
        parent_align: style::TextAlign,
        in_row: bool,
    ) -> LayoutResult<NodeId> {
        match styled {
            StyledNode::Text { text, style } => self.build_text_node(text, style, parent_width, in_row),
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => {
                let src = attrs.get("src").map(String::as_str);
                self.build_element_node(tag, style, children, src, parent_width, parent_align)
            }
        }
    }

    /// Text leaf. In a block it stretches to the line width so alignment can
    /// be applied per line; in an inline row it is as wide as its text.
    fn build_text_node(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        max_width: f32,
        in_row: bool,
    ) -> LayoutResult<NodeId> {
        let key = FontKey::from_style(style);
        let line_h = line_height_pt(style.font_size, style.line_height);
        let lines = wrap_text(text.trim_matches(|c: char| c.is_ascii_whitespace()), key, style.font_size, max_width);

        let text_width = lines
            .iter()
            .map(|l| key.measure(l, style.font_size))
            .fold(0.0f32, f32::max);

        // A run ending (or starting) in a space keeps the gap to its neighbour.
        let space = key.measure(" ", style.font_size);
        let edge_space = |present: bool| if in_row && present { space } else { 0.0 };
        let leading = edge_space(text.starts_with(|c: char| c.is_ascii_whitespace()));
        let trailing = edge_space(text.ends_with(|c: char| c.is_ascii_whitespace()));

        let taffy_style = Style {
            size: Size {
                width: if in_row {
                    length(leading + text_width + trailing)
                } else {
                    taffy::Dimension::Auto
                },
                height: length(lines.len() as f32 * line_h),
            },
            min_size: Size {
                width: length(text_width),
                height: taffy::Dimension::Auto,
            },
            padding: Rect {
                left: LengthPercentage::Length(leading),
                right: LengthPercentage::Length(0.0),
                top: LengthPercentage::Length(0.0),
                bottom: LengthPercentage::Length(0.0),
            },
            flex_shrink: 0.0,
            ..Default::default()
        };

        // A run is exactly as wide as its text, so it draws left aligned.
        let mut leaf_style = style.clone();
        if in_row {
            leaf_style.padding.left = leading;
            leaf_style.text_align = style::TextAlign::Left;
        }

        let node = self.taffy.new_leaf(taffy_style).map_err(taffy_err)?;
        self.node_styles.insert(node, leaf_style);
        self.node_content.insert(node, BoxContent::Text { lines });
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        src: Option<&str>,
        parent_width: f32,
        parent_align: style::TextAlign,
    ) -> LayoutResult<NodeId> {
        let my_width = resolve_width(style.width, parent_width);
        let inner_width = (my_width
            - style.padding.left
            - style.padding.right
            - style.border.left.used_width()
            - style.border.right.used_width())
        .max(1.0);

        let mode = if *tag == Tag::Img {
            Flow::Replaced
        } else if style.display == style::Display::Flex {
            Flow::Flex
        } else if Self::all_floating(children) {
            Flow::FloatRow
        } else if children.len() > 1 && Self::all_inline(children) {
            Flow::InlineRow
        } else {
            Flow::Column
        };

        let mut child_nodes = Vec::new();
        for child in children {
            let child_width = match (mode, child) {
                (Flow::InlineRow, _) => inner_width,
                (_, StyledNode::Element { style: cs, .. }) => resolve_width(cs.width, inner_width),
                _ => inner_width,
            };
            let in_row = matches!(mode, Flow::InlineRow | Flow::FloatRow | Flow::Flex);
            child_nodes.push(self.build_node(child, child_width, style.text_align, in_row)?);
        }

        let mut ts = self.computed_to_taffy(style, mode);
        if *tag == Tag::Img {
            ts.max_size.width = percent(1.0);
        }
        if matches!(style.display, style::Display::InlineBlock | style::Display::Inline) || *tag == Tag::Img {
            ts.align_self = Some(match parent_align {
                style::TextAlign::Left => taffy::AlignSelf::Start,
                style::TextAlign::Center => taffy::AlignSelf::Center,
                style::TextAlign::Right => taffy::AlignSelf::End,
            });
        }

        let node = self
            .taffy
            .new_with_children(ts, &child_nodes)
            .map_err(taffy_err)?;
        self.node_styles.insert(node, style.clone());
        if let Some(src) = src.filter(|_| *tag == Tag::Img) {
            self.node_content.insert(
                node,
                BoxContent::Image {
                    src: src.to_string(),
                },
            );
        }
        Ok(node)
    }

    fn computed_to_taffy(&self, s: &ComputedStyle, mode: Flow) -> Style {
        let mut ts = Style {
            display: taffy::Display::Flex,
            ..Default::default()
        };

        match mode {
            Flow::Flex => {
                ts.flex_direction = match s.flex_direction {
                    style::FlexDirection::Row => taffy::FlexDirection::Row,
                    style::FlexDirection::Column => taffy::FlexDirection::Column,
                };
                ts.justify_content = Some(match s.justify_content {
                    style::JustifyContent::Start => taffy::JustifyContent::Start,
                    style::JustifyContent::End => taffy::JustifyContent::End,
                    style::JustifyContent::Center => taffy::JustifyContent::Center,
                    style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                });
                ts.align_items = Some(match s.align_items {
                    style::AlignItems::Start => taffy::AlignItems::Start,
                    style::AlignItems::End => taffy::AlignItems::End,
                    style::AlignItems::Center => taffy::AlignItems::Center,
                    style::AlignItems::Stretch => taffy::AlignItems::Stretch,
                });
            }
            Flow::FloatRow => {
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.align_items = Some(taffy::AlignItems::Start);
            }
            Flow::InlineRow => {
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.flex_wrap = taffy::FlexWrap::Wrap;
                ts.align_items = Some(taffy::AlignItems::End);
                ts.justify_content = Some(match s.text_align {
                    style::TextAlign::Left => taffy::JustifyContent::Start,
                    style::TextAlign::Center => taffy::JustifyContent::Center,
                    style::TextAlign::Right => taffy::JustifyContent::End,
                });
            }
            Flow::Column | Flow::Replaced => {
                ts.flex_direction = taffy::FlexDirection::Column;
            }
        }

        ts.size = Size {
            width: dim_to_taffy(s.width),
            height: dim_to_taffy(s.height),
        };
        ts.min_size.width = length(0.0);
        ts.flex_grow = s.flex_grow;
        ts.flex_shrink = if s.float_left { 1.0 } else { 0.0 };

        ts.margin = Rect {
            top: LengthPercentageAuto::Length(s.margin.top),
            right: LengthPercentageAuto::Length(s.margin.right),
            bottom: LengthPercentageAuto::Length(s.margin.bottom),
            left: LengthPercentageAuto::Length(s.margin.left),
        };
        ts.padding = Rect {
            top: LengthPercentage::Length(s.padding.top),
            right: LengthPercentage::Length(s.padding.right),
            bottom: LengthPercentage::Length(s.padding.bottom),
            left: LengthPercentage::Length(s.padding.left),
        };
        ts.border = Rect {
            top: LengthPercentage::Length(s.border.top.used_width()),
            right: LengthPercentage::Length(s.border.right.used_width()),
            bottom: LengthPercentage::Length(s.border.bottom.used_width()),
            left: LengthPercentage::Length(s.border.left.used_width()),
        };
        ts.gap = Size {
            width: LengthPercentage::Length(s.gap),
            height: LengthPercentage::Length(s.gap),
        };
        ts
    }

    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> LayoutResult<PositionedBox> {
        let layout = self.taffy.layout(node).map_err(taffy_err)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;
        let (width, height) = (layout.size.width, layout.size.height);

        let children = self
            .taffy
            .children(node)
            .map_err(taffy_err)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<LayoutResult<Vec<_>>>()?;

        Ok(PositionedBox {
            x,
            y,
            width,
            height,
            page_break_before: style.page_break_before,
            page_break_after: style.page_break_after,
            style,
            content,
            children,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Column,
    Flex,
    FloatRow,
    InlineRow,
    Replaced,
}

fn resolve_width(d: style::Dimension, available: f32) -> f32 {
    match d {
        style::Dimension::Length(w) => w,
        style::Dimension::Percent(p) => available * p / 100.0,
        style::Dimension::Auto => available,
    }
}

fn dim_to_taffy(d: style::Dimension) -> taffy::Dimension {
    match d {
        style::Dimension::Auto => taffy::Dimension::Auto,
        style::Dimension::Length(v) => taffy::Dimension::Length(v),
        style::Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
    }
}

/// Lay out top-level nodes in a column `content_width` points wide. Boxes are
/// offset horizontally by `origin_x`; `y` starts at zero.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    content_width: f32,
    origin_x: f32,
) -> Result<Vec<PositionedBox>, String> {
    let mut builder = LayoutBuilder::new();

    let child_ids = styled_nodes
        .iter()
        .map(|node| builder.build_node(node, content_width, style::TextAlign::Left, false))
        .collect::<LayoutResult<Vec<_>>>()?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: length(content_width),
            height: taffy::Dimension::Auto,
        },
        ..Default::default()
    };
    let root = builder
        .taffy
        .new_with_children(root_style, &child_ids)
        .map_err(taffy_err)?;

    builder
        .taffy
        .compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(content_width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(taffy_err)?;

    Ok(builder.extract(root, origin_x, 0.0)?.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::style::{build_styled_tree, Stylesheet};

    fn lay_out(html: &str) -> Vec<PositionedBox> {
        let styled = build_styled_tree(&parse_html(html), None, &Stylesheet::default());
        compute_layout(&styled, 260.0, 10.0).unwrap()
    }

    #[test]
    fn text_block_spans_the_line() {
        let boxes = lay_out("<div>Hello world</div>");
        assert_eq!(boxes.len(), 1);
        let first = &boxes[0];
        assert!((first.width - 260.0).abs() < 0.01);
        assert!(first.height > 0.0);
        assert!((first.x - 10.0).abs() < 0.01);
    }

    #[test]
    fn floats_become_a_row() {
        let boxes = lay_out(
            r#"<div><div style="width:20%;float:left;">SKU</div><div style="width:79%;float:left;">ABC-1</div></div>"#,
        );
        let row = &boxes[0];
        assert_eq!(row.children.len(), 2);
        let (a, b) = (&row.children[0], &row.children[1]);
        assert!((a.y - b.y).abs() < 0.01, "floats share a line");
        assert!((a.width - 52.0).abs() < 0.1);
        assert!(b.x > a.x);
    }

    #[test]
    fn inline_runs_keep_their_own_style() {
        let boxes = lay_out(r#"<div class="text-right">3 x 3.1Kg = <span class="font-bold">9.3Kg</span></div>"#);
        let row = &boxes[0];
        assert_eq!(row.children.len(), 2);
        let bold = &row.children[1];
        assert_eq!(bold.children.len(), 1);
        assert_eq!(bold.children[0].style.font_weight, style::FontWeight::Bold);
        // Right aligned: the last run ends at the right edge.
        assert!((bold.x + bold.width - (10.0 + 260.0)).abs() < 0.5);
    }

    #[test]
    fn fixed_size_image_is_centred() {
        let boxes = lay_out(r#"<div class="text-center"><img src="data:x" style="width:100px;height:20px;" /></div>"#);
        let img = &boxes[0].children[0];
        assert!(matches!(img.content, BoxContent::Image { .. }));
        assert!((img.width - 75.0).abs() < 0.01);
        assert!((img.x - (10.0 + (260.0 - 75.0) / 2.0)).abs() < 0.5);
    }

    #[test]
    fn borders_take_space() {
        let boxes = lay_out(r#"<div style="border-top:2px double black;">x</div>"#);
        let text = &boxes[0].children[0];
        assert!((text.y - boxes[0].y - 1.5).abs() < 0.01);
    }
}
