//! Style resolver – maps the document stylesheet, Tailwind-like utility
//! classes and inline styles to a flat [`ComputedStyle`] consumed by the
//! layout engine.
//!
//! Precedence, lowest first: tag defaults, inherited text properties,
//! stylesheet rules (tag rules before class rules, then source order),
//! utility classes, the `style` attribute.
//!
//! All lengths are resolved to PDF points: `px` is 0.75 pt, `mm` is
//! 72/25.4 pt, bare numbers are px.

use std::collections::BTreeMap;

use crate::dom::{DomNode, ElementNode, Tag};

pub const PX_TO_PT: f32 = 0.75;
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// Fully resolved style for a single element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub flex_grow: f32,
    pub gap: f32,
    /// `float: left`; a block whose children all float lays them out as a row.
    pub float_left: bool,

    pub width: Dimension,
    pub height: Dimension,

    pub margin: Edges,
    pub padding: Edges,
    pub border: BorderSides,

    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub font_family: FontFamily,
    pub color: Color,
    pub text_align: TextAlign,
    /// Multiple of the font size.
    pub line_height: f32,

    pub background_color: Color,

    pub page_break_before: bool,
    pub page_break_after: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            flex_grow: 0.0,
            gap: 0.0,
            float_left: false,
            width: Dimension::Auto,
            height: Dimension::Auto,
            margin: Edges::default(),
            padding: Edges::default(),
            border: BorderSides::default(),
            font_size: 16.0 * PX_TO_PT,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            font_family: FontFamily::Helvetica,
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.2,
            background_color: Color::TRANSPARENT,
            page_break_before: false,
            page_break_after: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Inline,
    InlineBlock,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

/// The PDF builtin families the renderer can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFamily {
    Helvetica,
    Courier,
}

impl FontFamily {
    /// First recognised family of a CSS `font-family` list.
    pub fn from_css(value: &str) -> Option<Self> {
        value.split(',').find_map(|name| {
            match name.trim().trim_matches(['"', '\'']).to_ascii_lowercase().as_str() {
                "courier" | "courier new" | "monospace" | "mono" => Some(FontFamily::Courier),
                "helvetica" | "arial" | "sans-serif" | "sans" => Some(FontFamily::Helvetica),
                _ => None,
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    /// Points.
    Length(f32),
    Percent(f32),
}

/// Four-sided lengths in points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub fn all(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    None,
    Solid,
    Dashed,
    Dotted,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderSide {
    pub width: f32,
    pub line: LineStyle,
    pub color: Color,
}

impl Default for BorderSide {
    fn default() -> Self {
        Self {
            width: 0.0,
            line: LineStyle::None,
            color: Color::BLACK,
        }
    }
}

impl BorderSide {
    pub fn is_visible(&self) -> bool {
        self.line != LineStyle::None && self.width > 0.0
    }

    /// Width the side takes in the box model.
    pub fn used_width(&self) -> f32 {
        if self.is_visible() {
            self.width
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BorderSides {
    pub top: BorderSide,
    pub right: BorderSide,
    pub bottom: BorderSide,
    pub left: BorderSide,
}

impl BorderSides {
    pub fn any_visible(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .any(BorderSide::is_visible)
    }
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `#rgb`, `#rrggbb` or a basic colour name.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with('#') {
            return Self::from_hex(value);
        }
        match value.to_ascii_lowercase().as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "gray" | "grey" => Some(Self::rgb(0.5, 0.5, 0.5)),
            "silver" => Some(Self::rgb(0.75, 0.75, 0.75)),
            "red" => Some(Self::rgb(1.0, 0.0, 0.0)),
            "green" => Some(Self::rgb(0.0, 0.5, 0.0)),
            "blue" => Some(Self::rgb(0.0, 0.0, 1.0)),
            "transparent" => Some(Self::TRANSPARENT),
            _ => None,
        }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match hex.len() {
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Stylesheet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Universal,
    Tag(Tag),
    Class(String),
    TagClass(Tag, String),
}

impl Selector {
    fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let simple = |c: char| c.is_alphanumeric() || c == '-' || c == '_';
        if s == "*" {
            return Some(Selector::Universal);
        }
        if let Some(class) = s.strip_prefix('.') {
            return class.chars().all(simple).then(|| Selector::Class(class.to_string()));
        }
        match s.split_once('.') {
            Some((tag, class)) if tag.chars().all(simple) && class.chars().all(simple) => {
                Some(Selector::TagClass(Tag::from_name(tag), class.to_string()))
            }
            None if !s.is_empty() && s.chars().all(simple) => Some(Selector::Tag(Tag::from_name(s))),
            _ => None,
        }
    }

    fn matches(&self, element: &ElementNode) -> bool {
        match self {
            Selector::Universal => true,
            Selector::Tag(tag) => element.tag == *tag,
            Selector::Class(class) => element.classes().contains(&class.as_str()),
            Selector::TagClass(tag, class) => {
                element.tag == *tag && element.classes().contains(&class.as_str())
            }
        }
    }

    fn has_class(&self) -> bool {
        matches!(self, Selector::Class(_) | Selector::TagClass(..))
    }
}

#[derive(Debug, Clone)]
struct Rule {
    selector: Selector,
    declarations: Vec<(String, String)>,
}

/// Simple-selector stylesheet: `*`, `tag`, `.class` and `tag.class`, with
/// selector lists. Anything more complex is skipped.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn parse(css: &str) -> Self {
        let css = strip_comments(css);
        let mut rules = Vec::new();
        for block in css.split('}') {
            let Some((selectors, body)) = block.split_once('{') else {
                continue;
            };
            if selectors.trim_start().starts_with('@') {
                log::debug!("Skipping at-rule {:?}", selectors.trim());
                continue;
            }
            let declarations = parse_declarations(body);
            for sel in selectors.split(',') {
                match Selector::parse(sel) {
                    Some(selector) => rules.push(Rule {
                        selector,
                        declarations: declarations.clone(),
                    }),
                    None => log::debug!("Skipping unsupported selector {:?}", sel.trim()),
                }
            }
        }
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    fn apply(&self, s: &mut ComputedStyle, element: &ElementNode) {
        for pass_class in [false, true] {
            for rule in &self.rules {
                if rule.selector.has_class() == pass_class && rule.selector.matches(element) {
                    for (prop, val) in &rule.declarations {
                        apply_css_property(s, prop, val);
                    }
                }
            }
        }
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        rest = match rest[start + 2..].find("*/") {
            Some(end) => &rest[start + 2 + end + 2..],
            None => "",
        };
    }
    out.push_str(rest);
    out
}

fn parse_declarations(body: &str) -> Vec<(String, String)> {
    body.split(';')
        .filter_map(|decl| {
            let (prop, val) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let val = val.trim().trim_end_matches("!important").trim();
            (!prop.is_empty() && !val.is_empty()).then(|| (prop, val.to_string()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(
    element: &ElementNode,
    parent: Option<&ComputedStyle>,
    sheet: &Stylesheet,
) -> ComputedStyle {
    let mut style = base_style_for_tag(&element.tag);

    if let Some(p) = parent {
        style.font_size = p.font_size;
        style.font_weight = p.font_weight;
        style.font_style = p.font_style;
        style.font_family = p.font_family;
        style.color = p.color;
        style.text_align = p.text_align;
        style.line_height = p.line_height;
    }

    sheet.apply(&mut style, element);

    for class in element.classes() {
        apply_utility_class(&mut style, class);
    }

    if let Some(inline) = element.inline_style() {
        for (prop, val) in parse_declarations(inline) {
            apply_css_property(&mut style, &prop, &val);
        }
    }

    style
}

fn base_style_for_tag(tag: &Tag) -> ComputedStyle {
    let mut s = ComputedStyle::default();
    match tag {
        Tag::P => s.margin.bottom = 10.0 * PX_TO_PT,
        Tag::Span | Tag::Br => s.display = Display::Inline,
        Tag::Img => s.display = Display::InlineBlock,
        Tag::Head | Tag::Unknown(_) => s.display = Display::None,
        Tag::Div | Tag::Body | Tag::Html => {}
    }
    s
}

/// Apply a single Tailwind utility class.
fn apply_utility_class(s: &mut ComputedStyle, class: &str) {
    match class {
        "font-bold" => s.font_weight = FontWeight::Bold,
        "font-normal" => s.font_weight = FontWeight::Normal,
        "italic" => s.font_style = FontStyle::Italic,

        "text-left" => s.text_align = TextAlign::Left,
        "text-center" => s.text_align = TextAlign::Center,
        "text-right" => s.text_align = TextAlign::Right,

        // Label tiers; `text-2xs` and `text-md` come from the theme sheet.
        "text-xs" => s.font_size = 12.0 * PX_TO_PT,
        "text-sm" => s.font_size = 14.0 * PX_TO_PT,
        "text-base" => s.font_size = 16.0 * PX_TO_PT,
        "text-lg" => s.font_size = 18.0 * PX_TO_PT,
        "text-xl" => s.font_size = 20.0 * PX_TO_PT,
        "text-2xl" => s.font_size = 24.0 * PX_TO_PT,
        "text-3xl" => s.font_size = 30.0 * PX_TO_PT,

        "w-full" => s.width = Dimension::Percent(100.0),
        "float-left" => s.float_left = true,

        _ => try_parse_spacing_class(s, class),
    }
}

fn try_parse_spacing_class(s: &mut ComputedStyle, class: &str) {
    // p-{n}, px-{n}, mt-{n}, … (1 unit = 4px)
    let Some((prefix, value)) = class.rsplit_once('-') else {
        return;
    };
    let Ok(units) = value.parse::<f32>() else {
        return;
    };
    let v = units * 4.0 * PX_TO_PT;

    let (edges, sides) = match (prefix.chars().next(), prefix.get(1..)) {
        (Some('p'), Some(sides)) => (&mut s.padding, sides),
        (Some('m'), Some(sides)) => (&mut s.margin, sides),
        _ => return,
    };
    match sides {
        "" => *edges = Edges::all(v),
        "x" => {
            edges.left = v;
            edges.right = v;
        }
        "y" => {
            edges.top = v;
            edges.bottom = v;
        }
        "t" => edges.top = v,
        "r" => edges.right = v,
        "b" => edges.bottom = v,
        "l" => edges.left = v,
        _ => {}
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    let val = val.trim();
    match prop {
        "display" => {
            s.display = match val {
                "flex" => Display::Flex,
                "block" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "column" => FlexDirection::Column,
                "row" => FlexDirection::Row,
                _ => s.flex_direction,
            }
        }
        "float" => s.float_left = val.eq_ignore_ascii_case("left"),
        "font-size" => {
            if let Some(pt) = parse_length(val) {
                s.font_size = pt;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = if val == "italic" || val == "oblique" {
                FontStyle::Italic
            } else {
                FontStyle::Normal
            }
        }
        "font-family" => {
            if let Some(family) = FontFamily::from_css(val) {
                s.font_family = family;
            }
        }
        "color" => {
            if let Some(c) = Color::parse(val) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if let Some(c) = Color::parse(val) {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(pt) = parse_length(val) {
                if s.font_size > 0.0 {
                    s.line_height = pt / s.font_size;
                }
            }
        }
        "width" => s.width = parse_dimension(val),
        "height" => s.height = parse_dimension(val),
        "gap" => {
            if let Some(pt) = parse_length(val) {
                s.gap = pt;
            }
        }
        "margin" => apply_shorthand_edges(val, &mut s.margin),
        "padding" => apply_shorthand_edges(val, &mut s.padding),
        "border" => {
            let side = parse_border(val);
            s.border = BorderSides {
                top: side,
                right: side,
                bottom: side,
                left: side,
            };
        }
        "border-top" => s.border.top = parse_border(val),
        "border-right" => s.border.right = parse_border(val),
        "border-bottom" => s.border.bottom = parse_border(val),
        "border-left" => s.border.left = parse_border(val),
        "border-width" => {
            if let Some(pt) = parse_length(val) {
                for side in sides_mut(&mut s.border) {
                    side.width = pt;
                    if side.line == LineStyle::None {
                        side.line = LineStyle::Solid;
                    }
                }
            }
        }
        "border-color" => {
            if let Some(c) = Color::parse(val) {
                for side in sides_mut(&mut s.border) {
                    side.color = c;
                }
            }
        }
        "page-break-before" | "break-before" => {
            s.page_break_before = val == "always" || val == "page";
        }
        "page-break-after" | "break-after" => {
            s.page_break_after = val == "always" || val == "page";
        }
        _ => {
            let (edges, side) = if let Some(side) = prop.strip_prefix("margin-") {
                (&mut s.margin, side)
            } else if let Some(side) = prop.strip_prefix("padding-") {
                (&mut s.padding, side)
            } else {
                return;
            };
            if let Some(pt) = parse_length(val) {
                match side {
                    "top" => edges.top = pt,
                    "right" => edges.right = pt,
                    "bottom" => edges.bottom = pt,
                    "left" => edges.left = pt,
                    _ => {}
                }
            }
        }
    }
}

fn sides_mut(b: &mut BorderSides) -> [&mut BorderSide; 4] {
    [&mut b.top, &mut b.right, &mut b.bottom, &mut b.left]
}

/// `1px dashed black`, in any order. A missing width defaults to 1px, a
/// missing style to solid.
fn parse_border(val: &str) -> BorderSide {
    let mut side = BorderSide {
        width: PX_TO_PT,
        line: LineStyle::Solid,
        color: Color::BLACK,
    };
    for token in val.split_whitespace() {
        match token.to_ascii_lowercase().as_str() {
            "none" | "hidden" => side.line = LineStyle::None,
            "solid" => side.line = LineStyle::Solid,
            "dashed" => side.line = LineStyle::Dashed,
            "dotted" => side.line = LineStyle::Dotted,
            "double" => side.line = LineStyle::Double,
            "thin" => side.width = PX_TO_PT,
            "medium" => side.width = 3.0 * PX_TO_PT,
            "thick" => side.width = 5.0 * PX_TO_PT,
            other => {
                if let Some(pt) = parse_length(other) {
                    side.width = pt;
                } else if let Some(c) = Color::parse(other) {
                    side.color = c;
                }
            }
        }
    }
    if val.trim() == "0" {
        side.line = LineStyle::None;
    }
    side
}

/// Parse a length to points. Bare numbers are px.
pub fn parse_length(s: &str) -> Option<f32> {
    let s = s.trim();
    let (num, factor) = if let Some(n) = s.strip_suffix("px") {
        (n, PX_TO_PT)
    } else if let Some(n) = s.strip_suffix("pt") {
        (n, 1.0)
    } else if let Some(n) = s.strip_suffix("mm") {
        (n, MM_TO_PT)
    } else if let Some(n) = s.strip_suffix("cm") {
        (n, MM_TO_PT * 10.0)
    } else if let Some(n) = s.strip_suffix("in") {
        (n, 72.0)
    } else {
        (s, PX_TO_PT)
    };
    num.trim().parse::<f32>().ok().map(|v| v * factor)
}

pub fn parse_dimension(s: &str) -> Dimension {
    let s = s.trim();
    if s == "auto" {
        Dimension::Auto
    } else if let Some(p) = s.strip_suffix('%') {
        p.trim()
            .parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_length(s).map(Dimension::Length).unwrap_or(Dimension::Auto)
    }
}

fn apply_shorthand_edges(val: &str, edges: &mut Edges) {
    let parts: Vec<f32> = val.split_whitespace().filter_map(parse_length).collect();
    match parts[..] {
        [all] => *edges = Edges::all(all),
        [vertical, horizontal] => {
            *edges = Edges {
                top: vertical,
                right: horizontal,
                bottom: vertical,
                left: horizontal,
            }
        }
        [top, horizontal, bottom] => {
            *edges = Edges {
                top,
                right: horizontal,
                bottom,
                left: horizontal,
            }
        }
        [top, right, bottom, left] => {
            *edges = Edges {
                top,
                right,
                bottom,
                left,
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        attrs: BTreeMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

impl StyledNode {
    pub fn style(&self) -> &ComputedStyle {
        match self {
            StyledNode::Element { style, .. } | StyledNode::Text { style, .. } => style,
        }
    }
}

/// Build a styled tree from a DOM tree, resolving styles top-down.
///
/// Whitespace-only text is dropped, but a non-breaking space survives so
/// placeholder rows keep their height.
pub fn build_styled_tree(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
    sheet: &Stylesheet,
) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent_style, sheet);
                if style.display == Display::None {
                    continue;
                }
                let children = build_styled_tree(&e.children, Some(&style), sheet);
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                if text.trim_matches(|c: char| c.is_ascii_whitespace()).is_empty() {
                    continue;
                }
                // Text renders inline; box-model properties are not inherited.
                let mut style = parent_style.cloned().unwrap_or_default();
                style.display = Display::Inline;
                style.border = BorderSides::default();
                style.background_color = Color::TRANSPARENT;
                style.margin = Edges::default();
                style.padding = Edges::default();
                style.width = Dimension::Auto;
                style.height = Dimension::Auto;
                style.float_left = false;
                style.page_break_before = false;
                style.page_break_after = false;
                result.push(StyledNode::Text {
                    text: text.clone(),
                    style,
                });
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, text_div};

    fn resolve(html: &str, css: &str) -> ComputedStyle {
        let nodes = parse_html(html);
        match &nodes[0] {
            DomNode::Element(e) => resolve_style(e, None, &Stylesheet::parse(css)),
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn utility_padding_in_points() {
        let mut s = ComputedStyle::default();
        apply_utility_class(&mut s, "p-1");
        assert_eq!(s.padding, Edges::all(3.0));
        apply_utility_class(&mut s, "mt-2");
        assert_eq!(s.margin.top, 6.0);
    }

    #[test]
    fn lengths_convert_to_points() {
        assert_eq!(parse_length("8px"), Some(6.0));
        assert_eq!(parse_length("10pt"), Some(10.0));
        assert!((parse_length("25.4mm").unwrap() - 72.0).abs() < 0.001);
        assert_eq!(parse_dimension("79%"), Dimension::Percent(79.0));
    }

    #[test]
    fn inline_border_sides() {
        let s = resolve(r#"<div style="border-top:2px double black;"></div>"#, "");
        assert_eq!(s.border.top.line, LineStyle::Double);
        assert_eq!(s.border.top.width, 1.5);
        assert!(!s.border.bottom.is_visible());

        let s = resolve(r#"<div style="border-top:1px dashed black;"></div>"#, "");
        assert_eq!(s.border.top.line, LineStyle::Dashed);
    }

    #[test]
    fn float_and_percent_width() {
        let s = resolve(r#"<div style="width:20%; float:left;">SKU</div>"#, "");
        assert!(s.float_left);
        assert_eq!(s.width, Dimension::Percent(20.0));
    }

    #[test]
    fn precedence_stylesheet_then_utility_then_inline() {
        let css = "div { text-align: left } .number { font-weight: bold; text-align: center; }";
        let s = resolve(r#"<div class="number text-right">1</div>"#, css);
        assert_eq!(s.text_align, TextAlign::Right);
        assert_eq!(s.font_weight, FontWeight::Bold);

        let s = resolve(r#"<div class="number" style="text-align:left">1</div>"#, css);
        assert_eq!(s.text_align, TextAlign::Left);
    }

    #[test]
    fn class_rules_beat_tag_rules_regardless_of_order() {
        let css = ".mono { font-family: Courier } div { font-family: Helvetica }";
        let s = resolve(r#"<div class="mono">x</div>"#, css);
        assert_eq!(s.font_family, FontFamily::Courier);
    }

    #[test]
    fn unsupported_selectors_are_skipped() {
        let sheet = Stylesheet::parse("/* c */ .a .b { color: red } .c:hover {} @media print { } .d, p { color: red }");
        assert_eq!(sheet.len(), 2);
    }

    #[test]
    fn colors() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert!((c.g - 0.533).abs() < 0.01);
        assert_eq!(Color::parse("black"), Some(Color::BLACK));
        assert_eq!(Color::parse("nope"), None);
    }

    #[test]
    fn nbsp_text_survives_styling() {
        let styled = build_styled_tree(
            &[text_div("", "\u{00A0}").into(), DomNode::text("  \n ")],
            None,
            &Stylesheet::default(),
        );
        assert_eq!(styled.len(), 1);
        match &styled[0] {
            StyledNode::Element { children, .. } => assert_eq!(children.len(), 1),
            other => panic!("expected element, got {other:?}"),
        }
    }
}
