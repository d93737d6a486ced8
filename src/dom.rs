//! Markup tree – the label renderer builds it, the compositor parses it back.
//!
//! The supported subset is small:
//! - Structural: div, p, body, html, head
//! - Inline: span, br
//! - Replaced: img (data URIs only)
//! - Styling via `class` and `style` attributes
//!
//! Attributes are kept ordered so serialisation is byte-for-byte stable.

use std::collections::BTreeMap;
use std::fmt::Write as _;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    P,
    Span,
    Img,
    Br,
    Body,
    Html,
    Head,
    /// Kept in the tree but not displayed.
    Unknown(String),
}

impl Tag {
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "div" => Tag::Div,
            "p" => Tag::P,
            "span" => Tag::Span,
            "img" => Tag::Img,
            "br" => Tag::Br,
            "body" => Tag::Body,
            "html" => Tag::Html,
            "head" => Tag::Head,
            _ => Tag::Unknown(s.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tag::Div => "div",
            Tag::P => "p",
            Tag::Span => "span",
            Tag::Img => "img",
            Tag::Br => "br",
            Tag::Body => "body",
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Unknown(name) => name,
        }
    }

    /// Elements without content or closing tag.
    pub fn is_void(&self) -> bool {
        matches!(self, Tag::Img | Tag::Br)
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Tag::Span | Tag::Br)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

impl DomNode {
    pub fn text(s: impl Into<String>) -> Self {
        DomNode::Text(s.into())
    }
}

impl From<ElementNode> for DomNode {
    fn from(e: ElementNode) -> Self {
        DomNode::Element(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Set the `class` attribute; an empty string leaves it unset.
    pub fn class(self, class: &str) -> Self {
        let class = class.split_whitespace().collect::<Vec<_>>().join(" ");
        if class.is_empty() {
            self
        } else {
            self.attr("class", class)
        }
    }

    pub fn style(self, style: &str) -> Self {
        self.attr("style", style)
    }

    pub fn child(mut self, node: impl Into<DomNode>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn text(self, s: impl Into<String>) -> Self {
        self.child(DomNode::Text(s.into()))
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(|s| s.as_str())
    }

    pub fn src(&self) -> Option<&str> {
        self.attributes.get("src").map(|s| s.as_str())
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// `<div class=…>` wrapping `children`.
pub fn div(class: &str, children: impl IntoIterator<Item = DomNode>) -> ElementNode {
    children
        .into_iter()
        .fold(ElementNode::new(Tag::Div).class(class), ElementNode::child)
}

/// `<div class=…>text</div>`
pub fn text_div(class: &str, text: impl Into<String>) -> ElementNode {
    ElementNode::new(Tag::Div).class(class).text(text)
}

pub fn span(class: &str, text: impl Into<String>) -> ElementNode {
    ElementNode::new(Tag::Span).class(class).text(text)
}

pub fn img(src: impl Into<String>) -> ElementNode {
    ElementNode::new(Tag::Img).attr("src", src)
}

// ---------------------------------------------------------------------------
// Serialiser
// ---------------------------------------------------------------------------

/// Serialise nodes to HTML. Text is entity-escaped; U+00A0 is written as
/// `&nbsp;`.
pub fn to_html(nodes: &[DomNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

impl ElementNode {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(&mut out, self);
        out
    }
}

fn write_node(out: &mut String, node: &DomNode) {
    match node {
        DomNode::Text(text) => out.push_str(&escape(text, false)),
        DomNode::Element(e) => write_element(out, e),
    }
}

fn write_element(out: &mut String, e: &ElementNode) {
    let name = e.tag.name();
    let _ = write!(out, "<{name}");
    for (key, value) in &e.attributes {
        let _ = write!(out, " {key}=\"{}\"", escape(value, true));
    }
    if e.tag.is_void() {
        out.push_str(" />");
        return;
    }
    out.push('>');
    for child in &e.children {
        write_node(out, child);
    }
    let _ = write!(out, "</{name}>");
}

fn escape(s: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Parser – simple recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML fragment into DOM nodes. Malformed input never fails; the
/// parser recovers by closing open elements at end of input.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    parser.parse_nodes()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            self.skip_blank_between_tags();
            if self.eof() || self.starts_with("</") {
                break;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_past("-->");
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            self.skip_past(">");
            return None;
        }
        if self.starts_with("<") {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        while !self.eof() && !self.starts_with("<") {
            self.advance();
        }
        DomNode::Text(decode_entities(&self.input[start..self.pos]))
    }

    fn parse_element(&mut self) -> DomNode {
        self.advance(); // '<'
        let tag = Tag::from_name(&self.parse_name());
        let mut elem = ElementNode::new(tag);

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if self.pos == before {
                // Stray character inside the tag.
                self.advance();
                continue;
            }
            elem.attributes.insert(key.to_ascii_lowercase(), value);
        }

        if self.starts_with("/>") {
            self.pos += 2;
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.advance();
        }
        if elem.tag.is_void() {
            return DomNode::Element(elem);
        }

        elem.children = self.parse_nodes();

        if self.starts_with("</") {
            self.pos += 2;
            self.parse_name();
            self.skip_past(">");
        }
        DomNode::Element(elem)
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance();
        self.skip_whitespace();
        (key, self.parse_attr_value())
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ["\"", "'"] {
            if self.starts_with(quote) {
                self.advance();
                let start = self.pos;
                while !self.eof() && !self.starts_with(quote) {
                    self.advance();
                }
                let val = decode_entities(&self.input[start..self.pos]);
                if !self.eof() {
                    self.advance();
                }
                return val;
            }
        }
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_whitespace() || c == '>' || c == '/' {
                break;
            }
            self.advance();
        }
        decode_entities(&self.input[start..self.pos])
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Drop whitespace-only runs that sit between tags.
    fn skip_blank_between_tags(&mut self) {
        let saved = self.pos;
        self.skip_whitespace();
        if !self.eof() && !self.starts_with("<") {
            self.pos = saved;
        }
    }

    fn skip_past(&mut self, end: &str) {
        match self.input[self.pos..].find(end) {
            Some(i) => self.pos += i + end.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current_char() {
            self.pos += c.len_utf8();
        }
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&nbsp;", "\u{00A0}")
        .replace("&#160;", "\u{00A0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Children of `<body>`, or all nodes when there is no body.
pub fn body_children(nodes: &[DomNode]) -> Vec<DomNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Body {
                return e.children.clone();
            }
            if e.tag == Tag::Html {
                let inner = body_children(&e.children);
                if !inner.is_empty() {
                    return inner;
                }
            }
        }
    }
    nodes.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_serialises_in_attribute_order() {
        let node = ElementNode::new(Tag::Div)
            .style("width:20%;")
            .class("text-sm  text-right")
            .text("A & B");
        assert_eq!(
            node.to_html(),
            r#"<div class="text-sm text-right" style="width:20%;">A &amp; B</div>"#
        );
    }

    #[test]
    fn void_elements_self_close() {
        let html = to_html(&[img("data:image/png;base64,AA==").style("width:80mm;").into()]);
        assert_eq!(html, r#"<img src="data:image/png;base64,AA==" style="width:80mm;" />"#);
    }

    #[test]
    fn nbsp_round_trips() {
        let html = text_div("", "\u{00A0}").to_html();
        assert_eq!(html, "<div>&nbsp;</div>");
        let nodes = parse_html(&html);
        match &nodes[0] {
            DomNode::Element(e) => assert_eq!(e.children, vec![DomNode::text("\u{00A0}")]),
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn parse_nested_spans() {
        let nodes = parse_html(r#"<div>3 x 3.1Kg = <span class="font-bold">9.3Kg</span></div>"#);
        assert_eq!(nodes.len(), 1);
        if let DomNode::Element(e) = &nodes[0] {
            assert_eq!(e.tag, Tag::Div);
            assert_eq!(e.children.len(), 2);
        } else {
            panic!("Expected div");
        }
    }

    #[test]
    fn parse_serialise_round_trip() {
        let tree = div(
            "label",
            [
                text_div("number text-3xl", "123456789").into(),
                div("", [ElementNode::new(Tag::Br).into(), DomNode::text("x < y")]).into(),
            ],
        );
        let html = tree.to_html();
        assert_eq!(parse_html(&html), vec![DomNode::Element(tree)]);
    }

    #[test]
    fn unterminated_input_does_not_panic() {
        let nodes = parse_html("<div class=\"a\"><span>open");
        assert_eq!(nodes.len(), 1);
        assert!(parse_html("<").len() <= 1);
    }

    #[test]
    fn body_children_unwraps_document() {
        let nodes = parse_html("<html><head></head><body><p>x</p></body></html>");
        let body = body_children(&nodes);
        assert_eq!(body.len(), 1);
    }
}
