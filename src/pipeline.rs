//! Pipeline – ties together parsing, styling, layout, pagination, and
//! rendering behind the [`Compositor`] seam the printer talks to.
//!
//! Each page fragment is laid out and paginated on its own, so a fragment
//! always starts on a fresh physical page.

use serde::{Deserialize, Serialize};

use crate::dom::{body_children, parse_html, ElementNode, Tag};
use crate::error::LabelError;
use crate::layout::compute_layout;
use crate::layout_config::{LayoutConfig, PageLayout};
use crate::pagination::paginate;
use crate::render::render_pdf;
use crate::style::{build_styled_tree, resolve_style, Edges, Stylesheet, MM_TO_PT};

/// Physical page size in millimetres. Serialises as `[width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct PageFormat {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageFormat {
    pub const fn new(width_mm: f32, height_mm: f32) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }

    pub fn width_pt(&self) -> f32 {
        self.width_mm * MM_TO_PT
    }

    pub fn height_pt(&self) -> f32 {
        self.height_mm * MM_TO_PT
    }
}

impl Default for PageFormat {
    fn default() -> Self {
        Self::new(100.0, 100.0)
    }
}

impl From<[f32; 2]> for PageFormat {
    fn from([w, h]: [f32; 2]) -> Self {
        Self::new(w, h)
    }
}

impl From<PageFormat> for [f32; 2] {
    fn from(f: PageFormat) -> Self {
        [f.width_mm, f.height_mm]
    }
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub const fn uniform(mm: f32) -> Self {
        Self {
            top: mm,
            right: mm,
            bottom: mm,
            left: mm,
        }
    }

    pub fn to_points(&self) -> Edges {
        Edges {
            top: self.top * MM_TO_PT,
            right: self.right * MM_TO_PT,
            bottom: self.bottom * MM_TO_PT,
            left: self.left * MM_TO_PT,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(4.0)
    }
}

/// Everything a compositor needs to produce one document.
#[derive(Debug, Clone, Copy)]
pub struct CompositionJob<'a> {
    /// Document-wide CSS.
    pub stylesheet: &'a str,
    /// One HTML fragment per page.
    pub pages: &'a [String],
    pub format: PageFormat,
    pub margins: Margins,
    pub title: &'a str,
}

/// Turns page fragments into final document bytes.
pub trait Compositor: Send + Sync {
    fn compose(&self, job: &CompositionJob<'_>) -> Result<Vec<u8>, LabelError>;
}

/// The built-in HTML → PDF compositor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfCompositor;

impl Compositor for PdfCompositor {
    fn compose(&self, job: &CompositionJob<'_>) -> Result<Vec<u8>, LabelError> {
        let (bytes, _) = generate_pdf(job).map_err(LabelError::RenderFailure)?;
        Ok(bytes)
    }
}

/// Full pipeline: page fragments → PDF bytes plus the layout that produced them.
pub fn generate_pdf(job: &CompositionJob<'_>) -> Result<(Vec<u8>, LayoutConfig), String> {
    let layout_config = compute_layout_config(job)?;
    let pdf_bytes = render_pdf(&layout_config)?;
    Ok((pdf_bytes, layout_config))
}

/// Generate only the layout config (no PDF rendering) – useful for testing.
pub fn compute_layout_config(job: &CompositionJob<'_>) -> Result<LayoutConfig, String> {
    let sheet = Stylesheet::parse(job.stylesheet);
    // Fragments are body content; `body` rules set the inherited defaults.
    let body_style = resolve_style(&ElementNode::new(Tag::Body), None, &sheet);
    let page_w = job.format.width_pt();
    let page_h = job.format.height_pt();
    let margins = job.margins.to_points();
    let content_w = page_w - margins.left - margins.right;
    if content_w <= 0.0 || page_h - margins.top - margins.bottom <= 0.0 {
        return Err(format!(
            "margins leave no room on a {}x{}mm page",
            job.format.width_mm, job.format.height_mm
        ));
    }

    let mut config = LayoutConfig {
        title: job.title.to_string(),
        page_width_pt: page_w,
        page_height_pt: page_h,
        pages: Vec::new(),
    };

    for (i, fragment) in job.pages.iter().enumerate() {
        // 1. Parse
        let dom = parse_html(fragment);
        let dom_nodes = body_children(&dom);

        // 2. Style
        let styled = build_styled_tree(&dom_nodes, Some(&body_style), &sheet);

        // 3. Layout
        let boxes = compute_layout(&styled, content_w, margins.left)?;

        // 4. Paginate
        let fragment_pages = paginate(&boxes, page_w, page_h, margins, job.title).pages;
        if fragment_pages.len() > 1 {
            log::debug!("Page fragment {i} spans {} physical pages", fragment_pages.len());
        }
        for page in fragment_pages {
            config.pages.push(PageLayout {
                page_index: config.pages.len(),
                boxes: page.boxes,
            });
        }
    }

    if config.pages.is_empty() {
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: Vec::new(),
        });
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job<'a>(pages: &'a [String]) -> CompositionJob<'a> {
        CompositionJob {
            stylesheet: ".big { font-size: 20px }",
            pages,
            format: PageFormat::default(),
            margins: Margins::default(),
            title: "Labels",
        }
    }

    #[test]
    fn pipeline_basic() {
        let pages = vec!["<div class=\"big\">Hello</div><div>World</div>".to_string()];
        let (bytes, config) = generate_pdf(&job(&pages)).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert_eq!(config.pages.len(), 1);
        assert_eq!(config.title, "Labels");
    }

    #[test]
    fn every_fragment_starts_a_page() {
        let pages: Vec<String> = ["<div>1</div>", "", "<div style=\"page-break-before:always\">3</div>"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let config = compute_layout_config(&job(&pages)).unwrap();
        assert_eq!(config.pages.len(), 3);
        assert!(config.pages[1].boxes.is_empty());
        assert_eq!(config.pages[2].page_index, 2);
    }

    #[test]
    fn margins_offset_content() {
        let pages = vec!["<div>x</div>".to_string()];
        let mut j = job(&pages);
        j.margins = Margins {
            top: 10.0,
            right: 4.0,
            bottom: 4.0,
            left: 6.0,
        };
        let config = compute_layout_config(&j).unwrap();
        let first = &config.pages[0].boxes[0];
        assert!((first.x - 6.0 * MM_TO_PT).abs() < 0.01);
        assert!((first.y - 10.0 * MM_TO_PT).abs() < 0.01);
        assert!((first.width - 90.0 * MM_TO_PT).abs() < 0.01);
    }

    #[test]
    fn oversized_margins_are_rejected() {
        let pages = vec!["<div>x</div>".to_string()];
        let mut j = job(&pages);
        j.margins = Margins::uniform(60.0);
        assert!(matches!(
            PdfCompositor.compose(&j),
            Err(LabelError::RenderFailure(_))
        ));
    }

    #[test]
    fn format_serialises_as_pair() {
        let json = serde_json::to_string(&PageFormat::new(100.0, 50.0)).unwrap();
        assert_eq!(json, "[100.0,50.0]");
        let back: PageFormat = serde_json::from_str("[62, 29]").unwrap();
        assert_eq!(back, PageFormat::new(62.0, 29.0));
    }
}
