//! Layout config – positioned label pages, in points, as handed from
//! pagination to the PDF writer. Serialisable so a composed document can be
//! inspected or re-rendered without the markup.

use serde::{Deserialize, Serialize};

/// Every physical page of a composed label document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// PDF metadata title.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Page size in points; all pages share it.
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub pages: Vec<PageLayout>,
}

/// One physical page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A box at absolute page coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Top-left corner, y growing downwards.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Borders::is_empty")]
    pub borders: Borders,

    /// At most one of these is set.
    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    pub children: Vec<LayoutBox>,
}

/// Visible border sides; absent sides are not drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Borders {
    pub top: Option<BorderLine>,
    pub right: Option<BorderLine>,
    pub bottom: Option<BorderLine>,
    pub left: Option<BorderLine>,
}

impl Borders {
    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderLine {
    pub width: f32,
    pub pattern: LinePattern,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinePattern {
    Solid,
    Dashed,
    Dotted,
    Double,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Lines as wrapped by the layout pass.
    pub lines: Vec<TextLine>,
    /// `helvetica` or `courier`.
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
    pub line_height: f32,
    /// Baseline distance below the top of each line.
    pub ascent: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// Left inset inside the box, padding and alignment included.
    pub x_offset: f32,
    /// Top of the line relative to the box.
    pub y_offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutConfig {
    /// An empty document of the given page size in millimetres.
    pub fn with_page_mm(width_mm: f32, height_mm: f32) -> Self {
        Self {
            title: Self::default_title(),
            page_width_pt: width_mm * crate::style::MM_TO_PT,
            page_height_pt: height_mm * crate::style::MM_TO_PT,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        crate::theme::APP_NAME.to_string()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            borders: Borders::default(),
            text: None,
            image: None,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_in_points() {
        let config = LayoutConfig::with_page_mm(100.0, 100.0);
        assert!((config.page_width_pt - 283.46).abs() < 0.01);
        assert_eq!(config.title, "SGLMS Label Printer");
    }

    #[test]
    fn json_keeps_borders() {
        let mut config = LayoutConfig::with_page_mm(100.0, 50.0);
        let mut lbox = LayoutBox::new(1.0, 2.0, 3.0, 4.0);
        lbox.borders.top = Some(BorderLine {
            width: 0.75,
            pattern: LinePattern::Dashed,
            color: [0.0, 0.0, 0.0, 1.0],
        });
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![lbox, LayoutBox::new(0.0, 0.0, 1.0, 1.0)],
        });

        let json = config.to_json();
        assert!(json.contains("\"dashed\""));
        let back = LayoutConfig::from_json(&json).unwrap();
        assert_eq!(back.pages[0].boxes[0].borders, config.pages[0].boxes[0].borders);
        assert!(back.pages[0].boxes[1].borders.is_empty());
    }
}
