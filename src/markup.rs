//! Layout renderer – maps a [`LabelLayout`] to the label's markup tree.
//!
//! Rendering is pure: the only collaborator is the [`BarcodeEncoder`], which
//! must itself be deterministic, so the same label always yields the same
//! HTML.

use crate::barcode::{data_uri, BarcodeEncoder, Code128Encoder, Symbology};
use crate::dom::{div, img, span, text_div, DomNode, ElementNode};
use crate::error::Result;
use crate::label::{LabelLayout, LabelModel, Region, UnitWeight};
use crate::theme::{ImagePreset, LabelTheme};

const NBSP: &str = "\u{00A0}";

/// One label's page fragment, ready to be committed to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLabel {
    pub number: u64,
    pub html: String,
}

/// Theme-parameterised renderer shared by every label of a document.
#[derive(Debug, Clone)]
pub struct LayoutRenderer<E: BarcodeEncoder = Code128Encoder> {
    theme: LabelTheme,
    encoder: E,
}

impl Default for LayoutRenderer {
    fn default() -> Self {
        Self::new(LabelTheme::default())
    }
}

impl LayoutRenderer {
    pub fn new(theme: LabelTheme) -> Self {
        Self::with_encoder(theme, Code128Encoder::default())
    }
}

impl<E: BarcodeEncoder> LayoutRenderer<E> {
    pub fn with_encoder(theme: LabelTheme, encoder: E) -> Self {
        Self { theme, encoder }
    }

    pub fn theme(&self) -> &LabelTheme {
        &self.theme
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Lay out and render one label.
    pub fn render(&self, label: &LabelModel) -> Result<RenderedLabel> {
        let layout = label.compute_layout_with(&self.theme, None);
        let root = self.render_layout(&layout)?;
        Ok(RenderedLabel {
            number: label.number(),
            html: root.to_html(),
        })
    }

    /// Markup tree for an already computed layout.
    pub fn render_layout(&self, layout: &LabelLayout) -> Result<ElementNode> {
        let regions = layout
            .regions
            .iter()
            .map(|region| self.region_node(region))
            .collect::<Result<Vec<_>>>()?;
        Ok(div("label", regions))
    }

    fn region_node(&self, region: &Region) -> Result<DomNode> {
        let node = match region {
            Region::Barcode { data, image } => div(
                "barcode",
                [self.barcode(data, Symbology::Code128, image)?.into()],
            ),
            Region::SerialNumber { text, class } => text_div(&format!("number {class}"), text),
            Region::ClientName { text, class } => text_div(&format!("client {class}"), text),
            Region::ProductName { text, class } => text_div(&format!("product {class}"), text),
            Region::Timestamp { text, class } => {
                div("p-1", [text_div(&format!("date {class}"), text).into()])
                    .style("border-top:1px dashed black;")
            }
            Region::Sku { value: Some(sku) } => div(
                "text-sm text-right",
                [
                    text_div("", "SKU").style("width:20%; float:left;").into(),
                    text_div("", sku)
                        .style("width:79%;float:left;font-weight:bold;")
                        .into(),
                ],
            )
            .style("border-top:2px double black;"),
            Region::Sku { value: None } | Region::UnitWeight { row: None } => placeholder(),
            Region::UnitWeight { row: Some(row) } => unit_weight_row(row),
            Region::Gs1Tag { data, text, image } => div(
                "text-sm border",
                [
                    div(
                        "text-center p-1",
                        [self.barcode(data, Symbology::Gs1128, image)?.class("w-full").into()],
                    )
                    .into(),
                    text_div("text-center text-2xs font-semibold", text).into(),
                ],
            ),
            Region::GtinTag { gtin, image } => div(
                "text-sm border",
                [
                    text_div("text-xs", "GTIN-14:").into(),
                    div(
                        "text-center",
                        [self.barcode(&format!("01{gtin}"), Symbology::Gs1128, image)?.into()],
                    )
                    .into(),
                    text_div("font-semibold text-center text-sm mono", gtin).into(),
                ],
            ),
            Region::Attribution { text } => {
                text_div("", text).style("font-size:8px; text-align:right;")
            }
        };
        Ok(node.into())
    }

    fn barcode(&self, data: &str, symbology: Symbology, preset: &ImagePreset) -> Result<ElementNode> {
        let png = self.encoder.encode(data, symbology)?;
        Ok(img(data_uri(&png)).style(&preset.css()))
    }
}

/// Empty row keeping the vertical rhythm of labels without the field.
fn placeholder() -> ElementNode {
    text_div("", NBSP)
}

fn unit_weight_row(row: &UnitWeight) -> ElementNode {
    div(
        "text-sm",
        [
            text_div("", "Units / Weight")
                .style("width:35%; float:left;")
                .into(),
            div(
                "text-right",
                [
                    DomNode::text(row.breakdown()),
                    span("text-right font-bold", row.total_text()).into(),
                ],
            )
            .style("width:64%;float:left;")
            .into(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::EncodeError;
    use crate::error::LabelError;

    /// Encoder returning a fixed one-pixel image.
    struct StubEncoder;

    impl BarcodeEncoder for StubEncoder {
        fn encode(&self, data: &str, _: Symbology) -> std::result::Result<Vec<u8>, EncodeError> {
            if data.is_empty() {
                return Err(EncodeError::Empty);
            }
            Ok(vec![1, 2, 3])
        }
    }

    struct FailingEncoder;

    impl BarcodeEncoder for FailingEncoder {
        fn encode(&self, _: &str, _: Symbology) -> std::result::Result<Vec<u8>, EncodeError> {
            Err(EncodeError::UnsupportedChar('é'))
        }
    }

    fn stub() -> LayoutRenderer<StubEncoder> {
        LayoutRenderer::with_encoder(LabelTheme::default(), StubEncoder)
    }

    #[test]
    fn root_carries_every_default_region() {
        let label = LabelModel::new(42).unwrap();
        let html = stub().render(&label).unwrap().html;
        assert!(html.starts_with("<div class=\"label\">"));
        assert!(html.contains("<div class=\"barcode\"><img src=\"data:image/png;base64,AQID\" style=\"width:85mm;height:8mm;\" /></div>"));
        assert!(html.contains("<div class=\"number text-3xl\">42</div>"));
        assert!(html.contains("style=\"border-top:1px dashed black;\""));
        assert!(html.contains("<div class=\"text-center text-2xs font-semibold\">(01)"));
        assert!(html.contains("SGLMS Label Printer</div>"));
    }

    #[test]
    fn missing_rows_render_placeholders() {
        let label = LabelModel::new(42).unwrap();
        let html = stub().render(&label).unwrap().html;
        assert_eq!(html.matches("<div>&nbsp;</div>").count(), 2);
        assert!(!html.contains("SKU"));
    }

    #[test]
    fn weight_row_emphasises_total() {
        let mut label = LabelModel::new(42).unwrap();
        label.set_measures(9.3, 3.0).unwrap();
        let html = stub().render(&label).unwrap().html;
        assert!(html.contains("3 x 3.1Kg = <span class=\"text-right font-bold\">9.3Kg</span>"));
    }

    #[test]
    fn gtin_tag_when_themed_in() {
        let mut theme = LabelTheme::default();
        theme.regions.push(crate::theme::RegionKind::GtinTag);
        let renderer = LayoutRenderer::with_encoder(theme, StubEncoder);
        let html = renderer.render(&LabelModel::new(7).unwrap()).unwrap().html;
        assert!(html.contains("GTIN-14:"));
        assert!(html.contains("font-semibold text-center text-sm mono"));
    }

    #[test]
    fn encoder_failure_is_a_render_failure() {
        let renderer = LayoutRenderer::with_encoder(LabelTheme::default(), FailingEncoder);
        let err = renderer.render(&LabelModel::new(1).unwrap()).unwrap_err();
        assert!(matches!(err, LabelError::RenderFailure(_)));
    }

    #[test]
    fn real_encoder_output_is_stable() {
        let renderer = LayoutRenderer::default();
        let label = LabelModel::new(123456789).unwrap();
        assert_eq!(renderer.render(&label).unwrap(), renderer.render(&label).unwrap());
    }
}
