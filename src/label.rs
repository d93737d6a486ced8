//! Label model – one printable label and the layout tree derived from it.
//!
//! [`LabelModel`] validates identifiers at construction (the GTIN is built
//! eagerly) and owns the GS1 payload. [`LabelModel::compute_layout`] is a pure
//! function of the model and a [`LabelTheme`]; rendering it to markup is the
//! job of [`crate::markup::LayoutRenderer`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{LabelError, Result};
use crate::gs1::Gs1Payload;
use crate::gtin::{CheckDigit, Gtin, GtinFormat};
use crate::locale::date_formatter;
use crate::printer::{Printer, PrinterConfig};
use crate::theme::{ImagePreset, LabelTheme, RegionKind, APP_NAME};

pub const DEFAULT_PRODUCT_ID: &str = "1";
pub const DEFAULT_CLIENT_ID: &str = "CLIENTID";
pub const DEFAULT_PRODUCT_NAME: &str = "PRODUCT NAME";
pub const DEFAULT_PAGE_SIZE: f64 = 100.0;

/// All fields of one label.
#[derive(Debug, Clone)]
pub struct LabelModel {
    number: u64,
    product_id: String,
    client_id: String,
    gtin: Gtin,
    gs1: Gs1Payload,
    gross_weight: f64,
    unit_count: f64,

    pub product_name: String,
    pub client_name: String,
    pub sku: String,
    pub generator: String,
    pub timestamp: DateTime<Utc>,
    /// Page width in the document's length unit (mm).
    pub page_width: f64,
    pub page_height: f64,
    /// Preferred language for the date, e.g. an `Accept-Language` value.
    pub locale: Option<String>,
}

impl LabelModel {
    /// Label with every optional field defaulted.
    pub fn new(number: u64) -> Result<Self> {
        Self::builder(number).build()
    }

    pub fn create(
        number: u64,
        product_id: Option<&str>,
        client_id: Option<&str>,
        product_name: Option<&str>,
        client_name: Option<&str>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let client_id = client_id.unwrap_or(DEFAULT_CLIENT_ID);
        let product_id = product_id.unwrap_or(DEFAULT_PRODUCT_ID);
        if number == 0 {
            return Err(LabelError::InvalidNumber(number));
        }
        let gtin = Gtin::create(product_id, client_id, GtinFormat::Gtin14, CheckDigit::Compute)
            .map_err(LabelError::InvalidIdentifier)?;
        let client_name = match client_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => client_id.to_string(),
        };

        Ok(Self {
            number,
            product_id: product_id.to_string(),
            client_id: client_id.to_string(),
            gs1: Gs1Payload::from_gtin(&gtin),
            gtin,
            gross_weight: 0.0,
            unit_count: 0.0,
            product_name: product_name.unwrap_or(DEFAULT_PRODUCT_NAME).to_string(),
            client_name,
            sku: number.to_string(),
            generator: APP_NAME.to_string(),
            timestamp: timestamp.unwrap_or_else(Utc::now),
            page_width: DEFAULT_PAGE_SIZE,
            page_height: DEFAULT_PAGE_SIZE,
            locale: None,
        })
    }

    pub fn builder(number: u64) -> LabelBuilder {
        LabelBuilder {
            number,
            ..LabelBuilder::default()
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn gtin(&self) -> &Gtin {
        &self.gtin
    }

    pub fn gs1(&self) -> &Gs1Payload {
        &self.gs1
    }

    /// Gross weight in kg.
    pub fn gross_weight(&self) -> f64 {
        self.gross_weight
    }

    pub fn unit_count(&self) -> f64 {
        self.unit_count
    }

    /// Set weight and unit count by hand; both must be finite and non-negative.
    pub fn set_measures(&mut self, gross_weight: f64, unit_count: f64) -> Result<()> {
        for (name, value) in [("gross weight", gross_weight), ("unit count", unit_count)] {
            if !value.is_finite() || value < 0.0 {
                return Err(LabelError::InvalidMeasure(format!("{name} {value}")));
            }
        }
        self.gross_weight = gross_weight;
        self.unit_count = unit_count;
        Ok(())
    }

    /// Replace GTIN, GS1 payload, weight and unit count from a GS1-128
    /// element string. On error the model is unchanged.
    pub fn ingest_gs1(&mut self, raw: &str) -> Result<()> {
        let payload = Gs1Payload::parse(raw).map_err(LabelError::MalformedGs1Payload)?;
        log::debug!("label {}: ingested GS1 {payload}", self.number);
        self.gtin = payload.gtin().clone();
        self.gross_weight = payload.gross_weight();
        self.unit_count = payload.unit_count();
        self.gs1 = payload;
        Ok(())
    }

    /// Layout tree under the default theme.
    ///
    /// `max_product_width` caps the product name in characters; `None` (or
    /// zero) uses 0.8 × the shorter page side.
    pub fn compute_layout(&self, max_product_width: Option<usize>) -> LabelLayout {
        self.compute_layout_with(&LabelTheme::default(), max_product_width)
    }

    pub fn compute_layout_with(
        &self,
        theme: &LabelTheme,
        max_product_width: Option<usize>,
    ) -> LabelLayout {
        let compact = theme.is_compact(self.page_width, self.page_height);
        let product_width = max_product_width
            .filter(|w| *w > 0)
            .unwrap_or_else(|| {
                char_budget(self.page_width.min(self.page_height), theme.product_name_ratio)
            });
        let client_width = char_budget(self.page_width, theme.client_name_ratio);

        let regions = theme
            .regions
            .iter()
            .map(|kind| match kind {
                RegionKind::Barcode => Region::Barcode {
                    data: self.number.to_string(),
                    image: theme.barcode.pick(self.page_height),
                },
                RegionKind::SerialNumber => {
                    let text = self.number.to_string();
                    let class = theme.serial_tier(text.len(), compact).to_string();
                    Region::SerialNumber { text, class }
                }
                RegionKind::ClientName => Region::ClientName {
                    text: truncate(&self.client_name, client_width),
                    class: theme.client_tier.pick(compact).to_string(),
                },
                RegionKind::ProductName => Region::ProductName {
                    text: truncate(&self.product_name, product_width),
                    class: theme.product_tier.pick(compact).to_string(),
                },
                RegionKind::Timestamp => Region::Timestamp {
                    text: date_formatter(
                        &self.timestamp,
                        self.locale.as_deref(),
                        Some(theme.fallback_locale.as_str()),
                        Some(theme.timezone.as_str()),
                    ),
                    class: theme.date_tier.pick(compact).to_string(),
                },
                RegionKind::Sku => Region::Sku {
                    value: self.independent_sku().map(str::to_string),
                },
                RegionKind::UnitWeight => Region::UnitWeight {
                    row: self.unit_weight(),
                },
                RegionKind::Gs1Tag => Region::Gs1Tag {
                    data: self.gs1.barcode_data(),
                    text: self.gs1.to_string(),
                    image: theme.gs1_barcode.pick(self.page_height),
                },
                RegionKind::GtinTag => Region::GtinTag {
                    gtin: self.gtin.to_gtin14(),
                    image: theme.gtin_barcode,
                },
                RegionKind::Attribution => Region::Attribution {
                    text: format!("{} / {}", self.generator, theme.app_name),
                },
            })
            .collect();

        LabelLayout {
            page_width: self.page_width,
            page_height: self.page_height,
            compact,
            regions,
        }
    }

    /// A one-page PDF of this label alone.
    pub fn to_pdf(&self, config: PrinterConfig) -> Result<Vec<u8>> {
        let mut printer = Printer::new(config);
        printer.add_label(self)?;
        printer.output()
    }

    fn independent_sku(&self) -> Option<&str> {
        let sku = self.sku.as_str();
        (!sku.is_empty() && sku != self.number.to_string()).then_some(sku)
    }

    fn unit_weight(&self) -> Option<UnitWeight> {
        if self.unit_count == 0.0 {
            return None;
        }
        if self.gross_weight == 0.0 {
            log::warn!(
                "label {}: {} units without a gross weight",
                self.number,
                self.unit_count
            );
        }
        Some(UnitWeight {
            units: self.unit_count,
            per_unit: round1(self.gross_weight / self.unit_count),
            total: self.gross_weight,
        })
    }
}

/// Optional-argument builder for [`LabelModel::create`].
#[derive(Debug, Clone, Default)]
pub struct LabelBuilder {
    number: u64,
    product_id: Option<String>,
    client_id: Option<String>,
    product_name: Option<String>,
    client_name: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    sku: Option<String>,
    generator: Option<String>,
    page_size: Option<(f64, f64)>,
    locale: Option<String>,
}

impl LabelBuilder {
    pub fn product_id(mut self, id: impl Into<String>) -> Self {
        self.product_id = Some(id.into());
        self
    }

    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    pub fn page_size(mut self, width: f64, height: f64) -> Self {
        self.page_size = Some((width, height));
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn build(self) -> Result<LabelModel> {
        let mut label = LabelModel::create(
            self.number,
            self.product_id.as_deref(),
            self.client_id.as_deref(),
            self.product_name.as_deref(),
            self.client_name.as_deref(),
            self.timestamp,
        )?;
        if let Some(sku) = self.sku {
            label.sku = sku;
        }
        if let Some(generator) = self.generator {
            label.generator = generator;
        }
        if let Some((width, height)) = self.page_size {
            if !(width > 0.0 && height > 0.0) {
                return Err(LabelError::InvalidMeasure(format!(
                    "page size {width}x{height}"
                )));
            }
            label.page_width = width;
            label.page_height = height;
        }
        label.locale = self.locale;
        Ok(label)
    }
}

// ---------------------------------------------------------------------------
// Layout tree
// ---------------------------------------------------------------------------

/// Ordered regions of one label, with display strings already computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelLayout {
    pub page_width: f64,
    pub page_height: f64,
    /// Page below the theme's size threshold.
    pub compact: bool,
    pub regions: Vec<Region>,
}

impl LabelLayout {
    pub fn region(&self, kind: RegionKind) -> Option<&Region> {
        self.regions.iter().find(|r| r.kind() == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "region", rename_all = "kebab-case")]
pub enum Region {
    Barcode {
        data: String,
        image: ImagePreset,
    },
    SerialNumber {
        text: String,
        class: String,
    },
    ClientName {
        text: String,
        class: String,
    },
    ProductName {
        text: String,
        class: String,
    },
    Timestamp {
        text: String,
        class: String,
    },
    /// `None` renders a placeholder row.
    Sku {
        value: Option<String>,
    },
    UnitWeight {
        row: Option<UnitWeight>,
    },
    Gs1Tag {
        /// GS1-128 symbol data.
        data: String,
        /// Bracketed human-readable form.
        text: String,
        image: ImagePreset,
    },
    GtinTag {
        gtin: String,
        image: ImagePreset,
    },
    Attribution {
        text: String,
    },
}

impl Region {
    pub fn kind(&self) -> RegionKind {
        match self {
            Region::Barcode { .. } => RegionKind::Barcode,
            Region::SerialNumber { .. } => RegionKind::SerialNumber,
            Region::ClientName { .. } => RegionKind::ClientName,
            Region::ProductName { .. } => RegionKind::ProductName,
            Region::Timestamp { .. } => RegionKind::Timestamp,
            Region::Sku { .. } => RegionKind::Sku,
            Region::UnitWeight { .. } => RegionKind::UnitWeight,
            Region::Gs1Tag { .. } => RegionKind::Gs1Tag,
            Region::GtinTag { .. } => RegionKind::GtinTag,
            Region::Attribution { .. } => RegionKind::Attribution,
        }
    }
}

/// Units / weight row. `per_unit` is rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitWeight {
    pub units: f64,
    pub per_unit: f64,
    pub total: f64,
}

impl UnitWeight {
    /// Left part of the row, before the emphasised total.
    pub fn breakdown(&self) -> String {
        format!("{} x {}Kg = ", self.units, self.per_unit)
    }

    pub fn total_text(&self) -> String {
        format!("{}Kg", self.total)
    }

    pub fn display(&self) -> String {
        format!("{}{}", self.breakdown(), self.total_text())
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn char_budget(length: f64, ratio: f64) -> usize {
    (length * ratio).round().max(0.0) as usize
}

/// Hard cut after `max` characters.
fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
