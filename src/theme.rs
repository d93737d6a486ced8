//! Label theme – the parameters that distinguish one label skin from another.
//!
//! A theme fixes region order, typography tiers, truncation ratios, barcode
//! image presets and the baked-in stylesheet. Alternate skins are plain JSON.

use serde::{Deserialize, Serialize};

use crate::error::{LabelError, Result};
use crate::locale::{DEFAULT_LOCALE, DEFAULT_TIMEZONE};

/// Application name appended to every attribution footer.
pub const APP_NAME: &str = "SGLMS Label Printer";

/// The regions a label layout can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionKind {
    Barcode,
    SerialNumber,
    ClientName,
    ProductName,
    Timestamp,
    Sku,
    UnitWeight,
    Gs1Tag,
    /// GTIN-14 barcode with its digits; not in the default order.
    GtinTag,
    Attribution,
}

/// Class used on regular pages and on pages under the size threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPair {
    pub regular: String,
    pub compact: String,
}

impl TierPair {
    fn new(regular: &str, compact: &str) -> Self {
        Self {
            regular: regular.to_string(),
            compact: compact.to_string(),
        }
    }

    pub fn pick(&self, compact: bool) -> &str {
        if compact {
            &self.compact
        } else {
            &self.regular
        }
    }
}

/// Printed size of a barcode image, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePreset {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl ImagePreset {
    pub const fn new(width_mm: f64, height_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }

    /// Inline style fixing the printed size.
    pub fn css(&self) -> String {
        format!("width:{}mm;height:{}mm;", self.width_mm, self.height_mm)
    }
}

/// Two image presets keyed on the label's page height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetPair {
    pub threshold: f64,
    /// Whether a height equal to the threshold selects `tall`.
    pub inclusive: bool,
    pub tall: ImagePreset,
    pub short: ImagePreset,
}

impl PresetPair {
    pub fn pick(&self, page_height: f64) -> ImagePreset {
        let tall = if self.inclusive {
            page_height >= self.threshold
        } else {
            page_height > self.threshold
        };
        if tall {
            self.tall
        } else {
            self.short
        }
    }
}

/// Everything that parameterises the layout of a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelTheme {
    pub regions: Vec<RegionKind>,
    /// Serial-number classes from largest to smallest. One step down for a
    /// long serial, one more for a compact page.
    pub serial_tiers: Vec<String>,
    pub client_tier: TierPair,
    pub product_tier: TierPair,
    pub date_tier: TierPair,
    /// Pages narrower or shorter than this use compact typography.
    pub compact_below: f64,
    /// Serials with more digits than this drop one tier.
    pub serial_digit_limit: usize,
    pub client_name_ratio: f64,
    pub product_name_ratio: f64,
    pub barcode: PresetPair,
    pub gs1_barcode: PresetPair,
    pub gtin_barcode: ImagePreset,
    pub fallback_locale: String,
    pub timezone: String,
    pub app_name: String,
    /// Stylesheet handed to the compositor ahead of any user CSS.
    pub stylesheet: String,
}

impl Default for LabelTheme {
    fn default() -> Self {
        Self {
            regions: vec![
                RegionKind::Barcode,
                RegionKind::SerialNumber,
                RegionKind::ClientName,
                RegionKind::ProductName,
                RegionKind::Timestamp,
                RegionKind::Sku,
                RegionKind::UnitWeight,
                RegionKind::Gs1Tag,
                RegionKind::Attribution,
            ],
            serial_tiers: vec![
                "text-3xl".to_string(),
                "text-2xl".to_string(),
                "text-xl".to_string(),
            ],
            client_tier: TierPair::new("text-xl", "text-lg"),
            product_tier: TierPair::new("text-lg", "text-md"),
            date_tier: TierPair::new("text-lg", "text-base"),
            compact_below: 100.0,
            serial_digit_limit: 9,
            client_name_ratio: 0.32,
            product_name_ratio: 0.8,
            barcode: PresetPair {
                threshold: 100.0,
                inclusive: true,
                tall: ImagePreset::new(85.0, 8.0),
                short: ImagePreset::new(80.0, 7.0),
            },
            gs1_barcode: PresetPair {
                threshold: 100.0,
                inclusive: false,
                tall: ImagePreset::new(100.0, 10.0),
                short: ImagePreset::new(90.0, 7.0),
            },
            gtin_barcode: ImagePreset::new(60.0, 8.0),
            fallback_locale: DEFAULT_LOCALE.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            app_name: APP_NAME.to_string(),
            stylesheet: DEFAULT_STYLESHEET.to_string(),
        }
    }
}

impl LabelTheme {
    pub fn is_compact(&self, page_width: f64, page_height: f64) -> bool {
        page_width < self.compact_below || page_height < self.compact_below
    }

    /// Class for a serial number of `digits` digits on the given page.
    pub fn serial_tier(&self, digits: usize, compact: bool) -> &str {
        let step = usize::from(digits > self.serial_digit_limit) + usize::from(compact);
        self.serial_tiers
            .get(step)
            .or_else(|| self.serial_tiers.last())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LabelError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Base label styles. Utility classes (`text-sm`, `p-1`, …) are resolved by
/// the compositor; this sheet covers the label-specific classes.
pub const DEFAULT_STYLESHEET: &str = r#"
body { font-family: Helvetica; font-size: 12px; line-height: 1.2; }
.label { text-align: center; }
.barcode { text-align: center; padding-top: 2px; }
.number { font-weight: bold; text-align: center; }
.client { font-weight: bold; text-align: center; }
.product { text-align: center; }
.date { text-align: center; }
.mono { font-family: Courier; }
.text-2xs { font-size: 8px; }
.text-md { font-size: 16px; }
.font-semibold { font-weight: bold; }
.border { border: 1px solid black; }
"#;
