//! Code-128 / GS1-128 barcode encoder rendering PNG rasters with `image`.
//!
//! Code sets B and C are used, switching to C for runs of four or more
//! digits. GS1-128 symbols start with FNC1 and encode every GS separator in
//! the data as FNC1.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::{GrayImage, ImageFormat, Luma};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gs1::GS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbology {
    Code128,
    Gs1128,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("nothing to encode")]
    Empty,

    #[error("character {0:?} cannot be encoded in Code-128 set B/C")]
    UnsupportedChar(char),

    #[error("image encoding failed: {0}")]
    Image(String),
}

/// Black-box encoder of a data string into raster image bytes.
pub trait BarcodeEncoder: Send + Sync {
    /// Encode `data` and return PNG bytes. Must be deterministic.
    fn encode(&self, data: &str, symbology: Symbology) -> Result<Vec<u8>, EncodeError>;
}

/// Built-in Code-128 encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code128Encoder {
    /// Pixels per module (narrowest bar).
    pub module_px: u32,
    /// Bar height in pixels.
    pub height_px: u32,
    /// Quiet zone on each side, in modules.
    pub quiet_modules: u32,
}

impl Default for Code128Encoder {
    fn default() -> Self {
        Self {
            module_px: 2,
            height_px: 60,
            quiet_modules: 10,
        }
    }
}

impl BarcodeEncoder for Code128Encoder {
    fn encode(&self, data: &str, symbology: Symbology) -> Result<Vec<u8>, EncodeError> {
        let bars = modules(data, symbology)?;
        let module = self.module_px.max(1);
        let quiet = self.quiet_modules;
        let width = (bars.len() as u32 + 2 * quiet) * module;
        let height = self.height_px.max(1);

        let img = GrayImage::from_fn(width, height, |x, _| {
            let m = (x / module) as i64 - quiet as i64;
            let dark = m >= 0 && bars.get(m as usize).copied().unwrap_or(false);
            Luma([if dark { 0 } else { 255 }])
        });

        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .map_err(|e| EncodeError::Image(e.to_string()))?;
        Ok(out)
    }
}

/// Wrap PNG bytes in a `data:` URI.
pub fn data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64_STD.encode(png))
}

// ---------------------------------------------------------------------------
// Symbol construction
// ---------------------------------------------------------------------------

const START_B: u8 = 104;
const START_C: u8 = 105;
const CODE_B: u8 = 100;
const CODE_C: u8 = 99;
const FNC1: u8 = 102;

/// Bar/space widths for symbol values 0..=105.
const PATTERNS: [[u8; 6]; 106] = [
    [2, 1, 2, 2, 2, 2], [2, 2, 2, 1, 2, 2], [2, 2, 2, 2, 2, 1], [1, 2, 1, 2, 2, 3],
    [1, 2, 1, 3, 2, 2], [1, 3, 1, 2, 2, 2], [1, 2, 2, 2, 1, 3], [1, 2, 2, 3, 1, 2],
    [1, 3, 2, 2, 1, 2], [2, 2, 1, 2, 1, 3], [2, 2, 1, 3, 1, 2], [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2], [1, 2, 2, 1, 3, 2], [1, 2, 2, 2, 3, 1], [1, 1, 3, 2, 2, 2],
    [1, 2, 3, 1, 2, 2], [1, 2, 3, 2, 2, 1], [2, 2, 3, 2, 1, 1], [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1], [2, 1, 3, 2, 1, 2], [2, 2, 3, 1, 1, 2], [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2], [3, 2, 1, 1, 2, 2], [3, 2, 1, 2, 2, 1], [3, 1, 2, 2, 1, 2],
    [3, 2, 2, 1, 1, 2], [3, 2, 2, 2, 1, 1], [2, 1, 2, 1, 2, 3], [2, 1, 2, 3, 2, 1],
    [2, 3, 2, 1, 2, 1], [1, 1, 1, 3, 2, 3], [1, 3, 1, 1, 2, 3], [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3], [1, 3, 2, 1, 1, 3], [1, 3, 2, 3, 1, 1], [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3], [2, 3, 1, 3, 1, 1], [1, 1, 2, 1, 3, 3], [1, 1, 2, 3, 3, 1],
    [1, 3, 2, 1, 3, 1], [1, 1, 3, 1, 2, 3], [1, 1, 3, 3, 2, 1], [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1], [2, 1, 1, 3, 3, 1], [2, 3, 1, 1, 3, 1], [2, 1, 3, 1, 1, 3],
    [2, 1, 3, 3, 1, 1], [2, 1, 3, 1, 3, 1], [3, 1, 1, 1, 2, 3], [3, 1, 1, 3, 2, 1],
    [3, 3, 1, 1, 2, 1], [3, 1, 2, 1, 1, 3], [3, 1, 2, 3, 1, 1], [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1], [2, 2, 1, 4, 1, 1], [4, 3, 1, 1, 1, 1], [1, 1, 1, 2, 2, 4],
    [1, 1, 1, 4, 2, 2], [1, 2, 1, 1, 2, 4], [1, 2, 1, 4, 2, 1], [1, 4, 1, 1, 2, 2],
    [1, 4, 1, 2, 2, 1], [1, 1, 2, 2, 1, 4], [1, 1, 2, 4, 1, 2], [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1], [1, 4, 2, 1, 1, 2], [1, 4, 2, 2, 1, 1], [2, 4, 1, 2, 1, 1],
    [2, 2, 1, 1, 1, 4], [4, 1, 3, 1, 1, 1], [2, 4, 1, 1, 1, 2], [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2], [1, 2, 1, 1, 4, 2], [1, 2, 1, 2, 4, 1], [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2], [1, 2, 4, 2, 1, 1], [4, 1, 1, 2, 1, 2], [4, 2, 1, 1, 1, 2],
    [4, 2, 1, 2, 1, 1], [2, 1, 2, 1, 4, 1], [2, 1, 4, 1, 2, 1], [4, 1, 2, 1, 2, 1],
    [1, 1, 1, 1, 4, 3], [1, 1, 1, 3, 4, 1], [1, 3, 1, 1, 4, 1], [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1], [4, 1, 1, 1, 1, 3], [4, 1, 1, 3, 1, 1], [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1], [3, 1, 1, 1, 4, 1], [4, 1, 1, 1, 3, 1], [2, 1, 1, 4, 1, 2],
    [2, 1, 1, 2, 1, 4], [2, 1, 1, 2, 3, 2],
];

const STOP_PATTERN: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    B,
    C,
}

/// Symbol values for `data`, start code through check character (no STOP).
pub fn symbol_values(data: &str, symbology: Symbology) -> Result<Vec<u8>, EncodeError> {
    let gs1 = symbology == Symbology::Gs1128;
    let bytes = data.as_bytes();
    if bytes.is_empty() {
        return Err(EncodeError::Empty);
    }
    if let Some(c) = data
        .chars()
        .find(|&c| !(c == ' ' || c.is_ascii_graphic() || (gs1 && c == GS)))
    {
        return Err(EncodeError::UnsupportedChar(c));
    }

    let digit_run = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let lead = digit_run(0);
    let mut set = if lead >= 4 || (lead >= 2 && lead == bytes.len() && lead % 2 == 0) {
        CodeSet::C
    } else {
        CodeSet::B
    };
    let mut values = vec![match set {
        CodeSet::B => START_B,
        CodeSet::C => START_C,
    }];
    if gs1 {
        values.push(FNC1);
    }

    let mut i = 0;
    while i < bytes.len() {
        if gs1 && bytes[i] == GS as u8 {
            values.push(FNC1);
            i += 1;
            continue;
        }
        match set {
            CodeSet::C => {
                if digit_run(i) >= 2 {
                    values.push((bytes[i] - b'0') * 10 + (bytes[i + 1] - b'0'));
                    i += 2;
                } else {
                    values.push(CODE_B);
                    set = CodeSet::B;
                }
            }
            CodeSet::B => {
                let run = digit_run(i);
                if run >= 4 && run % 2 == 0 {
                    values.push(CODE_C);
                    set = CodeSet::C;
                } else {
                    values.push(bytes[i] - 32);
                    i += 1;
                }
            }
        }
    }

    let checksum = values
        .iter()
        .enumerate()
        .map(|(pos, &v)| pos.max(1) as u32 * v as u32)
        .sum::<u32>()
        % 103;
    values.push(checksum as u8);
    Ok(values)
}

/// Module sequence (true = bar) for the full symbol including STOP.
pub fn modules(data: &str, symbology: Symbology) -> Result<Vec<bool>, EncodeError> {
    let values = symbol_values(data, symbology)?;
    let mut out = Vec::with_capacity(values.len() * 11 + 13);
    let widths = values
        .iter()
        .flat_map(|&v| PATTERNS[v as usize].iter())
        .chain(STOP_PATTERN.iter());
    for (i, &w) in widths.enumerate() {
        let bar = i % 2 == 0;
        out.extend(std::iter::repeat(bar).take(w as usize));
    }
    Ok(out)
}
