//! Text measurement with the PDF builtin font metrics.
//!
//! Labels are drawn with Helvetica, Helvetica-Bold and Courier, which every
//! PDF reader ships, so nothing is embedded. Advance widths come from the
//! Adobe AFM files (units per 1000 em) for printable ASCII; other characters
//! use an average advance.

use crate::style::{ComputedStyle, FontFamily, FontStyle, FontWeight};

const UNITS_PER_EM: f32 = 1000.0;

/// Helvetica advances for U+0020..=U+007E.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advances for U+0020..=U+007E.
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const COURIER_ADVANCE: u16 = 600;

/// A builtin face: family plus weight and slant.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn from_style(style: &ComputedStyle) -> Self {
        Self {
            family: style.font_family,
            bold: style.font_weight == FontWeight::Bold,
            italic: style.font_style == FontStyle::Italic,
        }
    }

    /// Advance of one character in 1/1000 em. Slanted faces share the
    /// upright metrics.
    fn advance(&self, c: char) -> u16 {
        if self.family == FontFamily::Courier {
            return COURIER_ADVANCE;
        }
        let table = if self.bold { &HELVETICA_BOLD } else { &HELVETICA };
        let c = if c == '\u{00A0}' { ' ' } else { c };
        match (c as u32).checked_sub(0x20) {
            Some(i) if (i as usize) < table.len() => table[i as usize],
            _ if self.bold => 611,
            _ => 556,
        }
    }

    /// Ascender height as a fraction of the font size.
    pub fn ascender(&self) -> f32 {
        match self.family {
            FontFamily::Helvetica => 0.718,
            FontFamily::Courier => 0.629,
        }
    }

    /// Width of `text` at `font_size` points.
    pub fn measure(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.advance(c) as u32).sum();
        units as f32 * font_size / UNITS_PER_EM
    }
}

/// Line box height in points.
pub fn line_height_pt(font_size: f32, line_height_factor: f32) -> f32 {
    font_size * line_height_factor
}

/// Word-wrap text to fit within `max_width` points. Words wider than a line
/// are broken between characters.
pub fn wrap_text(text: &str, key: FontKey, font_size: f32, max_width: f32) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_ascii_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in words {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if key.measure(&candidate, font_size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if key.measure(word, font_size) <= max_width {
                current = word.to_string();
                continue;
            }
            for c in word.chars() {
                current.push(c);
                if key.measure(&current, font_size) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const SANS: FontKey = FontKey {
        family: FontFamily::Helvetica,
        bold: false,
        italic: false,
    };

    #[test]
    fn helvetica_advances() {
        // H e l l o = 722 + 556 + 222 + 222 + 556
        assert!((SANS.measure("Hello", 10.0) - 22.78).abs() < 0.001);
        let bold = FontKey { bold: true, ..SANS };
        assert!(bold.measure("Hello", 10.0) > SANS.measure("Hello", 10.0));
    }

    #[test]
    fn courier_is_monospaced() {
        let mono = FontKey {
            family: FontFamily::Courier,
            ..SANS
        };
        assert_eq!(mono.measure("iiii", 10.0), mono.measure("WWWW", 10.0));
        assert_eq!(mono.measure("0112", 10.0), 24.0);
    }

    #[test]
    fn word_wrap_basic() {
        let lines = wrap_text("Hello world foo bar", SANS, 12.0, 60.0);
        assert!(lines.len() >= 2, "Expected wrapping, got {lines:?}");
    }

    #[test]
    fn long_words_break_between_characters() {
        let word = "PRDCTNN-XX-DS-12345678-123456789";
        let lines = wrap_text(word, SANS, 12.0, 60.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        assert!(lines.iter().all(|l| SANS.measure(l, 12.0) <= 60.0));
    }

    #[test]
    fn nbsp_is_a_line_of_its_own() {
        assert_eq!(wrap_text("\u{00A0}", SANS, 12.0, 100.0), vec!["\u{00A0}"]);
    }
}
