//! GTIN identifiers (GTIN-8/12/13/14) with the GS1 mod-10 check digit.
//!
//! A label's GTIN is built from the client's numeric company prefix and the
//! product's item reference. Free-text client ids are display-only and do not
//! contribute a prefix.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length family of a GTIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GtinFormat {
    Gtin8,
    Gtin12,
    Gtin13,
    #[default]
    Gtin14,
}

impl GtinFormat {
    /// Total digit count, check digit included.
    pub fn len(self) -> usize {
        match self {
            GtinFormat::Gtin8 => 8,
            GtinFormat::Gtin12 => 12,
            GtinFormat::Gtin13 => 13,
            GtinFormat::Gtin14 => 14,
        }
    }

    fn from_len(len: usize) -> Option<Self> {
        match len {
            8 => Some(GtinFormat::Gtin8),
            12 => Some(GtinFormat::Gtin12),
            13 => Some(GtinFormat::Gtin13),
            14 => Some(GtinFormat::Gtin14),
            _ => None,
        }
    }
}

impl fmt::Display for GtinFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GTIN-{}", self.len())
    }
}

/// How the check digit is obtained when building a GTIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckDigit {
    /// Append a computed check digit to the body.
    #[default]
    Compute,
    /// The product id already ends with a check digit; verify it.
    Verify,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GtinError {
    #[error("identifier must be numeric, got {0:?}")]
    NonNumeric(String),

    #[error("{digits} significant digits do not fit the {max}-digit body of a {format}")]
    TooLong {
        digits: usize,
        max: usize,
        format: GtinFormat,
    },

    #[error("GTIN must have 8, 12, 13 or 14 digits, got {0}")]
    WrongLength(usize),

    #[error("check digit {found} does not match expected {expected}")]
    CheckDigit { expected: u8, found: u8 },
}

/// A validated GTIN, stored as its digit string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Gtin {
    digits: String,
}

impl Gtin {
    /// Build a GTIN from a product item reference and a client id.
    pub fn create(
        product_id: &str,
        client_id: &str,
        format: GtinFormat,
        policy: CheckDigit,
    ) -> Result<Self, GtinError> {
        let product_id = product_id.trim();
        if !is_digits(product_id) {
            return Err(GtinError::NonNumeric(product_id.to_string()));
        }
        let client_id = client_id.trim();
        let prefix = if is_digits(client_id) { client_id } else { "" };

        let (reference, supplied) = match policy {
            CheckDigit::Compute => (product_id, None),
            CheckDigit::Verify => {
                let (head, tail) = product_id.split_at(product_id.len() - 1);
                (head, tail.bytes().next().map(|b| b - b'0'))
            }
        };

        let joined = format!("{prefix}{reference}");
        let significant = joined.trim_start_matches('0');
        let body_len = format.len() - 1;
        if significant.len() > body_len {
            return Err(GtinError::TooLong {
                digits: significant.len(),
                max: body_len,
                format,
            });
        }
        let body = format!("{significant:0>body_len$}");
        let expected = check_digit(&body);
        if let Some(found) = supplied {
            if found != expected {
                return Err(GtinError::CheckDigit { expected, found });
            }
        }
        Ok(Self {
            digits: format!("{body}{expected}"),
        })
    }

    /// Validate an existing GTIN digit string (length and check digit).
    pub fn parse(digits: &str) -> Result<Self, GtinError> {
        let digits = digits.trim();
        if !is_digits(digits) {
            return Err(GtinError::NonNumeric(digits.to_string()));
        }
        if GtinFormat::from_len(digits.len()).is_none() {
            return Err(GtinError::WrongLength(digits.len()));
        }
        let (body, last) = digits.split_at(digits.len() - 1);
        let expected = check_digit(body);
        let found = last.as_bytes()[0] - b'0';
        if expected != found {
            return Err(GtinError::CheckDigit { expected, found });
        }
        Ok(Self {
            digits: digits.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    pub fn format(&self) -> GtinFormat {
        GtinFormat::from_len(self.digits.len()).unwrap_or_default()
    }

    /// Zero-padded 14-digit form, as carried by AI (01).
    pub fn to_gtin14(&self) -> String {
        format!("{:0>14}", self.digits)
    }
}

impl fmt::Display for Gtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

impl TryFrom<String> for Gtin {
    type Error = GtinError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Gtin::parse(&value)
    }
}

impl From<Gtin> for String {
    fn from(gtin: Gtin) -> Self {
        gtin.digits
    }
}

/// GS1 mod-10 check digit: weights 3,1,3,… from the rightmost body digit.
///
/// Non-digit characters are ignored.
pub fn check_digit(body: &str) -> u8 {
    let sum: u32 = body
        .bytes()
        .filter(u8::is_ascii_digit)
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = (b - b'0') as u32;
            if i % 2 == 0 {
                d * 3
            } else {
                d
            }
        })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_digit_matches_known_gtin() {
        assert_eq!(check_digit("1123000045678"), 1);
        assert_eq!(check_digit("0000000000001"), 7);
        assert_eq!(check_digit("629104150021"), 3);
    }

    #[test]
    fn create_pads_reference_to_fourteen_digits() {
        let gtin = Gtin::create("1", "CLIENTID", GtinFormat::Gtin14, CheckDigit::Compute).unwrap();
        assert_eq!(gtin.as_str(), "00000000000017");
    }

    #[test]
    fn numeric_client_id_becomes_prefix() {
        let gtin = Gtin::create("45678", "1123000", GtinFormat::Gtin14, CheckDigit::Compute).unwrap();
        assert_eq!(gtin.as_str(), "01123000456789");
    }

    #[test]
    fn non_numeric_product_is_rejected() {
        let err = Gtin::create("ABC", "1", GtinFormat::Gtin14, CheckDigit::Compute).unwrap_err();
        assert!(matches!(err, GtinError::NonNumeric(_)));
    }

    #[test]
    fn oversized_body_is_rejected() {
        let err = Gtin::create("123456789", "98765", GtinFormat::Gtin8, CheckDigit::Compute)
            .unwrap_err();
        assert!(matches!(err, GtinError::TooLong { max: 7, .. }));
    }

    #[test]
    fn verify_policy_checks_supplied_digit() {
        assert!(Gtin::create("11230000456781", "", GtinFormat::Gtin14, CheckDigit::Verify).is_ok());
        let err = Gtin::create("11230000456782", "", GtinFormat::Gtin14, CheckDigit::Verify)
            .unwrap_err();
        assert_eq!(err, GtinError::CheckDigit { expected: 1, found: 2 });
    }

    #[test]
    fn parse_validates_length_and_checksum() {
        assert!(Gtin::parse("11230000456781").is_ok());
        assert_eq!(Gtin::parse("1123").unwrap_err(), GtinError::WrongLength(4));
        assert!(matches!(
            Gtin::parse("11230000456780"),
            Err(GtinError::CheckDigit { .. })
        ));
    }

    #[test]
    fn gtin14_pads_shorter_formats() {
        let gtin = Gtin::parse("6291041500213").unwrap();
        assert_eq!(gtin.format(), GtinFormat::Gtin13);
        assert_eq!(gtin.to_gtin14(), "06291041500213");
    }
}
