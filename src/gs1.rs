//! GS1-128 element strings – application identifier table, decoder and the
//! human-readable / barcode-data renderings of a decoded payload.
//!
//! Two input forms are accepted:
//! - bracketed: `(01)11230000456781(37)18(3302)987654`
//! - raw: AIs concatenated, variable-length fields terminated by ASCII GS
//!   (`\x1d`) or the literal `<GS>`; an optional `]C1` prefix is skipped.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::gtin::{check_digit, Gtin};

/// ASCII group separator terminating variable-length fields.
pub const GS: char = '\u{1d}';

const LB_TO_KG: f64 = 0.453_592_37;

// ---------------------------------------------------------------------------
// AI table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Numeric,
    Alphanumeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLength {
    Fixed(usize),
    Variable(usize),
}

/// Format of one application identifier.
#[derive(Debug, Clone, Copy)]
pub struct AiSpec {
    /// AI digits; for implied-decimal AIs this is the 3-digit stem (`310`).
    pub code: &'static str,
    pub title: &'static str,
    pub charset: Charset,
    pub length: FieldLength,
    /// The AI's fourth digit gives the number of implied decimals.
    pub decimals: bool,
    pub check_digit: bool,
}

impl AiSpec {
    /// Length of the AI itself in the element string.
    pub fn ai_len(&self) -> usize {
        if self.decimals {
            self.code.len() + 1
        } else {
            self.code.len()
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.length, FieldLength::Variable(_))
    }
}

const fn ai(
    code: &'static str,
    title: &'static str,
    charset: Charset,
    length: FieldLength,
) -> AiSpec {
    AiSpec {
        code,
        title,
        charset,
        length,
        decimals: false,
        check_digit: false,
    }
}

const fn checked(code: &'static str, title: &'static str, len: usize) -> AiSpec {
    AiSpec {
        code,
        title,
        charset: Charset::Numeric,
        length: FieldLength::Fixed(len),
        decimals: false,
        check_digit: true,
    }
}

const fn measure(code: &'static str, title: &'static str) -> AiSpec {
    AiSpec {
        code,
        title,
        charset: Charset::Numeric,
        length: FieldLength::Fixed(6),
        decimals: true,
        check_digit: false,
    }
}

use Charset::{Alphanumeric as X, Numeric as N};
use FieldLength::{Fixed, Variable};

pub static AI_TABLE: &[AiSpec] = &[
    checked("00", "SSCC", 18),
    checked("01", "GTIN", 14),
    checked("02", "CONTENT", 14),
    ai("10", "BATCH/LOT", X, Variable(20)),
    ai("11", "PROD DATE", N, Fixed(6)),
    ai("13", "PACK DATE", N, Fixed(6)),
    ai("15", "BEST BEFORE", N, Fixed(6)),
    ai("17", "USE BY", N, Fixed(6)),
    ai("21", "SERIAL", X, Variable(20)),
    ai("30", "VAR. COUNT", N, Variable(8)),
    ai("37", "COUNT", N, Variable(8)),
    measure("310", "NET WEIGHT (kg)"),
    measure("320", "NET WEIGHT (lb)"),
    measure("330", "GROSS WEIGHT (kg)"),
    measure("340", "GROSS WEIGHT (lb)"),
    ai("400", "ORDER NUMBER", X, Variable(30)),
    checked("410", "SHIP TO LOC", 13),
    checked("411", "BILL TO", 13),
    checked("412", "PURCHASE FROM", 13),
    checked("413", "SHIP FOR LOC", 13),
    checked("414", "LOC No", 13),
    ai("420", "SHIP TO POST", X, Variable(20)),
];

/// Find the AI spec whose identifier starts `input`.
pub fn lookup_prefix(input: &str) -> Option<&'static AiSpec> {
    AI_TABLE.iter().find(|spec| {
        let len = spec.ai_len();
        input.len() >= len
            && input.starts_with(spec.code)
            && input.as_bytes()[..len].iter().all(u8::is_ascii_digit)
    })
}

/// Find the table entry for a complete AI such as `"3102"`.
pub fn lookup(ai: &str) -> Option<&'static AiSpec> {
    lookup_prefix(ai).filter(|spec| spec.ai_len() == ai.len())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Gs1Error {
    #[error("empty GS1 element string")]
    Empty,

    #[error("unknown application identifier at {0:?}")]
    UnknownAi(String),

    #[error("AI ({ai}) value {value:?} has the wrong length, expected {expected}")]
    WrongLength {
        ai: String,
        value: String,
        expected: String,
    },

    #[error("AI ({ai}) requires a numeric value, got {value:?}")]
    NonNumeric { ai: String, value: String },

    #[error("AI ({ai}) value {value:?} contains characters outside the GS1 set")]
    InvalidCharacter { ai: String, value: String },

    #[error("AI ({ai}) value {value:?} has an invalid check digit")]
    InvalidCheckDigit { ai: String, value: String },

    #[error("element string carries no GTIN (01) or (02)")]
    MissingGtin,

    #[error("syntax error at byte {0}: {1}")]
    Syntax(usize, &'static str),
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// One decoded `(AI) value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gs1Element {
    pub ai: String,
    pub value: String,
}

impl Gs1Element {
    fn spec(&self) -> Option<&'static AiSpec> {
        lookup(&self.ai)
    }

    /// Numeric value with the implied decimal point applied.
    pub fn measure(&self) -> Option<f64> {
        let spec = self.spec()?;
        let raw: f64 = self.value.parse().ok()?;
        if !spec.decimals {
            return Some(raw);
        }
        let decimals = self.ai.as_bytes()[spec.code.len()] - b'0';
        Some(raw / 10f64.powi(decimals as i32))
    }
}

/// Decoded GS1-128 application-identifier set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gs1Payload {
    elements: Vec<Gs1Element>,
    gtin: Gtin,
    gross_weight: f64,
    net_weight: f64,
    unit_count: f64,
    lot: Option<String>,
    serial: Option<String>,
    sscc: Option<String>,
}

impl Gs1Payload {
    /// Payload carrying only the GTIN; weights and counts are zero.
    pub fn from_gtin(gtin: &Gtin) -> Self {
        Self {
            elements: vec![Gs1Element {
                ai: "01".to_string(),
                value: gtin.to_gtin14(),
            }],
            gtin: gtin.clone(),
            gross_weight: 0.0,
            net_weight: 0.0,
            unit_count: 0.0,
            lot: None,
            serial: None,
            sscc: None,
        }
    }

    /// Decode a bracketed or raw element string.
    pub fn parse(input: &str) -> Result<Self, Gs1Error> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Gs1Error::Empty);
        }
        let elements = if input.starts_with('(') {
            parse_bracketed(input)?
        } else {
            parse_raw(input)?
        };
        Self::from_elements(elements)
    }

    fn from_elements(elements: Vec<Gs1Element>) -> Result<Self, Gs1Error> {
        let find = |pred: &dyn Fn(&str) -> bool| elements.iter().find(|e| pred(&e.ai));

        let gtin_elem = find(&|ai| ai == "01")
            .or_else(|| find(&|ai| ai == "02"))
            .ok_or(Gs1Error::MissingGtin)?;
        let gtin = Gtin::parse(&gtin_elem.value).map_err(|_| Gs1Error::InvalidCheckDigit {
            ai: gtin_elem.ai.clone(),
            value: gtin_elem.value.clone(),
        })?;

        let measure_of = |stem: &str, factor: f64| {
            find(&|ai| ai.len() == 4 && ai.starts_with(stem))
                .and_then(Gs1Element::measure)
                .map(|v| v * factor)
        };
        let net_weight = measure_of("310", 1.0)
            .or_else(|| measure_of("320", LB_TO_KG))
            .unwrap_or(0.0);
        let gross_weight = measure_of("330", 1.0)
            .or_else(|| measure_of("340", LB_TO_KG))
            .unwrap_or(net_weight);
        let unit_count = find(&|ai| ai == "37")
            .or_else(|| find(&|ai| ai == "30"))
            .and_then(Gs1Element::measure)
            .unwrap_or(0.0);
        let text_of = |code: &str| find(&|ai| ai == code).map(|e| e.value.clone());

        Ok(Self {
            lot: text_of("10"),
            serial: text_of("21"),
            sscc: text_of("00"),
            gtin,
            gross_weight,
            net_weight,
            unit_count,
            elements,
        })
    }

    pub fn elements(&self) -> &[Gs1Element] {
        &self.elements
    }

    pub fn gtin(&self) -> &Gtin {
        &self.gtin
    }

    /// Gross weight in kg; the net weight when no gross weight AI is present.
    pub fn gross_weight(&self) -> f64 {
        self.gross_weight
    }

    pub fn net_weight(&self) -> f64 {
        self.net_weight
    }

    pub fn unit_count(&self) -> f64 {
        self.unit_count
    }

    pub fn lot(&self) -> Option<&str> {
        self.lot.as_deref()
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    pub fn sscc(&self) -> Option<&str> {
        self.sscc.as_deref()
    }

    /// Data string for a GS1-128 symbol: variable-length fields are followed
    /// by a GS separator unless they are last.
    pub fn barcode_data(&self) -> String {
        let mut out = String::new();
        let last = self.elements.len().saturating_sub(1);
        for (i, elem) in self.elements.iter().enumerate() {
            out.push_str(&elem.ai);
            out.push_str(&elem.value);
            let variable = elem.spec().map(AiSpec::is_variable).unwrap_or(true);
            if variable && i < last {
                out.push(GS);
            }
        }
        out
    }
}

impl fmt::Display for Gs1Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for elem in &self.elements {
            write!(f, "({}){}", elem.ai, elem.value)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Gs1Payload {
    type Err = Gs1Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gs1Payload::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn parse_bracketed(input: &str) -> Result<Vec<Gs1Element>, Gs1Error> {
    let mut elements = Vec::new();
    let mut rest = input;
    let mut offset = 0usize;

    while !rest.is_empty() {
        let body = rest
            .strip_prefix('(')
            .ok_or(Gs1Error::Syntax(offset, "expected '('"))?;
        let close = body
            .find(')')
            .ok_or(Gs1Error::Syntax(offset, "unterminated AI"))?;
        let ai = &body[..close];
        let spec = lookup(ai).ok_or_else(|| Gs1Error::UnknownAi(ai.to_string()))?;

        let after = &body[close + 1..];
        let value_end = after.find('(').unwrap_or(after.len());
        let value = &after[..value_end];
        elements.push(validate(spec, ai, value)?);

        offset += 2 + close + value_end;
        rest = &after[value_end..];
    }
    Ok(elements)
}

fn parse_raw(input: &str) -> Result<Vec<Gs1Element>, Gs1Error> {
    let normalised = input.replace("<GS>", &GS.to_string());
    let mut rest = normalised.strip_prefix("]C1").unwrap_or(&normalised);
    let mut elements = Vec::new();

    loop {
        rest = rest.trim_start_matches(GS);
        if rest.is_empty() {
            break;
        }
        let spec = lookup_prefix(rest).ok_or_else(|| {
            let head: String = rest.chars().take(4).collect();
            Gs1Error::UnknownAi(head)
        })?;
        let (ai, tail) = rest.split_at(spec.ai_len());

        let value_end = match spec.length {
            FieldLength::Fixed(n) => tail.char_indices().nth(n).map_or(tail.len(), |(i, _)| i),
            FieldLength::Variable(_) => tail.find(GS).unwrap_or(tail.len()),
        };
        let value = &tail[..value_end];
        elements.push(validate(spec, ai, value)?);
        rest = &tail[value_end..];
    }
    Ok(elements)
}

fn validate(spec: &AiSpec, ai: &str, value: &str) -> Result<Gs1Element, Gs1Error> {
    let len = value.chars().count();
    let (ok, expected) = match spec.length {
        FieldLength::Fixed(n) => (len == n, n.to_string()),
        FieldLength::Variable(max) => (len >= 1 && len <= max, format!("1..={max}")),
    };
    if !ok {
        return Err(Gs1Error::WrongLength {
            ai: ai.to_string(),
            value: value.to_string(),
            expected,
        });
    }
    match spec.charset {
        Charset::Numeric if !value.bytes().all(|b| b.is_ascii_digit()) => {
            return Err(Gs1Error::NonNumeric {
                ai: ai.to_string(),
                value: value.to_string(),
            });
        }
        Charset::Alphanumeric if !value.chars().all(is_gs1_char) => {
            return Err(Gs1Error::InvalidCharacter {
                ai: ai.to_string(),
                value: value.to_string(),
            });
        }
        _ => {}
    }
    if spec.check_digit {
        let (body, last) = value.split_at(value.len() - 1);
        if check_digit(body) != last.as_bytes()[0] - b'0' {
            return Err(Gs1Error::InvalidCheckDigit {
                ai: ai.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(Gs1Element {
        ai: ai.to_string(),
        value: value.to_string(),
    })
}

/// GS1 AI encodable character set 82.
fn is_gs1_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '"'
                | '%'
                | '&'
                | '\''
                | '('
                | ')'
                | '*'
                | '+'
                | ','
                | '-'
                | '.'
                | '/'
                | ':'
                | ';'
                | '<'
                | '='
                | '>'
                | '?'
                | '_'
        )
}
