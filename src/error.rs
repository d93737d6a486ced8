//! Error types for label construction, GS1 ingestion and document output.

use thiserror::Error;

use crate::barcode::EncodeError;
use crate::gs1::Gs1Error;
use crate::gtin::GtinError;

/// Crate-level error.
#[derive(Debug, Error)]
pub enum LabelError {
    /// The GTIN could not be built from the supplied identifiers.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[source] GtinError),

    /// Label numbers are serials and must be positive.
    #[error("Invalid label number: {0}")]
    InvalidNumber(u64),

    /// A GS1-128 element string was rejected by the decoder.
    #[error("Malformed GS1 payload: {0}")]
    MalformedGs1Payload(#[source] Gs1Error),

    /// Weight or unit count is negative or not finite.
    #[error("Invalid measure: {0}")]
    InvalidMeasure(String),

    /// Barcode encoding or PDF composition failed; nothing was committed.
    #[error("Render failure: {0}")]
    RenderFailure(String),

    /// The document was already finalised by `output`/`save`.
    #[error("Document is closed")]
    ClosedDocument,

    /// Printer or theme configuration could not be read.
    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EncodeError> for LabelError {
    fn from(e: EncodeError) -> Self {
        LabelError::RenderFailure(e.to_string())
    }
}

/// Result type for label operations.
pub type Result<T> = std::result::Result<T, LabelError>;
