//! # label-printer – GS1-128 labels to one-page-per-label PDF documents
//!
//! The crate turns label data into print-ready documents in five steps:
//!
//! 1. **Model** – identifiers, names and measures are validated into a
//!    [`LabelModel`]; a GS1-128 string can replace its derived data
//!    ([`label`], [`gtin`], [`gs1`])
//! 2. **Layout** – the model computes an ordered region tree under a
//!    [`LabelTheme`] ([`label`], [`theme`], [`locale`])
//! 3. **Markup** – [`LayoutRenderer`] turns the regions into an HTML fragment
//!    with embedded barcode images ([`markup`], [`barcode`], [`dom`])
//! 4. **Document** – [`Printer`] appends one page per label, suppressing
//!    consecutive duplicates ([`printer`])
//! 5. **Compose** – a [`Compositor`] produces the PDF; the built-in one runs
//!    style → taffy layout → pagination → printpdf ([`pipeline`], [`style`],
//!    [`fonts`], [`layout`], [`pagination`], [`render`])
//!
//! ```no_run
//! use label_printer::{LabelModel, Printer, PrinterConfig};
//!
//! let mut printer = Printer::new(PrinterConfig::default());
//! let mut label = LabelModel::new(123456789)?;
//! label.ingest_gs1("(01)11230000456781(37)18(3302)987654")?;
//! printer.add_label(&label)?;
//! printer.save("labels.pdf")?;
//! # Ok::<(), label_printer::LabelError>(())
//! ```

pub mod barcode;
pub mod dom;
pub mod error;
pub mod fonts;
pub mod gs1;
pub mod gtin;
pub mod label;
pub mod layout;
pub mod layout_config;
pub mod locale;
pub mod markup;
pub mod pagination;
pub mod pipeline;
pub mod printer;
pub mod render;
pub mod style;
pub mod theme;

// Re-exports for convenience
pub use barcode::{BarcodeEncoder, Code128Encoder, Symbology};
pub use error::{LabelError, Result};
pub use gs1::Gs1Payload;
pub use gtin::{CheckDigit, Gtin, GtinFormat};
pub use label::{LabelLayout, LabelModel, Region};
pub use locale::date_formatter;
pub use markup::{LayoutRenderer, RenderedLabel};
pub use pipeline::{CompositionJob, Compositor, Margins, PageFormat, PdfCompositor};
pub use printer::{DocumentState, Printer, PrinterConfig};
pub use theme::{LabelTheme, RegionKind};
