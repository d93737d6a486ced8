//! Document-level tests with the built-in compositor.
//!
//! These tests validate:
//! - Consecutive duplicate labels are suppressed
//! - A finalised document rejects further work
//! - Saved files are complete PDFs
//! - Rendering is deterministic

use std::fs;

use chrono::{TimeZone, Utc};
use label_printer::barcode::EncodeError;
use label_printer::pipeline::compute_layout_config;
use label_printer::{
    BarcodeEncoder, Code128Encoder, CompositionJob, DocumentState, LabelError, LabelModel,
    LabelTheme, LayoutRenderer, PdfCompositor, Printer, PrinterConfig, Symbology,
};
use sha2::{Digest, Sha256};

// =====================================================================
// Helper
// =====================================================================

fn label(number: u64) -> LabelModel {
    LabelModel::builder(number)
        .timestamp(Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap())
        .build()
        .unwrap()
}

fn labels(numbers: &[u64]) -> Vec<LabelModel> {
    numbers.iter().copied().map(label).collect()
}

fn digest(pages: &[String]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for page in pages {
        hasher.update(page.as_bytes());
    }
    hasher.finalize().to_vec()
}

/// Refuses to encode one particular value.
struct RefusingEncoder {
    refuse: &'static str,
    inner: Code128Encoder,
}

impl BarcodeEncoder for RefusingEncoder {
    fn encode(&self, data: &str, symbology: Symbology) -> Result<Vec<u8>, EncodeError> {
        if data == self.refuse {
            return Err(EncodeError::Empty);
        }
        self.inner.encode(data, symbology)
    }
}

// =====================================================================
// Duplicate suppression
// =====================================================================

#[test]
fn repeated_label_prints_once() {
    let mut printer = Printer::new(PrinterConfig::default());
    for n in [5, 5, 7, 5] {
        printer.add_label(&label(n)).unwrap();
    }
    assert_eq!(printer.print_log(), &[5, 7, 5]);
    assert_eq!(printer.page_count(), 3);
    assert_eq!(printer.page_number(), 4);

    let job = CompositionJob {
        stylesheet: printer.stylesheet(),
        pages: printer.pages(),
        format: printer.config().format,
        margins: printer.config().margins,
        title: &printer.config().title,
    };
    let config = compute_layout_config(&job).unwrap();
    assert_eq!(config.pages.len(), 3);
}

#[test]
fn batch_matches_one_by_one() {
    let numbers = [3, 3, 1, 2, 2, 3];

    let mut batch = Printer::new(PrinterConfig::default());
    batch.add_labels(&labels(&numbers)).unwrap();

    let mut single = Printer::new(PrinterConfig::default());
    for l in labels(&numbers) {
        single.add_label(&l).unwrap();
    }

    assert_eq!(batch.print_log(), &[3, 1, 2, 3]);
    assert_eq!(batch.print_log(), single.print_log());
    assert_eq!(batch.pages(), single.pages());
}

#[test]
fn batch_stops_at_first_failure() {
    let renderer = LayoutRenderer::with_encoder(
        LabelTheme::default(),
        RefusingEncoder {
            refuse: "13",
            inner: Code128Encoder::default(),
        },
    );
    let mut printer = Printer::with_parts(PrinterConfig::default(), renderer, PdfCompositor);

    let err = printer.add_labels(&labels(&[1, 13, 2])).unwrap_err();
    assert!(matches!(err, LabelError::RenderFailure(_)));
    assert_eq!(printer.print_log(), &[1]);
    assert_eq!(printer.state(), DocumentState::Accumulating);

    printer.add_label(&label(2)).unwrap();
    assert_eq!(printer.print_log(), &[1, 2]);
}

// =====================================================================
// Document lifecycle
// =====================================================================

#[test]
fn output_closes_the_document() {
    let mut printer = Printer::new(PrinterConfig::default());
    assert_eq!(printer.state(), DocumentState::Empty);
    printer.add_label(&label(1)).unwrap();
    assert_eq!(printer.state(), DocumentState::Accumulating);

    let bytes = printer.output().unwrap();
    assert_eq!(&bytes[0..5], b"%PDF-");
    assert_eq!(printer.state(), DocumentState::Finalized);

    assert!(matches!(printer.add_label(&label(2)), Err(LabelError::ClosedDocument)));
    assert!(matches!(printer.add_page(), Err(LabelError::ClosedDocument)));
    assert!(matches!(printer.output(), Err(LabelError::ClosedDocument)));
    assert_eq!(printer.print_log(), &[1]);
}

#[test]
fn single_label_pdf() {
    let bytes = label(77).to_pdf(PrinterConfig::default()).unwrap();
    assert_eq!(&bytes[0..5], b"%PDF-");

    let config = PrinterConfig {
        margins: label_printer::Margins::uniform(60.0),
        ..PrinterConfig::default()
    };
    assert!(matches!(label(77).to_pdf(config), Err(LabelError::RenderFailure(_))));
}

#[test]
fn save_writes_a_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labels.pdf");

    let mut printer = Printer::new(PrinterConfig::default());
    printer.add_labels(&labels(&[10, 11])).unwrap();
    printer.save(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert!(bytes.len() > 100);
    assert_eq!(&bytes[0..5], b"%PDF-");
    assert!(matches!(printer.save(&path), Err(LabelError::ClosedDocument)));
}

#[test]
fn save_through_configured_temp_dir() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = dir.path().join("scratch");
    fs::create_dir(&scratch).unwrap();

    let config = PrinterConfig {
        temp_dir: Some(scratch.clone()),
        ..PrinterConfig::default()
    };
    let mut printer = Printer::new(config);
    printer.add_label(&label(99)).unwrap();
    let path = dir.path().join("out.pdf");
    printer.save(&path).unwrap();

    assert!(path.is_file());
    assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0, "temporary file left behind");
}

#[test]
fn user_stylesheet_is_appended() {
    let dir = tempfile::tempdir().unwrap();
    let css = dir.path().join("extra.css");
    fs::write(&css, ".number { color: red; }").unwrap();

    let config = PrinterConfig {
        stylesheet: Some(css),
        ..PrinterConfig::default()
    };
    let mut printer = Printer::new(config);
    assert!(printer.stylesheet().starts_with(&LabelTheme::default().stylesheet));
    assert!(printer.stylesheet().ends_with(".number { color: red; }"));

    printer.add_label(&label(1)).unwrap();
    assert_eq!(&printer.output().unwrap()[0..5], b"%PDF-");
}

// =====================================================================
// Determinism
// =====================================================================

#[test]
fn same_labels_same_markup() {
    let numbers = [123456789, 987654321, 11235813];
    let mut a = Printer::new(PrinterConfig::default());
    let mut b = Printer::new(PrinterConfig::default());
    a.add_labels(&labels(&numbers)).unwrap();
    for l in labels(&numbers) {
        b.add_label(&l).unwrap();
    }
    assert_eq!(digest(a.pages()), digest(b.pages()));
}

#[test]
fn different_label_different_markup() {
    let mut a = Printer::new(PrinterConfig::default());
    let mut b = Printer::new(PrinterConfig::default());
    a.add_label(&label(1)).unwrap();
    b.add_label(&label(2)).unwrap();
    assert_ne!(digest(a.pages()), digest(b.pages()));
}
