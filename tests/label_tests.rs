//! Label model and layout properties.
//!
//! These tests validate:
//! - Layout trees are deterministic
//! - GS1 ingestion is all-or-nothing and round-trips the decoded fields
//! - Row rules (SKU placeholder, units / weight) and serial size tiers

use chrono::{DateTime, TimeZone, Utc};
use label_printer::label::UnitWeight;
use label_printer::{LabelError, LabelModel, LabelTheme, Region, RegionKind};

// =====================================================================
// Helper
// =====================================================================

const GS1: &str = "(01)11230000456781(37)18(3302)987654(3102)123456";

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

fn label(number: u64) -> LabelModel {
    LabelModel::builder(number)
        .product_id("555")
        .client_id("780123")
        .timestamp(fixed_time())
        .build()
        .unwrap()
}

fn region(label: &LabelModel, kind: RegionKind) -> Region {
    label
        .compute_layout(None)
        .region(kind)
        .cloned()
        .unwrap_or_else(|| panic!("no {kind:?} region"))
}

// =====================================================================
// Construction & determinism
// =====================================================================

#[test]
fn layout_is_deterministic() {
    let a = label(123456789);
    let b = label(123456789);
    assert_eq!(a.compute_layout(None), b.compute_layout(None));
    assert_eq!(a.compute_layout(Some(20)), a.compute_layout(Some(20)));
}

#[test]
fn gtin_is_built_from_identifiers() {
    let l = label(1);
    let gtin = l.gtin().as_str();
    assert_eq!(gtin.len(), 14);
    assert_eq!(&gtin[..13], "0000780123555", "prefix and reference in {gtin}");
    assert_eq!(
        gtin.as_bytes()[13] - b'0',
        label_printer::gtin::check_digit(&gtin[..13])
    );
}

#[test]
fn invalid_product_id_fails_at_construction() {
    let err = LabelModel::create(9, Some("ABC"), None, None, None, None).unwrap_err();
    assert!(matches!(err, LabelError::InvalidIdentifier(_)));
}

#[test]
fn default_regions_in_order() {
    let kinds: Vec<RegionKind> = label(1)
        .compute_layout(None)
        .regions
        .iter()
        .map(Region::kind)
        .collect();
    assert_eq!(kinds, LabelTheme::default().regions);
    assert!(!kinds.contains(&RegionKind::GtinTag));
}

// =====================================================================
// GS1 ingestion
// =====================================================================

#[test]
fn ingest_round_trip() {
    let mut l = label(123456789);
    l.ingest_gs1(GS1).unwrap();
    assert_eq!(l.unit_count(), 18.0);
    assert!((l.gross_weight() - 9876.54).abs() < 1e-9);
    assert_eq!(l.gtin().as_str(), "11230000456781");

    match region(&l, RegionKind::Gs1Tag) {
        Region::Gs1Tag { text, .. } => assert_eq!(text, GS1),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn failed_ingest_leaves_state_untouched() {
    let mut l = label(42);
    l.ingest_gs1(GS1).unwrap();
    let before = (l.gtin().clone(), l.gross_weight(), l.unit_count(), l.gs1().to_string());

    for bad in ["(01)12345678901234(37)5", "(37)5", "(01)1123", "", "(01)11230000456781(37"] {
        let err = l.ingest_gs1(bad).unwrap_err();
        assert!(
            matches!(err, LabelError::MalformedGs1Payload(_)),
            "{bad:?} gave {err:?}"
        );
        let after = (l.gtin().clone(), l.gross_weight(), l.unit_count(), l.gs1().to_string());
        assert_eq!(before, after, "state changed after {bad:?}");
    }
}

#[test]
fn later_ingest_replaces_everything() {
    let mut l = label(42);
    l.ingest_gs1(GS1).unwrap();
    l.ingest_gs1("(01)11230000456781").unwrap();
    assert_eq!(l.unit_count(), 0.0);
    assert_eq!(l.gross_weight(), 0.0);
    assert!(matches!(
        region(&l, RegionKind::UnitWeight),
        Region::UnitWeight { row: None }
    ));
}

// =====================================================================
// Row rules
// =====================================================================

#[test]
fn weight_row_rounds_per_unit() {
    let mut l = label(7);
    l.set_measures(9.3, 3.0).unwrap();
    match region(&l, RegionKind::UnitWeight) {
        Region::UnitWeight { row: Some(row) } => {
            assert_eq!(row.display(), "3 x 3.1Kg = 9.3Kg");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn ingested_weight_row() {
    let mut l = label(7);
    l.ingest_gs1(GS1).unwrap();
    match region(&l, RegionKind::UnitWeight) {
        Region::UnitWeight { row: Some(row) } => {
            assert_eq!(row, UnitWeight {
                units: 18.0,
                per_unit: 548.7,
                total: 9876.54,
            });
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn sku_equal_to_number_is_a_placeholder() {
    let mut l = label(555);
    l.sku = "555".to_string();
    assert_eq!(region(&l, RegionKind::Sku), Region::Sku { value: None });

    l.sku = "ABC-1".to_string();
    assert_eq!(
        region(&l, RegionKind::Sku),
        Region::Sku {
            value: Some("ABC-1".to_string())
        }
    );

    l.sku.clear();
    assert_eq!(region(&l, RegionKind::Sku), Region::Sku { value: None });
}

#[test]
fn serial_tier_drops_after_nine_digits() {
    let class = |n: u64| match region(&label(n), RegionKind::SerialNumber) {
        Region::SerialNumber { class, .. } => class,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(class(123456789), "text-3xl");
    assert_eq!(class(1234567890), "text-2xl");
}

#[test]
fn compact_page_drops_another_tier() {
    let l = LabelModel::builder(1234567890)
        .page_size(100.0, 60.0)
        .timestamp(fixed_time())
        .build()
        .unwrap();
    match region(&l, RegionKind::SerialNumber) {
        Region::SerialNumber { class, .. } => assert_eq!(class, "text-xl"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn names_are_cut_by_character_count() {
    let long = "x".repeat(200);
    let l = LabelModel::builder(1)
        .client_name(long.clone())
        .product_name(long)
        .timestamp(fixed_time())
        .build()
        .unwrap();
    let layout = l.compute_layout(None);
    match layout.region(RegionKind::ClientName) {
        Some(Region::ClientName { text, .. }) => assert_eq!(text.len(), 32),
        other => panic!("unexpected {other:?}"),
    }
    match layout.region(RegionKind::ProductName) {
        Some(Region::ProductName { text, .. }) => assert_eq!(text.len(), 80),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn date_uses_fallback_locale_for_unknown_language() {
    let mut l = label(1);
    l.locale = Some("fr-FR".to_string());
    match region(&l, RegionKind::Timestamp) {
        Region::Timestamp { text, .. } => assert_eq!(text, "18-10-2026"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn attribution_names_the_application() {
    let mut l = label(1);
    l.generator = "ACME LOGISTICS".to_string();
    assert_eq!(
        region(&l, RegionKind::Attribution),
        Region::Attribution {
            text: "ACME LOGISTICS / SGLMS Label Printer".to_string()
        }
    );
}
