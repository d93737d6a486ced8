//! labelprint – renders the demonstration labels into a PDF.
//!
//! Usage:
//!   labelprint [output.pdf] [--size WxH] [--css FILE] [--gs1 STRING] [--lang xx]
//!
//! Sizes are millimetres; the default is a 100x100 label written to
//! `labels.pdf`.

use std::{env, path::PathBuf, process};

use chrono::{Duration, Utc};
use label_printer::{LabelModel, PageFormat, Printer, PrinterConfig};

const DEMO_GS1: &str = "(01)11230000456781(37)18(3302)987654(3102)123456";

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut output_path: Option<PathBuf> = None;
    let mut size = PageFormat::default();
    let mut css: Option<PathBuf> = None;
    let mut gs1 = DEMO_GS1.to_string();
    let mut lang: Option<String> = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--size" | "-s" => match iter.next().and_then(|v| parse_size(v)) {
                Some(s) => size = s,
                None => fail(&args[0], "--size expects WIDTHxHEIGHT in mm, e.g. 100x60"),
            },
            "--css" => match iter.next() {
                Some(v) => css = Some(PathBuf::from(v)),
                None => fail(&args[0], "--css expects a file"),
            },
            "--gs1" => match iter.next() {
                Some(v) => gs1 = v.clone(),
                None => fail(&args[0], "--gs1 expects a GS1-128 element string"),
            },
            "--lang" => match iter.next() {
                Some(v) => lang = Some(v.clone()),
                None => fail(&args[0], "--lang expects a language code"),
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => fail(&args[0], &format!("Unknown flag: {other}")),
            path => {
                if output_path.is_some() {
                    fail(&args[0], &format!("Unexpected argument: {path}"));
                }
                output_path = Some(PathBuf::from(path));
            }
        }
    }

    let output = output_path.unwrap_or_else(|| PathBuf::from("labels.pdf"));

    let config = PrinterConfig {
        format: size,
        stylesheet: css,
        ..PrinterConfig::default()
    };
    let mut printer = Printer::new(config);

    let labels = match demo_labels(size, lang.as_deref(), &gs1) {
        Ok(labels) => labels,
        Err(e) => {
            eprintln!("Error building labels: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = printer.add_labels(&labels) {
        eprintln!("Error rendering labels: {e}");
        process::exit(1);
    }
    let pages = printer.page_count();

    if let Err(e) = printer.save(&output) {
        eprintln!("Error writing '{}': {e}", output.display());
        process::exit(1);
    }
    eprintln!(
        "Wrote '{}' ({} label{})",
        output.display(),
        pages,
        if pages == 1 { "" } else { "s" }
    );
}

fn demo_labels(size: PageFormat, lang: Option<&str>, gs1: &str) -> label_printer::Result<Vec<LabelModel>> {
    let (w, h) = (f64::from(size.width_mm), f64::from(size.height_mm));
    let with_lang = |b: label_printer::label::LabelBuilder| match lang {
        Some(l) => b.locale(l),
        None => b,
    };

    let mut enriched = with_lang(
        LabelModel::builder(123456789)
            .product_id("555")
            .client_name("OWNER NAME OR IDENTIFICATION")
            .product_name("Product Name (this can be a long, long, long, very long, very long, very long name)")
            .sku("PRDCTNN-XX-DS-12345678-123456789")
            .generator("SGLMS TAILOR-MADE SOFTWARE SOLUTIONS")
            .page_size(w, h),
    )
    .build()?;
    enriched.ingest_gs1(gs1)?;

    let dated = with_lang(
        LabelModel::builder(987654321)
            .product_id("0")
            .client_id("ClientID")
            .product_name("Product Name")
            .client_name("Client Name")
            .timestamp(Utc::now() - Duration::days(5))
            .page_size(w, h),
    )
    .build()?;

    let plain = with_lang(LabelModel::builder(11235813).page_size(w, h)).build()?;

    Ok(vec![enriched, dated, plain])
}

fn parse_size(value: &str) -> Option<PageFormat> {
    let (w, h) = value.split_once(['x', 'X'])?;
    let (w, h) = (w.trim().parse::<f32>().ok()?, h.trim().parse::<f32>().ok()?);
    (w > 0.0 && h > 0.0).then(|| PageFormat::new(w, h))
}

fn fail(prog: &str, message: &str) -> ! {
    eprintln!("{message}");
    print_usage(prog);
    process::exit(1);
}

fn print_usage(prog: &str) {
    eprintln!("labelprint – GS1-128 label demo");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} [output.pdf] [--size WxH] [--css FILE] [--gs1 STRING] [--lang xx]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [output.pdf]   Output path (default: labels.pdf)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --size, -s     Label size in mm (default: 100x100)");
    eprintln!("  --css          Extra stylesheet appended to the label styles");
    eprintln!("  --gs1          GS1-128 string for the first label (default: {DEMO_GS1})");
    eprintln!("  --lang         Preferred date language (only `es` is honoured)");
    eprintln!("  --help         Print this message");
}
