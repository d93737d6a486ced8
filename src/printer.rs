//! Printer – accumulates rendered labels into a document, one page per label.
//!
//! A label whose number equals the previously committed one is suppressed,
//! so accidental double submissions do not waste a label. The same number
//! after a different label prints again.
//!
//! Rendering and committing are separate steps: [`Printer::add_labels`]
//! renders a batch in parallel but commits strictly in call order.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::barcode::{BarcodeEncoder, Code128Encoder};
use crate::error::{LabelError, Result};
use crate::label::LabelModel;
use crate::markup::{LayoutRenderer, RenderedLabel};
use crate::pipeline::{CompositionJob, Compositor, Margins, PageFormat, PdfCompositor};
use crate::theme::{LabelTheme, APP_NAME};

/// Document-level settings. Every field has a default, so `{}` is a valid
/// JSON config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// `[width, height]` in millimetres.
    pub format: PageFormat,
    pub margins: Margins,
    /// Directory for the intermediate file written by [`Printer::save`];
    /// defaults to the target's directory.
    pub temp_dir: Option<PathBuf>,
    /// Extra CSS appended to the theme stylesheet.
    pub stylesheet: Option<PathBuf>,
    /// PDF metadata title.
    pub title: String,
    pub theme: LabelTheme,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            format: PageFormat::default(),
            margins: Margins::default(),
            temp_dir: None,
            stylesheet: None,
            title: APP_NAME.to_string(),
            theme: LabelTheme::default(),
        }
    }
}

impl PrinterConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LabelError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Empty,
    Accumulating,
    /// `output` or `save` has run; nothing more can be added.
    Finalized,
}

pub struct Printer<C: Compositor = PdfCompositor, E: BarcodeEncoder = Code128Encoder> {
    config: PrinterConfig,
    renderer: LayoutRenderer<E>,
    compositor: C,
    stylesheet: String,
    pages: Vec<String>,
    print_log: Vec<u64>,
    page_number: usize,
    state: DocumentState,
}

impl Printer {
    /// Printer with the built-in compositor and barcode encoder, themed by
    /// `config.theme`.
    pub fn new(config: PrinterConfig) -> Self {
        let renderer = LayoutRenderer::new(config.theme.clone());
        Self::with_parts(config, renderer, PdfCompositor)
    }
}

impl<C: Compositor, E: BarcodeEncoder> Printer<C, E> {
    /// The renderer's theme supplies the base stylesheet; `config.theme` is
    /// not consulted.
    pub fn with_parts(config: PrinterConfig, renderer: LayoutRenderer<E>, compositor: C) -> Self {
        let mut stylesheet = renderer.theme().stylesheet.clone();
        if let Some(path) = &config.stylesheet {
            if let Some(extra) = read_stylesheet(path) {
                stylesheet.push('\n');
                stylesheet.push_str(&extra);
            }
        }
        Self {
            config,
            renderer,
            compositor,
            stylesheet,
            pages: Vec::new(),
            print_log: Vec::new(),
            page_number: 1,
            state: DocumentState::Empty,
        }
    }

    /// Render `label` and append it as a new page unless it repeats the
    /// previous label. Returns the print log.
    pub fn add_label(&mut self, label: &LabelModel) -> Result<&[u64]> {
        self.ensure_open()?;
        let rendered = self.renderer.render(label)?;
        self.commit(rendered)
    }

    /// Render every label, then commit them in order. The first failure
    /// stops the batch; labels committed before it stay in the document.
    pub fn add_labels(&mut self, labels: &[LabelModel]) -> Result<&[u64]> {
        self.ensure_open()?;

        #[cfg(feature = "parallel")]
        let rendered: Vec<Result<RenderedLabel>> =
            labels.par_iter().map(|l| self.renderer.render(l)).collect();
        #[cfg(not(feature = "parallel"))]
        let rendered: Vec<Result<RenderedLabel>> =
            labels.iter().map(|l| self.renderer.render(l)).collect();

        for label in rendered {
            self.commit(label?)?;
        }
        Ok(&self.print_log)
    }

    /// Apply the consecutive-duplicate rule to an already rendered label.
    pub fn commit(&mut self, label: RenderedLabel) -> Result<&[u64]> {
        self.ensure_open()?;
        if self.print_log.last() == Some(&label.number) {
            log::debug!("Label {} repeats the previous page, suppressed", label.number);
            return Ok(&self.print_log);
        }

        let page = self.page_wrapper(&label.html);
        self.pages.push(page);
        self.print_log.push(label.number);
        log::debug!("Label {} committed as page {}", label.number, self.page_number);
        self.page_number += 1;
        self.state = DocumentState::Accumulating;
        Ok(&self.print_log)
    }

    /// Start a blank page. The print log is untouched, so duplicate
    /// suppression still compares against the last label.
    pub fn add_page(&mut self) -> Result<()> {
        self.ensure_open()?;
        let page = self.page_wrapper("");
        self.pages.push(page);
        log::debug!("Blank page {}", self.page_number);
        self.page_number += 1;
        self.state = DocumentState::Accumulating;
        Ok(())
    }

    /// Compose the document and close it.
    pub fn output(&mut self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        let job = CompositionJob {
            stylesheet: &self.stylesheet,
            pages: &self.pages,
            format: self.config.format,
            margins: self.config.margins,
            title: &self.config.title,
        };
        let bytes = self.compositor.compose(&job)?;
        self.state = DocumentState::Finalized;
        log::debug!(
            "Document finalised: {} page(s), {} bytes",
            self.pages.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Compose the document and write it to `path` through a temporary file
    /// that is renamed into place.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.output()?;

        let dir = match &self.config.temp_dir {
            Some(dir) => dir.clone(),
            None => match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| LabelError::Io(e.error))?;
        log::info!("Wrote '{}' ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    pub fn print_log(&self) -> &[u64] {
        &self.print_log
    }

    /// Number the next page will get; starts at 1.
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page fragments in document order.
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// Combined theme and user stylesheet handed to the compositor.
    pub fn stylesheet(&self) -> &str {
        &self.stylesheet
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    pub fn renderer(&self) -> &LayoutRenderer<E> {
        &self.renderer
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == DocumentState::Finalized {
            return Err(LabelError::ClosedDocument);
        }
        Ok(())
    }

    /// Every page after the first breaks before itself.
    fn page_wrapper(&self, html: &str) -> String {
        if self.page_number > 1 {
            format!("<div style=\"page-break-before:always\">{html}</div>")
        } else {
            format!("<div>{html}</div>")
        }
    }
}

/// User CSS is optional: a path that is not a readable file is ignored.
fn read_stylesheet(path: &Path) -> Option<String> {
    if !path.is_file() {
        log::warn!("Stylesheet '{}' is not a file, ignored", path.display());
        return None;
    }
    match fs::read_to_string(path) {
        Ok(css) => Some(css),
        Err(e) => {
            log::warn!("Stylesheet '{}' could not be read: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Counts pages instead of producing a PDF.
    #[derive(Default)]
    struct CountingCompositor {
        calls: AtomicUsize,
    }

    impl Compositor for CountingCompositor {
        fn compose(&self, job: &CompositionJob<'_>) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(job.pages.len().to_string().into_bytes())
        }
    }

    fn printer() -> Printer<CountingCompositor> {
        let config = PrinterConfig::default();
        let renderer = LayoutRenderer::new(config.theme.clone());
        Printer::with_parts(config, renderer, CountingCompositor::default())
    }

    fn label(n: u64) -> LabelModel {
        LabelModel::new(n).unwrap()
    }

    #[test]
    fn consecutive_duplicates_are_suppressed() {
        let mut p = printer();
        for n in [5, 5, 7, 5] {
            p.add_label(&label(n)).unwrap();
        }
        assert_eq!(p.print_log(), &[5, 7, 5]);
        assert_eq!(p.page_count(), 3);
        assert_eq!(p.page_number(), 4);
    }

    #[test]
    fn only_later_pages_break_before() {
        let mut p = printer();
        p.add_label(&label(1)).unwrap();
        p.add_label(&label(2)).unwrap();
        assert!(!p.pages()[0].contains("page-break-before"));
        assert!(p.pages()[1].starts_with("<div style=\"page-break-before:always\">"));
    }

    #[test]
    fn state_machine() {
        let mut p = printer();
        assert_eq!(p.state(), DocumentState::Empty);
        p.add_page().unwrap();
        assert_eq!(p.state(), DocumentState::Accumulating);
        assert!(p.print_log().is_empty());
        assert_eq!(p.output().unwrap(), b"1");
        assert_eq!(p.state(), DocumentState::Finalized);

        assert!(matches!(p.add_label(&label(1)), Err(LabelError::ClosedDocument)));
        assert!(matches!(p.add_page(), Err(LabelError::ClosedDocument)));
        assert!(matches!(p.output(), Err(LabelError::ClosedDocument)));
        assert_eq!(p.compositor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn add_page_keeps_duplicate_check() {
        let mut p = printer();
        p.add_label(&label(5)).unwrap();
        p.add_page().unwrap();
        p.add_label(&label(5)).unwrap();
        assert_eq!(p.print_log(), &[5]);
        assert_eq!(p.page_count(), 2);
    }

    #[test]
    fn batch_commits_in_call_order() {
        let mut p = printer();
        let labels: Vec<_> = [3, 3, 1, 2, 2, 3].into_iter().map(label).collect();
        let log = p.add_labels(&labels).unwrap().to_vec();
        assert_eq!(log, vec![3, 1, 2, 3]);
    }

    #[test]
    fn missing_stylesheet_is_ignored() {
        let config = PrinterConfig {
            stylesheet: Some(PathBuf::from("/nonexistent/labels.css")),
            ..PrinterConfig::default()
        };
        let p = Printer::new(config);
        assert_eq!(p.stylesheet(), LabelTheme::default().stylesheet);
    }

    #[test]
    fn config_json_defaults() {
        let config = PrinterConfig::from_json(r#"{"format": [62, 29], "margins": {"top": 2}}"#).unwrap();
        assert_eq!(config.format, PageFormat::new(62.0, 29.0));
        assert_eq!(config.margins.top, 2.0);
        assert_eq!(config.margins.left, 4.0);
        assert_eq!(config.title, APP_NAME);
        assert!(PrinterConfig::from_json("[1]").is_err());
    }
}
