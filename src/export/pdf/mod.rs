//! PDF exporter: a direct vector text flow.
//!
//! The book is laid out by [`flow`] into fixed-size pages of positioned
//! text runs, which [`render`] then writes with `lopdf`. Page 1 is the title
//! page, every chapter opens with its own title page, and content pages
//! carry a running page label.
//!
//! By default text is set in the standard Type1 fonts, which only cover
//! WinAnsi. For other scripts supply a TrueType font with
//! [`PdfConfig::with_font`]; it is embedded whole and also drives line
//! wrapping. Characters the active font cannot draw are replaced and
//! reported with a warning.

use std::io::{Seek, Write};
use std::sync::Arc;

use crate::error::Result;
use crate::model::{BookModel, FontSize, Locale};

use super::Exporter;

pub mod flow;
pub mod font;
pub mod metrics;
pub mod render;

pub use flow::{FlowSettings, Page, PageKind};
pub use font::EmbeddedFont;
pub use metrics::Metrics;

/// Physical page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 210.0,
        height: 297.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Configuration for PDF export.
///
/// All lengths are millimetres.
#[derive(Debug, Clone)]
pub struct PdfConfig {
    pub page_size: PageSize,
    pub margin_x: f32,
    pub margin_y: f32,
    pub line_height: f32,
    pub blank_gap: f32,
    pub section_gap: f32,
    /// Running page labels on every page after the title page.
    pub page_numbers: bool,
    /// Deflate content streams.
    pub compress: bool,
    /// TrueType font used for every face instead of the standard 14.
    pub font: Option<Arc<EmbeddedFont>>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin_x: 25.0,
            margin_y: 30.0,
            line_height: 7.0,
            blank_gap: 4.0,
            section_gap: 10.0,
            page_numbers: true,
            compress: true,
            font: None,
        }
    }
}

impl PdfConfig {
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_margins(mut self, x: f32, y: f32) -> Self {
        self.margin_x = x;
        self.margin_y = y;
        self
    }

    pub fn with_page_numbers(mut self, enabled: bool) -> Self {
        self.page_numbers = enabled;
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn with_font(mut self, font: EmbeddedFont) -> Self {
        self.font = Some(Arc::new(font));
        self
    }

    /// Glyph widths for the configured font.
    pub fn metrics(&self) -> Metrics<'_> {
        match &self.font {
            Some(font) => Metrics::Embedded(font.as_ref()),
            None => Metrics::Standard,
        }
    }

    /// Flow settings for a book, taking the body size from its layout.
    pub fn flow_settings(&self, book: &BookModel) -> FlowSettings {
        let body_size = match book.layout_settings.font_size {
            FontSize::Small => 10.0,
            FontSize::Medium => 11.0,
            FontSize::Large => 12.0,
        };
        FlowSettings {
            page_width: self.page_size.width,
            page_height: self.page_size.height,
            margin_x: self.margin_x,
            margin_y: self.margin_y,
            line_height: self.line_height,
            blank_gap: self.blank_gap,
            section_gap: self.section_gap,
            body_size,
            page_numbers: self.page_numbers,
        }
    }
}

/// PDF format exporter.
#[derive(Debug, Clone, Default)]
pub struct PdfExporter {
    config: PdfConfig,
}

impl PdfExporter {
    /// Create a new exporter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the exporter with custom settings.
    pub fn with_config(mut self, config: PdfConfig) -> Self {
        self.config = config;
        self
    }

    /// Lay the book out without rendering it.
    pub fn paginate(&self, book: &BookModel) -> Vec<Page> {
        let metrics = self.config.metrics();
        // Fall back to English page labels the font cannot draw.
        let mut labels = book.locale().labels();
        if !metrics.covers(&labels.page_number(2)) {
            tracing::debug!(locale = book.locale().code(), "page labels not covered by font");
            labels = Locale::English.labels();
        }
        flow::layout(book, &self.config.flow_settings(book), &labels, metrics)
    }
}

impl Exporter for PdfExporter {
    fn export<W: Write + Seek>(&self, book: &BookModel, writer: &mut W) -> Result<()> {
        let pages = self.paginate(book);
        let renderer = render::Renderer {
            book,
            width: self.config.page_size.width,
            height: self.config.page_size.height,
            compress: self.config.compress,
            font: self.config.font.as_deref(),
        };
        renderer.render(&pages, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chapter, LayoutSettings, Section, Theme};
    use std::io::Cursor;

    fn export(book: &BookModel, exporter: &PdfExporter) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        exporter.export(book, &mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_page_count_floor() {
        let book = BookModel::new("T")
            .with_chapter(Chapter::new("A").with_section(Section::new("s", "text")))
            .with_chapter(Chapter::new("B").with_section(Section::new("s", "more")));
        let bytes = export(&book, &PdfExporter::new());

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 5);
    }

    #[test]
    fn test_custom_page_size() {
        let exporter = PdfExporter::new()
            .with_config(PdfConfig::default().with_page_size(PageSize::new(148.0, 210.0)));
        let pages = exporter.paginate(&BookModel::new("A5"));
        assert_eq!(pages.len(), 1);

        let bytes = export(&BookModel::new("A5"), &exporter);
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_body_size_follows_layout() {
        let book = BookModel::new("T").with_layout(LayoutSettings {
            font_size: FontSize::Large,
            theme: Theme::Scifi,
            ..Default::default()
        });
        assert_eq!(PdfConfig::default().flow_settings(&book).body_size, 12.0);
    }

    fn sample_font() -> EmbeddedFont {
        EmbeddedFont::from_bytes(include_bytes!("../../../tests/fixtures/cjk_sample.ttf").to_vec())
            .unwrap()
    }

    #[test]
    fn test_cjk_book_uses_encodable_labels() {
        let book = BookModel::new("三体")
            .with_language("中文")
            .with_chapter(Chapter::new("第一章"));
        let pages = PdfExporter::new().paginate(&book);
        assert_eq!(pages[1].runs.last().map(|r| r.text.as_str()), Some("Page 2"));
    }

    #[test]
    fn test_embedded_font_keeps_localized_labels() {
        let book = BookModel::new("三体")
            .with_language("中文")
            .with_chapter(Chapter::new("第一章"));
        let exporter =
            PdfExporter::new().with_config(PdfConfig::default().with_font(sample_font()));
        let pages = exporter.paginate(&book);
        assert_eq!(pages[1].runs.last().map(|r| r.text.as_str()), Some("第 2 页"));
    }

    #[test]
    fn test_embedded_font_replaces_base_fonts() {
        let book = BookModel::new("星の海");
        let exporter = PdfExporter::new().with_config(
            PdfConfig::default()
                .with_font(sample_font())
                .with_compression(false),
        );
        let haystack = String::from_utf8_lossy(&export(&book, &exporter)).into_owned();
        assert!(haystack.contains("/Type0"));
        assert!(haystack.contains("/Identity-H"));
        assert!(haystack.contains("BookpressSample-Regular"));
        assert!(!haystack.contains("WinAnsiEncoding"));
    }

    #[test]
    fn test_uncompressed_output_contains_text() {
        let book = BookModel::new("Plain Title");
        let exporter = PdfExporter::new().with_config(PdfConfig::default().with_compression(false));
        let bytes = export(&book, &exporter);
        let haystack = String::from_utf8_lossy(&bytes);
        assert!(haystack.contains("(Plain Title)"));
        assert!(haystack.contains("Times-Roman"));
        assert!(haystack.contains("WinAnsiEncoding"));
    }
}
