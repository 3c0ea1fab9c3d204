//! Export module for writing books to the five output formats.
//!
//! Provides the [`Exporter`] trait, the closed [`Format`] enum and one
//! exporter per format.
//!
//! # Architecture
//!
//! Each exporter follows the same builder pattern:
//! - `new()` creates an exporter with default configuration
//! - `with_config()` allows customization
//! - `export()` writes to any `Write + Seek` destination
//!
//! Exporters only read the [`BookModel`]; sections without content are
//! skipped, everything else is written in model order.
//!
//! # Example
//!
//! ```
//! use bookpress::export::{Format, export_book};
//! use bookpress::model::{BookModel, Chapter, Section};
//!
//! let book = BookModel::new("Test Book")
//!     .with_chapter(Chapter::new("Intro").with_section(Section::new("Hello", "World")));
//!
//! let output = export_book(&book, Format::Markdown)?;
//! assert_eq!(output.filename, "Test_Book.md");
//! assert_eq!(
//!     String::from_utf8(output.bytes).unwrap(),
//!     "# Test Book\n\n## Intro\n\n### Hello\n\nWorld\n\n"
//! );
//! # Ok::<(), bookpress::Error>(())
//! ```

use std::fmt;
use std::io::{Cursor, Seek, Write};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::BookModel;
use crate::util::sanitize_filename;

mod docx;
mod epub;
pub mod pdf;
mod text;
mod xml;

pub use docx::{DocxConfig, DocxExporter};
pub use epub::{EpubConfig, EpubExporter};
pub use pdf::{EmbeddedFont, PdfConfig, PdfExporter};
pub use text::{MarkdownExporter, TextExporter};
pub use xml::{check_well_formed, escape_xml};

/// Trait for exporting books to specific formats.
///
/// The writer can be:
/// - `std::fs::File` for disk output
/// - `std::io::Cursor<Vec<u8>>` for in-memory output
/// - Any other type implementing `Write + Seek`
pub trait Exporter {
    /// Export the book to the provided writer.
    fn export<W: Write + Seek>(&self, book: &BookModel, writer: &mut W) -> Result<()>;
}

/// The output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Markdown,
    Text,
    Epub,
    Docx,
    Pdf,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Markdown,
        Format::Text,
        Format::Epub,
        Format::Docx,
        Format::Pdf,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Markdown => "md",
            Format::Text => "txt",
            Format::Epub => "epub",
            Format::Docx => "docx",
            Format::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Format::Markdown => "text/markdown;charset=utf-8",
            Format::Text => "text/plain;charset=utf-8",
            Format::Epub => "application/epub+zip",
            Format::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Format::Pdf => "application/pdf",
        }
    }

    /// Zip compression, document serialization and page layout are the slow
    /// paths; callers should move these off the interactive thread.
    pub fn is_binary(self) -> bool {
        matches!(self, Format::Epub | Format::Docx | Format::Pdf)
    }

    /// `{sanitized(title)}.{ext}`
    pub fn filename(self, title: &str) -> String {
        format!("{}.{}", sanitize_filename(title), self.extension())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Format::Markdown),
            "txt" | "text" => Ok(Format::Text),
            "epub" => Ok(Format::Epub),
            "docx" | "word" => Ok(Format::Docx),
            "pdf" => Ok(Format::Pdf),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A finished export, ready to be saved or offered for download.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub format: Format,
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Per-format configuration for [`export_book_with`].
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub epub: EpubConfig,
    pub docx: DocxConfig,
    pub pdf: PdfConfig,
}

impl ExportOptions {
    pub fn with_pdf(mut self, pdf: PdfConfig) -> Self {
        self.pdf = pdf;
        self
    }
}

/// Export a book with the default configuration for `format`.
///
/// Validates the book first; a book without a title is rejected before any
/// output is produced.
pub fn export_book(book: &BookModel, format: Format) -> Result<ExportOutput> {
    export_book_with(book, format, &ExportOptions::default())
}

/// Export a book with explicit per-format configuration.
pub fn export_book_with(
    book: &BookModel,
    format: Format,
    options: &ExportOptions,
) -> Result<ExportOutput> {
    book.validate()?;

    tracing::info!(
        format = %format,
        chapters = book.chapters().len(),
        sections = book.written_section_count(),
        "exporting '{}'",
        book.title()
    );

    let mut cursor = Cursor::new(Vec::new());
    match format {
        Format::Markdown => MarkdownExporter::new().export(book, &mut cursor)?,
        Format::Text => TextExporter::new().export(book, &mut cursor)?,
        Format::Epub => EpubExporter::new()
            .with_config(options.epub.clone())
            .export(book, &mut cursor)?,
        Format::Docx => DocxExporter::new()
            .with_config(options.docx.clone())
            .export(book, &mut cursor)?,
        Format::Pdf => PdfExporter::new()
            .with_config(options.pdf.clone())
            .export(book, &mut cursor)?,
    }
    let bytes = cursor.into_inner();

    tracing::info!(format = %format, size = bytes.len(), "export finished");

    Ok(ExportOutput {
        format,
        filename: format.filename(book.title()),
        mime_type: format.mime_type(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!("md".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!(".EPUB".parse::<Format>().unwrap(), Format::Epub);
        assert_eq!("Text".parse::<Format>().unwrap(), Format::Text);
        assert!(matches!(
            "mobi".parse::<Format>(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_format_round_trips_through_extension() {
        for format in Format::ALL {
            assert_eq!(format.extension().parse::<Format>().unwrap(), format);
        }
    }

    #[test]
    fn test_filename() {
        assert_eq!(Format::Pdf.filename("My Book: Vol 1"), "My_Book__Vol_1.pdf");
        assert_eq!(Format::Text.filename("三体"), "三体.txt");
    }

    #[test]
    fn test_binary_formats() {
        let binary: Vec<_> = Format::ALL.into_iter().filter(|f| f.is_binary()).collect();
        assert_eq!(binary, [Format::Epub, Format::Docx, Format::Pdf]);
    }

    #[test]
    fn test_export_rejects_untitled_book() {
        let book = BookModel::new("");
        assert!(matches!(
            export_book(&book, Format::Markdown),
            Err(Error::Precondition(_))
        ));
    }
}
