//! Async front door for exports.
//!
//! [`ExportService`] is what an interactive host calls. It snapshots the
//! book before exporting, refuses to start a second export while one is
//! running, and moves the binary formats onto the blocking pool so the
//! caller's executor stays responsive.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::export::{ExportOptions, ExportOutput, Format, export_book_with};
use crate::model::BookModel;

/// Serializes exports for one host.
#[derive(Debug, Default)]
pub struct ExportService {
    running: Mutex<()>,
    options: ExportOptions,
}

impl ExportService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `options` for every export.
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether an export is in flight.
    pub fn is_busy(&self) -> bool {
        self.running.try_lock().is_err()
    }

    /// Export `book` to `format`.
    ///
    /// The book is cloned up front; later edits by the caller do not leak
    /// into a running export. Fails with [`Error::Busy`] if another export
    /// has not finished yet.
    pub async fn export(&self, book: &BookModel, format: Format) -> Result<ExportOutput> {
        let _running = self.running.try_lock().map_err(|_| Error::Busy)?;
        let snapshot = book.clone();

        if !format.is_binary() {
            return export_book_with(&snapshot, format, &self.options);
        }

        let options = self.options.clone();
        tokio::task::spawn_blocking(move || export_book_with(&snapshot, format, &options))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }

    /// Export every format in turn.
    pub async fn export_all(&self, book: &BookModel) -> Result<Vec<ExportOutput>> {
        let mut outputs = Vec::with_capacity(Format::ALL.len());
        for format in Format::ALL {
            outputs.push(self.export(book, format).await?);
        }
        Ok(outputs)
    }
}

/// Write an export into `dir` under its own filename, creating `dir` if
/// needed. Returns the written path.
pub async fn save(output: &ExportOutput, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;

    let path = dir.join(&output.filename);
    tokio::fs::write(&path, &output.bytes).await?;

    tracing::info!(path = %path.display(), size = output.bytes.len(), "saved export");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chapter, Section};

    fn sample() -> BookModel {
        BookModel::new("Service Book")
            .with_chapter(Chapter::new("One").with_section(Section::new("S", "Body text.")))
    }

    #[tokio::test]
    async fn test_export_text_and_binary() {
        let service = ExportService::new();

        let md = service.export(&sample(), Format::Markdown).await.unwrap();
        assert_eq!(md.filename, "Service_Book.md");

        let epub = service.export(&sample(), Format::Epub).await.unwrap();
        assert_eq!(epub.mime_type, "application/epub+zip");
        assert!(epub.bytes.starts_with(b"PK"));
        assert!(!service.is_busy());
    }

    #[tokio::test]
    async fn test_second_export_is_refused_while_busy() {
        let service = ExportService::new();
        let _held = service.running.try_lock().unwrap();

        assert!(service.is_busy());
        assert!(matches!(
            service.export(&sample(), Format::Text).await,
            Err(Error::Busy)
        ));
    }

    #[tokio::test]
    async fn test_lock_released_after_failure() {
        let service = ExportService::new();
        assert!(matches!(
            service.export(&BookModel::new(""), Format::Pdf).await,
            Err(Error::Precondition(_))
        ));
        assert!(!service.is_busy());
    }

    #[tokio::test]
    async fn test_save_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = ExportService::new();
        let output = service.export(&sample(), Format::Text).await.unwrap();

        let path = save(&output, dir.path().join("out")).await.unwrap();
        assert_eq!(path, dir.path().join("out").join("Service_Book.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), output.bytes);
    }

    #[tokio::test]
    async fn test_options_reach_the_exporter() {
        let font = crate::export::EmbeddedFont::from_bytes(
            include_bytes!("../tests/fixtures/cjk_sample.ttf").to_vec(),
        )
        .unwrap();
        let options = ExportOptions::default()
            .with_pdf(crate::export::PdfConfig::default().with_font(font).with_compression(false));
        let service = ExportService::new().with_options(options);

        let pdf = service.export(&sample(), Format::Pdf).await.unwrap();
        let haystack = String::from_utf8_lossy(&pdf.bytes).into_owned();
        assert!(haystack.contains("BookpressSample-Regular"));
    }

    #[tokio::test]
    async fn test_export_all() {
        let outputs = ExportService::new().export_all(&sample()).await.unwrap();
        let names: Vec<_> = outputs.iter().map(|o| o.filename.as_str()).collect();
        assert_eq!(
            names,
            [
                "Service_Book.md",
                "Service_Book.txt",
                "Service_Book.epub",
                "Service_Book.docx",
                "Service_Book.pdf",
            ]
        );
    }
}
