//! # bookpress
//!
//! Export a drafted book to EPUB, DOCX, PDF, Markdown and plain text.
//!
//! ## Features
//!
//! - One in-memory [`BookModel`] (the drafting app's JSON project format)
//! - Five independent exporters behind the [`export::Exporter`] trait
//! - A shared parser for the constrained Markdown used in section bodies
//! - EPUB 3 packages with EPUB 2 fallbacks, flowed DOCX, paginated vector PDF
//! - An async [`service::ExportService`] for interactive hosts
//!
//! ## Quick Start
//!
//! ```
//! use bookpress::{BookModel, Format, export_book};
//! use bookpress::model::{Chapter, Section};
//!
//! let book = BookModel::new("My Book")
//!     .with_author("Author Name")
//!     .with_chapter(
//!         Chapter::new("Beginnings")
//!             .with_section(Section::new("Opening", "It was a *dark* night.")),
//!     );
//!
//! let epub = export_book(&book, Format::Epub)?;
//! assert_eq!(epub.filename, "My_Book.epub");
//! assert_eq!(epub.mime_type, "application/epub+zip");
//! # Ok::<(), bookpress::Error>(())
//! ```
//!
//! ## Loading a project
//!
//! ```no_run
//! use bookpress::{BookModel, Format, export_book};
//!
//! let json = std::fs::read_to_string("project.json")?;
//! let book = BookModel::from_json(&json)?;
//! let pdf = export_book(&book, Format::Pdf)?;
//! std::fs::write(&pdf.filename, &pdf.bytes)?;
//! # Ok::<(), bookpress::Error>(())
//! ```

pub mod error;
pub mod export;
pub mod markup;
pub mod model;
pub mod util;

#[cfg(not(target_arch = "wasm32"))]
pub mod service;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{Error, Result};
pub use export::{ExportOptions, ExportOutput, Format, export_book, export_book_with};
pub use model::BookModel;
