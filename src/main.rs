//! bookpress - export a drafted book project

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use bookpress::export::{EmbeddedFont, ExportOptions, PdfConfig};
use bookpress::service::{self, ExportService};
use bookpress::{BookModel, Format};

#[derive(Parser)]
#[command(name = "bookpress")]
#[command(version, about = "Export a book project to EPUB, DOCX, PDF, Markdown and text", long_about = None)]
#[command(after_help = "EXAMPLES:
    bookpress book.json                 Export every format into the current directory
    bookpress book.json -f epub -f pdf  Export EPUB and PDF only
    bookpress book.json -o out/         Export into out/
    bookpress book.json -f pdf --font NotoSansSC.ttf
                                        Set the PDF in an embedded font
    bookpress -i book.json              Show the book summary")]
struct Cli {
    /// Book project file (JSON)
    #[arg(value_name = "BOOK")]
    input: PathBuf,

    /// Output format (md, txt, epub, docx, pdf); repeat for several. Default: all
    #[arg(short, long = "format", value_name = "FORMAT")]
    formats: Vec<Format>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// TrueType font to embed in PDF output (needed for non-Latin text)
    #[arg(long, value_name = "TTF")]
    font: Option<PathBuf>,

    /// Show the book summary without exporting
    #[arg(short, long)]
    info: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bookpress=warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    let book = match load(&cli.input) {
        Ok(book) => book,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.info {
        show_info(&cli.input, &book);
        return ExitCode::SUCCESS;
    }

    match export(&book, &cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load(path: &Path) -> bookpress::Result<BookModel> {
    let json = std::fs::read_to_string(path)?;
    BookModel::from_json(&json)
}

fn show_info(path: &Path, book: &BookModel) {
    let settings = &book.settings;
    println!("File: {}", path.display());
    println!("Title: {}", book.title());
    if let Some(author) = book.author() {
        println!("Author: {author}");
    }
    if !settings.language.is_empty() {
        println!("Language: {} ({})", settings.language, book.locale().code());
    }
    if !settings.topic.is_empty() {
        println!("Topic: {}", settings.topic);
    }
    println!("Chapters: {}", book.chapters().len());

    let total: usize = book.chapters().iter().map(|c| c.sections.len()).sum();
    println!("Sections written: {}/{}", book.written_section_count(), total);

    let words: u64 = book
        .chapters()
        .iter()
        .flat_map(|c| c.written_sections())
        .map(|s| s.word_count)
        .sum();
    println!("Words: {words} (target {})", settings.word_count_target);
    if let Some(cover) = &book.cover_image {
        println!("Cover: {} ({} bytes)", cover.media_type, cover.data.len());
    }
}

async fn export(book: &BookModel, cli: &Cli) -> bookpress::Result<()> {
    let formats = if cli.formats.is_empty() {
        Format::ALL.to_vec()
    } else {
        cli.formats.clone()
    };

    let mut pdf = PdfConfig::default();
    if let Some(path) = &cli.font {
        let font = EmbeddedFont::from_bytes(std::fs::read(path)?)?;
        tracing::info!(font = font.name(), "embedding pdf font");
        pdf = pdf.with_font(font);
    }

    let service = ExportService::new().with_options(ExportOptions::default().with_pdf(pdf));
    for format in formats {
        let output = service.export(book, format).await?;
        let path = service::save(&output, &cli.output).await?;
        if !cli.quiet {
            println!("{} -> {}", format, path.display());
        }
    }
    Ok(())
}
