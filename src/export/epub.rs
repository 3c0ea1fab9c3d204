//! EPUB exporter.
//!
//! Packages the book as an EPUB 3 container that EPUB 2 readers can still
//! navigate through the NCX:
//!
//! ```text
//! mimetype                  (stored, first entry)
//! META-INF/container.xml
//! OEBPS/content.opf         manifest + spine (title page, then chapters)
//! OEBPS/toc.ncx             playOrder 1 = title page, 2.. = chapters
//! OEBPS/nav.xhtml           EPUB 3 navigation document (not in spine)
//! OEBPS/style.css
//! OEBPS/title.xhtml
//! OEBPS/chapter_{n}.xhtml   one per chapter, 1-indexed
//! OEBPS/cover.{ext}         only when the book has a cover image
//! ```

use std::io::{Seek, Write};

use chrono::{DateTime, Utc};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::markup;
use crate::model::{BookModel, Chapter};
use crate::util;

use super::Exporter;
use super::xml::{check_well_formed, escape_xml};

/// Configuration for EPUB export.
#[derive(Debug, Clone, Default)]
pub struct EpubConfig {
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: Option<i64>,
    /// Package identifier; a time-seeded `urn:uuid:` is generated when unset.
    pub identifier: Option<String>,
    /// `dcterms:modified`; the current time when unset.
    pub modified: Option<DateTime<Utc>>,
    /// `dc:language`; detected from the book's language setting when unset.
    pub language: Option<String>,
}

impl EpubConfig {
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// EPUB format exporter.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use bookpress::export::{EpubExporter, Exporter};
/// use bookpress::model::BookModel;
///
/// let mut out = Cursor::new(Vec::new());
/// EpubExporter::new().export(&BookModel::new("Empty"), &mut out)?;
/// assert_eq!(&out.get_ref()[30..38], b"mimetype");
/// # Ok::<(), bookpress::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EpubExporter {
    config: EpubConfig,
}

impl EpubExporter {
    /// Create a new exporter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the exporter with custom settings.
    pub fn with_config(mut self, config: EpubConfig) -> Self {
        self.config = config;
        self
    }
}

/// Everything the generated documents share.
struct Package<'a> {
    book: &'a BookModel,
    identifier: String,
    modified: String,
    language: String,
    cover_href: Option<String>,
}

struct ManifestItem {
    id: String,
    href: String,
    media_type: String,
    properties: Option<&'static str>,
}

impl Exporter for EpubExporter {
    fn export<W: Write + Seek>(&self, book: &BookModel, writer: &mut W) -> Result<()> {
        let package = Package {
            book,
            identifier: self
                .config
                .identifier
                .clone()
                .unwrap_or_else(|| format!("urn:uuid:{}", util::uuid_v4())),
            modified: self
                .config
                .modified
                .unwrap_or_else(util::utc_now)
                .format("%Y-%m-%dT%H:%M:%SZ")
                .to_string(),
            language: self
                .config
                .language
                .clone()
                .unwrap_or_else(|| book.locale().code().to_string()),
            cover_href: book
                .cover_image
                .as_ref()
                .map(|cover| format!("cover.{}", cover.extension())),
        };

        let mut zip = ZipWriter::new(writer);

        let compression_level = self.config.compression_level.unwrap_or(6);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level));

        // 1. Write mimetype (must be first, uncompressed)
        zip.start_file("mimetype", stored)?;
        zip.write_all(b"application/epub+zip")?;

        // 2. Write container.xml
        write_xml(&mut zip, "META-INF/container.xml", CONTAINER_XML, deflated)?;

        // 3. Package documents
        let manifest = build_manifest(&package);
        write_xml(&mut zip, "OEBPS/content.opf", &generate_opf(&package, &manifest), deflated)?;
        write_xml(&mut zip, "OEBPS/toc.ncx", &generate_ncx(&package), deflated)?;
        write_xml(&mut zip, "OEBPS/nav.xhtml", &generate_nav(&package), deflated)?;

        zip.start_file("OEBPS/style.css", deflated)?;
        zip.write_all(STYLE_CSS.as_bytes())?;

        // 4. Content documents
        write_xml(&mut zip, "OEBPS/title.xhtml", &generate_title_page(&package), deflated)?;
        for (i, chapter) in book.chapters().iter().enumerate() {
            let path = format!("OEBPS/{}", chapter_href(i));
            write_xml(&mut zip, &path, &generate_chapter(&package, chapter), deflated)?;
        }

        // 5. Cover image; already compressed, so store it
        if let (Some(cover), Some(href)) = (&book.cover_image, &package.cover_href) {
            zip.start_file(format!("OEBPS/{href}"), stored)?;
            zip.write_all(&cover.data)?;
        }

        zip.finish()?;
        tracing::debug!(
            chapters = book.chapters().len(),
            identifier = %package.identifier,
            "epub package written"
        );
        Ok(())
    }
}

fn write_xml<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    path: &str,
    xml: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    check_well_formed(path, xml)?;
    zip.start_file(path, options)?;
    zip.write_all(xml.as_bytes())?;
    Ok(())
}

/// Container.xml template.
const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

const STYLE_CSS: &str = r#"body {
  font-family: Georgia, "Times New Roman", serif;
  line-height: 1.6;
  margin: 0 5%;
}
h1 {
  text-align: center;
  margin: 2em 0 1.5em;
  page-break-before: always;
}
h2 {
  margin: 1.5em 0 0.8em;
}
h3, h4 {
  margin: 1.2em 0 0.6em;
}
p {
  text-align: justify;
  text-indent: 2em;
  margin: 0 0 0.6em;
}
blockquote {
  border-left: 3px solid #999;
  margin: 1em 0;
  padding-left: 1em;
  font-style: italic;
}
blockquote p {
  text-indent: 0;
}
hr {
  border: none;
  border-top: 1px solid #ccc;
  margin: 2em 25%;
}
code {
  font-family: "Courier New", monospace;
}
.title-page {
  text-align: center;
  margin-top: 30%;
}
.title-page h1 {
  page-break-before: avoid;
}
.title-page .author {
  text-indent: 0;
  text-align: center;
  font-size: 1.2em;
  margin-top: 2em;
}
.cover {
  text-align: center;
}
.cover img {
  max-width: 100%;
  max-height: 60vh;
}
"#;

fn chapter_href(index: usize) -> String {
    format!("chapter_{}.xhtml", index + 1)
}

fn build_manifest(package: &Package<'_>) -> Vec<ManifestItem> {
    let xhtml = "application/xhtml+xml";
    let mut items = vec![
        ManifestItem {
            id: "ncx".to_string(),
            href: "toc.ncx".to_string(),
            media_type: "application/x-dtbncx+xml".to_string(),
            properties: None,
        },
        ManifestItem {
            id: "nav".to_string(),
            href: "nav.xhtml".to_string(),
            media_type: xhtml.to_string(),
            properties: Some("nav"),
        },
        ManifestItem {
            id: "style".to_string(),
            href: "style.css".to_string(),
            media_type: "text/css".to_string(),
            properties: None,
        },
        ManifestItem {
            id: "title".to_string(),
            href: "title.xhtml".to_string(),
            media_type: xhtml.to_string(),
            properties: None,
        },
    ];

    for i in 0..package.book.chapters().len() {
        items.push(ManifestItem {
            id: format!("chapter_{}", i + 1),
            href: chapter_href(i),
            media_type: xhtml.to_string(),
            properties: None,
        });
    }

    if let (Some(cover), Some(href)) = (&package.book.cover_image, &package.cover_href) {
        items.push(ManifestItem {
            id: "cover-image".to_string(),
            href: href.clone(),
            media_type: cover.media_type.clone(),
            properties: Some("cover-image"),
        });
    }

    items
}

/// Generate content.opf from metadata and manifest.
fn generate_opf(package: &Package<'_>, manifest: &[ManifestItem]) -> String {
    let book = package.book;
    let mut opf = String::new();

    opf.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId" xml:lang="{}">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
        escape_xml(&package.language)
    ));

    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
        escape_xml(&package.identifier)
    ));
    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape_xml(book.title())
    ));
    if let Some(author) = book.author() {
        opf.push_str(&format!(
            "    <dc:creator>{}</dc:creator>\n",
            escape_xml(author)
        ));
    }
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape_xml(&package.language)
    ));
    if !book.settings.topic.trim().is_empty() {
        opf.push_str(&format!(
            "    <dc:description>{}</dc:description>\n",
            escape_xml(&book.settings.topic)
        ));
    }

    // dcterms:modified (required for EPUB3)
    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        package.modified
    ));
    if package.cover_href.is_some() {
        opf.push_str("    <meta name=\"cover\" content=\"cover-image\"/>\n");
    }
    opf.push_str("  </metadata>\n");

    // Manifest
    opf.push_str("  <manifest>\n");
    for item in manifest {
        let properties = item
            .properties
            .map(|p| format!(" properties=\"{p}\""))
            .unwrap_or_default();
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{}/>\n",
            escape_xml(&item.id),
            escape_xml(&item.href),
            escape_xml(&item.media_type),
            properties
        ));
    }
    opf.push_str("  </manifest>\n");

    // Spine: title page, then chapters in document order
    opf.push_str("  <spine toc=\"ncx\">\n");
    opf.push_str("    <itemref idref=\"title\"/>\n");
    for i in 0..book.chapters().len() {
        opf.push_str(&format!("    <itemref idref=\"chapter_{}\"/>\n", i + 1));
    }
    opf.push_str("  </spine>\n");

    opf.push_str("</package>\n");
    opf
}

/// Generate toc.ncx: the title page, then one navPoint per chapter.
fn generate_ncx(package: &Package<'_>) -> String {
    let book = package.book;
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content=""#,
    );
    ncx.push_str(&escape_xml(&package.identifier));
    ncx.push_str(
        r#""/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>"#,
    );
    ncx.push_str(&escape_xml(book.title()));
    ncx.push_str(
        r#"</text>
  </docTitle>
  <navMap>
"#,
    );

    write_nav_point(&mut ncx, 1, book.title(), "title.xhtml");
    for (i, chapter) in book.chapters().iter().enumerate() {
        write_nav_point(&mut ncx, i + 2, &chapter.title, &chapter_href(i));
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn write_nav_point(ncx: &mut String, play_order: usize, label: &str, src: &str) {
    ncx.push_str(&format!(
        "    <navPoint id=\"navPoint-{play_order}\" playOrder=\"{play_order}\">\n"
    ));
    ncx.push_str(&format!(
        "      <navLabel><text>{}</text></navLabel>\n",
        escape_xml(label)
    ));
    ncx.push_str(&format!("      <content src=\"{}\"/>\n", escape_xml(src)));
    ncx.push_str("    </navPoint>\n");
}

/// XHTML wrapper shared by the content documents.
fn xhtml_document(package: &Package<'_>, title: &str, body: &str) -> String {
    let lang = escape_xml(&package.language);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <meta charset="UTF-8"/>
  <title>{}</title>
  <link rel="stylesheet" type="text/css" href="style.css"/>
</head>
<body>
{body}</body>
</html>
"#,
        escape_xml(title)
    )
}

fn generate_nav(package: &Package<'_>) -> String {
    let labels = package.book.locale().labels();
    let mut body = format!(
        "<nav epub:type=\"toc\" id=\"toc\">\n<h1>{}</h1>\n<ol>\n",
        escape_xml(labels.contents)
    );
    body.push_str(&format!(
        "<li><a href=\"title.xhtml\">{}</a></li>\n",
        escape_xml(package.book.title())
    ));
    for (i, chapter) in package.book.chapters().iter().enumerate() {
        body.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            chapter_href(i),
            escape_xml(&chapter.title)
        ));
    }
    body.push_str("</ol>\n</nav>\n");
    xhtml_document(package, labels.contents, &body)
}

fn generate_title_page(package: &Package<'_>) -> String {
    let book = package.book;
    let mut body = String::from("<div class=\"title-page\">\n");

    if let Some(href) = &package.cover_href {
        body.push_str(&format!(
            "<div class=\"cover\"><img src=\"{}\" alt=\"{}\"/></div>\n",
            escape_xml(href),
            escape_xml(book.title())
        ));
    }
    body.push_str(&format!("<h1>{}</h1>\n", escape_xml(book.title())));
    if let Some(author) = book.author() {
        body.push_str(&format!("<p class=\"author\">{}</p>\n", escape_xml(author)));
    }
    body.push_str("</div>\n");

    xhtml_document(package, book.title(), &body)
}

fn generate_chapter(package: &Package<'_>, chapter: &Chapter) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape_xml(&chapter.title));

    for section in chapter.written_sections() {
        body.push_str(&format!("<h2>{}</h2>\n", escape_xml(&section.title)));
        let blocks = markup::parse(section.body().unwrap_or_default());
        body.push_str(&markup::to_html(&blocks));
    }

    xhtml_document(package, &chapter.title, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Section;

    fn package(book: &BookModel) -> Package<'_> {
        Package {
            book,
            identifier: "urn:uuid:test".to_string(),
            modified: "2024-05-01T12:00:00Z".to_string(),
            language: "en".to_string(),
            cover_href: None,
        }
    }

    #[test]
    fn test_chapter_document() {
        let book = BookModel::new("B");
        let chapter = Chapter::new("One & Two")
            .with_section(Section::new("First", "Hello **there**"))
            .with_section(Section::pending("Empty"));
        let xhtml = generate_chapter(&package(&book), &chapter);

        assert!(xhtml.contains("<h1>One &amp; Two</h1>"));
        assert!(xhtml.contains("<h2>First</h2>\n<p>Hello <strong>there</strong></p>"));
        assert!(!xhtml.contains("Empty"));
        check_well_formed("chapter", &xhtml).unwrap();
    }

    #[test]
    fn test_title_page_author() {
        let book = BookModel::new("B").with_author("Ada");
        let xhtml = generate_title_page(&package(&book));
        assert!(xhtml.contains("<p class=\"author\">Ada</p>"));

        let anonymous = BookModel::new("B").with_author("Unknown");
        let xhtml = generate_title_page(&package(&anonymous));
        assert!(!xhtml.contains("author\">"));
    }

    #[test]
    fn test_ncx_play_order() {
        let book = BookModel::new("B")
            .with_chapter(Chapter::new("One"))
            .with_chapter(Chapter::new("Two"));
        let ncx = generate_ncx(&package(&book));

        assert!(ncx.contains("<meta name=\"dtb:uid\" content=\"urn:uuid:test\"/>"));
        assert!(ncx.contains("playOrder=\"1\""));
        let one = ncx.find("chapter_1.xhtml").unwrap();
        let two = ncx.find("chapter_2.xhtml").unwrap();
        assert!(one < two);
        assert!(ncx.contains("<navPoint id=\"navPoint-3\" playOrder=\"3\">"));
        check_well_formed("ncx", &ncx).unwrap();
    }

    #[test]
    fn test_opf_spine_and_manifest() {
        let book = BookModel::new("B")
            .with_topic("Topic <x>")
            .with_chapter(Chapter::new("One"))
            .with_chapter(Chapter::new("Two"));
        let package = package(&book);
        let opf = generate_opf(&package, &build_manifest(&package));

        assert_eq!(opf.matches("<itemref ").count(), 3);
        assert!(opf.contains("<dc:description>Topic &lt;x&gt;</dc:description>"));
        assert!(opf.contains("<meta property=\"dcterms:modified\">2024-05-01T12:00:00Z</meta>"));
        assert!(opf.contains("href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\""));
        check_well_formed("opf", &opf).unwrap();
    }
}
