//! DOCX exporter.
//!
//! Builds a single flowed WordprocessingML document:
//!
//! - title page (bold large title, optional author, centered), page break
//! - per chapter: Heading 1, then per written section Heading 2 followed by
//!   the section content, page break between chapters
//!
//! Content is composed line by line: every non-blank line of a paragraph
//! or quote block becomes its own `w:p`. Inline markup is stripped to its
//! inner text.
//!
//! Composition ([`compose`]) is separate from serialization so the
//! paragraph flow can be inspected without unzipping anything.

use std::io::{Seek, Write};

use chrono::{DateTime, Utc};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::markup::{self, Block};
use crate::model::BookModel;
use crate::util;

use super::Exporter;
use super::xml::{check_well_formed, escape_xml};

/// Creator written to the document properties when the book has no author.
pub const DEFAULT_CREATOR: &str = "AI Book Writer";

/// Configuration for DOCX export.
#[derive(Debug, Clone, Default)]
pub struct DocxConfig {
    /// `dcterms:created`/`dcterms:modified`; the current time when unset.
    pub modified: Option<DateTime<Utc>>,
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: Option<i64>,
}

/// DOCX format exporter.
#[derive(Debug, Clone, Default)]
pub struct DocxExporter {
    config: DocxConfig,
}

impl DocxExporter {
    /// Create a new exporter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the exporter with custom settings.
    pub fn with_config(mut self, config: DocxConfig) -> Self {
        self.config = config;
        self
    }
}

/// A node of the document flow.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Paragraph(Paragraph),
    PageBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Center,
    Both,
}

/// A paragraph with direct formatting on top of its style.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub style: &'static str,
    pub align: Option<Align>,
    /// Twips.
    pub first_line_indent: Option<u32>,
    /// Twips.
    pub left_indent: Option<u32>,
    /// Twips.
    pub space_before: Option<u32>,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// Half-points.
    pub size: Option<u32>,
    pub color: Option<&'static str>,
}

impl Paragraph {
    fn new(style: &'static str, runs: Vec<Run>) -> Self {
        Self {
            style,
            align: None,
            first_line_indent: None,
            left_indent: None,
            space_before: None,
            runs,
        }
    }

    fn align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    /// Concatenated run text.
    #[cfg(test)]
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

impl Run {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Lay the book out as a flat sequence of paragraphs and page breaks.
pub fn compose(book: &BookModel) -> Vec<Node> {
    let mut nodes = Vec::new();

    // Title page
    let mut title = Paragraph::new(
        "Title",
        vec![Run {
            text: book.title().to_string(),
            bold: true,
            size: Some(56),
            ..Default::default()
        }],
    )
    .align(Align::Center);
    title.space_before = Some(3600);
    nodes.push(Node::Paragraph(title));

    if let Some(author) = book.author() {
        let mut author = Paragraph::new(
            "Subtitle",
            vec![Run {
                text: author.to_string(),
                size: Some(28),
                ..Default::default()
            }],
        )
        .align(Align::Center);
        author.space_before = Some(480);
        nodes.push(Node::Paragraph(author));
    }
    nodes.push(Node::PageBreak);

    let chapters = book.chapters();
    for (i, chapter) in chapters.iter().enumerate() {
        nodes.push(Node::Paragraph(Paragraph::new(
            "Heading1",
            vec![Run::plain(&chapter.title)],
        )));

        for section in chapter.written_sections() {
            nodes.push(Node::Paragraph(Paragraph::new(
                "Heading2",
                vec![Run::plain(&section.title)],
            )));
            compose_content(section.body().unwrap_or_default(), &mut nodes);
        }

        if i + 1 < chapters.len() {
            nodes.push(Node::PageBreak);
        }
    }

    nodes
}

fn compose_content(content: &str, nodes: &mut Vec<Node>) {
    for block in markup::parse(content) {
        match &block {
            Block::Heading { level, text } => {
                let style = match level {
                    1 => "Heading1",
                    2 => "Heading2",
                    _ => "Heading3",
                };
                nodes.push(Node::Paragraph(Paragraph::new(
                    style,
                    vec![Run::plain(markup::strip_inline(text))],
                )));
            }
            Block::Paragraph(_) => {
                for line in block.lines() {
                    let mut paragraph =
                        Paragraph::new("BodyText", vec![Run::plain(markup::strip_inline(line))])
                            .align(Align::Both);
                    paragraph.first_line_indent = Some(480);
                    nodes.push(Node::Paragraph(paragraph));
                }
            }
            Block::Quote(_) => {
                for line in block.lines() {
                    let mut paragraph = Paragraph::new(
                        "Quote",
                        vec![Run {
                            text: markup::strip_inline(line),
                            italic: true,
                            ..Default::default()
                        }],
                    );
                    paragraph.left_indent = Some(720);
                    nodes.push(Node::Paragraph(paragraph));
                }
            }
            Block::Rule => {
                nodes.push(Node::Paragraph(
                    Paragraph::new(
                        "Normal",
                        vec![Run {
                            text: "* * *".to_string(),
                            color: Some("999999"),
                            ..Default::default()
                        }],
                    )
                    .align(Align::Center),
                ));
            }
        }
    }
}

impl Exporter for DocxExporter {
    fn export<W: Write + Seek>(&self, book: &BookModel, writer: &mut W) -> Result<()> {
        let nodes = compose(book);
        let modified = self
            .config
            .modified
            .unwrap_or_else(util::utc_now)
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        let language = book.locale().code();

        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.config.compression_level.unwrap_or(6)));

        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
            ("_rels/.rels", ROOT_RELS_XML.to_string()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.to_string()),
            ("word/styles.xml", generate_styles(language)),
            ("word/document.xml", generate_document(&nodes)),
            ("docProps/core.xml", generate_core(book, &modified)),
            ("docProps/app.xml", APP_XML.to_string()),
        ];

        for (path, xml) in &parts {
            check_well_formed(path, xml)?;
            zip.start_file(*path, options)?;
            zip.write_all(xml.as_bytes())?;
        }

        zip.finish()?;
        tracing::debug!(paragraphs = nodes.len(), "docx package written");
        Ok(())
    }
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
  <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>
"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>
"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>
"#;

const APP_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
  <Application>bookpress</Application>
</Properties>
"#;

fn generate_styles(language: &str) -> String {
    let paragraph_style = |id: &str, name: &str, ppr: &str, rpr: &str| {
        format!(
            "  <w:style w:type=\"paragraph\" w:styleId=\"{id}\"><w:name w:val=\"{name}\"/><w:basedOn w:val=\"Normal\"/><w:next w:val=\"BodyText\"/><w:qFormat/><w:pPr>{ppr}</w:pPr><w:rPr>{rpr}</w:rPr></w:style>\n"
        )
    };

    let mut styles = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman" w:eastAsia="SimSun" w:cs="Times New Roman"/><w:sz w:val="24"/><w:szCs w:val="24"/><w:lang w:val="{lang}" w:eastAsia="{lang}"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="360" w:lineRule="auto"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>
"#,
        lang = escape_xml(language)
    );

    styles.push_str(&paragraph_style(
        "Title",
        "Title",
        "<w:jc w:val=\"center\"/><w:spacing w:after=\"480\"/>",
        "<w:b/><w:sz w:val=\"56\"/>",
    ));
    styles.push_str(&paragraph_style(
        "Subtitle",
        "Subtitle",
        "<w:jc w:val=\"center\"/>",
        "<w:sz w:val=\"28\"/>",
    ));
    styles.push_str(&paragraph_style(
        "Heading1",
        "heading 1",
        "<w:keepNext/><w:spacing w:before=\"480\" w:after=\"240\"/><w:jc w:val=\"center\"/><w:outlineLvl w:val=\"0\"/>",
        "<w:b/><w:sz w:val=\"36\"/>",
    ));
    styles.push_str(&paragraph_style(
        "Heading2",
        "heading 2",
        "<w:keepNext/><w:spacing w:before=\"360\" w:after=\"180\"/><w:outlineLvl w:val=\"1\"/>",
        "<w:b/><w:sz w:val=\"30\"/>",
    ));
    styles.push_str(&paragraph_style(
        "Heading3",
        "heading 3",
        "<w:keepNext/><w:spacing w:before=\"240\" w:after=\"120\"/><w:outlineLvl w:val=\"2\"/>",
        "<w:b/><w:sz w:val=\"26\"/>",
    ));
    styles.push_str(&paragraph_style(
        "Quote",
        "Quote",
        "<w:ind w:left=\"720\" w:right=\"720\"/>",
        "<w:i/><w:color w:val=\"555555\"/>",
    ));
    styles.push_str(&paragraph_style(
        "BodyText",
        "Body Text",
        "<w:jc w:val=\"both\"/><w:ind w:firstLine=\"480\"/>",
        "",
    ));
    styles.push_str("</w:styles>\n");
    styles
}

fn generate_document(nodes: &[Node]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>
"#,
    );

    for node in nodes {
        match node {
            Node::PageBreak => {
                xml.push_str("    <w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>\n");
            }
            Node::Paragraph(paragraph) => write_paragraph(&mut xml, paragraph),
        }
    }

    // A4 portrait, one-inch margins
    xml.push_str(
        r#"    <w:sectPr>
      <w:pgSz w:w="11906" w:h="16838"/>
      <w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/>
    </w:sectPr>
  </w:body>
</w:document>
"#,
    );
    xml
}

fn write_paragraph(xml: &mut String, paragraph: &Paragraph) {
    xml.push_str("    <w:p><w:pPr>");
    xml.push_str(&format!("<w:pStyle w:val=\"{}\"/>", paragraph.style));
    if let Some(before) = paragraph.space_before {
        xml.push_str(&format!("<w:spacing w:before=\"{before}\"/>"));
    }
    match (paragraph.left_indent, paragraph.first_line_indent) {
        (None, None) => {}
        (left, first) => {
            xml.push_str("<w:ind");
            if let Some(left) = left {
                xml.push_str(&format!(" w:left=\"{left}\""));
            }
            if let Some(first) = first {
                xml.push_str(&format!(" w:firstLine=\"{first}\""));
            }
            xml.push_str("/>");
        }
    }
    if let Some(align) = paragraph.align {
        let value = match align {
            Align::Center => "center",
            Align::Both => "both",
        };
        xml.push_str(&format!("<w:jc w:val=\"{value}\"/>"));
    }
    xml.push_str("</w:pPr>");

    for run in &paragraph.runs {
        xml.push_str("<w:r>");
        if run.bold || run.italic || run.size.is_some() || run.color.is_some() {
            xml.push_str("<w:rPr>");
            if run.bold {
                xml.push_str("<w:b/>");
            }
            if run.italic {
                xml.push_str("<w:i/>");
            }
            if let Some(color) = run.color {
                xml.push_str(&format!("<w:color w:val=\"{color}\"/>"));
            }
            if let Some(size) = run.size {
                xml.push_str(&format!("<w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/>"));
            }
            xml.push_str("</w:rPr>");
        }
        xml.push_str(&format!(
            "<w:t xml:space=\"preserve\">{}</w:t></w:r>",
            escape_xml(&run.text)
        ));
    }
    xml.push_str("</w:p>\n");
}

fn generate_core(book: &BookModel, modified: &str) -> String {
    let creator = book.author().unwrap_or(DEFAULT_CREATOR);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>{}</dc:title>
  <dc:creator>{}</dc:creator>
  <dc:description>{}</dc:description>
  <dc:language>{}</dc:language>
  <dcterms:created xsi:type="dcterms:W3CDTF">{modified}</dcterms:created>
  <dcterms:modified xsi:type="dcterms:W3CDTF">{modified}</dcterms:modified>
</cp:coreProperties>
"#,
        escape_xml(book.title()),
        escape_xml(creator),
        escape_xml(&book.settings.topic),
        book.locale().code(),
    )
}
