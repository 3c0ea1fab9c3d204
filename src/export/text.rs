//! Markdown and plain-text exporters.
//!
//! Both are straight string assembly over the book model. Markdown passes
//! section content through untouched (it is already in the markup subset);
//! plain text renders the parsed blocks with all markup stripped.

use std::io::{Seek, Write};

use crate::error::Result;
use crate::markup::{self, Block};
use crate::model::BookModel;

use super::Exporter;

/// Width of the rule framing each chapter title in plain text.
const CHAPTER_RULE_WIDTH: usize = 40;

/// Label printed before the author in plain text.
const AUTHOR_LABEL: &str = "作者 / Author";

/// Exporter for Markdown output.
#[derive(Debug, Clone, Default)]
pub struct MarkdownExporter;

impl MarkdownExporter {
    pub fn new() -> Self {
        Self
    }

    /// Render the whole book as a Markdown string.
    pub fn render(&self, book: &BookModel) -> String {
        let mut out = format!("# {}\n\n", book.title());

        if let Some(author) = book.author() {
            out.push_str(&format!("**{author}**\n\n---\n\n"));
        }

        for chapter in book.chapters() {
            out.push_str(&format!("## {}\n\n", chapter.title));
            for section in chapter.written_sections() {
                let body = section.body().unwrap_or_default();
                out.push_str(&format!("### {}\n\n{}\n\n", section.title, body));
            }
        }

        out
    }
}

impl Exporter for MarkdownExporter {
    fn export<W: Write + Seek>(&self, book: &BookModel, writer: &mut W) -> Result<()> {
        writer.write_all(self.render(book).as_bytes())?;
        Ok(())
    }
}

/// Exporter for plain-text output.
#[derive(Debug, Clone, Default)]
pub struct TextExporter;

impl TextExporter {
    pub fn new() -> Self {
        Self
    }

    /// Render the whole book as plain text.
    pub fn render(&self, book: &BookModel) -> String {
        let title = book.title();
        let mut out = format!("{title}\n{}\n\n", "=".repeat(title.chars().count()));

        if let Some(author) = book.author() {
            out.push_str(&format!("{AUTHOR_LABEL}: {author}\n\n"));
        }

        let rule = "-".repeat(CHAPTER_RULE_WIDTH);
        for chapter in book.chapters() {
            out.push_str(&format!("{rule}\n{}\n{rule}\n\n", chapter.title));
            for section in chapter.written_sections() {
                let body = section.body().unwrap_or_default();
                out.push_str(&format!("{}\n\n{}\n\n", section.title, plain_text(body)));
            }
        }

        out
    }
}

impl Exporter for TextExporter {
    fn export<W: Write + Seek>(&self, book: &BookModel, writer: &mut W) -> Result<()> {
        writer.write_all(self.render(book).as_bytes())?;
        Ok(())
    }
}

/// Section content with markup removed, one blank line between blocks.
fn plain_text(content: &str) -> String {
    markup::parse(content)
        .iter()
        .map(|block| match block {
            Block::Heading { text, .. } | Block::Paragraph(text) => markup::strip_inline(text),
            Block::Quote(text) => text
                .lines()
                .map(|line| format!("> {}", markup::strip_inline(line)))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Rule => "---".to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chapter, Section};

    fn sample() -> BookModel {
        BookModel::new("Test Book")
            .with_chapter(Chapter::new("Intro").with_section(Section::new("Hello", "World")))
    }

    #[test]
    fn test_markdown_minimal() {
        assert_eq!(
            MarkdownExporter::new().render(&sample()),
            "# Test Book\n\n## Intro\n\n### Hello\n\nWorld\n\n"
        );
    }

    #[test]
    fn test_markdown_author_and_passthrough() {
        let book = BookModel::new("T").with_author("Ada").with_chapter(
            Chapter::new("C")
                .with_section(Section::new("S", "**kept** [as](is)"))
                .with_section(Section::pending("Skipped")),
        );
        assert_eq!(
            MarkdownExporter::new().render(&book),
            "# T\n\n**Ada**\n\n---\n\n## C\n\n### S\n\n**kept** [as](is)\n\n"
        );
    }

    #[test]
    fn test_text_minimal() {
        let text = TextExporter::new().render(&sample());
        let rule = "-".repeat(40);
        assert_eq!(
            text,
            format!("Test Book\n=========\n\n{rule}\nIntro\n{rule}\n\nHello\n\nWorld\n\n")
        );
    }

    #[test]
    fn test_text_author_label() {
        let text = TextExporter::new().render(&BookModel::new("T").with_author("Ada"));
        assert_eq!(text, "T\n=\n\n作者 / Author: Ada\n\n");
    }

    #[test]
    fn test_text_underline_counts_characters() {
        let text = TextExporter::new().render(&BookModel::new("三体"));
        assert!(text.starts_with("三体\n==\n\n"));
    }

    #[test]
    fn test_plain_text_strips_markup() {
        let content = "## Part\n\nSome **bold**, *italic*, `code` and [a link](http://x).\nSecond line\n\n> *quoted*\n\n***";
        assert_eq!(
            plain_text(content),
            "Part\n\nSome bold, italic, code and a link.\nSecond line\n\n> quoted\n\n---"
        );
    }
}
