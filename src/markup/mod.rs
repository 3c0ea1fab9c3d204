//! The markup subset shared by every exporter.
//!
//! Section bodies are written in a constrained Markdown: `#`/`##`/`###`
//! headings, `**bold**`, `*italic*`, `` `code` ``, `[text](url)` links,
//! `> ` block quotes, `---`/`***` rules and blank-line separated paragraphs.
//! Nothing else is recognised; anything outside the subset is plain text.
//!
//! The module is split the same way for every consumer:
//!
//! - [`parse`]: raw content → block sequence ([`Block`])
//! - [`parse_inline`]: one line of text → inline spans ([`Inline`])
//! - [`strip`]: raw text → plain text (fixed-order regex passes)
//! - [`strip_inline`]: block text → plain text (the inline passes only)
//! - [`to_html`]: blocks → semantic XHTML fragments
//!
//! [`parse_inline`] runs the same passes as [`strip`], so the text of its
//! spans is exactly what [`strip_inline`] returns.
//!
//! Blocks are the canonical granularity. A paragraph keeps its inner line
//! breaks so exporters that care about lines (DOCX, plain text) can still
//! see them.

mod html;
mod inline;
mod parse;
mod strip;

pub use html::{inline_to_html, to_html};
pub use inline::parse_inline;
pub use parse::parse;
pub use strip::{strip, strip_inline};

/// A block-level element of section content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `#` (1) to `###` (3). Deeper markers clamp to 3.
    Heading { level: u8, text: String },
    /// Consecutive non-blank lines, joined with `\n`.
    Paragraph(String),
    /// Consecutive `>` lines with the marker removed, joined with `\n`.
    Quote(String),
    /// `---` or `***` alone on a line.
    Rule,
}

/// An inline span inside a heading, paragraph or quote line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Code(String),
    /// Only the content is rendered; the target is kept for callers.
    Link { content: Vec<Inline>, url: String },
}

impl Block {
    /// Lines of the block's text, or nothing for a rule.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        let text = match self {
            Block::Heading { text, .. } | Block::Paragraph(text) | Block::Quote(text) => {
                text.as_str()
            }
            Block::Rule => "",
        };
        text.lines()
    }
}
