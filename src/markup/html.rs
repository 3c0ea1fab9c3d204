//! Blocks → XHTML fragments.

use std::fmt::Write;

use super::{Block, Inline, parse_inline};
use crate::export::escape_xml;

/// Render blocks as XHTML body content.
///
/// Content headings shift down one level (`#` → `<h2>`) because `<h1>` is the
/// chapter title; section titles are also `<h2>`, so `#` and `##` in content
/// both land at or below the section heading. Text is escaped before any tag
/// is inserted.
pub fn to_html(blocks: &[Block]) -> String {
    let mut out = String::new();

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let tag = level.saturating_add(1).min(4);
                let _ = writeln!(out, "<h{tag}>{}</h{tag}>", inline_to_html(text));
            }
            Block::Paragraph(text) => {
                let _ = writeln!(out, "<p>{}</p>", lines_to_html(text));
            }
            Block::Quote(text) => {
                let _ = writeln!(out, "<blockquote><p>{}</p></blockquote>", lines_to_html(text));
            }
            Block::Rule => out.push_str("<hr/>\n"),
        }
    }

    out
}

/// Render one line of inline markup as escaped XHTML.
pub fn inline_to_html(text: &str) -> String {
    let mut out = String::new();
    write_spans(&parse_inline(text), &mut out);
    out
}

fn lines_to_html(text: &str) -> String {
    text.lines()
        .map(inline_to_html)
        .collect::<Vec<_>>()
        .join("<br/>")
}

fn write_spans(spans: &[Inline], out: &mut String) {
    for span in spans {
        match span {
            Inline::Text(text) => out.push_str(&escape_xml(text)),
            Inline::Strong(inner) => {
                out.push_str("<strong>");
                write_spans(inner, out);
                out.push_str("</strong>");
            }
            Inline::Emphasis(inner) => {
                out.push_str("<em>");
                write_spans(inner, out);
                out.push_str("</em>");
            }
            Inline::Code(code) => {
                out.push_str("<code>");
                out.push_str(&escape_xml(code));
                out.push_str("</code>");
            }
            Inline::Link { content, .. } => write_spans(content, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;

    #[test]
    fn test_paragraph_with_inline() {
        let html = to_html(&parse("A **bold** and *soft* [link](http://x)."));
        assert_eq!(html, "<p>A <strong>bold</strong> and <em>soft</em> link.</p>\n");
    }

    #[test]
    fn test_escape_before_tags() {
        let html = to_html(&parse("x < y & \"z\" > **w**"));
        assert_eq!(
            html,
            "<p>x &lt; y &amp; &quot;z&quot; &gt; <strong>w</strong></p>\n"
        );
    }

    #[test]
    fn test_block_kinds() {
        let html = to_html(&parse("# Head\n\n> quoted\n> more\n\n---\n\nline one\nline two"));
        assert_eq!(
            html,
            "<h2>Head</h2>\n\
             <blockquote><p>quoted<br/>more</p></blockquote>\n\
             <hr/>\n\
             <p>line one<br/>line two</p>\n"
        );
    }

    #[test]
    fn test_heading_levels_shift() {
        let html = to_html(&parse("## Two\n### Three"));
        assert_eq!(html, "<h3>Two</h3>\n<h4>Three</h4>\n");
    }

    /// Remove tags and undo the entity escapes.
    fn untagged(html: &str) -> String {
        let mut text = String::new();
        let mut in_tag = false;
        for c in html.chars() {
            match c {
                '<' => in_tag = true,
                '>' => in_tag = false,
                c if !in_tag => text.push(c),
                _ => {}
            }
        }
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }

    #[test]
    fn test_nested_markup_renders_like_plain_text() {
        assert_eq!(inline_to_html("[**a**](u)"), "<strong>a</strong>");
        assert_eq!(
            inline_to_html("*a **b** c*"),
            "<em>a <strong>b</strong> c</em>"
        );

        for input in [
            "[**a**](u)",
            "*a **b** c*",
            "***both*** and **very *much* so**",
            "[[a](b)](c) & `x < y`",
            "`a*b*c` then [*it*](http://x/y)",
            "2 * 3 = 6, *open **close*",
        ] {
            let html = inline_to_html(input);
            assert_eq!(untagged(&html), crate::markup::strip(input), "{input} -> {html}");
        }
    }

    #[test]
    fn test_code_is_escaped() {
        assert_eq!(inline_to_html("`<br>`"), "<code>&lt;br&gt;</code>");
    }
}
