//! Inline span parser.
//!
//! Inline markup is resolved on a stream of styled characters using the
//! passes [`strip`](super::strip) runs: bold, italic, code, link, repeated
//! until nothing matches. Each match drops its delimiters and marks the
//! kept characters. The marked stream is then folded into an [`Inline`]
//! tree, so the text of the tree is always what `strip` leaves behind.

use regex::Regex;

use super::Inline;
use super::strip::{BOLD, CODE, ITALIC, LINK};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Style {
    strong: bool,
    emphasis: bool,
    code: bool,
    /// Index into `Styled::links`.
    link: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
enum Mark {
    Strong,
    Emphasis,
    Code,
    Link,
}

/// A match of one pass, in byte offsets of the flattened text.
struct Span {
    whole: std::ops::Range<usize>,
    inner: std::ops::Range<usize>,
    link: Option<usize>,
}

/// Text with per-character inline styles.
pub(super) struct Styled {
    chars: Vec<(char, Style)>,
    links: Vec<String>,
}

impl Styled {
    pub(super) fn new(text: &str) -> Self {
        Self {
            chars: text.chars().map(|c| (c, Style::default())).collect(),
            links: Vec::new(),
        }
    }

    pub(super) fn text(&self) -> String {
        self.chars.iter().map(|(c, _)| *c).collect()
    }

    /// Run every pass until the text stops changing.
    pub(super) fn resolve(&mut self) {
        loop {
            let bold = self.pass(&BOLD, Mark::Strong);
            let italic = self.pass(&ITALIC, Mark::Emphasis);
            let code = self.pass(&CODE, Mark::Code);
            let link = self.pass(&LINK, Mark::Link);
            if !(bold || italic || code || link) {
                return;
            }
        }
    }

    /// Apply one pass. Returns whether anything matched.
    fn pass(&mut self, pattern: &Regex, mark: Mark) -> bool {
        let text = self.text();
        let mut spans = Vec::new();
        for caps in pattern.captures_iter(&text) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let link = match mark {
                Mark::Link => {
                    self.links
                        .push(caps.get(2).map_or("", |m| m.as_str()).to_string());
                    Some(self.links.len() - 1)
                }
                _ => None,
            };
            spans.push(Span {
                whole: whole.range(),
                inner: inner.range(),
                link,
            });
        }
        if spans.is_empty() {
            return false;
        }

        let mut kept = Vec::with_capacity(self.chars.len());
        let mut next = 0;
        for ((offset, _), &(c, style)) in text.char_indices().zip(&self.chars) {
            while next < spans.len() && offset >= spans[next].whole.end {
                next += 1;
            }
            match spans.get(next) {
                Some(span) if span.whole.contains(&offset) => {
                    if span.inner.contains(&offset) {
                        kept.push((c, apply(style, mark, span.link)));
                    }
                }
                _ => kept.push((c, style)),
            }
        }
        self.chars = kept;
        true
    }

    /// Consecutive characters sharing a style.
    fn runs(&self) -> Vec<(String, Style)> {
        let mut runs: Vec<(String, Style)> = Vec::new();
        for &(c, style) in &self.chars {
            match runs.last_mut() {
                Some((text, last)) if *last == style => text.push(c),
                _ => runs.push((c.to_string(), style)),
            }
        }
        runs
    }
}

fn apply(mut style: Style, mark: Mark, link: Option<usize>) -> Style {
    match mark {
        Mark::Strong => style.strong = true,
        Mark::Emphasis => style.emphasis = true,
        Mark::Code => style.code = true,
        // The innermost link wins.
        Mark::Link => style.link = style.link.or(link),
    }
    style
}

/// Split a line of text into inline spans.
///
/// Unmatched markers are left in the text as literals.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut styled = Styled::new(text);
    styled.resolve();
    let runs = styled.runs();
    links(&runs, &styled.links)
}

/// Links are outermost.
fn links(runs: &[(String, Style)], urls: &[String]) -> Vec<Inline> {
    let mut out = Vec::new();
    for group in runs.chunk_by(|a, b| a.1.link == b.1.link) {
        match group[0].1.link {
            Some(index) => out.push(Inline::Link {
                content: emphasis(group),
                url: urls.get(index).cloned().unwrap_or_default(),
            }),
            None => out.extend(emphasis(group)),
        }
    }
    out
}

/// Strong and emphasis, nested whichever way needs fewer elements.
fn emphasis(runs: &[(String, Style)]) -> Vec<Inline> {
    if wrappers(runs, is_strong, is_emphasis) <= wrappers(runs, is_emphasis, is_strong) {
        nest(runs, is_strong, Inline::Strong, |inner| {
            nest(inner, is_emphasis, Inline::Emphasis, leaves)
        })
    } else {
        nest(runs, is_emphasis, Inline::Emphasis, |inner| {
            nest(inner, is_strong, Inline::Strong, leaves)
        })
    }
}

fn is_strong(style: &Style) -> bool {
    style.strong
}

fn is_emphasis(style: &Style) -> bool {
    style.emphasis
}

/// Elements produced by nesting `inner` inside `outer`.
fn wrappers(
    runs: &[(String, Style)],
    outer: fn(&Style) -> bool,
    inner: fn(&Style) -> bool,
) -> usize {
    runs.chunk_by(|a, b| outer(&a.1) == outer(&b.1))
        .map(|group| {
            let nested = group
                .chunk_by(|a, b| inner(&a.1) == inner(&b.1))
                .filter(|g| inner(&g[0].1))
                .count();
            usize::from(outer(&group[0].1)) + nested
        })
        .sum()
}

fn nest(
    runs: &[(String, Style)],
    key: impl Fn(&Style) -> bool,
    wrap: fn(Vec<Inline>) -> Inline,
    inner: impl Fn(&[(String, Style)]) -> Vec<Inline>,
) -> Vec<Inline> {
    let mut out = Vec::new();
    for group in runs.chunk_by(|a, b| key(&a.1) == key(&b.1)) {
        if key(&group[0].1) {
            out.push(wrap(inner(group)));
        } else {
            out.extend(inner(group));
        }
    }
    out
}

fn leaves(runs: &[(String, Style)]) -> Vec<Inline> {
    runs.iter()
        .map(|(text, style)| {
            if style.code {
                Inline::Code(text.clone())
            } else {
                Inline::Text(text.clone())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn plain(spans: &[Inline]) -> String {
        spans
            .iter()
            .map(|span| match span {
                Inline::Text(t) | Inline::Code(t) => t.clone(),
                Inline::Strong(inner) | Inline::Emphasis(inner) => plain(inner),
                Inline::Link { content, .. } => plain(content),
            })
            .collect()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_inline("just words"), vec![text("just words")]);
        assert!(parse_inline("").is_empty());
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            parse_inline("a **bold** and *soft* b"),
            vec![
                text("a "),
                Inline::Strong(vec![text("bold")]),
                text(" and "),
                Inline::Emphasis(vec![text("soft")]),
                text(" b"),
            ]
        );
    }

    #[test]
    fn test_nested_emphasis_in_bold() {
        assert_eq!(
            parse_inline("**very *much* so**"),
            vec![Inline::Strong(vec![
                text("very "),
                Inline::Emphasis(vec![text("much")]),
                text(" so"),
            ])]
        );
    }

    #[test]
    fn test_bold_inside_emphasis_survives() {
        assert_eq!(
            parse_inline("*a **b** c*"),
            vec![Inline::Emphasis(vec![
                text("a "),
                Inline::Strong(vec![text("b")]),
                text(" c"),
            ])]
        );
    }

    #[test]
    fn test_bold_italic() {
        let spans = parse_inline("***both***");
        assert_eq!(plain(&spans), "both");
        assert!(matches!(&spans[..], [Inline::Strong(inner)] if matches!(&inner[..], [Inline::Emphasis(_)])));
    }

    #[test]
    fn test_code() {
        assert_eq!(
            parse_inline("run `cargo` now"),
            vec![text("run "), Inline::Code("cargo".into()), text(" now")]
        );
    }

    #[test]
    fn test_link_text_is_parsed() {
        assert_eq!(
            parse_inline("see [**docs**](https://example.com)."),
            vec![
                text("see "),
                Inline::Link {
                    content: vec![Inline::Strong(vec![text("docs")])],
                    url: "https://example.com".into()
                },
                text("."),
            ]
        );
    }

    #[test]
    fn test_nested_link_keeps_inner_target() {
        assert_eq!(
            parse_inline("[[a](b)](c)"),
            vec![Inline::Link {
                content: vec![text("a")],
                url: "b".into()
            }]
        );
    }

    #[test]
    fn test_unmatched_markers_are_literal() {
        assert_eq!(parse_inline("2 * 3 = 6"), vec![text("2 * 3 = 6")]);
        assert_eq!(parse_inline("[not a link]"), vec![text("[not a link]")]);
    }

    #[test]
    fn test_text_matches_strip() {
        for input in [
            "[**a**](u)",
            "*a **b** c*",
            "`a*b*c`",
            "**[x](y)** and *`z`*",
            "unclosed **bold and *it*",
        ] {
            assert_eq!(plain(&parse_inline(input)), crate::markup::strip(input), "{input}");
        }
    }
}
