//! Markup stripping for plain-text style outputs.

use std::sync::LazyLock;

use regex::Regex;

use super::inline::Styled;

static HEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").expect("valid pattern"));

// Inline passes, in application order. Group 1 is the kept text; the link
// pass also captures its target in group 2.
pub(super) static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid pattern"));
pub(super) static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("valid pattern"));
pub(super) static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid pattern"));
pub(super) static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").expect("valid pattern"));

/// Remove markup from raw text, keeping the inner text.
///
/// Passes run in a fixed order: heading marker, bold, italic, inline code,
/// link (target discarded). The sequence repeats until nothing changes, so
/// `strip(strip(x)) == strip(x)`. Every pass that matches shortens the text,
/// which bounds the loop.
pub fn strip(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_once(text: &str) -> String {
    let text = HEADING_MARKER.replace_all(text, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = CODE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    text.into_owned()
}

/// Remove inline markup only.
///
/// For text already taken out of a block: the heading marker is gone, and a
/// `#` left at the start is part of the text. Runs the same passes as
/// [`parse_inline`](super::parse_inline), so the result is exactly the text
/// of the parsed spans.
pub fn strip_inline(text: &str) -> String {
    let mut styled = Styled::new(text);
    styled.resolve();
    styled.text()
}
