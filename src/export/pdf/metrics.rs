//! Glyph advance widths for line wrapping.
//!
//! Standard fonts are measured with the Helvetica AFM (units of 1/1000 em).
//! Times is narrower for almost every glyph, so measuring with Helvetica
//! never overfills a line set in Times. An embedded font is measured with
//! its own advances. Bold faces are approximated by scaling.

use super::font::EmbeddedFont;

/// Millimetres per PostScript point.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// Points per millimetre.
pub const MM_TO_PT: f32 = 72.0 / 25.4;

const BOLD_SCALE: f32 = 1.08;

/// Helvetica widths for `' '..='~'`.
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' to '/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // '0' to '9'
    278, 278, 584, 584, 584, 556, 1015,                                             // ':' to '@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // 'A' to 'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // 'N' to 'Z'
    278, 278, 278, 469, 556, 333,                                                   // '[' to '`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // 'a' to 'm'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // 'n' to 'z'
    334, 260, 334, 584,                                                             // '{' to '~'
];

/// Advance width of one character in 1/1000 em.
pub fn char_width(c: char) -> u16 {
    match c {
        ' '..='~' => HELVETICA_ASCII[c as usize - 0x20],
        '\u{2014}' | '\u{2026}' => 1000,
        '\u{3000}'..='\u{9FFF}' | '\u{AC00}'..='\u{D7AF}' | '\u{FF00}'..='\u{FFEF}' => 1000,
        c if c.is_whitespace() => 278,
        // Accented Latin and everything else: an average-to-wide lowercase.
        _ => 611,
    }
}

/// Width of `text` set at `size` points, in millimetres.
pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    Metrics::Standard.text_width(text, size, bold)
}

/// Where advance widths come from.
#[derive(Debug, Clone, Copy)]
pub enum Metrics<'a> {
    /// The standard 14 fonts.
    Standard,
    Embedded(&'a EmbeddedFont),
}

impl Metrics<'_> {
    pub fn char_width(&self, c: char) -> u16 {
        match self {
            Metrics::Standard => char_width(c),
            Metrics::Embedded(font) => font.width(c),
        }
    }

    /// Width of `text` set at `size` points, in millimetres.
    pub fn text_width(&self, text: &str, size: f32, bold: bool) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        scaled(units, size, bold)
    }

    /// Whether every character of `text` can be drawn as written.
    pub fn covers(&self, text: &str) -> bool {
        match self {
            Metrics::Standard => text.chars().all(|c| super::render::win_ansi_byte(c).is_some()),
            Metrics::Embedded(font) => font.covers(text),
        }
    }
}

/// Convert a sum of em units to millimetres.
pub(crate) fn scaled(units: u32, size: f32, bold: bool) -> f32 {
    let width = units as f32 / 1000.0 * size * PT_TO_MM;
    if bold { width * BOLD_SCALE } else { width }
}
