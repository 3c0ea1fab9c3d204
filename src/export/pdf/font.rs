//! TrueType fonts embedded into the PDF.
//!
//! The standard 14 fonts only reach WinAnsi. A book in any other script is
//! set in a caller-supplied TrueType font instead, written as a Type0 font
//! with Identity-H encoding: content streams carry glyph ids and a ToUnicode
//! map keeps the text extractable.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ttf_parser::{Face, GlyphId, name_id};

use crate::error::{Error, Result};

/// A glyph in the embedded font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub id: u16,
    /// Advance width in 1/1000 em.
    pub width: u16,
}

/// A parsed TrueType font ready to embed.
#[derive(Clone)]
pub struct EmbeddedFont {
    data: Arc<[u8]>,
    name: String,
    glyphs: HashMap<char, Glyph>,
    missing_width: u16,
    ascent: i64,
    descent: i64,
    cap_height: i64,
    bbox: [i64; 4],
    italic_angle: f32,
}

impl EmbeddedFont {
    /// Parse a TrueType font. CFF-flavoured OpenType is rejected since
    /// only `glyf` outlines can be embedded as `FontFile2`.
    pub fn from_bytes(data: impl Into<Arc<[u8]>>) -> Result<Self> {
        let data: Arc<[u8]> = data.into();
        let face = Face::parse(&data, 0).map_err(|e| Error::Font(e.to_string()))?;
        if face.tables().glyf.is_none() {
            return Err(Error::Font("font has no TrueType outlines".to_string()));
        }

        let upem = i64::from(face.units_per_em().max(1));
        let milli = |units: i64| units * 1000 / upem;
        let advance = |id: GlyphId| {
            let units = i64::from(face.glyph_hor_advance(id).unwrap_or(0));
            u16::try_from(milli(units)).unwrap_or(u16::MAX)
        };

        let mut glyphs = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|code_point| {
                    if let Some(c) = char::from_u32(code_point)
                        && let Some(id) = subtable.glyph_index(code_point)
                        && id.0 != 0
                    {
                        glyphs.entry(c).or_insert(Glyph {
                            id: id.0,
                            width: advance(id),
                        });
                    }
                });
            }
        }
        if glyphs.is_empty() {
            return Err(Error::Font("font has no Unicode character map".to_string()));
        }

        let name = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .map(|name| {
                name.chars()
                    .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                    .collect::<String>()
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        let bbox = face.global_bounding_box();
        let ascent = milli(i64::from(face.ascender()));
        let font = Self {
            name,
            missing_width: advance(GlyphId(0)),
            ascent,
            descent: milli(i64::from(face.descender())),
            cap_height: face
                .capital_height()
                .map_or(ascent, |h| milli(i64::from(h))),
            bbox: [
                milli(i64::from(bbox.x_min)),
                milli(i64::from(bbox.y_min)),
                milli(i64::from(bbox.x_max)),
                milli(i64::from(bbox.y_max)),
            ],
            italic_angle: face.italic_angle(),
            glyphs,
            data: Arc::clone(&data),
        };
        tracing::debug!(font = %font.name, glyphs = font.glyphs.len(), "parsed embedded font");
        Ok(font)
    }

    /// PostScript name, reduced to characters valid in a PDF name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn glyph(&self, c: char) -> Option<Glyph> {
        self.glyphs.get(&c).copied()
    }

    /// Advance width of `c` in 1/1000 em; `.notdef` width when unmapped.
    pub fn width(&self, c: char) -> u16 {
        self.glyph(c).map_or(self.missing_width, |g| g.width)
    }

    pub fn covers(&self, text: &str) -> bool {
        text.chars().all(|c| self.glyphs.contains_key(&c))
    }

    pub(crate) fn ascent(&self) -> i64 {
        self.ascent
    }

    pub(crate) fn descent(&self) -> i64 {
        self.descent
    }

    pub(crate) fn cap_height(&self) -> i64 {
        self.cap_height
    }

    pub(crate) fn bbox(&self) -> [i64; 4] {
        self.bbox
    }

    pub(crate) fn italic_angle(&self) -> f32 {
        self.italic_angle
    }
}

impl fmt::Debug for EmbeddedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedFont")
            .field("name", &self.name)
            .field("glyphs", &self.glyphs.len())
            .field("bytes", &self.data.len())
            .finish()
    }
}
