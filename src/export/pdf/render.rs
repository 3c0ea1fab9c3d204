//! Serialize laid-out pages with lopdf.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::io::Write;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::error::{Error, Result};
use crate::model::{BookModel, FontFamily, Theme};

use super::flow::{FontStyle, Page};
use super::font::EmbeddedFont;
use super::metrics::MM_TO_PT;

/// Horizontal shear for the synthetic oblique of an embedded font.
const OBLIQUE_SKEW: f32 = 0.21;
/// Stroke width, as a fraction of the type size, for synthetic bold.
const EMBOLDEN: f32 = 0.03;

/// Colours for one theme, as RGB in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// `None` leaves the page unpainted.
    pub background: Option<[f32; 3]>,
    pub text: [f32; 3],
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Classic => Palette {
                background: None,
                text: [0.0, 0.0, 0.0],
            },
            Theme::Modern => Palette {
                background: Some([0.97, 0.97, 0.95]),
                text: [0.17, 0.19, 0.24],
            },
            Theme::Scifi => Palette {
                background: Some([0.05, 0.08, 0.16]),
                text: [0.78, 0.92, 1.0],
            },
        }
    }
}

/// Standard 14 font names for the regular, bold and italic faces.
fn base_fonts(family: FontFamily) -> [&'static str; 3] {
    match family {
        FontFamily::Serif => ["Times-Roman", "Times-Bold", "Times-Italic"],
        FontFamily::Sans | FontFamily::Round => {
            ["Helvetica", "Helvetica-Bold", "Helvetica-Oblique"]
        }
    }
}

fn resource_name(style: FontStyle) -> &'static str {
    match style {
        FontStyle::Regular => "F1",
        FontStyle::Bold => "F2",
        FontStyle::Italic => "F3",
    }
}

pub struct Renderer<'a> {
    pub book: &'a BookModel,
    /// Page width in millimetres.
    pub width: f32,
    /// Page height in millimetres.
    pub height: f32,
    pub compress: bool,
    /// Set every face in this font instead of the standard 14.
    pub font: Option<&'a EmbeddedFont>,
}

impl Renderer<'_> {
    /// Write `pages` as a complete PDF document.
    ///
    /// Characters the font cannot draw are replaced (`?` in a standard font,
    /// `.notdef` in an embedded one) and reported once with a warning.
    pub fn render<W: Write>(&self, pages: &[Page], writer: &mut W) -> Result<()> {
        if pages.is_empty() {
            return Err(Error::Precondition("no renderable pages".into()));
        }

        let layout = self.book.layout_settings;
        let palette = Palette::for_theme(layout.theme);
        let mut encoder = Encoder::new(self.font);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for page in pages {
            let content = self.page_content(page, &palette, &mut encoder);
            let encoded = content.encode().map_err(|e| Error::Pdf(e.to_string()))?;

            let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        encoder.report();

        let mut fonts = Dictionary::new();
        match self.font {
            Some(font) => {
                let font_id = embed_font(&mut doc, font, &encoder.used);
                for style in [FontStyle::Regular, FontStyle::Bold, FontStyle::Italic] {
                    fonts.set(resource_name(style), font_id);
                }
            }
            None => {
                for (style, base) in [FontStyle::Regular, FontStyle::Bold, FontStyle::Italic]
                    .into_iter()
                    .zip(base_fonts(layout.font_family))
                {
                    let font_id = doc.add_object(dictionary! {
                        "Type" => "Font",
                        "Subtype" => "Type1",
                        "BaseFont" => base,
                        "Encoding" => "WinAnsiEncoding",
                    });
                    fonts.set(resource_name(style), font_id);
                }
            }
        }
        let resources_id = doc.add_object(dictionary! {
            "Font" => fonts,
        });

        let media_box: Vec<Object> = vec![
            Object::Integer(0),
            Object::Integer(0),
            (self.width * MM_TO_PT).into(),
            (self.height * MM_TO_PT).into(),
        ];

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => media_box,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "Lang" => Object::string_literal(self.book.locale().code()),
        });
        let info_id = self.info(&mut doc);

        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        if self.compress {
            doc.compress();
        }
        doc.save_to(writer).map_err(|e| Error::Pdf(e.to_string()))?;

        tracing::debug!(pages = count, embedded = self.font.is_some(), "pdf document written");
        Ok(())
    }

    fn page_content(&self, page: &Page, palette: &Palette, encoder: &mut Encoder<'_>) -> Content {
        let mut operations = Vec::new();

        if let Some([r, g, b]) = palette.background {
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new("rg", vec![r.into(), g.into(), b.into()]),
                Operation::new(
                    "re",
                    vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        (self.width * MM_TO_PT).into(),
                        (self.height * MM_TO_PT).into(),
                    ],
                ),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ]);
        }

        let [r, g, b] = palette.text;
        let embedded = self.font.is_some();
        for run in &page.runs {
            // An embedded font has a single face; bold is stroked, italic sheared.
            let embolden = embedded && run.style == FontStyle::Bold;
            let skew = if embedded && run.style == FontStyle::Italic {
                OBLIQUE_SKEW
            } else {
                0.0
            };

            if embolden {
                operations.extend([
                    Operation::new("q", vec![]),
                    Operation::new("RG", vec![r.into(), g.into(), b.into()]),
                    Operation::new("w", vec![(run.size * EMBOLDEN).into()]),
                ]);
            }
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("rg", vec![r.into(), g.into(), b.into()]),
                Operation::new("Tf", vec![resource_name(run.style).into(), run.size.into()]),
            ]);
            if embolden {
                operations.push(Operation::new("Tr", vec![Object::Integer(2)]));
            }
            operations.extend([
                Operation::new(
                    "Tm",
                    vec![
                        1.0f32.into(),
                        0.0f32.into(),
                        skew.into(),
                        1.0f32.into(),
                        (run.x * MM_TO_PT).into(),
                        ((self.height - run.y) * MM_TO_PT).into(),
                    ],
                ),
                Operation::new("Tj", vec![encoder.encode(&run.text)]),
                Operation::new("ET", vec![]),
            ]);
            if embolden {
                operations.push(Operation::new("Q", vec![]));
            }
        }

        Content { operations }
    }

    fn info(&self, doc: &mut Document) -> ObjectId {
        let mut info = dictionary! {
            "Title" => text_string(self.book.title()),
            "Creator" => text_string("bookpress"),
            "Producer" => text_string("bookpress"),
        };
        if let Some(author) = self.book.author() {
            info.set("Author", text_string(author));
        }
        let topic = self.book.settings.topic.trim();
        if !topic.is_empty() {
            info.set("Subject", text_string(topic));
        }
        doc.add_object(info)
    }
}

/// Turns run text into `Tj` operands for the active font, tracking the
/// glyphs it used and the characters it had to replace.
struct Encoder<'a> {
    font: Option<&'a EmbeddedFont>,
    /// Embedded glyph id → (width, character it was drawn for).
    used: BTreeMap<u16, (u16, char)>,
    replaced: BTreeSet<char>,
}

impl<'a> Encoder<'a> {
    fn new(font: Option<&'a EmbeddedFont>) -> Self {
        Self {
            font,
            used: BTreeMap::new(),
            replaced: BTreeSet::new(),
        }
    }

    fn encode(&mut self, text: &str) -> Object {
        match self.font {
            None => {
                let mut bytes = Vec::with_capacity(text.len());
                for c in text.chars() {
                    bytes.push(win_ansi_byte(c).unwrap_or_else(|| {
                        self.replaced.insert(c);
                        b'?'
                    }));
                }
                Object::String(bytes, StringFormat::Literal)
            }
            Some(font) => {
                let mut bytes = Vec::with_capacity(text.len() * 2);
                for c in text.chars() {
                    let id = match font.glyph(c) {
                        Some(glyph) => {
                            self.used.entry(glyph.id).or_insert((glyph.width, c));
                            glyph.id
                        }
                        None => {
                            self.replaced.insert(c);
                            0
                        }
                    };
                    bytes.extend_from_slice(&id.to_be_bytes());
                }
                Object::String(bytes, StringFormat::Hexadecimal)
            }
        }
    }

    fn report(&self) {
        if self.replaced.is_empty() {
            return;
        }
        let sample: String = self.replaced.iter().take(20).collect();
        tracing::warn!(
            count = self.replaced.len(),
            characters = %sample,
            embedded = self.font.is_some(),
            "characters missing from the pdf font were replaced"
        );
    }
}

/// Write `font` as a Type0/CIDFontType2 font and return the Type0 object.
fn embed_font(doc: &mut Document, font: &EmbeddedFont, used: &BTreeMap<u16, (u16, char)>) -> ObjectId {
    let name = Object::Name(font.name().as_bytes().to_vec());

    let file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => font.data().len() as i64 },
        font.data().to_vec(),
    ));

    let bbox: Vec<Object> = font.bbox().into_iter().map(Object::Integer).collect();
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => name.clone(),
        // Symbolic: glyphs are addressed by id, not by a standard encoding.
        "Flags" => 4_i64,
        "FontBBox" => bbox,
        "ItalicAngle" => font.italic_angle(),
        "Ascent" => font.ascent(),
        "Descent" => font.descent(),
        "CapHeight" => font.cap_height(),
        "StemV" => 80_i64,
        "FontFile2" => file_id,
    });

    let widths: Vec<Object> = used
        .iter()
        .flat_map(|(&id, &(width, _))| {
            [
                Object::Integer(i64::from(id)),
                Object::Array(vec![Object::Integer(i64::from(width))]),
            ]
        })
        .collect();
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => name.clone(),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0_i64,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000_i64,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let to_unicode_id = doc.add_object(Stream::new(
        Dictionary::new(),
        to_unicode_cmap(used).into_bytes(),
    ));

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => name,
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    })
}

/// A ToUnicode CMap mapping each used glyph id back to its character.
fn to_unicode_cmap(used: &BTreeMap<u16, (u16, char)>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    let entries: Vec<(u16, char)> = used.iter().map(|(&id, &(_, c))| (id, c)).collect();
    // At most 100 mappings per bfchar block.
    for chunk in entries.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for &(id, c) in chunk {
            let mut units = [0u16; 2];
            let hex: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|unit| format!("{unit:04X}"))
                .collect();
            let _ = writeln!(cmap, "<{id:04X}> <{hex}>");
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

/// The WinAnsi (cp1252) byte for `c`, if it has one.
pub fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        '\t' => b' ',
        _ => return None,
    };
    Some(byte)
}

/// A PDF text string: plain literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::string_literal(text)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}
