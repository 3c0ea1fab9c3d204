//! Page flow: turns a book into pages of positioned text runs.
//!
//! Coordinates are millimetres from the top-left corner of the page; `y`
//! is the baseline of a run. The renderer flips them into PDF space.
//!
//! Every logical line is wrapped to the content width first and then
//! placed physical line by physical line. A page break is only ever taken
//! between two physical lines, never inside one.

use crate::markup::{self, Block};
use crate::model::{BookModel, Labels};

use super::metrics::{self, Metrics, PT_TO_MM};

/// Geometry and type sizes for one flow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSettings {
    pub page_width: f32,
    pub page_height: f32,
    /// Left and right margin.
    pub margin_x: f32,
    /// Top and bottom margin.
    pub margin_y: f32,
    /// Baseline advance for body text.
    pub line_height: f32,
    /// Vertical space standing in for a blank line.
    pub blank_gap: f32,
    /// Vertical space after each section.
    pub section_gap: f32,
    /// Body type size in points.
    pub body_size: f32,
    pub page_numbers: bool,
}

impl FlowSettings {
    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin_x
    }

    fn bottom(&self) -> f32 {
        self.page_height - self.margin_y
    }

    /// Line advance for type set at `size`, never tighter than body text.
    fn line_height_for(&self, size: f32) -> f32 {
        (self.line_height * size / self.body_size).max(self.line_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

impl FontStyle {
    fn is_bold(self) -> bool {
        self == FontStyle::Bold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// What a page is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Title,
    ChapterTitle,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub style: FontStyle,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub kind: PageKind,
    pub runs: Vec<TextRun>,
}

impl Page {
    /// All run text on the page, one run per line.
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|run| run.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Lay out the whole book.
///
/// The result always starts with the title page and holds, per chapter,
/// a chapter title page followed by at least one body page.
pub fn layout(
    book: &BookModel,
    settings: &FlowSettings,
    labels: &Labels,
    metrics: Metrics<'_>,
) -> Vec<Page> {
    let mut flow = Flow::new(settings, metrics);
    let body = settings.body_size;

    // Title page: title at a third of the page, author beneath.
    flow.new_page(PageKind::Title);
    flow.y = settings.page_height / 3.0;
    flow.paragraph(book.title(), FontStyle::Bold, body * 2.2, Align::Center, 0.0);
    if let Some(author) = book.author() {
        flow.y += settings.line_height;
        flow.paragraph(author, FontStyle::Regular, body * 1.3, Align::Center, 0.0);
    }

    for chapter in book.chapters() {
        flow.new_page(PageKind::ChapterTitle);
        flow.y = settings.page_height / 2.0;
        flow.paragraph(&chapter.title, FontStyle::Bold, body * 1.8, Align::Center, 0.0);

        flow.new_page(PageKind::Body);
        for section in chapter.written_sections() {
            flow.paragraph(&section.title, FontStyle::Bold, body + 4.0, Align::Left, 0.0);
            flow.y += settings.blank_gap;
            flow.content(section.body().unwrap_or_default());
            flow.y += settings.section_gap;
        }
    }

    let mut pages = flow.pages;
    if settings.page_numbers {
        number_pages(&mut pages, settings, labels, metrics);
    }

    tracing::debug!(pages = pages.len(), "pdf flow complete");
    pages
}

/// Add a centered page label in the bottom margin of every page after the
/// title page.
fn number_pages(pages: &mut [Page], settings: &FlowSettings, labels: &Labels, metrics: Metrics<'_>) {
    let size = settings.body_size - 2.0;
    let y = settings.page_height - settings.margin_y / 2.0;

    for (i, page) in pages.iter_mut().enumerate().skip(1) {
        let text = labels.page_number(i + 1);
        let width = metrics.text_width(&text, size, false);
        page.runs.push(TextRun {
            x: (settings.page_width - width) / 2.0,
            y,
            text,
            style: FontStyle::Regular,
            size,
        });
    }
}

struct Flow<'a> {
    settings: &'a FlowSettings,
    metrics: Metrics<'a>,
    pages: Vec<Page>,
    /// Top of the next line.
    y: f32,
}

impl<'a> Flow<'a> {
    fn new(settings: &'a FlowSettings, metrics: Metrics<'a>) -> Self {
        Self {
            settings,
            metrics,
            pages: Vec::new(),
            y: settings.margin_y,
        }
    }

    fn new_page(&mut self, kind: PageKind) {
        self.pages.push(Page {
            kind,
            runs: Vec::new(),
        });
        self.y = self.settings.margin_y;
    }

    /// Section content, block by block with a blank gap between blocks.
    fn content(&mut self, content: &str) {
        let body = self.settings.body_size;

        for (i, block) in markup::parse(content).iter().enumerate() {
            if i > 0 {
                self.y += self.settings.blank_gap;
            }
            match block {
                Block::Heading { text, .. } => {
                    let text = markup::strip_inline(text);
                    self.paragraph(&text, FontStyle::Bold, body + 2.0, Align::Left, 0.0);
                }
                Block::Paragraph(_) => {
                    for line in block.lines() {
                        let line = markup::strip_inline(line);
                        self.paragraph(&line, FontStyle::Regular, body, Align::Left, 0.0);
                    }
                }
                Block::Quote(_) => {
                    for line in block.lines() {
                        let line = markup::strip_inline(line);
                        self.paragraph(&line, FontStyle::Italic, body, Align::Left, 8.0);
                    }
                }
                Block::Rule => self.paragraph("* * *", FontStyle::Regular, body, Align::Center, 0.0),
            }
        }
    }

    /// Wrap one logical line and place its physical lines.
    fn paragraph(&mut self, text: &str, style: FontStyle, size: f32, align: Align, indent: f32) {
        let width = self.settings.content_width() - indent;
        for line in wrap(text, width, size, style.is_bold(), self.metrics) {
            self.line(line, style, size, align, indent);
        }
    }

    fn line(&mut self, text: String, style: FontStyle, size: f32, align: Align, indent: f32) {
        let advance = self.settings.line_height_for(size);
        if self.y + advance > self.settings.bottom() {
            self.new_page(PageKind::Body);
        }

        let x = match align {
            Align::Left => self.settings.margin_x + indent,
            Align::Center => {
                let width = self.metrics.text_width(&text, size, style.is_bold());
                self.settings.margin_x + (self.settings.content_width() - width).max(0.0) / 2.0
            }
        };
        // Baseline sits roughly one cap height below the top of the line.
        let y = self.y + size * PT_TO_MM;

        if let Some(page) = self.pages.last_mut() {
            page.runs.push(TextRun {
                x,
                y,
                text,
                style,
                size,
            });
        }
        self.y += advance;
    }
}

/// Greedy word wrap to `max_width` millimetres.
///
/// Words wider than a whole line (including unbroken CJK runs) are split
/// between characters. Blank input yields no lines.
pub fn wrap(text: &str, max_width: f32, size: f32, bold: bool, metrics: Metrics<'_>) -> Vec<String> {
    let fits = |units: u32| metrics::scaled(units, size, bold) <= max_width;
    let space = u32::from(metrics.char_width(' '));

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_units = 0u32;

    for word in text.split_whitespace() {
        let word_units: u32 = word.chars().map(|c| u32::from(metrics.char_width(c))).sum();

        if current.is_empty() && fits(word_units) {
            current.push_str(word);
            current_units = word_units;
            continue;
        }
        if !current.is_empty() && fits(current_units + space + word_units) {
            current.push(' ');
            current.push_str(word);
            current_units += space + word_units;
            continue;
        }
        if fits(word_units) {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_units = word_units;
            continue;
        }

        // Too wide for any line: continue the current line character by character.
        if !current.is_empty() {
            current.push(' ');
            current_units += space;
        }
        for c in word.chars() {
            let units = u32::from(metrics.char_width(c));
            if !fits(current_units + units) && !current.trim().is_empty() {
                lines.push(current.trim_end().to_string());
                current.clear();
                current_units = 0;
            }
            current.push(c);
            current_units += units;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
