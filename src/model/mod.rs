//! The book model every exporter reads.
//!
//! A [`BookModel`] is assembled by the drafting application (research,
//! outline and section generation all happen elsewhere) and handed to the
//! exporters as a read-only snapshot. The types deserialize from the
//! application's project JSON, which uses camelCase field names.
//!
//! # Example
//!
//! ```
//! use bookpress::model::{BookModel, Chapter, Section};
//!
//! let book = BookModel::new("Test Book")
//!     .with_author("Ada")
//!     .with_chapter(Chapter::new("Intro").with_section(Section::new("Hello", "World")));
//!
//! assert_eq!(book.author(), Some("Ada"));
//! assert_eq!(book.chapters().len(), 1);
//! ```

mod cover;
mod locale;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use cover::CoverImage;
pub use locale::{Labels, Locale};

/// Root of the book tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookModel {
    pub settings: BookSettings,
    #[serde(default)]
    pub structure: BookStructure,
    #[serde(default, deserialize_with = "cover::deserialize_lenient")]
    pub cover_image: Option<CoverImage>,
    #[serde(default)]
    pub layout_settings: LayoutSettings,
}

/// Authoring settings captured when the project was created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookSettings {
    pub title: String,
    pub author_name: Option<String>,
    pub topic: String,
    pub language: String,
    pub book_type: BookType,
    pub tone_and_style: String,
    pub target_audience: String,
    pub must_include: String,
    pub word_count_target: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookType {
    #[default]
    Novel,
    NonFiction,
    Textbook,
    Biography,
    Anthology,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookStructure {
    pub chapters: Vec<Chapter>,
}

/// A chapter in reading order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub sections: Vec<Section>,
}

/// A section of a chapter. `content` holds the markup subset; empty or
/// absent content means the section has not been written yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub status: SectionStatus,
    pub word_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    #[default]
    Pending,
    Generating,
    Completed,
    Error,
}

/// Visual settings; only the PDF exporter reads these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutSettings {
    pub font_family: FontFamily,
    pub font_size: FontSize,
    pub theme: Theme,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Serif,
    Sans,
    Round,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Classic,
    Modern,
    Scifi,
}

impl BookModel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            settings: BookSettings {
                title: title.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parse a project snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.settings.author_name = Some(author.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.settings.topic = topic.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.settings.language = language.into();
        self
    }

    pub fn with_chapter(mut self, chapter: Chapter) -> Self {
        self.structure.chapters.push(chapter);
        self
    }

    pub fn with_cover(mut self, cover: CoverImage) -> Self {
        self.cover_image = Some(cover);
        self
    }

    pub fn with_layout(mut self, layout: LayoutSettings) -> Self {
        self.layout_settings = layout;
        self
    }

    pub fn title(&self) -> &str {
        &self.settings.title
    }

    /// The author to print, if there is one worth printing.
    ///
    /// Blank names and the drafting tool's `"Unknown"` placeholder count as absent.
    pub fn author(&self) -> Option<&str> {
        self.settings
            .author_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != "Unknown")
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.structure.chapters
    }

    pub fn locale(&self) -> Locale {
        Locale::detect(&self.settings.language)
    }

    /// Check the invariants exporters rely on.
    pub fn validate(&self) -> Result<()> {
        if self.settings.title.trim().is_empty() {
            return Err(Error::Precondition("book title is empty".to_string()));
        }
        Ok(())
    }

    /// Number of sections that will actually be exported.
    pub fn written_section_count(&self) -> usize {
        self.chapters()
            .iter()
            .map(|chapter| chapter.written_sections().count())
            .sum()
    }
}

impl Chapter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Sections with content, in model order. Status is not consulted.
    pub fn written_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|section| section.body().is_some())
    }
}

impl Section {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            title: title.into(),
            word_count: content.split_whitespace().count() as u64,
            content: Some(content),
            status: SectionStatus::Completed,
            ..Default::default()
        }
    }

    /// A section that has not been written yet.
    pub fn pending(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: SectionStatus) -> Self {
        self.status = status;
        self
    }

    /// The section body, or `None` when the section is empty.
    pub fn body(&self) -> Option<&str> {
        self.content
            .as_deref()
            .filter(|content| !content.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT_JSON: &str = r#"{
        "settings": {
            "title": "星の海",
            "authorName": "Unknown",
            "topic": "space",
            "language": "Japanese",
            "bookType": "non-fiction",
            "toneAndStyle": "",
            "targetAudience": "",
            "mustInclude": "",
            "wordCountTarget": 50000
        },
        "structure": {
            "chapters": [
                {
                    "id": "c1",
                    "title": "Launch",
                    "sections": [
                        {"id": "s1", "title": "Countdown", "description": "", "content": "Ten.", "status": "completed", "wordCount": 1},
                        {"id": "s2", "title": "Liftoff", "description": "", "status": "pending", "wordCount": 0}
                    ]
                }
            ]
        },
        "layoutSettings": {"fontFamily": "sans", "fontSize": "large", "theme": "scifi"}
    }"#;

    #[test]
    fn test_parse_project_json() {
        let book = BookModel::from_json(PROJECT_JSON).unwrap();
        assert_eq!(book.title(), "星の海");
        assert_eq!(book.settings.book_type, BookType::NonFiction);
        assert_eq!(book.layout_settings.theme, Theme::Scifi);
        assert_eq!(book.layout_settings.font_size, FontSize::Large);
        assert!(book.cover_image.is_none());
        assert_eq!(book.locale(), Locale::Japanese);
    }

    #[test]
    fn test_unknown_author_is_absent() {
        let book = BookModel::from_json(PROJECT_JSON).unwrap();
        assert_eq!(book.author(), None);
        assert_eq!(BookModel::new("x").with_author("  ").author(), None);
        assert_eq!(BookModel::new("x").with_author("Ada").author(), Some("Ada"));
    }

    #[test]
    fn test_written_sections_ignore_status() {
        let chapter = Chapter::new("One")
            .with_section(Section::new("a", "text").with_status(SectionStatus::Error))
            .with_section(Section::pending("b"))
            .with_section(Section::new("c", "   \n "))
            .with_section(Section::new("d", "more").with_status(SectionStatus::Generating));

        let titles: Vec<_> = chapter.written_sections().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["a", "d"]);
    }

    #[test]
    fn test_unusable_cover_is_dropped() {
        for cover in ["\"\"", "\"   \"", "\"https://example.com/c.png\"", "\"data:text/plain;base64,aGk=\"", "null"] {
            let json = format!(r#"{{"settings":{{"title":"T"}},"coverImage":{cover}}}"#);
            let book = BookModel::from_json(&json).unwrap();
            assert!(book.cover_image.is_none(), "{cover}");
        }

        let json = r#"{"settings":{"title":"T"},"coverImage":"data:image/png;base64,iVBORw0KGgo="}"#;
        let book = BookModel::from_json(json).unwrap();
        assert_eq!(book.cover_image.map(|c| c.media_type), Some("image/png".to_string()));
    }

    #[test]
    fn test_validate_requires_title() {
        assert!(BookModel::new("Title").validate().is_ok());
        assert!(matches!(
            BookModel::new("  ").validate(),
            Err(Error::Precondition(_))
        ));
    }
}
