use std::collections::HashMap;
use std::str::FromStr;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_AUTHOR: &str = "Unknown Author";
pub const DEFAULT_DESCRIPTION: &str = "No description";

/// Parses `raw` as a `T`, falling back to `default` when it is absent or
/// does not parse.
pub fn parse_or_default<T: FromStr>(raw: Option<&str>, default: T) -> T {
    match raw.map(|s| s.trim().parse::<T>()) {
        Some(Ok(value)) => value,
        Some(Err(_)) | None => default,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    Unknown,
    English,
    Bulgarian,
    German,
    French,
    Spanish,
    Italian,
    Russian,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::English,
        Language::Bulgarian,
        Language::German,
        Language::French,
        Language::Spanish,
        Language::Italian,
        Language::Russian,
    ];

    /// Numeric code as stored in book descriptors; 0 is unknown.
    pub fn code(self) -> i16 {
        match self {
            Language::Unknown => 0,
            Language::English => 1,
            Language::Bulgarian => 2,
            Language::German => 3,
            Language::French => 4,
            Language::Spanish => 5,
            Language::Italian => 6,
            Language::Russian => 7,
        }
    }

    pub fn from_code(code: i16) -> Self {
        Self::ALL
            .into_iter()
            .find(|lang| lang.code() == code)
            .unwrap_or(Language::Unknown)
    }

    pub fn iso_code(self) -> Option<&'static str> {
        match self {
            Language::Unknown => None,
            Language::English => Some("en"),
            Language::Bulgarian => Some("bg"),
            Language::German => Some("de"),
            Language::French => Some("fr"),
            Language::Spanish => Some("es"),
            Language::Italian => Some("it"),
            Language::Russian => Some("ru"),
        }
    }

    /// Accepts a numeric code or a two-letter ISO 639-1 code. Anything else
    /// is [`Language::Unknown`].
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match Self::ALL
            .into_iter()
            .find(|lang| lang.iso_code().is_some_and(|iso| iso.eq_ignore_ascii_case(raw)))
        {
            Some(lang) => lang,
            None => Self::from_code(parse_or_default(Some(raw), 0)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::Unknown => "Unknown",
            Language::English => "English",
            Language::Bulgarian => "Bulgarian",
            Language::German => "German",
            Language::French => "French",
            Language::Spanish => "Spanish",
            Language::Italian => "Italian",
            Language::Russian => "Russian",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub description: String,
    pub language: Language,
    /// Free-form attributes such as genre or audience.
    pub meta: HashMap<String, String>,
}

impl Default for BookMetadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            language: Language::Unknown,
            meta: HashMap::new(),
        }
    }
}

/// One declared chapter, as read from the table of contents.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub title: String,
    pub source: String,
}

/// A labelled position in a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    chapter: usize,
    position: usize,
    label: String,
}

impl Bookmark {
    pub fn new(chapter: usize, position: usize, label: impl Into<String>) -> Self {
        Self {
            chapter,
            position,
            label: label.into(),
        }
    }

    /// Index of the chapter the bookmark points into.
    pub fn chapter(&self) -> usize {
        self.chapter
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_default() {
        assert_eq!(parse_or_default::<i32>(Some("42"), 7), 42);
        assert_eq!(parse_or_default::<i32>(Some(" 42 "), 7), 42);
        assert_eq!(parse_or_default::<i32>(Some("forty-two"), 7), 7);
        assert_eq!(parse_or_default::<i32>(None, 7), 7);
    }

    #[test]
    fn test_language_default() {
        assert_eq!(Language::default(), Language::Unknown);
    }

    #[test]
    fn test_language_numeric_codes() {
        assert_eq!(Language::parse("1"), Language::English);
        assert_eq!(Language::parse("7"), Language::Russian);
        assert_eq!(Language::parse("0"), Language::Unknown);
        assert_eq!(Language::parse("8"), Language::Unknown);
        assert_eq!(Language::parse("-3"), Language::Unknown);
    }

    #[test]
    fn test_language_iso_codes() {
        assert_eq!(Language::parse("en"), Language::English);
        assert_eq!(Language::parse("BG"), Language::Bulgarian);
        assert_eq!(Language::parse(" de "), Language::German);
        assert_eq!(Language::parse("klingon"), Language::Unknown);
        assert_eq!(Language::parse(""), Language::Unknown);
    }

    #[test]
    fn test_language_code_roundtrip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()), lang);
            assert!(lang.iso_code().is_some());
        }
        assert_eq!(Language::Unknown.iso_code(), None);
    }

    #[test]
    fn test_book_metadata_default() {
        let metadata = BookMetadata::default();
        assert_eq!(metadata.title, "Untitled");
        assert_eq!(metadata.author, "Unknown Author");
        assert_eq!(metadata.description, "No description");
        assert_eq!(metadata.language, Language::Unknown);
        assert!(metadata.meta.is_empty());
    }

    #[test]
    fn test_bookmark_accessors() {
        let bookmark = Bookmark::new(2, 120, "The duel");
        assert_eq!(bookmark.chapter(), 2);
        assert_eq!(bookmark.position(), 120);
        assert_eq!(bookmark.label(), "The duel");

        let unlabelled = Bookmark::new(0, 0, "");
        assert_eq!(unlabelled.label(), "");
    }
}
