//! Reading progress and bookmarks persisted next to the book.
//!
//! The sidecar is a small fixed-layout document:
//!
//! ```text
//! <book crc="1234" chapter="2">
//! 	<chapter chapter="0" position="0" />
//! 	<bookmark chapter="1" position="5">label</bookmark>
//! </book>
//! ```
//!
//! A record is only trusted when its `crc` matches the checksum of the
//! archive it was saved for.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{BookError, Result};
use crate::xml::Element;

const BOOK_TAG: &str = "book";
const CHAPTER_TAG: &str = "chapter";
const BOOKMARK_TAG: &str = "bookmark";
const CRC_ATTRIB: &str = "crc";
const CHAPTER_ATTRIB: &str = "chapter";
const POSITION_ATTRIB: &str = "position";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterPosition {
    pub chapter: i64,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkRecord {
    pub chapter: i64,
    pub position: usize,
    pub label: String,
}

/// The persisted form of a reader's progress in one book.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserData {
    pub checksum: u32,
    pub current_chapter: i64,
    pub chapters: Vec<ChapterPosition>,
    pub bookmarks: Vec<BookmarkRecord>,
}

impl UserData {
    /// Parses a sidecar document. Content that is not UTF-8 is rejected
    /// like any other malformed record.
    ///
    /// The record is all-or-nothing: any missing or malformed required field
    /// rejects the whole document. Negative positions are clamped to 0.
    /// Chapter indices are kept as written; the book clamps them on apply.
    pub fn parse(content: impl AsRef<[u8]>) -> Result<Self> {
        let root = Element::parse_document(content.as_ref())
            .map_err(|e| BookError::UserData(format!("Wrong XML data: {}", e)))?;

        if root.name() != BOOK_TAG {
            return Err(BookError::UserData(format!(
                "Wrong data: root element is <{}>",
                root.name()
            )));
        }

        let checksum = required_int::<u32>(&root, CRC_ATTRIB)?;
        let current_chapter = required_int::<i64>(&root, CHAPTER_ATTRIB)?;

        let mut record = UserData {
            checksum,
            current_chapter,
            ..UserData::default()
        };

        for kid in root.elements() {
            match kid.name() {
                BOOKMARK_TAG => record.bookmarks.push(BookmarkRecord {
                    chapter: required_int(kid, CHAPTER_ATTRIB)?,
                    position: non_negative(required_int(kid, POSITION_ATTRIB)?),
                    label: kid.text(),
                }),
                CHAPTER_TAG => record.chapters.push(ChapterPosition {
                    chapter: required_int(kid, CHAPTER_ATTRIB)?,
                    position: non_negative(required_int(kid, POSITION_ATTRIB)?),
                }),
                _ => {}
            }
        }

        Ok(record)
    }

    /// Renders the record in the fixed sidecar layout.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "<{} {}=\"{}\" {}=\"{}\">",
            BOOK_TAG, CRC_ATTRIB, self.checksum, CHAPTER_ATTRIB, self.current_chapter
        );
        for chapter in &self.chapters {
            let _ = writeln!(
                out,
                "\t<{} {}=\"{}\" {}=\"{}\" />",
                CHAPTER_TAG, CHAPTER_ATTRIB, chapter.chapter, POSITION_ATTRIB, chapter.position
            );
        }
        for bookmark in &self.bookmarks {
            let _ = writeln!(
                out,
                "\t<{} {}=\"{}\" {}=\"{}\">{}</{}>",
                BOOKMARK_TAG,
                CHAPTER_ATTRIB,
                bookmark.chapter,
                POSITION_ATTRIB,
                bookmark.position,
                quick_xml::escape::escape(bookmark.label.as_str()),
                BOOKMARK_TAG
            );
        }
        let _ = writeln!(out, "</{}>", BOOK_TAG);
        out
    }
}

fn required_int<T: std::str::FromStr>(element: &Element, attribute: &str) -> Result<T> {
    let raw = element.attr(attribute).ok_or_else(|| {
        BookError::UserData(format!(
            "Missing info: <{}> has no {} attribute",
            element.name(),
            attribute
        ))
    })?;
    raw.trim().parse::<T>().map_err(|_| {
        BookError::UserData(format!(
            "Malformed int data: {}=\"{}\" in <{}>",
            attribute,
            raw,
            element.name()
        ))
    })
}

fn non_negative(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Derives the sidecar path for a book: same directory and stem, new extension.
pub fn sidecar_path(book_path: &Path, extension: &str) -> PathBuf {
    book_path.with_extension(extension)
}

/// An open handle on a book's sidecar file, held for the life of the book.
#[derive(Debug)]
pub struct Sidecar {
    path: PathBuf,
    file: File,
    created: bool,
}

impl Sidecar {
    /// Opens the sidecar for reading and writing, creating an empty file if
    /// none exists. A directory at `path` is an error.
    pub fn open(path: &Path) -> io::Result<Self> {
        let created = !path.exists();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            created,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when [`Sidecar::open`] had to create the file.
    pub fn was_created(&self) -> bool {
        self.created
    }

    /// Raw file content. Decoding is left to [`UserData::parse`].
    pub fn read(&mut self) -> io::Result<Vec<u8>> {
        let mut content = Vec::new();
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Replaces the whole file content. Truncates first, then writes; a
    /// failure part way leaves whatever was already written.
    pub fn overwrite(&mut self, content: &str) -> io::Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(content.as_bytes())?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> UserData {
        UserData {
            checksum: 3_735_928_559,
            current_chapter: 1,
            chapters: vec![
                ChapterPosition { chapter: 0, position: 0 },
                ChapterPosition { chapter: 1, position: 1234 },
            ],
            bookmarks: vec![
                BookmarkRecord {
                    chapter: 1,
                    position: 5,
                    label: "The storm".to_string(),
                },
                BookmarkRecord {
                    chapter: 0,
                    position: 0,
                    label: String::new(),
                },
            ],
        }
    }

    #[test]
    fn test_render_layout_is_exact() {
        let expected = "<book crc=\"3735928559\" chapter=\"1\">\n\
            \t<chapter chapter=\"0\" position=\"0\" />\n\
            \t<chapter chapter=\"1\" position=\"1234\" />\n\
            \t<bookmark chapter=\"1\" position=\"5\">The storm</bookmark>\n\
            \t<bookmark chapter=\"0\" position=\"0\"></bookmark>\n\
            </book>\n";
        assert_eq!(sample().render(), expected);
    }

    #[test]
    fn test_render_empty_record() {
        let record = UserData {
            checksum: 7,
            current_chapter: 0,
            ..UserData::default()
        };
        assert_eq!(record.render(), "<book crc=\"7\" chapter=\"0\">\n</book>\n");
    }

    #[test]
    fn test_parse_rendered_record() {
        let record = sample();
        assert_eq!(UserData::parse(&record.render()).unwrap(), record);
    }

    #[test]
    fn test_labels_are_escaped() {
        let mut record = sample();
        record.bookmarks[0].label = "<b> & \"quotes\"".to_string();
        let rendered = record.render();
        assert!(rendered.contains("&lt;b&gt; &amp; &quot;quotes&quot;"));
        assert_eq!(UserData::parse(&rendered).unwrap().bookmarks[0].label, "<b> & \"quotes\"");
    }

    #[test]
    fn test_negative_positions_are_clamped() {
        let content = r#"<book crc="1" chapter="-4">
	<chapter chapter="0" position="-20" />
	<bookmark chapter="0" position="-1">x</bookmark>
</book>"#;
        let record = UserData::parse(content).unwrap();
        assert_eq!(record.current_chapter, -4);
        assert_eq!(record.chapters[0].position, 0);
        assert_eq!(record.bookmarks[0].position, 0);
    }

    #[test]
    fn test_missing_crc_is_rejected() {
        let result = UserData::parse(r#"<book chapter="0"></book>"#);
        match result {
            Err(BookError::UserData(message)) => assert!(message.contains("crc")),
            other => panic!("expected user data error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_bookmark_rejects_record() {
        let content = r#"<book crc="1" chapter="0">
	<bookmark chapter="0" position="3">fine</bookmark>
	<bookmark chapter="zero" position="3">bad</bookmark>
</book>"#;
        assert!(matches!(UserData::parse(content), Err(BookError::UserData(_))));
    }

    #[test]
    fn test_chapter_record_without_position_rejects_record() {
        let content = r#"<book crc="1" chapter="0"><chapter chapter="0" /></book>"#;
        assert!(matches!(UserData::parse(content), Err(BookError::UserData(_))));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(UserData::parse(""), Err(BookError::UserData(_))));
        assert!(matches!(UserData::parse("<book crc=\"1\""), Err(BookError::UserData(_))));
        assert!(matches!(
            UserData::parse("<library crc=\"1\" chapter=\"0\"/>"),
            Err(BookError::UserData(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let content: &[u8] = b"<book crc=\"1\" chapter=\"0\">\xFF\xFE</book>";
        match UserData::parse(content) {
            Err(BookError::UserData(message)) => assert!(message.contains("Wrong XML data")),
            other => panic!("expected user data error, got {:?}", other),
        }
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("/books/war.alb"), "alx"),
            PathBuf::from("/books/war.alx")
        );
        assert_eq!(
            sidecar_path(Path::new("books/noext"), "alx"),
            PathBuf::from("books/noext.alx")
        );
    }

    #[test]
    fn test_sidecar_create_read_overwrite() -> io::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("book.alx");

        let mut sidecar = Sidecar::open(&path)?;
        assert!(sidecar.was_created());
        assert!(path.exists());
        assert_eq!(sidecar.read()?, b"");

        sidecar.overwrite("a much longer first version")?;
        sidecar.overwrite("short")?;
        assert_eq!(sidecar.read()?, b"short");
        assert_eq!(std::fs::read_to_string(&path)?, "short");

        let mut reopened = Sidecar::open(&path)?;
        assert!(!reopened.was_created());
        assert_eq!(reopened.read()?, b"short");
        Ok(())
    }

    #[test]
    fn test_sidecar_directory_is_an_error() -> io::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("book.alx");
        std::fs::create_dir(&path)?;
        assert!(Sidecar::open(&path).is_err());
        Ok(())
    }
}
