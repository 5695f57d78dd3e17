use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::archive::{Archive, ZipBookArchive};
use crate::chapter::Chapter;
use crate::config::Config;
use crate::descriptor::{parse_book_descriptor, parse_toc};
use crate::error::{BookError, Result};
use crate::logging;
use crate::models::{BookMetadata, Bookmark, Language};
use crate::userdata::{BookmarkRecord, ChapterPosition, Sidecar, UserData, sidecar_path};

/// An open book: metadata, the chapter chain, reading progress and bookmarks.
///
/// A `Book` owns its archive and sidecar for as long as it is open. It is
/// meant to be driven by a single owner and does no locking of its own.
pub struct Book {
    metadata: BookMetadata,
    chapters: Vec<Chapter>,
    current: usize,
    bookmarks: Vec<Bookmark>,
    archive: Box<dyn Archive>,
    sidecar: Option<Sidecar>,
    sidecar_path: PathBuf,
}

impl std::fmt::Debug for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Book")
            .field("metadata", &self.metadata)
            .field("chapters", &self.chapters.len())
            .field("current", &self.current)
            .field("bookmarks", &self.bookmarks)
            .field("sidecar_path", &self.sidecar_path)
            .finish_non_exhaustive()
    }
}

impl Book {
    /// Opens a ZIP-packaged book with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, &Config::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let archive = ZipBookArchive::open(path)?;
        Self::open_archive(path, Box::new(archive), config)
    }

    /// Opens a book from an already acquired archive. `path` names the book
    /// on disk and is only used to locate the sidecar.
    ///
    /// Structural problems with the descriptors fail the whole open and
    /// release the archive. Problems with the sidecar never do: an unreadable
    /// sidecar disables persistence, and an invalid one is ignored and
    /// overwritten on the next save.
    pub fn open_archive(
        path: impl AsRef<Path>,
        mut archive: Box<dyn Archive>,
        config: &Config,
    ) -> Result<Self> {
        let path = path.as_ref();

        let (metadata, chapters) = match load_descriptors(archive.as_mut(), config) {
            Ok(loaded) => loaded,
            Err(e) => {
                archive.close();
                return Err(e);
            }
        };

        logging::info(format!(
            "opened \"{}\" by {} ({} chapters)",
            metadata.title,
            metadata.author,
            chapters.len()
        ));

        let mut book = Self {
            metadata,
            chapters,
            current: 0,
            bookmarks: Vec::new(),
            archive,
            sidecar: None,
            sidecar_path: sidecar_path(path, &config.sidecar_extension),
        };
        book.attach_sidecar();
        Ok(book)
    }

    fn attach_sidecar(&mut self) {
        let mut sidecar = match Sidecar::open(&self.sidecar_path) {
            Ok(sidecar) => sidecar,
            Err(e) => {
                logging::warn(format!(
                    "cannot open {}, reading progress will not be saved: {}",
                    self.sidecar_path.display(),
                    e
                ));
                return;
            }
        };

        if sidecar.was_created() {
            logging::debug(format!("created {}", self.sidecar_path.display()));
            self.sidecar = Some(sidecar);
            return;
        }

        let content = match sidecar.read() {
            Ok(content) => content,
            Err(e) => {
                logging::warn(format!(
                    "cannot read {}, reading progress will not be saved: {}",
                    self.sidecar_path.display(),
                    e
                ));
                return;
            }
        };

        if let Err(e) = self.load_user_data(&content) {
            logging::warn(format!(
                "ignoring {}, it will be overwritten on save: {}",
                self.sidecar_path.display(),
                e
            ));
        }
        self.sidecar = Some(sidecar);
    }

    /// Applies a sidecar record. The record is validated in full before any
    /// of it is applied, so on error the book is left untouched.
    fn load_user_data(&mut self, content: &[u8]) -> Result<()> {
        let record = UserData::parse(content)?;
        let checksum = self.archive.checksum();
        if record.checksum != checksum {
            return Err(BookError::UserData(format!(
                "Wrong data: checksum {} does not match archive checksum {}",
                record.checksum, checksum
            )));
        }

        let mut bookmarks = Vec::with_capacity(record.bookmarks.len());
        for bookmark in &record.bookmarks {
            let chapter = self.clamp_index(bookmark.chapter);
            bookmarks.push(Bookmark::new(chapter, bookmark.position, bookmark.label.clone()));
        }
        for entry in &record.chapters {
            let index = self.clamp_index(entry.chapter);
            self.chapters[index].restore_position(entry.position);
        }
        self.bookmarks = bookmarks;
        self.current = self.clamp_index(record.current_chapter);

        logging::debug(format!(
            "restored progress: chapter {}, {} bookmarks",
            self.current,
            self.bookmarks.len()
        ));
        Ok(())
    }

    /// Releases the archive and the sidecar. Safe to call more than once.
    pub fn close(&mut self) {
        self.archive.close();
        self.sidecar = None;
    }

    pub fn is_closed(&self) -> bool {
        self.archive.is_closed()
    }

    pub fn metadata(&self) -> &BookMetadata {
        &self.metadata
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn author(&self) -> &str {
        &self.metadata.author
    }

    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    pub fn language(&self) -> Language {
        self.metadata.language
    }

    pub fn meta(&self) -> &HashMap<String, String> {
        &self.metadata.meta
    }

    pub fn archive_checksum(&self) -> u32 {
        self.archive.checksum()
    }

    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar_path
    }

    /// False when the sidecar could not be opened; saves are then no-ops.
    pub fn persistence_enabled(&self) -> bool {
        self.sidecar.is_some()
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    fn clamp_index(&self, index: i64) -> usize {
        let last = self.chapters.len().saturating_sub(1);
        usize::try_from(index).map_or(0, |index| index.min(last))
    }

    /// Tolerant lookup: negative indices give the first chapter, indices past
    /// the end give the last.
    pub fn chapter(&self, index: i64) -> &Chapter {
        &self.chapters[self.clamp_index(index)]
    }

    /// Index of `chapter` in this book, or 0 if it belongs to another book.
    pub fn chapter_number(&self, chapter: &Chapter) -> usize {
        match self.chapters.get(chapter.index()) {
            Some(member) if std::ptr::eq(member, chapter) => chapter.index(),
            _ => 0,
        }
    }

    pub fn prev_chapter(&self, chapter: &Chapter) -> Option<&Chapter> {
        let index = self.chapter_number(chapter);
        index.checked_sub(1).and_then(|prev| self.chapters.get(prev))
    }

    pub fn next_chapter(&self, chapter: &Chapter) -> Option<&Chapter> {
        self.chapters.get(self.chapter_number(chapter) + 1)
    }

    pub fn current_chapter(&self) -> &Chapter {
        &self.chapters[self.current]
    }

    pub fn current_chapter_number(&self) -> usize {
        self.current
    }

    /// Makes the chapter at `index` current, clamping like [`Book::chapter`].
    pub fn set_current_chapter(&mut self, index: i64) {
        self.current = self.clamp_index(index);
    }

    pub fn current_chapter_position(&self) -> usize {
        self.chapters[self.current].position()
    }

    /// Moves the reading position in the current chapter, loading its text
    /// first if necessary. Positions outside the buffer are rejected and
    /// leave the old position in place.
    pub fn set_current_chapter_pos(&mut self, position: usize) -> Result<()> {
        let chapter = &mut self.chapters[self.current];
        chapter.load(self.archive.as_mut())?;
        chapter.set_position(position)
    }

    /// Text of the chapter at `index`, loaded from the archive on first use.
    pub fn chapter_text(&mut self, index: usize) -> Result<&str> {
        let count = self.chapters.len();
        let chapter = self
            .chapters
            .get_mut(index)
            .ok_or(BookError::ChapterOutOfRange { index, count })?;
        chapter.load(self.archive.as_mut())
    }

    pub fn current_chapter_text(&mut self) -> Result<&str> {
        self.chapter_text(self.current)
    }

    /// Releases every loaded chapter buffer. Positions are kept.
    pub fn unload_chapters_buffers(&mut self) {
        for chapter in &mut self.chapters {
            chapter.unload();
        }
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// Appends a bookmark. The chapter index is clamped like
    /// [`Book::chapter`].
    pub fn add_bookmark(&mut self, chapter: i64, position: usize, label: impl Into<String>) {
        let chapter = self.clamp_index(chapter);
        self.bookmarks.push(Bookmark::new(chapter, position, label));
    }

    pub fn remove_bookmark(&mut self, index: usize) -> Option<Bookmark> {
        (index < self.bookmarks.len()).then(|| self.bookmarks.remove(index))
    }

    /// Snapshot of the current progress in its persisted form.
    pub fn user_data(&self) -> UserData {
        UserData {
            checksum: self.archive.checksum(),
            current_chapter: self.current as i64,
            chapters: self
                .chapters
                .iter()
                .map(|chapter| ChapterPosition {
                    chapter: self.chapter_number(chapter) as i64,
                    position: chapter.position(),
                })
                .collect(),
            bookmarks: self
                .bookmarks
                .iter()
                .map(|bookmark| BookmarkRecord {
                    chapter: bookmark.chapter() as i64,
                    position: bookmark.position(),
                    label: bookmark.label().to_string(),
                })
                .collect(),
        }
    }

    /// Overwrites the sidecar with the current progress. Does nothing when
    /// persistence is disabled.
    pub fn save_user_data(&mut self) -> Result<()> {
        if self.chapters.is_empty() {
            return Ok(());
        }
        let content = self.user_data().render();
        let Some(sidecar) = self.sidecar.as_mut() else {
            return Ok(());
        };

        if let Err(e) = sidecar.overwrite(&content) {
            logging::error(format!("failed to save {}: {}", self.sidecar_path.display(), e));
            return Err(e.into());
        }
        logging::debug(format!("saved {}", self.sidecar_path.display()));
        Ok(())
    }
}

impl Drop for Book {
    fn drop(&mut self) {
        self.close();
    }
}

fn load_descriptors(
    archive: &mut dyn Archive,
    config: &Config,
) -> Result<(BookMetadata, Vec<Chapter>)> {
    let book_xml = read_descriptor(archive, &config.book_descriptor, "book")?;
    let metadata = parse_book_descriptor(&book_xml, &config.book_descriptor)?;

    let toc_xml = read_descriptor(archive, &config.toc_descriptor, "TOC")?;
    let entries = parse_toc(&toc_xml, &config.toc_descriptor)?;

    let mut chapters = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        if !archive.contains(&entry.source) {
            return Err(BookError::Format(format!(
                "Chapter #{} declared, but its file <{}> is missing",
                index + 1,
                entry.source
            )));
        }
        chapters.push(Chapter::new(index, entry.title, entry.source));
    }

    Ok((metadata, chapters))
}

fn read_descriptor(archive: &mut dyn Archive, name: &str, kind: &str) -> Result<Vec<u8>> {
    match archive.read(name) {
        Err(BookError::EntryNotFound(_)) => Err(BookError::Format(format!(
            "Missing {} descriptor <{}>",
            kind, name
        ))),
        other => other,
    }
}
