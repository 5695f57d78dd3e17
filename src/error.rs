//! Error types for book loading, persistence and navigation.

use thiserror::Error;

/// Errors raised by the document model.
///
/// `Format` covers structural problems with the book itself and is fatal to
/// [`crate::book::Book::open`]. `UserData` is recoverable: the sidecar record
/// is discarded and the book continues with defaults.
#[derive(Error, Debug)]
pub enum BookError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid book: {0}")]
    Format(String),

    #[error("Entry not found in archive: {0}")]
    EntryNotFound(String),

    #[error("Archive is closed")]
    ArchiveClosed,

    #[error("Invalid user data: {0}")]
    UserData(String),

    #[error("Position {position} is outside the chapter buffer of size {size}")]
    InvalidPosition { position: usize, size: usize },

    #[error("Chapter {index} does not exist, the book has {count} chapters")]
    ChapterOutOfRange { index: usize, count: usize },
}

impl BookError {
    /// True for errors that describe the book's own structure rather than
    /// the environment it was read from.
    pub fn is_structural(&self) -> bool {
        matches!(self, BookError::Format(_))
    }
}

pub type Result<T> = std::result::Result<T, BookError>;
