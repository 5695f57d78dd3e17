//! A reading-state model for packaged e-books: metadata and table of
//! contents loading, lazily loaded chapter text, reading positions and
//! bookmarks persisted in a sidecar file, and a pluggable text tokenizer.

pub mod archive;
pub mod book;
pub mod chapter;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod logging;
pub mod models;
pub mod parser;
pub mod userdata;
pub mod xml;

pub use archive::{Archive, MemoryArchive, ZipBookArchive};
pub use book::Book;
pub use chapter::Chapter;
pub use config::Config;
pub use error::{BookError, Result};
pub use models::{BookMetadata, Bookmark, Language};
pub use parser::{MarkupParser, PlainTextParser, TextParser, Token, TokenKind, Tokenizer};
