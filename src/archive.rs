//! Named-entry containers that books are read from.
//!
//! The document model only needs four things from a container: open it,
//! fetch an entry as a byte stream, know the checksum of the whole container
//! and close it. [`ZipBookArchive`] is the on-disk adapter; [`MemoryArchive`]
//! keeps everything in memory for embedding hosts and tests.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{BookError, Result};

pub trait Archive {
    /// Opens the named entry for reading.
    ///
    /// Fails with [`BookError::EntryNotFound`] when the entry does not exist
    /// and with [`BookError::ArchiveClosed`] after [`Archive::close`].
    fn fetch(&mut self, name: &str) -> Result<Box<dyn Read + '_>>;

    fn contains(&self, name: &str) -> bool;

    /// Checksum of the whole container, used to gate persisted user data.
    fn checksum(&self) -> u32;

    /// Releases the underlying resource. Calling it twice is harmless.
    fn close(&mut self);

    fn is_closed(&self) -> bool;

    /// Reads a whole entry into memory.
    fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut stream = self.fetch(name)?;
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// A book packaged as a ZIP file on disk.
pub struct ZipBookArchive {
    path: PathBuf,
    zip: Option<ZipArchive<BufReader<File>>>,
    crc: u32,
}

impl ZipBookArchive {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let crc = file_checksum(path)?;
        let file = File::open(path)?;
        let zip = ZipArchive::new(BufReader::new(file))?;

        Ok(Self {
            path: path.to_path_buf(),
            zip: Some(zip),
            crc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.zip.as_ref().map_or(0, |zip| zip.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Archive for ZipBookArchive {
    fn fetch(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        let zip = self.zip.as_mut().ok_or(BookError::ArchiveClosed)?;
        match zip.by_name(name) {
            Ok(entry) => Ok(Box::new(entry)),
            Err(ZipError::FileNotFound) => Err(BookError::EntryNotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.zip
            .as_ref()
            .is_some_and(|zip| zip.index_for_name(name).is_some())
    }

    fn checksum(&self) -> u32 {
        self.crc
    }

    fn close(&mut self) {
        self.zip = None;
    }

    fn is_closed(&self) -> bool {
        self.zip.is_none()
    }
}

/// CRC-32 of a file, read in chunks.
pub fn file_checksum(path: &Path) -> std::io::Result<u32> {
    let mut file = File::open(path)?;
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// An archive whose entries live in memory.
///
/// Unless overridden with [`MemoryArchive::with_checksum`], the checksum is
/// the CRC-32 of every entry name and body in name order.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: BTreeMap<String, Vec<u8>>,
    checksum: Option<u32>,
    closed: bool,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn with_checksum(mut self, checksum: u32) -> Self {
        self.checksum = Some(checksum);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), bytes.into());
    }
}

impl Archive for MemoryArchive {
    fn fetch(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        if self.closed {
            return Err(BookError::ArchiveClosed);
        }
        let bytes = self
            .entries
            .get(name)
            .ok_or_else(|| BookError::EntryNotFound(name.to_string()))?;
        Ok(Box::new(Cursor::new(bytes.as_slice())))
    }

    fn contains(&self, name: &str) -> bool {
        !self.closed && self.entries.contains_key(name)
    }

    fn checksum(&self) -> u32 {
        if let Some(checksum) = self.checksum {
            return checksum;
        }
        let mut hasher = crc32fast::Hasher::new();
        for (name, bytes) in &self.entries {
            hasher.update(name.as_bytes());
            hasher.update(bytes);
        }
        hasher.finalize()
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
