use crate::archive::Archive;
use crate::error::{BookError, Result};
use crate::logging;

/// One chapter of an open book.
///
/// The text buffer is loaded from the archive on first access and may be
/// released again with [`Chapter::unload`]; index, title and reading position
/// survive unloading.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    index: usize,
    title: String,
    source: String,
    text: Option<String>,
    position: usize,
}

impl Chapter {
    pub fn new(index: usize, title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            source: source.into(),
            text: None,
            position: 0,
        }
    }

    /// Position of the chapter in the book, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Name of the archive entry holding the chapter text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.text.is_some()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Size of the loaded buffer in bytes, `None` while unloaded.
    pub fn buffer_size(&self) -> Option<usize> {
        self.text.as_ref().map(String::len)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Sets the reading position without bounds checking. Used when restoring
    /// persisted progress before the buffer is loaded.
    pub(crate) fn restore_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Sets the reading position, which must lie inside the loaded buffer and
    /// on a character boundary.
    pub(crate) fn set_position(&mut self, position: usize) -> Result<()> {
        let text = self.text.as_deref().unwrap_or("");
        if position >= text.len() || !text.is_char_boundary(position) {
            return Err(BookError::InvalidPosition {
                position,
                size: text.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Returns the chapter text, reading it from `archive` if needed.
    pub fn load(&mut self, archive: &mut dyn Archive) -> Result<&str> {
        if self.text.is_none() {
            let bytes = archive.read(&self.source)?;
            let bytes = crate::xml::strip_bom(&bytes);
            let text = match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) => {
                    logging::warn(format!(
                        "chapter <{}> is not valid UTF-8, replacing invalid sequences",
                        self.source
                    ));
                    String::from_utf8_lossy(bytes).into_owned()
                }
            };
            logging::debug(format!("loaded chapter {} ({} bytes)", self.index, text.len()));
            self.position = clamp_to_buffer(self.position, &text);
            self.text = Some(text);
        }
        Ok(self.text.as_deref().unwrap_or(""))
    }

    pub fn unload(&mut self) {
        self.text = None;
    }
}

/// Last valid character offset at or before `position`.
fn clamp_to_buffer(position: usize, text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let mut position = position.min(text.len() - 1);
    while !text.is_char_boundary(position) {
        position -= 1;
    }
    position
}
