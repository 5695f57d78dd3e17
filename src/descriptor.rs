//! Loaders for the structural descriptors packaged inside a book: the book
//! descriptor (title, author, language, meta attributes) and the table of
//! contents.

use crate::error::{BookError, Result};
use crate::models::{BookMetadata, Language, TocEntry};
use crate::xml::Element;

/// Parses a book descriptor.
///
/// Fields that are missing or blank keep their defaults. Every element inside
/// `<meta>` contributes its first attribute value as the key and its text as
/// the value.
pub fn parse_book_descriptor(bytes: &[u8], entry: &str) -> Result<BookMetadata> {
    let root = Element::parse_document(bytes).map_err(|e| {
        BookError::Format(format!("Book descriptor <{}> contains wrong data: {}", entry, e))
    })?;

    let mut metadata = BookMetadata::default();
    for kid in root.elements() {
        match kid.name() {
            "title" => set_if_present(&mut metadata.title, kid),
            "author" => set_if_present(&mut metadata.author, kid),
            "description" => set_if_present(&mut metadata.description, kid),
            "language" => metadata.language = Language::parse(&kid.text()),
            "meta" => {
                for field in kid.elements() {
                    if let Some(key) = field.first_attr() {
                        metadata
                            .meta
                            .insert(key.to_string(), field.text().trim().to_string());
                    }
                }
            }
            _ => {}
        }
    }

    Ok(metadata)
}

fn set_if_present(target: &mut String, element: &Element) {
    let text = element.text();
    let text = text.trim();
    if !text.is_empty() {
        *target = text.to_string();
    }
}

/// Parses a table of contents into chapter declarations, in order.
///
/// A chapter without a `src` attribute is a format error, and so is a table
/// that declares no chapters at all. Blank titles become `Chapter #n`.
pub fn parse_toc(bytes: &[u8], entry: &str) -> Result<Vec<TocEntry>> {
    let root = Element::parse_document(bytes).map_err(|e| {
        BookError::Format(format!("TOC descriptor <{}> contains wrong data: {}", entry, e))
    })?;

    let mut entries = Vec::new();
    for kid in root.elements().filter(|kid| kid.name() == "chapter") {
        let number = entries.len() + 1;
        let source = kid.attr("src").ok_or_else(|| {
            BookError::Format(format!(
                "Invalid TOC descriptor: chapter #{} does not provide src information",
                number
            ))
        })?;

        let title = kid.text();
        let title = match title.trim() {
            "" => default_chapter_title(number),
            trimmed => trimmed.to_string(),
        };

        entries.push(TocEntry {
            title,
            source: source.to_string(),
        });
    }

    if entries.is_empty() {
        return Err(BookError::Format(format!(
            "No chapters were found in the TOC descriptor <{}>",
            entry
        )));
    }

    Ok(entries)
}

pub fn default_chapter_title(number: usize) -> String {
    format!("Chapter #{}", number)
}
