//! A minimal element tree over `quick-xml` events.
//!
//! Book descriptors, tables of contents and sidecars are all tiny documents,
//! so they are read into a tree once and then walked.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("malformed escape: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("unknown entity &{0};")]
    UnknownEntity(String),

    #[error("document is not valid UTF-8")]
    Encoding,

    #[error("document has no root element")]
    NoRoot,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("unexpected closing tag")]
    Unbalanced,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Parses a whole document and returns its root element.
    pub fn parse_document(bytes: &[u8]) -> Result<Element, DocumentError> {
        let content = std::str::from_utf8(strip_bom(bytes)).map_err(|_| DocumentError::Encoding)?;
        let mut reader = Reader::from_str(content);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(Element::from_start(&e)?),
                Event::Empty(e) => {
                    let element = Element::from_start(&e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or(DocumentError::Unbalanced)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(e) => {
                    if let Some(top) = stack.last_mut() {
                        top.push_text(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Event::CData(e) => {
                    if let Some(top) = stack.last_mut() {
                        top.push_text(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Event::GeneralRef(e) => {
                    let entity = String::from_utf8_lossy(e.as_ref()).into_owned();
                    let resolved =
                        resolve_entity(&entity).ok_or(DocumentError::UnknownEntity(entity))?;
                    if let Some(top) = stack.last_mut() {
                        top.push_text(resolved.encode_utf8(&mut [0u8; 4]));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(DocumentError::Unclosed(open.name));
        }
        root.ok_or(DocumentError::NoRoot)
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Element, DocumentError> {
        let name = String::from_utf8_lossy(local_name(start.name().as_ref())).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = quick_xml::escape::unescape(&raw)?.into_owned();
            attributes.push((key, value));
        }
        Ok(Element {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn first_attr(&self) -> Option<&str> {
        self.attributes.first().map(|(_, value)| value.as_str())
    }

    /// Child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DocumentError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(DocumentError::MultipleRoots);
    }
    Ok(())
}

pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "apos" => return Some('\''),
        "quot" => return Some('"'),
        "lt" => return Some('<'),
        "gt" => return Some('>'),
        "amp" => return Some('&'),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_document() {
        let root = Element::parse_document(
            br#"<?xml version="1.0"?>
            <toc><chapter src="a.txt">One</chapter><chapter src="b.txt"/></toc>"#,
        )
        .unwrap();

        assert_eq!(root.name(), "toc");
        let chapters: Vec<_> = root.elements().collect();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].attr("src"), Some("a.txt"));
        assert_eq!(chapters[0].text(), "One");
        assert_eq!(chapters[1].text(), "");
        assert_eq!(chapters[1].attr("title"), None);
    }

    #[test]
    fn test_entities_are_resolved() {
        let root =
            Element::parse_document(br#"<a label="x &amp; y">Tom &amp; Jerry &#65;&#x42;</a>"#)
                .unwrap();
        assert_eq!(root.attr("label"), Some("x & y"));
        assert_eq!(root.text(), "Tom & Jerry AB");
    }

    #[test]
    fn test_bom_is_skipped() {
        let root = Element::parse_document(b"\xEF\xBB\xBF<book/>").unwrap();
        assert_eq!(root.name(), "book");
    }

    #[test]
    fn test_namespaced_names_use_local_part() {
        let root = Element::parse_document(br#"<dc:book xml:lang="en"/>"#).unwrap();
        assert_eq!(root.name(), "book");
        assert_eq!(root.attr("lang"), Some("en"));
    }

    #[test]
    fn test_empty_document_has_no_root() {
        assert!(matches!(
            Element::parse_document(b"   "),
            Err(DocumentError::NoRoot)
        ));
    }

    #[test]
    fn test_unclosed_root_is_rejected() {
        assert!(Element::parse_document(b"<book><title>x</title>").is_err());
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        assert!(Element::parse_document(b"<book><title>x</author></book>").is_err());
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        assert!(matches!(
            Element::parse_document(b"<book>\xFF\xFE</book>"),
            Err(DocumentError::Encoding)
        ));
    }
}
