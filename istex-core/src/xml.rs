//! Lightweight XML loading for service outputs (TEI, MODS, …)
//!
//! Parses the whole document once and keeps a flat, document-ordered list of
//! elements with their attributes and text content, which is all the chain's
//! modules need to read back a fragment.

use crate::error::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name as written (`tei:title`)
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Nesting depth, 0 for the root
    pub depth: usize,
    text: String,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>, depth: usize) -> Result<Self> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            attributes.push((
                String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                attribute.unescape_value()?.into_owned(),
            ));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            depth,
            text: String::new(),
        })
    }

    /// Name without its namespace prefix
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Qualified (`tei:title`) or local (`title`) name match
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name || self.local_name() == name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text of the element and its descendants, trimmed
    pub fn text(&self) -> &str {
        self.text.trim()
    }
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    elements: Vec<XmlElement>,
}

impl XmlDocument {
    /// Parse an XML string. Returns `None` when it holds no element at all.
    pub fn load(xml: &str) -> Result<Option<Self>> {
        let mut reader = Reader::from_str(xml);
        let mut elements: Vec<XmlElement> = Vec::new();
        // indices of the currently open elements
        let mut open: Vec<usize> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    elements.push(XmlElement::from_start(&start, open.len())?);
                    open.push(elements.len() - 1);
                }
                Event::Empty(start) => {
                    elements.push(XmlElement::from_start(&start, open.len())?);
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    for &index in &open {
                        elements[index].text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    let data = data.into_inner();
                    let text = String::from_utf8_lossy(&data);
                    for &index in &open {
                        elements[index].text.push_str(&text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(&index) = open.last() {
            return Err(quick_xml::Error::UnexpectedEof(format!(
                "unclosed element <{}>",
                elements[index].name
            ))
            .into());
        }

        if elements.is_empty() {
            return Ok(None);
        }

        tracing::trace!(elements = elements.len(), "xml document loaded");
        Ok(Some(Self { elements }))
    }

    pub fn root(&self) -> &XmlElement {
        &self.elements[0]
    }

    /// Elements whose qualified or local name is `name`, in document order
    pub fn find<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements
            .iter()
            .filter(move |element| element.is_named(name))
    }

    /// Text of the first element named `name`
    pub fn text(&self, name: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|element| element.is_named(name))
            .map(XmlElement::text)
    }

    pub fn elements(&self) -> &[XmlElement] {
        &self.elements
    }
}
