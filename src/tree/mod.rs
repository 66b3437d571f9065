//! A small owned attribute tree that xdmf light data is built in before it is written, and
//! read into before it is decoded.
//!
//! Reading is done with `quick_xml` events and an explicit stack of open elements so that a
//! document that ends before all of its elements are closed is reported as truncated.

mod event_summary;

use crate::error::from_xml_read;
use crate::prelude::*;

use event_summary::{name_to_string, EventSummary};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use std::io::{BufRead, Write};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Default)]
/// One element of a document with its attributes (in order), children and text
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: Option<String>,
}

impl Element {
    pub fn new<T: Into<String>>(tag: T) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn with_attribute<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// set an attribute, replacing the value of an existing attribute with the same key
    pub fn set_attribute<K: Into<String>, V: ToString>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.to_string();

        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn require_attribute(&self, key: &str) -> Result<&str, FormatError> {
        self.attribute(key)
            .ok_or_else(|| MissingAttribute::new(self.tag.clone(), key.into()).into())
    }

    /// parse a required attribute, `expected` describes the accepted values in the error
    pub fn parse_attribute<T: FromStr>(&self, key: &str, expected: &str) -> Result<T, FormatError> {
        let value = self.require_attribute(key)?;

        value.trim().parse().map_err(|_| {
            InvalidAttributeValue::new(self.tag.clone(), key.into(), expected.into(), value.into())
                .into()
        })
    }

    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.add_child(child);
        self
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// first child with the given tag
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.tag == tag)
    }

    pub fn child_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|child| child.tag == tag)
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    pub fn require_child(&self, tag: &str) -> Result<&Element, FormatError> {
        self.child(tag)
            .ok_or_else(|| MissingElement::new(self.tag.clone(), tag.into()).into())
    }

    pub fn set_text<T: Into<String>>(&mut self, text: T) {
        self.text = Some(text.into());
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Parse a complete document and return its root element
pub fn parse<R: BufRead>(reader: R) -> Result<Element, Error> {
    parse_with_path(reader, None)
}

pub(crate) fn parse_file(path: &Path) -> Result<Element, Error> {
    let file = std::fs::File::open(path).map_err(ResourceError::open(path))?;
    let reader = std::io::BufReader::new(file);
    parse_with_path(reader, Some(path))
}

fn parse_with_path<R: BufRead>(reader: R, path: Option<&Path>) -> Result<Element, Error> {
    let mut reader = Reader::from_reader(reader);
    reader.trim_text(true);

    let mut buffer = Vec::new();
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event_into(&mut buffer)
            .map_err(|e| from_xml_read(path, e))?;

        match event {
            Event::Start(start) => {
                if root.is_some() {
                    let err = UnexpectedElement::new("end of document", EventSummary::start(&start));
                    return Err(FormatError::from(err).into());
                }
                open.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                close_element(&mut open, &mut root, element)?;
            }
            Event::End(_) => {
                // mismatched end tags are rejected by the reader
                if let Some(element) = open.pop() {
                    close_element(&mut open, &mut root, element)?;
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| from_xml_read(path, e))?;
                append_text(&mut open, &text);
            }
            Event::CData(cdata) => {
                let text = String::from_utf8_lossy(&cdata).into_owned();
                append_text(&mut open, &text);
            }
            Event::Eof => break,
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => (),
        }

        buffer.clear();
    }

    if let Some(unclosed) = open.last() {
        return Err(FormatError::from(Truncated::new(unclosed.tag.clone())).into());
    }

    root.ok_or_else(|| {
        let err = UnexpectedElement::new("root element", EventSummary::eof());
        FormatError::from(err).into()
    })
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, FormatError> {
    let mut element = Element::new(name_to_string(start.name()));

    for attribute in start.attributes() {
        let attribute = attribute.map_err(MalformedAttribute::from)?;
        let key = name_to_string(attribute.key);
        let value = attribute.unescape_value().map_err(MalformedXml::from)?;
        element.attributes.push((key, value.into_owned()));
    }

    Ok(element)
}

fn close_element(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), FormatError> {
    if let Some(parent) = open.last_mut() {
        parent.children.push(element);
        return Ok(());
    }

    if root.is_some() {
        let err = UnexpectedElement::new("end of document", format!("second root `{}`", element.tag));
        return Err(err.into());
    }

    *root = Some(element);
    Ok(())
}

fn append_text(open: &mut [Element], text: &str) {
    // text outside of the root element carries no information
    if let Some(element) = open.last_mut() {
        match &mut element.text {
            Some(existing) => existing.push_str(text),
            None => element.text = Some(text.to_string()),
        }
    }
}

/// Write `root` as a complete, indented document
pub fn serialize<W: Write>(root: &Element, writer: W) -> Result<(), quick_xml::Error> {
    let mut writer = Writer::new_with_indent(writer, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    write_element(&mut writer, root)?;
    writer.inner().write_all(b"\n").map_err(quick_xml::Error::Io)?;

    Ok(())
}

pub(crate) fn serialize_file(root: &Element, path: &Path) -> Result<(), Error> {
    let file = std::fs::File::create(path).map_err(ResourceError::create(path))?;
    let mut writer = std::io::BufWriter::new(file);

    serialize(root, &mut writer).map_err(|e| match e {
        quick_xml::Error::Io(source) => Error::from(ResourceError::Write {
            path: path.to_path_buf(),
            source,
        }),
        other => FormatError::from(MalformedXml::from(other)).into(),
    })?;

    writer.flush().map_err(ResourceError::write(path))?;
    tracing::debug!(path = %path.display(), "wrote xdmf document");

    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<(), quick_xml::Error> {
    let start = BytesStart::new(element.tag.as_str()).with_attributes(
        element
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );

    if element.children.is_empty() && element.text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;

    if let Some(text) = &element.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }

    for child in &element.children {
        write_element(writer, child)?;
    }

    writer.write_event(Event::End(BytesEnd::new(element.tag.as_str())))?;

    Ok(())
}
