//! # XML Bodies
//!
//! Converts between JSON values and XML documents with a single `<root>`
//! element.
//!
//! Rendering:
//! - object: one child element per key, in key order
//! - array: the element repeated once per item
//! - null: an empty element
//! - string, number, boolean: element text
//!
//! Parsing goes the other way. Repeated children become an array and an
//! element without children becomes its trimmed text, so every leaf comes
//! back as a string. Attributes, comments and processing instructions are
//! ignored.

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Name of the document element
pub const ROOT_ELEMENT: &str = "root";

/// Errors converting XML documents
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("Malformed XML: {0}")]
    Malformed(#[from] quick_xml::Error),

    #[error("XML document must have a single <root> element")]
    MissingRoot,

    #[error("XML element <{0}> is not closed")]
    Unclosed(String),
}

/// An element still being read
struct OpenElement {
    name: String,
    children: IndexMap<String, Vec<Value>>,
    text: String,
}

impl OpenElement {
    fn new(name: String) -> Self {
        Self {
            name,
            children: IndexMap::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> (String, Value) {
        if self.children.is_empty() {
            return (self.name, Value::String(self.text));
        }

        let object: Map<String, Value> = self
            .children
            .into_iter()
            .map(|(name, mut values)| {
                let value = if values.len() == 1 {
                    values.remove(0)
                } else {
                    Value::Array(values)
                };
                (name, value)
            })
            .collect();
        (self.name, Value::Object(object))
    }
}

/// Parses a document and returns the content of its `<root>` element.
pub fn parse_document(text: &str) -> Result<Value, XmlError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut open: Vec<OpenElement> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = reader.decoder().decode(start.name().as_ref())?.into_owned();
                open.push(OpenElement::new(name));
            }
            Event::Empty(start) => {
                let name = reader.decoder().decode(start.name().as_ref())?.into_owned();
                close(&mut open, &mut root, (name, Value::String(String::new())))?;
            }
            Event::Text(text) => {
                if let Some(element) = open.last_mut() {
                    element.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(element) = open.last_mut() {
                    element.text.push_str(&reader.decoder().decode(&data)?);
                }
            }
            Event::End(_) => {
                let element = open.pop().ok_or(XmlError::MissingRoot)?;
                close(&mut open, &mut root, element.into_value())?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(element) = open.pop() {
        return Err(XmlError::Unclosed(element.name));
    }

    match root {
        Some((name, value)) if name == ROOT_ELEMENT => Ok(value),
        _ => Err(XmlError::MissingRoot),
    }
}

/// Attaches a finished element to its parent, or makes it the document element.
fn close(
    open: &mut [OpenElement],
    root: &mut Option<(String, Value)>,
    (name, value): (String, Value),
) -> Result<(), XmlError> {
    match open.last_mut() {
        Some(parent) => {
            parent.children.entry(name).or_default().push(value);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some((name, value));
            Ok(())
        }
        None => Err(XmlError::MissingRoot),
    }
}

/// Renders `value` as a document with a `<root>` element.
pub fn render_document(value: &Value) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))?;
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                write_element(&mut writer, name, child)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                write_element(&mut writer, "item", item)?;
            }
        }
        Value::Null => {}
        scalar => write_text(&mut writer, &scalar_text(scalar))?,
    }
    writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;

    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<(), XmlError> {
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
        }
        Value::Null => {
            writer.write_event(Event::Empty(BytesStart::new(name)))?;
        }
        Value::Object(map) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            for (child_name, child) in map {
                write_element(writer, child_name, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        scalar => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            write_text(writer, &scalar_text(scalar))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
    }
    Ok(())
}

fn write_text(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<(), XmlError> {
    writer.write_event(Event::Text(BytesText::new(text)))?;
    Ok(())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
