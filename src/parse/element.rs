//! A small owned element tree built from quick-xml events.
//!
//! VTK files keep the `AppendedData` section after every `Piece`, so arrays cannot be
//! decoded while streaming through the document. The whole document is read into an
//! `Element` tree first, and the codec walks that tree.

use crate::prelude::*;

use super::event_summary::EventSummary;

use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// builder style helper, mostly useful in tests
    pub fn with_attribute<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_text<T: Into<String>>(mut self, text: T) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
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

    /// the attribute value, or a `MissingAttribute` error naming this element
    pub fn required_attribute(&self, key: &str) -> Result<&str, error::MissingAttribute> {
        self.attribute(key)
            .ok_or_else(|| error::MissingAttribute::new(self.name.clone(), key.into()))
    }

    /// parse an attribute (such as `NumberOfPoints`) into a number
    pub fn parse_attribute<T: FromStr>(&self, key: &str) -> Result<T, error::Structural> {
        let value = self.required_attribute(key)?;
        value.trim().parse().map_err(|_| {
            error::InvalidAttribute::new(self.name.clone(), key.into(), value.into()).into()
        })
    }

    /// like `parse_attribute`, but an absent attribute is `None` instead of an error
    pub fn parse_optional_attribute<T: FromStr>(
        &self,
        key: &str,
    ) -> Result<Option<T>, error::InvalidAttribute> {
        match self.attribute(key) {
            Some(value) => value.trim().parse().map(Some).map_err(|_| {
                error::InvalidAttribute::new(self.name.clone(), key.into(), value.into())
            }),
            None => Ok(None),
        }
    }

    /// text content of the element with surrounding whitespace removed
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    /// first child element with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn required_child(&self, name: &str) -> Result<&Element, error::MissingElement> {
        self.child(name)
            .ok_or_else(|| error::MissingElement::new(self.name.clone(), name.into()))
    }

    /// every child element with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// read an entire xml document into an `Element` tree, returning the root element
pub(crate) fn read_element_tree<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<Element, error::Document> {
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        buffer.clear();

        let event = reader
            .read_event_into(buffer)
            .map_err(error::MalformedXml::from)?;

        match event {
            Event::Start(start) => {
                let element = element_from_start(&start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(end) => {
                let element = match stack.pop() {
                    Some(element) => element,
                    None => {
                        let actual = EventSummary::end(&end);
                        return Err(error::UnexpectedElement::new("start element", actual).into());
                    }
                };
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let text = text.unescape().map_err(error::MalformedXml::from)?;
                    current.text.push_str(&text);
                }
            }
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    let bytes = cdata.into_inner();
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|_| error::InvalidUtf8::new(current.name.clone(), "CDATA"))?;
                    current.text.push_str(text);
                }
            }
            Event::Eof => {
                if let Some(open) = stack.last() {
                    let actual = EventSummary::eof();
                    return Err(error::UnexpectedElement::new(format!("/{}", open.name), actual).into());
                }
                break;
            }
            // declarations, comments, processing instructions
            _ => continue,
        }
    }

    root.ok_or_else(|| error::EmptyDocument.into())
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            // only the first top level element is kept
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, error::Document> {
    let name = String::from_utf8(start.name().as_ref().to_vec())
        .map_err(|_| error::InvalidUtf8::new(String::from("<unknown>"), "element name"))?;

    let mut element = Element::new(name);

    for attribute in start.attributes() {
        let attribute = attribute.map_err(error::MalformedAttribute::from)?;

        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|_| error::InvalidUtf8::new(element.name.clone(), "attribute name"))?
            .to_string();
        let value = attribute
            .unescape_value()
            .map_err(error::MalformedXml::from)?
            .into_owned();

        element.attributes.push((key, value));
    }

    Ok(element)
}
