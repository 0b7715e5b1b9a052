//! XML to JSON value conversion.
//!
//! Output shape: the root element is the only top-level key, attributes
//! live under `"$"`, character data under `"_"` when the element also has
//! attributes or children, repeated siblings collapse into arrays, and
//! text-only elements become plain strings.

use quick_xml::{events::Event, Reader};
use serde_json::{Map, Value};

use crate::XmlParseError;

const ATTR_KEY: &str = "$";
const CHAR_KEY: &str = "_";

struct Element {
    name: String,
    attrs: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Element {
    fn into_value(self) -> Value {
        let text = if self.text.trim().is_empty() {
            None
        } else {
            Some(self.text)
        };

        if self.attrs.is_empty() && self.children.is_empty() {
            return Value::String(text.unwrap_or_default());
        }

        let mut object = Map::new();
        if !self.attrs.is_empty() {
            object.insert(ATTR_KEY.to_owned(), Value::Object(self.attrs));
        }
        if let Some(text) = text {
            object.insert(CHAR_KEY.to_owned(), Value::String(text));
        }
        for (key, value) in self.children {
            object.insert(key, value);
        }
        Value::Object(object)
    }

    fn add_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }
}

/// Parses `input` into a nested JSON value.
pub fn parse_xml(input: &str) -> Result<Value, XmlParseError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|err| parse_error(err.to_string(), position))?;

        match event {
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(parse_error("multiple root elements", position));
                }
                stack.push(open_element(&start, position)?);
            }
            Event::Empty(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(parse_error("multiple root elements", position));
                }
                let element = open_element(&start, position)?;
                close_element(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| parse_error("unexpected closing tag", position))?;
                close_element(element, &mut stack, &mut root);
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|err| parse_error(err.to_string(), position))?;
                append_text(&mut stack, &text, position)?;
            }
            Event::CData(data) => {
                let data = data.into_inner();
                append_text(&mut stack, &String::from_utf8_lossy(&data), position)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(parse_error(
            format!("unclosed element <{}>", open.name),
            reader.buffer_position(),
        ));
    }

    let (name, value) = root.ok_or_else(|| parse_error("document has no root element", 0))?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}

fn open_element(
    start: &quick_xml::events::BytesStart<'_>,
    position: usize,
) -> Result<Element, XmlParseError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Map::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| parse_error(err.to_string(), position))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| parse_error(err.to_string(), position))?;
        attrs.insert(key, Value::String(value.into_owned()));
    }

    Ok(Element {
        name,
        attrs,
        children: Map::new(),
        text: String::new(),
    })
}

fn close_element(
    mut element: Element,
    stack: &mut [Element],
    root: &mut Option<(String, Value)>,
) {
    let name = std::mem::take(&mut element.name);
    let value = element.into_value();
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, value),
        None => *root = Some((name, value)),
    }
}

fn append_text(stack: &mut [Element], text: &str, position: usize) -> Result<(), XmlParseError> {
    match stack.last_mut() {
        Some(element) => {
            element.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(parse_error("text outside of the root element", position)),
    }
}

fn parse_error(message: impl Into<String>, position: usize) -> XmlParseError {
    XmlParseError {
        message: message.into(),
        position,
    }
}
