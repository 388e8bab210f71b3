//! Generic XML tree used for parsed descriptors.
//!
//! Parsing produces a loosely-typed [`XmlValue`] rather than fixed structs so that
//! vendor extensions in device and application descriptors survive untouched:
//!
//! - leaf elements become [`XmlValue::Text`] with surrounding whitespace trimmed
//! - attributes are merged into the element's entries next to child elements
//! - an element's own text, when it also has attributes or children, is stored
//!   under the [`TEXT_KEY`] entry
//! - sibling elements sharing a name collapse into one [`XmlValue::List`] entry, and
//!   only then; a single `icon` stays a plain element

use xmltree::{Element, XMLNode};

use crate::error::{Result, XmlError};

/// Entry name holding an element's text when it also has attributes or children.
pub const TEXT_KEY: &str = "_";

/// A parsed XML value.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    Text(String),
    /// Attributes and child elements in document order
    Element(Vec<(String, XmlValue)>),
    /// Repeated sibling elements sharing one name
    List(Vec<XmlValue>),
}

impl XmlValue {
    /// First entry named `key` when this value is an element.
    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        match self {
            XmlValue::Element(entries) => entries
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Walk nested entries, e.g. `["root", "device", "friendlyName"]`.
    pub fn path(&self, keys: &[&str]) -> Option<&XmlValue> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Text content of a leaf, or the [`TEXT_KEY`] entry of an element.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(text) => Some(text),
            XmlValue::Element(_) => self.get(TEXT_KEY).and_then(XmlValue::as_text),
            XmlValue::List(_) => None,
        }
    }

    pub fn text_at(&self, keys: &[&str]) -> Option<&str> {
        self.path(keys)?.as_text()
    }

    /// Treat one-or-many uniformly: a list yields its items, anything else itself.
    pub fn items(&self) -> Vec<&XmlValue> {
        match self {
            XmlValue::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NameStyle {
    /// Keep `prefix:name` as written
    Qualified,
    /// Drop namespace prefixes
    Local,
}

/// Parse a device descriptor into a tree keyed by its root element name.
///
/// For a UPnP descriptor the device fields live under `["root", "device"]`.
///
/// # Errors
///
/// Returns [`XmlError::Parse`] if the document is not well-formed.
pub fn parse_device_descriptor(xml: &str) -> Result<XmlValue> {
    let root = parse_root(xml)?;
    let name = element_name(&root, NameStyle::Qualified);
    Ok(XmlValue::Element(vec![(
        name,
        element_value(&root, NameStyle::Qualified),
    )]))
}

/// Parse an application description, returning the root element's value.
///
/// Namespace prefixes are stripped from tag and attribute names, so callers read
/// `state` whether the document says `<state>` or `<dial:state>`.
///
/// # Errors
///
/// Returns [`XmlError::Parse`] if the document is not well-formed.
pub fn parse_app_info(xml: &str) -> Result<XmlValue> {
    let root = parse_root(xml)?;
    Ok(element_value(&root, NameStyle::Local))
}

fn parse_root(xml: &str) -> Result<Element> {
    Element::parse(xml.trim_start().as_bytes()).map_err(|e| XmlError::Parse(e.to_string()))
}

fn element_name(element: &Element, style: NameStyle) -> String {
    match (style, &element.prefix) {
        (NameStyle::Qualified, Some(prefix)) => format!("{}:{}", prefix, element.name),
        _ => element.name.clone(),
    }
}

fn element_value(element: &Element, style: NameStyle) -> XmlValue {
    let mut entries: Vec<(String, XmlValue)> = Vec::new();

    // xmltree keeps attributes in a HashMap; sort for a stable entry order
    let mut attributes: Vec<(&String, &String)> = element.attributes.iter().collect();
    attributes.sort();
    for (key, value) in attributes {
        push_entry(&mut entries, key.clone(), XmlValue::Text(value.trim().to_string()));
    }

    let mut text = String::new();
    for child in &element.children {
        match child {
            XMLNode::Element(child) => {
                push_entry(&mut entries, element_name(child, style), element_value(child, style));
            }
            XMLNode::Text(chunk) | XMLNode::CData(chunk) => text.push_str(chunk.trim()),
            _ => {}
        }
    }

    if entries.is_empty() {
        return XmlValue::Text(text);
    }
    if !text.is_empty() {
        push_entry(&mut entries, TEXT_KEY.to_string(), XmlValue::Text(text));
    }
    XmlValue::Element(entries)
}

fn push_entry(entries: &mut Vec<(String, XmlValue)>, key: String, value: XmlValue) {
    match entries.iter_mut().find(|(name, _)| *name == key) {
        Some((_, XmlValue::List(items))) => items.push(value),
        Some((_, existing)) => {
            let first = std::mem::replace(existing, XmlValue::List(Vec::new()));
            *existing = XmlValue::List(vec![first, value]);
        }
        None => entries.push((key, value)),
    }
}
