//! Minimal namespace-resolved element tree read with `quick-xml`.

use crate::error::{ScimError, ScimResult};

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use std::str;

/// A resolved attribute on an element.
#[derive(Debug, Clone)]
pub(super) struct XmlAttribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

/// An element with its resolved namespace and accumulated text.
#[derive(Debug, Clone, Default)]
pub(super) struct Element {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn attribute(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// True when the element holds non-whitespace text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

fn malformed(context: &str, error: impl std::fmt::Display) -> ScimError {
    ScimError::malformed(format!("{}: {}", context, error))
}

fn utf8(bytes: &[u8]) -> ScimResult<String> {
    str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| malformed("invalid UTF-8 in XML name", e))
}

fn namespace_of(resolved: ResolveResult<'_>) -> ScimResult<Option<String>> {
    match resolved {
        ResolveResult::Bound(namespace) => utf8(namespace.as_ref()).map(Some),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ScimError::malformed(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn open(reader: &NsReader<&[u8]>, namespace: Option<String>, start: &BytesStart<'_>) -> ScimResult<Element> {
    let mut element = Element {
        namespace,
        name: utf8(start.local_name().as_ref())?,
        ..Element::default()
    };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| malformed("invalid XML attribute", e))?;
        let key = attribute.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attribute.key);
        let namespace = namespace_of(resolved)?;
        let value = attribute
            .unescape_value()
            .map_err(|e| malformed("invalid XML attribute value", e))?;
        element.attributes.push(XmlAttribute {
            namespace,
            name: utf8(local.as_ref())?,
            value: value.into_owned(),
        });
    }
    Ok(element)
}

fn close(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> ScimResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(ScimError::malformed("document has more than one root element")),
        None => *root = Some(element),
    }
    Ok(())
}

/// Parse a complete document into its root element.
pub(super) fn parse(bytes: &[u8]) -> ScimResult<Element> {
    let mut reader = NsReader::from_reader(bytes);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|e| malformed("invalid XML", e))?;
        let namespace = namespace_of(resolved)?;
        match event {
            Event::Start(start) => {
                let element = open(&reader, namespace, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open(&reader, namespace, &start)?;
                close(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ScimError::malformed("unbalanced closing tag"))?;
                close(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| malformed("invalid XML text", e))?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(ScimError::malformed("text outside the root element")),
                }
            }
            Event::CData(data) => {
                let text = str::from_utf8(&data).map_err(|e| malformed("invalid UTF-8 in CDATA", e))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ScimError::malformed("unexpected end of XML document"));
    }
    root.ok_or_else(|| ScimError::malformed("XML document has no root element"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolves_namespaces() {
        let root = parse(
            br#"<?xml version="1.0"?>
            <User xmlns="urn:a" xmlns:ns1="urn:b">
              <userName>bjensen &amp; co</userName>
              <ns1:employeeNumber/>
            </User>"#,
        )
        .unwrap();
        assert_eq!(root.name, "User");
        assert_eq!(root.namespace.as_deref(), Some("urn:a"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].text, "bjensen & co");
        assert_eq!(root.children[1].namespace.as_deref(), Some("urn:b"));
        assert_eq!(root.children[1].name, "employeeNumber");
        assert!(!root.has_text());
    }

    #[test]
    fn test_parse_rejects_broken_documents() {
        assert!(parse(b"<User><userName>x</User>").is_err());
        assert!(parse(b"<User>").is_err());
        assert!(parse(b"").is_err());
        assert!(parse(b"<a/><b/>").is_err());
        assert!(parse(b"<x:User/>").is_err());
    }
}
