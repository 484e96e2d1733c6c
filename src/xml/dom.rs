// Minimal element tree built on quick-xml's pull reader.
//
// Only what the configuration reader needs is kept: element names, attributes
// and text. Comments, processing instructions and the declaration are dropped,
// as are whitespace-only text nodes.

use super::ConfigXmlError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First child element with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|node| match node {
            Node::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter_map(move |node| match node {
            Node::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text of all descendants, in document order
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }
}

fn malformed(reader: &Reader<&[u8]>, message: impl Into<String>) -> ConfigXmlError {
    ConfigXmlError::MalformedInput {
        position: reader.buffer_position() as u64,
        message: message.into(),
    }
}

fn utf8<'a>(reader: &Reader<&[u8]>, bytes: &'a [u8]) -> Result<&'a str, ConfigXmlError> {
    std::str::from_utf8(bytes).map_err(|e| malformed(reader, e.to_string()))
}

fn open_element(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Element, ConfigXmlError> {
    let name = utf8(reader, start.name().as_ref())?.to_string();

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| malformed(reader, e.to_string()))?;
        let key = utf8(reader, attribute.key.as_ref())?.to_string();
        let value = attribute
            .unescape_value()
            .map_err(|e| malformed(reader, e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

/// Attach a finished element to its parent, or make it the document root
fn close_element(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => *root = Some(element),
    }
}

fn push_text(
    reader: &Reader<&[u8]>,
    stack: &mut [Element],
    text: Cow<'_, str>,
) -> Result<(), ConfigXmlError> {
    let whitespace_only = text.chars().all(char::is_whitespace);
    match stack.last_mut() {
        Some(parent) if !whitespace_only => {
            parent.children.push(Node::Text(text.into_owned()));
            Ok(())
        }
        Some(_) => Ok(()),
        None if whitespace_only => Ok(()),
        None => Err(malformed(reader, "text is not allowed outside the root element")),
    }
}

/// Parse a complete document and return its root element.
pub(crate) fn parse(input: &str) -> Result<Element, ConfigXmlError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(&reader, e.to_string()))?;

        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(malformed(&reader, "multiple root elements"));
                }
                let element = open_element(&reader, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(malformed(&reader, "multiple root elements"));
                }
                let element = open_element(&reader, &start)?;
                close_element(&mut stack, &mut root, element);
            }
            Event::End(end) => {
                let element = stack.pop().ok_or_else(|| {
                    malformed(
                        &reader,
                        format!(
                            "unexpected end tag </{}>",
                            String::from_utf8_lossy(end.name().as_ref())
                        ),
                    )
                })?;
                close_element(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| malformed(&reader, e.to_string()))?;
                push_text(&reader, &mut stack, text)?;
            }
            Event::CData(cdata) => {
                let text = String::from_utf8(cdata.into_inner().into_owned())
                    .map_err(|e| malformed(&reader, e.to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(text)),
                    None => {
                        return Err(malformed(&reader, "CDATA is not allowed outside the root element"));
                    }
                }
            }
            Event::Eof => {
                if let Some(open) = stack.last() {
                    return Err(malformed(
                        &reader,
                        format!("unexpected end of document, <{}> is not closed", open.name),
                    ));
                }
                return root.ok_or_else(|| malformed(&reader, "root element is missing"));
            }
            // Declaration, comments, processing instructions, doctype
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements_and_attributes() {
        let root = parse(r#"<a><b x="1">hello</b><b x="2"/><c>  </c></a>"#).unwrap();
        assert_eq!(root.name(), "a");
        assert_eq!(root.child("b").unwrap().attribute("x"), Some("1"));
        assert_eq!(root.children_named("b").count(), 2);
        assert_eq!(root.child("c").unwrap().text(), "");
        assert!(root.child("d").is_none());
    }

    #[test]
    fn test_child_outlives_lookup_name() {
        let root = parse(r#"<a><b x="1"/></a>"#).unwrap();
        let found = {
            let name = String::from("b");
            root.child(&name)
        };
        assert_eq!(found.and_then(|b| b.attribute("x")), Some("1"));
    }

    #[test]
    fn test_text_concatenates_descendants() {
        let root = parse("<a>one<b>two</b><!-- skipped --><![CDATA[<three>]]></a>").unwrap();
        assert_eq!(root.text(), "onetwo<three>");
    }

    #[test]
    fn test_entities_are_unescaped() {
        let root = parse(r#"<a v="&quot;x&quot;">&lt;&amp;&gt;</a>"#).unwrap();
        assert_eq!(root.attribute("v"), Some("\"x\""));
        assert_eq!(root.text(), "<&>");
    }

    #[test]
    fn test_unclosed_root_is_malformed() {
        let result = parse("<xSE><PluginPreloader>");
        assert!(matches!(result, Err(ConfigXmlError::MalformedInput { .. })));
    }

    #[test]
    fn test_mismatched_end_tag_is_malformed() {
        let result = parse("<a><b></a></b>");
        assert!(matches!(result, Err(ConfigXmlError::MalformedInput { .. })));
    }

    #[test]
    fn test_empty_document_is_malformed() {
        assert!(matches!(parse(""), Err(ConfigXmlError::MalformedInput { .. })));
        assert!(matches!(
            parse("<?xml version=\"1.0\"?>\n<!-- nothing -->"),
            Err(ConfigXmlError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_multiple_roots_are_malformed() {
        assert!(matches!(parse("<a/><b/>"), Err(ConfigXmlError::MalformedInput { .. })));
    }

    #[test]
    fn test_text_after_root_is_malformed() {
        assert!(matches!(parse("<a/>junk"), Err(ConfigXmlError::MalformedInput { .. })));
    }
}
