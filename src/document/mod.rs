//! Document serialization: the XML form of the design tree
//!
//! The design tree persists as nested `element` nodes; each child of a
//! container is wrapped in a `child` node that also carries the child-scoped
//! packing state. Adaptor read/write hooks see only [`DocNode`] (named
//! attributes and nested nodes), never the XML layer itself.

pub mod reader;
pub mod writer;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::error::AdaptorError;

pub use reader::read_document;
pub use writer::write_document;

pub(crate) const TAG_ROOT: &str = "interface";
pub(crate) const TAG_ELEMENT: &str = "element";
pub(crate) const TAG_CHILD: &str = "child";
pub(crate) const TAG_PROPERTY: &str = "property";
pub(crate) const ATTR_CLASS: &str = "class";
pub(crate) const ATTR_ID: &str = "id";
pub(crate) const ATTR_NAME: &str = "name";
pub(crate) const ATTR_TYPE: &str = "type";
pub(crate) const ATTR_INTERNAL: &str = "internal";

/// Errors raised while reading or writing documents
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Adaptor(#[from] AdaptorError),
}

/// One node of the document tree: a name, named attributes, optional text,
/// and nested nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<DocNode>,
}

impl DocNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Read a named attribute
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Write a named attribute, replacing any previous value
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    /// First nested node with the given name
    pub fn child(&self, name: &str) -> Option<&DocNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All nested nodes with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DocNode> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Parse an XML string into a document tree
pub fn parse_str(xml: &str) -> Result<DocNode, DocumentError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<DocNode> = Vec::new();
    let mut root: Option<DocNode> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                stack.push(node_from_start(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let node = node_from_start(e)?;
                finish_node(node, &mut stack, &mut root)?;
            }
            Ok(Event::Text(ref t)) => {
                if let Some(top) = stack.last_mut() {
                    let text = t.unescape()?.into_owned();
                    if !text.is_empty() {
                        top.text = Some(text);
                    }
                }
            }
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| DocumentError::Malformed("unbalanced close tag".to_string()))?;
                finish_node(node, &mut stack, &mut root)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(DocumentError::Xml(e)),
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(DocumentError::Malformed("unclosed element".to_string()));
    }
    root.ok_or_else(|| DocumentError::Malformed("empty document".to_string()))
}

fn node_from_start(e: &BytesStart) -> Result<DocNode, DocumentError> {
    let mut node = DocNode::new(&String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()?.into_owned();
        node.attrs.push((key, value));
    }
    Ok(node)
}

fn finish_node(
    node: DocNode,
    stack: &mut Vec<DocNode>,
    root: &mut Option<DocNode>,
) -> Result<(), DocumentError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(DocumentError::Malformed(
            "more than one root node".to_string(),
        )),
    }
}

/// Emit a document tree as indented XML
pub fn emit_str(node: &DocNode) -> Result<String, DocumentError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    emit_node(&mut writer, node)?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| DocumentError::Malformed(format!("non-utf8 output: {}", e)))
}

fn emit_node(writer: &mut Writer<Vec<u8>>, node: &DocNode) -> Result<(), DocumentError> {
    let write_failed = |e: &dyn std::fmt::Display| DocumentError::Malformed(format!("{}", e));

    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.text.is_none() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| write_failed(&e))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| write_failed(&e))?;
    if let Some(text) = &node.text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| write_failed(&e))?;
    }
    for child in &node.children {
        emit_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
        .map_err(|e| write_failed(&e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_nodes() {
        let doc = parse_str(
            r#"<interface>
  <element class="box" id="main">
    <property name="size">2</property>
  </element>
</interface>"#,
        )
        .expect("Should parse");

        assert_eq!(doc.name, "interface");
        let element = doc.child("element").expect("Should have element");
        assert_eq!(element.attr("class"), Some("box"));
        assert_eq!(element.attr("id"), Some("main"));
        let property = element.child("property").expect("Should have property");
        assert_eq!(property.attr("name"), Some("size"));
        assert_eq!(property.text.as_deref(), Some("2"));
    }

    #[test]
    fn test_emit_parse_round_trip() {
        let mut root = DocNode::new("interface");
        let mut element = DocNode::new("element");
        element.set_attr("class", "button");
        element.set_attr("id", "ok");
        let mut property = DocNode::new("property");
        property.set_attr("name", "label");
        property.text = Some("OK & <Cancel>".to_string());
        element.children.push(property);
        root.children.push(element);

        let xml = emit_str(&root).expect("Should emit");
        let parsed = parse_str(&xml).expect("Should parse");
        assert_eq!(parsed, root);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_str("").is_err());
        assert!(parse_str("<a><b></a></b>").is_err());
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut node = DocNode::new("child");
        node.set_attr("type", "tab");
        node.set_attr("type", "label");
        assert_eq!(node.attr("type"), Some("label"));
        assert_eq!(node.attrs.len(), 1);
    }
}
