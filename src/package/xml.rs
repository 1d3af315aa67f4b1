//! Lossless XML tree for OOXML parts.
//!
//! Parts are read with `quick-xml` into a small element tree that keeps
//! attribute values in their escaped source form, so writing a tree back
//! reproduces every element, attribute, comment and whitespace node. Only
//! text content is unescaped, because that is what substitution edits.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A node in an XML tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// An element with its children
    Element(Element),
    /// Unescaped character data
    Text(String),
    /// Anything written back verbatim (comments, CDATA, processing instructions)
    Raw(String),
}

impl Node {
    /// Get the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Get the element mutably if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Check whether this node is an element with the given qualified name.
    pub fn is_element(&self, name: &str) -> bool {
        matches!(self, Node::Element(el) if el.name == name)
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.write_to(out),
            Node::Text(text) => out.push_str(&partial_escape(text)),
            Node::Raw(raw) => out.push_str(raw),
        }
    }
}

/// An XML element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Element {
    /// Qualified name as written in the source (e.g. `w:p`)
    pub name: String,

    /// Attributes in source order; values stay escaped
    pub attributes: Vec<(String, String)>,

    /// Child nodes
    pub children: Vec<Node>,

    /// Written as `<name/>` when it has no children
    pub self_closing: bool,
}

impl Element {
    /// Create a new element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: true,
        }
    }

    /// Add an attribute and return self.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Add a child node and return self.
    pub fn with_child(mut self, child: Node) -> Self {
        self.push(child);
        self
    }

    /// Append a child node.
    pub fn push(&mut self, child: Node) {
        self.self_closing = false;
        self.children.push(child);
    }

    /// Get an attribute value (escaped form).
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// Remove an attribute if present.
    pub fn remove_attr(&mut self, key: &str) {
        self.attributes.retain(|(k, _)| k != key);
    }

    /// Find the first direct child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find(|el| el.name == name)
    }

    /// Find the first direct child element with the given name, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find(|el| el.name == name)
    }

    /// Iterate direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Concatenated unescaped text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Visit this element and every descendant element, depth first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Element)) {
        f(self);
        for child in self.elements() {
            child.walk(f);
        }
    }

    /// Serialize this element to a string.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&value.replace('"', "&quot;"));
            out.push('"');
        }
        if self.children.is_empty() && self.self_closing {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Raw(_) => {}
        }
    }
}

/// A parsed XML part: optional declaration plus top-level nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct XmlTree {
    /// The `<?xml ...?>` declaration, verbatim
    pub declaration: Option<String>,

    /// Top-level nodes (normally one root element, maybe whitespace)
    pub nodes: Vec<Node>,
}

impl XmlTree {
    /// Parse an XML document.
    pub fn parse(xml: &str) -> Result<Self> {
        let (declaration, nodes) = parse_nodes(xml)?;
        let tree = Self { declaration, nodes };
        if tree.root().is_none() {
            return Err(Error::Xml("document has no root element".into()));
        }
        Ok(tree)
    }

    /// Get the root element.
    pub fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(Node::as_element)
    }

    /// Get the root element mutably.
    pub fn root_mut(&mut self) -> Option<&mut Element> {
        self.nodes.iter_mut().find_map(Node::as_element_mut)
    }

    /// Serialize the tree back to a string.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if let Some(ref decl) = self.declaration {
            out.push_str(decl);
        }
        for node in &self.nodes {
            node.write_to(&mut out);
        }
        out
    }
}

/// Parse a markup fragment (possibly several sibling elements).
pub fn parse_fragment(xml: &str) -> Result<Vec<Node>> {
    parse_nodes(xml).map(|(_, nodes)| nodes)
}

fn parse_nodes(xml: &str) -> Result<(Option<String>, Vec<Node>)> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    reader.check_end_names(true);

    let mut declaration = None;
    let mut roots: Vec<Node> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::Xml(format!(
                "at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        let node = match event {
            Event::Start(ref e) => {
                let mut el = start_element(e)?;
                el.self_closing = false;
                stack.push(el);
                continue;
            }
            Event::End(_) => match stack.pop() {
                Some(el) => Node::Element(el),
                None => return Err(Error::Xml("unexpected closing tag".into())),
            },
            Event::Empty(ref e) => Node::Element(start_element(e)?),
            Event::Text(ref e) => {
                let text = e.unescape().map_err(|err| Error::Xml(err.to_string()))?;
                Node::Text(text.into_owned())
            }
            Event::CData(e) => {
                let inner = String::from_utf8_lossy(&e.into_inner()).into_owned();
                Node::Raw(format!("<![CDATA[{}]]>", inner))
            }
            Event::Comment(ref e) => {
                Node::Raw(format!("<!--{}-->", String::from_utf8_lossy(e)))
            }
            Event::Decl(ref e) => {
                declaration = Some(format!("<?{}?>", String::from_utf8_lossy(e)));
                continue;
            }
            Event::PI(ref e) => Node::Raw(format!("<?{}?>", String::from_utf8_lossy(e))),
            Event::DocType(ref e) => {
                Node::Raw(format!("<!DOCTYPE {}>", String::from_utf8_lossy(e)))
            }
            Event::Eof => break,
        };

        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::Xml(format!("unclosed element <{}>", open.name)));
    }

    Ok((declaration, roots))
}

fn start_element(e: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        self_closing: true,
    })
}
