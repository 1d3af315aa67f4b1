//! Document-level types.

use super::{Paragraph, Table};
use crate::error::{Error, Result};
use crate::package::{Element, Node, XmlTree};

/// The body part of a WordprocessingML document.
///
/// Paragraphs are reached by a walk over the whole element tree, so body
/// paragraphs, table cells, content controls, headers inside text boxes and
/// nested tables are all treated the same way.
#[derive(Debug, Clone)]
pub struct Document {
    tree: XmlTree,
}

impl Document {
    /// Parse body markup.
    pub fn parse(xml: &str) -> Result<Self> {
        let tree = XmlTree::parse(xml)
            .map_err(|e| Error::TemplateUnreadable(format!("document body: {}", e)))?;
        let doc = Self { tree };
        if doc.body().is_none() {
            return Err(Error::TemplateUnreadable(
                "document part has no <w:body>".into(),
            ));
        }
        Ok(doc)
    }

    /// The `w:body` element.
    pub fn body(&self) -> Option<&Element> {
        self.tree.root().and_then(|root| root.child("w:body"))
    }

    /// Visit every paragraph mutably, innermost first.
    ///
    /// Each paragraph is lifted into the typed model, handed to `f`, then
    /// lowered back in place.
    pub fn for_each_paragraph_mut(&mut self, mut f: impl FnMut(&mut Paragraph)) {
        if let Some(root) = self.tree.root_mut() {
            visit_paragraphs(root, &mut f);
        }
    }

    /// All paragraphs in document order (body and table cells alike).
    pub fn paragraphs(&self) -> Vec<Paragraph> {
        let mut out = Vec::new();
        if let Some(body) = self.body() {
            body.walk(&mut |el| {
                if el.name == "w:p" {
                    out.push(Paragraph::lift(el.clone()));
                }
            });
        }
        out
    }

    /// Paragraphs placed directly in the body, outside tables.
    pub fn body_paragraphs(&self) -> Vec<Paragraph> {
        self.body()
            .map(|body| {
                body.elements()
                    .filter(|el| el.name == "w:p")
                    .map(|el| Paragraph::lift(el.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Top-level tables of the body.
    pub fn tables(&self) -> Vec<Table> {
        self.body()
            .map(|body| {
                body.elements()
                    .filter(|el| el.name == "w:tbl")
                    .map(Table::from_element)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Plain text of the document, one line per paragraph.
    pub fn plain_text(&self) -> String {
        self.paragraphs()
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Largest `wp:docPr` id in use (0 when there is none).
    pub fn max_drawing_id(&self) -> u32 {
        let mut max = 0;
        if let Some(root) = self.tree.root() {
            root.walk(&mut |el| {
                if el.name == "wp:docPr" {
                    if let Some(id) = el.attr("id").and_then(|v| v.parse::<u32>().ok()) {
                        max = max.max(id);
                    }
                }
            });
        }
        max
    }

    /// Relationship IDs referenced by embedded pictures (`r:embed`).
    pub fn embedded_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        if let Some(root) = self.tree.root() {
            root.walk(&mut |el| {
                if let Some(id) = el.attr("r:embed") {
                    ids.push(id.to_string());
                }
            });
        }
        ids
    }

    /// Serialize the body part.
    pub fn to_xml(&self) -> String {
        self.tree.to_xml()
    }
}

fn visit_paragraphs(element: &mut Element, f: &mut impl FnMut(&mut Paragraph)) {
    for node in element.children.iter_mut() {
        if let Node::Element(child) = node {
            visit_paragraphs(child, f);
            if child.name == "w:p" {
                let mut para = Paragraph::lift(std::mem::take(child));
                f(&mut para);
                *child = para.lower();
            }
        }
    }
}
