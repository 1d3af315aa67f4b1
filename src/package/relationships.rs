//! Part relationships and content type registrations.

use super::xml::{Element, Node, XmlTree};
use crate::error::{Error, Result};

/// Relationship type of an embedded image.
pub const IMAGE_RELATIONSHIP_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const EMPTY_RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

/// A single relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g. `rId5`)
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target, relative to the source part's folder
    pub target: String,
    /// Whether the target lives outside the package
    pub external: bool,
}

/// Relationships of one source part (e.g. `word/_rels/document.xml.rels`).
#[derive(Debug, Clone)]
pub struct Relationships {
    tree: XmlTree,
}

impl Relationships {
    /// Parse a relationships part.
    pub fn parse(xml: &str) -> Result<Self> {
        let tree = XmlTree::parse(xml)?;
        match tree.root() {
            Some(root) if local_name(&root.name) == "Relationships" => Ok(Self { tree }),
            _ => Err(Error::Xml("relationships part has no <Relationships> root".into())),
        }
    }

    /// An empty relationships part, for documents that have none yet.
    pub fn empty() -> Self {
        Self {
            tree: XmlTree::parse(EMPTY_RELATIONSHIPS).unwrap_or_default(),
        }
    }

    /// List all relationships.
    pub fn entries(&self) -> Vec<Relationship> {
        self.tree
            .root()
            .map(|root| {
                root.elements()
                    .filter(|el| local_name(&el.name) == "Relationship")
                    .map(|el| Relationship {
                        id: el.attr("Id").unwrap_or_default().to_string(),
                        rel_type: el.attr("Type").unwrap_or_default().to_string(),
                        target: el.attr("Target").unwrap_or_default().to_string(),
                        external: el.attr("TargetMode") == Some("External"),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<Relationship> {
        self.entries().into_iter().find(|r| r.id == id)
    }

    /// Produce an ID not used by any existing relationship.
    pub fn next_id(&self) -> String {
        let entries = self.entries();
        let max = entries
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        let mut n = max + 1;
        loop {
            let candidate = format!("rId{}", n);
            if !entries.iter().any(|r| r.id == candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Add an internal relationship and return its ID.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.next_id();
        let prefix = self
            .tree
            .root()
            .map(|root| prefix_of(&root.name).to_string())
            .unwrap_or_default();
        let el = Element::new(qualify(&prefix, "Relationship"))
            .with_attr("Id", id.clone())
            .with_attr("Type", rel_type)
            .with_attr("Target", target);
        if let Some(root) = self.tree.root_mut() {
            root.push(Node::Element(el));
        }
        id
    }

    /// Serialize back to XML.
    pub fn to_xml(&self) -> String {
        self.tree.to_xml()
    }
}

/// The `[Content_Types].xml` registrations.
#[derive(Debug, Clone)]
pub struct ContentTypes {
    tree: XmlTree,
}

impl ContentTypes {
    /// Parse the content types part.
    pub fn parse(xml: &str) -> Result<Self> {
        let tree = XmlTree::parse(xml)?;
        match tree.root() {
            Some(root) if local_name(&root.name) == "Types" => Ok(Self { tree }),
            _ => Err(Error::Xml("content types part has no <Types> root".into())),
        }
    }

    /// Check whether a default registration exists for an extension.
    pub fn has_default(&self, extension: &str) -> bool {
        self.tree.root().is_some_and(|root| {
            root.elements().any(|el| {
                local_name(&el.name) == "Default"
                    && el
                        .attr("Extension")
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
        })
    }

    /// Check whether a part is covered, by override or by extension default.
    pub fn covers(&self, part_name: &str) -> bool {
        let absolute = format!("/{}", part_name.trim_start_matches('/'));
        let overridden = self.tree.root().is_some_and(|root| {
            root.elements().any(|el| {
                local_name(&el.name) == "Override" && el.attr("PartName") == Some(absolute.as_str())
            })
        });
        overridden
            || part_name
                .rsplit_once('.')
                .is_some_and(|(_, ext)| self.has_default(ext))
    }

    /// Register a default content type for an extension if missing.
    ///
    /// Returns `true` when a registration was added.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) -> bool {
        if self.has_default(extension) {
            return false;
        }
        let Some(root) = self.tree.root_mut() else {
            return false;
        };
        let name = qualify(prefix_of(&root.name), "Default");
        let el = Element::new(name)
            .with_attr("Extension", extension.to_ascii_lowercase())
            .with_attr("ContentType", content_type);
        // Defaults conventionally precede overrides.
        let pos = root
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if local_name(&e.name) == "Override"))
            .unwrap_or(root.children.len());
        root.children.insert(pos, Node::Element(el));
        root.self_closing = false;
        true
    }

    /// Serialize back to XML.
    pub fn to_xml(&self) -> String {
        self.tree.to_xml()
    }
}

/// Resolve a relationship target against the folder of its source part.
///
/// `word/document.xml` + `media/image1.png` gives `word/media/image1.png`.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for seg in target.split('/') {
        match seg {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, l)| l).unwrap_or(name)
}

fn prefix_of(name: &str) -> &str {
    name.split_once(':').map(|(p, _)| p).unwrap_or("")
}

fn qualify(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/></Relationships>"#;

    const TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

    #[test]
    fn test_next_id_skips_existing() {
        let rels = Relationships::parse(RELS).unwrap();
        assert_eq!(rels.next_id(), "rId4");
        assert!(rels.get("rId3").unwrap().external);
    }

    #[test]
    fn test_add_relationship() {
        let mut rels = Relationships::parse(RELS).unwrap();
        let id = rels.add(IMAGE_RELATIONSHIP_TYPE, "media/image1.jpeg");
        let reparsed = Relationships::parse(&rels.to_xml()).unwrap();
        let rel = reparsed.get(&id).unwrap();
        assert_eq!(rel.target, "media/image1.jpeg");
        assert_eq!(rel.rel_type, IMAGE_RELATIONSHIP_TYPE);
    }

    #[test]
    fn test_empty_relationships() {
        let mut rels = Relationships::empty();
        assert!(rels.entries().is_empty());
        assert_eq!(rels.add(IMAGE_RELATIONSHIP_TYPE, "media/a.png"), "rId1");
    }

    #[test]
    fn test_content_type_defaults() {
        let mut types = ContentTypes::parse(TYPES).unwrap();
        assert!(!types.has_default("jpeg"));
        assert!(types.ensure_default("jpeg", "image/jpeg"));
        assert!(!types.ensure_default("JPEG", "image/jpeg"));
        assert!(types.covers("word/media/image1.jpeg"));
        assert!(types.covers("word/document.xml"));
        assert!(!types.covers("word/media/image1.png"));

        let xml = types.to_xml();
        let default_pos = xml.find(r#"Extension="jpeg""#).unwrap();
        let override_pos = xml.find("<Override").unwrap();
        assert!(default_pos < override_pos);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("word/document.xml", "media/image1.png"),
            "word/media/image1.png"
        );
        assert_eq!(
            resolve_target("word/document.xml", "../customXml/item1.xml"),
            "customXml/item1.xml"
        );
        assert_eq!(
            resolve_target("word/document.xml", "/word/media/x.png"),
            "word/media/x.png"
        );
    }
}
