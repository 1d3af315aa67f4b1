//! Paragraph and run-level types.
//!
//! A [`Paragraph`] is lifted out of a `w:p` element and lowered back after
//! editing. Anything the model does not understand travels along as an
//! opaque [`Node`], so lowering an unedited paragraph reproduces its markup.

use serde::{Deserialize, Serialize};

use crate::package::{Element, Node};

/// Elements whose children are runs belonging to the same paragraph.
const RUN_CONTAINERS: &[&str] = &[
    "w:hyperlink",
    "w:ins",
    "w:smartTag",
    "w:fldSimple",
    "w:sdt",
    "w:sdtContent",
    "w:customXml",
    "w:dir",
    "w:bdo",
];

/// A paragraph of text content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// The `w:p` element without its children
    pub head: Element,

    /// Inline content in document order
    pub content: Vec<Inline>,
}

impl Paragraph {
    /// Create an empty paragraph.
    pub fn new() -> Self {
        Self {
            head: Element::new("w:p"),
            content: Vec::new(),
        }
    }

    /// Create a paragraph holding a single plain run.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.push_run(Run::with_text(text));
        p
    }

    /// Lift a `w:p` element into the typed model.
    pub fn lift(mut element: Element) -> Self {
        let children = std::mem::take(&mut element.children);
        Self {
            head: element,
            content: lift_inlines(children),
        }
    }

    /// Lower the paragraph back into a `w:p` element.
    pub fn lower(self) -> Element {
        let mut element = self.head;
        element.children = lower_inlines(self.content);
        if !element.children.is_empty() {
            element.self_closing = false;
        }
        element
    }

    /// Append a run.
    pub fn push_run(&mut self, run: Run) {
        self.content.push(Inline::Run(run));
    }

    /// All runs, including those nested in hyperlinks and other containers.
    pub fn runs(&self) -> Vec<&Run> {
        let mut out = Vec::new();
        collect_runs(&self.content, &mut out);
        out
    }

    fn runs_mut(&mut self) -> Vec<&mut Run> {
        let mut out = Vec::new();
        collect_runs_mut(&mut self.content, &mut out);
        out
    }

    /// Logical text: the concatenation of every run's text in order.
    pub fn plain_text(&self) -> String {
        self.runs().iter().map(|r| r.text()).collect()
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.plain_text().trim().is_empty()
    }

    /// Rewrite the paragraph's logical text.
    ///
    /// The runs' text is flattened and handed to `edit`, which returns the
    /// new text and the number of replacements it made. When that number is
    /// non-zero the result is redistributed over the text-bearing runs by
    /// their original character counts; the last one absorbs the remainder.
    pub fn edit_text(&mut self, edit: impl FnOnce(&str) -> (String, usize)) -> usize {
        let flat = self.plain_text();
        let (replaced, count) = edit(&flat);
        if count == 0 {
            return 0;
        }

        let mut runs: Vec<&mut Run> = self
            .runs_mut()
            .into_iter()
            .filter(|r| r.has_text_slot())
            .collect();
        let Some(last) = runs.len().checked_sub(1) else {
            return 0;
        };

        let mut rest = replaced.chars();
        for (i, run) in runs.iter_mut().enumerate() {
            let piece: String = if i == last {
                rest.by_ref().collect()
            } else {
                let len = run.text().chars().count();
                rest.by_ref().take(len).collect()
            };
            run.set_text(piece);
        }
        count
    }

    /// Remove every run (and run container), keeping paragraph properties,
    /// bookmarks and other non-run markup.
    pub fn clear_runs(&mut self) {
        self.content
            .retain(|inline| matches!(inline, Inline::Other(_)));
    }
}

/// Inline content within a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inline {
    /// A formatted run
    Run(Run),

    /// A container of runs (hyperlink, tracked insertion, content control...)
    Group {
        /// The container element without its children
        head: Element,
        /// Content of the container
        content: Vec<Inline>,
    },

    /// Paragraph properties, bookmarks, proofing marks and anything else
    Other(Node),
}

/// A run of content sharing one formatting definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// The `w:r` element without its children
    pub head: Element,

    /// Run properties (`w:rPr`), kept opaque
    pub properties: Option<Element>,

    /// Run content in order
    pub content: Vec<RunContent>,
}

/// Content of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunContent {
    /// A `w:t` text element
    Text {
        /// The `w:t` element without its children
        head: Element,
        /// Unescaped text
        text: String,
    },

    /// Tabs, breaks, drawings, field codes and so on
    Other(Node),
}

impl Run {
    /// Create a plain run holding one text element.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut run = Self {
            head: Element::new("w:r"),
            properties: None,
            content: Vec::new(),
        };
        run.content.push(RunContent::Text {
            head: Element::new("w:t"),
            text: String::new(),
        });
        run.set_text(text);
        run
    }

    /// Lift a `w:r` element.
    pub fn lift(mut element: Element) -> Self {
        let mut properties = None;
        let mut content = Vec::new();
        for node in std::mem::take(&mut element.children) {
            match node {
                Node::Element(el) if el.name == "w:rPr" && properties.is_none() => {
                    properties = Some(el)
                }
                Node::Element(el) if el.name == "w:t" && is_plain_text(&el) => {
                    let text = el.text_content();
                    let mut head = el;
                    head.children.clear();
                    content.push(RunContent::Text { head, text });
                }
                other => content.push(RunContent::Other(other)),
            }
        }
        Self {
            head: element,
            properties,
            content,
        }
    }

    /// Lower the run back into a `w:r` element.
    pub fn lower(self) -> Element {
        let mut element = self.head;
        if let Some(props) = self.properties {
            element.push(Node::Element(props));
        }
        for item in self.content {
            match item {
                RunContent::Text { mut head, text } => {
                    if !text.is_empty() {
                        head.push(Node::Text(text));
                    }
                    element.push(Node::Element(head));
                }
                RunContent::Other(node) => element.push(node),
            }
        }
        element
    }

    /// Text of the run's text elements.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                RunContent::Text { text, .. } => Some(text.as_str()),
                RunContent::Other(_) => None,
            })
            .collect()
    }

    /// Whether the run has at least one text element.
    pub fn has_text_slot(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, RunContent::Text { .. }))
    }

    /// Spread `text` over the run's text elements.
    ///
    /// Each element keeps its original character count and the last one
    /// takes the remainder, so text stays on its side of a tab or break.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        let slots = self
            .content
            .iter()
            .filter(|c| matches!(c, RunContent::Text { .. }))
            .count();
        let mut rest = text.chars();
        let mut index = 0;
        for item in self.content.iter_mut() {
            if let RunContent::Text { head, text: slot } = item {
                index += 1;
                let value: String = if index == slots {
                    rest.by_ref().collect()
                } else {
                    let len = slot.chars().count();
                    rest.by_ref().take(len).collect()
                };
                if value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace)
                {
                    head.set_attr("xml:space", "preserve");
                }
                *slot = value;
            }
        }
    }

    /// Check whether the run contains a drawing.
    pub fn has_drawing(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, RunContent::Other(node) if node.is_element("w:drawing")))
    }
}

fn is_plain_text(el: &Element) -> bool {
    el.children.iter().all(|n| matches!(n, Node::Text(_)))
}

fn lift_inlines(nodes: Vec<Node>) -> Vec<Inline> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Element(el) if el.name == "w:r" => Inline::Run(Run::lift(el)),
            Node::Element(mut el) if RUN_CONTAINERS.contains(&el.name.as_str()) => {
                let children = std::mem::take(&mut el.children);
                Inline::Group {
                    head: el,
                    content: lift_inlines(children),
                }
            }
            other => Inline::Other(other),
        })
        .collect()
}

fn lower_inlines(content: Vec<Inline>) -> Vec<Node> {
    content
        .into_iter()
        .map(|inline| match inline {
            Inline::Run(run) => Node::Element(run.lower()),
            Inline::Group { mut head, content } => {
                head.children = lower_inlines(content);
                if !head.children.is_empty() {
                    head.self_closing = false;
                }
                Node::Element(head)
            }
            Inline::Other(node) => node,
        })
        .collect()
}

fn collect_runs<'a>(content: &'a [Inline], out: &mut Vec<&'a Run>) {
    for inline in content {
        match inline {
            Inline::Run(run) => out.push(run),
            Inline::Group { content, .. } => collect_runs(content, out),
            Inline::Other(_) => {}
        }
    }
}

fn collect_runs_mut<'a>(content: &'a mut [Inline], out: &mut Vec<&'a mut Run>) {
    for inline in content {
        match inline {
            Inline::Run(run) => out.push(run),
            Inline::Group { content, .. } => collect_runs_mut(content, out),
            Inline::Other(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::XmlTree;

    fn lift(xml: &str) -> Paragraph {
        let tree = XmlTree::parse(xml).unwrap();
        Paragraph::lift(tree.root().unwrap().clone())
    }

    #[test]
    fn test_plain_text_spans_runs_and_hyperlinks() {
        let p = lift(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>Hello </w:t></w:r><w:hyperlink r:id="rId4"><w:r><w:t>world</w:t></w:r></w:hyperlink></w:p>"#,
        );
        assert_eq!(p.plain_text(), "Hello world");
        assert_eq!(p.runs().len(), 2);
    }

    #[test]
    fn test_lower_reproduces_markup() {
        let xml = r#"<w:p w:rsidR="001"><w:pPr><w:jc w:val="center"/></w:pPr><w:bookmarkStart w:id="0" w:name="x"/><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">a </w:t><w:tab/><w:t>b</w:t></w:r><w:bookmarkEnd w:id="0"/></w:p>"#;
        let p = lift(xml);
        assert_eq!(p.lower().to_xml(), xml);
    }

    #[test]
    fn test_edit_text_redistributes_by_run_length() {
        let mut p = lift(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>ab</w:t></w:r><w:r><w:t>cd</w:t></w:r><w:r><w:t>ef</w:t></w:r></w:p>"#,
        );
        let count = p.edit_text(|text| (text.replace("cd", "XYZW"), 1));
        assert_eq!(count, 1);
        let texts: Vec<String> = p.runs().iter().map(|r| r.text()).collect();
        assert_eq!(texts, vec!["ab", "XY", "ZWef"]);
        assert_eq!(p.plain_text(), "abXYZWef");
    }

    #[test]
    fn test_edit_text_shrinking() {
        let mut p = lift(
            r#"<w:p><w:r><w:t>$</w:t></w:r><w:r><w:t>{ten}</w:t></w:r><w:r><w:t>!</w:t></w:r></w:p>"#,
        );
        p.edit_text(|text| (text.replace("${ten}", "A"), 1));
        let texts: Vec<String> = p.runs().iter().map(|r| r.text()).collect();
        assert_eq!(texts, vec!["A", "!", ""]);
        assert_eq!(p.plain_text(), "A!");
    }

    #[test]
    fn test_edit_text_no_match_is_untouched() {
        let xml = r#"<w:p><w:r><w:t>plain</w:t></w:r></w:p>"#;
        let mut p = lift(xml);
        assert_eq!(p.edit_text(|text| (text.to_string(), 0)), 0);
        assert_eq!(p.lower().to_xml(), xml);
    }

    #[test]
    fn test_text_stays_on_its_side_of_a_tab() {
        let mut p = lift(
            r#"<w:p><w:r><w:t>Trạm:</w:t><w:tab/><w:t>$ten</w:t></w:r></w:p>"#,
        );
        p.edit_text(|text| (text.replace("$ten", "A12 Cầu Giấy"), 1));
        assert_eq!(
            p.lower().to_xml(),
            r#"<w:p><w:r><w:t>Trạm:</w:t><w:tab/><w:t>A12 Cầu Giấy</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn test_set_text_preserves_whitespace() {
        let mut run = Run::with_text("x");
        run.set_text(" padded ");
        let xml = run.lower().to_xml();
        assert_eq!(xml, r#"<w:r><w:t xml:space="preserve"> padded </w:t></w:r>"#);
    }

    #[test]
    fn test_clear_runs_keeps_properties() {
        let mut p = lift(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>$Anh1</w:t></w:r><w:hyperlink><w:r><w:t>x</w:t></w:r></w:hyperlink></w:p>"#,
        );
        p.clear_runs();
        p.push_run(Run::with_text("new"));
        assert_eq!(
            p.lower().to_xml(),
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>new</w:t></w:r></w:p>"#
        );
    }
}
