//! Image substitution.

use super::placeholder::contains_loosely;
use crate::error::{Error, Result};
use crate::model::{Document, Run};
use crate::package::xml::parse_fragment;
use crate::package::Node;

/// A picture to place inline, already registered with the package.
#[derive(Debug, Clone)]
pub struct InlinePicture {
    /// Relationship ID of the media part
    pub rel_id: String,
    /// Width in EMU
    pub cx: u64,
    /// Height in EMU
    pub cy: u64,
    /// Name shown in the document's selection pane
    pub name: String,
}

/// Build a run holding an inline drawing.
pub fn drawing_run(picture: &InlinePicture, id: u32) -> Result<Run> {
    let name = quick_xml::escape::escape(picture.name.as_str());
    let xml = format!(
        r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"><wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/><wp:docPr id="{id}" name="{name}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
        cx = picture.cx,
        cy = picture.cy,
        id = id,
        name = name,
        rel = picture.rel_id,
    );
    match parse_fragment(&xml)?.into_iter().next() {
        Some(Node::Element(el)) => Ok(Run::lift(el)),
        _ => Err(Error::Xml("drawing markup did not produce a run".into())),
    }
}

/// Count paragraphs whose text contains the placeholder in any spelling,
/// ignoring whitespace and case.
pub fn count_matches(doc: &Document, name: &str) -> usize {
    doc.paragraphs()
        .iter()
        .filter(|p| contains_loosely(&p.plain_text(), name))
        .count()
}

/// Replace the runs of every matching paragraph with the picture.
///
/// Drawing ids are allocated from `next_id` upwards. Returns the number of
/// paragraphs that received the picture.
pub fn insert_picture(
    doc: &mut Document,
    name: &str,
    picture: &InlinePicture,
    next_id: &mut u32,
) -> Result<usize> {
    let mut inserted = 0;
    let mut failure = None;
    doc.for_each_paragraph_mut(|para| {
        if failure.is_some() || !contains_loosely(&para.plain_text(), name) {
            return;
        }
        match drawing_run(picture, *next_id) {
            Ok(run) => {
                para.clear_runs();
                para.push_run(run);
                *next_id += 1;
                inserted += 1;
            }
            Err(e) => failure = Some(e),
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(inserted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picture() -> InlinePicture {
        InlinePicture {
            rel_id: "rId7".into(),
            cx: 4_320_000,
            cy: 2_160_000,
            name: "Anh3".into(),
        }
    }

    #[test]
    fn test_drawing_run() {
        let run = drawing_run(&picture(), 5).unwrap();
        assert!(run.has_drawing());
        let xml = run.lower().to_xml();
        assert!(xml.contains(r#"<wp:extent cx="4320000" cy="2160000"/>"#));
        assert!(xml.contains(r#"<wp:docPr id="5" name="Anh3"/>"#));
        assert!(xml.contains(r#"r:embed="rId7""#));
    }

    #[test]
    fn test_insert_only_matching_paragraph() {
        let mut doc = Document::parse(
            r#"<w:document><w:body><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>${Anh3}</w:t></w:r></w:p><w:p><w:r><w:t>${Anh4}</w:t></w:r></w:p></w:body></w:document>"#,
        )
        .unwrap();
        assert_eq!(count_matches(&doc, "Anh3"), 1);

        let mut next_id = 10;
        let n = insert_picture(&mut doc, "Anh3", &picture(), &mut next_id).unwrap();
        assert_eq!(n, 1);
        assert_eq!(next_id, 11);
        assert_eq!(doc.plain_text(), "\n${Anh4}");
        assert_eq!(doc.embedded_ids(), vec!["rId7".to_string()]);
        assert!(doc.to_xml().contains(r#"<w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing>"#));
    }

    #[test]
    fn test_missing_placeholder_is_noop() {
        let mut doc =
            Document::parse(r#"<w:document><w:body><w:p><w:r><w:t>x</w:t></w:r></w:p></w:body></w:document>"#)
                .unwrap();
        let before = doc.to_xml();
        let mut next_id = 1;
        assert_eq!(insert_picture(&mut doc, "Anh1", &picture(), &mut next_id).unwrap(), 0);
        assert_eq!(doc.to_xml(), before);
    }
}
