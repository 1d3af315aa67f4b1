//! Run normalisation.
//!
//! Word processors split one logical line into several text elements
//! whenever formatting, proofing or revision state changes, which can tear a
//! placeholder such as `${ngay_ky}` into `${`, `ngay_`, `ky}`. The normaliser
//! merges chains of text elements that are separated only by run boundaries
//! (optionally with run properties and proofing marks), so such tokens become
//! contiguous again.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// A chain of two or more text elements joined only by run boundaries.
    static ref TEXT_CHAIN: Regex = Regex::new(concat!(
        r"<w:t(?:\s[^>/]*)?>[^<]*</w:t>",
        r"(?:",
        r"(?:\s*</w:r>\s*(?:<w:proofErr[^>]*/>\s*)*<w:r(?:\s[^>/]*)?>\s*",
        // run properties made of flat elements only
        r"(?:<w:rPr>(?:\s|<[A-Za-z][^<>]*/>|<[A-Za-z:]+(?:\s[^<>]*)?>[^<]*</[A-Za-z:]+>)*</w:rPr>\s*)?",
        r"|\s*)",
        r"<w:t(?:\s[^>/]*)?>[^<]*</w:t>",
        r")+",
    ))
    .unwrap();

    /// Text content of one element within a chain.
    static ref TEXT_PIECE: Regex = Regex::new(r"<w:t(?:\s[^>/]*)?>([^<]*)</w:t>").unwrap();
}

/// Merge split text elements in body markup.
///
/// The merged element keeps the formatting of the first run of the chain and
/// always carries `xml:space="preserve"`. Markup outside chains is returned
/// unchanged, and normalising twice gives the same result as normalising once.
pub fn normalize_markup(xml: &str) -> String {
    TEXT_CHAIN
        .replace_all(xml, |caps: &Captures<'_>| {
            let merged: String = TEXT_PIECE
                .captures_iter(&caps[0])
                .map(|piece| piece.get(1).map_or("", |m| m.as_str()))
                .collect();
            format!(r#"<w:t xml:space="preserve">{}</w:t>"#, merged)
        })
        .into_owned()
}
