//! Text substitution.

use super::placeholder::{replace_tokens, Spelling, Substitution};
use crate::model::Document;

/// Apply substitutions to every paragraph, one scan per paragraph.
///
/// Returns the number of occurrences replaced; no match is not an error.
pub fn substitute(doc: &mut Document, substitutions: &[Substitution<'_>]) -> usize {
    if substitutions.is_empty() {
        return 0;
    }
    let mut total = 0;
    doc.for_each_paragraph_mut(|para| {
        total += para.edit_text(|text| replace_tokens(text, substitutions));
    });
    total
}

/// Replace one spelling of a placeholder in every paragraph.
pub fn replace_spelling(doc: &mut Document, name: &str, spelling: Spelling, value: &str) -> usize {
    substitute(doc, &[Substitution::new(name, spelling, value)])
}

/// Replace a placeholder in all its spellings.
pub fn replace_all_spellings(doc: &mut Document, name: &str, value: &str) -> usize {
    substitute(doc, &Substitution::all_spellings(name, value))
}

/// Replace several placeholders at once. Values are inserted literally.
pub fn replace_values(doc: &mut Document, values: &[(&str, &str)]) -> usize {
    let substitutions: Vec<Substitution<'_>> = values
        .iter()
        .flat_map(|(name, value)| Substitution::all_spellings(name, value))
        .collect();
    substitute(doc, &substitutions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        Document::parse(&format!(
            r#"<w:document xmlns:w="urn:w"><w:body>{}</w:body></w:document>"#,
            body
        ))
        .unwrap()
    }

    #[test]
    fn test_every_spelling_replaced() {
        let mut d = doc(
            r#"<w:p><w:r><w:t xml:space="preserve">${ma_tram}; ${ma_tram} $ma_tram; $ma_tram</w:t></w:r></w:p>"#,
        );
        let n = replace_all_spellings(&mut d, "ma_tram", "A12");
        assert_eq!(n, 4);
        assert_eq!(d.plain_text(), "A12 A12 A12 A12");
    }

    #[test]
    fn test_split_token_in_table_cell() {
        let mut d = doc(
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Tram: $</w:t></w:r><w:r><w:t>{ma_</w:t></w:r><w:r><w:t>tram}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        let n = replace_spelling(&mut d, "ma_tram", Spelling::Braced, "BTS-001");
        assert_eq!(n, 1);
        assert_eq!(d.plain_text(), "Tram: BTS-001");
        // the bold run keeps its original character count
        assert!(d.to_xml().contains("<w:b/></w:rPr><w:t>Tram: B</w:t>"));
    }

    #[test]
    fn test_bare_spelling_respects_longer_names() {
        let mut d = doc(r#"<w:p><w:r><w:t>$ngay_ky / $ngay</w:t></w:r></w:p>"#);
        replace_all_spellings(&mut d, "ngay", "X");
        assert_eq!(d.plain_text(), "$ngay_ky / X");
    }

    #[test]
    fn test_value_holding_a_token_stays_literal() {
        let mut d = doc(r#"<w:p><w:r><w:t xml:space="preserve">${ghi_chu} - $ma_tram</w:t></w:r></w:p>"#);
        let n = replace_values(&mut d, &[("ma_tram", "A12"), ("ghi_chu", "giá $ma_tram USD")]);
        assert_eq!(n, 2);
        assert_eq!(d.plain_text(), "giá $ma_tram USD - A12");

        let mut d = doc(r#"<w:p><w:r><w:t>$ten</w:t></w:r></w:p>"#);
        replace_all_spellings(&mut d, "ten", "${ten}");
        assert_eq!(d.plain_text(), "${ten}");
    }

    #[test]
    fn test_no_match_leaves_markup() {
        let xml = r#"<w:p><w:r><w:t>plain</w:t></w:r></w:p>"#;
        let mut d = doc(xml);
        let before = d.to_xml();
        assert_eq!(replace_all_spellings(&mut d, "missing", "X"), 0);
        assert_eq!(d.to_xml(), before);
    }

    #[test]
    fn test_value_is_escaped_on_output() {
        let mut d = doc(r#"<w:p><w:r><w:t>$ten</w:t></w:r></w:p>"#);
        replace_all_spellings(&mut d, "ten", "A & B <C>");
        assert!(d.to_xml().contains("A &amp; B &lt;C&gt;"));
        assert_eq!(d.plain_text(), "A & B <C>");
    }
}
