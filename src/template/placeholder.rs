//! Placeholder spellings, scanning and token matching.

use std::collections::BTreeSet;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BRACED: Regex = Regex::new(r"\$\{([A-Za-z0-9_]+)\}").unwrap();
    static ref BARE: Regex = Regex::new(r"\$([A-Za-z0-9_]+)").unwrap();
    static ref IMAGE_NAME: Regex = Regex::new(r"^[Aa][Nn][Hh]([1-8])$").unwrap();
}

/// Surface spelling of a placeholder token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spelling {
    /// `${NAME};`
    BracedSemicolon,
    /// `${NAME}`
    Braced,
    /// `$NAME;`
    BareSemicolon,
    /// `$NAME`
    Bare,
}

impl Spelling {
    /// Every spelling, longest first.
    ///
    /// Substituting in this order consumes a trailing semicolon together with
    /// its token instead of leaving it behind.
    pub const ALL: [Spelling; 4] = [
        Spelling::BracedSemicolon,
        Spelling::Braced,
        Spelling::BareSemicolon,
        Spelling::Bare,
    ];

    /// The literal token for a name.
    pub fn token(self, name: &str) -> String {
        match self {
            Spelling::BracedSemicolon => format!("${{{}}};", name),
            Spelling::Braced => format!("${{{}}}", name),
            Spelling::BareSemicolon => format!("${};", name),
            Spelling::Bare => format!("${}", name),
        }
    }

    /// Whether a match needs a word boundary after it.
    ///
    /// Only the bare spelling is open-ended: `$ngay` must not match the
    /// start of `$ngay_ky`.
    pub fn is_open_ended(self) -> bool {
        self == Spelling::Bare
    }
}

impl fmt::Display for Spelling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token("NAME"))
    }
}

/// Find the set of placeholder names in markup or text.
///
/// Both braced and bare spellings are recognised; names keep their case.
pub fn scan_placeholders(text: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for caps in BRACED.captures_iter(text) {
        names.insert(caps[1].to_string());
    }
    for caps in BARE.captures_iter(text) {
        names.insert(caps[1].to_string());
    }
    names
}

/// The photo slot (1-8) an image placeholder name stands for.
pub fn image_slot(name: &str) -> Option<usize> {
    IMAGE_NAME
        .captures(name)
        .and_then(|caps| caps[1].parse().ok())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// One token to replace and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution<'a> {
    /// Literal token, e.g. `${ma_tram}`
    pub token: String,
    /// Whether the token needs a name boundary after it
    pub bounded: bool,
    /// Replacement text, inserted verbatim
    pub value: &'a str,
}

impl<'a> Substitution<'a> {
    /// A substitution for one spelling of a name.
    pub fn new(name: &str, spelling: Spelling, value: &'a str) -> Self {
        Self {
            token: spelling.token(name),
            bounded: spelling.is_open_ended(),
            value,
        }
    }

    /// Substitutions for every spelling of a name.
    pub fn all_spellings(name: &str, value: &'a str) -> Vec<Self> {
        Spelling::ALL
            .iter()
            .map(|spelling| Self::new(name, *spelling, value))
            .collect()
    }

    fn matches_at(&self, rest: &str) -> bool {
        if !rest.starts_with(&self.token) {
            return false;
        }
        let next = rest[self.token.len()..].chars().next();
        !(self.bounded && next.is_some_and(is_name_char))
    }
}

/// Replace every token in one left-to-right scan.
///
/// At each `$` the longest matching token wins, so `${N};` beats `${N}` and
/// `$ngay_ky` beats `$ngay`. Inserted values are never scanned again.
pub fn replace_tokens(text: &str, substitutions: &[Substitution<'_>]) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut count = 0;
    let mut last = 0;
    let mut search = 0;
    while let Some(offset) = text[search..].find('$') {
        let pos = search + offset;
        let rest = &text[pos..];
        let hit = substitutions
            .iter()
            .filter(|s| s.matches_at(rest))
            .max_by_key(|s| s.token.len());
        match hit {
            Some(sub) => {
                out.push_str(&text[last..pos]);
                out.push_str(sub.value);
                last = pos + sub.token.len();
                search = last;
                count += 1;
            }
            None => search = pos + 1,
        }
    }
    if count == 0 {
        return (text.to_string(), 0);
    }
    out.push_str(&text[last..]);
    (out, count)
}

/// Compact form used for tolerant matching: no whitespace, lower case.
pub fn compact(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Check whether `text` contains `name` in any spelling, ignoring case and
/// whitespace inside the token.
///
/// A braced name may carry spaces anywhere between its braces. A bare name
/// ends at the first character that cannot be part of a name, so a caption
/// after `$Anh1` does not hide it.
pub fn contains_loosely(text: &str, name: &str) -> bool {
    let wanted = compact(name);
    if wanted.is_empty() {
        return false;
    }
    text.match_indices('$').any(|(pos, _)| {
        let rest = text[pos + 1..].trim_start();
        match rest.strip_prefix('{') {
            Some(inner) => inner
                .find('}')
                .is_some_and(|end| compact(&inner[..end]) == wanted),
            None => {
                let end = rest
                    .find(|c: char| !is_name_char(c))
                    .unwrap_or(rest.len());
                rest[..end].to_lowercase() == wanted
            }
        }
    })
}
