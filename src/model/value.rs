//! Field values and records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A raw value taken from a tabular record.
///
/// Deserialization tries the variants in order, so JSON `null` is `Empty`,
/// whole numbers are `Integer`, other numbers `Decimal`, ISO date strings
/// `DateLike` and any other string `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    /// Absent or null
    #[default]
    Empty,
    /// Whole number
    Integer(i64),
    /// Fractional number
    Decimal(f64),
    /// Calendar date
    DateLike(NaiveDate),
    /// Free text
    Text(String),
}

impl FieldValue {
    /// Check if the value is absent or blank text.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the value, parsing text when it is a plain number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Decimal(d) => Some(*d),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Text view of the value, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::DateLike(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Integer(i.into())
    }
}

impl From<f64> for FieldValue {
    fn from(d: f64) -> Self {
        FieldValue::Decimal(d)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::DateLike(d)
    }
}

/// Normalise a field key: lower-cased with underscores removed.
///
/// `Ngay_Ky` and `ngayky` compare equal.
pub fn normalize_key(key: &str) -> String {
    key.trim()
        .chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// A record of named values, looked up case- and underscore-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, FieldValue>",
    into = "BTreeMap<String, FieldValue>"
)]
pub struct FieldRecord {
    entries: BTreeMap<String, (String, FieldValue)>,
}

impl FieldRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value; an existing value under the same normalised key is replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        self.entries
            .insert(normalize_key(&key), (key, value.into()));
    }

    /// Look up a value by any spelling of its key.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.get(&normalize_key(key)).map(|(_, v)| v)
    }

    /// Look up the original key and value.
    pub fn get_entry(&self, key: &str) -> Option<(&str, &FieldValue)> {
        self.entries
            .get(&normalize_key(key))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Check whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize_key(key))
    }

    /// Text of a value, trimmed; `None` when absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.to_string().trim().to_string())
    }

    /// Remove a value by any spelling of its key.
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.entries.remove(&normalize_key(key)).map(|(_, v)| v)
    }

    /// Merge another record into this one; its values win on collision.
    pub fn merge(&mut self, other: FieldRecord) {
        self.entries.extend(other.entries);
    }

    /// Iterate entries as (original key, value), ordered by normalised key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, FieldValue>> for FieldRecord {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        map.into_iter().collect()
    }
}

impl From<FieldRecord> for BTreeMap<String, FieldValue> {
    fn from(record: FieldRecord) -> Self {
        record.entries.into_values().collect()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}
