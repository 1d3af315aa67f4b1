//! Display formatting of record values.
//!
//! Every function here is total: malformed input falls back to the value's
//! plain string form instead of failing.

mod words;

pub use words::to_vietnamese_words;

use std::fmt::Write;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::warn;

use crate::model::{normalize_key, FieldValue};

/// Default serial threshold: serials above it are read as dates (after 1968-06-11).
pub const DEFAULT_SERIAL_THRESHOLD: i64 = 25_000;

/// Serial of 10000-01-01, the first day the 1900 date system cannot express.
const SERIAL_UPPER_BOUND: f64 = 2_958_466.0;

const DAY_FIRST_PATTERNS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];
const ISO_PATTERNS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_PATTERNS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Options for value formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    /// Keys (normalised) whose values are dates
    pub date_keys: Vec<String>,

    /// Substrings marking any key as a date (`ngay` by default)
    pub date_markers: Vec<String>,

    /// Substrings marking a key as monetary
    pub money_keywords: Vec<String>,

    /// Integers above this are spreadsheet date serials for date keys
    pub serial_threshold: i64,

    /// Output pattern for dates (`chrono` strftime syntax)
    pub date_pattern: String,
}

impl FormatOptions {
    /// Create new format options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a date-classified key.
    pub fn with_date_key(mut self, key: &str) -> Self {
        self.date_keys.push(normalize_key(key));
        self
    }

    /// Add a substring that marks every key containing it as a date.
    pub fn with_date_marker(mut self, marker: &str) -> Self {
        self.date_markers.push(normalize_key(marker));
        self
    }

    /// Replace the monetary vocabulary.
    pub fn with_money_keywords<S: AsRef<str>>(mut self, words: impl IntoIterator<Item = S>) -> Self {
        self.money_keywords = words
            .into_iter()
            .map(|w| normalize_key(w.as_ref()))
            .collect();
        self
    }

    /// Set the serial-date threshold.
    pub fn with_serial_threshold(mut self, threshold: i64) -> Self {
        self.serial_threshold = threshold;
        self
    }

    /// Set the date output pattern.
    pub fn with_date_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.date_pattern = pattern.into();
        self
    }

    /// Whether a key denotes a date: listed explicitly or containing a
    /// date marker.
    pub fn is_date_key(&self, key: &str) -> bool {
        let key = normalize_key(key);
        self.date_keys.iter().any(|k| *k == key)
            || self
                .date_markers
                .iter()
                .any(|m| !m.is_empty() && key.contains(m.as_str()))
    }

    /// Whether a key denotes an amount of money.
    pub fn is_money_key(&self, key: &str) -> bool {
        let key = normalize_key(key);
        self.money_keywords.iter().any(|w| key.contains(w.as_str()))
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            date_keys: [
                "ngay_ky",
                "ngay_hd",
                "ngay_lap",
                "ngay_bat_dau",
                "ngay_ket_thuc",
                "ngay_nghiem_thu",
                "ngay_thanh_toan",
            ]
            .iter()
            .map(|k| normalize_key(k))
            .collect(),
            date_markers: vec!["ngay".to_string()],
            money_keywords: ["amount", "total", "price", "fee", "tax", "value", "tien"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
            serial_threshold: DEFAULT_SERIAL_THRESHOLD,
            date_pattern: "%d/%m/%Y".to_string(),
        }
    }
}

/// Formats record values for placeholders.
#[derive(Debug, Clone, Default)]
pub struct ValueFormatter {
    options: FormatOptions,
}

impl ValueFormatter {
    /// Create a formatter.
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Display string for the value of `key`.
    pub fn format(&self, key: &str, value: &FieldValue) -> String {
        match value {
            FieldValue::Empty => String::new(),
            FieldValue::DateLike(date) => self.render_date(*date),
            _ if self.options.is_date_key(key) => self.format_date(value),
            FieldValue::Integer(_) | FieldValue::Decimal(_) => self.format_number(value),
            FieldValue::Text(text) if self.options.is_money_key(key) => {
                match value.as_f64() {
                    Some(_) => self.format_number(value),
                    None => text.clone(),
                }
            }
            FieldValue::Text(text) => match parse_day_first(text) {
                Some(date) => self.render_date(date),
                None => text.clone(),
            },
        }
    }

    /// Render a value as a date where possible.
    pub fn format_date(&self, value: &FieldValue) -> String {
        let date = match value {
            FieldValue::Empty => return String::new(),
            FieldValue::DateLike(date) => Some(*date),
            FieldValue::Integer(i) => self.serial_date(*i as f64),
            FieldValue::Decimal(d) => self.serial_date(*d),
            FieldValue::Text(text) => parse_date_text(text).or_else(|| {
                text.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(|serial| self.serial_date(serial))
            }),
        };
        match date {
            Some(date) => self.render_date(date),
            None => {
                let plain = value.to_string();
                warn!("value {:?} is not a date; using it as is", plain);
                plain
            }
        }
    }

    /// Group a numeric value with `.` thousands and `,` decimals.
    pub fn format_number(&self, value: &FieldValue) -> String {
        match value.as_f64() {
            Some(number) => group_number(number).unwrap_or_else(|| value.to_string()),
            None => value.to_string(),
        }
    }

    /// Convert a spreadsheet serial above the threshold to a date.
    pub fn serial_date(&self, serial: f64) -> Option<NaiveDate> {
        if !serial.is_finite()
            || serial <= self.options.serial_threshold as f64
            || serial >= SERIAL_UPPER_BOUND
        {
            return None;
        }
        serial_to_date(serial)
    }

    fn render_date(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        match write!(out, "{}", date.format(&self.options.date_pattern)) {
            Ok(()) => out,
            Err(_) => {
                warn!("invalid date pattern {:?}", self.options.date_pattern);
                date.format("%d/%m/%Y").to_string()
            }
        }
    }
}

/// Convert a 1900-system spreadsheet serial (epoch 1899-12-30) to a date.
///
/// The fractional time of day is dropped.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial >= SERIAL_UPPER_BOUND {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Parse a day-first date (`05/03/2024`, `05-03-2024`, `05.03.2024`).
pub fn parse_day_first(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DAY_FIRST_PATTERNS
        .iter()
        .find_map(|p| NaiveDate::parse_from_str(text, p).ok())
}

/// Parse a date written day-first, ISO, or as a date-time.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    parse_day_first(text)
        .or_else(|| {
            ISO_PATTERNS
                .iter()
                .find_map(|p| NaiveDate::parse_from_str(text, p).ok())
        })
        .or_else(|| {
            DATETIME_PATTERNS
                .iter()
                .find_map(|p| NaiveDateTime::parse_from_str(text, p).ok())
                .map(|dt| dt.date())
        })
}

fn group_digits(mut n: u128) -> String {
    let mut groups = Vec::new();
    loop {
        groups.push(n % 1000);
        n /= 1000;
        if n == 0 {
            break;
        }
    }
    let mut out = groups.pop().map(|g| g.to_string()).unwrap_or_default();
    while let Some(g) = groups.pop() {
        out.push('.');
        out.push_str(&format!("{:03}", g));
    }
    out
}

fn group_number(number: f64) -> Option<String> {
    if !number.is_finite() || number.abs() >= 1e30 {
        return None;
    }
    let cents = (number.abs() * 100.0).round() as u128;
    let (whole, frac) = (cents / 100, cents % 100);
    let sign = if number < 0.0 && cents > 0 { "-" } else { "" };
    Some(if frac == 0 {
        format!("{}{}", sign, group_digits(whole))
    } else {
        format!("{}{},{:02}", sign, group_digits(whole), frac)
    })
}

/// Render a value as a date, with the default options.
pub fn format_date(value: impl Into<FieldValue>) -> String {
    ValueFormatter::default().format_date(&value.into())
}

/// Render a value as money, with the default options.
///
/// Non-numeric input is returned unchanged.
pub fn format_money(value: impl Into<FieldValue>) -> String {
    ValueFormatter::default().format_number(&value.into())
}

/// Format the value of `key` with the default options.
pub fn format_value(key: &str, value: &FieldValue) -> String {
    ValueFormatter::default().format(key, value)
}

/// Normalise a manually entered date to the output pattern, if it is one.
pub fn normalize_date_input(text: &str) -> Option<String> {
    parse_date_text(text).map(|d| d.format("%d/%m/%Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(5_500_000), "5.500.000");
        assert_eq!(format_money(5_500_000.5), "5.500.000,50");
        assert_eq!(format_money(999), "999");
        assert_eq!(format_money(1000), "1.000");
        assert_eq!(format_money(-1_234_567.891), "-1.234.567,89");
        assert_eq!(format_money("abc"), "abc");
        assert_eq!(format_money("2500000"), "2.500.000");
    }

    #[test]
    fn test_serial_matches_iso() {
        assert_eq!(format_date(41000), format_date("2012-04-01"));
        assert_eq!(format_date(41000), "01/04/2012");
        assert_eq!(format_date(44200), "04/01/2021");
    }

    #[test]
    fn test_serial_threshold() {
        assert_eq!(format_date(25_000), "25000");
        assert_eq!(format_date(25_001), "12/06/1968");
        assert_eq!(
            serial_to_date(1.0),
            NaiveDate::from_ymd_opt(1899, 12, 31)
        );
    }

    #[test]
    fn test_format_value_by_key() {
        let f = ValueFormatter::default();
        assert_eq!(f.format("Ngay_Ky", &FieldValue::Integer(44200)), "04/01/2021");
        assert_eq!(f.format("ngay_ky", &"2024-03-05".into()), "05/03/2024");
        assert_eq!(f.format("Tong_tien", &FieldValue::Integer(5_500_000)), "5.500.000");
        assert_eq!(f.format("Tong_tien", &"5500000".into()), "5.500.000");
        assert_eq!(f.format("So_luong", &FieldValue::Integer(12_000)), "12.000");
        assert_eq!(f.format("Ghi_chu", &FieldValue::Empty), "");
        assert_eq!(f.format("Thang", &"11/2024".into()), "11/2024");
        assert_eq!(f.format("ma_tram", &"001234".into()), "001234");
        assert_eq!(f.format("Ngay_khac", &"5-3-2024".into()), "05/03/2024");
    }

    #[test]
    fn test_malformed_date_falls_back() {
        let f = ValueFormatter::default();
        assert_eq!(f.format("ngay_ky", &"sắp tới".into()), "sắp tới");
        assert_eq!(f.format("ngay_ky", &FieldValue::Integer(12)), "12");
    }

    #[test]
    fn test_options_builder() {
        let options = FormatOptions::new()
            .with_date_key("Han_bao_hanh")
            .with_date_marker("thoi_diem")
            .with_money_keywords(["gia_tri"])
            .with_serial_threshold(25_568)
            .with_date_pattern("%Y-%m-%d");
        assert!(options.is_date_key("hanbaohanh"));
        assert!(options.is_date_key("Thoi_diem_lap"));
        assert!(options.is_money_key("Tong_gia_tri"));
        assert!(!options.is_money_key("Tong_tien"));

        let f = ValueFormatter::new(options);
        assert_eq!(f.format("han_bao_hanh", &FieldValue::Integer(44200)), "2021-01-04");
        assert_eq!(f.serial_date(25_500.0), None);
    }

    #[test]
    fn test_any_ngay_key_is_a_date() {
        let options = FormatOptions::default();
        assert!(options.is_date_key("ngay_ban_giao"));
        assert!(options.is_date_key("NgayKiemTra"));
        assert!(!options.is_date_key("So_luong"));

        let f = ValueFormatter::default();
        assert_eq!(f.format("ngay_ban_giao", &FieldValue::Integer(44200)), "04/01/2021");
        assert_eq!(f.format("So_luong", &FieldValue::Integer(44200)), "44.200");
    }

    #[test]
    fn test_bad_pattern_does_not_panic() {
        let f = ValueFormatter::new(FormatOptions::new().with_date_pattern("%Q"));
        assert_eq!(f.format("ngay_ky", &FieldValue::Integer(44200)), "04/01/2021");
    }

    #[test]
    fn test_normalize_date_input() {
        assert_eq!(normalize_date_input("2024-12-01").as_deref(), Some("01/12/2024"));
        assert_eq!(normalize_date_input("1/12/2024").as_deref(), Some("01/12/2024"));
        assert_eq!(normalize_date_input("hôm nay"), None);
    }
}
