//! Record sources, sessions and derived fields.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::auth::verify_secret;
use super::photos::PhotoSlots;
use crate::error::{Error, Result};
use crate::model::FieldRecord;

/// Station code column of station records.
pub const STATION_CODE_KEY: &str = "ma_tram";
/// Credential column of station records.
pub const CREDENTIAL_KEY: &str = "Password";
/// Station code column of financial records.
pub const FINANCIAL_CODE_KEY: &str = "Ma_vi_tri";
/// Period column of financial records.
pub const PERIOD_KEY: &str = "Thang";

/// Verdict for a passed evaluation.
pub const PASSED: &str = "Đạt";
/// Verdict when an evaluation does not apply.
pub const NOT_EVALUATED: &str = "Không đánh giá";

const GUYED_MAST: &str = "cột dây co";
const NOT_RENTED: &str = "Không thuê";

/// Read access to station and financial records.
pub trait RecordSource {
    /// The station record for a code (already trimmed and upper-cased).
    fn station(&self, code: &str) -> Result<Option<FieldRecord>>;

    /// The financial record of a station for a period.
    fn financial(&self, code: &str, period: &str) -> Result<Option<FieldRecord>>;

    /// Distinct periods with financial data, sorted.
    fn periods(&self) -> Result<Vec<String>>;
}

/// Canonical form of a station code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Records held in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemorySource {
    /// Station records, keyed by `ma_tram`
    #[serde(default)]
    pub stations: Vec<FieldRecord>,

    /// Financial records, keyed by `Ma_vi_tri` and `Thang`
    #[serde(default)]
    pub financials: Vec<FieldRecord>,
}

impl InMemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a station record and return self.
    pub fn with_station(mut self, record: FieldRecord) -> Self {
        self.stations.push(record);
        self
    }

    /// Add a financial record and return self.
    pub fn with_financial(mut self, record: FieldRecord) -> Self {
        self.financials.push(record);
        self
    }
}

fn code_of(record: &FieldRecord, key: &str) -> Option<String> {
    record.text(key).map(|c| normalize_code(&c))
}

impl RecordSource for InMemorySource {
    fn station(&self, code: &str) -> Result<Option<FieldRecord>> {
        let code = normalize_code(code);
        Ok(self
            .stations
            .iter()
            .find(|r| code_of(r, STATION_CODE_KEY).as_deref() == Some(code.as_str()))
            .cloned())
    }

    fn financial(&self, code: &str, period: &str) -> Result<Option<FieldRecord>> {
        let code = normalize_code(code);
        let period = period.trim();
        Ok(self
            .financials
            .iter()
            .find(|r| {
                code_of(r, FINANCIAL_CODE_KEY).as_deref() == Some(code.as_str())
                    && r.text(PERIOD_KEY).as_deref() == Some(period)
            })
            .cloned())
    }

    fn periods(&self) -> Result<Vec<String>> {
        let mut periods: Vec<String> = self
            .financials
            .iter()
            .filter_map(|r| r.text(PERIOD_KEY))
            .filter(|p| !p.is_empty())
            .collect();
        periods.sort();
        periods.dedup();
        Ok(periods)
    }
}

/// Per-request context of an authenticated station operator.
#[derive(Debug, Clone)]
pub struct Session {
    station_code: String,
    period: String,
    station: FieldRecord,
    /// Photos uploaded during the session
    pub photos: PhotoSlots,
}

impl Session {
    /// Authenticate a station operator for a period.
    pub fn login(
        source: &dyn RecordSource,
        code: &str,
        period: &str,
        secret: &str,
        salt: &str,
    ) -> Result<Self> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(Error::StationNotFound(code));
        }
        let station = source
            .station(&code)?
            .ok_or_else(|| Error::StationNotFound(code.clone()))?;

        let stored = station.text(CREDENTIAL_KEY).unwrap_or_default();
        if !verify_secret(secret, &stored, salt) {
            return Err(Error::InvalidCredentials);
        }

        Ok(Self {
            station_code: code,
            period: period.trim().to_string(),
            station,
            photos: PhotoSlots::new(),
        })
    }

    /// The authenticated station code.
    pub fn station_code(&self) -> &str {
        &self.station_code
    }

    /// The selected period.
    pub fn period(&self) -> &str {
        &self.period
    }

    /// Build the merged record for the selected period.
    ///
    /// The financial record overrides station values, the period is stored
    /// under `Thang`, and the derived evaluation fields are added. The stored
    /// credential never reaches the record.
    pub fn record(&self, source: &dyn RecordSource) -> Result<FieldRecord> {
        let financial = source
            .financial(&self.station_code, &self.period)?
            .ok_or_else(|| Error::NoDataForPeriod {
                station: self.station_code.clone(),
                period: self.period.clone(),
            })?;

        let mut record = self.station.clone();
        record.merge(financial);
        record.remove(CREDENTIAL_KEY);
        record.insert(PERIOD_KEY, self.period.clone());
        add_derived_fields(&mut record);
        Ok(record)
    }
}

fn canonical(text: &str) -> String {
    text.trim().to_lowercase().nfc().collect()
}

/// Add the evaluation verdicts derived from the record's own values.
///
/// - `Danh_gia_cot`: passed for a guyed mast (`Loai_cot`)
/// - `Danh_gia_PM`: passed unless the equipment room is not rented (`Phong_may`)
/// - `Danh_gia_DH`: passed unless the air conditioning is not rented (`Dieu_hoa`)
pub fn add_derived_fields(record: &mut FieldRecord) {
    let mast = record.text("Loai_cot").unwrap_or_default();
    let verdict = |passed: bool| if passed { PASSED } else { NOT_EVALUATED };

    let mast_ok = canonical(&mast) == canonical(GUYED_MAST);
    record.insert("Danh_gia_cot", verdict(mast_ok));

    let rented = |key: &str| {
        record
            .text(key)
            .map_or(true, |v| v.nfc().collect::<String>() != NOT_RENTED.nfc().collect::<String>())
    };
    let room_ok = rented("Phong_may");
    let air_ok = rented("Dieu_hoa");
    record.insert("Danh_gia_PM", verdict(room_ok));
    record.insert("Danh_gia_DH", verdict(air_ok));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::auth::{hash_secret, DEFAULT_SALT};

    fn source() -> InMemorySource {
        InMemorySource::new()
            .with_station(
                [
                    ("ma_tram", "a12 "),
                    ("Password", "123456"),
                    ("Loai_cot", "Cột dây co"),
                    ("Thang", "old"),
                ]
                .into_iter()
                .collect(),
            )
            .with_station(
                [
                    ("ma_tram", "B07"),
                    ("Password", hash_secret("bi-mat", DEFAULT_SALT).as_str()),
                    ("Loai_cot", "cột sắt"),
                    ("Phong_may", "Không thuê"),
                ]
                .into_iter()
                .collect(),
            )
            .with_financial(
                [("Ma_vi_tri", "A12"), ("Thang", "11/2024"), ("Tong_tien", "5500000")]
                    .into_iter()
                    .collect(),
            )
            .with_financial(
                [("Ma_vi_tri", "A12"), ("Thang", "10/2024")]
                    .into_iter()
                    .collect(),
            )
    }

    #[test]
    fn test_login_and_record() {
        let src = source();
        let session = Session::login(&src, " a12", "11/2024", "123456", DEFAULT_SALT).unwrap();
        assert_eq!(session.station_code(), "A12");

        let record = session.record(&src).unwrap();
        assert_eq!(record.text("Thang").as_deref(), Some("11/2024"));
        assert_eq!(record.text("tong_tien").as_deref(), Some("5500000"));
        assert_eq!(record.text("Danh_gia_cot").as_deref(), Some(PASSED));
        assert_eq!(record.text("Danh_gia_PM").as_deref(), Some(PASSED));
        assert!(!record.contains("Password"));
    }

    #[test]
    fn test_login_failures() {
        let src = source();
        assert!(matches!(
            Session::login(&src, "Z99", "11/2024", "x", DEFAULT_SALT),
            Err(Error::StationNotFound(code)) if code == "Z99"
        ));
        assert!(matches!(
            Session::login(&src, "A12", "11/2024", "wrong", DEFAULT_SALT),
            Err(Error::InvalidCredentials)
        ));
        assert!(Session::login(&src, "b07", "11/2024", "bi-mat", DEFAULT_SALT).is_ok());
    }

    #[test]
    fn test_missing_period_is_distinct() {
        let src = source();
        let session = Session::login(&src, "B07", "11/2024", "bi-mat", DEFAULT_SALT).unwrap();
        match session.record(&src) {
            Err(Error::NoDataForPeriod { station, period }) => {
                assert_eq!(station, "B07");
                assert_eq!(period, "11/2024");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_derived_fields() {
        let mut record: FieldRecord = [("ma_tram", "A12"), ("Loai_cot", "cột dây co")]
            .into_iter()
            .collect();
        add_derived_fields(&mut record);
        assert_eq!(record.text("Danh_gia_cot").as_deref(), Some("Đạt"));

        let mut record: FieldRecord = [("Loai_cot", "cột sắt"), ("Dieu_hoa", "Không thuê")]
            .into_iter()
            .collect();
        add_derived_fields(&mut record);
        assert_eq!(record.text("Danh_gia_cot").as_deref(), Some("Không đánh giá"));
        assert_eq!(record.text("Danh_gia_DH").as_deref(), Some("Không đánh giá"));
        assert_eq!(record.text("Danh_gia_PM").as_deref(), Some("Đạt"));
    }

    #[test]
    fn test_periods_sorted_distinct() {
        let src = source().with_financial(
            [("Ma_vi_tri", "B07"), ("Thang", "10/2024")]
                .into_iter()
                .collect(),
        );
        assert_eq!(src.periods().unwrap(), vec!["10/2024", "11/2024"]);
    }
}
