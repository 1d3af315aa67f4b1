//! Records read from an `.xlsx` workbook.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use log::debug;

use super::record::{InMemorySource, RecordSource};
use crate::error::{Error, Result};
use crate::format::serial_to_date;
use crate::model::{FieldRecord, FieldValue};

/// Sheet holding station records.
pub const STATION_SHEET: &str = "CSDL";

/// Sheet holding monthly financial records.
pub const FINANCIAL_SHEET: &str = "Taichinh";

/// A record source backed by a workbook with `CSDL` and `Taichinh` sheets.
///
/// The first row of each sheet is the header; header names are trimmed.
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    records: InMemorySource,
}

impl WorkbookSource {
    /// Read a workbook from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))
            .map_err(|e| Error::Workbook(format!("cannot open workbook: {}", e)))?;

        let stations = sheet_records(&workbook.worksheet_range(STATION_SHEET).map_err(|e| {
            Error::Workbook(format!("sheet {}: {}", STATION_SHEET, e))
        })?);
        let financials =
            sheet_records(&workbook.worksheet_range(FINANCIAL_SHEET).map_err(|e| {
                Error::Workbook(format!("sheet {}: {}", FINANCIAL_SHEET, e))
            })?);

        debug!(
            "workbook loaded: {} station(s), {} financial record(s)",
            stations.len(),
            financials.len()
        );
        Ok(Self {
            records: InMemorySource {
                stations,
                financials,
            },
        })
    }

    /// Read a workbook file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// The records as read.
    pub fn records(&self) -> &InMemorySource {
        &self.records
    }
}

impl RecordSource for WorkbookSource {
    fn station(&self, code: &str) -> Result<Option<FieldRecord>> {
        self.records.station(code)
    }

    fn financial(&self, code: &str, period: &str) -> Result<Option<FieldRecord>> {
        self.records.financial(code, period)
    }

    fn periods(&self) -> Result<Vec<String>> {
        self.records.periods()
    }
}

fn sheet_records(range: &Range<Data>) -> Vec<FieldRecord> {
    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|c| cell_text(c).trim().to_string()).collect(),
        None => return Vec::new(),
    };

    rows.filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| {
            header
                .iter()
                .zip(row.iter())
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, cell)| (name.clone(), cell_value(cell)))
                .collect()
        })
        .collect()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => cell_value(other).to_string(),
    }
}

/// Map a cell to a field value.
pub fn cell_value(cell: &Data) -> FieldValue {
    match cell {
        Data::Empty => FieldValue::Empty,
        Data::String(s) => FieldValue::Text(s.clone()),
        Data::Int(i) => FieldValue::Integer(*i),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                FieldValue::Integer(*f as i64)
            } else {
                FieldValue::Decimal(*f)
            }
        }
        Data::Bool(b) => FieldValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => match serial_to_date(dt.as_f64()) {
            Some(date) => FieldValue::DateLike(date),
            None => FieldValue::Decimal(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => FieldValue::Text(s.clone()),
        Data::Error(e) => FieldValue::Text(format!("#ERR:{:?}", e)),
    }
}
