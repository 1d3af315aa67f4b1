//! Report generation.
//!
//! A report is produced in two phases. [`ReportGenerator::plan`] resolves
//! every placeholder of a template against the merged record and the values
//! typed in by the operator; names that cannot be resolved come back as
//! [`MissingField`]s. Once they are supplied, [`ReportGenerator::generate`]
//! fills the template and returns the finished document.
//!
//! ```no_run
//! use docfill::model::FieldRecord;
//! use docfill::report::{ReportGenerator, ReportOutcome, WorkbookSource};
//!
//! let source = WorkbookSource::open("data.xlsx")?;
//! let generator = ReportGenerator::default();
//! let session = generator.login(&source, "A12", "11/2024", "123456")?;
//!
//! let template = std::fs::read("template.docx")?;
//! match generator.generate_for_session(&template, &session, &source, &FieldRecord::new())? {
//!     ReportOutcome::Ready(report) => std::fs::write(&report.filename, &report.bytes)?,
//!     ReportOutcome::NeedsInput(missing) => println!("{} field(s) missing", missing.len()),
//! }
//! # Ok::<(), docfill::Error>(())
//! ```

mod auth;
mod photos;
mod record;
mod workbook;

pub use auth::{hash_secret, verify_secret, DEFAULT_SALT};
pub use photos::{
    slot_label, slot_name, PhotoSlots, Rotation, JPEG_QUALITY, MAX_EDGE, SLOT_COUNT, SLOT_LABELS,
};
pub use record::{
    add_derived_fields, normalize_code, InMemorySource, RecordSource, Session, CREDENTIAL_KEY,
    FINANCIAL_CODE_KEY, NOT_EVALUATED, PASSED, PERIOD_KEY, STATION_CODE_KEY,
};
pub use workbook::{cell_value, WorkbookSource, FINANCIAL_SHEET, STATION_SHEET};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::{normalize_date_input, to_vietnamese_words, FormatOptions, ValueFormatter};
use crate::model::{normalize_key, FieldRecord, FieldValue};
use crate::template::{image_slot, FillOptions, Template};

/// Suffix marking a placeholder for an amount written out in words.
const WORDS_SUFFIX: &str = "bangchu";

/// Default prefix of generated file names.
pub const DEFAULT_FILENAME_PREFIX: &str = "BBNT";

/// Pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TemplateLoaded,
    PlaceholdersResolved,
    TextSubstituted,
    ImagesInserted,
    Serialized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::TemplateLoaded => "template loaded",
            Stage::PlaceholdersResolved => "placeholders resolved",
            Stage::TextSubstituted => "text substituted",
            Stage::ImagesInserted => "images inserted",
            Stage::Serialized => "serialized",
        };
        f.write_str(name)
    }
}

/// Options for report generation.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Template filling options
    pub fill: FillOptions,

    /// Value formatting options
    pub format: FormatOptions,

    /// Prefix of generated file names
    pub filename_prefix: String,

    /// Salt of stored credential hashes
    pub salt: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            fill: FillOptions::default(),
            format: FormatOptions::default(),
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
            salt: DEFAULT_SALT.to_string(),
        }
    }
}

impl ReportOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template filling options.
    pub fn with_fill(mut self, fill: FillOptions) -> Self {
        self.fill = fill;
        self
    }

    /// Set the value formatting options.
    pub fn with_format(mut self, format: FormatOptions) -> Self {
        self.format = format;
        self
    }

    /// Set the file name prefix.
    pub fn with_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }

    /// Set the credential salt.
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = salt.into();
        self
    }
}

/// How a missing value should be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Date,
    Text,
}

impl InputKind {
    /// Kind of input expected for a placeholder name under the default
    /// date-key rule.
    pub fn for_name(name: &str) -> Self {
        Self::for_key(name, &FormatOptions::default())
    }

    /// Kind of input expected for a placeholder name, using the same rule
    /// the formatter uses to recognise date keys.
    pub fn for_key(name: &str, options: &FormatOptions) -> Self {
        if options.is_date_key(name) {
            InputKind::Date
        } else {
            InputKind::Text
        }
    }
}

/// A placeholder with no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingField {
    /// Placeholder name as written in the template
    pub name: String,
    /// Kind of input to ask for
    pub kind: InputKind,
}

/// Result of resolving placeholder names.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Display value per placeholder name
    pub values: BTreeMap<String, String>,
    /// Names with no value
    pub missing: Vec<MissingField>,
    /// Image placeholder names, left for the photo slots
    pub images: Vec<String>,
}

impl Resolution {
    /// Check if every text placeholder has a value.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// A finished report.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    /// The DOCX bytes
    pub bytes: Vec<u8>,
    /// Suggested file name
    pub filename: String,
    /// Number of text substitutions made
    pub replaced: usize,
    /// Photo slots placed into the document
    pub inserted_slots: Vec<usize>,
}

/// Outcome of a generation attempt.
#[derive(Debug, Clone)]
pub enum ReportOutcome {
    /// The report is complete.
    Ready(RenderedReport),
    /// Values must be supplied before the report can be generated.
    NeedsInput(Vec<MissingField>),
}

impl ReportOutcome {
    /// Turn a request for input into [`Error::UnresolvedPlaceholders`].
    pub fn into_result(self) -> Result<RenderedReport> {
        match self {
            ReportOutcome::Ready(report) => Ok(report),
            ReportOutcome::NeedsInput(missing) => Err(Error::UnresolvedPlaceholders(
                missing.into_iter().map(|m| m.name).collect(),
            )),
        }
    }
}

/// Fills report templates from station records.
#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    options: ReportOptions,
    formatter: ValueFormatter,
}

impl ReportGenerator {
    /// Create a generator.
    pub fn new(options: ReportOptions) -> Self {
        let formatter = ValueFormatter::new(options.format.clone());
        Self { options, formatter }
    }

    /// The options in use.
    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Authenticate against a record source with the configured salt.
    pub fn login(
        &self,
        source: &dyn RecordSource,
        code: &str,
        period: &str,
        secret: &str,
    ) -> Result<Session> {
        Session::login(source, code, period, secret, &self.options.salt)
    }

    /// Resolve placeholder names to display values.
    ///
    /// Manual values win over the record. A name ending in `bangchu` that is
    /// not a field itself takes the words of its numeric base field.
    pub fn resolve(
        &self,
        names: &BTreeSet<String>,
        record: &FieldRecord,
        manual: &FieldRecord,
    ) -> Resolution {
        let mut resolution = Resolution::default();
        for name in names {
            if image_slot(name).is_some() {
                resolution.images.push(name.clone());
                continue;
            }
            match self.resolve_one(name, record, manual) {
                Some(value) => {
                    resolution.values.insert(name.clone(), value);
                }
                None => resolution.missing.push(MissingField {
                    name: name.clone(),
                    kind: self.input_kind(name),
                }),
            }
        }
        resolution
    }

    fn resolve_one(&self, name: &str, record: &FieldRecord, manual: &FieldRecord) -> Option<String> {
        if let Some(value) = manual.get(name) {
            return Some(self.manual_text(name, value));
        }
        if let Some(value) = record.get(name) {
            return Some(self.formatter.format(name, value));
        }

        let key = normalize_key(name);
        let base = key.strip_suffix(WORDS_SUFFIX)?;
        if base.is_empty() {
            return None;
        }
        let amount = record.get(base)?.as_f64()?;
        Some(to_vietnamese_words(amount.round() as i64))
    }

    fn input_kind(&self, name: &str) -> InputKind {
        InputKind::for_key(name, self.formatter.options())
    }

    fn manual_text(&self, name: &str, value: &FieldValue) -> String {
        let text = value.to_string();
        if self.input_kind(name) == InputKind::Date {
            if let Some(date) = normalize_date_input(&text) {
                return date;
            }
        }
        text.trim().to_string()
    }

    /// Dry run: resolve the placeholders of a template without filling it.
    pub fn plan(
        &self,
        template_bytes: &[u8],
        record: &FieldRecord,
        manual: &FieldRecord,
    ) -> Result<Resolution> {
        let template = Template::from_bytes(template_bytes, self.options.fill.clone())?;
        Ok(self.resolve(&template.placeholders(), record, manual))
    }

    /// Fill a template.
    ///
    /// Returns [`ReportOutcome::NeedsInput`] without touching the document
    /// when a text placeholder has no value. Nothing is returned unless
    /// every stage succeeds.
    pub fn generate(
        &self,
        template_bytes: &[u8],
        record: &FieldRecord,
        manual: &FieldRecord,
        photos: &PhotoSlots,
        station: &str,
        period: &str,
    ) -> Result<ReportOutcome> {
        let mut template = Template::from_bytes(template_bytes, self.options.fill.clone())?;
        debug!("{}", Stage::TemplateLoaded);

        let resolution = self.resolve(&template.placeholders(), record, manual);
        if !resolution.is_complete() {
            debug!(
                "halting: {} placeholder(s) need input",
                resolution.missing.len()
            );
            return Ok(ReportOutcome::NeedsInput(resolution.missing));
        }
        debug!("{}", Stage::PlaceholdersResolved);

        let replaced = template.replace_values(
            resolution
                .values
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );
        debug!("{}: {} substitution(s)", Stage::TextSubstituted, replaced);

        let mut inserted_slots = Vec::new();
        for (slot, asset) in photos.filled() {
            let name = slot_name(slot);
            if template.insert_image(&name, asset)? {
                inserted_slots.push(slot);
            } else {
                warn!("photo in slot {} has no {} placeholder", slot, name);
            }
        }
        debug!("{}: {:?}", Stage::ImagesInserted, inserted_slots);

        let bytes = template.to_bytes()?;
        debug!("{}: {} bytes", Stage::Serialized, bytes.len());

        let filename = report_filename(
            &self.options.filename_prefix,
            station,
            period,
            Local::now().naive_local(),
        );
        info!("report {} generated ({} bytes)", filename, bytes.len());

        Ok(ReportOutcome::Ready(RenderedReport {
            bytes,
            filename,
            replaced,
            inserted_slots,
        }))
    }

    /// Fill a template for an authenticated session.
    ///
    /// The period is checked against the source before the template is read.
    pub fn generate_for_session(
        &self,
        template_bytes: &[u8],
        session: &Session,
        source: &dyn RecordSource,
        manual: &FieldRecord,
    ) -> Result<ReportOutcome> {
        let record = session.record(source)?;
        self.generate(
            template_bytes,
            &record,
            manual,
            &session.photos,
            session.station_code(),
            session.period(),
        )
    }
}

/// File name of a generated report.
///
/// Path separators, characters Windows rejects and whitespace in the
/// station and period become `-`.
pub fn report_filename(prefix: &str, station: &str, period: &str, at: NaiveDateTime) -> String {
    format!(
        "{}_{}_{}_{}.docx",
        prefix,
        path_safe(station),
        path_safe(period),
        at.format("%Y%m%d_%H%M%S")
    )
}

fn path_safe(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_whitespace() => '-',
            c => c,
        })
        .collect()
}
