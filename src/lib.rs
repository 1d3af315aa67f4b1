//! # docfill
//!
//! DOCX template filling for Rust.
//!
//! This library fills `$NAME` / `${NAME}` placeholders in Word documents with
//! formatted record values, places pictures at `Anh1`..`Anh8` placeholders,
//! and drives the generation of station acceptance reports from a workbook.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docfill::{Docfill, FieldValue};
//!
//! fn main() -> docfill::Result<()> {
//!     let filled = Docfill::new()
//!         .with_value("ten_tram", "Trạm A12")
//!         .with_value("ngay_ky", FieldValue::Integer(44200))
//!         .fill("template.docx")?;
//!
//!     filled.save("out.docx")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Run normalisation**: placeholders split across formatting runs are found whole
//! - **Four spellings**: `$N`, `${N}`, `$N;` and `${N};`
//! - **Value formatting**: spreadsheet date serials, `5.500.000` money grouping,
//!   amounts in Vietnamese words
//! - **Pictures**: inline images scaled to a width, with consistent part references
//! - **Pass-through**: parts the fill does not touch leave the archive byte-identical

pub mod detect;
pub mod error;
pub mod format;
pub mod model;
pub mod package;
pub mod report;
pub mod template;

// Re-export commonly used types
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_docx, DocxFormat};
pub use error::{Error, Result};
pub use format::{
    format_date, format_money, format_value, to_vietnamese_words, FormatOptions, ValueFormatter,
};
pub use model::{Document, FieldRecord, FieldValue, ImageAsset, Paragraph, Table};
pub use report::{
    InMemorySource, InputKind, MissingField, PhotoSlots, RecordSource, RenderedReport,
    ReportGenerator, ReportOptions, ReportOutcome, Session, WorkbookSource,
};
pub use template::{FillOptions, Spelling, Template};

use std::collections::BTreeSet;
use std::path::Path;

use log::warn;

/// Open a template file with default options.
///
/// # Example
///
/// ```no_run
/// use docfill::open_template;
///
/// let template = open_template("template.docx").unwrap();
/// println!("{} placeholders", template.placeholders().len());
/// ```
pub fn open_template<P: AsRef<Path>>(path: P) -> Result<Template> {
    Template::open(path, FillOptions::default())
}

/// List the placeholder names of a template file.
///
/// # Example
///
/// ```no_run
/// use docfill::scan_file;
///
/// for name in scan_file("template.docx").unwrap() {
///     println!("{}", name);
/// }
/// ```
pub fn scan_file<P: AsRef<Path>>(path: P) -> Result<BTreeSet<String>> {
    Ok(open_template(path)?.placeholders())
}

/// List the placeholder names of a template held in memory.
pub fn scan_bytes(data: &[u8]) -> Result<BTreeSet<String>> {
    Ok(Template::from_bytes(data, FillOptions::default())?.placeholders())
}

/// Fill a template from a record and return the DOCX bytes.
///
/// Fails with [`Error::UnresolvedPlaceholders`] when the record has no
/// value for a text placeholder.
///
/// # Example
///
/// ```no_run
/// use docfill::{fill_bytes, FieldRecord};
///
/// let record: FieldRecord = [("ten_tram", "Trạm A12")].into_iter().collect();
/// let data = std::fs::read("template.docx").unwrap();
/// let out = fill_bytes(&data, &record).unwrap();
/// ```
pub fn fill_bytes(data: &[u8], record: &FieldRecord) -> Result<Vec<u8>> {
    Docfill::new()
        .with_values(record.clone())
        .fill_bytes(data)?
        .to_bytes()
}

/// Builder for filling a template.
///
/// Filling fails with [`Error::UnresolvedPlaceholders`] when a text
/// placeholder has no value, unless [`Docfill::allow_unresolved`] is set.
///
/// # Example
///
/// ```no_run
/// use docfill::{Docfill, ImageAsset};
///
/// let photo = ImageAsset::from_bytes(std::fs::read("mast.jpg")?)?;
/// let bytes = Docfill::new()
///     .with_image_width(10.0)
///     .with_value("ma_tram", "A12")
///     .with_image("Anh1", photo)
///     .fill("template.docx")?
///     .to_bytes()?;
/// # Ok::<(), docfill::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Docfill {
    fill_options: FillOptions,
    format_options: FormatOptions,
    values: FieldRecord,
    images: Vec<(String, ImageAsset)>,
    allow_unresolved: bool,
}

impl Docfill {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            fill_options: FillOptions::default(),
            format_options: FormatOptions::default(),
            values: FieldRecord::new(),
            images: Vec::new(),
            allow_unresolved: false,
        }
    }

    /// Skip run normalisation on load.
    pub fn raw(mut self) -> Self {
        self.fill_options = self.fill_options.raw();
        self
    }

    /// Set the picture width in centimetres.
    pub fn with_image_width(mut self, cm: f64) -> Self {
        self.fill_options = self.fill_options.with_image_width(cm);
        self
    }

    /// Set the value formatting options.
    pub fn with_format(mut self, options: FormatOptions) -> Self {
        self.format_options = options;
        self
    }

    /// Add one value.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(name, value);
        self
    }

    /// Add every value of a record. Later values win.
    pub fn with_values(mut self, record: FieldRecord) -> Self {
        self.values.merge(record);
        self
    }

    /// Add a picture for an image placeholder.
    pub fn with_image(mut self, name: impl Into<String>, asset: ImageAsset) -> Self {
        self.images.push((name.into(), asset));
        self
    }

    /// Leave placeholders without a value in place instead of failing.
    /// They are listed in [`FillResult::unresolved`].
    pub fn allow_unresolved(mut self) -> Self {
        self.allow_unresolved = true;
        self
    }

    /// Fill a template file.
    pub fn fill<P: AsRef<Path>>(self, path: P) -> Result<FillResult> {
        let template = Template::open(path, self.fill_options.clone())?;
        self.fill_template(template)
    }

    /// Fill a template held in memory.
    pub fn fill_bytes(self, data: &[u8]) -> Result<FillResult> {
        let template = Template::from_bytes(data, self.fill_options.clone())?;
        self.fill_template(template)
    }

    fn fill_template(self, mut template: Template) -> Result<FillResult> {
        let generator =
            ReportGenerator::new(ReportOptions::new().with_format(self.format_options));
        let resolution =
            generator.resolve(&template.placeholders(), &self.values, &FieldRecord::new());

        let unresolved: Vec<String> = resolution.missing.into_iter().map(|m| m.name).collect();
        if !self.allow_unresolved && !unresolved.is_empty() {
            return Err(Error::UnresolvedPlaceholders(unresolved));
        }
        for name in &unresolved {
            warn!("no value for placeholder {}; left in place", name);
        }

        let replaced = template.replace_values(
            resolution
                .values
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );

        let mut inserted = Vec::new();
        for (name, asset) in &self.images {
            if template.insert_image(name, asset)? {
                inserted.push(name.clone());
            }
        }

        Ok(FillResult {
            template,
            replaced,
            inserted,
            unresolved,
        })
    }
}

impl Default for Docfill {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of filling a template.
#[derive(Debug, Clone)]
pub struct FillResult {
    /// The filled template
    pub template: Template,
    /// Number of text substitutions made
    pub replaced: usize,
    /// Image placeholders that received a picture
    pub inserted: Vec<String>,
    /// Placeholders left without a value
    pub unresolved: Vec<String>,
}

impl FillResult {
    /// Serialize the filled document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.template.to_bytes()
    }

    /// Write the filled document to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.template.save(path)
    }

    /// Get the filled document.
    pub fn document(&self) -> &Document {
        self.template.document()
    }
}
