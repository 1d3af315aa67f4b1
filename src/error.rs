//! Error types for docfill.

use std::io;
use thiserror::Error;

/// Result type alias for docfill operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while filling templates and generating reports.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The template archive or its body part is missing or corrupt.
    #[error("Unreadable template: {0}")]
    TemplateUnreadable(String),

    /// A package part other than the body holds malformed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// ZIP container read or write failure.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Placeholders that could not be mapped to any known field.
    #[error("Unresolved placeholders: {}", .0.join(", "))]
    UnresolvedPlaceholders(Vec<String>),

    /// No station record matches the code.
    #[error("Station not found: {0}")]
    StationNotFound(String),

    /// The station exists but has no financial record for the period.
    #[error("No data for station {station} in period {period}")]
    NoDataForPeriod {
        /// Station code
        station: String,
        /// Requested period
        period: String,
    },

    /// The submitted secret does not match the stored reference.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Photo slot index outside 1..=8.
    #[error("Photo slot {0} is out of range (expected 1-8)")]
    InvalidSlot(usize),

    /// Image decoding or encoding failure.
    #[error("Image error: {0}")]
    Image(String),

    /// Part cross-references are broken after modification.
    #[error("Inconsistent package: {0}")]
    InconsistentPackage(String),

    /// The record workbook cannot be read.
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the caller can recover by supplying more input and retrying.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::UnresolvedPlaceholders(_))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Archive(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

impl From<calamine::Error> for Error {
    fn from(err: calamine::Error) -> Self {
        Error::Workbook(err.to_string())
    }
}
