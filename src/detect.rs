//! DOCX format detection and validation.

use crate::error::{Error, Result};
use crate::package::{CONTENT_TYPES_PART, DOCUMENT_PART};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use zip::ZipArchive;

/// DOCX package information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxFormat {
    /// Number of parts in the archive
    pub part_count: usize,
    /// Number of parts under `word/media/`
    pub media_count: usize,
    /// Whether the package carries a VBA project (`.docm`)
    pub macro_enabled: bool,
}

impl std::fmt::Display for DocxFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.macro_enabled { "DOCM" } else { "DOCX" };
        write!(
            f,
            "{} ({} parts, {} media)",
            kind, self.part_count, self.media_count
        )
    }
}

/// Local file header signature of a ZIP archive: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

const VBA_PART: &str = "word/vbaProject.bin";

/// Detect a DOCX package from a file path.
///
/// # Example
/// ```no_run
/// use docfill::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("template.docx").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocxFormat> {
    let data = fs::read(path)?;
    detect_format_from_bytes(&data)
}

/// Detect a DOCX package from bytes.
///
/// # Returns
/// * `Ok(DocxFormat)` if the data is a ZIP archive holding a Word body part
/// * `Err(Error::TemplateUnreadable)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<DocxFormat> {
    if !data.starts_with(ZIP_MAGIC) {
        return Err(Error::TemplateUnreadable("not a ZIP archive".to_string()));
    }

    let archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| Error::TemplateUnreadable(format!("corrupt archive: {}", e)))?;
    let names: Vec<&str> = archive.file_names().collect();

    for required in [DOCUMENT_PART, CONTENT_TYPES_PART] {
        if !names.contains(&required) {
            return Err(Error::TemplateUnreadable(format!(
                "package has no {} part",
                required
            )));
        }
    }

    Ok(DocxFormat {
        part_count: names.len(),
        media_count: names.iter().filter(|n| n.starts_with("word/media/")).count(),
        macro_enabled: names.contains(&VBA_PART),
    })
}

/// Check if a file is a DOCX package.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes hold a DOCX package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
