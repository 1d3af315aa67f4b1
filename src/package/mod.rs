//! OOXML package (ZIP container) access.
//!
//! A [`Package`] keeps the original archive bytes and records only the parts
//! that were replaced or added. Saving copies every untouched entry with
//! [`zip::ZipWriter::raw_copy_file`], so those parts leave the container
//! byte-identical (same compressed stream, same CRC).

pub mod relationships;
pub mod xml;

pub use relationships::{ContentTypes, Relationship, Relationships, IMAGE_RELATIONSHIP_TYPE};
pub use xml::{Element, Node, XmlTree};

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// Main document part of a WordprocessingML package.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Relationships of the main document part.
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

/// Content types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// An opened OOXML package.
#[derive(Debug, Clone)]
pub struct Package {
    source: Vec<u8>,
    names: Vec<String>,
    overrides: BTreeMap<String, Vec<u8>>,
    added: Vec<String>,
}

impl Package {
    /// Open a package from archive bytes.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Result<Self> {
        let source = data.into();
        let mut archive = ZipArchive::new(Cursor::new(source.as_slice()))
            .map_err(|e| Error::TemplateUnreadable(format!("not a ZIP container: {}", e)))?;
        let mut names = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let file = archive
                .by_index_raw(i)
                .map_err(|e| Error::TemplateUnreadable(format!("corrupt entry #{}: {}", i, e)))?;
            names.push(file.name().to_string());
        }
        Ok(Self {
            source,
            names,
            overrides: BTreeMap::new(),
            added: Vec::new(),
        })
    }

    /// Entry names in archive order, followed by added parts.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .chain(self.added.iter())
            .map(String::as_str)
    }

    /// Check whether a part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.overrides.contains_key(name) || self.names.iter().any(|n| n == name)
    }

    /// Read a part's bytes (modified content if the part was replaced).
    pub fn read_part(&self, name: &str) -> Result<Option<Vec<u8>>> {
        if let Some(data) = self.overrides.get(name) {
            return Ok(Some(data.clone()));
        }
        if !self.names.iter().any(|n| n == name) {
            return Ok(None);
        }
        let mut archive = ZipArchive::new(Cursor::new(self.source.as_slice()))
            .map_err(|e| unreadable(name, e))?;
        let mut file = archive.by_name(name).map_err(|e| unreadable(name, e))?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data).map_err(|e| unreadable(name, e))?;
        Ok(Some(data))
    }

    /// Read a part as UTF-8 text.
    pub fn read_text(&self, name: &str) -> Result<Option<String>> {
        match self.read_part(name)? {
            Some(data) => String::from_utf8(data)
                .map(Some)
                .map_err(|_| Error::TemplateUnreadable(format!("{} is not valid UTF-8", name))),
            None => Ok(None),
        }
    }

    /// Replace an existing part or add a new one.
    pub fn write_part(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        if !self.names.contains(&name) && !self.added.contains(&name) {
            self.added.push(name.clone());
        }
        self.overrides.insert(name, data);
    }

    /// Whether a part was replaced or added since opening.
    pub fn is_modified(&self, name: &str) -> bool {
        self.overrides.contains_key(name)
    }

    /// Serialize the package to archive bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(self.source.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(self.source.len())));

        for i in 0..archive.len() {
            let name = archive.by_index_raw(i)?.name().to_string();
            match self.overrides.get(&name) {
                Some(data) => {
                    writer.start_file(name.as_str(), part_options(&name))?;
                    writer.write_all(data)?;
                }
                None => {
                    let file = archive.by_index_raw(i)?;
                    writer.raw_copy_file(file)?;
                }
            }
        }

        for name in &self.added {
            let data = self
                .overrides
                .get(name)
                .ok_or_else(|| Error::InconsistentPackage(format!("added part {} has no data", name)))?;
            writer.start_file(name.as_str(), part_options(name))?;
            writer.write_all(data)?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}

/// Media is already compressed, so it is stored; markup is deflated.
fn unreadable(part: &str, e: impl std::fmt::Display) -> Error {
    Error::TemplateUnreadable(format!("cannot read {}: {}", part, e))
}

fn part_options(name: &str) -> SimpleFileOptions {
    let method = if name.starts_with("word/media/") {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    };
    SimpleFileOptions::default().compression_method(method)
}
