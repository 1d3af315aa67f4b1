//! Template loading, filling and saving.
//!
//! A [`Template`] owns an in-memory copy of a DOCX package. Text and images
//! are substituted into the body; nothing is written anywhere until
//! [`Template::to_bytes`] has checked that every picture reference resolves.

mod image;
mod normalize;
mod options;
mod placeholder;
mod text;

pub use image::{count_matches, drawing_run, insert_picture, InlinePicture};
pub use normalize::normalize_markup;
pub use options::{FillOptions, DEFAULT_IMAGE_WIDTH_CM};
pub use placeholder::{
    compact, contains_loosely, image_slot, replace_tokens, scan_placeholders, Spelling,
    Substitution,
};
pub use text::{replace_all_spellings, replace_spelling, replace_values, substitute};

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Document, ImageAsset};
use crate::package::relationships::resolve_target;
use crate::package::{
    ContentTypes, Package, Relationships, CONTENT_TYPES_PART, DOCUMENT_PART, DOCUMENT_RELS_PART,
    IMAGE_RELATIONSHIP_TYPE,
};

/// A DOCX template being filled.
#[derive(Debug, Clone)]
pub struct Template {
    package: Package,
    document: Document,
    relationships: Relationships,
    content_types: ContentTypes,
    options: FillOptions,
    body_modified: bool,
    parts_modified: bool,
    media: HashMap<String, String>,
    next_drawing_id: u32,
}

impl Template {
    /// Open a template from DOCX bytes.
    pub fn from_bytes(data: impl Into<Vec<u8>>, options: FillOptions) -> Result<Self> {
        let package = Package::from_bytes(data)?;

        let original = package.read_text(DOCUMENT_PART)?.ok_or_else(|| {
            Error::TemplateUnreadable(format!("package has no {} part", DOCUMENT_PART))
        })?;
        let markup = if options.normalize_runs {
            normalize_markup(&original)
        } else {
            original.clone()
        };
        let body_modified = markup != original;
        let document = Document::parse(&markup)?;

        let relationships = match package.read_text(DOCUMENT_RELS_PART)? {
            Some(xml) => Relationships::parse(&xml)?,
            None => Relationships::empty(),
        };
        let content_types = match package.read_text(CONTENT_TYPES_PART)? {
            Some(xml) => ContentTypes::parse(&xml)?,
            None => {
                return Err(Error::TemplateUnreadable(format!(
                    "package has no {} part",
                    CONTENT_TYPES_PART
                )))
            }
        };

        let next_drawing_id = document.max_drawing_id() + 1;
        debug!(
            "template loaded: {} parts, normalised={}",
            package.part_names().count(),
            body_modified
        );

        Ok(Self {
            package,
            document,
            relationships,
            content_types,
            options,
            body_modified,
            parts_modified: false,
            media: HashMap::new(),
            next_drawing_id,
        })
    }

    /// Open a template file.
    pub fn open<P: AsRef<Path>>(path: P, options: FillOptions) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(data, options)
    }

    /// The body document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The options the template was opened with.
    pub fn options(&self) -> &FillOptions {
        &self.options
    }

    /// Distinct placeholder names present in the body.
    ///
    /// Names are scanned per paragraph over the logical text, which is the
    /// same text substitution works on.
    pub fn placeholders(&self) -> BTreeSet<String> {
        self.document
            .paragraphs()
            .iter()
            .flat_map(|p| scan_placeholders(&p.plain_text()))
            .collect()
    }

    /// Replace a placeholder in all its spellings. Returns the count.
    pub fn replace_text(&mut self, name: &str, value: &str) -> usize {
        let count = replace_all_spellings(&mut self.document, name, value);
        if count > 0 {
            debug!("replaced {} occurrence(s) of {}", count, name);
            self.body_modified = true;
        }
        count
    }

    /// Replace several placeholders in a single scan of each paragraph.
    ///
    /// Values go in literally: a token inside a value is never expanded.
    /// Returns the total count.
    pub fn replace_values<'a, I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let values: Vec<(&str, &str)> = values.into_iter().collect();
        let count = text::replace_values(&mut self.document, &values);
        if count > 0 {
            debug!("replaced {} occurrence(s) of {} name(s)", count, values.len());
            self.body_modified = true;
        }
        count
    }

    /// Replace one spelling of a placeholder. Returns the count.
    pub fn replace_text_spelling(&mut self, name: &str, spelling: Spelling, value: &str) -> usize {
        let count = replace_spelling(&mut self.document, name, spelling, value);
        if count > 0 {
            self.body_modified = true;
        }
        count
    }

    /// Insert a picture at the default width. See [`Template::insert_image_with_width`].
    pub fn insert_image(&mut self, name: &str, asset: &ImageAsset) -> Result<bool> {
        self.insert_image_with_width(name, asset, self.options.image_width_cm)
    }

    /// Replace every paragraph carrying the placeholder with the picture.
    ///
    /// Returns `false` when the placeholder is not in the template; the
    /// package is then left untouched.
    pub fn insert_image_with_width(
        &mut self,
        name: &str,
        asset: &ImageAsset,
        width_cm: f64,
    ) -> Result<bool> {
        if count_matches(&self.document, name) == 0 {
            warn!("image placeholder {} not found; skipping", name);
            return Ok(false);
        }

        let rel_id = self.register_media(asset);
        let (cx, cy) = asset.extent_emu(width_cm);
        let picture = InlinePicture {
            rel_id,
            cx,
            cy,
            name: name.to_string(),
        };
        let inserted = insert_picture(
            &mut self.document,
            name,
            &picture,
            &mut self.next_drawing_id,
        )?;
        debug!(
            "inserted image {} into {} paragraph(s) as {}",
            name, inserted, picture.rel_id
        );
        self.body_modified = true;
        Ok(inserted > 0)
    }

    /// Add the media part once per distinct image and return its relationship ID.
    fn register_media(&mut self, asset: &ImageAsset) -> String {
        let digest = asset.digest();
        if let Some(rel_id) = self.media.get(&digest) {
            return rel_id.clone();
        }

        let ext = asset.extension().to_string();
        let mut n = self.media.len() + 1;
        let part = loop {
            let candidate = format!("word/media/docfill_image{}.{}", n, ext);
            if !self.package.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };

        self.package.write_part(part.clone(), asset.data.clone());
        self.content_types.ensure_default(&ext, &asset.mime_type);
        let target = part.trim_start_matches("word/").to_string();
        let rel_id = self.relationships.add(IMAGE_RELATIONSHIP_TYPE, &target);
        self.parts_modified = true;
        self.media.insert(digest, rel_id.clone());
        rel_id
    }

    /// Serialize the filled template.
    ///
    /// Fails with [`Error::InconsistentPackage`] when a picture reference or
    /// media part does not resolve. Untouched parts are copied verbatim.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut package = self.package.clone();
        if self.body_modified {
            package.write_part(DOCUMENT_PART, self.document.to_xml().into_bytes());
        }
        if self.parts_modified {
            package.write_part(DOCUMENT_RELS_PART, self.relationships.to_xml().into_bytes());
            package.write_part(CONTENT_TYPES_PART, self.content_types.to_xml().into_bytes());
        }

        self.verify(&package)?;
        let bytes = package.to_bytes()?;

        // The result must open again as a template.
        let reopened = Package::from_bytes(bytes.as_slice())
            .map_err(|e| Error::InconsistentPackage(e.to_string()))?;
        let body = reopened
            .read_text(DOCUMENT_PART)
            .map_err(|e| Error::InconsistentPackage(e.to_string()))?
            .ok_or_else(|| {
                Error::InconsistentPackage(format!("{} missing after save", DOCUMENT_PART))
            })?;
        Document::parse(&body).map_err(|e| Error::InconsistentPackage(e.to_string()))?;

        Ok(bytes)
    }

    /// Write the filled template to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }

    fn verify(&self, package: &Package) -> Result<()> {
        for id in self.document.embedded_ids() {
            if self.relationships.get(&id).is_none() {
                return Err(Error::InconsistentPackage(format!(
                    "picture references unknown relationship {}",
                    id
                )));
            }
        }
        for rel in self.relationships.entries() {
            if rel.external || rel.rel_type != IMAGE_RELATIONSHIP_TYPE {
                continue;
            }
            let part = resolve_target(DOCUMENT_PART, &rel.target);
            if !package.contains(&part) {
                return Err(Error::InconsistentPackage(format!(
                    "relationship {} points at missing part {}",
                    rel.id, part
                )));
            }
            if package.is_modified(&part) && !self.content_types.covers(&part) {
                return Err(Error::InconsistentPackage(format!(
                    "no content type registered for {}",
                    part
                )));
            }
        }
        Ok(())
    }
}
