//! Document model types.
//!
//! This module defines the typed view of WordprocessingML content that the
//! substitution engine works on (paragraphs, runs, tables), the image assets
//! it embeds, and the field records it fills templates from.

mod document;
mod paragraph;
mod resource;
mod table;
mod value;

pub use document::Document;
pub use paragraph::{Inline, Paragraph, Run, RunContent};
pub use resource::{ImageAsset, EMU_PER_CM};
pub use table::{Table, TableCell, TableRow};
pub use value::{normalize_key, FieldRecord, FieldValue};
