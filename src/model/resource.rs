//! Image assets embedded into documents.

use std::io::Cursor;

use image::ImageReader;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// English Metric Units per centimetre.
pub const EMU_PER_CM: f64 = 360_000.0;

/// An encoded raster image ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    /// Raw encoded bytes
    #[serde(skip_serializing, default)]
    pub data: Vec<u8>,

    /// MIME type (e.g., "image/jpeg")
    pub mime_type: String,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,
}

impl ImageAsset {
    /// Create an asset from encoded bytes, reading format and dimensions.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mime_type = Self::detect_mime_type(&data)
            .ok_or_else(|| Error::Image("unrecognised image format".into()))?;
        let (width, height) = ImageReader::new(Cursor::new(data.as_slice()))
            .with_guessed_format()?
            .into_dimensions()?;
        if width == 0 || height == 0 {
            return Err(Error::Image("image has no pixels".into()));
        }
        Ok(Self {
            data,
            mime_type: mime_type.to_string(),
            width,
            height,
        })
    }

    /// Get the size of the encoded data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get the file extension based on MIME type.
    pub fn extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpeg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            _ => "bin",
        }
    }

    /// Hex SHA-256 of the encoded bytes.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(&self.data))
    }

    /// Extent in EMU for a target width in centimetres, keeping aspect ratio.
    pub fn extent_emu(&self, width_cm: f64) -> (u64, u64) {
        let cx = (width_cm * EMU_PER_CM).round().max(1.0);
        let cy = (cx * self.height as f64 / self.width as f64).round().max(1.0);
        (cx as u64, cy as u64)
    }

    /// Detect MIME type from data magic bytes.
    pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
        if data.len() < 8 {
            return None;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some("image/jpeg");
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some("image/png");
        }

        None
    }
}
