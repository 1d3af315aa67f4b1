//! Photo slots.
//!
//! Eight fixed slots, `Anh1`..`Anh8`, each with a label agreed with the
//! template author. Uploads are decoded, shrunk to fit 1600x1600 and
//! re-encoded as JPEG; rotation works on the held pixels so that turning
//! left then right gives back the original picture.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use log::debug;

use crate::error::{Error, Result};
use crate::model::ImageAsset;

/// Number of photo slots.
pub const SLOT_COUNT: usize = 8;

/// Longest edge of a stored photo, in pixels.
pub const MAX_EDGE: u32 = 1600;

/// JPEG quality of stored photos.
pub const JPEG_QUALITY: u8 = 85;

/// Slot labels, in slot order.
pub const SLOT_LABELS: [&str; SLOT_COUNT] = [
    "Toàn cảnh cột anten",
    "Móng M0",
    "Móng M1",
    "Móng M2",
    "Móng M3",
    "Anten & RRU",
    "Phòng máy ngoài→vào",
    "Phòng máy trong→ra",
];

/// Rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// 90° counter-clockwise
    Left,
    /// 90° clockwise
    Right,
}

impl std::str::FromStr for Rotation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" | "ccw" => Ok(Rotation::Left),
            "right" | "r" | "cw" => Ok(Rotation::Right),
            other => Err(Error::Other(format!("unknown rotation: {}", other))),
        }
    }
}

/// Placeholder name of a slot (1-based).
pub fn slot_name(slot: usize) -> String {
    format!("Anh{}", slot)
}

/// Label of a slot (1-based).
pub fn slot_label(slot: usize) -> Result<&'static str> {
    check_slot(slot).map(|i| SLOT_LABELS[i])
}

fn check_slot(slot: usize) -> Result<usize> {
    if (1..=SLOT_COUNT).contains(&slot) {
        Ok(slot - 1)
    } else {
        Err(Error::InvalidSlot(slot))
    }
}

#[derive(Debug, Clone)]
struct Photo {
    pixels: DynamicImage,
    asset: ImageAsset,
}

/// The photos held for one report request.
#[derive(Debug, Clone, Default)]
pub struct PhotoSlots {
    slots: [Option<Photo>; SLOT_COUNT],
}

impl PhotoSlots {
    /// Create an empty set of slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an uploaded picture (PNG or JPEG) in a slot.
    pub fn upload(&mut self, slot: usize, data: &[u8]) -> Result<()> {
        let index = check_slot(slot)?;
        let decoded = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .decode()?;
        let mut pixels = DynamicImage::ImageRgb8(decoded.to_rgb8());
        if pixels.width() > MAX_EDGE || pixels.height() > MAX_EDGE {
            pixels = pixels.thumbnail(MAX_EDGE, MAX_EDGE);
        }
        let asset = encode_jpeg(&pixels)?;
        debug!(
            "slot {} ({}): {}x{} px, {} bytes",
            slot,
            SLOT_LABELS[index],
            asset.width,
            asset.height,
            asset.size()
        );
        self.slots[index] = Some(Photo { pixels, asset });
        Ok(())
    }

    /// Rotate the picture in a slot. An empty slot is left alone.
    pub fn rotate(&mut self, slot: usize, rotation: Rotation) -> Result<()> {
        let index = check_slot(slot)?;
        if let Some(photo) = self.slots[index].as_mut() {
            let pixels = match rotation {
                Rotation::Left => photo.pixels.rotate270(),
                Rotation::Right => photo.pixels.rotate90(),
            };
            photo.asset = encode_jpeg(&pixels)?;
            photo.pixels = pixels;
        }
        Ok(())
    }

    /// Empty a slot.
    pub fn clear(&mut self, slot: usize) -> Result<()> {
        let index = check_slot(slot)?;
        self.slots[index] = None;
        Ok(())
    }

    /// The encoded picture of a slot, if any.
    pub fn get(&self, slot: usize) -> Option<&ImageAsset> {
        check_slot(slot)
            .ok()
            .and_then(|i| self.slots[i].as_ref())
            .map(|p| &p.asset)
    }

    /// Filled slots as (slot number, asset), in slot order.
    pub fn filled(&self) -> impl Iterator<Item = (usize, &ImageAsset)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().map(|p| (i + 1, &p.asset)))
    }

    /// Number of filled slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|p| p.is_some()).count()
    }

    /// Check if no slot is filled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn encode_jpeg(pixels: &DynamicImage) -> Result<ImageAsset> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    pixels.to_rgb8().write_with_encoder(encoder)?;
    ImageAsset::from_bytes(out)
}
