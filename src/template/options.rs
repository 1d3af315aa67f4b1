//! Template filling options.

/// Default width of inserted pictures, in centimetres.
pub const DEFAULT_IMAGE_WIDTH_CM: f64 = 12.0;

/// Options for loading and filling a template.
#[derive(Debug, Clone, PartialEq)]
pub struct FillOptions {
    /// Width of inserted pictures in centimetres (height keeps aspect ratio)
    pub image_width_cm: f64,

    /// Whether split text runs are merged when the template is loaded
    pub normalize_runs: bool,
}

impl FillOptions {
    /// Create new fill options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the picture width in centimetres.
    pub fn with_image_width(mut self, cm: f64) -> Self {
        if cm.is_finite() && cm > 0.0 {
            self.image_width_cm = cm;
        }
        self
    }

    /// Enable or disable run normalisation on load.
    pub fn with_normalize_runs(mut self, normalize: bool) -> Self {
        self.normalize_runs = normalize;
        self
    }

    /// Keep the body markup exactly as authored.
    pub fn raw(mut self) -> Self {
        self.normalize_runs = false;
        self
    }
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            image_width_cm: DEFAULT_IMAGE_WIDTH_CM,
            normalize_runs: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_options_builder() {
        let options = FillOptions::new().with_image_width(8.5).raw();
        assert_eq!(options.image_width_cm, 8.5);
        assert!(!options.normalize_runs);
    }

    #[test]
    fn test_invalid_width_ignored() {
        let options = FillOptions::new().with_image_width(-1.0);
        assert_eq!(options.image_width_cm, DEFAULT_IMAGE_WIDTH_CM);
        assert!(options.normalize_runs);
    }
}
