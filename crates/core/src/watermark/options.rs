//! Watermark appearance options.

use vitrine_shared::WatermarkConfig;

use super::error::WatermarkError;

/// RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
}

impl Rgb {
    /// Black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a color from unit-range components.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Hex form (`RRGGBB`, no leading `#`) used by DrawingML.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!(
            "{:02X}{:02X}{:02X}",
            unit_to_byte(self.r),
            unit_to_byte(self.g),
            unit_to_byte(self.b)
        )
    }

    fn is_valid(self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// How a watermark looks.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkOptions {
    /// Text to stamp.
    pub text: String,
    /// Opacity from 0.0 (invisible) to 1.0 (opaque).
    pub opacity: f32,
    /// Font size in points.
    pub font_size: f32,
    /// Fill color.
    pub color: Rgb,
    /// Rotation in degrees, clockwise. Only slides are rotated; PDF pages
    /// get a horizontal overlay.
    pub angle: f32,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: "123".to_string(),
            opacity: 0.1,
            font_size: 24.0,
            color: Rgb::BLACK,
            angle: -45.0,
        }
    }
}

impl WatermarkOptions {
    /// Options with the given text and library defaults for the rest.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the opacity.
    #[must_use]
    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Set the font size.
    #[must_use]
    pub fn font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Check that the options can be rendered.
    ///
    /// # Errors
    ///
    /// Returns [`WatermarkError::InvalidOptions`] for empty text, an opacity
    /// or color outside the unit range, or a non-positive font size.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.text.trim().is_empty() {
            return Err(WatermarkError::invalid_options("text must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(WatermarkError::invalid_options(format!(
                "opacity must be between 0 and 1, got {}",
                self.opacity
            )));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(WatermarkError::invalid_options(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        if !self.color.is_valid() {
            return Err(WatermarkError::invalid_options(
                "color components must be between 0 and 1",
            ));
        }
        Ok(())
    }
}

impl From<&WatermarkConfig> for WatermarkOptions {
    fn from(config: &WatermarkConfig) -> Self {
        Self::with_text(config.text.clone())
            .opacity(config.opacity)
            .font_size(config.font_size)
    }
}
