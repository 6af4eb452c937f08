//! Chart style configuration.
//!
//! Deserialized from an optional TOML file passed with `--style`. Every field
//! has a default, so a partial file only overrides what it names:
//!
//! ```toml
//! dpi = 150
//! colors = ["#2ca02c", "#d62728"]
//! annotate_threshold = 250.0
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::StyleError;

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Pure white.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Construct a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` color.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::InvalidColor`] for anything else.
    pub fn from_hex(s: &str) -> Result<Self, StyleError> {
        let invalid = || StyleError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Mix `self` over `dst` with coverage `alpha` in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn blend_over(self, dst: Self, alpha: f32) -> Self {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |s: u8, d: u8| (f32::from(s) * a + f32::from(d) * (1.0 - a)).round() as u8;
        Self::new(mix(self.r, dst.r), mix(self.g, dst.g), mix(self.b, dst.b))
    }
}

impl TryFrom<String> for Rgb {
    type Error = StyleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

/// Visual parameters of the comparison chart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartStyle {
    /// Figure width in inches.
    pub width_in: f32,
    /// Figure height in inches.
    pub height_in: f32,
    /// Output resolution in dots per inch.
    pub dpi: u32,
    /// Width of each bar as a fraction of one configuration slot.
    pub bar_width: f32,
    /// Bar opacity.
    pub bar_alpha: f32,
    /// Bar colors for the first and second report.
    pub colors: [Rgb; 2],
    /// Annotate every n-th configuration.
    pub annotate_every: usize,
    /// Only annotate a pair when either bar exceeds this value.
    pub annotate_threshold: f64,
    /// Title override. Defaults to "MHA Performance Comparison: a vs b".
    pub title: Option<String>,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width_in: 16.0,
            height_in: 10.0,
            dpi: 300,
            bar_width: 0.35,
            bar_alpha: 0.8,
            colors: [Rgb::new(0x1f, 0x77, 0xb4), Rgb::new(0xff, 0x7f, 0x0e)],
            annotate_every: 3,
            annotate_threshold: 100.0,
            title: None,
        }
    }
}

impl ChartStyle {
    /// Load a style from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`StyleError`] if the file cannot be read, does not parse,
    /// or holds out-of-range values.
    pub fn load(path: &Path) -> Result<Self, StyleError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a style from TOML text.
    ///
    /// # Errors
    ///
    /// See [`ChartStyle::load`].
    pub fn from_toml(content: &str) -> Result<Self, StyleError> {
        let style: Self = toml::from_str(content)?;
        style.validate()?;
        Ok(style)
    }

    /// Check that every value is usable for rendering.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.dpi == 0 {
            return Err(StyleError::Invalid("dpi must be positive".into()));
        }
        if !(self.width_in > 0.0 && self.height_in > 0.0) {
            return Err(StyleError::Invalid("figure size must be positive".into()));
        }
        if !(self.bar_width > 0.0 && self.bar_width <= 0.5) {
            return Err(StyleError::Invalid("bar_width must be in (0, 0.5]".into()));
        }
        if !(0.0..=1.0).contains(&self.bar_alpha) {
            return Err(StyleError::Invalid("bar_alpha must be in [0, 1]".into()));
        }
        if self.annotate_every == 0 {
            return Err(StyleError::Invalid("annotate_every must be at least 1".into()));
        }
        Ok(())
    }
}
