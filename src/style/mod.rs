//! # Style Primitives
//!
//! Colors and font selections shared by the layout rules, the overlay
//! compositor and every surface implementation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An RGBA color with channels in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rgb` or `#rrggbb`. Anything else falls back to black.
    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Color::BLACK;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
        let (r, g, b) = match hex.len() {
            3 => (
                channel(&hex[0..1].repeat(2)),
                channel(&hex[1..2].repeat(2)),
                channel(&hex[2..3].repeat(2)),
            ),
            6 => (channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6])),
            _ => (0, 0, 0),
        };
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    pub fn to_hex(&self) -> String {
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", to_u8(self.r), to_u8(self.g), to_u8(self.b))
    }

    /// The same color with its alpha multiplied by `opacity`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: (self.a * opacity).clamp(0.0, 1.0),
            ..self
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

// Colors travel as CSS hex strings in template JSON.
impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Color::hex(&s))
    }
}

/// Palette used by the body layout rules.
pub mod palette {
    use super::Color;

    pub const TEXT: Color = Color::rgb(0.13, 0.13, 0.13);
    pub const HEADING: Color = Color::rgb(0.05, 0.20, 0.45);
    pub const RULE: Color = Color::rgb(0.05, 0.20, 0.45);
    pub const LABEL: Color = Color::rgb(0.20, 0.20, 0.20);
    pub const VALUE: Color = Color::rgb(0.05, 0.20, 0.45);
    /// Background behind highlighted values and financial tokens.
    pub const HIGHLIGHT: Color = Color::rgb(0.91, 0.95, 1.0);
    pub const FINANCIAL: Color = Color::rgb(0.0, 0.39, 0.20);
    pub const NOTICE_FILL: Color = Color::rgb(1.0, 0.97, 0.88);
    pub const NOTICE_BORDER: Color = Color::rgb(0.85, 0.60, 0.10);
}

/// Font weight. Only two faces are ever used on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// A font selection for one text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub size: f32,
    pub weight: FontWeight,
}

impl FontSpec {
    pub const fn regular(size: f32) -> Self {
        Self {
            size,
            weight: FontWeight::Regular,
        }
    }

    pub const fn bold(size: f32) -> Self {
        Self {
            size,
            weight: FontWeight::Bold,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.weight == FontWeight::Bold
    }
}
