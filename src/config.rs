//! Render configuration.
//!
//! Every field has a default, so an empty JSON object is a complete config.
//! The defaults reproduce the A4-at-96-DPI page the templates are designed
//! for.

use serde::{Deserialize, Serialize};

use crate::LoandocError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    pub page: PageGeometry,
    pub typography: Typography,
    /// Device pixels per layout unit.
    pub raster_scale: f32,
    /// JPEG quality for the container's page image (1-100).
    pub jpeg_quality: u8,
    pub brand: BrandAssets,
    pub fonts: FontConfig,
    /// When set, the container carries a document information dictionary.
    pub document_title: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            typography: Typography::default(),
            raster_scale: 1.0,
            jpeg_quality: 92,
            brand: BrandAssets::default(),
            fonts: FontConfig::default(),
            document_title: None,
        }
    }
}

impl RenderConfig {
    pub fn from_json(json: &str) -> Result<Self, LoandocError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Raster dimensions in device pixels.
    pub fn raster_size(&self) -> Result<(u32, u32), LoandocError> {
        let scale = self.raster_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(LoandocError::InvalidConfiguration(format!(
                "raster scale must be positive, got {}",
                scale
            )));
        }
        let w = (self.page.width * scale).round();
        let h = (self.page.height * scale).round();
        if w < 1.0 || h < 1.0 || w > 16384.0 || h > 16384.0 {
            return Err(LoandocError::InvalidConfiguration(format!(
                "raster size {}x{} is out of range",
                w, h
            )));
        }
        Ok((w as u32, h as u32))
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality.clamp(1, 100)
    }
}

/// Page geometry in layout units (CSS pixels at 96 DPI).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    /// Header band height used when no header art is drawn.
    pub header_band: f32,
    /// Footer band height used when no footer art is drawn.
    pub footer_band: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 794.0,
            height: 1123.0,
            margin_left: 60.0,
            margin_right: 60.0,
            margin_top: 60.0,
            margin_bottom: 60.0,
            header_band: 80.0,
            footer_band: 60.0,
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Typography {
    pub body_size: f32,
    pub line_height: f32,
    pub heading_size: f32,
    pub headline_size: f32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            body_size: 12.5,
            line_height: 20.0,
            heading_size: 14.0,
            headline_size: 20.0,
        }
    }
}

/// Header/footer art shared by every template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandAssets {
    pub header: Option<String>,
    pub footer: Option<String>,
}

/// TrueType files used to paint glyphs. Unset entries are probed from the
/// system font directories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontConfig {
    pub regular: Option<String>,
    pub bold: Option<String>,
}
