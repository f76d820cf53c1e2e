//! # Font Management
//!
//! Text measurement and glyph sources for the page surface.
//!
//! Layout always has metrics available: the built-in Helvetica tables cover
//! the case where no TrueType face can be found. When a face is loaded (from
//! the configured paths or the system font directories), its own advances
//! replace the built-in ones so that painted glyphs and measured widths
//! agree.

pub mod metrics;

pub use metrics::StandardFontMetrics;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::FontConfig;
use crate::style::{FontSpec, FontWeight};

/// Parsed metrics for a TrueType/OpenType face.
#[derive(Debug, Clone)]
pub struct FaceMetrics {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    advance_widths: HashMap<char, u16>,
    default_advance: u16,
}

impl FaceMetrics {
    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        // Latin, punctuation and currency blocks are all a loan letter uses.
        let ranges = [0x20u32..=0x024F, 0x2000..=0x20CF, 0x2190..=0x25FF];
        for code in ranges.into_iter().flatten() {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(glyph_id) = face.glyph_index(ch) {
                let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                advance_widths.insert(ch, advance);
                if ch == '0' {
                    default_advance = advance;
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(FaceMetrics {
            units_per_em,
            ascender: face.ascender(),
            descender: face.descender(),
            advance_widths,
            default_advance,
        })
    }

    pub fn char_width(&self, ch: char, font_size: f32) -> f32 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f32 / self.units_per_em.max(1) as f32) * font_size
    }
}

/// A loaded TrueType face: raw bytes for outline extraction plus metrics.
#[derive(Debug, Clone)]
pub struct LoadedFace {
    pub data: Arc<Vec<u8>>,
    pub metrics: FaceMetrics,
}

impl LoadedFace {
    pub fn parse(data: Vec<u8>) -> Option<Self> {
        let metrics = FaceMetrics::from_font_data(&data)?;
        Some(Self {
            data: Arc::new(data),
            metrics,
        })
    }
}

/// Shared font context used by layout and every surface.
#[derive(Debug, Clone, Default)]
pub struct FontContext {
    regular: Option<LoadedFace>,
    bold: Option<LoadedFace>,
}

impl FontContext {
    /// Built-in metrics only. Surfaces that need outlines will skip glyphs.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faces(regular: Option<LoadedFace>, bold: Option<LoadedFace>) -> Self {
        Self { regular, bold }
    }

    /// Load the configured faces, probing the system font directories for
    /// whatever is not configured.
    pub fn from_config(config: &FontConfig) -> Self {
        let regular = config
            .regular
            .as_deref()
            .and_then(load_face_file)
            .or_else(|| probe_system_face(FontWeight::Regular));
        let bold = config
            .bold
            .as_deref()
            .and_then(load_face_file)
            .or_else(|| probe_system_face(FontWeight::Bold));

        if regular.is_none() && bold.is_none() {
            tracing::warn!("no TrueType face found; text will be laid out but not painted");
        }
        Self { regular, bold }
    }

    /// The face used to paint `weight`. Bold falls back to the regular face.
    pub fn face(&self, weight: FontWeight) -> Option<&LoadedFace> {
        match weight {
            FontWeight::Regular => self.regular.as_ref(),
            FontWeight::Bold => self.bold.as_ref().or(self.regular.as_ref()),
        }
    }

    pub fn has_outlines(&self) -> bool {
        self.regular.is_some() || self.bold.is_some()
    }

    pub fn char_width(&self, ch: char, font: &FontSpec) -> f32 {
        match self.face(font.weight) {
            Some(face) => face.metrics.char_width(ch, font.size),
            None => standard_metrics(font.weight).char_width(ch, font.size),
        }
    }

    /// Measure the width of a string in layout units.
    pub fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        match self.face(font.weight) {
            Some(face) => text
                .chars()
                .map(|ch| face.metrics.char_width(ch, font.size))
                .sum(),
            None => standard_metrics(font.weight).measure_string(text, font.size),
        }
    }

    /// Distance from the top of a line box to the baseline.
    pub fn ascent(&self, font: &FontSpec) -> f32 {
        match self.face(font.weight) {
            Some(face) => {
                face.metrics.ascender as f32 / face.metrics.units_per_em.max(1) as f32 * font.size
            }
            // Helvetica ascender
            None => 0.718 * font.size,
        }
    }
}

fn standard_metrics(weight: FontWeight) -> StandardFontMetrics {
    match weight {
        FontWeight::Regular => StandardFontMetrics::HELVETICA,
        FontWeight::Bold => StandardFontMetrics::HELVETICA_BOLD,
    }
}

fn load_face_file(path: &str) -> Option<LoadedFace> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let face = LoadedFace::parse(bytes);
            if face.is_none() {
                tracing::warn!(path, "configured font is not a parseable TrueType face");
            }
            face
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "failed to read configured font");
            None
        }
    }
}

fn probe_system_face(weight: FontWeight) -> Option<LoadedFace> {
    let files: &[&str] = match weight {
        FontWeight::Regular => &[
            "DejaVuSans.ttf",
            "LiberationSans-Regular.ttf",
            "Arial.ttf",
            "arial.ttf",
            "Helvetica.ttf",
        ],
        FontWeight::Bold => &[
            "DejaVuSans-Bold.ttf",
            "LiberationSans-Bold.ttf",
            "Arial Bold.ttf",
            "arialbd.ttf",
            "Helvetica-Bold.ttf",
        ],
    };

    for dir in system_font_dirs() {
        for file in files {
            for candidate in [
                dir.join(file),
                dir.join("dejavu").join(file),
                dir.join("liberation").join(file),
            ] {
                let Ok(bytes) = std::fs::read(&candidate) else {
                    continue;
                };
                if let Some(face) = LoadedFace::parse(bytes) {
                    tracing::debug!(path = %candidate.display(), ?weight, "using system font");
                    return Some(face);
                }
            }
        }
    }
    None
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts/Supplemental"));
        dirs.push(PathBuf::from("/Library/Fonts"));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        dirs.push(PathBuf::from("/usr/share/fonts/truetype"));
        dirs.push(PathBuf::from("/usr/share/fonts/TTF"));
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
    }

    dirs
}
