//! Overlay anchor presets.
//!
//! Two materializations of the same five presets: a relative, CSS-like form
//! for live previews and an absolute pixel form for the rasterizer. Both
//! anchor each preset to the same corner or to the center.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Distance between an anchored element and the container edge.
pub const ANCHOR_MARGIN: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl Position {
    /// Parse a preset name. Unknown names fall back to bottom-right.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "top-left" | "topleft" => Position::TopLeft,
            "top-right" | "topright" => Position::TopRight,
            "bottom-left" | "bottomleft" => Position::BottomLeft,
            "bottom-right" | "bottomright" => Position::BottomRight,
            "center" | "centre" => Position::Center,
            _ => Position::BottomRight,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::TopLeft => "top-left",
            Position::TopRight => "top-right",
            Position::BottomLeft => "bottom-left",
            Position::BottomRight => "bottom-right",
            Position::Center => "center",
        }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Position::parse(&s))
    }
}

/// A CSS length in the relative form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Offset {
    Units(f32),
    Percent(f32),
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Offset::Units(v) => write!(f, "{}px", v),
            Offset::Percent(v) => write!(f, "{}%", v),
        }
    }
}

/// Relative anchor for interactive previews: edge offsets plus an optional
/// self-translation (center uses -50%/-50%).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelativeAnchor {
    pub top: Option<Offset>,
    pub right: Option<Offset>,
    pub bottom: Option<Offset>,
    pub left: Option<Offset>,
    pub translate: Option<(Offset, Offset)>,
}

impl RelativeAnchor {
    /// Inline-style rendering, e.g. `top: 20px; left: 20px;`.
    pub fn to_css(&self) -> String {
        let mut parts = Vec::new();
        let edges = [
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
            ("left", self.left),
        ];
        for (name, value) in edges {
            if let Some(v) = value {
                parts.push(format!("{}: {};", name, v));
            }
        }
        if let Some((x, y)) = self.translate {
            parts.push(format!("transform: translate({}, {});", x, y));
        }
        parts.join(" ")
    }
}

pub fn resolve_relative(preset: Position) -> RelativeAnchor {
    let m = Some(Offset::Units(ANCHOR_MARGIN));
    match preset {
        Position::TopLeft => RelativeAnchor {
            top: m,
            left: m,
            ..Default::default()
        },
        Position::TopRight => RelativeAnchor {
            top: m,
            right: m,
            ..Default::default()
        },
        Position::BottomLeft => RelativeAnchor {
            bottom: m,
            left: m,
            ..Default::default()
        },
        Position::BottomRight => RelativeAnchor {
            bottom: m,
            right: m,
            ..Default::default()
        },
        Position::Center => RelativeAnchor {
            top: Some(Offset::Percent(50.0)),
            left: Some(Offset::Percent(50.0)),
            translate: Some((Offset::Percent(-50.0), Offset::Percent(-50.0))),
            ..Default::default()
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Top-left corner of the placed element, in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

pub fn resolve_absolute(preset: Position, container: Size, element: Size) -> Point {
    let m = ANCHOR_MARGIN;
    match preset {
        Position::TopLeft => Point { x: m, y: m },
        Position::TopRight => Point {
            x: container.width - element.width - m,
            y: m,
        },
        Position::BottomLeft => Point {
            x: m,
            y: container.height - element.height - m,
        },
        Position::BottomRight => Point {
            x: container.width - element.width - m,
            y: container.height - element.height - m,
        },
        Position::Center => Point {
            x: (container.width - element.width) / 2.0,
            y: (container.height - element.height) / 2.0,
        },
    }
}
