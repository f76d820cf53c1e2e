//! # Drawing Surfaces
//!
//! Everything that puts ink on a page goes through the [`Surface`] trait.
//! Layout rules and the overlay compositor only know this trait, so the same
//! code paints the raster page ([`PixmapSurface`]) and produces a command
//! log for tests and previews ([`RecordingSurface`]).
//!
//! Coordinates are layout units with the origin at the top-left corner of
//! the page and y growing downwards. Text is positioned by the top of its
//! line box, not its baseline.

pub mod pixmap;

pub use pixmap::PixmapSurface;

use crate::font::FontContext;
use crate::image_loader::LoadedImage;
use crate::position::{Point, Size};
use crate::style::{Color, FontSpec};

/// Z-order layers of a page. Drawing must happen in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background = 0,
    Watermark = 1,
    Content = 2,
    Stamp = 10,
}

impl Layer {
    pub fn z_index(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// A page-sized drawing target for one render.
pub trait Surface {
    /// Page size in layout units.
    fn size(&self) -> Size;

    fn fonts(&self) -> &FontContext;

    fn measure_text(&self, text: &str, font: &FontSpec) -> f32 {
        self.fonts().measure(text, font)
    }

    /// Switch the layer subsequent calls draw on.
    fn set_layer(&mut self, layer: Layer);

    fn clear(&mut self, color: Color);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32);

    fn stroke_line(&mut self, from: Point, to: Point, color: Color, width: f32);

    /// Draw a single line of text whose line box starts at (`x`, `y`).
    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: &FontSpec, color: Color);

    /// Draw text centered on `center`, rotated clockwise by `degrees`.
    fn fill_text_rotated(
        &mut self,
        text: &str,
        center: Point,
        degrees: f32,
        font: &FontSpec,
        color: Color,
    );

    /// Stretch `image` into `dest`. `dest` may extend past the page; the
    /// overflow is clipped.
    fn draw_image(&mut self, image: &LoadedImage, dest: Rect, opacity: f32);
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        color: Color,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        width: f32,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f32,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        font: FontSpec,
        color: Color,
    },
    RotatedText {
        text: String,
        center: Point,
        degrees: f32,
        font: FontSpec,
        color: Color,
    },
    Image {
        width_px: u32,
        height_px: u32,
        dest: Rect,
        opacity: f32,
    },
}

/// A surface that paints nothing and records every call with its layer.
#[derive(Debug)]
pub struct RecordingSurface {
    size: Size,
    fonts: FontContext,
    layer: Layer,
    commands: Vec<(Layer, DrawCommand)>,
}

impl RecordingSurface {
    pub fn new(size: Size, fonts: FontContext) -> Self {
        Self {
            size,
            fonts,
            layer: Layer::Content,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[(Layer, DrawCommand)] {
        &self.commands
    }

    /// Text runs in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|(_, cmd)| match cmd {
                DrawCommand::Text { text, .. } | DrawCommand::RotatedText { text, .. } => {
                    Some(text.as_str())
                }
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, command: DrawCommand) {
        self.commands.push((self.layer, command));
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    fn set_layer(&mut self, layer: Layer) {
        self.layer = layer;
    }

    fn clear(&mut self, color: Color) {
        self.record(DrawCommand::Clear { color });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.record(DrawCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32) {
        self.record(DrawCommand::StrokeRect { rect, color, width });
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        self.record(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: &FontSpec, color: Color) {
        self.record(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            font: *font,
            color,
        });
    }

    fn fill_text_rotated(
        &mut self,
        text: &str,
        center: Point,
        degrees: f32,
        font: &FontSpec,
        color: Color,
    ) {
        self.record(DrawCommand::RotatedText {
            text: text.to_string(),
            center,
            degrees,
            font: *font,
            color,
        });
    }

    fn draw_image(&mut self, image: &LoadedImage, dest: Rect, opacity: f32) {
        self.record(DrawCommand::Image {
            width_px: image.width(),
            height_px: image.height(),
            dest,
            opacity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_keeps_layer() {
        let mut surface = RecordingSurface::new(Size::new(100.0, 100.0), FontContext::new());
        surface.set_layer(Layer::Background);
        surface.clear(Color::WHITE);
        surface.set_layer(Layer::Stamp);
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK);

        let layers: Vec<Layer> = surface.commands().iter().map(|(l, _)| *l).collect();
        assert_eq!(layers, vec![Layer::Background, Layer::Stamp]);
    }

    #[test]
    fn test_layer_z_indices() {
        assert_eq!(Layer::Background.z_index(), 0);
        assert_eq!(Layer::Watermark.z_index(), 1);
        assert_eq!(Layer::Content.z_index(), 2);
        assert_eq!(Layer::Stamp.z_index(), 10);
    }

    #[test]
    fn test_measure_uses_font_context() {
        let surface = RecordingSurface::new(Size::new(100.0, 100.0), FontContext::new());
        let font = FontSpec::regular(10.0);
        assert_eq!(
            surface.measure_text("abc", &font),
            FontContext::new().measure("abc", &font)
        );
    }
}
