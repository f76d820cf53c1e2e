//! Raster surface backed by a tiny-skia pixmap.
//!
//! Layout units are scaled by the configured raster scale on the way in.
//! Glyphs are filled from TrueType outlines; the pen advances by the same
//! widths the layout rules measured, so wrapped lines never drift from
//! their measured extents.
//!
//! Outlines are extracted once per weight and character and kept in font
//! units for the lifetime of the surface. A face is only parsed when a run
//! brings characters the cache has not seen yet.

use std::collections::HashMap;

use tiny_skia as sk;
use ttf_parser::{GlyphId, OutlineBuilder};

use super::{Layer, Rect, Surface};
use crate::font::FontContext;
use crate::image_loader::LoadedImage;
use crate::position::{Point, Size};
use crate::style::{Color, FontSpec, FontWeight};
use crate::LoandocError;

/// Glyph outlines in font units, y flipped. `None` for blank or missing glyphs.
type OutlineCache = HashMap<(FontWeight, char), Option<sk::Path>>;

pub struct PixmapSurface {
    pixmap: sk::Pixmap,
    size: Size,
    scale: f32,
    fonts: FontContext,
    layer: Layer,
    outlines: OutlineCache,
}

impl PixmapSurface {
    /// A transparent surface of `size` layout units at `scale` device pixels
    /// per unit.
    pub fn new(size: Size, scale: f32, fonts: FontContext) -> Result<Self, LoandocError> {
        let width_px = (size.width * scale).round();
        let height_px = (size.height * scale).round();
        let pixmap = sk::Pixmap::new(width_px as u32, height_px as u32).ok_or_else(|| {
            LoandocError::InvalidConfiguration(format!(
                "invalid raster size {}x{} at scale {}",
                width_px, height_px, scale
            ))
        })?;
        Ok(Self {
            pixmap,
            size,
            scale,
            fonts,
            layer: Layer::Content,
            outlines: HashMap::new(),
        })
    }

    pub fn width_px(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height_px(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Finish the render and hand back straight (non-premultiplied) RGBA.
    pub fn into_rgba(self) -> image::RgbaImage {
        let (w, h) = (self.pixmap.width(), self.pixmap.height());
        let mut out = Vec::with_capacity((w * h * 4) as usize);
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        // Buffer length is exactly w*h*4 by construction.
        image::RgbaImage::from_raw(w, h, out).unwrap_or_else(|| image::RgbaImage::new(w, h))
    }

    fn base_transform(&self) -> sk::Transform {
        sk::Transform::from_scale(self.scale, self.scale)
    }

    /// Make sure every character of `text` has a cached outline for `weight`.
    fn cache_outlines(&mut self, text: &str, weight: FontWeight) {
        let missing: Vec<char> = text
            .chars()
            .filter(|ch| !self.outlines.contains_key(&(weight, *ch)))
            .collect();
        if missing.is_empty() {
            return;
        }
        let Some(loaded) = self.fonts.face(weight) else {
            return;
        };
        let face = ttf_parser::Face::parse(&loaded.data, 0).ok();
        for ch in missing {
            let outline = face.as_ref().and_then(|face| {
                let gid = face.glyph_index(ch)?;
                let mut builder = GlyphPathBuilder::new();
                face.outline_glyph(GlyphId(gid.0), &mut builder)?;
                builder.finish()
            });
            self.outlines.insert((weight, ch), outline);
        }
    }

    fn draw_glyph_run(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        font: &FontSpec,
        color: Color,
        transform: sk::Transform,
    ) {
        let Some(units) = self
            .fonts
            .face(font.weight)
            .map(|f| f.metrics.units_per_em.max(1) as f32)
        else {
            return;
        };
        self.cache_outlines(text, font.weight);

        let glyph_scale = font.size / units;
        let baseline = y + self.fonts.ascent(font);
        let paint = fill_paint(color);

        let mut pen_x = x;
        for ch in text.chars() {
            if let Some(Some(path)) = self.outlines.get(&(font.weight, ch)) {
                let placed = transform.pre_concat(sk::Transform::from_row(
                    glyph_scale,
                    0.0,
                    0.0,
                    glyph_scale,
                    pen_x,
                    baseline,
                ));
                self.pixmap
                    .fill_path(path, &paint, sk::FillRule::Winding, placed, None);
            }
            pen_x += self.fonts.char_width(ch, font);
        }
    }
}

impl Surface for PixmapSurface {
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
        self.pixmap.fill(to_sk_color(color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(r) = sk::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) else {
            return;
        };
        let transform = self.base_transform();
        self.pixmap.fill_rect(r, &fill_paint(color), transform, None);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32) {
        let Some(r) = sk::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) else {
            return;
        };
        let path = sk::PathBuilder::from_rect(r);
        let stroke = sk::Stroke {
            width,
            ..Default::default()
        };
        let transform = self.base_transform();
        self.pixmap
            .stroke_path(&path, &fill_paint(color), &stroke, transform, None);
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        let mut pb = sk::PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = sk::Stroke {
            width,
            ..Default::default()
        };
        let transform = self.base_transform();
        self.pixmap
            .stroke_path(&path, &fill_paint(color), &stroke, transform, None);
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: &FontSpec, color: Color) {
        let transform = self.base_transform();
        self.draw_glyph_run(text, x, y, font, color, transform);
    }

    fn fill_text_rotated(
        &mut self,
        text: &str,
        center: Point,
        degrees: f32,
        font: &FontSpec,
        color: Color,
    ) {
        let width = self.fonts.measure(text, font);
        let transform = self
            .base_transform()
            .pre_concat(sk::Transform::from_rotate_at(degrees, center.x, center.y));
        self.draw_glyph_run(
            text,
            center.x - width / 2.0,
            center.y - font.size / 2.0,
            font,
            color,
            transform,
        );
    }

    fn draw_image(&mut self, image: &LoadedImage, dest: Rect, opacity: f32) {
        let Some(src) = to_pixmap(image) else {
            return;
        };
        if dest.width <= 0.0 || dest.height <= 0.0 {
            return;
        }
        let paint = sk::PixmapPaint {
            opacity: opacity.clamp(0.0, 1.0),
            quality: sk::FilterQuality::Bilinear,
            ..Default::default()
        };
        let transform = self
            .base_transform()
            .pre_translate(dest.x, dest.y)
            .pre_scale(
                dest.width / src.width() as f32,
                dest.height / src.height() as f32,
            );
        self.pixmap
            .draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
    }
}

/// Premultiply straight RGBA into a pixmap.
fn to_pixmap(image: &LoadedImage) -> Option<sk::Pixmap> {
    let rgba = &image.pixels;
    let mut pixmap = sk::Pixmap::new(rgba.width(), rgba.height())?;
    for (src, dst) in rgba
        .as_raw()
        .chunks_exact(4)
        .zip(pixmap.data_mut().chunks_exact_mut(4))
    {
        let a = src[3];
        dst[0] = premul_u8(src[0], a);
        dst[1] = premul_u8(src[1], a);
        dst[2] = premul_u8(src[2], a);
        dst[3] = a;
    }
    Some(pixmap)
}

fn premul_u8(channel: u8, alpha: u8) -> u8 {
    let prod = (channel as u16) * (alpha as u16) + 127;
    ((prod + (prod >> 8)) >> 8) as u8
}

fn fill_paint(color: Color) -> sk::Paint<'static> {
    let mut paint = sk::Paint::default();
    paint.set_color(to_sk_color(color));
    paint.anti_alias = true;
    paint
}

fn to_sk_color(color: Color) -> sk::Color {
    sk::Color::from_rgba(
        color.r.clamp(0.0, 1.0),
        color.g.clamp(0.0, 1.0),
        color.b.clamp(0.0, 1.0),
        color.a.clamp(0.0, 1.0),
    )
    .unwrap_or(sk::Color::BLACK)
}

/// Collects a glyph outline in font units with y pointing down.
struct GlyphPathBuilder {
    builder: sk::PathBuilder,
}

impl GlyphPathBuilder {
    fn new() -> Self {
        Self {
            builder: sk::PathBuilder::new(),
        }
    }

    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (x, -y)
    }

    fn finish(self) -> Option<sk::Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FontConfig;

    fn page(scale: f32) -> PixmapSurface {
        PixmapSurface::new(Size::new(40.0, 20.0), scale, FontContext::new()).unwrap()
    }

    #[test]
    fn test_scaled_dimensions() {
        let surface = page(2.0);
        assert_eq!((surface.width_px(), surface.height_px()), (80, 40));
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(PixmapSurface::new(Size::new(0.0, 10.0), 1.0, FontContext::new()).is_err());
    }

    #[test]
    fn test_clear_and_fill_rect() {
        let mut surface = page(1.0);
        surface.clear(Color::WHITE);
        surface.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::rgb(1.0, 0.0, 0.0));
        let img = surface.into_rgba();
        assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(30, 15).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_draw_image_with_opacity() {
        let mut surface = page(1.0);
        surface.clear(Color::WHITE);
        let black = LoadedImage {
            pixels: image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255])),
        };
        surface.draw_image(&black, Rect::new(0.0, 0.0, 40.0, 20.0), 0.5);
        let px = surface.into_rgba().get_pixel(20, 10).0;
        assert!(px[0] > 100 && px[0] < 160, "expected mid grey, got {:?}", px);
    }

    #[test]
    fn test_text_without_faces_is_noop() {
        let mut surface = page(1.0);
        surface.clear(Color::WHITE);
        surface.fill_text("Hello", 0.0, 0.0, &FontSpec::regular(12.0), Color::BLACK);
        let img = surface.into_rgba();
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_outlines_cached_per_weight_and_char() {
        let fonts = FontContext::from_config(&FontConfig::default());
        if !fonts.has_outlines() {
            return;
        }
        let mut surface = PixmapSurface::new(Size::new(200.0, 40.0), 1.0, fonts).unwrap();
        surface.clear(Color::WHITE);
        let font = FontSpec::regular(20.0);

        surface.fill_text("Loan", 0.0, 0.0, &font, Color::BLACK);
        assert_eq!(surface.outlines.len(), 4);
        surface.fill_text("noL", 0.0, 20.0, &font, Color::BLACK);
        assert_eq!(surface.outlines.len(), 4);
        surface.fill_text("Lo", 100.0, 0.0, &FontSpec::bold(20.0), Color::BLACK);
        assert_eq!(surface.outlines.len(), 6);
        assert!(surface.outlines.contains_key(&(FontWeight::Bold, 'L')));

        let img = surface.into_rgba();
        assert!(img.pixels().any(|p| p.0[0] < 128), "glyphs were not painted");
    }

    #[test]
    fn test_premul() {
        assert_eq!(premul_u8(255, 255), 255);
        assert_eq!(premul_u8(255, 0), 0);
        assert_eq!(premul_u8(200, 128), 100);
    }
}
