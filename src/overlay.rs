//! # Overlay Compositor
//!
//! Draws the non-text layers of a page: background, watermark, the shared
//! brand header and footer, and the seal and signature stamps. Images arrive
//! already resolved; `None` means the reference was missing or failed to
//! load, and the layer is skipped.
//!
//! Each function selects its own layer on the surface. The rasterizer calls
//! them in z-order.

use crate::image_loader::LoadedImage;
use crate::model::{Background, FitMode, Stamp, Watermark};
use crate::position::{resolve_absolute, Point, Size};
use crate::style::FontSpec;
use crate::surface::{Layer, Rect, Surface};

/// Destination rectangle for an image of `image` size stretched onto `page`.
///
/// Cover may return a rectangle larger than the page; the surface clips it.
pub fn fit_rect(fit: FitMode, image: Size, page: Size) -> Rect {
    if image.width <= 0.0 || image.height <= 0.0 {
        return Rect::new(0.0, 0.0, page.width, page.height);
    }
    let sx = page.width / image.width;
    let sy = page.height / image.height;
    let scale = match fit {
        FitMode::Fill => return Rect::new(0.0, 0.0, page.width, page.height),
        FitMode::Cover => sx.max(sy),
        FitMode::Contain => sx.min(sy),
    };
    let width = image.width * scale;
    let height = image.height * scale;
    Rect::new(
        (page.width - width) / 2.0,
        (page.height - height) / 2.0,
        width,
        height,
    )
}

fn image_size(image: &LoadedImage) -> Size {
    Size::new(image.width() as f32, image.height() as f32)
}

pub fn draw_background(
    surface: &mut dyn Surface,
    image: Option<&LoadedImage>,
    background: &Background,
) {
    let Some(image) = image else {
        return;
    };
    let dest = fit_rect(background.fit, image_size(image), surface.size());
    surface.set_layer(Layer::Background);
    surface.draw_image(image, dest, background.opacity.clamp(0.0, 1.0));
    tracing::debug!(fit = ?background.fit, "drew background");
}

/// Image watermark wins over text. An image is `size` units wide and placed
/// at its position preset; text is rotated about the page center.
pub fn draw_watermark(
    surface: &mut dyn Surface,
    image: Option<&LoadedImage>,
    watermark: &Watermark,
) {
    let opacity = watermark.opacity.clamp(0.0, 1.0);
    surface.set_layer(Layer::Watermark);

    if let Some(image) = image {
        let size = Size::new(watermark.size, image.height_for_width(watermark.size));
        let at = resolve_absolute(watermark.position, surface.size(), size);
        surface.draw_image(image, Rect::new(at.x, at.y, size.width, size.height), opacity);
        tracing::debug!("drew image watermark");
        return;
    }

    let text = watermark.text.trim();
    if text.is_empty() {
        return;
    }
    let page = surface.size();
    let center = Point {
        x: page.width / 2.0,
        y: page.height / 2.0,
    };
    surface.fill_text_rotated(
        text,
        center,
        watermark.rotation,
        &FontSpec::bold(watermark.size),
        watermark.color.with_opacity(opacity),
    );
    tracing::debug!(text, "drew text watermark");
}

/// Brand art spanning the page width at the top edge. Returns its rendered
/// height, or `None` when there is no header image.
pub fn draw_header(surface: &mut dyn Surface, image: Option<&LoadedImage>) -> Option<f32> {
    let image = image?;
    let width = surface.size().width;
    let height = image.height_for_width(width);
    surface.set_layer(Layer::Content);
    surface.draw_image(image, Rect::new(0.0, 0.0, width, height), 1.0);
    Some(height)
}

/// Brand art spanning the page width at the bottom edge. Returns its
/// rendered height.
pub fn draw_footer(surface: &mut dyn Surface, image: Option<&LoadedImage>) -> Option<f32> {
    let image = image?;
    let page = surface.size();
    let height = image.height_for_width(page.width);
    surface.set_layer(Layer::Content);
    surface.draw_image(
        image,
        Rect::new(0.0, page.height - height, page.width, height),
        1.0,
    );
    Some(height)
}

/// A seal or signature: `size` units wide, aspect preserved, opacity on a
/// 0..=100 scale.
pub fn draw_stamp(surface: &mut dyn Surface, image: Option<&LoadedImage>, stamp: &Stamp) {
    let Some(image) = image else {
        return;
    };
    let size = Size::new(stamp.size, image.height_for_width(stamp.size));
    let at = resolve_absolute(stamp.position, surface.size(), size);
    surface.set_layer(Layer::Stamp);
    surface.draw_image(
        image,
        Rect::new(at.x, at.y, size.width, size.height),
        (stamp.opacity / 100.0).clamp(0.0, 1.0),
    );
    tracing::debug!(position = stamp.position.as_str(), "drew stamp");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontContext;
    use crate::position::Position;
    use crate::surface::{DrawCommand, RecordingSurface};

    const PAGE: Size = Size::new(794.0, 1123.0);

    fn surface() -> RecordingSurface {
        RecordingSurface::new(PAGE, FontContext::new())
    }

    fn image(w: u32, h: u32) -> LoadedImage {
        LoadedImage {
            pixels: image::RgbaImage::new(w, h),
        }
    }

    fn only_image(s: &RecordingSurface) -> (Layer, Rect, f32) {
        let images: Vec<_> = s
            .commands()
            .iter()
            .filter_map(|(layer, c)| match c {
                DrawCommand::Image { dest, opacity, .. } => Some((*layer, *dest, *opacity)),
                _ => None,
            })
            .collect();
        assert_eq!(images.len(), 1);
        images[0]
    }

    #[test]
    fn test_fit_fill_is_exact_page() {
        let r = fit_rect(FitMode::Fill, Size::new(100.0, 10.0), PAGE);
        assert_eq!(r, Rect::new(0.0, 0.0, 794.0, 1123.0));
    }

    #[test]
    fn test_fit_cover_crops_centered() {
        // Square image on a tall page: height drives the scale.
        let r = fit_rect(FitMode::Cover, Size::new(100.0, 100.0), PAGE);
        assert_eq!(r.height, 1123.0);
        assert_eq!(r.width, 1123.0);
        assert!((r.x - (794.0 - 1123.0) / 2.0).abs() < 1e-3);
        assert_eq!(r.y, 0.0);
    }

    #[test]
    fn test_fit_contain_letterboxes() {
        let r = fit_rect(FitMode::Contain, Size::new(100.0, 100.0), PAGE);
        assert_eq!(r.width, 794.0);
        assert_eq!(r.x, 0.0);
        assert!((r.y - (1123.0 - 794.0) / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_background_layer_and_opacity() {
        let mut s = surface();
        let bg = Background {
            image: "bg.png".into(),
            opacity: 0.3,
            fit: FitMode::Fill,
        };
        draw_background(&mut s, Some(&image(10, 10)), &bg);
        let (layer, _, opacity) = only_image(&s);
        assert_eq!(layer, Layer::Background);
        assert_eq!(opacity, 0.3);
    }

    #[test]
    fn test_missing_background_is_skipped() {
        let mut s = surface();
        draw_background(&mut s, None, &Background::default());
        assert!(s.commands().is_empty());
    }

    #[test]
    fn test_image_watermark_suppresses_text() {
        let mut s = surface();
        let wm = Watermark {
            text: "CONFIDENTIAL".into(),
            image: "wm.png".into(),
            ..Default::default()
        };
        draw_watermark(&mut s, Some(&image(40, 20)), &wm);
        assert!(s.texts().is_empty());
        let (layer, dest, _) = only_image(&s);
        assert_eq!(layer, Layer::Watermark);
        assert_eq!(dest.width, wm.size);
        assert_eq!(dest.height, wm.size / 2.0);
    }

    #[test]
    fn test_text_watermark_rotated_at_center() {
        let mut s = surface();
        let wm = Watermark {
            text: "SANCTIONED".into(),
            ..Default::default()
        };
        draw_watermark(&mut s, None, &wm);
        match &s.commands()[0] {
            (Layer::Watermark, DrawCommand::RotatedText { center, degrees, color, .. }) => {
                assert_eq!(*center, Point { x: 397.0, y: 561.5 });
                assert_eq!(*degrees, -45.0);
                assert!((color.a - 0.1).abs() < 1e-6);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_blank_watermark_text_draws_nothing() {
        let mut s = surface();
        draw_watermark(&mut s, None, &Watermark::default());
        assert!(s.commands().is_empty());
    }

    #[test]
    fn test_header_and_footer_span_width() {
        let mut s = surface();
        let art = image(397, 40);
        assert_eq!(draw_header(&mut s, Some(&art)), Some(80.0));
        assert_eq!(draw_footer(&mut s, Some(&art)), Some(80.0));
        assert_eq!(draw_header(&mut s, None), None);

        let dests: Vec<Rect> = s
            .commands()
            .iter()
            .filter_map(|(_, c)| match c {
                DrawCommand::Image { dest, .. } => Some(*dest),
                _ => None,
            })
            .collect();
        assert_eq!(dests[0], Rect::new(0.0, 0.0, 794.0, 80.0));
        assert_eq!(dests[1], Rect::new(0.0, 1043.0, 794.0, 80.0));
    }

    #[test]
    fn test_stamp_position_and_opacity() {
        let mut s = surface();
        let seal = Stamp {
            image: "seal.png".into(),
            size: 100.0,
            position: Position::BottomLeft,
            opacity: 80.0,
        };
        draw_stamp(&mut s, Some(&image(50, 50)), &seal);
        let (layer, dest, opacity) = only_image(&s);
        assert_eq!(layer, Layer::Stamp);
        assert_eq!(dest, Rect::new(20.0, 1123.0 - 100.0 - 20.0, 100.0, 100.0));
        assert!((opacity - 0.8).abs() < 1e-6);
    }
}
