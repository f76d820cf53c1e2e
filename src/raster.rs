//! # Document Rasterizer
//!
//! The single sequencing authority for a render. One call clears a fresh
//! page and then, strictly in order:
//!
//! ```text
//! background → watermark → header art → footer art
//!     → substitution → headline → body → seal → signature
//! ```
//!
//! Every image is awaited immediately before the layer that uses it, so the
//! six asset lookups are the only suspension points and they can never
//! reorder drawing.

use crate::config::RenderConfig;
use crate::font::FontContext;
use crate::image_loader::{AssetLoader, AssetSource};
use crate::model::{FormValues, Template};
use crate::overlay;
use crate::position::Size;
use crate::style::{palette, Color, FontSpec};
use crate::surface::{Layer, PixmapSurface, Surface};
use crate::template::substitute;
use crate::text::classify::{BodyStyle, LineKind, RuleSet};
use crate::text::wrap_text;
use crate::LoandocError;

/// Space between the header band and the first line of content.
const BLOCK_GAP: f32 = 20.0;

/// The finished raster page, straight RGBA.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub image: image::RgbaImage,
}

impl RenderedPage {
    pub fn width_px(&self) -> u32 {
        self.image.width()
    }

    pub fn height_px(&self) -> u32 {
        self.image.height()
    }
}

/// Where things landed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Top of the headline, just below the header band or header art.
    pub content_top: f32,
    /// Cursor below the last body line.
    pub end_y: f32,
    pub kinds: Vec<LineKind>,
}

pub struct Rasterizer<'a> {
    config: &'a RenderConfig,
    loader: AssetLoader<'a>,
}

impl<'a> Rasterizer<'a> {
    pub fn new(config: &'a RenderConfig, assets: &'a dyn AssetSource) -> Self {
        Self {
            config,
            loader: AssetLoader::new(assets),
        }
    }

    fn page_size(&self) -> Size {
        Size::new(self.config.page.width, self.config.page.height)
    }

    /// Render to pixels.
    pub async fn render(
        &self,
        template: &Template,
        values: &FormValues,
    ) -> Result<RenderedPage, LoandocError> {
        self.config.raster_size()?;
        let fonts = FontContext::from_config(&self.config.fonts);
        let mut surface = PixmapSurface::new(self.page_size(), self.config.raster_scale, fonts)?;
        self.render_onto(&mut surface, template, values).await;
        Ok(RenderedPage {
            image: surface.into_rgba(),
        })
    }

    /// Draw the whole page onto any surface.
    pub async fn render_onto<S: Surface>(
        &self,
        surface: &mut S,
        template: &Template,
        values: &FormValues,
    ) -> PageLayout {
        let page = &self.config.page;

        surface.set_layer(Layer::Background);
        surface.clear(Color::WHITE);

        if let Some(background) = &template.background {
            let image = self.loader.load("background", &background.image).await;
            overlay::draw_background(surface, image.as_ref(), background);
        }

        if let Some(watermark) = &template.watermark {
            let image = self.loader.load("watermark", &watermark.image).await;
            overlay::draw_watermark(surface, image.as_ref(), watermark);
        }

        let brand = &self.config.brand;
        let header = self
            .loader
            .load("header", brand.header.as_deref().unwrap_or_default())
            .await;
        let header_height = overlay::draw_header(surface, header.as_ref());

        let footer = self
            .loader
            .load("footer", brand.footer.as_deref().unwrap_or_default())
            .await;
        let footer_height = overlay::draw_footer(surface, footer.as_ref());

        let text = substitute(template, values);
        let content_top =
            header_height.unwrap_or(page.header_band).max(page.margin_top) + BLOCK_GAP;

        surface.set_layer(Layer::Content);
        let style = BodyStyle::new(page, &self.config.typography);
        let y = self.draw_headline(surface, &text.headline, &style, content_top);
        let body = RuleSet::for_family(template.family()).layout(surface, &text.body, &style, y);

        let limit = page.height - footer_height.unwrap_or(page.footer_band);
        if body.end_y > limit {
            tracing::warn!(end_y = body.end_y, limit, "body runs into the footer band");
        }

        if let Some(seal) = &template.seal {
            let image = self.loader.load("seal", &seal.image).await;
            overlay::draw_stamp(surface, image.as_ref(), seal);
        }
        if let Some(signature) = &template.signature {
            let image = self.loader.load("signature", &signature.image).await;
            overlay::draw_stamp(surface, image.as_ref(), signature);
        }

        tracing::debug!(
            template = %template.name,
            lines = body.kinds.len(),
            end_y = body.end_y,
            "rendered page"
        );
        PageLayout {
            content_top,
            end_y: body.end_y,
            kinds: body.kinds,
        }
    }

    /// Centered, bold, wrapped at the content column. Returns the cursor
    /// below it.
    fn draw_headline(
        &self,
        surface: &mut dyn Surface,
        headline: &str,
        style: &BodyStyle,
        y: f32,
    ) -> f32 {
        let headline = headline.trim();
        if headline.is_empty() {
            return y;
        }
        let size = self.config.typography.headline_size;
        let font = FontSpec::bold(size);
        let line_height = size * 1.4;
        let mut y = y;
        for line in wrap_text(surface, headline, &font, style.width) {
            let x = style.left + (style.width - line.width) / 2.0;
            surface.fill_text(&line.text(), x, y, &font, palette::HEADING);
            y += line_height;
        }
        y + style.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetError;
    use crate::model::{Background, Stamp, Watermark};
    use crate::surface::{DrawCommand, RecordingSurface};
    use async_trait::async_trait;

    /// Serves a 10x5 PNG for any reference containing "ok".
    struct FakeAssets;

    #[async_trait]
    impl AssetSource for FakeAssets {
        async fn fetch(&self, reference: &str) -> Result<Vec<u8>, AssetError> {
            if !reference.contains("ok") {
                return Err(AssetError::InvalidDataUri(reference.to_string()));
            }
            let img = image::RgbaImage::from_pixel(10, 5, image::Rgba([0, 0, 255, 255]));
            let mut buf = std::io::Cursor::new(Vec::new());
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut buf, image::ImageOutputFormat::Png)
                .unwrap();
            Ok(buf.into_inner())
        }
    }

    fn recording(config: &RenderConfig) -> RecordingSurface {
        RecordingSurface::new(
            Size::new(config.page.width, config.page.height),
            FontContext::new(),
        )
    }

    fn full_template() -> Template {
        let mut t = Template::new(
            "Loan Approval Letter",
            "Approval for {{name}}",
            "Dear {{name}},\n\nLOAN DETAILS\nLoan Amount: ₹{{loanAmount}}",
        );
        t.background = Some(Background {
            image: "ok-bg.png".into(),
            ..Default::default()
        });
        t.watermark = Some(Watermark {
            text: "APPROVED".into(),
            ..Default::default()
        });
        t.seal = Some(Stamp {
            image: "ok-seal.png".into(),
            ..Default::default()
        });
        t.signature = Some(Stamp {
            image: "missing-signature.png".into(),
            ..Default::default()
        });
        t
    }

    fn values() -> FormValues {
        FormValues {
            name: "Asha Verma".into(),
            loan_amount: "500000".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_layers_drawn_in_z_order() {
        let mut config = RenderConfig::default();
        config.brand.header = Some("ok-header.png".into());
        let rasterizer = Rasterizer::new(&config, &FakeAssets);
        let mut surface = recording(&config);
        rasterizer
            .render_onto(&mut surface, &full_template(), &values())
            .await;

        let layers: Vec<u8> = surface.commands().iter().map(|(l, _)| l.z_index()).collect();
        let mut sorted = layers.clone();
        sorted.sort();
        assert_eq!(layers, sorted);
        assert!(matches!(surface.commands()[0].1, DrawCommand::Clear { .. }));
        assert_eq!(surface.commands().last().unwrap().0, Layer::Stamp);
    }

    #[tokio::test]
    async fn test_failed_asset_is_omitted() {
        let config = RenderConfig::default();
        let rasterizer = Rasterizer::new(&config, &FakeAssets);
        let mut surface = recording(&config);
        rasterizer
            .render_onto(&mut surface, &full_template(), &values())
            .await;

        let stamps = surface
            .commands()
            .iter()
            .filter(|(l, _)| *l == Layer::Stamp)
            .count();
        // Seal resolves, signature does not.
        assert_eq!(stamps, 1);
    }

    #[tokio::test]
    async fn test_header_height_sets_content_top() {
        let mut config = RenderConfig::default();
        let rasterizer = Rasterizer::new(&config, &FakeAssets);
        let mut surface = recording(&config);
        let plain = rasterizer
            .render_onto(&mut surface, &full_template(), &values())
            .await;
        assert_eq!(plain.content_top, config.page.header_band + BLOCK_GAP);

        // 10x5 art scaled to 794 wide is 397 tall.
        config.brand.header = Some("ok-header.png".into());
        let rasterizer = Rasterizer::new(&config, &FakeAssets);
        let mut surface = recording(&config);
        let branded = rasterizer
            .render_onto(&mut surface, &full_template(), &values())
            .await;
        assert_eq!(branded.content_top, 397.0 + BLOCK_GAP);
    }

    #[tokio::test]
    async fn test_body_is_substituted_and_classified() {
        let config = RenderConfig::default();
        let rasterizer = Rasterizer::new(&config, &FakeAssets);
        let mut surface = recording(&config);
        let layout = rasterizer
            .render_onto(&mut surface, &full_template(), &values())
            .await;

        assert_eq!(
            layout.kinds,
            vec![
                LineKind::Paragraph,
                LineKind::Spacer,
                LineKind::Heading,
                LineKind::Financial
            ]
        );
        let texts = surface.texts();
        assert!(texts.contains(&"Approval for Asha Verma"));
        assert!(texts.contains(&"₹500,000.00"));
        assert!(texts.contains(&"APPROVED"));
    }

    #[tokio::test]
    async fn test_render_produces_scaled_raster() {
        let mut config = RenderConfig::default();
        config.raster_scale = 0.5;
        let rasterizer = Rasterizer::new(&config, &FakeAssets);
        let page = rasterizer
            .render(&Template::new("Letter", "Hi", "Body"), &FormValues::default())
            .await
            .unwrap();
        assert_eq!((page.width_px(), page.height_px()), (397, 562));
        assert_eq!(page.image.get_pixel(5, 5).0, [255, 255, 255, 255]);
    }

    #[tokio::test]
    async fn test_invalid_scale_is_rejected() {
        let mut config = RenderConfig::default();
        config.raster_scale = 0.0;
        let rasterizer = Rasterizer::new(&config, &FakeAssets);
        let err = rasterizer
            .render(&Template::default(), &FormValues::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LoandocError::InvalidConfiguration(_)));
    }
}
