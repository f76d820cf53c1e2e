//! # loandoc
//!
//! Renders loan documents (approval letters, sanction letters, EMI
//! schedules) from an editable template and the applicant's form values
//! into a single-page raster PDF.
//!
//! ## Pipeline
//!
//! ```text
//! Template + FormValues
//!       ↓
//!   [template]   {{placeholder}} substitution with visible fallbacks
//!       ↓
//!   [raster]     one page: overlays + classified body text
//!       │            ├── [overlay]  background, watermark, brand art, stamps
//!       │            └── [text]     line classification and word wrap
//!       ↓
//!   [pdf]        JPEG page inside a minimal PDF 1.4 container
//! ```
//!
//! Rendering is async only because overlay images may need fetching. Each
//! image is awaited in z-order; a failed image drops its layer and never
//! fails the document.

pub mod config;
pub mod emi;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod model;
pub mod overlay;
pub mod pdf;
pub mod position;
pub mod raster;
pub mod style;
pub mod surface;
pub mod template;
pub mod text;

pub use config::RenderConfig;
pub use error::LoandocError;
pub use image_loader::{AssetSource, DefaultAssetSource};
pub use model::{FormValues, Template};
pub use pdf::GeneratedDocument;
pub use raster::RenderedPage;

use raster::Rasterizer;

/// Rasterize one page.
pub async fn render_page(
    template: &Template,
    values: &FormValues,
    config: &RenderConfig,
    assets: &dyn AssetSource,
) -> Result<RenderedPage, LoandocError> {
    Rasterizer::new(config, assets).render(template, values).await
}

/// Rasterize and wrap the page in a PDF.
///
/// Either the whole file is returned or an error; never partial bytes.
pub async fn generate(
    template: &Template,
    values: &FormValues,
    config: &RenderConfig,
    assets: &dyn AssetSource,
) -> Result<GeneratedDocument, LoandocError> {
    let page = render_page(template, values, config, assets).await?;
    document_from_page(template, &page, config)
}

/// Wrap an already rendered page in a PDF sized to the configured page.
pub fn document_from_page(
    template: &Template,
    page: &RenderedPage,
    config: &RenderConfig,
) -> Result<GeneratedDocument, LoandocError> {
    let bytes = pdf::assemble(
        &page.image,
        pdf::MediaBox::for_page(&config.page),
        config.jpeg_quality(),
        config.document_title.as_deref(),
    )?;
    tracing::info!(
        template = %template.name,
        bytes = bytes.len(),
        width = page.width_px(),
        height = page.height_px(),
        "generated document"
    );
    Ok(GeneratedDocument::new(bytes, &template.name))
}

/// Parse template and form JSON, fill in the installment, and generate.
pub async fn render_json(
    template_json: &str,
    values_json: &str,
    config: &RenderConfig,
    assets: &dyn AssetSource,
) -> Result<GeneratedDocument, LoandocError> {
    let template: Template = serde_json::from_str(template_json)?;
    let values: FormValues = serde_json::from_str(values_json)?;
    generate(&template, &values.with_computed_emi(), config, assets).await
}
