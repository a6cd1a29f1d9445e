//! Pipeline – ties together parsing, styling, layout, pagination, and
//! rendering into a single function call.

use crate::css::Stylesheet;
use crate::dom::{body_children, collect_style_blocks, parse_html};
use crate::error::Result;
use crate::layout::compute_layout;
use crate::layout_config::{DocumentMetadata, LayoutConfig, PageGeometry};
use crate::pagination::{decorate_pages, paginate};
use crate::render::render_pdf;
use crate::style::{build_styled_tree, root_style, Typography};

/// Configuration for the PDF generation pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub geometry: PageGeometry,
    pub typography: Typography,
    pub metadata: DocumentMetadata,
    /// Running header, `left|center|right`.
    pub header: Option<String>,
    /// Running footer, `left|center|right`.
    pub footer: Option<String>,
    /// Fail instead of skipping images that cannot be decoded.
    pub strict_images: bool,
}

/// CSS text of every `<style>` block in a full HTML document.
pub fn document_css(html: &str) -> String {
    collect_style_blocks(&parse_html(html))
}

/// Lay out `html` into pages styled by `css`. `<style>` blocks inside `html`
/// are not rendered and not applied; see [`document_css`].
pub fn compute_layout_config(html: &str, css: &str, config: &PipelineConfig) -> Result<LayoutConfig> {
    let dom = parse_html(html);
    let sheet = Stylesheet::parse(css);
    log::debug!("stylesheet has {} rule(s)", sheet.len());

    let root = root_style(&config.typography, &sheet);
    let styled = build_styled_tree(&body_children(&dom), Some(&root), &sheet);

    let boxes = compute_layout(&styled, &config.geometry)?;
    let mut layout = paginate(&boxes, &config.geometry, config.metadata.clone());
    decorate_pages(
        &mut layout,
        &config.geometry,
        &config.typography,
        config.header.as_deref(),
        config.footer.as_deref(),
    );
    Ok(layout)
}

/// Full pipeline: HTML string → PDF bytes, plus the layout they were drawn from.
pub fn generate_pdf(html: &str, css: &str, config: &PipelineConfig) -> Result<(Vec<u8>, LayoutConfig)> {
    let layout = compute_layout_config(html, css, config)?;
    let bytes = render_pdf(&layout, config.strict_images)?;
    Ok((bytes, layout))
}

/// Convenience: generate a PDF from a full document, styled by its own
/// `<style>` blocks, with the default A4 config.
pub fn generate_pdf_from_html(html: &str) -> Result<Vec<u8>> {
    let (bytes, _) = generate_pdf(html, &document_css(html), &PipelineConfig::default())?;
    Ok(bytes)
}
