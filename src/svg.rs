use kurbo::BezPath;
use lottie_core::{ContentId, PathRenderer};
use serde::Serialize;
use std::fmt::Write as _;

/// One drawn path as SVG path data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPath {
    pub layer: String,
    pub content: usize,
    pub d: String,
}

/// Presentation attributes of the emitted `<path>` elements.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgOptions {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            fill: "none".to_string(),
            stroke: "black".to_string(),
            stroke_width: 1.0,
        }
    }
}

/// Records every drawn path, optionally keeping a single layer only.
#[derive(Debug, Default)]
pub struct SvgPathRenderer {
    layer: Option<String>,
    paths: Vec<RenderedPath>,
}

impl SvgPathRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn paths(&self) -> &[RenderedPath] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<RenderedPath> {
        self.paths
    }
}

impl PathRenderer for SvgPathRenderer {
    fn draw_path(&mut self, layer: &str, content: ContentId, path: &BezPath) {
        if self.layer.as_deref().is_some_and(|wanted| wanted != layer) {
            return;
        }
        if path.elements().is_empty() {
            return;
        }
        self.paths.push(RenderedPath {
            layer: layer.to_string(),
            content: content.index(),
            d: path.to_svg(),
        });
    }
}

/// Standalone SVG document with one `<path>` per rendered path.
pub fn svg_document(
    paths: &[RenderedPath],
    width: u32,
    height: u32,
    options: &SvgOptions,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    for path in paths {
        let _ = writeln!(
            out,
            r#"  <path data-layer="{}" data-content="{}" d="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
            escape(&path.layer),
            path.content,
            path.d,
            options.fill,
            options.stroke,
            options.stroke_width
        );
    }
    out.push_str("</svg>");
    out
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
