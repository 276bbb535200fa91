use crate::svg::{svg_document, RenderedPath, SvgOptions, SvgPathRenderer};
use lottie_core::{Composition, CompositionError, PathRenderer, RedrawRequests};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DrawableError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error("no shape layer named '{0}'")]
    UnknownLayer(String),
}

/// Paths of a composition at one progress value.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub progress: f32,
    pub frame: f32,
    pub paths: Vec<RenderedPath>,
}

impl FrameSnapshot {
    pub fn to_svg(&self, width: u32, height: u32, options: &SvgOptions) -> String {
        svg_document(&self.paths, width, height, options)
    }
}

/// Drives a composition from a host progress value and tracks whether the
/// surface needs repainting.
pub struct CompositionDrawable {
    composition: Composition,
    redraw: RedrawRequests,
}

impl CompositionDrawable {
    pub fn new(composition: Composition) -> Self {
        Self {
            composition,
            redraw: RedrawRequests::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DrawableError> {
        Ok(Self::new(Composition::from_json_str(json)?))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, DrawableError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DrawableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let drawable = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            layers = drawable.composition.layers().len(),
            "loaded composition"
        );
        Ok(drawable)
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn composition_mut(&mut self) -> &mut Composition {
        &mut self.composition
    }

    /// Returns whether anything needs repainting.
    pub fn set_progress(&mut self, progress: f32) -> bool {
        let changed = self.composition.set_progress(progress, &mut self.redraw);
        debug!(progress, changed, pending = self.redraw.count(), "progress updated");
        self.needs_redraw()
    }

    pub fn set_frame(&mut self, frame: f32) -> bool {
        let progress = self.composition.progress_for_frame(frame);
        self.set_progress(progress)
    }

    pub fn needs_redraw(&self) -> bool {
        self.redraw.count() > 0
    }

    /// Draws every visible layer and clears pending redraw requests.
    pub fn draw(&mut self, renderer: &mut dyn PathRenderer) {
        self.composition.draw(renderer);
        self.redraw.take();
    }

    /// Draws into a fresh recorder, optionally for one layer only.
    pub fn snapshot(&mut self, layer: Option<&str>) -> Result<FrameSnapshot, DrawableError> {
        let mut renderer = SvgPathRenderer::new();
        if let Some(name) = layer {
            if self.composition.layer(name).is_none() {
                return Err(DrawableError::UnknownLayer(name.to_string()));
            }
            renderer = renderer.with_layer(name);
        }

        self.draw(&mut renderer);
        Ok(FrameSnapshot {
            progress: self.composition.progress(),
            frame: self.composition.frame(),
            paths: renderer.into_paths(),
        })
    }
}
