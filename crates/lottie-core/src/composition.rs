use crate::animatable::FrameRange;
use crate::error::CompositionError;
use crate::layer::ShapeLayer;
use crate::surface::{PathRenderer, Surface};
use lottie_data::model::LottieJson;
use tracing::{debug, warn};

const SHAPE_LAYER: u8 = 4;

/// Every shape layer of a document, driven by one progress value.
pub struct Composition {
    name: String,
    frames: FrameRange,
    frame_rate: f32,
    width: u32,
    height: u32,
    progress: f32,
    layers: Vec<ShapeLayer>,
}

impl Composition {
    pub fn from_json_str(json: &str) -> Result<Self, CompositionError> {
        let model: LottieJson = serde_json::from_str(json)?;
        Self::from_model(&model)
    }

    pub fn from_model(model: &LottieJson) -> Result<Self, CompositionError> {
        if !(model.ip.is_finite() && model.op.is_finite()) || model.op <= model.ip {
            return Err(CompositionError::InvalidFrameRange {
                in_point: model.ip,
                out_point: model.op,
            });
        }
        let frames = FrameRange::new(model.ip, model.op);

        let mut layers = Vec::new();
        for layer in &model.layers {
            if layer.ty != SHAPE_LAYER {
                debug!(ty = layer.ty, name = ?layer.nm, "skipping non-shape layer");
                continue;
            }
            layers.push(ShapeLayer::from_model(layer, frames)?);
        }
        if layers.is_empty() {
            warn!("composition has no shape layers");
        }

        Ok(Self {
            name: model.nm.clone().unwrap_or_default(),
            frames,
            frame_rate: model.fr,
            width: model.w,
            height: model.h,
            progress: 0.0,
            layers,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frames(&self) -> FrameRange {
        self.frames
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Composition frame for the current progress.
    pub fn frame(&self) -> f32 {
        self.frames.frame_at(self.progress)
    }

    pub fn progress_for_frame(&self, frame: f32) -> f32 {
        self.frames.progress_at(frame)
    }

    pub fn layers(&self) -> &[ShapeLayer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&ShapeLayer> {
        self.layers.iter().find(|layer| layer.name() == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut ShapeLayer> {
        self.layers.iter_mut().find(|layer| layer.name() == name)
    }

    /// Returns how many animation values changed across all layers.
    pub fn set_progress(&mut self, progress: f32, surface: &mut dyn Surface) -> usize {
        if !progress.is_finite() {
            warn!(progress, "ignoring non-finite composition progress");
            return 0;
        }
        self.progress = progress.clamp(0.0, 1.0);
        let mut changed = 0;
        for layer in &mut self.layers {
            changed += layer.set_progress(self.progress, surface);
        }
        changed
    }

    /// Draws visible layers bottom to top. Documents list the topmost
    /// layer first.
    pub fn draw(&mut self, renderer: &mut dyn PathRenderer) {
        let frame = self.frame();
        for layer in self.layers.iter_mut().rev() {
            if layer.is_visible_at(frame) {
                layer.draw(renderer);
            }
        }
    }
}
