//! Animated shape path generation for Lottie shape layers.
//!
//! A [`ShapeLayer`] owns an [`AnimationTable`] and a list of [`Content`]s.
//! Setting progress on the layer drives every animation; animations whose
//! value changed notify the contents listening to them, which drop their
//! cached path and request a redraw from the host [`Surface`]. Paths are
//! regenerated lazily when read.

pub mod animatable;
pub mod composition;
pub mod content;
pub mod error;
pub mod layer;
pub mod measure;
pub mod surface;

pub use animatable::{AnimationId, AnimationTable, Easing, FrameRange, KeyframeAnimation};
pub use composition::Composition;
pub use content::{
    Content, ContentId, GroupContent, PathCache, PathContent, PolystarGeometry, PolystarKind,
    TrimMode, TrimValues,
};
pub use error::CompositionError;
pub use layer::ShapeLayer;
pub use surface::{PathRenderer, RedrawRequests, Surface};
