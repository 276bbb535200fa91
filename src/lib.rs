//! Host-side driver for animated Lottie shape paths.
//!
//! [`CompositionDrawable`] owns a [`lottie_core::Composition`], collects the
//! redraw requests its contents raise, and hands generated paths to a
//! [`lottie_core::PathRenderer`] such as [`SvgPathRenderer`].

pub mod drawable;
pub mod svg;

pub use drawable::{CompositionDrawable, DrawableError, FrameSnapshot};
pub use svg::{RenderedPath, SvgOptions, SvgPathRenderer};
