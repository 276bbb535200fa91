use thiserror::Error;

/// Failures while building layers from a document. Path regeneration
/// itself never fails.
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("failed to parse composition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid frame range: in point {in_point}, out point {out_point}")]
    InvalidFrameRange { in_point: f32, out_point: f32 },

    #[error("polystar '{name}' has unknown kind {raw}, expected 1 (star) or 2 (polygon)")]
    UnknownPolystarKind { name: String, raw: u8 },
}
