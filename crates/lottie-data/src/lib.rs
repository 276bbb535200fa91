//! Serde model of the Lottie documents the shape core consumes.
pub mod model;
