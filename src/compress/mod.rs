pub mod geometry;
pub mod jpeg;
pub mod orchestrator;
pub mod quality;

pub use orchestrator::{CompressionResult, Stage, compress_into_range};
