//! Audio I/O and the real-time session driver

pub mod buffer;
pub mod graph;
pub mod input;
pub mod output;
pub mod pipeline;

pub use buffer::SampleRing;
pub use graph::{AudioGraph, SessionError};
pub use input::CaptureStream;
pub use output::PlaybackStream;
pub use pipeline::{PipelineState, SessionConfig};
