//! Frame sources and the paced streaming loop.

pub mod phase;
pub mod service;
pub mod source;
pub mod stats;

pub use phase::StreamPhase;
pub use service::{StreamConfig, Streamer};
pub use source::{Checkerboard, FrameLoop, FrameSource, GrowingSquare, IterSource, SolidColor};
pub use stats::{FrameTimes, StreamStats};
