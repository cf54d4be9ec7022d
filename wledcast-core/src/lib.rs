//! # wledcast-core
//!
//! Pixel mapping and streaming pipeline for casting images onto
//! addressable LED layouts over DDP.
//!
//! This crate contains:
//! - **Geometry**: shape generators (`matrix`, `ring`) and transforms
//! - **Topology**: YAML layout loader with controller declarations
//! - **Mapping**: the flattened, ordered LED mapping and frame sampling
//! - **DDP**: header codec, packetizer and UDP writer
//! - **Sinks**: the per-destination transmit contract
//! - **Stream**: frame sources and the frame-paced streaming loop
//! - **Error**: `CastError`, a `thiserror`-based error hierarchy

pub mod ddp;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod mapping;
pub mod sink;
pub mod stream;
pub mod topology;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use ddp::{DDP_MAX_DATALEN, DDP_PORT, DdpHeader, DdpWriter};
pub use error::CastError;
pub use frame::{Frame, PixelFormat, Rgb};
pub use geometry::{Corner, DestinationId, LedPoint, Point};
pub use mapping::{BoundingBox, Mapping, Size, sample};
pub use sink::{FnSink, NullSink, PixelSink, SinkSet};
pub use stream::{FrameSource, StreamConfig, StreamPhase, StreamStats, Streamer};
pub use topology::{ControllerKind, ControllerSpec, Topology};
