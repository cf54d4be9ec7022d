//! DDP (Distributed Display Protocol) output.
//!
//! One frame of colours is flattened to `R G B R G B …`, cut into
//! datagrams of at most 1200 payload bytes, and sent to UDP port 4048.
//! Existing receiver firmware depends on the exact header layout in
//! [`header`].

pub mod header;
pub mod writer;

pub use header::{
    DDP_DATA_TYPE_RGB, DDP_DESTINATION_ID, DDP_MAX_DATALEN, DDP_PORT, DdpFlags, DdpHeader,
    packetize,
};
pub use writer::{DdpWriter, next_sequence};
