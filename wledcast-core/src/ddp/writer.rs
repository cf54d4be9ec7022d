//! UDP writer for one DDP receiver.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use bytes::BytesMut;
use tokio::net::UdpSocket;
use tracing::trace;

use crate::ddp::header::{DDP_PORT, packetize};
use crate::error::CastError;
use crate::frame::Rgb;

/// First sequence id handed out; 0 is never used on the wire.
const FIRST_SEQUENCE: u8 = 1;
const LAST_SEQUENCE: u8 = 15;

/// Sequence id that follows `seq`: 1, 2, …, 15, 1, …
pub const fn next_sequence(seq: u8) -> u8 {
    if seq >= LAST_SEQUENCE {
        FIRST_SEQUENCE
    } else {
        seq + 1
    }
}

// ── DdpWriter ────────────────────────────────────────────────────

/// Sends whole frames of colours to one receiver.
///
/// The sequence id advances once per frame that was sent in full; a
/// frame that fails halfway keeps the id for the next attempt. Only the
/// streaming task calls [`send`](Self::send), so the counter has a
/// single writer.
pub struct DdpWriter {
    socket: UdpSocket,
    remote_addr: SocketAddr,
    sequence: AtomicU8,
    /// Total bytes sent since construction, headers included.
    bytes_sent: AtomicU64,
    frames_sent: AtomicU64,
}

impl DdpWriter {
    /// Wrap an already-bound `UdpSocket` targeting `remote_addr`.
    pub fn new(socket: UdpSocket, remote_addr: SocketAddr) -> Self {
        Self {
            socket,
            remote_addr,
            sequence: AtomicU8::new(FIRST_SEQUENCE),
            bytes_sent: AtomicU64::new(0),
            frames_sent: AtomicU64::new(0),
        }
    }

    /// Resolve `host` on the standard DDP port and bind a local socket.
    pub async fn connect(host: &str) -> Result<Self, CastError> {
        Self::connect_port(host, DDP_PORT).await
    }

    /// Resolve `host:port` and bind a local socket of the same family.
    pub async fn connect_port(host: &str, port: u16) -> Result<Self, CastError> {
        let remote_addr = tokio::net::lookup_host((host, port))
            .await?
            .next()
            .ok_or_else(|| CastError::Config(format!("host {host:?} did not resolve")))?;

        let local: SocketAddr = if remote_addr.is_ipv4() {
            "0.0.0.0:0".parse().map_err(|e| CastError::Other(format!("{e}")))?
        } else {
            "[::]:0".parse().map_err(|e| CastError::Other(format!("{e}")))?
        };
        let socket = UdpSocket::bind(local).await?;
        Ok(Self::new(socket, remote_addr))
    }

    /// Send one frame. Returns the number of datagrams written.
    ///
    /// Socket errors are not retried; the caller decides whether the
    /// frame is lost.
    pub async fn send(&self, colors: &[Rgb]) -> Result<usize, CastError> {
        let mut stream = BytesMut::with_capacity(colors.len() * 3);
        for c in colors {
            stream.extend_from_slice(&c.to_array());
        }

        let seq = self.sequence.load(Ordering::Acquire);
        let packets = packetize(&stream, seq);

        let mut sent_total = 0usize;
        for pkt in &packets {
            sent_total += self.socket.send_to(pkt, self.remote_addr).await?;
        }

        self.sequence.store(next_sequence(seq), Ordering::Release);
        self.bytes_sent
            .fetch_add(sent_total as u64, Ordering::Relaxed);
        self.frames_sent.fetch_add(1, Ordering::Relaxed);

        trace!(
            "ddp seq {seq}: {} pixels in {} packets to {}",
            colors.len(),
            packets.len(),
            self.remote_addr
        );
        Ok(packets.len())
    }

    /// Sequence id the next frame will carry.
    pub fn sequence(&self) -> u8 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Total bytes sent across all frames.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Frames sent in full.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    /// The receiver this writer targets.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

// ── Tests ────────────────────────────────────────────────────────
