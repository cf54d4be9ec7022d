//! Destination sinks.
//!
//! A sink receives the ordered colours for one destination and delivers
//! them somewhere (a DDP controller, a test recorder, nowhere at all).
//! [`SinkSet`] binds destination ids to sinks for the lifetime of a
//! session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::ddp::DdpWriter;
use crate::error::CastError;
use crate::frame::Rgb;
use crate::geometry::DestinationId;
use crate::mapping::Mapping;
use crate::topology::{ControllerKind, ControllerSpec};

// ── PixelSink ────────────────────────────────────────────────────

/// Something that can take one frame's worth of colours.
///
/// Called from a single streaming task, but must be `Sync` because
/// destinations of one frame are written concurrently.
#[async_trait]
pub trait PixelSink: Send + Sync {
    async fn transmit(&self, colors: &[Rgb]) -> Result<(), CastError>;
}

#[async_trait]
impl PixelSink for DdpWriter {
    async fn transmit(&self, colors: &[Rgb]) -> Result<(), CastError> {
        self.send(colors).await.map(|_| ())
    }
}

/// Discards everything. Bound to the null destination by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl PixelSink for NullSink {
    async fn transmit(&self, _colors: &[Rgb]) -> Result<(), CastError> {
        Ok(())
    }
}

/// Adapts a plain function into a sink.
pub struct FnSink<F>(F);

impl<F> FnSink<F>
where
    F: Fn(&[Rgb]) -> Result<(), CastError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> PixelSink for FnSink<F>
where
    F: Fn(&[Rgb]) -> Result<(), CastError> + Send + Sync,
{
    async fn transmit(&self, colors: &[Rgb]) -> Result<(), CastError> {
        (self.0)(colors)
    }
}

// ── SinkSet ──────────────────────────────────────────────────────

/// Destination id → sink, plus the per-transmit deadline.
pub struct SinkSet {
    sinks: HashMap<DestinationId, Arc<dyn PixelSink>>,
    timeout: Option<Duration>,
}

impl SinkSet {
    /// A set holding only the null sink.
    pub fn new() -> Self {
        let mut sinks: HashMap<DestinationId, Arc<dyn PixelSink>> = HashMap::new();
        sinks.insert(DestinationId::null(), Arc::new(NullSink));
        Self {
            sinks,
            timeout: None,
        }
    }

    /// Open a DDP writer for every declared controller.
    pub async fn from_controllers(controllers: &[ControllerSpec]) -> Result<Self, CastError> {
        let mut set = Self::new();
        for spec in controllers {
            match &spec.kind {
                ControllerKind::Ddp { host, port } => {
                    let writer = DdpWriter::connect_port(host, *port).await?;
                    info!("destination {} -> ddp://{}", spec.id, writer.remote_addr());
                    set.insert(spec.id.clone(), writer);
                }
                ControllerKind::Null => {
                    set.insert(spec.id.clone(), NullSink);
                }
            }
        }
        Ok(set)
    }

    /// Bound every transmit call by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bind `sink` to `id`, replacing any previous binding.
    pub fn insert(
        &mut self,
        id: impl Into<DestinationId>,
        sink: impl PixelSink + 'static,
    ) -> Option<Arc<dyn PixelSink>> {
        self.sinks.insert(id.into(), Arc::new(sink))
    }

    pub fn contains(&self, id: &DestinationId) -> bool {
        self.sinks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Drop every sink, closing their sockets.
    pub fn clear(&mut self) {
        self.sinks.clear();
    }

    /// Fail unless every destination used by `mapping` has a sink.
    pub fn ensure_covers(&self, mapping: &Mapping) -> Result<(), CastError> {
        let missing: Vec<&str> = mapping
            .destinations()
            .iter()
            .filter(|d| !self.sinks.contains_key(&d.id))
            .map(|d| d.id.as_str())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CastError::Config(format!(
                "no controller declared for destination(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Hand `colors` to the sink bound to `id`.
    ///
    /// Unbound ids are skipped silently. Socket failures come back as
    /// [`CastError::Transmit`] naming the destination.
    pub async fn transmit(&self, id: &DestinationId, colors: &[Rgb]) -> Result<(), CastError> {
        let Some(sink) = self.sinks.get(id) else {
            debug!("no sink bound for {id}, dropping {} pixels", colors.len());
            return Ok(());
        };

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, sink.transmit(colors))
                .await
                .unwrap_or(Err(CastError::Timeout(limit))),
            None => sink.transmit(colors).await,
        };

        result.map_err(|e| match e {
            CastError::Io(source) => CastError::Transmit {
                destination: id.to_string(),
                source,
            },
            other => other,
        })
    }
}

impl Default for SinkSet {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────
