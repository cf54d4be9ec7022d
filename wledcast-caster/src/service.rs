//! Caster session wiring.
//!
//! Loads the layout, opens a sink per destination, picks a frame
//! source and drives the streaming loop until stopped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use wledcast_core::geometry::matrix;
use wledcast_core::mapping::{AsciiOptions, render_ascii, render_svg};
use wledcast_core::stream::{Checkerboard, GrowingSquare, SolidColor};
use wledcast_core::{
    CastError, ControllerSpec, DdpWriter, DestinationId, FrameSource, Mapping, Rgb, SinkSet,
    StreamStats, Streamer, Topology,
};

use crate::config::{CasterConfig, SourceKind};

/// Output formats for `--render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RenderFormat {
    Ascii,
    Svg,
    Json,
}

// ── CastService ──────────────────────────────────────────────────

/// The top-level caster.
pub struct CastService {
    config: CasterConfig,
    cancel: CancellationToken,
}

impl CastService {
    pub fn new(config: CasterConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// A handle that stops the service from another task.
    pub fn stop_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The configured topology, or a plain matrix when none is set.
    pub fn load_mapping(&self) -> Result<(Mapping, Vec<ControllerSpec>), CastError> {
        match self.config.mapping_file() {
            Some(path) => Ok(Topology::load(path)?.into_parts()),
            None => {
                let m = &self.config.mapping;
                info!("No topology file; using a {}x{} matrix", m.width, m.height);
                Ok((
                    Mapping::new(matrix(m.width, m.height, m.first_corner)),
                    Vec::new(),
                ))
            }
        }
    }

    /// Open a sink for every destination `mapping` uses.
    ///
    /// With a default host configured, LEDs not bound to any controller
    /// are sent there instead of being discarded.
    pub async fn bind_sinks(
        &self,
        mapping: &Mapping,
        controllers: &[ControllerSpec],
    ) -> Result<SinkSet, CastError> {
        let mut sinks = SinkSet::from_controllers(controllers)
            .await?
            .with_timeout(self.config.transmit_timeout());

        if let Some(host) = self.config.host() {
            let writer = DdpWriter::connect_port(host, self.config.network.port).await?;
            info!("Unbound LEDs -> ddp://{}", writer.remote_addr());
            sinks.insert(DestinationId::null(), writer);
        } else if mapping.destination(&DestinationId::null()).is_some() {
            warn!("Some LEDs have no controller and no host is set; they will not be sent");
        }

        sinks.ensure_covers(mapping)?;
        Ok(sinks)
    }

    /// The frame generator selected in the config.
    pub fn make_source(&self) -> Box<dyn FrameSource> {
        let size = self.config.stream.source_size.max(1);
        match self.config.stream.source {
            SourceKind::GrowingSquare => Box::new(GrowingSquare::new(size)),
            SourceKind::Solid => Box::new(SolidColor::new(size, size, self.config.solid_color())),
            SourceKind::Checkerboard => {
                Box::new(Checkerboard::new(size, size, (size / 8).max(1)).with_period(self.config.frames_per_second()))
            }
        }
    }

    /// Print the loaded mapping in `format`.
    pub fn render(&self, format: RenderFormat) -> Result<String, CastError> {
        let (mapping, _) = self.load_mapping()?;
        match format {
            RenderFormat::Ascii => render_ascii(&mapping, AsciiOptions::default(), None),
            RenderFormat::Svg => render_svg(&mapping, 10.0, None),
            RenderFormat::Json => mapping.to_json(),
        }
    }

    /// Run until stopped or the source ends.
    pub async fn run(&self) -> Result<StreamStats, CastError> {
        let (mapping, controllers) = self.load_mapping()?;
        if mapping.is_empty() {
            return Err(CastError::EmptyMapping);
        }
        info!("{mapping}");

        let sinks = self.bind_sinks(&mapping, &controllers).await?;
        let source = self.make_source();
        let mapping = Arc::new(mapping);

        let mut streamer = Streamer::new(
            Arc::clone(&mapping),
            sinks,
            source,
            self.config.to_stream_config(),
        )?
        .with_cancel_token(self.cancel.child_token());

        let reporter = tokio::spawn(report_stats(streamer.subscribe(), self.cancel.clone()));
        let preview = self.config.stream.preview.then(|| {
            tokio::spawn(live_preview(
                mapping,
                streamer.subscribe_pixels(),
                self.cancel.clone(),
            ))
        });

        let result = streamer.run().await;
        reporter.abort();
        if let Some(task) = preview {
            task.abort();
        }
        result
    }
}

/// The layout with every dark LED drawn as `.`.
pub fn preview_text(mapping: &Mapping, colors: &[Rgb]) -> Result<String, CastError> {
    render_ascii(mapping, AsciiOptions::default(), Some(colors))
}

/// Redraw the terminal preview after every sent frame.
async fn live_preview(
    mapping: Arc<Mapping>,
    mut rx: watch::Receiver<Arc<[Rgb]>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = cancel.cancelled() => break,
        }
        let colors = Arc::clone(&rx.borrow_and_update());
        match preview_text(&mapping, &colors) {
            // Home the cursor and clear, then draw.
            Ok(text) => println!("\x1b[H\x1b[2J{text}"),
            Err(e) => {
                warn!("Preview stopped: {e}");
                break;
            }
        }
    }
}

/// Log throughput once a second until cancelled or the stream closes.
async fn report_stats(mut rx: watch::Receiver<StreamStats>, cancel: CancellationToken) {
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    tick.tick().await;
    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = cancel.cancelled() => break,
        }
        if rx.has_changed().is_err() {
            break;
        }
        let s = rx.borrow_and_update().clone();
        let uptime = s.phase.running_for().unwrap_or_default().as_secs();
        info!(
            "up {uptime}s | {:.1} fps | sent {} | dropped {} | duplicates {} | errors {}",
            s.fps, s.frames_sent, s.frames_dropped, s.duplicates_skipped, s.transmit_errors
        );
    }
}

// ── Tests ────────────────────────────────────────────────────────
