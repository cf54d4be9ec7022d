//! The frame-paced streaming loop.
//!
//! Each cycle:
//!
//! 1. Pull one frame from the [`FrameSource`].
//! 2. Skip it if it repeats the previous frame (bounded by
//!    `refresh_every`).
//! 3. [`Mapping::write`] samples and transmits per destination.
//! 4. Sleep the rest of the frame interval, or until cancelled.
//! 5. Record the completion time and publish a [`StreamStats`] snapshot.
//!
//! Timing goes through [`tokio::time::Instant`], so a paused test clock
//! drives the pacing too.
//!
//! The loop runs on one Tokio task and stops through a
//! [`CancellationToken`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CastError;
use crate::frame::{Frame, Rgb};
use crate::mapping::Mapping;
use crate::sink::SinkSet;
use crate::stream::phase::StreamPhase;
use crate::stream::source::FrameSource;
use crate::stream::stats::{FrameTimes, StreamStats};

// ── StreamConfig ─────────────────────────────────────────────────

/// Configuration for [`Streamer`].
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Target frames per second. Must be finite and positive; fractional
    /// rates such as `0.5` are allowed.
    pub target_fps: f64,
    /// A frame identical to the last one sent is re-sent only after
    /// this many cycles. 0 or 1 sends every frame.
    pub refresh_every: u32,
    /// Cycles kept for the rolling fps figure.
    pub stats_window: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            target_fps: 30.0,
            refresh_every: 30,
            stats_window: 20,
        }
    }
}

impl StreamConfig {
    /// Time budget per cycle. Zero when the rate is not a positive number.
    pub fn frame_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.target_fps).unwrap_or(Duration::ZERO)
    }

    pub fn validate(&self) -> Result<(), CastError> {
        if self.target_fps.is_finite() && self.target_fps > 0.0 {
            Ok(())
        } else {
            Err(CastError::invalid_argument(
                "stream",
                format!("target fps must be a positive number, got {}", self.target_fps),
            ))
        }
    }
}

// ── Streamer ─────────────────────────────────────────────────────

/// One streaming session: a mapping, its sinks and a frame source.
///
/// # Lifetime
///
/// Call [`run`](Self::run) once. It returns when the token from
/// [`cancel_token`](Self::cancel_token) is cancelled, when the source
/// ends, or when the source fails with an unrecoverable error. Sinks
/// are released in every case.
pub struct Streamer<S = Box<dyn FrameSource>> {
    mapping: Arc<Mapping>,
    sinks: SinkSet,
    source: S,
    config: StreamConfig,
    phase: StreamPhase,
    cancel: CancellationToken,
    times: FrameTimes,
    stats: StreamStats,
    stats_tx: watch::Sender<StreamStats>,
    /// Sampled colours of the last sent frame, in mapping order.
    pixels_tx: watch::Sender<Arc<[Rgb]>>,
    /// Last frame handed to the sinks, for duplicate detection.
    last_sent: Option<Frame>,
    cycles_since_send: u32,
}

impl<S: FrameSource> Streamer<S> {
    pub fn new(
        mapping: Arc<Mapping>,
        sinks: SinkSet,
        source: S,
        config: StreamConfig,
    ) -> Result<Self, CastError> {
        config.validate()?;
        let (stats_tx, _) = watch::channel(StreamStats::default());
        let (pixels_tx, _) = watch::channel(Arc::<[Rgb]>::from(Vec::new()));
        Ok(Self {
            mapping,
            sinks,
            source,
            times: FrameTimes::new(config.stats_window),
            config,
            phase: StreamPhase::Idle,
            cancel: CancellationToken::new(),
            stats: StreamStats::default(),
            stats_tx,
            pixels_tx,
            last_sent: None,
            cycles_since_send: 0,
        })
    }

    /// Stop on `token` instead of a private one.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that stops the loop when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Receiver for the snapshot published after every cycle.
    pub fn subscribe(&self) -> watch::Receiver<StreamStats> {
        self.stats_tx.subscribe()
    }

    /// Receiver for the colours sampled from each sent frame.
    ///
    /// Sampling for this channel only happens while a receiver is alive.
    pub fn subscribe_pixels(&self) -> watch::Receiver<Arc<[Rgb]>> {
        self.pixels_tx.subscribe()
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Run the loop until cancelled or the source ends.
    pub async fn run(&mut self) -> Result<StreamStats, CastError> {
        self.phase.start()?;
        self.publish();
        info!(
            "Streaming {} pixels to {} destinations at {} fps",
            self.mapping.len(),
            self.mapping.destinations().len(),
            self.config.target_fps
        );

        let result = self.stream().await;

        self.phase.begin_stop()?;
        self.publish();
        self.sinks.clear();
        self.phase.finish_stop()?;
        self.publish();
        info!(
            "Stream stopped: {} sent, {} dropped, {} duplicates, {} transmit errors",
            self.stats.frames_sent,
            self.stats.frames_dropped,
            self.stats.duplicates_skipped,
            self.stats.transmit_errors
        );

        result.map(|()| self.stats.clone())
    }

    async fn stream(&mut self) -> Result<(), CastError> {
        let interval = self.config.frame_interval();

        while !self.cancel.is_cancelled() {
            let cycle_start = Instant::now();

            let frame = match self.source.next_frame() {
                None => {
                    info!("Frame source ended");
                    return Ok(());
                }
                Some(Ok(frame)) => frame,
                Some(Err(e)) if e.is_recoverable() => {
                    self.stats.frames_dropped += 1;
                    debug!("Dropped frame: {e}");
                    self.publish();
                    tokio::task::yield_now().await;
                    continue;
                }
                Some(Err(e)) => return Err(e),
            };

            if self.is_repeat(&frame) {
                self.stats.duplicates_skipped += 1;
                self.cycles_since_send += 1;
            } else {
                if self.cancel.is_cancelled() {
                    break;
                }
                self.send(frame).await;
            }

            tokio::select! {
                _ = Self::pace(cycle_start, interval) => {}
                _ = self.cancel.cancelled() => {}
            }

            self.times.record();
            self.stats.fps = self.times.fps();
            self.publish();
        }
        Ok(())
    }

    fn is_repeat(&self, frame: &Frame) -> bool {
        match &self.last_sent {
            Some(last) => {
                self.cycles_since_send + 1 < self.config.refresh_every && last.same_pixels(frame)
            }
            None => false,
        }
    }

    async fn send(&mut self, frame: Frame) {
        let reports = self.mapping.write(&frame, &self.sinks).await;
        for report in &reports {
            if let Err(e) = &report.result {
                self.stats.transmit_errors += 1;
                warn!("Frame lost for {} ({} pixels): {e}", report.id, report.pixels);
            }
        }
        self.stats.frames_sent += 1;
        if self.pixels_tx.receiver_count() > 0 {
            self.pixels_tx
                .send_replace(self.mapping.sample_all(&frame).into());
        }
        self.last_sent = Some(frame);
        self.cycles_since_send = 0;
    }

    fn publish(&mut self) {
        self.stats.phase = self.phase;
        self.stats_tx.send_replace(self.stats.clone());
    }

    /// Sleep for the remainder of the frame interval.
    async fn pace(cycle_start: Instant, interval: Duration) {
        let elapsed = cycle_start.elapsed();
        if elapsed < interval {
            tokio::time::sleep(interval - elapsed).await;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
