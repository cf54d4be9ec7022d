//! Configuration for the caster.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wledcast_core::{CastError, Corner, DDP_PORT, Rgb, StreamConfig};

const MIN_FPS: f64 = 0.1;
const MAX_FPS: f64 = 240.0;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CasterConfig {
    /// Where pixels go.
    pub network: NetworkConfig,
    /// Frame source and pacing.
    pub stream: StreamSettings,
    /// LED layout.
    pub mapping: MappingConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Receiver for LEDs not bound to a declared controller. Empty
    /// leaves them unsent.
    pub host: String,
    /// DDP port on `host`.
    pub port: u16,
}

/// Built-in frame generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    GrowingSquare,
    Solid,
    Checkerboard,
}

/// Frame source and pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Target frames per second (0.1..=240, fractions allowed).
    pub fps: f64,
    pub source: SourceKind,
    /// Side of the generated frames, in pixels.
    pub source_size: u32,
    /// Colour for the `solid` source.
    pub color: [u8; 3],
    /// Per-destination send deadline in milliseconds. 0 disables it.
    pub transmit_timeout_ms: u64,
    /// Re-send an unchanged frame after this many cycles. 0 uses `fps`.
    pub refresh_every: u32,
    /// Cycles in the rolling fps window.
    pub stats_window: usize,
    /// Redraw the layout in the terminal with the sampled colours.
    pub preview: bool,
}

/// LED layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// YAML topology file. If empty, a plain matrix is used.
    pub file: String,
    /// Matrix width when no file is given.
    pub width: u32,
    /// Matrix height when no file is given.
    pub height: u32,
    pub first_corner: Corner,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DDP_PORT,
        }
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            fps: 30.0,
            source: SourceKind::default(),
            source_size: 32,
            color: [255, 128, 0],
            transmit_timeout_ms: 0,
            refresh_every: 0,
            stats_window: 20,
            preview: false,
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            file: String::new(),
            width: 16,
            height: 16,
            first_corner: Corner::TopLeft,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl CasterConfig {
    /// Load configuration from a TOML file.
    ///
    /// `Ok(None)` when the file does not exist. A file that cannot be
    /// read or parsed is a [`CastError::Config`].
    pub fn load(path: &Path) -> Result<Option<Self>, CastError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CastError::Config(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        toml::from_str(&contents)
            .map(Some)
            .map_err(|e| CastError::Config(format!("invalid config {}: {e}", path.display())))
    }

    /// Write the default configuration to a file (for bootstrapping).
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Clamped fps as used by the streaming loop. A value that is not a
    /// number falls back to the default rate.
    pub fn fps(&self) -> f64 {
        let fps = self.stream.fps;
        if fps.is_nan() {
            return StreamSettings::default().fps;
        }
        fps.clamp(MIN_FPS, MAX_FPS)
    }

    /// Frames in roughly one second, at least 1.
    pub fn frames_per_second(&self) -> u32 {
        self.fps().round().max(1.0) as u32
    }

    /// Convert stream settings into a [`StreamConfig`].
    pub fn to_stream_config(&self) -> StreamConfig {
        StreamConfig {
            target_fps: self.fps(),
            refresh_every: match self.stream.refresh_every {
                0 => self.frames_per_second(),
                n => n,
            },
            stats_window: self.stream.stats_window.max(2),
        }
    }

    pub fn transmit_timeout(&self) -> Option<Duration> {
        match self.stream.transmit_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn solid_color(&self) -> Rgb {
        Rgb::from(self.stream.color)
    }

    /// The default host, if one is configured.
    pub fn host(&self) -> Option<&str> {
        Some(self.network.host.trim()).filter(|h| !h.is_empty())
    }

    /// The topology file, if one is configured.
    pub fn mapping_file(&self) -> Option<&Path> {
        Some(self.mapping.file.trim())
            .filter(|f| !f.is_empty())
            .map(Path::new)
    }
}

// ── Tests ────────────────────────────────────────────────────────
