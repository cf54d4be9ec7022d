//! wledcast: entry point.
//!
//! ```text
//! wledcast                       Stream using wledcast.toml (or defaults)
//! wledcast --config <path>       Load a custom config TOML
//! wledcast --host wled.local     Send unbound LEDs to this receiver
//! wledcast --mapping layout.yaml Use a YAML topology
//! wledcast --preview             Draw the sampled LEDs in the terminal
//! wledcast --render ascii        Print the mapping and exit
//! wledcast --gen-config          Write default config to stdout
//! wledcast --write-config <path> Write default config to a file
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wledcast_caster::config::CasterConfig;
use wledcast_caster::service::{CastService, RenderFormat};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "wledcast", about = "Cast frames onto LED layouts over DDP")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "wledcast.toml")]
    config: PathBuf,

    /// Default DDP receiver (overrides `network.host`).
    #[arg(long)]
    host: Option<String>,

    /// Target frames per second (overrides `stream.fps`).
    #[arg(long)]
    fps: Option<f64>,

    /// YAML topology file (overrides `mapping.file`).
    #[arg(short, long)]
    mapping: Option<PathBuf>,

    /// Redraw the layout with the sampled colours after every frame.
    #[arg(long)]
    preview: bool,

    /// Print the mapping in this format and exit.
    #[arg(long, value_enum)]
    render: Option<RenderFormat>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Write the default configuration to this file and exit.
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&CasterConfig::default())?;
        println!("{text}");
        return Ok(());
    }
    if let Some(path) = &cli.write_config {
        CasterConfig::write_default(path)?;
        println!("wrote default config to {}", path.display());
        return Ok(());
    }

    // Load config, then apply command-line overrides. Load problems are
    // reported once logging is up.
    let loaded = CasterConfig::load(&cli.config);
    let mut config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => CasterConfig::default(),
    };
    if let Some(host) = cli.host {
        config.network.host = host;
    }
    if let Some(fps) = cli.fps {
        config.stream.fps = fps;
    }
    if cli.preview {
        config.stream.preview = true;
    }
    if let Some(mapping) = cli.mapping {
        config.mapping.file = mapping.to_string_lossy().into_owned();
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match loaded {
        Ok(Some(_)) => info!("config: {}", cli.config.display()),
        Ok(None) => info!("no config at {}; using defaults", cli.config.display()),
        Err(e) => warn!("{e}; using defaults"),
    }

    let service = CastService::new(config.clone());

    if let Some(format) = cli.render {
        println!("{}", service.render(format)?);
        return Ok(());
    }

    info!("wledcast v{}", env!("CARGO_PKG_VERSION"));
    info!("default host: {}", config.host().unwrap_or("(none)"));
    info!("target FPS: {}", config.fps());
    info!("source: {:?}", config.stream.source);

    // Ctrl-C handler.
    let stop = service.stop_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop.cancel();
    });

    service.run().await?;

    Ok(())
}
