//! retrovdp-render - render a scrolling tile map headless
//!
//! # Usage
//!
//! ```bash
//! retrovdp-render --bundle assets/ --map level1 --frames 120 --out frame.png
//!
//! # Same scene on the GPU compositor, faster scroll
//! retrovdp-render --bundle assets/ --map level1 --backend gpu --scroll-speed 3 --out gpu.png
//! ```
//!
//! The last frame is written as PNG and its xxh3 checksum printed, so CPU
//! and GPU output can be compared from the shell.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use retrovdp::{AssetBundle, BackendKind, BgOptions, Vdp, VdpConfig};
use retrovdp_core::FrameLoop;

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Cpu,
    Gpu,
}

impl From<Backend> for BackendKind {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Cpu => BackendKind::Cpu,
            Backend::Gpu => BackendKind::Gpu,
        }
    }
}

/// Render a tile map from an asset bundle to PNG
#[derive(Parser)]
#[command(name = "retrovdp-render")]
#[command(version)]
struct Args {
    /// Asset bundle directory (manifest.json + bank images)
    #[arg(long)]
    bundle: PathBuf,

    /// Map to draw
    #[arg(long)]
    map: String,

    /// Logical frames to run
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Compositor (overrides the config file)
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Horizontal scroll in pixels per frame
    #[arg(long, default_value_t = 1)]
    scroll_speed: i32,

    /// VDP configuration (vdp.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG
    #[arg(long)]
    out: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => VdpConfig::load(path)?,
        None => VdpConfig::default(),
    };
    if let Some(backend) = args.backend {
        config.backend = backend.into();
    }
    let pacing = config.pacing.clone();

    let bundle = AssetBundle::load(&args.bundle)
        .with_context(|| format!("Failed to load bundle {}", args.bundle.display()))?;
    let mut vdp = Vdp::new(config, bundle)?;
    let map = vdp.map(&args.map)?.clone();

    let speed = args.scroll_speed;
    let mut frame_loop = FrameLoop::new(pacing.clone(), 0i32, move |scroll: i32, vdp: &mut Vdp| {
        if let Err(e) = vdp.draw_background(&map, &BgOptions::scrolled(scroll, 0)) {
            tracing::error!("draw_background failed: {}", e);
        }
        scroll.wrapping_add(speed)
    });

    // Feed the scheduler ideal timestamps
    let delta = pacing.nominal_delta();
    let mut ran = 0;
    let mut callback = 0u64;
    while ran < args.frames {
        ran += frame_loop.on_animation_frame(callback as f64 * delta, &mut vdp)?;
        callback += 1;
    }

    let stats = vdp.get_and_reset_stats();
    if stats.has_drops() {
        tracing::warn!("Capacity overflow during run: {:?}", stats);
    }
    tracing::info!(
        "{} frames on {} compositor, peak frame time {:?}",
        stats.frames,
        vdp.backend_name(),
        frame_loop.timings().peak
    );

    let frame = vdp.frame();
    frame
        .to_image()
        .save(&args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    println!("{} {:016x}", args.out.display(), frame.checksum());
    Ok(())
}
