//! handwheel - drive a racing game by holding an imaginary steering wheel.
//!
//! Reads two tracked hands per frame, turns the wrist-to-wrist angle into
//! steering keys and thumb poses into throttle/brake keys.

mod actuator;
mod control;
mod drive;
mod frame_timing;
mod hand;
mod hud;
mod source;

use std::path::PathBuf;

use anyhow::{anyhow, bail};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "handwheel", about = "Hand-gesture steering wheel for driving games")]
struct Cli {
    /// Pose source: replay or demo
    #[arg(long, default_value = "demo")]
    source: String,

    /// Replay file of s-expression frames ("-" for stdin)
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Frame size (WxH) for replayed frames that omit :width/:height
    #[arg(long, default_value = "640x480")]
    replay_size: String,

    /// Key output: log (dry run) or uinput
    #[arg(long, default_value = "log")]
    backend: String,

    /// Dead zone in degrees
    #[arg(long, default_value_t = 20.0)]
    dead_zone: f64,

    /// Angle in degrees at which steering saturates
    #[arg(long, default_value_t = 60.0)]
    max_angle: f64,

    /// Steering smoothing, 0 (none) to just under 1
    #[arg(long, default_value_t = 0.0)]
    smoothing: f64,

    /// Recovery strength on direction reversal, 0 to 1
    #[arg(long, default_value_t = 0.0)]
    recovery_factor: f64,

    /// Recovery decay time in seconds (0 disables recovery)
    #[arg(long, default_value_t = 0.0)]
    recovery_duration: f64,

    /// Thumb-open margin in normalized frame units
    #[arg(long, default_value_t = 0.03)]
    thumb_margin: f32,

    /// Stop the demo source after N frames
    #[arg(long)]
    demo_frames: Option<u64>,

    /// Demo source frame rate
    #[arg(long, default_value_t = 30.0)]
    demo_fps: f64,

    /// Exit after N seconds
    #[arg(long)]
    exit_after: Option<f64>,

    /// Seconds between status log lines (0 disables)
    #[arg(long, default_value_t = 5)]
    status_interval: u64,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("handwheel {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handwheel=info".into()),
        )
        .init();

    info!("handwheel v{} starting", env!("CARGO_PKG_VERSION"));

    let steering = control::SteeringConfig {
        dead_zone_deg: cli.dead_zone,
        max_angle_deg: cli.max_angle,
        smoothing: cli.smoothing,
        recovery_factor: cli.recovery_factor,
        recovery_duration_s: cli.recovery_duration,
    };
    steering
        .validate()
        .map_err(|e| anyhow!("invalid steering config: {}", e))?;
    info!("steering: {}", steering.to_sexp());

    if !(cli.thumb_margin.is_finite() && cli.thumb_margin >= 0.0) {
        bail!("invalid thumb margin: {}", cli.thumb_margin);
    }
    let wheel = hand::WheelConfig {
        thumb_margin: cli.thumb_margin,
    };

    let source_type = match cli.source.as_str() {
        "replay" => {
            let path = cli
                .replay
                .ok_or_else(|| anyhow!("--source replay needs --replay <path|->"))?;
            let (default_width, default_height) =
                source::replay::ReplayConfig::parse_size(&cli.replay_size).ok_or_else(|| {
                    anyhow!("invalid --replay-size: {} (expected WxH)", cli.replay_size)
                })?;
            source::SourceType::Replay {
                path,
                config: source::replay::ReplayConfig {
                    default_width,
                    default_height,
                },
            }
        }
        "demo" => {
            let demo = source::demo::DemoConfig {
                frame_count: cli.demo_frames,
                fps: cli.demo_fps,
                ..Default::default()
            };
            demo.validate()
                .map_err(|e| anyhow!("invalid demo config: {}", e))?;
            source::SourceType::Demo(demo)
        }
        other => bail!("Unknown source: {other}. Use: replay or demo"),
    };

    let backend_type = match cli.backend.as_str() {
        "log" => actuator::BackendType::Log,
        "uinput" => actuator::BackendType::Uinput,
        other => bail!("Unknown backend: {other}. Use: log or uinput"),
    };

    let loop_config = drive::LoopConfig::from_secs(cli.exit_after, cli.status_interval)
        .map_err(|e| anyhow!("invalid loop config: {}", e))?;

    let backend = actuator::create(backend_type)?;
    let mut source = source::open(source_type)?;

    // Signal handling via libc
    drive::install_signal_handlers();

    let mut control_loop = drive::ControlLoop::new(wheel, steering, backend);
    let reason = control_loop.run(&mut source, &drive::SHUTDOWN_REQUESTED, &loop_config)?;
    info!("handwheel exiting ({})", reason.as_str());
    Ok(())
}
