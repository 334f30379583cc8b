//! Gati - maneuver runner
//!
//! Connects to the robot backend and runs the fixed maneuver sequence:
//! turn around, drive up to the wall, then turn by 2π/5. The forward range
//! sweep is rendered to the terminal between steps.
//!
//! Usage: `gati [config.toml]`. Without an argument `gati.toml` is used if
//! present. `CMD_HOST`, `CMD_PORT`, `TEL_HOST`, `TEL_PORT` and `PROTO`
//! override the file.

use gati::config::GatiConfig;
use gati::error::Result;
use gati::motion::MotionController;
use gati::telemetry::FrameSource;
use gati::viz::render_sweep;
use gati::{CommandChannel, CommandSink, TelemetryChannel};

use std::f32::consts::PI;
use std::path::Path;
use std::time::Duration;
use tracing::{info, info_span, warn};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gati=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = if let Some(path) = args.get(1) {
        info!("Loading configuration from {}", path);
        GatiConfig::load(Path::new(path))?
    } else if Path::new("gati.toml").exists() {
        info!("Loading configuration from gati.toml");
        GatiConfig::load(Path::new("gati.toml"))?
    } else {
        info!("Using default configuration");
        GatiConfig::default()
    };
    config.apply_env()?;
    config.validate()?;

    info!("Gati v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Commands to {}, telemetry on {} ({})",
        config.command_address(),
        config.telemetry_address(),
        config.connection.transport
    );

    let commands = CommandChannel::connect(config.command_address(), info_span!("commands"))?;
    let telemetry = TelemetryChannel::connect(
        config.telemetry_address(),
        config.connection.transport,
        info_span!("telemetry"),
    )?;

    let mut bot = MotionController::new(telemetry, commands, config.motion, info_span!("bot"));

    show_sweep(&mut bot)?;
    bot.turn_by_relative_angle(PI)?;
    show_sweep(&mut bot)?;
    let approach = bot.config().approach;
    bot.approach_until_close(approach)?;
    std::thread::sleep(Duration::from_millis(500));
    show_sweep(&mut bot)?;
    bot.turn_by_relative_angle(PI * 2.0 / 5.0)?;
    show_sweep(&mut bot)?;

    info!("Maneuver sequence finished");
    Ok(())
}

/// Read a fresh frame, log the robot state and render its range sweep.
fn show_sweep<S: FrameSource, C: CommandSink>(bot: &mut MotionController<S, C>) -> Result<()> {
    let frame = bot.refresh()?;

    info!(
        x = frame.pose.x,
        y = frame.pose.y,
        heading = frame.pose.heading,
        vx = frame.linear.vx,
        vy = frame.linear.vy,
        yaw_rate = frame.yaw_rate,
        "Robot state"
    );

    match render_sweep(&frame.ranges) {
        Some(line) => {
            info!("Robot vision");
            println!("{}", line);
        }
        None if frame.ranges.is_empty() => warn!("No range data in frame"),
        None => warn!(
            "Expected 360 range samples, got {}; skipping render",
            frame.ranges.len()
        ),
    }

    Ok(())
}
