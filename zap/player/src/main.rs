//! Zap Player - Runs Zap Cue Scripts in Real Time
//!
//! Drives a [`zap_core::ZapAnimator`] from the wall clock and logs every
//! class change, speech bubble and vibration. Useful for checking state
//! timing and message pools without a browser.
//!
//! # Usage
//!
//! ```bash
//! # Built-in demo
//! zap-player
//!
//! # Custom cue script, reproducible picks
//! zap-player --script lesson.json --seed 7
//!
//! # Alternate state catalog
//! zap-player --config ./zap.toml
//!
//! # See cleared classes and timer detail
//! RUST_LOG=debug zap-player
//! ```
//!
//! # Signals
//!
//! - `SIGINT` (Ctrl-C): Stop the script, shut the animator down and exit

mod script;
mod surface;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use zap_core::{
    load_config, load_config_from_path, AnimatorConfig, ConfigOverrides, HapticFeedback,
    ZapAnimator,
};

use script::{Script, ScriptCursor};
use surface::{LogMessenger, LogRenderer};

/// Zap Player - play mascot cue scripts against the wall clock
#[derive(Parser, Debug)]
#[command(name = "zap-player")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "ZAP_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON cue script (plays the built-in demo when omitted)
    #[arg(short = 's', long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Seed for message and idle-variation picks
    #[arg(long)]
    seed: Option<u64>,

    /// Idle tick period in milliseconds (0 disables idle variations)
    #[arg(long, value_name = "MS")]
    idle_tick_ms: Option<u64>,

    /// Frame period in milliseconds
    #[arg(long, default_value_t = 50, value_name = "MS")]
    frame_ms: u64,

    /// Time to keep running after the last cue
    #[arg(long, default_value_t = 6000, value_name = "MS")]
    linger_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "ZAP_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Initialize logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("zap_player={level},zap_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    Ok(())
}

fn resolve_config(args: &Args) -> Result<AnimatorConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    ConfigOverrides {
        seed: args.seed,
        idle_tick_ms: args.idle_tick_ms,
    }
    .apply(&mut config)
    .context("Invalid command-line overrides")?;

    info!(source = %config.source(), states = config.state_table.len(), "Configuration loaded");
    Ok(config)
}

fn build_animator(config: AnimatorConfig) -> ZapAnimator {
    let mut builder = ZapAnimator::builder()
        .state_table(config.state_table)
        .settings(config.settings)
        .renderer(LogRenderer::new())
        .messenger(LogMessenger::new())
        .feedback(HapticFeedback::new(|pattern: &[u32]| {
            info!(?pattern, "📳 Vibrate");
        }));
    if let Some(seed) = config.seed {
        builder = builder.seed(seed);
    }
    builder.build()
}

/// Feed the script to the animator until it ends or Ctrl-C arrives
async fn run(animator: &mut ZapAnimator, script: Script, frame: Duration, linger_ms: u64) {
    let end_ms = script.end_ms().saturating_add(linger_ms);
    let mut cursor = ScriptCursor::new(script);

    let mut frames = tokio::time::interval(frame);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let started = Instant::now();
    loop {
        tokio::select! {
            _ = frames.tick() => {}
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Received SIGINT, stopping");
                break;
            }
        }

        let now_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        cursor.drive(animator, now_ms);

        if cursor.is_done() && now_ms >= end_ms && !animator.sequence_running() {
            info!(state = animator.current_state(), "Script finished");
            break;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging first
    init_logging(&args.log_level)?;

    info!("Zap Player starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = resolve_config(&args)?;
    let script = match &args.script {
        Some(path) => Script::load(path)?,
        None => {
            info!("No script given, playing the demo");
            Script::demo()
        }
    };

    let mut animator = build_animator(config);
    let frame = Duration::from_millis(args.frame_ms.max(1));
    run(&mut animator, script, frame, args.linger_ms).await;

    animator.shutdown();
    info!(
        now_ms = animator.now_ms(),
        pending_timers = animator.pending_timers(),
        "Zap Player stopped"
    );
    Ok(())
}
