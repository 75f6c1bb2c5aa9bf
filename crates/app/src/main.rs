//! Calligraph - headless calligraphy canvas host
//!
//! Replays a script of UI messages (one JSON `UiToCanvas` per line) against
//! the canvas and writes PNG/SVG exports. Without a script argument a
//! built-in demo is played.

use std::process::ExitCode;

use calligraphy::CalligraphyCanvas;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod script;

use config::CalligraphConfig;
use script::{Replay, demo_script, load_script};

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CalligraphConfig::from_env()?;
    std::fs::create_dir_all(&config.out_dir)?;

    let messages = match std::env::args_os().nth(1) {
        Some(path) => {
            info!("Replaying script {}", path.to_string_lossy());
            load_script(path.as_ref())?
        }
        None => {
            info!("No script given, playing the built-in demo");
            demo_script()
        }
    };

    let mut canvas = CalligraphyCanvas::new(config.tuning.clone());
    let report = Replay::new(&mut canvas, &config.out_dir).run(messages)?;

    info!(
        "Replayed {} messages over {} frames: {} exports, {} failures",
        report.messages,
        report.frames,
        report.exports.len(),
        report.failures.len()
    );
    if report.failures.is_empty() {
        Ok(())
    } else {
        Err(format!("{} canvas operations failed", report.failures.len()).into())
    }
}
