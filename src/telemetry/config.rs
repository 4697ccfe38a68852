use anyhow::{Context, Result};
use chrono::Utc;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub fn logs_are_json() -> bool {
    matches!(std::env::var("HARVEST_LOG_FORMAT").as_deref(), Ok("json"))
}

/// Handle on the run's log sink. Created at startup and held for the run's
/// duration; carries the path of the timestamped log file for the banner.
pub struct LogSink {
    pub file: PathBuf,
}

/// Initialize tracing/logging according to RUST_LOG and HARVEST_LOG_FORMAT.
/// - Defaults to `info` if `RUST_LOG` is unset
/// - Supports `HARVEST_LOG_FORMAT=json` for JSON logs on the console
/// - Mirrors everything into `<log_dir>/<timestamp>_harvest.log`
pub fn init_tracing(log_dir: &Path) -> Result<LogSink> {
    use tracing_subscriber::prelude::*; // for .with()
    use tracing_subscriber::{EnvFilter, fmt};

    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let file_path = log_dir.join(format!(
        "{}_harvest.log",
        Utc::now().format("%Y-%m-%dT%H-%M-%S")
    ));
    let file = File::create(&file_path)
        .with_context(|| format!("creating log file {}", file_path.display()))?;

    // Default filter if RUST_LOG unset
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let builder = tracing_subscriber::registry().with(filter).with(file_layer);

    match std::env::var("HARVEST_LOG_FORMAT").as_deref() {
        Ok("json") => {
            let _ = builder
                .with(console_layer.json().flatten_event(true))
                .try_init();
        }
        _ => {
            // human-friendly compact text
            let _ = builder.with(console_layer.compact()).try_init();
        }
    }

    Ok(LogSink { file: file_path })
}
