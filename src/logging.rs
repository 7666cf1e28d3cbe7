use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// The terminal belongs to the UI, so everything is written to the log file.
/// `RUST_LOG` overrides the filter; `NOTIBELL_LOG_JSON=1` switches to JSON lines.
pub fn init(config: &Config) -> Result<()> {
    let Some(path) = config.log_path() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() { fs::create_dir_all(parent)?; }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Opening log file {:?}", &path))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,notibell=debug"));

    let json = std::env::var("NOTIBELL_LOG_JSON").map(|v| v == "1").unwrap_or(false);
    if json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(Mutex::new(file));
        tracing_subscriber::registry().with(env_filter).with(json_layer).try_init()?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true)
            .with_writer(Mutex::new(file));
        tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init()?;
    }

    tracing::info!(log = %path.display(), base_url = %config.base_url, "tracing initialized");
    Ok(())
}
