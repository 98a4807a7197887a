use crate::error::{Result, ReviewError};
use chrono::Local;
use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;
use tracing_subscriber::EnvFilter;
use yansi::Paint;

/// Installs the terminal logger used by the CLI
///
/// `RUST_LOG` wins over `log_level`. Library events emitted through `tracing` reach this
/// logger via tracing's `log` feature.
pub fn init(log_level: &str) -> Result<()> {
    let level = parse_log_level(log_level);
    let env = Env::default()
        .filter_or("RUST_LOG", level.as_str().to_lowercase())
        .write_style_or("RUST_LOG_STYLE", "auto");

    Builder::from_env(env)
        .format(|buf, record| writeln!(buf, "{}", format_log(record)))
        .try_init()
        .map_err(|e| ReviewError::Config(format!("logger already initialised: {}", e)))
}

/// Installs a `tracing` subscriber for the HTTP server
///
/// Honours `RUST_LOG`, defaulting to `default_directive` (e.g. `"info"`).
pub fn init_server_tracing(default_directive: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| ReviewError::Config(format!("invalid log filter: {}", e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| ReviewError::Config(format!("tracing already initialised: {}", e)))
}

/// Formats a log record as `[timestamp] LEVEL [target] message`
pub fn format_log(record: &log::Record) -> String {
    let level = match record.level() {
        log::Level::Error => Paint::red("ERROR").bold(),
        log::Level::Warn => Paint::yellow("WARN ").bold(),
        log::Level::Info => Paint::cyan("INFO ").bold(),
        log::Level::Debug => Paint::blue("DEBUG").bold(),
        log::Level::Trace => Paint::new("TRACE"),
    };

    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let target = if !record.target().is_empty() {
        record.target()
    } else {
        record.module_path().unwrap_or("llamareview")
    };

    format!("[{}] {} [{}] {}", timestamp, level, target, record.args())
}

/// Parses a log level string into a LevelFilter, defaulting to Info
pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}
