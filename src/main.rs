//! Application entry point for the `zegra` daemon.
//!
//! Startup sequence:
//! - Loading process settings from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Loading and validating the JSON fleet file
//! - Handing the fleet to the supervisor, which owns everything after that
//!
//! # Environment Variables
//! - `ZEGRA_CONFIG` (optional) – fleet file path (default: `./config/config.json`)
//! - `ZEGRA_LISTEN_PORT` (optional) – command listener port override
//! - `ZEGRA_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `ZEGRA_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! The process only exits on a fatal condition, always with a non-zero status.
use std::{env, io::IsTerminal, sync::Arc};

use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

use zegra::client::HttpVehicleApi;
use zegra::config::{self, FleetConfig};
use zegra::notify::NtfyNotifier;
use zegra::Supervisor;

// ---

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let settings = config::load_from_env()?;
    let mut cfg = FleetConfig::load(&settings.config_path)?;
    cfg.apply(&settings);
    cfg.log_config();

    let http = reqwest::Client::new();
    let api = HttpVehicleApi::new(http.clone(), &cfg.api_url, &cfg.locale);
    let notifier = Arc::new(NtfyNotifier::new(http));

    let outcome = Supervisor::new(api, notifier, Arc::new(cfg)).run().await;
    tracing::error!("Shutting down: {}", outcome);

    Err(outcome.into())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `ZEGRA_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by `RUST_LOG`, else the `ZEGRA_LOG_LEVEL` env var
///
/// Called once at startup before any logging macros are invoked.
fn init_tracing() {
    // ---
    let span_events = match env::var("ZEGRA_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to ZEGRA_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("ZEGRA_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},hyper=info,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
