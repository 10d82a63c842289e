//! Logging configuration for the harness.
//!
//! Stdout only. INFO+ by default; set `DEBUG_LOGGING=1` (or pass `--debug`)
//! for DEBUG+ from the exomech crates. `RUST_LOG` overrides both.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEBUG_DIRECTIVE: &str = "info,exomech=debug,exomech_core=debug";

pub fn init(debug_flag: bool) {
    let debug_logging = debug_flag || std::env::var("DEBUG_LOGGING").is_ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug_logging { DEBUG_DIRECTIVE } else { "info" })
    });

    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(true);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(filter)
        .init();

    tracing::debug!(debug_logging, "Logging initialized");
}
