//! Diagnostic tracing for the pursuit CLI.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: developer diagnostics filtered by `RUST_LOG`,
//!   written to stderr. Not persisted.
//!
//! - **Run log (`io/run_log`)**: the timestamped `.pursuit/logs.txt` record of
//!   each run. Always written, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the filter is `warn`, or
/// `warn,pursuit=debug` with `debug`.
///
/// # Example
/// ```bash
/// RUST_LOG=pursuit=trace pursuit run --model-path model.gguf
/// ```
pub fn init(debug: bool) {
    let fallback = if debug { "warn,pursuit=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // A second init (tests, embedding) keeps the existing subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
