//! Logging prelude module for convenient access to tracing macros.
//!
//! Re-exports the common tracing macros so call sites don't need to
//! `use tracing::info` individually everywhere.

pub use tracing::{debug, error, info, trace, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// Logs at INFO and above by default. Control with `RUST_LOG`:
///
/// ```bash
/// RUST_LOG=debug filegate serve
/// RUST_LOG=filegate::upload=trace filegate serve
/// ```
pub fn init_tracing() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_writer(std::io::stderr)
		.init();
}

// vim: ts=4
