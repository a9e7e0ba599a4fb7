//! Filegate command-line entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use filegate::config::Config;
use filegate::http::routes::build_router;
use filegate::http::state::AppState;
use filegate::logging::{error, info, init_tracing};

#[derive(Parser)]
#[command(name = "filegate", about = "Sandboxed file-operation HTTP proxy")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the HTTP server
	Serve,
	/// Run a single full scan of all allowed base paths and exit
	ScanNow,
	/// Validate the environment configuration and exit
	CheckConfig,
}

fn main() -> ExitCode {
	init_tracing();

	let cli = Cli::parse();

	let config = match Config::from_env() {
		Ok(c) => c,
		Err(e) => {
			error!(error = %e, "configuration error");
			return ExitCode::FAILURE;
		}
	};

	match cli.command {
		Commands::CheckConfig => match validate_base_paths(&config.allowed_base_paths) {
			Ok(()) => {
				info!(port = config.port, bases = ?config.allowed_base_paths, "configuration is valid");
				ExitCode::SUCCESS
			}
			Err(e) => {
				error!(error = %e, "configuration error");
				ExitCode::FAILURE
			}
		},
		Commands::Serve => run_async(serve(config)),
		Commands::ScanNow => run_async(scan_now(config)),
	}
}

/// Resolve every configured base path once at startup so a typo'd or
/// missing base fails the process immediately instead of surfacing as a
/// 500 on the first request that touches it.
fn validate_base_paths(bases: &[std::path::PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
	for base in bases {
		std::fs::canonicalize(base)
			.map_err(|e| format!("cannot resolve configured base path {:?}: {}", base, e))?;
	}
	Ok(())
}

fn run_async(fut: impl std::future::Future<Output = Result<(), Box<dyn std::error::Error>>>) -> ExitCode {
	let runtime = match tokio::runtime::Runtime::new() {
		Ok(rt) => rt,
		Err(e) => {
			error!(error = %e, "failed to start async runtime");
			return ExitCode::FAILURE;
		}
	};

	match runtime.block_on(fut) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!(error = %e, "command failed");
			ExitCode::FAILURE
		}
	}
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
	validate_base_paths(&config.allowed_base_paths)?;

	let port = config.port;
	let expiry_secs = config.upload_expiry_secs;
	let cleanup_interval = config.disk_cleanup_interval;
	let temp_dir = config.upload_temp_dir.clone();

	let state = AppState::new(config);

	filegate::upload::janitor::spawn(temp_dir, expiry_secs, cleanup_interval);

	if let Some(index) = state.index.clone() {
		let bases = state.gate.base_paths().to_vec();
		let concurrency = state.config.index_scan_concurrency;
		let rescan_interval = state.config.index_rescan_interval;
		tokio::spawn(async move {
			loop {
				let counts = filegate::scanner::scan_all(index.clone(), &bases, concurrency).await;
				info!(
					scanned = counts.scanned,
					added = counts.added,
					moved = counts.moved,
					removed = counts.removed,
					duration_ms = counts.duration_ms,
					"index scan complete"
				);
				tokio::time::sleep(rescan_interval).await;
			}
		});
	}

	let app = build_router(state);
	let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
	info!(port, "filegate listening");
	axum::serve(listener, app).await?;
	Ok(())
}

async fn scan_now(config: Config) -> Result<(), Box<dyn std::error::Error>> {
	validate_base_paths(&config.allowed_base_paths)?;

	if !config.enable_index {
		error!("ENABLE_INDEX is false, nothing to scan");
		return Err("indexing disabled".into());
	}

	let store = Arc::new(filegate::index::IndexStore::open(&config.index_database_url)?);
	let counts =
		filegate::scanner::scan_all(store, &config.allowed_base_paths, config.index_scan_concurrency).await;
	info!(
		scanned = counts.scanned,
		added = counts.added,
		moved = counts.moved,
		removed = counts.removed,
		duration_ms = counts.duration_ms,
		"scan complete"
	);
	Ok(())
}

// vim: ts=4
