//! # Filegate - sandboxed file-operation HTTP proxy
//!
//! Filegate exposes a small set of file operations (stat, download, upload,
//! mkdir, delete, move/copy, search, thumbnail) over HTTP, gated by a
//! whitelist of allowed base directories. Every path is resolved and
//! symlink-checked before any operation touches the filesystem.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use filegate::config::Config;
//! use filegate::http::{routes::build_router, state::AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = AppState::new(config);
//!     let app = build_router(state);
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(dead_code)]

pub mod archive;
pub mod config;
pub mod error;
pub mod fileops;
pub mod http;
pub mod index;
pub mod logging;
pub mod ownership;
pub mod pathgate;
pub mod scanner;
pub mod search;
pub mod thumbnail;
pub mod upload;

pub use config::Config;
pub use error::FilegateError;
pub use pathgate::PathGate;

// vim: ts=4
