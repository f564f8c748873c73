//!# Synology DSM API Client
//!
//! A Rust client library for the Synology DSM web API, with a strongly-typed
//! interface for the Download Station package.
//!
//! ## Features
//!
//! - API discovery through `SYNO.API.Info`, performed once per client
//! - Session handling with idempotent login and re-login on session timeout
//! - Uniform decoding of response envelopes into typed errors
//!   (common codes 100-107 and per-subsystem codes from 400)
//! - Typed, defaulting views over the loosely typed JSON payloads
//! - List tasks and get detailed task information (detail, transfer, files, trackers, peers)
//! - Create, pause, resume and delete tasks
//! - Download Station info, configuration and schedule
//! - Human-readable file sizes, progress calculation and ETA
//!
//! ## Usage example
//!
//! ```rust,no_run
//! use anyhow::Result;
//! use syno_api::client::SynoClient;
//! use syno_api::download_station::AdditionalField;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let client = SynoClient::builder()
//!         .host("nas.local")
//!         .port(5000)
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     client.login().await?;
//!
//!     let station = client.download_station();
//!     let tasks = station
//!         .task_list(0, -1, &[AdditionalField::Transfer])
//!         .await?;
//!     for task in &tasks {
//!         println!(
//!             "task: {}, title: {}, status: {:?}",
//!             task.id(),
//!             task.title(),
//!             task.status()
//!         );
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Every operation returns [`anyhow::Result`]. The underlying
//! [`error::SynoError`] can be recovered with `downcast_ref`:
//!
//! ```rust
//! use syno_api::error::{DownloadStationError, ErrorKind, Subsystem};
//!
//! assert_eq!(
//!     ErrorKind::DownloadStation(DownloadStationError::TaskNotFound),
//!     Subsystem::DownloadStation.resolve(404)
//! );
//! ```

pub mod client;
pub mod download_station;
pub mod entities;
pub mod entity;
pub mod error;
pub mod request;
pub mod session;
pub mod transport;
pub mod utils;
