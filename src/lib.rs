//! # anarcast - Icecast to HLS repackager
//!
//! `anarcast` pulls live ADTS/AAC audio streams from an Icecast-style HTTP
//! origin and repackages them into HTTP Live Streaming segments. For each
//! configured mountpoint it maintains a rolling window of MPEG-TS segments
//! and serves the master playlist, chunk list, and segment endpoints.
//!
//! ## Pipeline
//!
//! ```text
//! upstream body -> icy demux -> adts sync -> ts packetizer -> segmenter -> http
//! ```
//!
//! - [`format::icy`] strips inline ICY metadata blocks from the audio
//!   byte stream
//! - [`codec::aac`] recovers whole ADTS frames and decodes their headers
//! - [`format::ts`] builds PAT/PMT, PES, and transport stream packets
//!   with 90 kHz timing
//! - [`stream`] drives the pipeline per mountpoint and maintains the
//!   bounded rolling segment window under a concurrent-readers /
//!   single-writer discipline
//! - [`server`] routes HTTP requests onto directory and stream lookups
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anarcast::server::{router, AppState};
//! use anarcast::stream::Directory;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let directory = Directory::new(
//!         vec!["Blues".to_string()],
//!         "http://origin.example".to_string(),
//!         reqwest::Client::new(),
//!     );
//!     directory.spawn_supervisor();
//!
//!     let app = router(AppState {
//!         directory,
//!         redirect: None,
//!         min_streams: 0,
//!     });
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8888").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

/// Codec implementations (AAC/ADTS)
pub mod codec;

/// Error types and utilities
pub mod error;

/// Media format implementations (ICY, TS, HLS)
pub mod format;

/// HTTP serving glue
pub mod server;

/// Per-mountpoint streams, workers, and the directory
pub mod stream;

/// Common utilities and helper functions
pub mod utils;

pub use error::{CastError, Result};
