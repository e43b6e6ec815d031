//! # Error Types
//!
//! This module provides the error types used throughout the anarcast crate.
//! It defines a central error type `CastError` that encapsulates all possible
//! errors that can occur while pulling, repackaging, and serving a stream.

use std::num::ParseIntError;
use thiserror::Error;

/// Primary error type for the anarcast crate
#[derive(Error, Debug)]
pub enum CastError {
    /// I/O errors that occur during network or buffer operations
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the upstream HTTP client
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Errors related to the upstream Icecast protocol (bad status, headers)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Errors that occur while parsing ADTS or ICY framing
    #[error("parser error: {0}")]
    Parser(String),

    /// Errors related to the audio codec parameters mid-stream
    #[error("codec error: {0}")]
    Codec(String),

    /// Errors for invalid or malformed input data
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Errors that occur during integer parsing (e.g. `Icy-Metaint`)
    #[error("parse int error: {0}")]
    ParseInt(#[from] ParseIntError),
}

/// A specialized Result type for anarcast operations.
///
/// This type is used throughout the crate to handle operations that can
/// produce a `CastError`.
pub type Result<T> = std::result::Result<T, CastError>;
