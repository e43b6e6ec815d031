//! # Audio Codec Implementations
//!
//! This module provides the codec-level parsing the repackager needs.
//! Only AAC is supported: the upstream Icecast origins carry ADTS-framed
//! AAC, and the transport stream output advertises `mp4a.40.2`.
//!
//! ## AAC Audio
//! Implementation supporting:
//! - ADTS frame synchronization over arbitrary byte runs
//! - ADTS header field extraction
//! - Derived timing (frames per second, frame duration)

#[doc = "AAC (Advanced Audio Coding) codec implementation

Provides ADTS frame synchronization and header field access"]
pub mod aac;

// Re-export common types
#[doc(inline)]
pub use aac::{AdtsFrame, AdtsSync};
