//! # Media Format Implementations
//!
//! This module provides the container and framing formats the repackager
//! speaks:
//!
//! - **ICY**: Icecast/SHOUTcast inline metadata demuxing
//! - **TS**: MPEG Transport Stream packet, PSI, and PES generation
//! - **HLS**: master and media playlist rendering

/// HLS playlist rendering
pub mod hls;
/// Icecast inline metadata (ICY) demuxing
pub mod icy;
/// MPEG Transport Stream (TS) format implementation
pub mod ts;

// Re-export commonly used types
pub use self::icy::IcyDemux;
pub use self::ts::{AdtsPacketizer, TsUnit};
