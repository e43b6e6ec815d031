//! # Utility Functions and Types
//!
//! Common utilities used throughout the anarcast crate:
//!
//! - Bit-level reading for fixed-layout binary headers
//! - MPEG-2 CRC32 for Transport Stream PSI tables

/// Bit manipulation and bitstream reading utilities
pub mod bits;

/// CRC calculation implementations
pub mod crc;

// Re-export commonly used types
pub use bits::BitReader;
pub use crc::Crc32Mpeg2;
