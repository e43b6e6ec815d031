//! # MPEG Transport Stream (TS) Implementation
//!
//! Generation of the transport stream a single-program audio rendition
//! needs:
//!
//! - TS packet and adaptation field construction
//! - Program Specific Information (PAT/PMT) tables
//! - Packetized Elementary Stream (PES) packets with 90 kHz PTS
//! - The stateful ADTS→TS packetizer driving all of the above
//!
//! ## Example
//!
//! ```rust
//! use anarcast::codec::aac::AdtsFrame;
//! use anarcast::format::ts::{AdtsPacketizer, TsUnit, TS_PACKET_SIZE};
//!
//! # fn demo(frame: AdtsFrame) -> anarcast::Result<()> {
//! let mut packetizer = AdtsPacketizer::new(0, 10, true);
//! let mut units = Vec::new();
//! packetizer.packetize(&frame, &mut units)?;
//!
//! for unit in &units {
//!     if let TsUnit::Packet(bytes) = unit {
//!         assert_eq!(bytes.len(), TS_PACKET_SIZE);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// The stateful ADTS→TS packetizer
pub mod packetizer;

/// PES packet handling
pub mod pes;

/// PAT/PMT table generation
pub mod psi;

/// Core TS types and constants
pub mod types;

// Re-export commonly used types and constants
pub use packetizer::{AdtsPacketizer, TsUnit};
pub use pes::{PesHeader, PesPacket};
pub use psi::PsiTables;
pub use types::{
    TsHeader, PID_AAC, PID_PAT, PID_PMT, STREAM_ID_AAC, STREAM_TYPE_AAC, TS_PACKET_SIZE,
};
