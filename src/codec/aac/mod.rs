//! AAC/ADTS handling: frame synchronization and header field access.
//!
//! The synchronizer ([`AdtsSync`]) recovers whole ADTS frames from an
//! arbitrary byte stream; [`AdtsFrame`] decodes the fixed-layout header
//! fields and the timing values derived from them.

pub mod sync;
pub mod types;

pub use sync::{AdtsSync, RESYNC_LIMIT};
pub use types::{AdtsFrame, AdtsHeader};
