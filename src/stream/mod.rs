//! # Per-mountpoint stream state and lifecycle
//!
//! A [`Stream`] holds the rolling window of HLS segments for one
//! mountpoint: the most recent chunks, oldest first, with strictly
//! increasing contiguous indices. One worker task appends and evicts;
//! HTTP handler tasks read concurrently through the same mutex, so every
//! reader observes a consistent window. The [`Directory`] supervises the
//! set of workers.

pub mod directory;
pub mod worker;

pub use directory::Directory;

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// Maximum chunks retained per stream.
const WINDOW: usize = 10;

/// Chunks a stream must hold before it is advertised to clients.
const MIN_READY: usize = 3;

/// Chunks advertised in the media playlist.
const PLAYLIST_LEN: usize = 3;

/// One HLS segment: a run of whole 188-byte TS packets.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Monotonically increasing segment number, used as the `.ts` name.
    pub index: u64,
    /// Segment duration in nanoseconds.
    pub duration: u64,
    /// Concatenated TS packets.
    pub data: Bytes,
}

/// Rolling segment window for one mountpoint.
#[derive(Debug, Default)]
pub struct Stream {
    chunks: Mutex<VecDeque<Chunk>>,
    done: AtomicBool,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a chunk by segment number.
    pub fn chunk(&self, index: u64) -> Option<Bytes> {
        self.chunks
            .lock()
            .iter()
            .find(|c| c.index == index)
            .map(|c| c.data.clone())
    }

    /// The last entries as `(index, duration)` pairs for the media
    /// playlist, oldest first. Empty until the stream is serviceable.
    pub fn index(&self) -> Vec<(u64, u64)> {
        let chunks = self.chunks.lock();
        if chunks.len() < MIN_READY {
            return Vec::new();
        }
        chunks
            .iter()
            .skip(chunks.len() - PLAYLIST_LEN)
            .map(|c| (c.index, c.duration))
            .collect()
    }

    /// Whether the stream has buffered enough to serve clients.
    pub fn ok(&self) -> bool {
        self.chunks.lock().len() > MIN_READY - 1
    }

    /// Appends a chunk and evicts from the front past the window bound.
    pub(crate) fn push(&self, chunk: Chunk) {
        let mut chunks = self.chunks.lock();
        chunks.push_back(chunk);
        while chunks.len() > WINDOW {
            chunks.pop_front();
        }
    }

    /// Drops every buffered chunk so readers immediately see the stream as
    /// not serviceable.
    pub(crate) fn clear(&self) {
        self.chunks.lock().clear();
    }

    /// Marks the worker as finished; the supervisor reaps the stream on
    /// its next tick.
    pub(crate) fn finish(&self) {
        self.done.store(true, Ordering::Release);
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}
