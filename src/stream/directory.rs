//! Registry of stream workers keyed by mountpoint.
//!
//! A supervisor task ticks once per second: configured mountpoints with no
//! live stream get a fresh worker, and streams whose worker has finished
//! (upstream failure plus backoff) are reaped so the next tick replaces
//! them.

use super::{worker, Stream};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Supervisor tick interval.
const TICK: Duration = Duration::from_secs(1);

/// Maps mountpoint names to their streams and supervises the workers.
pub struct Directory {
    streams: Mutex<HashMap<String, Arc<Stream>>>,
    mounts: Vec<String>,
    base: String,
    client: reqwest::Client,
}

impl Directory {
    /// `mounts` is the static list of mountpoints to pull from the origin
    /// at `base` (no trailing slash).
    pub fn new(mounts: Vec<String>, base: String, client: reqwest::Client) -> Arc<Self> {
        Arc::new(Self {
            streams: Mutex::new(HashMap::new()),
            mounts,
            base,
            client,
        })
    }

    /// Starts the supervisor task.
    pub fn spawn_supervisor(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let dir = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(TICK);
            loop {
                tick.tick().await;
                dir.supervise();
            }
        })
    }

    /// One supervision pass: start missing workers, reap finished ones.
    fn supervise(&self) {
        let mut streams = self.streams.lock();
        for mount in &self.mounts {
            match streams.get(mount).map(|s| s.is_done()) {
                None => {
                    log::info!("{}: starting worker", mount);
                    let stream = Arc::new(Stream::new());
                    tokio::spawn(worker::run(
                        Arc::clone(&stream),
                        self.client.clone(),
                        self.base.clone(),
                        mount.clone(),
                    ));
                    streams.insert(mount.clone(), stream);
                }
                Some(true) => {
                    log::info!("{}: reaping finished worker", mount);
                    streams.remove(mount);
                }
                Some(false) => {}
            }
        }
    }

    /// Looks up the stream for a mountpoint.
    pub fn find(&self, mount: &str) -> Option<Arc<Stream>> {
        self.streams.lock().get(mount).cloned()
    }

    /// Names of the streams currently serviceable.
    pub fn list(&self) -> Vec<String> {
        self.streams
            .lock()
            .iter()
            .filter(|(_, stream)| stream.ok())
            .map(|(name, _)| name.clone())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn insert(&self, mount: &str, stream: Arc<Stream>) {
        self.streams.lock().insert(mount.to_string(), stream);
    }
}
