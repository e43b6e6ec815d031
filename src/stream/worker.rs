//! The per-mountpoint worker: pulls the upstream Icecast response, drives
//! the demux → frame-sync → packetize pipeline, and maintains the
//! stream's rolling segment window.

use super::{Chunk, Stream};
use crate::codec::aac::{AdtsFrame, AdtsSync, RESYNC_LIMIT};
use crate::error::{CastError, Result};
use crate::format::icy::IcyDemux;
use crate::format::ts::{AdtsPacketizer, TsUnit};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;

/// Pause before a failed worker is declared done and restarted.
const RETRY_BACKOFF: Duration = Duration::from_secs(20);

/// Segment target duration in seconds.
const SEGMENT_SECONDS: u64 = 10;

/// Offset added to the wall clock for the initial PTS, keeping the 90 kHz
/// clock clear of wrap edge cases near zero.
const PTS_OFFSET_SECS: u64 = 3120;

/// Runs one worker to completion: pump the upstream until it fails or
/// ends, wait out the backoff, then signal done so the supervisor reaps
/// and replaces this stream.
pub(crate) async fn run(stream: Arc<Stream>, client: reqwest::Client, base: String, mount: String) {
    match pump(&stream, &client, &base, &mount).await {
        Ok(()) => log::info!("{}: upstream ended", mount),
        Err(e) => log::warn!("{}: {}", mount, e),
    }
    tokio::time::sleep(RETRY_BACKOFF).await;
    stream.finish();
}

async fn pump(
    stream: &Arc<Stream>,
    client: &reqwest::Client,
    base: &str,
    mount: &str,
) -> Result<()> {
    let url = format!("{}/{}", base, mount);
    log::info!("{}: connecting to {}", mount, url);

    let resp = client.get(&url).send().await?;
    if resp.status() != reqwest::StatusCode::OK {
        return Err(CastError::Protocol(format!(
            "upstream returned {}",
            resp.status()
        )));
    }

    let metaint = capture_headers(&resp, mount)?;

    let (tx, mut rx) = mpsc::channel::<Bytes>(1);
    let reader = tokio::spawn(read_frames(resp, metaint, tx));

    let start = unix_nanos() + PTS_OFFSET_SECS * 1_000_000_000;
    let mut index = unix_nanos() / 1_000_000_000 / 10;
    let mut packetizer = AdtsPacketizer::new(start, SEGMENT_SECONDS, true);
    let mut data = BytesMut::new();
    let mut units = Vec::new();

    while let Some(frame_bytes) = rx.recv().await {
        units.clear();
        let result = AdtsFrame::parse(frame_bytes)
            .and_then(|frame| packetizer.packetize(&frame, &mut units));
        if let Err(e) = result {
            stream.clear();
            reader.abort();
            return Err(e);
        }

        for unit in units.drain(..) {
            match unit {
                TsUnit::Boundary { duration, .. } => {
                    if !data.is_empty() {
                        log::debug!("{}: segment {} ({} bytes)", mount, index, data.len());
                        stream.push(Chunk {
                            index,
                            duration,
                            data: data.split().freeze(),
                        });
                        index += 1;
                    }
                }
                TsUnit::Packet(packet) => data.extend_from_slice(&packet),
            }
        }
    }

    // The pipe closed: surface how the reader ended.
    match reader.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            if clears_window(&e) {
                stream.clear();
            }
            Err(e)
        }
        Err(_) => Ok(()),
    }
}

/// Logs the captured upstream headers and returns the parsed
/// `Icy-Metaint` value (0 when absent).
fn capture_headers(resp: &reqwest::Response, mount: &str) -> Result<usize> {
    if let Some(ct) = resp.headers().get(reqwest::header::CONTENT_TYPE) {
        log::info!("{}: content-type {}", mount, ct.to_str().unwrap_or("?"));
    }
    for (name, value) in resp.headers() {
        let name = name.as_str();
        if name.starts_with("icy-") || name.starts_with("ice-") {
            log::info!("{}: {}: {}", mount, name, value.to_str().unwrap_or("?"));
        }
    }

    match resp.headers().get("icy-metaint") {
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| CastError::Protocol("unreadable icy-metaint header".into()))?;
            Ok(value.trim().parse::<usize>()?)
        }
        None => Ok(0),
    }
}

/// Reads the response body, strips inline ICY metadata, recovers ADTS
/// frames, and pushes them through the pipe. The capacity-1 channel
/// couples the read rate to the packetizer downstream.
///
/// Returns an error only when frame sync is lost beyond recovery; EOF and
/// transport errors end the stream silently (the worker restarts either
/// way).
async fn read_frames(resp: reqwest::Response, metaint: usize, tx: mpsc::Sender<Bytes>) -> Result<()> {
    let mut body = resp.bytes_stream();
    let mut demux = IcyDemux::new(metaint);
    let mut sync = AdtsSync::new();
    let mut frames: Vec<Bytes> = Vec::new();
    let mut lost_sync = false;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;

        demux.feed(&chunk, &mut |bytes, is_metadata| {
            if is_metadata {
                if !bytes.is_empty() {
                    log::debug!("metadata block: {}", String::from_utf8_lossy(bytes));
                }
                return;
            }
            if !sync.feed(bytes, &mut |frame, in_sync| {
                if in_sync {
                    frames.push(Bytes::copy_from_slice(frame));
                    true
                } else if frame.len() > RESYNC_LIMIT {
                    false
                } else {
                    log::debug!("skipping {} unsynced bytes", frame.len());
                    true
                }
            }) {
                lost_sync = true;
            }
        });

        if lost_sync {
            return Err(CastError::Parser("lost ADTS frame sync".into()));
        }

        for frame in frames.drain(..) {
            if tx.send(frame).await.is_err() {
                return Ok(());
            }
        }
    }

    Ok(())
}

/// Format errors make the buffered window unusable; transport errors
/// leave it to age out.
fn clears_window(e: &CastError) -> bool {
    matches!(
        e,
        CastError::Parser(_) | CastError::Codec(_) | CastError::InvalidData(_)
    )
}

fn unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
