//! End-to-end pipeline test: an ICY-wrapped ADTS byte stream is demuxed,
//! frame-synced, and packetized, and the resulting segment stream is
//! checked against the transport-stream and timing invariants.

use anarcast::codec::aac::{AdtsFrame, AdtsSync};
use anarcast::format::icy::IcyDemux;
use anarcast::format::ts::{AdtsPacketizer, TsUnit, PID_PAT, PID_PMT, TS_PACKET_SIZE};
use bytes::Bytes;

const FRAME_LEN: usize = 300;
const METAINT: usize = 1000;

/// One ADTS frame: AAC-LC, 44.1 kHz, stereo.
fn adts_frame() -> Vec<u8> {
    let len = FRAME_LEN as u16;
    let mut frame = vec![
        0xFF,
        0xF1,
        0x50,
        0x80 | ((len >> 11) & 0x03) as u8,
        ((len >> 3) & 0xFF) as u8,
        ((len & 0x07) << 5) as u8 | 0x1F,
        0xFC,
    ];
    frame.resize(FRAME_LEN, 0xAB);
    frame
}

/// Interleaves ICY metadata blocks into an audio stream every METAINT
/// bytes, the way an origin with `Icy-Metaint` does.
fn icy_wrap(audio: &[u8]) -> Vec<u8> {
    let meta = b"StreamTitle='integration';";
    let mut block = meta.to_vec();
    block.resize(meta.len().div_ceil(16) * 16, 0);

    let mut wire = Vec::new();
    for run in audio.chunks(METAINT) {
        wire.extend_from_slice(run);
        if run.len() == METAINT {
            wire.push((block.len() / 16) as u8);
            wire.extend_from_slice(&block);
        }
    }
    wire
}

fn pid_of(packet: &[u8]) -> u16 {
    (((packet[1] & 0x1F) as u16) << 8) | packet[2] as u16
}

struct Segment {
    duration: u64,
    data: Vec<u8>,
}

/// Runs the full pipeline over `n_frames` frames and returns the closed
/// segments plus any trailing packets.
fn run_pipeline(n_frames: usize) -> (Vec<Segment>, Vec<u8>) {
    let audio: Vec<u8> = (0..n_frames).flat_map(|_| adts_frame()).collect();
    let wire = icy_wrap(&audio);

    let mut demux = IcyDemux::new(METAINT);
    let mut sync = AdtsSync::new();
    let mut frames: Vec<Bytes> = Vec::new();

    // Fixed-size reads, the way the worker consumes the response body.
    for chunk in wire.chunks(8192) {
        demux.feed(chunk, &mut |bytes, is_metadata| {
            if is_metadata {
                assert!(bytes.is_empty() || bytes.starts_with(b"StreamTitle"));
                return;
            }
            assert!(sync.feed(bytes, &mut |frame, in_sync| {
                assert!(in_sync, "pipeline input must stay in sync");
                frames.push(Bytes::copy_from_slice(frame));
                true
            }));
        });
    }
    assert_eq!(frames.len(), n_frames);

    let mut packetizer = AdtsPacketizer::new(1_000_000_000, 1, true);
    let mut segments = Vec::new();
    let mut data = Vec::new();

    for frame_bytes in frames {
        let frame = AdtsFrame::parse(frame_bytes).unwrap();
        let mut units = Vec::new();
        packetizer.packetize(&frame, &mut units).unwrap();
        for unit in units {
            match unit {
                TsUnit::Boundary { duration, .. } => {
                    segments.push(Segment {
                        duration,
                        data: std::mem::take(&mut data),
                    });
                }
                TsUnit::Packet(packet) => {
                    assert_eq!(packet.len(), TS_PACKET_SIZE);
                    data.extend_from_slice(&packet);
                }
            }
        }
    }

    (segments, data)
}

#[test]
fn test_segments_are_whole_ts_packets() {
    let (segments, trailing) = run_pipeline(200);

    assert!(segments.len() >= 3);
    for segment in &segments {
        assert!(!segment.data.is_empty());
        assert_eq!(segment.data.len() % TS_PACKET_SIZE, 0);
    }
    assert_eq!(trailing.len() % TS_PACKET_SIZE, 0);
}

#[test]
fn test_segment_opens_with_pat_pmt_and_pusi() {
    let (segments, _) = run_pipeline(200);

    for segment in &segments {
        let first = &segment.data[..TS_PACKET_SIZE];
        let second = &segment.data[TS_PACKET_SIZE..2 * TS_PACKET_SIZE];

        assert_eq!(first[0], 0x47);
        assert_eq!(first[1] & 0x40, 0x40); // PUSI
        assert_eq!(pid_of(first), PID_PAT);
        assert_eq!(pid_of(second), PID_PMT);
    }
}

#[test]
fn test_segment_durations_match_frame_arithmetic() {
    let (segments, _) = run_pipeline(200);

    // 44.1 kHz -> 43 fps -> the 1 s target closes each segment at the
    // first frame past the interval, 44 frames in.
    let frame_nanos = 1_000_000_000u64 / 43;
    for segment in &segments {
        assert_eq!(segment.duration % frame_nanos, 0);
        let frames_in_segment = segment.duration / frame_nanos;
        assert_eq!(frames_in_segment, 44);
    }
}

#[test]
fn test_pes_pts_strictly_increases() {
    let (segments, trailing) = run_pipeline(150);

    let mut all = Vec::new();
    for segment in &segments {
        all.extend_from_slice(&segment.data);
    }
    all.extend_from_slice(&trailing);

    let mut last_pts = None;
    for packet in all.chunks(TS_PACKET_SIZE) {
        // PES starts only: audio PID with PUSI set.
        if pid_of(packet) != 257 || packet[1] & 0x40 == 0 {
            continue;
        }
        let af_len = 1 + packet[4] as usize;
        let pes = &packet[4 + af_len..];
        assert_eq!(&pes[..3], &[0x00, 0x00, 0x01]);

        let ts = &pes[9..14];
        let pts = (((ts[0] as u64 >> 1) & 0x07) << 30)
            | ((u16::from_be_bytes([ts[1], ts[2]]) as u64 >> 1) << 15)
            | (u16::from_be_bytes([ts[3], ts[4]]) as u64 >> 1);

        if let Some(last) = last_pts {
            assert!(pts > last);
            // 90 kHz ticks per frame at 43 fps, within rounding.
            let stride = pts - last;
            assert!((2092..=2094).contains(&stride));
        }
        last_pts = Some(pts);
    }
    assert!(last_pts.is_some());
}

#[test]
fn test_garbage_prefix_resyncs_to_identical_frames() {
    let mut reference = AdtsSync::new();
    let audio: Vec<u8> = (0..10).flat_map(|_| adts_frame()).collect();
    let mut clean_frames = Vec::new();
    reference.feed(&audio, &mut |frame, in_sync| {
        assert!(in_sync);
        clean_frames.push(frame.to_vec());
        true
    });

    let mut dirty = vec![0x13, 0x37, 0x00, 0x42];
    dirty.extend_from_slice(&audio);

    let mut sync = AdtsSync::new();
    let mut frames = Vec::new();
    let mut gaps = Vec::new();
    sync.feed(&dirty, &mut |bytes, in_sync| {
        if in_sync {
            frames.push(bytes.to_vec());
        } else {
            gaps.push(bytes.to_vec());
        }
        true
    });

    assert_eq!(frames, clean_frames);
    assert_eq!(gaps, vec![vec![0x13, 0x37, 0x00, 0x42]]);
}
