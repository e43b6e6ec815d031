//! Stateful ADTS→TS packetizer.
//!
//! Consumes whole ADTS frames and emits the transport-stream packet
//! sequence for a single-program audio rendition: PAT/PMT at every
//! segment start, then one PES packet per ADTS frame, split across
//! 188-byte packets on the audio PID. Segment boundaries are reported
//! in-band as [`TsUnit::Boundary`] values so a downstream segmenter can
//! close the previous buffer before the next segment's tables arrive.

use super::pes::PesPacket;
use super::psi::PsiTables;
use super::types::{
    adaptation_field, build_packet, nano_90khz, TsHeader, PID_AAC, STREAM_ID_AAC, TS_BODY_SIZE,
};
use crate::codec::aac::AdtsFrame;
use crate::error::{CastError, Result};
use bytes::{Bytes, BytesMut};

/// One unit of packetizer output.
#[derive(Debug, Clone)]
pub enum TsUnit {
    /// A transport stream packet, exactly 188 bytes.
    Packet(Bytes),
    /// A segment boundary: the wall-clock timestamp of the *next* segment
    /// and the duration of the one just finished, both in nanoseconds.
    Boundary { timestamp: u64, duration: u64 },
}

/// Converts a stream of ADTS frames into transport stream packets with
/// periodic PAT/PMT refresh and segment boundary reporting.
pub struct AdtsPacketizer {
    start_nanos: u64,
    interval_secs: u64,
    emit_boundary: bool,
    total_frames: u64,
    frames_since_pat: u64,
    fps: u64,
    frame_nanos: u64,
    sampling_frequency: u32,
    psi: PsiTables,
    es_cc: u8,
}

impl AdtsPacketizer {
    /// `start_nanos` is the PTS of the first frame; `interval_secs` the
    /// segment target duration; `emit_boundary` controls whether segment
    /// boundaries are reported.
    pub fn new(start_nanos: u64, interval_secs: u64, emit_boundary: bool) -> Self {
        Self {
            start_nanos,
            interval_secs,
            emit_boundary,
            total_frames: 0,
            frames_since_pat: 0,
            fps: 0,
            frame_nanos: 0,
            sampling_frequency: 0,
            psi: PsiTables::new(),
            es_cc: 0,
        }
    }

    /// Packetizes one ADTS frame, appending the resulting units to `out`.
    pub fn packetize(&mut self, frame: &AdtsFrame, out: &mut Vec<TsUnit>) -> Result<()> {
        if self.total_frames == 0 {
            let freq = frame.sampling_frequency();
            if freq == 0 {
                return Err(CastError::Codec(format!(
                    "forbidden sampling frequency index {}",
                    frame.header().sample_rate_index
                )));
            }
            self.sampling_frequency = freq;
            self.fps = frame.frames_per_second();
            self.frame_nanos = frame.frame_duration_nanos();
        }

        if frame.sampling_frequency() != self.sampling_frequency {
            return Err(CastError::Codec(format!(
                "sampling frequency changed from {} to {}",
                self.sampling_frequency,
                frame.sampling_frequency()
            )));
        }
        if frame.number_of_raw_blocks() != 0 {
            return Err(CastError::Codec(
                "multiple AAC frames per ADTS frame unsupported".into(),
            ));
        }

        let pts_nanos = self.start_nanos + self.frame_nanos * self.total_frames;

        if self.frames_since_pat > self.fps * self.interval_secs {
            if self.emit_boundary {
                out.push(TsUnit::Boundary {
                    timestamp: pts_nanos,
                    duration: self.frames_since_pat * self.frame_nanos,
                });
            }
            self.frames_since_pat = 0;
        }

        if self.frames_since_pat == 0 {
            let (pat, pmt) = self.psi.next()?;
            out.push(TsUnit::Packet(pat));
            out.push(TsUnit::Packet(pmt));
        }

        self.write_pes(frame, pts_nanos, out)?;

        self.total_frames += 1;
        self.frames_since_pat += 1;
        Ok(())
    }

    /// Builds the PES packet for one frame and splits it across TS packets
    /// on the audio PID. The first carries PUSI plus an adaptation field
    /// with random-access and PCR; the last is stuffed out to the packet
    /// boundary.
    fn write_pes(&mut self, frame: &AdtsFrame, pts_nanos: u64, out: &mut Vec<TsUnit>) -> Result<()> {
        let mut pes = BytesMut::new();
        PesPacket::new(STREAM_ID_AAC, frame.bytes())
            .with_pts_nanos(pts_nanos)
            .write_to(&mut pes)?;

        let mut offset = 0;
        let mut pusi = true;
        while offset < pes.len() {
            let rest = pes.len() - offset;

            let adaptation = if pusi {
                // Flags + PCR occupy 8 bytes of the body.
                let space = TS_BODY_SIZE - 8;
                let stuffing = space.saturating_sub(rest);
                Some(adaptation_field(
                    stuffing,
                    false,
                    true,
                    false,
                    Some(nano_90khz(pts_nanos)),
                ))
            } else if rest < TS_BODY_SIZE {
                let fill = TS_BODY_SIZE - rest;
                if fill == 1 {
                    // Single spare byte: a zero-length adaptation field.
                    let mut af = BytesMut::with_capacity(1);
                    af.extend_from_slice(&[0x00]);
                    Some(af)
                } else {
                    Some(adaptation_field(fill - 2, false, false, false, None))
                }
            } else {
                None
            };

            let space = TS_BODY_SIZE - adaptation.as_ref().map_or(0, |af| af.len());
            let take = rest.min(space);

            let header = TsHeader {
                payload_unit_start: pusi,
                pid: PID_AAC,
                continuity_counter: self.es_cc,
                ..Default::default()
            };
            self.es_cc = (self.es_cc + 1) & 0x0F;

            out.push(TsUnit::Packet(build_packet(
                &header,
                adaptation.as_deref(),
                &pes[offset..offset + take],
            )?));

            offset += take;
            pusi = false;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::TS_PACKET_SIZE;
    use super::*;

    fn frame_with(sample_rate_index: u8, len: u16, raw_blocks: u8) -> AdtsFrame {
        let mut data = vec![
            0xFF,
            0xF1,
            0x40 | (sample_rate_index << 2),
            0x80 | ((len >> 11) & 0x03) as u8,
            ((len >> 3) & 0xFF) as u8,
            ((len & 0x07) << 5) as u8 | 0x1F,
            0xFC | (raw_blocks & 0x03),
        ];
        data.resize(len as usize, 0xAB);
        AdtsFrame::parse(Bytes::from(data)).unwrap()
    }

    fn frame(len: u16) -> AdtsFrame {
        frame_with(4, len, 0) // 44.1 kHz
    }

    fn packets(units: &[TsUnit]) -> Vec<&Bytes> {
        units
            .iter()
            .filter_map(|u| match u {
                TsUnit::Packet(p) => Some(p),
                TsUnit::Boundary { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_first_frame_emits_tables_then_pes() {
        let mut packetizer = AdtsPacketizer::new(0, 10, true);
        let mut out = Vec::new();
        packetizer.packetize(&frame(100), &mut out).unwrap();

        let pkts = packets(&out);
        assert_eq!(pkts.len(), 3); // PAT, PMT, one PES packet
        for p in &pkts {
            assert_eq!(p.len(), TS_PACKET_SIZE);
            assert_eq!(p[0], 0x47);
        }

        // Audio packet: PUSI set, audio PID.
        let audio = pkts[2];
        assert_eq!(audio[1] & 0x40, 0x40);
        assert_eq!((((audio[1] & 0x1F) as u16) << 8) | audio[2] as u16, PID_AAC);
    }

    #[test]
    fn test_large_frame_spans_packets() {
        let mut packetizer = AdtsPacketizer::new(0, 10, true);
        let mut out = Vec::new();
        packetizer.packetize(&frame(600), &mut out).unwrap();

        let pkts = packets(&out);
        // PES = 14 header bytes + 600 payload = 614; first packet carries
        // 176, the rest 184 each.
        assert_eq!(pkts.len(), 2 + 4);

        // Only the first audio packet has PUSI.
        let audio: Vec<_> = pkts[2..].to_vec();
        assert_eq!(audio[0][1] & 0x40, 0x40);
        for p in &audio[1..] {
            assert_eq!(p[1] & 0x40, 0x00);
        }

        // Continuity counter increments across audio packets.
        for (i, p) in audio.iter().enumerate() {
            assert_eq!((p[3] & 0x0F) as usize, i);
        }
    }

    #[test]
    fn test_boundary_after_interval() {
        let mut packetizer = AdtsPacketizer::new(1_000, 1, true);
        let mut out = Vec::new();

        // 43 fps at 44.1 kHz; boundary fires on the first frame after
        // frames_since_pat exceeds fps * interval.
        let mut boundary_at = None;
        for i in 0..100 {
            out.clear();
            packetizer.packetize(&frame(100), &mut out).unwrap();
            if let Some(TsUnit::Boundary { timestamp, duration }) = out.first() {
                boundary_at = Some((i, *timestamp, *duration));
                break;
            }
        }

        let (i, timestamp, duration) = boundary_at.unwrap();
        assert_eq!(i, 44); // frames 0..=43 ran without a boundary
        let frame_nanos = 1_000_000_000 / 43;
        assert_eq!(timestamp, 1_000 + 44 * frame_nanos);
        assert_eq!(duration, 44 * frame_nanos);

        // The boundary precedes the new segment's PAT/PMT.
        assert!(matches!(out[0], TsUnit::Boundary { .. }));
        let pkts = packets(&out);
        assert_eq!(pid_of(pkts[0]), 0);
    }

    #[test]
    fn test_no_boundary_when_disabled() {
        let mut packetizer = AdtsPacketizer::new(0, 1, false);
        let mut out = Vec::new();
        for _ in 0..100 {
            packetizer.packetize(&frame(100), &mut out).unwrap();
        }
        assert!(out
            .iter()
            .all(|u| matches!(u, TsUnit::Packet(p) if p.len() == TS_PACKET_SIZE)));
    }

    #[test]
    fn test_pts_strides_by_frame_nanos() {
        let mut packetizer = AdtsPacketizer::new(5_000_000_000, 10, true);
        let frame_nanos = 1_000_000_000 / 43;

        let mut ptses = Vec::new();
        for _ in 0..3 {
            let mut out = Vec::new();
            packetizer.packetize(&frame(100), &mut out).unwrap();
            let pkts = packets(&out);
            let audio = pkts.last().unwrap();
            ptses.push(extract_pts(audio));
        }

        assert_eq!(ptses[1] - ptses[0], nano_90khz(5_000_000_000 + frame_nanos) - ptses[0]);
        assert!(ptses[0] < ptses[1] && ptses[1] < ptses[2]);
    }

    #[test]
    fn test_forbidden_frequency_fails() {
        let mut packetizer = AdtsPacketizer::new(0, 10, true);
        let mut out = Vec::new();
        assert!(packetizer
            .packetize(&frame_with(13, 100, 0), &mut out)
            .is_err());
    }

    #[test]
    fn test_frequency_change_fails() {
        let mut packetizer = AdtsPacketizer::new(0, 10, true);
        let mut out = Vec::new();
        packetizer.packetize(&frame(100), &mut out).unwrap();
        assert!(packetizer
            .packetize(&frame_with(3, 100, 0), &mut out)
            .is_err());
    }

    #[test]
    fn test_multiple_raw_blocks_fail() {
        let mut packetizer = AdtsPacketizer::new(0, 10, true);
        let mut out = Vec::new();
        assert!(packetizer
            .packetize(&frame_with(4, 100, 1), &mut out)
            .is_err());
    }

    fn pid_of(packet: &[u8]) -> u16 {
        (((packet[1] & 0x1F) as u16) << 8) | packet[2] as u16
    }

    fn extract_pts(packet: &[u8]) -> u64 {
        // Skip TS header and adaptation field, then the 9-byte PES prefix.
        let af_len = 1 + packet[4] as usize;
        let pes = &packet[4 + af_len..];
        let ts = &pes[9..14];
        (((ts[0] as u64 >> 1) & 0x07) << 30)
            | ((u16::from_be_bytes([ts[1], ts[2]]) as u64 >> 1) << 15)
            | (u16::from_be_bytes([ts[3], ts[4]]) as u64 >> 1)
    }
}
