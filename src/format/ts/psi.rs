//! Program Specific Information: the PAT/PMT pair describing the single
//! program this repackager emits.
//!
//! The tables are fixed for the life of a stream: program 1, PMT on PID
//! 4095, AAC audio on PID 257, and a timed-metadata stream advertised on
//! PID 258. The descriptor blobs match the tables timed-ID3 audio
//! transport streams carry and are treated as opaque bytes.

use super::types::{
    build_packet, TsHeader, PID_AAC, PID_PAT, PID_PMT, PID_TIMED_METADATA, PROGRAM_NUMBER,
    STREAM_TYPE_AAC, STREAM_TYPE_TIMED_METADATA, TABLE_ID_PAT, TABLE_ID_PMT, TS_BODY_SIZE,
};
use crate::error::Result;
use crate::utils::Crc32Mpeg2;
use bytes::{BufMut, Bytes, BytesMut};

/// Program-level descriptor blob (metadata pointer, format "ID3 ").
const PROGRAM_DESCRIPTORS: [u8; 17] = [
    0x25, 0x0F, 0xFF, 0xFF, 0x49, 0x44, 0x33, 0x20, 0xFF, 0x49, 0x44, 0x33, 0x20, 0x00, 0x0F,
    0x00, 0x01,
];

/// ES-info descriptor blob for the timed-metadata stream (format "ID3 ").
const TIMED_METADATA_ES_INFO: [u8; 15] = [
    0x26, 0x0D, 0xFF, 0xFF, 0x49, 0x44, 0x33, 0x20, 0xFF, 0x49, 0x44, 0x33, 0x20, 0x00, 0x0F,
];

/// Builds the PAT and PMT once, then wraps each into a single TS packet
/// per call with continuity counters incrementing across calls.
pub struct PsiTables {
    pat_section: Bytes,
    pmt_section: Bytes,
    pat_cc: u8,
    pmt_cc: u8,
}

impl PsiTables {
    pub fn new() -> Self {
        let crc = Crc32Mpeg2::new();

        // PAT body: one program mapping to the PMT PID.
        let mut pat_body = BytesMut::new();
        pat_body.put_u16(PROGRAM_NUMBER);
        pat_body.put_u16(PID_PMT & 0x1FFF | 7 << 13);

        // PMT body: PCR on the audio PID, program descriptors, then the
        // elementary stream loop (AAC plus advertised timed metadata).
        let mut pmt_body = BytesMut::new();
        pmt_body.put_u16(PID_AAC & 0x1FFF | 7 << 13);
        pmt_body.put_u16(PROGRAM_DESCRIPTORS.len() as u16 & 0x0FFF | 0xF << 12);
        pmt_body.put_slice(&PROGRAM_DESCRIPTORS);

        pmt_body.put_u8(STREAM_TYPE_AAC);
        pmt_body.put_u16(PID_AAC & 0x1FFF | 7 << 13);
        pmt_body.put_u16(0xF << 12);

        pmt_body.put_u8(STREAM_TYPE_TIMED_METADATA);
        pmt_body.put_u16(PID_TIMED_METADATA & 0x1FFF | 7 << 13);
        pmt_body.put_u16(TIMED_METADATA_ES_INFO.len() as u16 & 0x0FFF | 0xF << 12);
        pmt_body.put_slice(&TIMED_METADATA_ES_INFO);

        Self {
            pat_section: section(TABLE_ID_PAT, PROGRAM_NUMBER, &pat_body, &crc),
            pmt_section: section(TABLE_ID_PMT, PROGRAM_NUMBER, &pmt_body, &crc),
            pat_cc: 0,
            pmt_cc: 0,
        }
    }

    /// Returns the PAT and PMT packets for one refresh.
    pub fn next(&mut self) -> Result<(Bytes, Bytes)> {
        let pat = psi_packet(PID_PAT, self.pat_cc, &self.pat_section)?;
        let pmt = psi_packet(PID_PMT, self.pmt_cc, &self.pmt_section)?;
        self.pat_cc = (self.pat_cc + 1) & 0x0F;
        self.pmt_cc = (self.pmt_cc + 1) & 0x0F;
        Ok((pat, pmt))
    }
}

impl Default for PsiTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Assembles a complete PSI section: header, body, and MPEG-2 CRC32.
fn section(table_id: u8, table_id_ext: u16, body: &[u8], crc: &Crc32Mpeg2) -> Bytes {
    let section_length = 5 + body.len() + 4;

    let mut buf = BytesMut::new();
    buf.put_u8(table_id);
    buf.put_u16(0xB000 | (section_length as u16 & 0x0FFF));
    buf.put_u16(table_id_ext);
    buf.put_u8(0xC1); // version 0, current
    buf.put_u8(0x00); // section number
    buf.put_u8(0x00); // last section number
    buf.put_slice(body);

    let checksum = crc.calculate(&buf);
    buf.put_u32(checksum);
    buf.freeze()
}

/// Wraps a PSI section into one TS packet: pointer field, section bytes,
/// and 0xFF fill out to the packet boundary.
fn psi_packet(pid: u16, cc: u8, section: &[u8]) -> Result<Bytes> {
    let header = TsHeader {
        payload_unit_start: true,
        pid,
        continuity_counter: cc,
        ..Default::default()
    };

    let mut payload = BytesMut::with_capacity(TS_BODY_SIZE);
    payload.put_u8(0x00); // pointer field
    payload.put_slice(section);
    payload.resize(TS_BODY_SIZE, 0xFF);

    build_packet(&header, None, &payload)
}
