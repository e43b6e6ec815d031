use crate::error::Result;
use bytes::{BufMut, Bytes, BytesMut};

// Stream IDs
/// Stream ID for AAC audio streams in PES packets
pub const STREAM_ID_AAC: u8 = 0xC0;

// PIDs
/// PID for Program Association Table (PAT)
pub const PID_PAT: u16 = 0x0000;
/// PID for Program Map Table (PMT)
pub const PID_PMT: u16 = 4095;
/// PID carrying the AAC elementary stream
pub const PID_AAC: u16 = 257;
/// PID advertised for the timed-metadata elementary stream
pub const PID_TIMED_METADATA: u16 = 258;

// Table IDs
/// Table ID for Program Association Table (PAT)
pub const TABLE_ID_PAT: u8 = 0x00;
/// Table ID for Program Map Table (PMT)
pub const TABLE_ID_PMT: u8 = 0x02;

// Elementary Stream Types
/// Stream type for ADTS AAC audio streams
pub const STREAM_TYPE_AAC: u8 = 0x0F;
/// Stream type for timed metadata carried in PES packets
pub const STREAM_TYPE_TIMED_METADATA: u8 = 0x15;

// Constants
/// Size of a Transport Stream packet in bytes
pub const TS_PACKET_SIZE: usize = 188;
/// Bytes available to adaptation field plus payload in one packet
pub const TS_BODY_SIZE: usize = 184;
/// The single program advertised by the PAT
pub const PROGRAM_NUMBER: u16 = 1;
/// Clock frequency for Presentation Time Stamps (PTS) in Hz
pub const PTS_HZ: u64 = 90_000;

/// Converts nanoseconds to 90 kHz clock ticks (PTS/PCR units).
pub fn nano_90khz(tns: u64) -> u64 {
    tns * 9 / 100_000
}

/// Represents a Transport Stream (TS) packet header
///
/// The TS header is the fixed 4-byte prefix of each TS packet, providing
/// essential packet identification and control information.
#[derive(Debug, Clone)]
pub struct TsHeader {
    /// Sync byte (8-bit), always 0x47 to identify start of a TS packet
    pub sync_byte: u8,
    /// Transport error indicator (1-bit)
    pub transport_error: bool,
    /// Payload unit start indicator (1-bit)
    ///
    /// Set to 1 if a PES packet or PSI section starts at the beginning of
    /// the payload.
    pub payload_unit_start: bool,
    /// Transport priority (1-bit)
    pub transport_priority: bool,
    /// PID (13-bit)
    ///
    /// Packet Identifier, used to demultiplex packets of different
    /// elementary streams and PSI tables.
    pub pid: u16,
    /// Transport scrambling control (2-bit)
    pub scrambling_control: u8,
    /// Adaptation field presence (half of the 2-bit adaptation field control)
    pub adaptation_field_exists: bool,
    /// Payload presence (other half of the adaptation field control)
    pub contains_payload: bool,
    /// Continuity counter (4-bit)
    ///
    /// Increments modulo 16 for each TS packet with the same PID.
    pub continuity_counter: u8,
}

impl Default for TsHeader {
    fn default() -> Self {
        Self {
            sync_byte: 0x47,
            transport_error: false,
            payload_unit_start: false,
            transport_priority: false,
            pid: 0,
            scrambling_control: 0,
            adaptation_field_exists: false,
            contains_payload: true,
            continuity_counter: 0,
        }
    }
}

impl TsHeader {
    /// Packs the header fields into their bit-correct 4-byte layout.
    pub fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u8(self.sync_byte);

        let mut b1 = 0u8;
        if self.transport_error {
            b1 |= 0x80;
        }
        if self.payload_unit_start {
            b1 |= 0x40;
        }
        if self.transport_priority {
            b1 |= 0x20;
        }
        b1 |= ((self.pid >> 8) & 0x1f) as u8;
        buf.put_u8(b1);

        buf.put_u8((self.pid & 0xff) as u8);

        let mut b3 = self.scrambling_control << 6;
        if self.adaptation_field_exists {
            b3 |= 0x20;
        }
        if self.contains_payload {
            b3 |= 0x10;
        }
        b3 |= self.continuity_counter & 0x0f;
        buf.put_u8(b3);

        Ok(())
    }
}

/// Encodes a 90 kHz PCR value as the 6-byte adaptation field form:
/// 33-bit base, 6 reserved bits (set), 9-bit extension (zero).
pub fn af_pcr(pcr_90khz: u64) -> [u8; 6] {
    let base = pcr_90khz & 0x1_FFFF_FFFF;
    [
        (base >> 25) as u8,
        (base >> 17) as u8,
        (base >> 9) as u8,
        (base >> 1) as u8,
        (((base & 1) << 7) as u8) | 0x7E,
        0x00,
    ]
}

/// Builds an adaptation field: length byte, flag byte, optional PCR, and
/// `stuffing` bytes of 0xFF. The caller sizes the stuffing so that
/// adaptation plus payload fill the 184-byte packet body exactly.
pub fn adaptation_field(
    stuffing: usize,
    discontinuity: bool,
    random_access: bool,
    es_priority: bool,
    pcr: Option<u64>,
) -> BytesMut {
    let mut field_len = 1 + stuffing;
    if pcr.is_some() {
        field_len += 6;
    }

    let mut buf = BytesMut::with_capacity(1 + field_len);
    buf.put_u8(field_len as u8);

    let mut flags = 0u8;
    if discontinuity {
        flags |= 0x80;
    }
    if random_access {
        flags |= 0x40;
    }
    if es_priority {
        flags |= 0x20;
    }
    if pcr.is_some() {
        flags |= 0x10;
    }
    buf.put_u8(flags);

    if let Some(pcr) = pcr {
        buf.put_slice(&af_pcr(pcr));
    }

    for _ in 0..stuffing {
        buf.put_u8(0xFF);
    }

    buf
}

/// Assembles one 188-byte TS packet from header, optional adaptation
/// field, and payload. Any space the payload does not cover must already
/// be accounted for by adaptation stuffing.
pub fn build_packet(header: &TsHeader, adaptation: Option<&[u8]>, payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(TS_PACKET_SIZE);
    header.write_to(&mut buf)?;

    if let Some(af) = adaptation {
        buf.put_slice(af);
    }
    buf.put_slice(payload);

    if buf.len() != TS_PACKET_SIZE {
        return Err(crate::CastError::InvalidData(format!(
            "transport packet is {} bytes",
            buf.len()
        )));
    }

    Ok(buf.freeze())
}
