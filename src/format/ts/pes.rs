use super::types::nano_90khz;
use crate::error::Result;
use bytes::{BufMut, BytesMut};

#[derive(Debug, Clone)]
pub struct PesHeader {
    pub stream_id: u8,
    pub data_alignment: bool,
    pub pts: Option<u64>, // 90 kHz
}

impl PesHeader {
    pub fn new(stream_id: u8) -> Self {
        Self {
            stream_id,
            data_alignment: false,
            pts: None,
        }
    }

    pub fn with_data_alignment(mut self) -> Self {
        self.data_alignment = true;
        self
    }

    /// Sets the presentation timestamp from nanoseconds.
    pub fn with_pts_nanos(mut self, pts_nanos: u64) -> Self {
        self.pts = Some(nano_90khz(pts_nanos));
        self
    }

    fn optional_len(&self) -> usize {
        3 + if self.pts.is_some() { 5 } else { 0 }
    }

    fn write_to(&self, buf: &mut BytesMut, payload_len: usize) -> Result<()> {
        // Start code prefix (3 bytes)
        buf.put_u8(0x00);
        buf.put_u8(0x00);
        buf.put_u8(0x01);

        buf.put_u8(self.stream_id);

        // PES packet length covers the optional header and payload; the
        // field is 16 bits wide so oversized packets clamp.
        let total = self.optional_len() + payload_len;
        buf.put_u16(total.min(0xFFFF) as u16);

        // Flags (1 byte): marker bits plus data alignment
        let mut flags = 0x80u8;
        if self.data_alignment {
            flags |= 0x04;
        }
        buf.put_u8(flags);

        // Additional flags (1 byte): PTS present
        buf.put_u8(if self.pts.is_some() { 0x80 } else { 0x00 });

        // Header data length (1 byte)
        buf.put_u8(if self.pts.is_some() { 5 } else { 0 });

        if let Some(pts) = self.pts {
            write_timestamp(buf, 0x20, pts)?;
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct PesPacket<'a> {
    pub header: PesHeader,
    pub payload: &'a [u8],
}

impl<'a> PesPacket<'a> {
    pub fn new(stream_id: u8, payload: &'a [u8]) -> Self {
        Self {
            header: PesHeader::new(stream_id),
            payload,
        }
    }

    pub fn with_pts_nanos(mut self, pts_nanos: u64) -> Self {
        self.header = self.header.with_data_alignment().with_pts_nanos(pts_nanos);
        self
    }

    pub fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        self.header.write_to(buf, self.payload.len())?;
        buf.extend_from_slice(self.payload);
        Ok(())
    }
}

// Helper function to write PTS/DTS timestamps
fn write_timestamp(buf: &mut BytesMut, marker: u8, ts: u64) -> Result<()> {
    let pts = ts & 0x1_FFFF_FFFF; // 33 bits

    // First byte: marker bits and 3 MSB of timestamp
    buf.put_u8(marker | ((pts >> 29) & 0x0E) as u8 | 0x01);

    // Middle 15 bits and marker
    buf.put_u16((((pts >> 14) & 0xFFFE) | 0x01) as u16);

    // Final 15 bits and marker
    buf.put_u16((((pts << 1) & 0xFFFE) | 0x01) as u16);

    Ok(())
}
