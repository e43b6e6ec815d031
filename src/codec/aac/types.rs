use crate::utils::BitReader;
use crate::{CastError, Result};
use bytes::Bytes;

/// Sampling frequencies by ADTS header index. Indices 13..=15 are
/// forbidden by the format and map to 0.
const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// Samples carried by one AAC frame.
const SAMPLES_PER_FRAME: u64 = 1024;

/// Decoded fixed-layout ADTS header fields.
#[derive(Debug, Clone)]
pub struct AdtsHeader {
    pub sync_word: u32,            // 12 bits
    pub id: u8,                    // 1 bit, 0=MPEG-4, 1=MPEG-2
    pub layer: u8,                 // 2 bits, must be 0
    pub protection_absent: bool,   // 1 bit, false => 2-byte CRC follows
    pub profile: u8,               // 2 bits
    pub sample_rate_index: u8,     // 4 bits
    pub private_bit: bool,         // 1 bit
    pub channel_configuration: u8, // 3 bits
    pub original_copy: bool,       // 1 bit
    pub home: bool,                // 1 bit
    pub copyright_id_bit: bool,    // 1 bit
    pub copyright_id_start: bool,  // 1 bit
    pub frame_length: u16,         // 13 bits, total bytes including header
    pub buffer_fullness: u16,      // 11 bits
    pub number_of_raw_blocks: u8,  // 2 bits, AAC frames minus one
}

impl AdtsHeader {
    /// Decodes the header from the first bytes of an ADTS frame.
    pub fn parse(data: &[u8]) -> Result<AdtsHeader> {
        if data.len() < 7 {
            return Err(CastError::Parser("ADTS header too short".into()));
        }

        let mut reader = BitReader::new(data);

        let sync_word = reader.read_bits(12)?;
        if sync_word != 0xFFF {
            return Err(CastError::Parser("invalid ADTS sync word".into()));
        }

        let id = reader.read_bits(1)? as u8;
        let layer = reader.read_bits(2)? as u8;
        let protection_absent = reader.read_bits(1)? == 1;
        let profile = reader.read_bits(2)? as u8;
        let sample_rate_index = reader.read_bits(4)? as u8;
        let private_bit = reader.read_bits(1)? == 1;
        let channel_configuration = reader.read_bits(3)? as u8;
        let original_copy = reader.read_bits(1)? == 1;
        let home = reader.read_bits(1)? == 1;
        let copyright_id_bit = reader.read_bits(1)? == 1;
        let copyright_id_start = reader.read_bits(1)? == 1;
        let frame_length = reader.read_bits(13)? as u16;
        let buffer_fullness = reader.read_bits(11)? as u16;
        let number_of_raw_blocks = reader.read_bits(2)? as u8;

        Ok(AdtsHeader {
            sync_word,
            id,
            layer,
            protection_absent,
            profile,
            sample_rate_index,
            private_bit,
            channel_configuration,
            original_copy,
            home,
            copyright_id_bit,
            copyright_id_start,
            frame_length,
            buffer_fullness,
            number_of_raw_blocks,
        })
    }

    /// Header size in bytes: 9 when a CRC follows the fixed fields, else 7.
    pub fn len(&self) -> usize {
        if self.protection_absent {
            7
        } else {
            9
        }
    }
}

/// One whole ADTS frame (header plus AAC payload) as recovered by the
/// synchronizer.
#[derive(Debug, Clone)]
pub struct AdtsFrame {
    header: AdtsHeader,
    data: Bytes,
}

impl AdtsFrame {
    /// Parses the header and wraps the frame bytes. The slice must hold at
    /// least the whole header; the synchronizer guarantees the full frame.
    pub fn parse(data: Bytes) -> Result<AdtsFrame> {
        let header = AdtsHeader::parse(&data)?;
        if data.len() < header.len() {
            return Err(CastError::Parser("ADTS frame shorter than header".into()));
        }
        Ok(AdtsFrame { header, data })
    }

    pub fn header(&self) -> &AdtsHeader {
        &self.header
    }

    /// The complete frame, header included.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// The AAC payload following the 7/9-byte header.
    pub fn payload(&self) -> &[u8] {
        &self.data[self.header.len()..]
    }

    /// Total frame length from the 13-bit header field.
    pub fn frame_length(&self) -> usize {
        self.header.frame_length as usize
    }

    /// Number of AAC frames in this ADTS frame, minus one.
    pub fn number_of_raw_blocks(&self) -> u8 {
        self.header.number_of_raw_blocks
    }

    /// Sampling frequency in Hz, or 0 for the forbidden indices 13..=15.
    pub fn sampling_frequency(&self) -> u32 {
        SAMPLING_FREQUENCIES
            .get(self.header.sample_rate_index as usize)
            .copied()
            .unwrap_or(0)
    }

    /// AAC frames per second at this sampling frequency, or 0 when the
    /// header carries a forbidden frequency index.
    pub fn frames_per_second(&self) -> u64 {
        self.sampling_frequency() as u64 / SAMPLES_PER_FRAME
    }

    /// Duration of one AAC frame in nanoseconds, or 0 when the header
    /// carries a forbidden frequency index.
    pub fn frame_duration_nanos(&self) -> u64 {
        match self.frames_per_second() {
            0 => 0,
            fps => 1_000_000_000 / fps,
        }
    }
}
