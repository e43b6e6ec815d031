//! Icecast/SHOUTcast inline metadata demuxing.
//!
//! When an origin advertises `Icy-Metaint: M`, the response body carries a
//! metadata block after every M bytes of audio: one length byte L followed
//! by exactly L*16 bytes of metadata (L may be 0). [`IcyDemux`] splits the
//! stream back into audio runs and whole metadata blocks. Blocks that span
//! input buffers are reassembled in the demuxer's own buffer before the
//! callback sees them.

/// Demuxer state: counting down audio bytes, expecting the length byte,
/// or accumulating a metadata block.
#[derive(Debug)]
enum IcyState {
    Data { left: usize },
    Len,
    Meta { left: usize, buf: Vec<u8> },
}

/// Splits an Icecast byte stream into audio runs and metadata blocks.
///
/// The callback receives `(bytes, is_metadata)`. With `metaint == 0` the
/// input passes through unchanged as audio.
#[derive(Debug)]
pub struct IcyDemux {
    metaint: usize,
    state: IcyState,
}

impl IcyDemux {
    pub fn new(metaint: usize) -> Self {
        Self {
            metaint,
            state: IcyState::Data { left: metaint },
        }
    }

    /// Feeds a byte run through the demuxer.
    pub fn feed<F>(&mut self, mut data: &[u8], cb: &mut F)
    where
        F: FnMut(&[u8], bool),
    {
        if self.metaint == 0 {
            if !data.is_empty() {
                cb(data, false);
            }
            return;
        }

        while !data.is_empty() {
            match &mut self.state {
                IcyState::Data { left } => {
                    let n = (*left).min(data.len());
                    if n > 0 {
                        cb(&data[..n], false);
                    }
                    data = &data[n..];
                    *left -= n;
                    if *left == 0 {
                        self.state = IcyState::Len;
                    }
                }
                IcyState::Len => {
                    let len = data[0] as usize * 16;
                    data = &data[1..];
                    if len == 0 {
                        cb(&[], true);
                        self.state = IcyState::Data { left: self.metaint };
                    } else {
                        self.state = IcyState::Meta {
                            left: len,
                            buf: Vec::with_capacity(len),
                        };
                    }
                }
                IcyState::Meta { left, buf } => {
                    let n = (*left).min(data.len());
                    buf.extend_from_slice(&data[..n]);
                    data = &data[n..];
                    *left -= n;
                    if *left == 0 {
                        let block = std::mem::take(buf);
                        cb(&block, true);
                        self.state = IcyState::Data { left: self.metaint };
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn collect(demux: &mut IcyDemux, data: &[u8]) -> Vec<(Vec<u8>, bool)> {
        let mut out = Vec::new();
        demux.feed(data, &mut |bytes, is_meta| {
            out.push((bytes.to_vec(), is_meta));
        });
        out
    }

    fn interleave(metaint: usize, audio: &[u8], blocks: &[Vec<u8>]) -> Vec<u8> {
        let mut wire = Vec::new();
        let mut audio = audio;
        for block in blocks {
            let n = metaint.min(audio.len());
            wire.extend_from_slice(&audio[..n]);
            audio = &audio[n..];
            wire.push((block.len() / 16) as u8);
            wire.extend_from_slice(block);
        }
        wire.extend_from_slice(audio);
        wire
    }

    #[test]
    fn test_metaint_zero_passes_through() {
        let mut demux = IcyDemux::new(0);
        let data = vec![0x01, 0xFF, 0x00, 0x42];

        let out = collect(&mut demux, &data);

        assert_eq!(out, vec![(data, false)]);
    }

    #[test]
    fn test_basic_split() {
        let mut demux = IcyDemux::new(4);
        let meta: Vec<u8> = b"StreamTitle='x';".to_vec();
        let wire = interleave(4, &[1, 2, 3, 4, 5, 6], &[meta.clone()]);

        let out = collect(&mut demux, &wire);

        assert_eq!(
            out,
            vec![
                (vec![1, 2, 3, 4], false),
                (meta, true),
                (vec![5, 6], false),
            ]
        );
    }

    #[test]
    fn test_empty_metadata_block() {
        let mut demux = IcyDemux::new(2);
        let wire = interleave(2, &[9, 9, 7, 7], &[vec![]]);

        let out = collect(&mut demux, &wire);

        assert_eq!(
            out,
            vec![(vec![9, 9], false), (vec![], true), (vec![7, 7], false)]
        );
    }

    #[test]
    fn test_metadata_spanning_feeds() {
        let mut demux = IcyDemux::new(2);
        let meta = vec![0x41; 32];
        let wire = interleave(2, &[1, 2, 3], &[meta.clone()]);

        // Split mid-metadata so the block must be reassembled.
        let mut out = collect(&mut demux, &wire[..10]);
        out.extend(collect(&mut demux, &wire[10..]));

        assert!(out.contains(&(meta, true)));
        let audio: Vec<u8> = out
            .iter()
            .filter(|(_, m)| !m)
            .flat_map(|(b, _)| b.clone())
            .collect();
        assert_eq!(audio, vec![1, 2, 3]);
    }

    #[quickcheck]
    fn prop_roundtrip(audio: Vec<u8>, lens: Vec<u8>, metaint: u8) -> bool {
        let metaint = metaint as usize % 64 + 1;

        // Only interleave a block where a full audio run precedes it.
        let mut blocks: Vec<Vec<u8>> = Vec::new();
        let mut remaining = audio.len();
        for &l in lens.iter().take(4) {
            if remaining < metaint {
                break;
            }
            remaining -= metaint;
            blocks.push(vec![0x5A; (l as usize % 8) * 16]);
        }
        let wire = interleave(metaint, &audio, &blocks);

        let mut demux = IcyDemux::new(metaint);
        let out = collect(&mut demux, &wire);

        let recovered_audio: Vec<u8> = out
            .iter()
            .filter(|(_, m)| !m)
            .flat_map(|(b, _)| b.clone())
            .collect();
        let recovered_blocks: Vec<Vec<u8>> = out
            .iter()
            .filter(|(_, m)| *m)
            .map(|(b, _)| b.clone())
            .collect();

        recovered_audio == audio && recovered_blocks == blocks
    }
}
