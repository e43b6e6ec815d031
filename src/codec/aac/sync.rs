/// Upper bound on bytes buffered while hunting for a frame boundary.
/// A stream that cannot produce a frame within this window is not ADTS.
pub const RESYNC_LIMIT: usize = 2000;

/// Recovers whole ADTS frames from arbitrary byte runs.
///
/// Bytes are buffered until a complete frame is recognized; the candidate
/// frame always occupies the tail of the buffer. The callback receives
/// `(bytes, in_sync)`: recognized frames arrive with `in_sync == true`,
/// resync gaps and overflow flushes with `in_sync == false`. Returning
/// `false` from the callback stops the stream.
#[derive(Debug, Default)]
pub struct AdtsSync {
    buf: Vec<u8>,
    pos: usize,
    frame_length: usize,
}

impl AdtsSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a byte run through the synchronizer. Returns `false` if the
    /// callback requested a stop.
    pub fn feed<F>(&mut self, data: &[u8], cb: &mut F) -> bool
    where
        F: FnMut(&[u8], bool) -> bool,
    {
        for &b in data {
            self.buf.push(b);

            match self.pos {
                0 => {
                    if b == 0xFF {
                        self.pos = 1;
                    }
                }
                1 => {
                    // Sync nibble plus layer bits 0. A mismatch may itself
                    // be the 0xFF that starts the real header.
                    if b & 0xF6 == 0xF0 {
                        self.pos = 2;
                    } else if b == 0xFF {
                        self.pos = 1;
                    } else {
                        self.pos = 0;
                    }
                }
                2 => {
                    self.pos = 3;
                }
                3 => {
                    self.frame_length = ((b & 0x03) as usize) << 11;
                    self.pos = 4;
                }
                4 => {
                    self.frame_length |= (b as usize) << 3;
                    self.pos = 5;
                }
                5 => {
                    self.frame_length |= (b as usize) >> 5;
                    if self.frame_length > RESYNC_LIMIT {
                        self.pos = 0;
                    } else {
                        self.pos = 6;
                    }
                }
                _ => {
                    self.pos += 1;
                    if self.pos > 8 && self.pos == self.frame_length {
                        let gap = self.buf.len() - self.pos;
                        if gap > 0 && !cb(&self.buf[..gap], false) {
                            self.reset();
                            return false;
                        }
                        if !cb(&self.buf[gap..], true) {
                            self.reset();
                            return false;
                        }
                        self.reset();
                        continue;
                    }
                }
            }

            if self.buf.len() > RESYNC_LIMIT {
                let stop = !cb(&self.buf, false);
                self.reset();
                if stop {
                    return false;
                }
            }
        }
        true
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.pos = 0;
        self.frame_length = 0;
    }
}
