//! Chunk-size line decoding for `Transfer-Encoding: chunked` bodies.

/// What a byte of a chunk-size line did to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Step {
    /// The line is not complete yet (or was empty).
    Pending,
    /// A non-empty chunk follows.
    Data,
    /// The zero-size chunk that ends the body was read.
    Finished,
}

/// Bookkeeping for the chunk currently being read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ChunkState {
    /// Payload bytes left in the current chunk.
    pub(super) remaining: usize,
    digits: bool,
    extension: bool,
    last: bool,
}

impl ChunkState {
    /// Whether the terminating zero-size chunk has been seen.
    pub(super) fn is_last(&self) -> bool {
        self.last
    }

    /// Feed one byte of a chunk-size line.
    ///
    /// Hex digits accumulate into the size, `\r` and stray bytes are ignored,
    /// everything after `;` up to the end of the line is a chunk extension and
    /// ignored as well. A line holding no digits (the CRLF that trails the
    /// previous chunk's data) leaves the decoder waiting for the next line.
    pub(super) fn feed(&mut self, byte: u8) -> Step {
        match byte {
            b'\n' => {
                let had_digits = self.digits;
                self.digits = false;
                self.extension = false;
                if self.remaining > 0 {
                    Step::Data
                } else if had_digits {
                    self.last = true;
                    Step::Finished
                } else {
                    Step::Pending
                }
            }
            _ if self.extension => Step::Pending,
            b';' => {
                self.extension = true;
                Step::Pending
            }
            _ => {
                if let Some(value) = (byte as char).to_digit(16) {
                    self.digits = true;
                    self.remaining = self
                        .remaining
                        .saturating_mul(16)
                        .saturating_add(value as usize);
                }
                Step::Pending
            }
        }
    }
}
