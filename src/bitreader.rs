/// Error returned when a read asks for more bits than the input has left.
///
/// `remaining` counts the usable bits at the point of failure, excluding the
/// end-of-data terminator bit; it is 0 when the input was already drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("tried to read {requested} bits with only {remaining} bits left in input")]
pub struct IncompleteRead {
    pub requested: u32,
    pub remaining: u32,
}

/// Largest single read supported by [`BitReader::read`].
///
/// Every value the wire format produces fits: Elias-gamma payloads are at
/// most 64 bits and the adaptive Golomb parameter k is at most 63.
pub const MAX_READ_BITS: u32 = 64;

/// Lookahead margin kept in the bit buffer beyond the requested read, so the
/// end-of-data terminator is always detected before it could be confused
/// with payload.
const LOOKAHEAD_BITS: u32 = 9;

/// Reads unaligned bit-level data from a byte stream.
///
/// Bytes are OR'd into a bit buffer at the current free-bit offset, so bits
/// come out LSB-first within each byte and multi-bit reads reconstruct the
/// little-endian interpretation of the underlying bytes. The encoder appends
/// exactly one extra set bit after the last meaningful bit; once the source
/// is exhausted that terminator is excluded from the usable bit count.
///
/// # Example
/// ```
/// use tablog::bitreader::BitReader;
///
/// // 0xAB, 0xCD plus the terminator bit in a third byte.
/// let mut reader = BitReader::new([0xAB, 0xCD, 0x01].into_iter());
/// assert_eq!(reader.read(16), Ok(0xCDAB));
/// assert!(reader.end_of_block());
/// ```
#[derive(Debug)]
pub struct BitReader<S> {
    source: S,
    buf: u128,
    remaining: u32,
    exhausted: bool,
}

impl<S: Iterator<Item = u8>> BitReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            buf: 0,
            remaining: 0,
            exhausted: false,
        }
    }

    /// Reads `nbits` bits (at most [`MAX_READ_BITS`]) as a little-endian
    /// integer.
    pub fn read(&mut self, nbits: u32) -> Result<u64, IncompleteRead> {
        debug_assert!(nbits <= MAX_READ_BITS);
        self.fill(nbits);
        if self.remaining < nbits {
            return Err(IncompleteRead {
                requested: nbits,
                remaining: self.remaining,
            });
        }
        let value = (self.buf & ((1u128 << nbits) - 1)) as u64;
        self.buf >>= nbits;
        self.remaining -= nbits;
        Ok(value)
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> Result<bool, IncompleteRead> {
        Ok(self.read(1)? == 1)
    }

    /// Returns `true` if the next 1-bit read would fail.
    pub fn end_of_block(&mut self) -> bool {
        self.fill(1);
        self.remaining == 0
    }

    /// Consumes the reader and returns the underlying byte source.
    pub fn into_inner(self) -> S {
        self.source
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Tops the buffer up to `nbits` plus the lookahead margin, or until the
    /// source runs out. On exhaustion the highest set bit of the buffer is
    /// the terminator and everything below it remains usable.
    fn fill(&mut self, nbits: u32) {
        while !self.exhausted && self.remaining < nbits + LOOKAHEAD_BITS {
            match self.source.next() {
                Some(byte) => {
                    self.buf |= (byte as u128) << self.remaining;
                    self.remaining += 8;
                }
                None => {
                    self.exhausted = true;
                    self.remaining = (128 - self.buf.leading_zeros()).saturating_sub(1);
                }
            }
        }
    }
}
