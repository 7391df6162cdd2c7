//! Universal number codes: Elias-gamma and the adaptive Exp-Golomb code
//! built on top of it.

use crate::bitreader::{BitReader, MAX_READ_BITS};
use crate::error::DecodeError;

/// Decodes one Elias-gamma coded number: a unary zero prefix of length `b`
/// terminated by a set bit, then `b` explicit bits of value; the result is
/// `(1 << b | value) - 1`.
pub fn decode_elias_gamma<S: Iterator<Item = u8>>(
    reader: &mut BitReader<S>,
) -> Result<u128, DecodeError> {
    let mut bits = 0;
    while !reader.read_bit()? {
        bits += 1;
        // No 8..64-bit field produces a payload beyond 64 bits; a longer
        // prefix means the stream is corrupt.
        if bits > MAX_READ_BITS {
            return Err(DecodeError::OversizedNumber);
        }
    }
    let value = reader.read(bits)?;
    Ok((1u128 << bits | value as u128) - 1)
}

const STATE_SHIFT: u32 = 2;

/// Decoder for the adaptive Exp-Golomb (adaptive Rice) code.
///
/// The Rice parameter k is stored multiplied by 4 for hysteresis and
/// self-tunes from the decoded quotients: a zero quotient nudges the state
/// down, a quotient above one nudges it up, and a quotient of exactly one is
/// a dead zone that keeps the parameter from oscillating. The state stays
/// within `[0, 4 * bit_width - 1]`, so k never exceeds `bit_width - 1`.
///
/// The encoder runs the identical update rule, which keeps both sides in
/// lockstep without any side channel.
#[derive(Debug, Clone)]
pub struct AdaptiveExpGolombDecoder {
    state: u32,
    max_state: u32,
}

impl AdaptiveExpGolombDecoder {
    /// Creates a decoder tuned for values of the given bit width.
    pub fn new(bit_width: u32) -> Self {
        Self {
            state: (bit_width / 8) << STATE_SHIFT,
            max_state: (bit_width << STATE_SHIFT) - 1,
        }
    }

    /// Decodes one value: an Elias-gamma quotient followed by k raw bits.
    pub fn decode<S: Iterator<Item = u8>>(
        &mut self,
        reader: &mut BitReader<S>,
    ) -> Result<u128, DecodeError> {
        let k = self.state >> STATE_SHIFT;
        let p = decode_elias_gamma(reader)?;

        if p == 0 && self.state > 0 {
            self.state -= 1;
        } else if p > 1 && self.state < self.max_state {
            self.state += 1;
        }

        // A corrupt stream can pair a huge quotient with a large k; the
        // shifted result must still fit a signed 128-bit magnitude.
        if p > i128::MAX as u128 >> k {
            return Err(DecodeError::OversizedNumber);
        }

        let low = reader.read(k)?;
        Ok(p << k | low as u128)
    }

    /// Current adaptation state (k times 4).
    pub fn state(&self) -> u32 {
        self.state
    }
}
