//! A minimal mirror of the Tablog encoder: just enough to produce streams
//! the decoder under test must accept. It runs the same predictor pipeline
//! and Exp-Golomb adaptation rule, so encoder and decoder state stay in
//! lockstep across rows and blocks.
#![allow(dead_code)]

use tablog::framing::{DOUBLE_ESCAPE_BYTE, END_BYTE, ESCAPE_BYTE, START_BYTE};
use tablog::int_type::{Field, IntType};
use tablog::predictor::Predictor;
use tablog::stream_predictor_factory;

/// LSB-first bit sink matching the decoder's bit order.
pub struct BitWriter {
    bytes: Vec<u8>,
    bits: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            bits: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        if self.bits % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            *self.bytes.last_mut().unwrap() |= 1 << (self.bits % 8);
        }
        self.bits += 1;
    }

    pub fn write(&mut self, value: u64, nbits: u32) {
        for i in 0..nbits {
            self.write_bit(value >> i & 1 == 1);
        }
    }

    /// Appends the terminator bit and returns the payload bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.write_bit(true);
        self.bytes
    }
}

/// Writes `v` as an Elias-gamma code: a unary zero prefix, a stop bit, then
/// the explicit low bits of `v + 1`.
pub fn write_gamma(w: &mut BitWriter, v: u128) {
    let n = v + 1;
    let b = 127 - n.leading_zeros();
    for _ in 0..b {
        w.write_bit(false);
    }
    w.write_bit(true);
    for i in 0..b {
        w.write_bit(n >> i & 1 == 1);
    }
}

/// Encoder side of the adaptive Exp-Golomb code; the update rule is the
/// exact mirror of the decoder's.
pub struct GolombEncoder {
    state: u32,
    max_state: u32,
}

impl GolombEncoder {
    pub fn new(bit_width: u32) -> Self {
        Self {
            state: (bit_width / 8) << 2,
            max_state: (bit_width << 2) - 1,
        }
    }

    pub fn encode(&mut self, w: &mut BitWriter, value: u128) {
        let k = self.state >> 2;
        let p = value >> k;

        if p == 0 && self.state > 0 {
            self.state -= 1;
        } else if p > 1 && self.state < self.max_state {
            self.state += 1;
        }

        write_gamma(w, p);
        w.write((value & ((1u128 << k) - 1)) as u64, k);
    }
}

/// Wraps a block payload in start/end markers, doubling escape bytes.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![ESCAPE_BYTE, START_BYTE];
    for &b in payload {
        if b == ESCAPE_BYTE {
            out.extend([ESCAPE_BYTE, DOUBLE_ESCAPE_BYTE]);
        } else {
            out.push(b);
        }
    }
    out.extend([ESCAPE_BYTE, END_BYTE]);
    out
}

/// Stateful stream encoder: predictor and Golomb state persist across
/// blocks, as they do in the decoder.
pub struct MirrorEncoder {
    fields: Vec<Field>,
    predictors: Vec<Box<dyn Predictor>>,
    golombs: Vec<GolombEncoder>,
}

impl MirrorEncoder {
    pub fn new(fields: Vec<Field>) -> Self {
        let factory = stream_predictor_factory();
        let predictors = fields.iter().map(|f| factory.build(f.ty)).collect();
        let golombs = fields
            .iter()
            .map(|f| GolombEncoder::new(f.ty.bitsize()))
            .collect();
        Self {
            fields,
            predictors,
            golombs,
        }
    }

    pub fn encode_block(&mut self, rows: &[Vec<i128>]) -> Vec<u8> {
        let mut w = BitWriter::new();
        write_gamma(&mut w, 0);
        write_gamma(&mut w, self.fields.len() as u128 - 1);
        for f in &self.fields {
            // Field names occupy no bits.
            w.write_bit(f.ty.signed());
            w.write((f.ty.bitsize().trailing_zeros() - 3) as u64, 2);
        }

        for row in rows {
            assert_eq!(row.len(), self.fields.len());
            for ((&value, predictor), golomb) in row
                .iter()
                .zip(&mut self.predictors)
                .zip(&mut self.golombs)
            {
                let prediction = predictor.predict();
                if value == prediction {
                    w.write_bit(true);
                } else {
                    w.write_bit(false);
                    w.write_bit(prediction > value);
                    let magnitude = (prediction - value).unsigned_abs();
                    golomb.encode(&mut w, magnitude - 1);
                }
                predictor.feed(value);
            }
        }

        frame(&w.finish())
    }
}

/// An anonymous field of the given type, e.g. `field("s16")`.
pub fn field(ty: &str) -> Field {
    Field::new("", ty.parse::<IntType>().unwrap())
}

/// Encodes one block over fresh encoder state.
pub fn encode_stream(types: &[&str], rows: &[Vec<i128>]) -> Vec<u8> {
    MirrorEncoder::new(types.iter().map(|t| field(t)).collect()).encode_block(rows)
}
