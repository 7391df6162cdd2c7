//! The Tablog stream decoder: parses block headers, runs the per-field
//! predictor pipelines and reconstructs rows bit-for-bit as the paired
//! encoder produced them.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::bitreader::BitReader;
use crate::codes::{decode_elias_gamma, AdaptiveExpGolombDecoder};
use crate::error::DecodeError;
use crate::framing::{BlockBytes, BlockOutcome, ChunkBytes, FramedReader};
use crate::int_type::{Field, IntType};
use crate::predictor::{Predictor, PredictorFactory};

/// The only file format version this decoder understands.
pub const SUPPORTED_VERSION: u128 = 0;

/// One decoded row: ordered values, one per field.
pub type Row = Vec<i128>;

/// The per-field predictor pipeline the format currently uses.
///
/// Must match the paired encoder exactly; the adaptive selection is a pure
/// function of the decoded history, so no side channel is needed to keep
/// both sides in lockstep.
pub fn stream_predictor_factory() -> PredictorFactory {
    PredictorFactory::adapt(8, PredictorFactory::Last, PredictorFactory::LinearO2)
}

enum State<S: Iterator<Item = u8>> {
    InBlock(BitReader<BlockBytes<S>>),
    Finished,
}

/// Streaming decoder for Tablog-compressed tables.
///
/// Constructed from an iterable of byte chunks (any granularity) or a single
/// buffer; iterates over decoded rows. Schema and per-field predictor state
/// are created at the first block's header and persist across block
/// boundaries; later blocks must declare the identical schema.
///
/// Recoverable framing conditions ([`DecodeError::UnexpectedCharacters`],
/// [`DecodeError::UnexpectedEndOfData`]) are yielded as `Err` items and
/// iteration continues; any other error ends iteration.
///
/// # Example
/// ```
/// use tablog::{IntType, TablogDecoder};
///
/// // One framed block holding a single u8 column with values 5, 5, 7.
/// let data = [0x54, 0x6C, 0x03, 0xCB, 0x01, 0x54, 0x23];
/// let decoder = TablogDecoder::from_slice(&data).unwrap();
/// assert_eq!(decoder.field_types(), [IntType::new(false, 8)]);
///
/// let rows: Vec<_> = decoder.map(|r| r.unwrap()).collect();
/// assert_eq!(rows, [[5], [5], [7]]);
/// ```
pub struct TablogDecoder<I: Iterator>
where
    I::Item: AsRef<[u8]>,
{
    state: State<ChunkBytes<I>>,
    fields: Vec<Field>,
    predictors: Vec<Box<dyn Predictor>>,
    error_decoders: Vec<AdaptiveExpGolombDecoder>,
    /// Recoverable conditions waiting to be yielded.
    pending: VecDeque<DecodeError>,
    done: bool,
}

impl<I: Iterator> TablogDecoder<I>
where
    I::Item: AsRef<[u8]>,
{
    /// Opens a decoder over an iterable of byte chunks and parses the first
    /// block's header.
    pub fn new<C>(chunks: C) -> Result<Self, DecodeError>
    where
        C: IntoIterator<IntoIter = I>,
    {
        let mut frames = FramedReader::new(ChunkBytes::new(chunks));
        let mut pending = VecDeque::new();

        let seek = frames.seek_block();
        if seek.junk > 0 {
            warn!("skipping {} unexpected bytes before first block", seek.junk);
            pending.push_back(DecodeError::UnexpectedCharacters(seek.junk));
        }
        if !seek.found {
            return Err(DecodeError::InputEmpty);
        }

        let mut reader = BitReader::new(BlockBytes::new(frames));
        let fields = read_block_header(&mut reader)?;
        debug!("stream schema: {fields:?}");

        let factory = stream_predictor_factory();
        let predictors = fields.iter().map(|f| factory.build(f.ty)).collect();
        let error_decoders = fields
            .iter()
            .map(|f| AdaptiveExpGolombDecoder::new(f.ty.bitsize()))
            .collect();

        Ok(Self {
            state: State::InBlock(reader),
            fields,
            predictors,
            error_decoders,
            pending,
            done: false,
        })
    }

    /// The stream's fields, as declared by the first block's header.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field_types(&self) -> Vec<IntType> {
        self.fields.iter().map(|f| f.ty).collect()
    }

    /// Decodes one row. The caller has already checked `end_of_block`.
    fn decode_row(&mut self) -> Result<Row, DecodeError> {
        let State::InBlock(reader) = &mut self.state else {
            unreachable!("decode_row outside a block");
        };
        let mut row = Row::with_capacity(self.fields.len());
        for ((predictor, error_decoder), field) in self
            .predictors
            .iter_mut()
            .zip(self.error_decoders.iter_mut())
            .zip(self.fields.iter())
        {
            let prediction = predictor.predict();
            let value = if reader.read_bit()? {
                prediction
            } else {
                let prediction_high = reader.read_bit()?;
                // Zero is impossible on a miss, so magnitudes are biased.
                let raw = error_decoder.decode(reader)?;
                // Prediction and value both lie in the field's range, so a
                // legal magnitude never reaches the range width.
                if raw >= (1u128 << field.ty.bitsize()) - 1 {
                    return Err(DecodeError::OversizedNumber);
                }
                let magnitude = raw as i128 + 1;
                if prediction_high {
                    prediction - magnitude
                } else {
                    prediction + magnitude
                }
            };
            predictor.feed(value);
            row.push(value);
        }
        Ok(row)
    }

    /// Leaves the current block and enters the next one, if any. Framing
    /// problems and header errors are queued for the iterator to yield.
    fn advance_block(&mut self) {
        let State::InBlock(reader) = std::mem::replace(&mut self.state, State::Finished) else {
            return;
        };
        let (mut frames, outcome) = reader.into_inner().into_frames();
        if outcome == BlockOutcome::Truncated {
            warn!("input ended before the block's end marker");
            self.pending.push_back(DecodeError::UnexpectedEndOfData);
        }

        loop {
            let seek = frames.seek_block();
            if seek.junk > 0 {
                warn!("skipping {} unexpected bytes between blocks", seek.junk);
                self.pending
                    .push_back(DecodeError::UnexpectedCharacters(seek.junk));
            }
            if !seek.found {
                return;
            }

            let mut reader = BitReader::new(BlockBytes::new(frames));
            match read_block_header(&mut reader) {
                Ok(fields) if fields == self.fields => {
                    debug!("entering next block, schema validated");
                    // Predictor and Golomb state deliberately carry over.
                    self.state = State::InBlock(reader);
                    return;
                }
                Ok(fields) => {
                    self.pending.push_back(DecodeError::SchemaMismatch {
                        expected: self.fields.clone(),
                        found: fields,
                    });
                    return;
                }
                Err(err) => {
                    // A block whose header was cut off may be followed by a
                    // replayed start marker; keep seeking after recoverable
                    // failures instead of dropping the reader.
                    let (recovered, outcome) = reader.into_inner().into_frames();
                    frames = recovered;
                    let err = classify_truncation(err, Some(outcome));
                    let recoverable = err.is_recoverable();
                    self.pending.push_back(err);
                    if !recoverable {
                        return;
                    }
                }
            }
        }
    }
}

impl<'a> TablogDecoder<std::iter::Once<&'a [u8]>> {
    /// Opens a decoder over a single in-memory buffer.
    pub fn from_slice(data: &'a [u8]) -> Result<Self, DecodeError> {
        Self::new(std::iter::once(data))
    }
}

impl<I: Iterator> Iterator for TablogDecoder<I>
where
    I::Item: AsRef<[u8]>,
{
    type Item = Result<Row, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if let Some(err) = self.pending.pop_front() {
                if !err.is_recoverable() {
                    self.done = true;
                }
                return Some(Err(err));
            }
            let State::InBlock(reader) = &mut self.state else {
                self.done = true;
                return None;
            };
            if reader.end_of_block() {
                self.advance_block();
                continue;
            }
            match self.decode_row() {
                Ok(row) => return Some(Ok(row)),
                Err(err) => {
                    let outcome = match &self.state {
                        State::InBlock(reader) => reader.get_ref().outcome(),
                        State::Finished => None,
                    };
                    match classify_truncation(err, outcome) {
                        // Truncated mid-row: the partial row is discarded
                        // and advance_block reports the truncation once.
                        DecodeError::UnexpectedEndOfData => self.advance_block(),
                        err => {
                            self.done = true;
                            return Some(Err(err));
                        }
                    }
                }
            }
        }
    }
}

/// An `IncompleteRead` inside a truncated block is the truncation itself,
/// not stream corruption.
fn classify_truncation(err: DecodeError, outcome: Option<BlockOutcome>) -> DecodeError {
    match (err, outcome) {
        (DecodeError::IncompleteRead(_), Some(BlockOutcome::Truncated)) => {
            DecodeError::UnexpectedEndOfData
        }
        (err, _) => err,
    }
}

fn read_block_header<S: Iterator<Item = u8>>(
    reader: &mut BitReader<S>,
) -> Result<Vec<Field>, DecodeError> {
    let version = decode_elias_gamma(reader)?;
    if version != SUPPORTED_VERSION {
        return Err(DecodeError::UnsupportedVersion { found: version });
    }

    // Field count is biased on the wire; a block always has at least one.
    let field_count = decode_elias_gamma(reader)? + 1;
    let mut fields = Vec::new();
    for _ in 0..field_count {
        let name = decode_field_name(reader)?;
        let signed = reader.read_bit()?;
        let bitsize = 8u32 << reader.read(2)?;
        fields.push(Field::new(name, IntType::new(signed, bitsize)));
    }
    Ok(fields)
}

/// Decodes a field name from the block header.
///
/// The paired encoder reserves header space for names but does not emit any
/// name bits yet, so every name decodes as empty without consuming input.
/// This is the seam where a real string codec would go.
fn decode_field_name<S: Iterator<Item = u8>>(
    _reader: &mut BitReader<S>,
) -> Result<String, DecodeError> {
    Ok(String::new())
}
