use crate::bitreader::IncompleteRead;
use crate::decoder::SUPPORTED_VERSION;
use crate::int_type::Field;

/// Everything that can go wrong while decoding a Tablog stream.
///
/// `UnexpectedCharacters` and `UnexpectedEndOfData` are data-level framing
/// conditions: the decoder reports them and keeps going. The remaining
/// variants are fatal; row iteration stops once one has been yielded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// No framed block was found in the input.
    #[error("input contains no framed block")]
    InputEmpty,

    /// The block header declares a format version this decoder does not
    /// support.
    #[error("input uses file format version {found}, we support {SUPPORTED_VERSION}")]
    UnsupportedVersion { found: u128 },

    /// A later block declares different fields than the first block.
    #[error("block schema {found:?} does not match the stream schema {expected:?}")]
    SchemaMismatch {
        expected: Vec<Field>,
        found: Vec<Field>,
    },

    /// Bytes were skipped before a block start marker.
    #[error("found {0} unexpected characters before block start")]
    UnexpectedCharacters(usize),

    /// The input ended before a block's end marker; the partial block was
    /// discarded.
    #[error("input data ended unexpectedly")]
    UnexpectedEndOfData,

    /// The bit stream ran out in the middle of a value.
    #[error(transparent)]
    IncompleteRead(#[from] IncompleteRead),

    /// An Elias-gamma code claimed a length no well-formed stream can
    /// produce.
    #[error("number code exceeds the representable range")]
    OversizedNumber,
}

impl DecodeError {
    /// Whether iteration can continue past this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DecodeError::UnexpectedCharacters(_) | DecodeError::UnexpectedEndOfData
        )
    }
}
