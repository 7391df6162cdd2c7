//! # Tablog
//!
//! A streaming decoder for the Tablog compressed table format: fixed-width
//! integer columns compressed by per-field predictors, designed for logging
//! sensor data from microcontrollers.
//!
//! ## Format overview
//!
//! A Tablog stream is a sequence of framed *blocks*. Inside a block the
//! encoder never stores values directly:
//!
//! - **Predictors** guess each value from the column's decoded history. A
//!   correct guess costs a single bit; a miss stores the prediction error's
//!   sign and magnitude with an adaptive Exp-Golomb code whose Rice
//!   parameter self-tunes per field.
//! - **Framing** makes block boundaries findable in a raw byte stream: an
//!   escape byte introduces block start and end markers, and payload bytes
//!   equal to the escape are doubled. A decoder can resynchronize at the
//!   next block after data loss.
//!
//! The decoder mirrors the encoder's predictor and adaptation state exactly,
//! so no per-value metadata is needed on the wire.
//!
//! ## Example
//!
//! ```rust
//! use tablog::{IntType, TablogDecoder};
//!
//! // One framed block holding a single u8 column with values 5, 5, 7.
//! let data = [0x54, 0x6C, 0x03, 0xCB, 0x01, 0x54, 0x23];
//!
//! let decoder = TablogDecoder::from_slice(&data).unwrap();
//! assert_eq!(decoder.field_types(), [IntType::new(false, 8)]);
//!
//! let rows: Vec<_> = decoder.map(|r| r.unwrap()).collect();
//! assert_eq!(rows, [[5], [5], [7]]);
//! ```
//!
//! ## Chunked input
//!
//! Input does not have to be a single buffer; any iterable of byte chunks
//! works and chunk boundaries never affect the decoded rows:
//!
//! ```rust
//! # use tablog::TablogDecoder;
//! let chunks = [vec![0x54, 0x6C, 0x03], vec![0xCB, 0x01, 0x54, 0x23]];
//! for row in TablogDecoder::new(chunks).unwrap() {
//!     println!("{:?}", row.unwrap());
//! }
//! ```

pub mod bitreader;
pub mod codes;
pub mod decoder;
pub mod error;
pub mod framing;
pub mod int_type;
pub mod predictor;

// Re-export primary types at the crate root.
pub use bitreader::{BitReader, IncompleteRead};
pub use codes::AdaptiveExpGolombDecoder;
pub use decoder::{stream_predictor_factory, Row, TablogDecoder, SUPPORTED_VERSION};
pub use error::DecodeError;
pub use int_type::{Field, IntType};
pub use predictor::{Predictor, PredictorFactory};
