//! Escape/marker framing that splits a raw byte stream into blocks.
//!
//! The encoder reserves a single escape byte; the byte after an escape
//! selects a command (block start, block end, literal escape) or falls
//! through as two literal bytes. The decoding is a single-byte-lookahead
//! state machine whose output is independent of how the input is chunked.

/// The escape byte introducing every framing command.
pub const ESCAPE_BYTE: u8 = b'T';
/// Command byte for a block start marker.
pub const START_BYTE: u8 = b'l';
/// Command byte for a block end marker.
pub const END_BYTE: u8 = b'#';
/// Command byte encoding one literal escape byte.
pub const DOUBLE_ESCAPE_BYTE: u8 = b' ';

/// One element of the unescaped stream: a payload byte or a block marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    Byte(u8),
    BlockStart,
    BlockEnd,
}

/// Flattens an iterator of byte chunks into a plain byte iterator.
///
/// Accepts any chunk granularity, including a single buffer; the downstream
/// decoding does not depend on where the chunk boundaries fall.
#[derive(Debug)]
pub struct ChunkBytes<I: Iterator> {
    chunks: I,
    current: Option<(I::Item, usize)>,
}

impl<I: Iterator> ChunkBytes<I>
where
    I::Item: AsRef<[u8]>,
{
    pub fn new(chunks: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            chunks: chunks.into_iter(),
            current: None,
        }
    }
}

impl<I: Iterator> Iterator for ChunkBytes<I>
where
    I::Item: AsRef<[u8]>,
{
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        loop {
            if let Some((chunk, pos)) = &mut self.current {
                let bytes = chunk.as_ref();
                if *pos < bytes.len() {
                    let b = bytes[*pos];
                    *pos += 1;
                    return Some(b);
                }
            }
            self.current = Some((self.chunks.next()?, 0));
        }
    }
}

/// Unescapes a raw byte stream into [`FrameEvent`]s.
///
/// After an escape byte: start and end commands become markers, a
/// double-escape (or another escape byte) yields one literal escape byte,
/// and anything else yields the escape byte followed by that byte, both
/// literal. An escape dangling at end-of-input yields a bare escape byte.
#[derive(Debug)]
pub struct Unescape<S> {
    input: S,
    pending_escape: bool,
    queued: Option<u8>,
}

impl<S: Iterator<Item = u8>> Unescape<S> {
    pub fn new(input: S) -> Self {
        Self {
            input,
            pending_escape: false,
            queued: None,
        }
    }
}

impl<S: Iterator<Item = u8>> Iterator for Unescape<S> {
    type Item = FrameEvent;

    fn next(&mut self) -> Option<FrameEvent> {
        if let Some(b) = self.queued.take() {
            return Some(FrameEvent::Byte(b));
        }
        loop {
            let Some(b) = self.input.next() else {
                if self.pending_escape {
                    self.pending_escape = false;
                    return Some(FrameEvent::Byte(ESCAPE_BYTE));
                }
                return None;
            };
            if self.pending_escape {
                if b == ESCAPE_BYTE {
                    // The previous escape was unused; this one starts over.
                    return Some(FrameEvent::Byte(ESCAPE_BYTE));
                }
                self.pending_escape = false;
                return Some(match b {
                    START_BYTE => FrameEvent::BlockStart,
                    END_BYTE => FrameEvent::BlockEnd,
                    DOUBLE_ESCAPE_BYTE => FrameEvent::Byte(ESCAPE_BYTE),
                    other => {
                        self.queued = Some(other);
                        FrameEvent::Byte(ESCAPE_BYTE)
                    }
                });
            } else if b == ESCAPE_BYTE {
                self.pending_escape = true;
            } else {
                return Some(FrameEvent::Byte(b));
            }
        }
    }
}

/// Result of seeking the next block start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seek {
    /// Bytes (and stray end markers) skipped before the start marker.
    pub junk: usize,
    /// Whether a start marker was found before the input ended.
    pub found: bool,
}

/// Locates framed blocks in an unescaped stream.
///
/// Single-pass: each block's bytes must be fully consumed (via
/// [`BlockBytes`]) before the next block can be located. This is enforced
/// structurally — [`BlockBytes`] takes the reader by value and only returns
/// it once the block is finished.
#[derive(Debug)]
pub struct FramedReader<S> {
    raw: Unescape<S>,
    /// Set when a start marker terminated the previous block early; the next
    /// seek resynchronizes on it without consuming input.
    replay_start: bool,
}

impl<S: Iterator<Item = u8>> FramedReader<S> {
    pub fn new(input: S) -> Self {
        Self {
            raw: Unescape::new(input),
            replay_start: false,
        }
    }

    /// Skips input until a block start marker, counting the skipped
    /// elements.
    pub fn seek_block(&mut self) -> Seek {
        if self.replay_start {
            self.replay_start = false;
            return Seek {
                junk: 0,
                found: true,
            };
        }
        let mut junk = 0;
        loop {
            match self.raw.next() {
                Some(FrameEvent::BlockStart) => {
                    return Seek { junk, found: true };
                }
                Some(_) => junk += 1,
                None => {
                    return Seek { junk, found: false };
                }
            }
        }
    }
}

/// How a block's byte sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    /// The block's end marker was seen.
    Terminated,
    /// The input ended (or a new block started) before the end marker.
    Truncated,
}

/// Lazy iterator over one block's payload bytes.
///
/// Owns the [`FramedReader`] while the block is live; call
/// [`BlockBytes::into_frames`] after draining it to continue with the next
/// block.
#[derive(Debug)]
pub struct BlockBytes<S> {
    frames: FramedReader<S>,
    outcome: Option<BlockOutcome>,
}

impl<S: Iterator<Item = u8>> BlockBytes<S> {
    /// Starts a block. The reader must be positioned just past a start
    /// marker (see [`FramedReader::seek_block`]).
    pub fn new(frames: FramedReader<S>) -> Self {
        Self {
            frames,
            outcome: None,
        }
    }

    /// How the block ended, once the iterator has returned `None`.
    pub fn outcome(&self) -> Option<BlockOutcome> {
        self.outcome
    }

    /// Returns the framing reader, consuming any bytes left in the block.
    pub fn into_frames(mut self) -> (FramedReader<S>, BlockOutcome) {
        while self.next().is_some() {}
        let outcome = self.outcome.unwrap_or(BlockOutcome::Truncated);
        (self.frames, outcome)
    }
}

impl<S: Iterator<Item = u8>> Iterator for BlockBytes<S> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.outcome.is_some() {
            return None;
        }
        match self.frames.raw.next() {
            Some(FrameEvent::Byte(b)) => Some(b),
            Some(FrameEvent::BlockEnd) => {
                self.outcome = Some(BlockOutcome::Terminated);
                None
            }
            Some(FrameEvent::BlockStart) => {
                self.outcome = Some(BlockOutcome::Truncated);
                self.frames.replay_start = true;
                None
            }
            None => {
                self.outcome = Some(BlockOutcome::Truncated);
                None
            }
        }
    }
}
