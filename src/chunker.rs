//! # Text Chunking Module
//!
//! Splits normalized text into bounded, ordered chunks for embedding.
//!
//! ## Key Components
//!
//! - `Chunk`: a segment of text with its 1-based position and character count
//! - `ChunkOptions`: maximum chunk size and overlap, both in characters
//! - `chunk_text`: the chunking entry point
//!
//! ## Chunking Strategy
//!
//! 1. The text is cut into sentence units ending after `. `, `! `, `? ` or a
//!    newline; the delimiter stays with its unit
//! 2. Units are packed greedily while the chunk stays within `chunk_size`
//! 3. A unit longer than `chunk_size` is hard-split on character boundaries,
//!    and its last piece keeps packing with the following units
//! 4. With overlap, each chunk after the first is prefixed with the tail of
//!    the previous chunk's own text
//!
//! Stripping each prefix and concatenating the chunks gives back the input
//! exactly. Sizes are counted in Unicode scalar values, never bytes.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// A chunk of text with its position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The text of the chunk, including any overlap prefix
    pub text: String,

    /// 1-based position of the chunk in the document
    pub position: usize,

    /// Number of characters in `text`
    pub char_count: usize,
}

/// Configuration for chunking text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Maximum characters per chunk, before the overlap prefix
    pub chunk_size: usize,

    /// Characters carried over from the previous chunk
    pub overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 0,
        }
    }
}

/// Chunk text into bounded pieces
///
/// # Arguments
///
/// * `text` - The normalized text to chunk
/// * `options` - Chunking options
///
/// # Returns
///
/// Chunks in document order; empty when `text` is empty
#[instrument(skip(text), fields(chars = text.len()))]
pub fn chunk_text(text: &str, options: &ChunkOptions) -> Result<Vec<Chunk>> {
    if options.chunk_size == 0 {
        return Err(Error::InvalidInput(
            "chunk_size must be greater than 0".to_string(),
        ));
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let bodies = pack_units(&sentence_units(text), options.chunk_size);

    let mut chunks = Vec::with_capacity(bodies.len());
    let mut previous: Option<&str> = None;
    for (index, body) in bodies.iter().enumerate() {
        let mut chunk = match previous {
            Some(prev) if options.overlap > 0 => tail_chars(prev, options.overlap).to_string(),
            _ => String::new(),
        };
        chunk.push_str(body);
        let char_count = chunk.chars().count();
        chunks.push(Chunk {
            text: chunk,
            position: index + 1,
            char_count,
        });
        previous = Some(body.as_str());
    }

    debug!("Created {} chunks", chunks.len());
    Ok(chunks)
}

/// Split text after sentence punctuation followed by a space, and after newlines
fn sentence_units(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        let end = match ch {
            '\n' => Some(index + ch.len_utf8()),
            '.' | '!' | '?' => match chars.peek() {
                Some(&(space_index, ' ')) => {
                    chars.next();
                    Some(space_index + 1)
                }
                _ => None,
            },
            _ => None,
        };
        if let Some(end) = end {
            units.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        units.push(&text[start..]);
    }
    units
}

/// Greedily pack units into bodies of at most `chunk_size` characters
fn pack_units(units: &[&str], chunk_size: usize) -> Vec<String> {
    let mut bodies = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for unit in units {
        for piece in split_chars(unit, chunk_size) {
            let piece_len = piece.chars().count();
            if current_len > 0 && current_len + piece_len > chunk_size {
                bodies.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push_str(piece);
            current_len += piece_len;
        }
    }
    if !current.is_empty() {
        bodies.push(current);
    }
    bodies
}

/// Pieces of at most `size` characters, cut on character boundaries
fn split_chars(unit: &str, size: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = unit;
    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(size)
            .map_or(rest.len(), |(index, _)| index);
        let (piece, tail) = rest.split_at(cut);
        pieces.push(piece);
        rest = tail;
    }
    pieces
}

/// The last `count` characters of `text`, or all of it when shorter
fn tail_chars(text: &str, count: usize) -> &str {
    let total = text.chars().count();
    if count >= total {
        return text;
    }
    let start = text
        .char_indices()
        .nth(total - count)
        .map_or(text.len(), |(index, _)| index);
    &text[start..]
}
