//! Sliding-window text chunking
//!
//! Chunks are fixed-size character windows with a configurable overlap
//! between consecutive windows. Character-based (not byte-based) so that
//! multi-byte text never splits inside a code point.

use crate::error::{Error, Result};

/// Split `text` into overlapping character windows.
///
/// Each chunk except possibly the last has exactly `size` characters;
/// consecutive chunks share `overlap` characters. Text no longer than
/// `size` comes back as a single chunk. Empty input yields no chunks.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>> {
    if size == 0 {
        return Err(Error::Config("chunk size must be positive".into()));
    }
    if overlap >= size {
        return Err(Error::Config(format!(
            "chunk overlap ({overlap}) must be smaller than chunk size ({size})"
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }
    if chars.len() <= size {
        return Ok(vec![text.to_string()]);
    }

    let step = size - overlap;
    let mut chunks = Vec::with_capacity(chars.len() / step + 1);
    let mut start = 0;
    loop {
        if start + size >= chars.len() {
            chunks.push(chars[start..].iter().collect());
            break;
        }
        chunks.push(chars[start..start + size].iter().collect());
        start += step;
    }
    Ok(chunks)
}
