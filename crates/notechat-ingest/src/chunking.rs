//! Recursive character chunking.
//!
//! Text is split on the highest-priority separator present in the current
//! span (`"\n\n"`, `"\n"`, `". "`, `" "`, then single characters). Pieces that
//! are still too large recurse with the remaining separators; the rest are
//! merged greedily up to `chunk_size`, carrying up to `chunk_overlap`
//! characters of trailing pieces into the next chunk. When the trailing
//! piece alone exceeds the overlap, the next chunk is seeded with the last
//! words of the previous one instead. All lengths count characters, not bytes.

use std::borrow::Cow;
use std::fmt;

use tracing::{debug, warn};

use notechat_core::RetrievalSettings;
use notechat_store::Chunk;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Parameter problems that stop the recursive splitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    ZeroChunkSize,
    OverlapTooLarge { chunk_size: usize, chunk_overlap: usize },
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroChunkSize => write!(f, "chunk size must be greater than zero"),
            Self::OverlapTooLarge {
                chunk_size,
                chunk_overlap,
            } => write!(
                f,
                "chunk overlap ({}) is larger than chunk size ({})",
                chunk_overlap, chunk_size
            ),
        }
    }
}

impl std::error::Error for ChunkError {}

/// Recursive chunker that respects document structure.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    separators: Vec<&'static str>,
}

impl RecursiveChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.to_vec(),
        }
    }

    pub fn from_settings(settings: &RetrievalSettings) -> Self {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Split `text` into trimmed, non-empty chunks.
    ///
    /// Never fails: when the parameters are unusable the text is cut into
    /// fixed-width slices instead.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        match self.try_split(text) {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("Recursive split failed ({}), using fixed-width slices", e);
                self.fixed_slices(text)
            }
        }
    }

    /// The recursive splitter proper.
    pub fn try_split(&self, text: &str) -> Result<Vec<String>, ChunkError> {
        if self.chunk_size == 0 {
            return Err(ChunkError::ZeroChunkSize);
        }
        if self.chunk_overlap > self.chunk_size {
            return Err(ChunkError::OverlapTooLarge {
                chunk_size: self.chunk_size,
                chunk_overlap: self.chunk_overlap,
            });
        }
        let mut pieces = Vec::new();
        self.split_recursive(text, &self.separators, &mut pieces);
        Ok(self.merge(&pieces))
    }

    /// Split and wrap as indexed [`Chunk`]s tagged with `source`.
    pub fn chunks(&self, text: &str, source: &str) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self
            .split_text(text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk::new(index, text, source))
            .collect();
        debug!("Split {} chars into {} chunks", text.chars().count(), chunks.len());
        chunks
    }

    /// Break `text` into pieces shorter than `chunk_size`, in order.
    fn split_recursive<'a>(&self, text: &'a str, separators: &[&str], out: &mut Vec<&'a str>) {
        // First separator present in the span wins; "" always matches.
        let mut separator = "";
        let mut remaining: &[&str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                break;
            }
            if text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        for piece in split_keeping_separator(text, separator) {
            // Single characters are unsplittable.
            if char_len(piece) < self.chunk_size || remaining.is_empty() {
                out.push(piece);
            } else {
                self.split_recursive(piece, remaining, out);
            }
        }
    }

    /// Greedy merge of small pieces with trailing overlap.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut window: Vec<Cow<'_, str>> = Vec::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_joined(&mut out, &window);
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    total -= char_len(&window[0]);
                    window.remove(0);
                }
                if window.iter().all(|p| p.trim().is_empty()) {
                    window.clear();
                    total = 0;
                }
                if window.is_empty() {
                    let budget = self.chunk_overlap.min(self.chunk_size.saturating_sub(len));
                    if let Some(seed) = out.last().and_then(|prev| overlap_seed(prev, budget)) {
                        total = char_len(&seed);
                        window.push(Cow::Owned(seed));
                    }
                }
            }
            window.push(Cow::Borrowed(piece));
            total += len;
        }
        push_joined(&mut out, &window);
        out
    }

    fn fixed_slices(&self, text: &str) -> Vec<String> {
        if self.chunk_size == 0 {
            return vec![text.trim().to_string()];
        }
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(self.chunk_size)
            .map(|slice| slice.iter().collect::<String>())
            .filter(|s| !s.trim().is_empty())
            .collect()
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

/// Split on `separator`, attaching each separator to the start of the piece
/// that follows it. An empty separator yields single characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            pieces.push(&text[start..pos]);
        }
        start = pos;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

/// The last words of `prev` that fit in `budget` characters. Falls back to a
/// raw character cut when no word boundary fits.
fn overlap_seed(prev: &str, budget: usize) -> Option<String> {
    if budget == 0 {
        return None;
    }
    let skip = char_len(prev).saturating_sub(budget);
    let start = prev.char_indices().nth(skip).map_or(0, |(i, _)| i);
    let tail = &prev[start..];

    let mid_word = start > 0
        && !prev[..start].ends_with(char::is_whitespace)
        && !tail.starts_with(char::is_whitespace);
    let seed = match tail.find(char::is_whitespace) {
        Some(ws) if mid_word && !tail[ws..].trim().is_empty() => tail[ws..].trim_start(),
        _ => tail.trim_start(),
    };
    if seed.is_empty() {
        None
    } else {
        Some(seed.to_string())
    }
}

fn push_joined(out: &mut Vec<String>, window: &[Cow<'_, str>]) {
    let joined = window.concat();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
