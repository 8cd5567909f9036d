//! Recursive, boundary-aware text splitting.
//!
//! Separators are tried from coarsest to finest (paragraph, line, word,
//! character). Each separator stays attached to the piece before it, so
//! every chunk is an exact byte range of the input.

use std::collections::VecDeque;
use std::ops::Range;

use thiserror::Error;

pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidChunking {
    #[error("chunk_size must be greater than zero")]
    ZeroSize,

    #[error("chunk_overlap ({overlap}) must be smaller than chunk_size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, InvalidChunking> {
        if chunk_size == 0 {
            return Err(InvalidChunking::ZeroSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(InvalidChunking::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Byte ranges of the chunks, in document order. Whitespace-only
    /// chunks are dropped.
    pub fn split_spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        self.split_recursive(text, 0, &DEFAULT_SEPARATORS, &mut spans);
        spans.retain(|span| !text[span.clone()].trim().is_empty());
        spans
    }

    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.split_spans(text)
            .into_iter()
            .map(|span| &text[span])
            .collect()
    }

    fn split_recursive(
        &self,
        text: &str,
        offset: usize,
        separators: &[&str],
        out: &mut Vec<Range<usize>>,
    ) {
        if text.is_empty() {
            return;
        }

        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let mut fitting: Vec<(Range<usize>, usize)> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            let len = text[piece.clone()].chars().count();
            let absolute = (piece.start + offset)..(piece.end + offset);
            if len <= self.chunk_size {
                fitting.push((absolute, len));
                continue;
            }

            self.merge(std::mem::take(&mut fitting), out);
            if finer.is_empty() {
                out.push(absolute);
            } else {
                self.split_recursive(&text[piece], absolute.start, finer, out);
            }
        }
        self.merge(fitting, out);
    }

    /// Greedy merge of consecutive pieces; after each emitted chunk the
    /// trailing pieces totalling at most `chunk_overlap` chars carry over.
    fn merge(&self, pieces: Vec<(Range<usize>, usize)>, out: &mut Vec<Range<usize>>) {
        let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0usize;

        for (span, len) in pieces {
            if total + len > self.chunk_size && !window.is_empty() {
                out.push(window_span(&window));
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            total += len;
            window.push_back((span, len));
        }

        if !window.is_empty() {
            out.push(window_span(&window));
        }
    }
}

fn window_span(window: &VecDeque<(Range<usize>, usize)>) -> Range<usize> {
    match (window.front(), window.back()) {
        (Some(first), Some(last)) => first.0.start..last.0.end,
        _ => 0..0,
    }
}

fn split_keeping_separator(text: &str, separator: &str) -> Vec<Range<usize>> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, ch)| i..i + ch.len_utf8())
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, matched) in text.match_indices(separator) {
        let end = idx + matched.len();
        pieces.push(start..end);
        start = end;
    }
    if start < text.len() {
        pieces.push(start..text.len());
    }
    pieces
}
