use std::fmt;
use std::ops::Range;

use serde::Serialize;

use super::splitter::RecursiveSplitter;

/// Which of the two submitted documents a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DocumentId {
    First,
    Second,
}

impl DocumentId {
    pub fn number(&self) -> u8 {
        match self {
            DocumentId::First => 1,
            DocumentId::Second => 2,
        }
    }

    /// Name the agent sees, e.g. `document-1`.
    pub fn label(&self) -> String {
        format!("document-{}", self.number())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub text: String,
    /// `"{document number}-{sequence index}"`
    pub source_id: String,
    pub sequence_index: usize,
    pub document: DocumentId,
    /// Byte range into the source document.
    pub span: Range<usize>,
}

/// Splits documents into tagged chunks.
#[derive(Debug, Clone, Copy)]
pub struct CorpusBuilder {
    splitter: RecursiveSplitter,
}

impl CorpusBuilder {
    pub fn new(splitter: RecursiveSplitter) -> Self {
        Self { splitter }
    }

    pub fn build_chunks(&self, text: &str, document: DocumentId) -> Vec<Chunk> {
        self.splitter
            .split_spans(text)
            .into_iter()
            .enumerate()
            .map(|(sequence_index, span)| Chunk {
                text: text[span.clone()].to_string(),
                source_id: format!("{}-{}", document, sequence_index),
                sequence_index,
                document,
                span,
            })
            .collect()
    }

    /// Chunks of both documents, doc1 first.
    pub fn build_merged(&self, doc1: &str, doc2: &str) -> Vec<Chunk> {
        let mut chunks = self.build_chunks(doc1, DocumentId::First);
        chunks.extend(self.build_chunks(doc2, DocumentId::Second));
        chunks
    }
}
