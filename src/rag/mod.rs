//! Chunking, embedding-backed retrieval and retrieval QA.

pub mod corpus;
pub mod index;
pub mod qa;
pub mod splitter;
pub mod vector_math;

pub use corpus::{Chunk, CorpusBuilder, DocumentId};
pub use index::{IndexError, IndexSettings, RetrievalIndex, ScoredChunk};
pub use qa::{QaError, QaSettings, RetrievalQa};
pub use splitter::{InvalidChunking, RecursiveSplitter};
