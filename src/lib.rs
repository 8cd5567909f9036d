//! Two-document comparison over retrieval-augmented generation.
//!
//! A request carries a question, two documents and a strategy selector.
//! After a token budget check the documents are chunked, embedded and
//! answered either by one merged retrieval QA call or by an agent that
//! consults one retrieval tool per document.

pub mod agent;
pub mod compare;
pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod tokens;
