//! The comparison pipeline: validation, budgeting and the two answering
//! strategies.

pub mod concat;
pub mod error;
pub mod orchestrator;
pub mod routed;
pub mod strategy;
pub mod types;

pub use concat::ConcatenatedRetrieval;
pub use error::CompareError;
pub use orchestrator::ComparisonService;
pub use routed::{DocumentQaTool, ToolRoutedRetrieval};
pub use strategy::{AnsweringStrategy, PipelineContext};
pub use types::{AnswerResult, CompareForm, DocumentSet, Phase, Strategy};
