pub mod execution;
pub mod instructions;
pub mod tools;

pub use execution::{AgentError, AgentExecutor, AgentOutcome, AgentStep};
pub use tools::{AgentTool, ToolError};
