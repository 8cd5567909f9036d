pub mod error;
pub mod service;
pub mod settings;
pub mod validation;

pub use error::ConfigError;
pub use service::ConfigService;
pub use settings::{
    AgentSettings, AppConfig, BudgetSettings, ChunkingSettings, LlmSettings, LoggingSettings,
    RetrievalSettings, ServerSettings, TimeoutSettings,
};
