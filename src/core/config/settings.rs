use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::instructions::{DEFAULT_QUESTION_TEMPLATE, DEFAULT_SYSTEM_PREFIX, QUESTION_PLACEHOLDER};
use crate::rag::RecursiveSplitter;

use super::ConfigError;

/// Fully resolved application configuration.
///
/// Built once at startup by [`super::ConfigService`] and shared read-only
/// behind an `Arc` for the lifetime of the process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub budget: BudgetSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub agent: AgentSettings,
    pub timeouts: TimeoutSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4-0613".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            temperature: 0.0,
            request_timeout_secs: 60,
            max_retries: 2,
            retry_base_ms: 250,
        }
    }
}

impl LlmSettings {
    /// The credential, if one is set and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &self.credential().map(|_| "****"))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_base_ms", &self.retry_base_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSettings {
    /// Maximum combined token count of question + both documents.
    pub token_limit: usize,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self { token_limit: 16_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            chunk_overlap: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub embedding_batch_size: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            embedding_batch_size: 512,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Upper bound on model turns in one tool-routed run.
    pub max_steps: usize,
    pub system_prefix: String,
    /// Must contain `{question}`.
    pub question_template: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: 8,
            system_prefix: DEFAULT_SYSTEM_PREFIX.to_string(),
            question_template: DEFAULT_QUESTION_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub embed_secs: u64,
    pub chain_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            embed_secs: 120,
            chain_secs: 300,
        }
    }
}

impl TimeoutSettings {
    pub fn embed(&self) -> Duration {
        Duration::from_secs(self.embed_secs)
    }

    pub fn chain(&self) -> Duration {
        Duration::from_secs(self.chain_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl AppConfig {
    /// Cross-field rules that the per-field checks in `validation` cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        RecursiveSplitter::new(self.chunking.chunk_size, self.chunking.chunk_overlap).map_err(
            |err| ConfigError::Invalid {
                path: "chunking".to_string(),
                reason: err.to_string(),
            },
        )?;

        if !self.agent.question_template.contains(QUESTION_PLACEHOLDER) {
            return Err(ConfigError::Invalid {
                path: "agent.question_template".to_string(),
                reason: format!("must contain {}", QUESTION_PLACEHOLDER),
            });
        }

        Ok(())
    }
}
