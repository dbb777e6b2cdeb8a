use serde::Deserialize;

use crate::domain::ingestion::ChunkerConfig;
use crate::infrastructure::ingestion::chunkers::ChunkerKind;
use crate::infrastructure::services::{ContextConfig, RetrievalConfig};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub chunking: ChunkerConfig,
    #[serde(default)]
    pub chunking_strategy: ChunkerKind,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub completion: CompletionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Which persistence backend the stores use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// In-process stores, suitable for development and tests
    #[default]
    InMemory,
    /// PostgreSQL with pgvector; requires `DATABASE_URL`
    Postgres,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Embedding service settings
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,
    /// Override for self-hosted or proxied endpoints
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> usize {
    1536
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
            base_url: None,
        }
    }
}

/// Completion service settings
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionSettings {
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Override for self-hosted or proxied endpoints
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_completion_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: default_completion_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            base_url: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.backend, StorageBackend::InMemory);
        assert_eq!(config.retrieval.default_limit, 5);
        assert_eq!(config.context.history_window, 10);
        assert_eq!(config.context.attachment_merge_cap, 8);
        assert_eq!(config.chunking.max_chunk_size, 1000);
        assert_eq!(config.chunking.overlap_size, 100);
        assert_eq!(config.chunking_strategy, ChunkerKind::SentenceOverlap);
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.completion.model, "gpt-4.1-mini");
    }

    #[test]
    fn test_deserialize_from_toml_fragment() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [storage]
                backend = "postgres"

                [retrieval]
                project_threshold = 0.4
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert!((config.retrieval.project_threshold - 0.4).abs() < 1e-6);
        // Untouched sections keep their defaults.
        assert_eq!(config.retrieval.default_limit, 5);
    }
}
