mod app_config;

pub use app_config::{
    AppConfig, CompletionSettings, EmbeddingSettings, LogFormat, LoggingConfig, StorageBackend,
    StorageConfig,
};
