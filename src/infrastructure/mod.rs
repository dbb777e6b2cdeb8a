//! Infrastructure layer: trait implementations and orchestrating services

pub mod chat;
pub mod completion;
pub mod content;
pub mod embedding;
pub mod http_client;
pub mod ingestion;
pub mod knowledge;
pub mod logging;
pub mod schema;
pub mod services;
