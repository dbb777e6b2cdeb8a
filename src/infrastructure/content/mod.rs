//! Content version repository implementations

mod in_memory;
mod postgres;

pub use in_memory::InMemoryContentVersionRepository;
pub use postgres::PostgresContentVersionRepository;
