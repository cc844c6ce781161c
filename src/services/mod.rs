// Service exports
pub mod cache;
pub mod llm;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::CachedCatalog;
pub use llm::{OpenAiClient, ResponseFormat, ServiceError, TextGenerationClient};
pub use memory::MemoryStore;
pub use postgres::PostgresClient;
pub use store::{CatalogStore, ProfileStore, StoreError, TranscriptStore};
