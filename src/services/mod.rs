// Service exports
pub mod appwrite;
pub mod cache;
pub mod gemini;
pub mod memory;
pub mod postgres;

pub use appwrite::{AppwriteClient, AppwriteCollections, AppwriteError};
pub use cache::{CacheError, CacheKey, CacheManager};
pub use gemini::{GeminiClient, GeminiOptions};
pub use memory::{InMemoryBlockStore, InMemoryDirectory};
pub use postgres::{PostgresClient, PostgresError};
