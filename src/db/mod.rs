pub mod documents;
pub mod redis;

pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use self::redis::RedisDocumentStore;
pub use documents::{DocumentStore, InMemoryDocumentStore};
