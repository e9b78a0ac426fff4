//! Redis cache module
//!
//! Provides the Redis client used by the Redis session store.

pub mod redis_client;

pub use redis_client::RedisClient;
