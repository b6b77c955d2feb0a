use crate::domain_port::*;
use crate::logger::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::time::Duration;

pub struct RedisRevocationStore {
    conn: ConnectionManager,
    prefix: String,
    timeout: Duration,
}

impl RedisRevocationStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, timeout: Duration) -> Self {
        RedisRevocationStore {
            conn,
            prefix: prefix.into(),
            timeout,
        }
    }

    fn key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.prefix, key)
        }
    }

    /// A call that outlives the timeout counts as the store being unavailable.
    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = RedisResult<T>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!(op, error = %e, "redis command failed");
                Err(StoreError::Unavailable(e.to_string()))
            }
            Err(_) => {
                error!(op, timeout_ms = self.timeout.as_millis() as u64, "redis command timed out");
                Err(StoreError::Unavailable(format!("{op} timed out")))
            }
        }
    }
}

#[async_trait::async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        // SET EX 0 is rejected by redis
        let ttl_secs = ttl_secs.max(1);
        self.bounded("set_ex", conn.set_ex::<_, _, ()>(&key, value, ttl_secs))
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        self.bounded("get", conn.get::<_, Option<String>>(&key))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        self.bounded("del", conn.del::<_, ()>(&key)).await
    }
}
