const REFRESH_NAMESPACE: &str = "refresh";
const DENYLIST_NAMESPACE: &str = "denylist";

/// Value stored under a denylist key.
pub const DENYLIST_MARKER: &str = "true";

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// TTL-keyed key/value store shared by the refresh-token and denylist namespaces.
/// Each call must be atomic per key; nothing here spans keys.
#[async_trait::async_trait]
pub trait RevocationStore: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

pub fn refresh_key(email: &str) -> String {
    format!("{}:{}", REFRESH_NAMESPACE, email)
}

pub fn denylist_key(access_token: &str) -> String {
    format!("{}:{}", DENYLIST_NAMESPACE, access_token)
}
