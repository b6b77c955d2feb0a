use crate::domain_port::*;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local store. Expired entries are dropped when read, and writes
/// sweep the whole map at most once per `SWEEP_INTERVAL`.
pub struct MemoryRevocationStore {
    entries: DashMap<String, Entry>,
    started: Instant,
    // millis since `started`
    next_sweep: AtomicU64,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        MemoryRevocationStore {
            entries: DashMap::new(),
            started: Instant::now(),
            next_sweep: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tokens are rarely presented again once expired, so their entries have
    /// to be collected without a read.
    fn sweep_expired(&self, now: Instant) {
        let now_ms = now.duration_since(self.started).as_millis() as u64;
        let due = self.next_sweep.load(Ordering::Relaxed);
        if now_ms < due {
            return;
        }
        let next = now_ms + SWEEP_INTERVAL.as_millis() as u64;
        if self
            .next_sweep
            .compare_exchange(due, next, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            // another writer is sweeping
            return;
        }
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Time left before `key` expires, if it is still live.
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .and_then(|entry| entry.expires_at.checked_duration_since(now))
            .filter(|left| !left.is_zero())
    }
}

impl Default for MemoryRevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn put(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let now = Instant::now();
        self.sweep_expired(now);
        let entry = Entry {
            value: value.to_string(),
            expires_at: now + Duration::from_secs(ttl_secs),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        // the Ref must be gone before remove_if takes the shard lock
        let found = self
            .entries
            .get(key)
            .map(|entry| (entry.value.clone(), entry.expires_at));

        match found {
            Some((value, expires_at)) if expires_at > now => Ok(Some(value)),
            Some(_) => {
                self.entries
                    .remove_if(key, |_, entry| entry.expires_at <= now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryRevocationStore::new();
        store.put("refresh:a@b.com", "tok", 60).await.unwrap();
        assert_eq!(
            store.get("refresh:a@b.com").await.unwrap().as_deref(),
            Some("tok")
        );

        store.put("refresh:a@b.com", "tok2", 60).await.unwrap();
        assert_eq!(
            store.get("refresh:a@b.com").await.unwrap().as_deref(),
            Some("tok2")
        );

        store.delete("refresh:a@b.com").await.unwrap();
        assert_eq!(store.get("refresh:a@b.com").await.unwrap(), None);
        store.delete("refresh:a@b.com").await.unwrap();
    }

    #[tokio::test]
    async fn entries_expire_on_their_own() {
        let store = MemoryRevocationStore::new();
        store.put("denylist:t", DENYLIST_MARKER, 1).await.unwrap();

        let left = store.remaining_ttl("denylist:t").unwrap();
        assert!(left <= Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(store.get("denylist:t").await.unwrap(), None);
        assert_eq!(store.remaining_ttl("denylist:t"), None);
    }

    #[tokio::test]
    async fn writes_collect_entries_nobody_reads_again() {
        let store = MemoryRevocationStore::new();
        for i in 0..1000 {
            store
                .put(&format!("denylist:token-{i}"), DENYLIST_MARKER, 1)
                .await
                .unwrap();
        }
        assert_eq!(store.len(), 1000);

        tokio::time::sleep(Duration::from_millis(1200)).await;
        store.put("denylist:fresh", DENYLIST_MARKER, 60).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get("denylist:fresh").await.unwrap().as_deref(),
            Some(DENYLIST_MARKER)
        );
    }
}
