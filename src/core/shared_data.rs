//! State shared by every hook invocation of one logical request.
use std::{fmt, sync::Arc};

use scc::{HashMap, hash_map::Entry};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::core::error::{InterceptorError, InterceptorResult};

/// Handle to the per-request shared map.
///
/// Clones point at the same map, so a value inserted by a `before_request`
/// hook is visible to every later hook of the same request, in both phases.
#[derive(Clone, Default)]
pub struct SharedData {
    entries: Arc<HashMap<String, Value>>,
}

impl SharedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub async fn insert<T: Serialize>(&self, key: impl Into<String>, value: T) -> InterceptorResult<()> {
        let value = serde_json::to_value(value).map_err(InterceptorError::other)?;
        self.insert_value(key, value).await;
        Ok(())
    }

    /// Store a raw JSON value under `key`, replacing any previous value.
    ///
    /// The replacement happens under the entry lock: concurrent readers see
    /// either the old or the new value, never a missing key.
    pub async fn insert_value(&self, key: impl Into<String>, value: Value) {
        match self.entries.entry_async(key.into()).await {
            Entry::Occupied(mut occupied) => {
                *occupied.get_mut() = value;
            }
            Entry::Vacant(vacant) => {
                vacant.insert_entry(value);
            }
        }
    }

    /// Fetch and deserialize the value stored under `key`.
    ///
    /// Returns `None` when the key is missing or holds a value of another shape.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key).await?;
        serde_json::from_value(value).ok()
    }

    pub async fn get_value(&self, key: &str) -> Option<Value> {
        self.entries
            .get_async(key)
            .await
            .map(|entry| entry.get().clone())
    }

    pub async fn remove(&self, key: &str) -> Option<Value> {
        self.entries.remove_async(key).await.map(|(_, value)| value)
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        self.entries.get_async(key).await.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when both handles refer to the same underlying map.
    pub fn ptr_eq(&self, other: &SharedData) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl fmt::Debug for SharedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedData")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_and_replace() {
        let data = SharedData::new();
        assert!(data.is_empty());

        data.insert("token", "abc").await.unwrap();
        assert_eq!(data.get::<String>("token").await.as_deref(), Some("abc"));

        data.insert("token", "def").await.unwrap();
        assert_eq!(data.get::<String>("token").await.as_deref(), Some("def"));
        assert_eq!(data.len(), 1);

        // Wrong shape reads as missing
        assert_eq!(data.get::<u64>("token").await, None);
        assert_eq!(data.get::<String>("missing").await, None);
    }

    #[tokio::test]
    async fn test_clones_share_the_same_map() {
        let data = SharedData::new();
        let other = data.clone();
        other.insert("started_at", 42_i64).await.unwrap();

        assert!(data.ptr_eq(&other));
        assert_eq!(data.get::<i64>("started_at").await, Some(42));
        assert!(data.contains_key("started_at").await);

        assert_eq!(data.remove("started_at").await, Some(Value::from(42)));
        assert!(!other.contains_key("started_at").await);
        assert!(!data.ptr_eq(&SharedData::new()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_replacing_a_value_never_hides_the_key() {
        let data = SharedData::new();
        data.insert("token", 0_i64).await.unwrap();

        let writer = {
            let data = data.clone();
            tokio::spawn(async move {
                for i in 1..=20_000_i64 {
                    data.insert("token", i).await.unwrap();
                }
            })
        };
        let reader = {
            let data = data.clone();
            tokio::spawn(async move {
                let mut misses = 0;
                for _ in 0..20_000 {
                    if data.get::<i64>("token").await.is_none() {
                        misses += 1;
                    }
                }
                misses
            })
        };

        writer.await.unwrap();
        assert_eq!(reader.await.unwrap(), 0);
        assert_eq!(data.get::<i64>("token").await, Some(20_000));
        assert_eq!(data.len(), 1);
    }
}
