use crate::ports::Cache;
use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use std::hash::Hash;
use std::time::Duration;

pub struct MokaCacheAdapter<K, V> {
    inner: MokaCache<K, V>,
}

impl<K, V> MokaCacheAdapter<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl_seconds: u64, max_capacity: u64) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        Self { inner: cache }
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for MokaCacheAdapter<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value).await;
    }

    async fn remove(&self, key: &K) {
        self.inner.remove(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Project;

    #[tokio::test]
    async fn test_project_list_cache() {
        let cache = MokaCacheAdapter::<String, Vec<Project>>::new(300, 10);
        let key = "projects".to_string();
        let projects = vec![Project::new("Family", "#3b82f6")];

        cache.insert(key.clone(), projects.clone()).await;
        assert_eq!(cache.get(&key).await, Some(projects));

        cache.remove(&key).await;
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = MokaCacheAdapter::<String, u32>::new(1, 10);
        cache.insert("k".to_string(), 1).await;
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(cache.get(&"k".to_string()).await, None);
    }
}
