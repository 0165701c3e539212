use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::Category;

/// Process-wide category cache.
///
/// Populated lazily on first successful load and never invalidated while the
/// process runs. No lock is held across the load, so two requests racing on
/// an empty cache both load and the last write wins; categories are static
/// reference data, so either result is acceptable. A failed load leaves the
/// cache empty.
#[derive(Default)]
pub struct CategoryCache {
    slot: RwLock<Option<Arc<Vec<Category>>>>,
}

impl CategoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached categories, loading them with `load` if the cache is empty
    pub async fn get_or_load<F, Fut, E>(&self, load: F) -> Result<Arc<Vec<Category>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Category>, E>>,
    {
        if let Some(cached) = self.slot.read().await.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let loaded = Arc::new(load().await?);
        *self.slot.write().await = Some(Arc::clone(&loaded));
        tracing::info!("Category cache populated ({} entries)", loaded.len());

        Ok(loaded)
    }

    /// Current contents without triggering a load
    pub async fn peek(&self) -> Option<Arc<Vec<Category>>> {
        self.slot.read().await.clone()
    }

    /// Drop the cached value
    pub async fn reset(&self) {
        *self.slot.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn category(id: &str) -> Category {
        Category {
            id: id.to_string(),
            title: format!("Category {}", id),
            upload_by: String::new(),
        }
    }

    #[tokio::test]
    async fn test_loads_once() {
        let cache = CategoryCache::new();
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let result: Result<_, ()> = cache
                .get_or_load(|| async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![category("1")])
                })
                .await;
            assert_eq!(result.unwrap().len(), 1);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = CategoryCache::new();

        let failed: Result<_, &str> = cache.get_or_load(|| async { Err("offline") }).await;
        assert!(failed.is_err());
        assert!(cache.peek().await.is_none());

        let ok: Result<_, &str> = cache
            .get_or_load(|| async { Ok(vec![category("7")]) })
            .await;
        assert_eq!(ok.unwrap()[0].id, "7");
    }

    #[tokio::test]
    async fn test_reset_forces_reload() {
        let cache = CategoryCache::new();
        let _: Result<_, ()> = cache.get_or_load(|| async { Ok(vec![category("1")]) }).await;

        cache.reset().await;
        assert!(cache.peek().await.is_none());

        let reloaded: Result<_, ()> = cache
            .get_or_load(|| async { Ok(vec![category("2"), category("3")]) })
            .await;
        assert_eq!(reloaded.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_racing_loads_last_write_wins() {
        let cache = Arc::new(CategoryCache::new());
        let (first_tx, first_rx) = tokio::sync::oneshot::channel::<()>();

        let slow = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                let _: Result<_, ()> = cache
                    .get_or_load(|| async move {
                        let _ = first_rx.await;
                        Ok(vec![category("slow")])
                    })
                    .await;
            })
        };
        tokio::task::yield_now().await;

        let fast: Result<_, ()> = cache
            .get_or_load(|| async { Ok(vec![category("fast")]) })
            .await;
        assert_eq!(fast.unwrap()[0].id, "fast");

        let _ = first_tx.send(());
        slow.await.unwrap();

        assert_eq!(cache.peek().await.unwrap()[0].id, "slow");
    }
}
