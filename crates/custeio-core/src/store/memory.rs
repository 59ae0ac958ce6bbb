use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CusteioError;
use crate::store::{
    apply_batch, ordered_listing, ChangeFeed, Collections, Document, DocumentStore,
    StoredDocument, Subscription, WriteBatch,
};

/// In-process document store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    feed: ChangeFeed,
    fail_commits: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collections(collections: Collections) -> Self {
        Self {
            collections: RwLock::new(collections),
            ..Self::default()
        }
    }

    /// Make every following commit fail without applying anything.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> Collections {
        self.collections.read().await.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn commit(&self, batch: WriteBatch) -> Result<(), CusteioError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(CusteioError::Persistence("store unavailable".into()));
        }
        {
            let mut guard = self.collections.write().await;
            let mut next = guard.clone();
            apply_batch(&mut next, &batch);
            *guard = next;
        }
        self.feed.notify(batch.collections());
        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, CusteioError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|c| c.get(key))
            .cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, CusteioError> {
        Ok(ordered_listing(&*self.collections.read().await, collection))
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        self.feed.subscribe(collection)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_commit_then_get() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.set_merge("insumos", "sal", doc(json!({"nome": "Sal"})));
        store.commit(batch).await.unwrap();

        let got = store.get("insumos", "sal").await.unwrap().unwrap();
        assert_eq!(got["nome"], "Sal");
        assert!(store.get("insumos", "nada").await.unwrap().is_none());
        assert!(store.get("receitas", "sal").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_commit_applies_nothing() {
        let store = MemoryStore::new();
        store.fail_commits(true);
        let mut batch = WriteBatch::new();
        batch.set_merge("insumos", "sal", doc(json!({"nome": "Sal"})));
        batch.set_merge("insumos", "ovos", doc(json!({"nome": "Ovos"})));
        assert!(matches!(
            store.commit(batch).await,
            Err(CusteioError::Persistence(_))
        ));
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_subscription_notified_on_commit() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("insumos");
        let mut other = store.subscribe("receitas");

        let mut batch = WriteBatch::new();
        batch.set_merge("insumos", "sal", doc(json!({"nome": "Sal"})));
        store.commit(batch).await.unwrap();

        assert!(sub.changed().await);
        assert_eq!(sub.collection(), "insumos");
        assert!(!other.receiver.has_changed().unwrap());
    }
}
