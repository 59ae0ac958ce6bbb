use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::CusteioError;
use crate::store::{
    apply_batch, ordered_listing, ChangeFeed, Collections, Document, DocumentStore,
    StoredDocument, Subscription, WriteBatch,
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    collections: Collections,
}

/// Document store persisted as a single JSON file.
///
/// A commit writes the whole store to a temp file next to the target and
/// renames it into place, so a failed commit leaves the previous file intact.
/// File IO runs on tokio's blocking pool; commits are serialized by
/// `write_lock`.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    feed: ChangeFeed,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            feed: ChangeFeed::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole store off the async runtime.
    async fn load_blocking(&self) -> Result<Collections, CusteioError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load(&path))
            .await
            .map_err(|e| CusteioError::StoreRead(format!("read task failed: {e}")))?
    }
}

fn load(path: &Path) -> Result<Collections, CusteioError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let file: StoreFile = serde_json::from_slice(&bytes)
                .map_err(|e| CusteioError::StoreRead(format!("{}: {e}", path.display())))?;
            Ok(file.collections)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Collections::new()),
        Err(e) => Err(CusteioError::StoreRead(format!("{}: {e}", path.display()))),
    }
}

fn persist(path: &Path, collections: Collections) -> Result<(), CusteioError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file = StoreFile { collections };
    let json =
        serde_json::to_vec_pretty(&file).map_err(|e| CusteioError::Persistence(e.to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| CusteioError::Persistence(format!("temp file in {}: {e}", dir.display())))?;
    tmp.write_all(&json)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| CusteioError::Persistence(e.to_string()))?;
    tmp.persist(path)
        .map_err(|e| CusteioError::Persistence(format!("{}: {}", path.display(), e.error)))?;
    Ok(())
}

/// Read, merge and rewrite the file. Runs on a blocking thread.
fn commit_file(path: &Path, batch: &WriteBatch) -> Result<(), CusteioError> {
    let mut collections = load(path).map_err(|e| CusteioError::Persistence(e.to_string()))?;
    apply_batch(&mut collections, batch);
    persist(path, collections)
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn commit(&self, batch: WriteBatch) -> Result<(), CusteioError> {
        let touched: Vec<String> = batch.collections().into_iter().map(String::from).collect();
        {
            let _guard = self.write_lock.lock().await;
            let path = self.path.clone();
            tokio::task::spawn_blocking(move || commit_file(&path, &batch))
                .await
                .map_err(|e| CusteioError::Persistence(format!("write task failed: {e}")))??;
        }
        self.feed.notify(touched.iter().map(String::as_str));
        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, CusteioError> {
        let mut collections = self.load_blocking().await?;
        Ok(collections
            .get_mut(collection)
            .and_then(|c| c.remove(key)))
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, CusteioError> {
        Ok(ordered_listing(&self.load_blocking().await?, collection))
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        self.feed.subscribe(collection)
    }

    fn backend_name(&self) -> &str {
        "json-file"
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
    async fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));
        assert!(store.list("insumos").await.unwrap().is_empty());
        assert!(store.get("insumos", "sal").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        {
            let store = JsonFileStore::new(&path);
            let mut batch = WriteBatch::new();
            batch.set_merge("insumos", "sal", doc(json!({"nome": "Sal", "preco": "2"})));
            batch.set_merge("receitas", "bolo", doc(json!({"nome": "Bolo"})));
            store.commit(batch).await.unwrap();
        }

        let reopened = JsonFileStore::new(&path);
        let sal = reopened.get("insumos", "sal").await.unwrap().unwrap();
        assert_eq!(sal["preco"], "2");
        assert_eq!(reopened.list("receitas").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_commit_and_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = JsonFileStore::new(&path);
        let mut batch = WriteBatch::new();
        batch.set_merge("insumos", "sal", doc(json!({"nome": "Sal"})));
        assert!(matches!(
            store.commit(batch).await,
            Err(CusteioError::Persistence(_))
        ));
        assert_eq!(std::fs::read(&path).unwrap(), b"{not json");
        assert!(matches!(
            store.list("insumos").await,
            Err(CusteioError::StoreRead(_))
        ));
    }

    #[tokio::test]
    async fn test_merge_preserves_fields_across_commits() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));

        let mut first = WriteBatch::new();
        first.set_merge("insumos", "sal", doc(json!({"nome": "Sal", "fornecedor": "X"})));
        store.commit(first).await.unwrap();

        let mut second = WriteBatch::new();
        second.set_merge("insumos", "sal", doc(json!({"preco": "3"})));
        store.commit(second).await.unwrap();

        let sal = store.get("insumos", "sal").await.unwrap().unwrap();
        assert_eq!(sal["fornecedor"], "X");
        assert_eq!(sal["preco"], "3");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_commits_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(JsonFileStore::new(dir.path().join("store.json")));
        let mut sub = store.subscribe("insumos");

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..8 {
            let store = std::sync::Arc::clone(&store);
            tasks.spawn(async move {
                let mut batch = WriteBatch::new();
                let key = format!("item-{i}");
                batch.set_merge("insumos", &key, doc(json!({"nome": key.clone()})));
                store.commit(batch).await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        assert_eq!(store.list("insumos").await.unwrap().len(), 8);
        assert!(sub.changed().await);
    }
}
