use serde_json::Value;

use crate::clock::Clock;
use crate::error::CusteioError;
use crate::parsing::normalize::is_valid_key;
use crate::store::{Document, DocumentStore, WriteBatch};

/// Field stamped with the server write time on ingredient upserts.
pub const LAST_UPDATED_FIELD: &str = "ultimaAtualizacao";

/// Stages keyed records into a single batch and commits it.
pub struct UpsertCoordinator<'a> {
    store: &'a dyn DocumentStore,
    clock: &'a dyn Clock,
}

impl<'a> UpsertCoordinator<'a> {
    pub fn new(store: &'a dyn DocumentStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Merge-upsert every record with a valid key in one atomic commit.
    ///
    /// Returns how many records were written. Records with an empty or
    /// unnormalized key are left out of the batch and the count. When
    /// `stamp_field` is set every written record gets the clock's current
    /// time in that field.
    pub async fn upsert_all(
        &self,
        collection: &str,
        records: Vec<(String, Document)>,
        stamp_field: Option<&str>,
    ) -> Result<usize, CusteioError> {
        let stamp = stamp_field.map(|field| {
            (
                field.to_string(),
                Value::String(self.clock.now().to_rfc3339()),
            )
        });

        let mut batch = WriteBatch::new();
        for (key, mut data) in records {
            if !is_valid_key(&key) {
                tracing::warn!(collection, key = %key, "record with invalid key left out of batch");
                continue;
            }
            if let Some((field, value)) = &stamp {
                data.insert(field.clone(), value.clone());
            }
            batch.set_merge(collection, &key, data);
        }

        let count = batch.len();
        if count == 0 {
            return Ok(0);
        }
        tracing::debug!(collection, count, backend = self.store.backend_name(), "committing batch");
        self.store.commit(batch).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::memory::MemoryStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_keys_not_counted() {
        let store = MemoryStore::new();
        let clock = clock();
        let coordinator = UpsertCoordinator::new(&store, &clock);
        let written = coordinator
            .upsert_all(
                "insumos",
                vec![
                    ("sal".into(), doc(json!({"nome": "Sal"}))),
                    ("".into(), doc(json!({"nome": ""}))),
                    ("Sal ".into(), doc(json!({"nome": "Sal "}))),
                ],
                None,
            )
            .await
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(store.snapshot().await["insumos"].len(), 1);
    }

    #[tokio::test]
    async fn test_stamp_field_uses_clock() {
        let store = MemoryStore::new();
        let clock = clock();
        let coordinator = UpsertCoordinator::new(&store, &clock);
        coordinator
            .upsert_all(
                "insumos",
                vec![("sal".into(), doc(json!({"nome": "Sal"})))],
                Some(LAST_UPDATED_FIELD),
            )
            .await
            .unwrap();
        let sal = store.get("insumos", "sal").await.unwrap().unwrap();
        assert_eq!(sal[LAST_UPDATED_FIELD], "2024-03-01T12:00:00+00:00");
    }

    #[tokio::test]
    async fn test_empty_batch_skips_commit() {
        let store = MemoryStore::new();
        store.fail_commits(true);
        let clock = clock();
        let coordinator = UpsertCoordinator::new(&store, &clock);
        assert_eq!(
            coordinator.upsert_all("receitas", Vec::new(), None).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_commit_failure_propagates() {
        let store = MemoryStore::new();
        store.fail_commits(true);
        let clock = clock();
        let coordinator = UpsertCoordinator::new(&store, &clock);
        let result = coordinator
            .upsert_all("insumos", vec![("sal".into(), doc(json!({})))], None)
            .await;
        assert!(matches!(result, Err(CusteioError::Persistence(_))));
    }
}
