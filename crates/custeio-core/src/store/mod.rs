pub mod json_file;
pub mod memory;
pub mod upsert;

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::CusteioError;

/// Body of a stored record: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// collection -> key -> document
pub type Collections = BTreeMap<String, BTreeMap<String, Document>>;

/// Field used to order collection listings.
pub const ORDER_FIELD: &str = "nome";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub key: String,
    pub data: Document,
}

impl StoredDocument {
    /// Decode the body into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CusteioError> {
        Ok(serde_json::from_value(serde_json::Value::Object(
            self.data.clone(),
        ))?)
    }
}

/// A merge-upsert of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOp {
    pub collection: String,
    pub key: String,
    pub data: Document,
}

/// Writes committed together: either all are applied or none are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a merge-upsert: fields in `data` overwrite, other fields of an
    /// existing document are kept, a new key creates the document.
    pub fn set_merge(&mut self, collection: &str, key: &str, data: Document) {
        self.ops.push(WriteOp {
            collection: collection.to_string(),
            key: key.to_string(),
            data,
        });
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Names of the collections this batch touches, without duplicates.
    pub fn collections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ops.iter().map(|op| op.collection.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Document database holding the `insumos`, `receitas` and `metadata`
/// collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Apply every write in `batch` atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<(), CusteioError>;

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, CusteioError>;

    /// All documents of a collection, ordered by `nome` then key.
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, CusteioError>;

    /// Change notifications for one collection.
    fn subscribe(&self, collection: &str) -> Subscription;

    /// Name of this store backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Apply a batch in place. Callers make this atomic by applying to a copy.
pub fn apply_batch(collections: &mut Collections, batch: &WriteBatch) {
    for op in batch.ops() {
        let doc = collections
            .entry(op.collection.clone())
            .or_default()
            .entry(op.key.clone())
            .or_default();
        for (field, value) in &op.data {
            doc.insert(field.clone(), value.clone());
        }
    }
}

/// Listing of one collection in display order.
pub fn ordered_listing(collections: &Collections, collection: &str) -> Vec<StoredDocument> {
    let mut docs: Vec<StoredDocument> = collections
        .get(collection)
        .map(|c| {
            c.iter()
                .map(|(key, data)| StoredDocument {
                    key: key.clone(),
                    data: data.clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    docs.sort_by(|a, b| order_name(a).cmp(order_name(b)).then_with(|| a.key.cmp(&b.key)));
    docs
}

fn order_name(doc: &StoredDocument) -> &str {
    doc.data
        .get(ORDER_FIELD)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
}

/// Receiver side of a collection watch.
///
/// Each notification only says "something changed"; readers rebuild their
/// view from a fresh listing.
pub struct Subscription {
    collection: String,
    receiver: watch::Receiver<u64>,
}

impl Subscription {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Wait for the next change. Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

/// Per-collection change counters shared by the store backends.
#[derive(Default)]
pub(crate) struct ChangeFeed {
    senders: Mutex<HashMap<String, watch::Sender<u64>>>,
}

impl ChangeFeed {
    pub(crate) fn subscribe(&self, collection: &str) -> Subscription {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        let sender = senders
            .entry(collection.to_string())
            .or_insert_with(|| watch::channel(0).0);
        Subscription {
            collection: collection.to_string(),
            receiver: sender.subscribe(),
        }
    }

    pub(crate) fn notify<'a>(&self, collections: impl IntoIterator<Item = &'a str>) {
        let senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        for name in collections {
            if let Some(sender) = senders.get(name) {
                sender.send_modify(|v| *v = v.wrapping_add(1));
            }
        }
    }
}

/// Serialize a record into a document body.
pub fn to_document<T: Serialize>(record: &T) -> Result<Document, CusteioError> {
    match serde_json::to_value(record)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(CusteioError::Persistence(format!(
            "record did not serialize to an object: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_apply_batch_merges_top_level_fields() {
        let mut collections = Collections::new();
        let mut first = WriteBatch::new();
        first.set_merge("insumos", "farinha", doc(json!({"nome": "Farinha", "preco": "4", "extra": 1})));
        apply_batch(&mut collections, &first);

        let mut second = WriteBatch::new();
        second.set_merge("insumos", "farinha", doc(json!({"preco": "5"})));
        apply_batch(&mut collections, &second);

        let stored = &collections["insumos"]["farinha"];
        assert_eq!(stored["nome"], "Farinha");
        assert_eq!(stored["preco"], "5");
        assert_eq!(stored["extra"], 1);
    }

    #[test]
    fn test_arrays_are_replaced() {
        let mut collections = Collections::new();
        let mut batch = WriteBatch::new();
        batch.set_merge("receitas", "bolo", doc(json!({"insumos": [1, 2, 3]})));
        batch.set_merge("receitas", "bolo", doc(json!({"insumos": [4]})));
        apply_batch(&mut collections, &batch);
        assert_eq!(collections["receitas"]["bolo"]["insumos"], json!([4]));
    }

    #[test]
    fn test_ordered_listing_by_name() {
        let mut collections = Collections::new();
        let mut batch = WriteBatch::new();
        batch.set_merge("insumos", "b", doc(json!({"nome": "Açúcar"})));
        batch.set_merge("insumos", "a", doc(json!({"nome": "Sal"})));
        batch.set_merge("insumos", "c", doc(json!({})));
        apply_batch(&mut collections, &batch);

        let keys: Vec<_> = ordered_listing(&collections, "insumos")
            .into_iter()
            .map(|d| d.key)
            .collect();
        assert_eq!(keys, vec!["c", "b", "a"]);
        assert!(ordered_listing(&collections, "receitas").is_empty());
    }

    #[test]
    fn test_batch_collections_dedup() {
        let mut batch = WriteBatch::new();
        batch.set_merge("receitas", "a", Document::new());
        batch.set_merge("insumos", "b", Document::new());
        batch.set_merge("receitas", "c", Document::new());
        assert_eq!(batch.collections(), vec!["insumos", "receitas"]);
        assert_eq!(batch.len(), 3);
    }
}
