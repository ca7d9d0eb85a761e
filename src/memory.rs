//! In-process document store.
//!
//! Keeps every collection as a vector of documents behind an async
//! read-write lock, so reads return documents in insertion order the way a
//! fresh MongoDB collection does. Clones share the same data.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use tokio::sync::RwLock;

use crate::db::{DeleteResult, DocumentStore, InsertResult, UpdateResult};
use crate::error::{StoreError, StoreResult};

type CollectionMap = HashMap<String, Vec<Document>>;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: Arc<RwLock<CollectionMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(document: &Document, filter: &Document) -> bool {
        filter
            .iter()
            .all(|(key, value)| document.get(key) == Some(value))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, filter: Document) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| Self::matches(doc, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| Self::matches(doc, &filter)))
            .cloned())
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> StoreResult<InsertResult> {
        let inserted_id = match document.get("_id").cloned() {
            Some(id) => id
                .as_object_id()
                .ok_or_else(|| StoreError::InvalidDocument("_id must be an ObjectId".into()))?,
            None => {
                let id = ObjectId::new();
                document.insert("_id", id);
                id
            }
        };

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|doc| doc.get_object_id("_id").ok() == Some(inserted_id)) {
            return Err(StoreError::Backend(format!(
                "duplicate key {} in collection {}",
                inserted_id, collection
            )));
        }
        docs.push(document);

        Ok(InsertResult {
            acknowledged: true,
            inserted_id,
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> StoreResult<UpdateResult> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| Self::matches(doc, &filter)));

        let Some(doc) = target else {
            return Ok(UpdateResult {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_id: None,
                upserted_count: 0,
            });
        };

        let mut modified = false;
        for (key, value) in set {
            if doc.get(&key) != Some(&value) {
                doc.insert(key, value);
                modified = true;
            }
        }

        Ok(UpdateResult {
            acknowledged: true,
            matched_count: 1,
            modified_count: modified as u64,
            upserted_id: None,
            upserted_count: 0,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<DeleteResult> {
        let mut collections = self.collections.write().await;
        let deleted_count = match collections.get_mut(collection) {
            Some(docs) => match docs.iter().position(|doc| Self::matches(doc, &filter)) {
                Some(index) => {
                    docs.remove(index);
                    1
                }
                None => 0,
            },
            None => 0,
        };

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count,
        })
    }

    async fn shutdown(&self) -> StoreResult<()> {
        Ok(())
    }
}
