use std::sync::Arc;

use bson::{Document, doc, oid::ObjectId};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::Collections;
use crate::db::{DeleteResult, DocumentStore, InsertResult, UpdateResult};
use crate::error::StoreResult;
use crate::model::{BOOK_FIELDS, Shelf, StoredDocument, body_to_document};

/// Outcome of a shelf upsert: either the existing entry was re-marked or a
/// new one was inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ShelfUpsert {
    Updated(UpdateResult),
    Inserted(InsertResult),
}

/// Data access for the catalog collections.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn DocumentStore>,
    collections: Collections,
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-03-01T12:00:00.000Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn stored(docs: Vec<Document>) -> Vec<StoredDocument> {
    docs.into_iter().map(StoredDocument::from).collect()
}

/// Book ids arrive as path segments; anything that is not a valid ObjectId
/// cannot name a stored book.
fn parse_book_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>, collections: Collections) -> Self {
        Self { store, collections }
    }

    fn shelf_collection(&self, shelf: Shelf) -> &str {
        match shelf {
            Shelf::Wishlist => &self.collections.wishlist,
            Shelf::Reading => &self.collections.reading,
            Shelf::Finished => &self.collections.finished,
        }
    }

    pub async fn list_books(&self) -> StoreResult<Vec<StoredDocument>> {
        let docs = self.store.find(&self.collections.books, doc! {}).await?;
        Ok(stored(docs))
    }

    pub async fn get_book(&self, id: &str) -> StoreResult<Option<StoredDocument>> {
        let Some(oid) = parse_book_id(id) else {
            return Ok(None);
        };

        let doc = self
            .store
            .find_one(&self.collections.books, doc! { "_id": oid })
            .await?;
        Ok(doc.map(StoredDocument::from))
    }

    /// Stores the book body as given.
    pub async fn create_book(&self, body: &Map<String, Value>) -> StoreResult<InsertResult> {
        let doc = body_to_document(body)?;
        self.store.insert_one(&self.collections.books, doc).await
    }

    /// Stores the book body stamped with the current server time.
    pub async fn add_book(&self, body: &Map<String, Value>) -> StoreResult<InsertResult> {
        let mut doc = body_to_document(body)?;
        doc.insert("timestamp", timestamp_now());
        self.store.insert_one(&self.collections.books, doc).await
    }

    /// Returns `None` when no book was deleted.
    pub async fn delete_book(&self, id: &str) -> StoreResult<Option<DeleteResult>> {
        let Some(oid) = parse_book_id(id) else {
            return Ok(None);
        };

        let result = self
            .store
            .delete_one(&self.collections.books, doc! { "_id": oid })
            .await?;

        if result.deleted_count > 0 {
            Ok(Some(result))
        } else {
            Ok(None)
        }
    }

    /// Sets each of the book fields present in `data`, keeping the JSON type it
    /// arrived with. Other keys in `data` are ignored. Returns `None` only for
    /// an id that cannot exist; an unknown but well-formed id yields a result
    /// with `matched_count == 0`.
    pub async fn update_book(&self, id: &str, data: &Map<String, Value>) -> StoreResult<Option<UpdateResult>> {
        let Some(oid) = parse_book_id(id) else {
            return Ok(None);
        };
        let filter = doc! { "_id": oid };

        let fields: Map<String, Value> = BOOK_FIELDS
            .iter()
            .filter_map(|field| data.get(*field).map(|v| (field.to_string(), v.clone())))
            .collect();

        if fields.is_empty() {
            let matched = self
                .store
                .find_one(&self.collections.books, filter)
                .await?
                .is_some();
            return Ok(Some(UpdateResult {
                acknowledged: true,
                matched_count: matched as u64,
                modified_count: 0,
                upserted_id: None,
                upserted_count: 0,
            }));
        }

        let set = body_to_document(&fields)?;
        let result = self
            .store
            .update_one(&self.collections.books, filter, set)
            .await?;
        Ok(Some(result))
    }

    pub async fn create_review(&self, body: &Map<String, Value>) -> StoreResult<InsertResult> {
        let mut doc = body_to_document(body)?;
        doc.insert("timestamp", timestamp_now());
        self.store.insert_one(&self.collections.reviews, doc).await
    }

    pub async fn list_reviews(&self, book_id: &str) -> StoreResult<Vec<StoredDocument>> {
        let docs = self
            .store
            .find(&self.collections.reviews, doc! { "id": book_id })
            .await?;
        Ok(stored(docs))
    }

    pub async fn list_shelf(&self, shelf: Shelf, email: &str) -> StoreResult<Vec<StoredDocument>> {
        let docs = self
            .store
            .find(self.shelf_collection(shelf), doc! { "email": email })
            .await?;
        Ok(stored(docs))
    }

    /// Marks book `id` on `email`'s shelf. An entry matching both email and id
    /// is re-marked in place; otherwise a new entry is inserted holding the
    /// flag and every `extra` field of the request.
    pub async fn upsert_shelf(
        &self,
        shelf: Shelf,
        email: &str,
        id: &str,
        extra: &Map<String, Value>,
    ) -> StoreResult<ShelfUpsert> {
        let collection = self.shelf_collection(shelf);
        let key = doc! { "email": email, "id": id };

        if self.store.find_one(collection, key.clone()).await?.is_some() {
            tracing::debug!(shelf = shelf.as_str(), email, id, "updating shelf entry");
            let result = self
                .store
                .update_one(collection, key, shelf.marked(email, id))
                .await?;
            Ok(ShelfUpsert::Updated(result))
        } else {
            tracing::debug!(shelf = shelf.as_str(), email, id, "inserting shelf entry");
            let mut entry = shelf.marked(email, id);
            for (key, value) in body_to_document(extra)? {
                entry.insert(key, value);
            }
            entry.insert(shelf.flag_field(), true);
            let result = self.store.insert_one(collection, entry).await?;
            Ok(ShelfUpsert::Inserted(result))
        }
    }
}
