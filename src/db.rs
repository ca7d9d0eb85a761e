use std::sync::Arc;

use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use futures_util::TryStreamExt;
use mongodb::{
    Client, Collection,
    options::{ClientOptions, ServerApi, ServerApiVersion},
};
use serde::Serialize;

use crate::api::{serialize_object_id, serialize_optional_object_id};
use crate::config::{Backend, Config};
use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    #[serde(serialize_with = "serialize_object_id")]
    pub inserted_id: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    #[serde(serialize_with = "serialize_optional_object_id")]
    pub upserted_id: Option<ObjectId>,
    pub upserted_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// A document database addressed by collection name.
///
/// Filters are plain equality matches: a document matches when every key of
/// the filter is present with an equal value. `update_one` applies `set` with
/// `$set` semantics to the first matching document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: &str, filter: Document) -> StoreResult<Vec<Document>>;

    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>>;

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<InsertResult>;

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> StoreResult<UpdateResult>;

    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<DeleteResult>;

    async fn shutdown(&self) -> StoreResult<()>;
}

/// Opens the backend selected in the config. Called once at startup; the
/// handle is shared by every request.
pub async fn connect(cfg: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match cfg.app.backend {
        Backend::Mongodb => {
            let store = MongoStore::connect(cfg.app.get_database_url(), cfg.app.get_database()).await?;
            Ok(Arc::new(store))
        }
        Backend::Memory => {
            tracing::warn!("[db] running with the in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    database: String,
}

impl MongoStore {
    pub async fn connect(url: &str, database: &str) -> StoreResult<Self> {
        if url.is_empty() {
            return Err(StoreError::Backend("database url is empty".into()));
        }

        let mut options = ClientOptions::parse(url).await?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = Client::with_options(options)?;
        client.database(database).run_command(doc! { "ping": 1 }).await?;
        tracing::info!(database, "[db] connected to mongodb");

        Ok(MongoStore {
            client,
            database: database.to_string(),
        })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.client.database(&self.database).collection(name)
    }
}

fn object_id(id: &Bson) -> StoreResult<ObjectId> {
    id.as_object_id()
        .ok_or_else(|| StoreError::InvalidDocument(format!("expected an ObjectId, got {}", id)))
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(&self, collection: &str, filter: Document) -> StoreResult<Vec<Document>> {
        Ok(self
            .collection(collection)
            .find(filter)
            .await?
            .try_collect::<Vec<Document>>()
            .await?)
    }

    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>> {
        Ok(self.collection(collection).find_one(filter).await?)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<InsertResult> {
        let result = self.collection(collection).insert_one(document).await?;

        Ok(InsertResult {
            acknowledged: true,
            inserted_id: object_id(&result.inserted_id)?,
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        set: Document,
    ) -> StoreResult<UpdateResult> {
        let result = self
            .collection(collection)
            .update_one(filter, doc! { "$set": set })
            .await?;

        let upserted_id = result.upserted_id.as_ref().map(object_id).transpose()?;
        Ok(UpdateResult {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: upserted_id.is_some() as u64,
            upserted_id,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<DeleteResult> {
        let result = self.collection(collection).delete_one(filter).await?;

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    async fn shutdown(&self) -> StoreResult<()> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}
