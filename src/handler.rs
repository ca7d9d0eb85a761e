use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::{Map, Value};
use tracing::info;

use crate::api::{ShelfRequest, UpdateBookRequest};
use crate::catalog::{Catalog, ShelfUpsert};
use crate::db::{DeleteResult, InsertResult, UpdateResult};
use crate::error::ApiError;
use crate::model::{Shelf, StoredDocument};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
}

pub const HEALTH_MESSAGE: &str = "Book Catalog backend is running";

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    HEALTH_MESSAGE
}

// ----------------------------------------------------------------------------
// Books
// ----------------------------------------------------------------------------

pub async fn get_books(State(state): State<AppState>) -> Result<Json<Vec<StoredDocument>>, ApiError> {
    let books = state.catalog.list_books().await?;
    info!(count = books.len(), "got books");
    Ok(Json(books))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredDocument>, ApiError> {
    match state.catalog.get_book(&id).await? {
        Some(book) => Ok(Json(book)),
        None => Err(ApiError::NotFound("Book not found")),
    }
}

pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<InsertResult>, ApiError> {
    let result = state.catalog.create_book(&payload).await?;
    info!(id = %result.inserted_id, "created book");
    Ok(Json(result))
}

pub async fn add_book(
    State(state): State<AppState>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<InsertResult>, ApiError> {
    let result = state.catalog.add_book(&payload).await?;
    info!(id = %result.inserted_id, "added book");
    Ok(Json(result))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    match state.catalog.delete_book(&id).await? {
        Some(result) => {
            info!(id = %id, "deleted book");
            Ok(Json(result))
        }
        None => Err(ApiError::NotFound("Can't delete book")),
    }
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBookRequest>,
) -> Result<Json<UpdateResult>, ApiError> {
    match state.catalog.update_book(&id, &payload.data).await? {
        Some(result) => {
            info!(id = %id, matched = result.matched_count, "updated book");
            Ok(Json(result))
        }
        None => Err(ApiError::NotFound("Book not found")),
    }
}

// ----------------------------------------------------------------------------
// Reviews
// ----------------------------------------------------------------------------

pub async fn create_review(
    State(state): State<AppState>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<InsertResult>, ApiError> {
    let result = state.catalog.create_review(&payload).await?;
    info!(id = %result.inserted_id, "posted review");
    Ok(Json(result))
}

pub async fn get_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<StoredDocument>>, ApiError> {
    Ok(Json(state.catalog.list_reviews(&id).await?))
}

// ----------------------------------------------------------------------------
// Shelves
// ----------------------------------------------------------------------------

async fn list_shelf(state: &AppState, shelf: Shelf, email: &str) -> Result<Json<Vec<StoredDocument>>, ApiError> {
    Ok(Json(state.catalog.list_shelf(shelf, email).await?))
}

async fn upsert_shelf(state: &AppState, shelf: Shelf, payload: ShelfRequest) -> Result<Json<ShelfUpsert>, ApiError> {
    let result = state
        .catalog
        .upsert_shelf(shelf, &payload.email, &payload.id, &payload.extra)
        .await
        .map_err(ApiError::Upsert)?;
    Ok(Json(result))
}

pub async fn get_wishlist(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<StoredDocument>>, ApiError> {
    list_shelf(&state, Shelf::Wishlist, &email).await
}

pub async fn get_reading(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<StoredDocument>>, ApiError> {
    list_shelf(&state, Shelf::Reading, &email).await
}

pub async fn get_finished(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<StoredDocument>>, ApiError> {
    list_shelf(&state, Shelf::Finished, &email).await
}

pub async fn upsert_wishlist(
    State(state): State<AppState>,
    Json(payload): Json<ShelfRequest>,
) -> Result<Json<ShelfUpsert>, ApiError> {
    upsert_shelf(&state, Shelf::Wishlist, payload).await
}

pub async fn upsert_reading(
    State(state): State<AppState>,
    Json(payload): Json<ShelfRequest>,
) -> Result<Json<ShelfUpsert>, ApiError> {
    upsert_shelf(&state, Shelf::Reading, payload).await
}

pub async fn upsert_finished(
    State(state): State<AppState>,
    Json(payload): Json<ShelfRequest>,
) -> Result<Json<ShelfUpsert>, ApiError> {
    upsert_shelf(&state, Shelf::Finished, payload).await
}
