use bson::oid::ObjectId;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(msg: &str) -> Self {
        MessageResponse {
            message: msg.to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: &str) -> Self {
        ErrorResponse {
            error: msg.to_owned(),
        }
    }
}

/// Body of `PATCH /books/:id`. The changed fields are nested under `data`.
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub data: Map<String, Value>,
}

/// Body of the shelf upsert routes (`PATCH /wishlist`, `/reading`, `/finished`).
/// Anything besides `email` and `id`, such as book details for rendering the
/// shelf, is kept in `extra` and stored with a new entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ShelfRequest {
    pub email: String,
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Renders an `ObjectId` as its 24 character hex string, the way the
/// document ids show up to API clients.
pub fn serialize_object_id<S: Serializer>(id: &ObjectId, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&id.to_hex())
}

pub fn serialize_optional_object_id<S: Serializer>(
    id: &Option<ObjectId>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match id {
        Some(id) => s.serialize_str(&id.to_hex()),
        None => s.serialize_none(),
    }
}
