use bson::{Bson, Document, doc, ser::serialize_to_bson};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::{StoreError, StoreResult};

/// Fields `PATCH /books/:id` copies from its `data` object into the stored book.
pub const BOOK_FIELDS: [&str; 6] = ["title", "author", "genre", "publicationYear", "image", "summary"];

/// A document as it sits in the store. Bodies are stored without a schema,
/// so reads hand back whatever was written, with `_id` as a hex string.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument(pub Document);

impl StoredDocument {
    pub fn document(&self) -> &Document {
        &self.0
    }

    pub fn into_inner(self) -> Document {
        self.0
    }
}

impl From<Document> for StoredDocument {
    fn from(doc: Document) -> Self {
        StoredDocument(doc)
    }
}

impl Serialize for StoredDocument {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        document_to_json(&self.0).serialize(s)
    }
}

fn document_to_json(doc: &Document) -> Value {
    Value::Object(
        doc.iter()
            .map(|(key, value)| (key.clone(), bson_to_json(value)))
            .collect::<Map<String, Value>>(),
    )
}

fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(n) => Value::from(*n),
        Bson::Int64(n) => Value::from(*n),
        Bson::Double(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Bson::Null => Value::Null,
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Value::from(dt.timestamp_millis()),
        },
        other => Value::String(other.to_string()),
    }
}

/// Converts a request body into a storable document. A client-supplied `_id`
/// is dropped; the store assigns its own.
pub fn body_to_document(body: &Map<String, Value>) -> StoreResult<Document> {
    match serialize_to_bson(body)? {
        Bson::Document(mut doc) => {
            doc.remove("_id");
            Ok(doc)
        }
        other => Err(StoreError::InvalidDocument(format!(
            "expected a document, got {:?}",
            other.element_type()
        ))),
    }
}

/// Per-user book lists. Each lives in its own collection and marks its
/// entries with a boolean field named after the shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shelf {
    Wishlist,
    Reading,
    Finished,
}

impl Shelf {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shelf::Wishlist => "wishlist",
            Shelf::Reading => "reading",
            Shelf::Finished => "finished",
        }
    }

    pub fn flag_field(&self) -> &'static str {
        self.as_str()
    }

    /// `{email, id, <flag>: true}`, written over an existing entry.
    pub fn marked(&self, email: &str, id: &str) -> Document {
        let mut doc = doc! { "email": email, "id": id };
        doc.insert(self.flag_field(), true);
        doc
    }
}
