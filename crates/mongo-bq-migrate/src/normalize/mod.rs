//! Record normalization: BSON documents into insert-ready rows.

use crate::error::{MigrateError, Result};
use mongodb::bson::{Bson, Document};
use serde_json::{Map, Value};

/// A document normalized into the destination wire representation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    /// Stable row identity, used as the deduplication key on insert.
    /// Hex form of the document's ObjectId.
    pub insert_id: String,

    /// The row payload. Same field set as the source document, with
    /// `_id` overwritten by its string form.
    pub payload: Map<String, Value>,
}

/// Normalize one document into a row.
///
/// Stateless per document. Fails if the `_id` field is absent or not
/// an ObjectId; well-formed input never hits either case, but both are
/// reported rather than panicking.
pub fn normalize(document: &Document) -> Result<NormalizedRow> {
    let insert_id = match document.get("_id") {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(other) => {
            return Err(MigrateError::normalize(format!(
                "_id is not an ObjectId (found {:?})",
                other.element_type()
            )))
        }
        None => return Err(MigrateError::normalize("document has no _id field")),
    };

    let mut payload = Map::with_capacity(document.len());
    for (name, value) in document {
        let normalized = if name == "_id" {
            Value::String(insert_id.clone())
        } else {
            normalize_value(value)
        };
        payload.insert(name.clone(), normalized);
    }

    Ok(NormalizedRow { insert_id, payload })
}

/// Convert one top-level field value into its wire form.
fn normalize_value(value: &Bson) -> Value {
    match value {
        // Datetimes become integer epoch seconds
        Bson::DateTime(dt) => Value::from(epoch_seconds(dt.timestamp_millis())),

        // Arrays and embedded documents are stored as JSON text
        Bson::Array(_) | Bson::Document(_) => Value::String(plain_json(value).to_string()),

        // Scalars pass through unchanged
        Bson::Double(_)
        | Bson::String(_)
        | Bson::Boolean(_)
        | Bson::Null
        | Bson::Int32(_)
        | Bson::Int64(_) => plain_json(value),

        // Every other BSON type is stored in its string form
        other => match plain_json(other) {
            Value::String(s) => Value::String(s),
            rendered => Value::String(rendered.to_string()),
        },
    }
}

/// Epoch seconds from epoch milliseconds, flooring (not rounding).
fn epoch_seconds(millis: i64) -> i64 {
    millis.div_euclid(1000)
}

/// Render a BSON value as plain JSON, without extended-JSON wrappers
/// for the common types: datetimes become RFC 3339 strings, ObjectIds
/// their hex form, numbers plain numbers.
fn plain_json(value: &Bson) -> Value {
    match value {
        Bson::Double(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Null => Value::Null,
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Array(items) => Value::Array(items.iter().map(plain_json).collect()),
        Bson::Document(document) => Value::Object(
            document
                .iter()
                .map(|(k, v)| (k.clone(), plain_json(v)))
                .collect(),
        ),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(formatted) => Value::String(formatted),
            Err(_) => Value::from(dt.timestamp_millis()),
        },
        other => other.clone().into_relaxed_extjson(),
    }
}
