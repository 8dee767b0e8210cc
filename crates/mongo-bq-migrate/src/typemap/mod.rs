//! Type mapping between sampled BSON values and BigQuery column types.

use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};
use std::fmt;

/// BigQuery column type for an inferred schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetType {
    String,
    Float,
    Boolean,
    Timestamp,
}

impl TargetType {
    /// The wire name BigQuery expects in a schema field definition.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::String => "STRING",
            TargetType::Float => "FLOAT",
            TargetType::Boolean => "BOOLEAN",
            TargetType::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a sampled BSON value to a BigQuery column type.
///
/// Total over the value domain; anything without a closer match
/// (including null, binary data and ObjectIds) falls back to STRING,
/// which is how the serialized form is stored.
pub fn infer(value: &Bson) -> TargetType {
    match value {
        // Arrays are serialized to JSON strings
        Bson::Array(_) => TargetType::String,

        // Datetimes become epoch-second timestamps
        Bson::DateTime(_) => TargetType::Timestamp,

        // No distinct integer type in the target schema
        Bson::Double(_) | Bson::Int32(_) | Bson::Int64(_) => TargetType::Float,

        Bson::Boolean(_) => TargetType::Boolean,

        Bson::String(_) => TargetType::String,

        // Embedded documents (and every other structured BSON type)
        // are stored in their serialized string form
        _ => TargetType::String,
    }
}
