//! Schema inference over a snapshot of schema-less documents.

use crate::error::{MigrateError, Result};
use crate::typemap::{self, TargetType};
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One column of the inferred destination schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field name, unique across the document set.
    pub name: String,

    /// Column type chosen from the first sampled value.
    #[serde(rename = "type")]
    pub field_type: TargetType,
}

/// Derive an ordered column schema from a document snapshot.
///
/// Field order is first-seen order across the input sequence, so the
/// result is deterministic for a given snapshot. The type of each
/// column comes from the first document that contains the field; later
/// documents with conflicting types for the same field do not widen or
/// reconcile it.
pub fn infer_schema(documents: &[Document]) -> Result<Vec<SchemaField>> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    for document in documents {
        for name in document.keys() {
            if seen.insert(name.clone()) {
                names.push(name.clone());
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let sample = documents
                .iter()
                .find_map(|document| document.get(&name))
                .ok_or_else(|| {
                    MigrateError::SchemaInference(format!("no sample value for field '{name}'"))
                })?;
            Ok(SchemaField {
                field_type: typemap::infer(sample),
                name,
            })
        })
        .collect()
}
