//! Document shaping for the in-memory backend: sorting, projection and a
//! minimal aggregation pipeline.
//!
//! Supported stages: `$match`, `$sort`, `$skip`, `$limit`, `$count` and
//! `$project`. Anything else is reported as unsupported rather than
//! silently skipped.

use std::cmp::Ordering;

use bson::{Bson, Document, doc};

use modelbase_core::error::{ModelStoreError, ModelStoreResult};

use crate::matcher::{self, Comparable, lookup};

/// Sorts documents in place by a driver-style sort document
/// (field mapped to 1 for ascending, -1 for descending), applying the
/// keys in insertion order.
pub(crate) fn sort_documents(documents: &mut [Document], sort: &Document) {
    documents.sort_by(|a, b| {
        for (field, direction) in sort {
            let left = lookup(a, field)
                .map(Comparable::from)
                .unwrap_or(Comparable::Null);
            let right = lookup(b, field)
                .map(Comparable::from)
                .unwrap_or(Comparable::Null);

            let mut ordering = left
                .partial_cmp(&right)
                .unwrap_or(Ordering::Equal);
            if is_descending(direction) {
                ordering = ordering.reverse();
            }

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    });
}

/// Applies an include/exclude projection to a document.
///
/// Inclusion mode (any non-`_id` field mapped to a truthy value) keeps the
/// listed fields plus `_id` unless `_id` is explicitly excluded; exclusion
/// mode drops the listed fields.
pub(crate) fn project_document(document: &Document, projection: &Document) -> Document {
    let include_mode = projection
        .iter()
        .any(|(field, intent)| field != "_id" && is_truthy(intent));

    if include_mode {
        let mut projected = Document::new();

        if !projection
            .get("_id")
            .is_some_and(|intent| !is_truthy(intent))
        {
            if let Some(id) = document.get("_id") {
                projected.insert("_id", id.clone());
            }
        }

        for (field, intent) in projection {
            if field != "_id" && is_truthy(intent) {
                if let Some(value) = document.get(field) {
                    projected.insert(field.clone(), value.clone());
                }
            }
        }

        projected
    } else {
        let mut projected = document.clone();
        for (field, _) in projection {
            projected.remove(field);
        }
        projected
    }
}

fn is_descending(direction: &Bson) -> bool {
    match direction {
        Bson::Int32(v) => *v < 0,
        Bson::Int64(v) => *v < 0,
        Bson::Double(v) => *v < 0.0,
        _ => false,
    }
}

fn is_truthy(intent: &Bson) -> bool {
    match intent {
        Bson::Int32(v) => *v != 0,
        Bson::Int64(v) => *v != 0,
        Bson::Double(v) => *v != 0.0,
        Bson::Boolean(v) => *v,
        _ => false,
    }
}

/// Runs an aggregation pipeline over a snapshot of a collection.
pub(crate) fn run_pipeline(
    mut documents: Vec<Document>,
    pipeline: Vec<Document>,
) -> ModelStoreResult<Vec<Document>> {
    for stage in pipeline {
        let mut fields = stage.iter();
        let (name, spec) = match (fields.next(), fields.next()) {
            (Some(only), None) => only,
            _ => {
                return Err(ModelStoreError::UnsupportedOperator(
                    "aggregation stages must have exactly one operator".to_string(),
                ));
            }
        };

        documents = match name.as_str() {
            "$match" => {
                let filter = spec
                    .as_document()
                    .ok_or_else(|| stage_error("$match expects a filter document"))?;

                let mut matched = Vec::new();
                for document in documents {
                    if matcher::matches(filter, &document)? {
                        matched.push(document);
                    }
                }
                matched
            }
            "$sort" => {
                let sort = spec
                    .as_document()
                    .ok_or_else(|| stage_error("$sort expects a sort document"))?;

                sort_documents(&mut documents, sort);
                documents
            }
            "$skip" => {
                let count = stage_number(spec, "$skip")?;
                documents.split_off(count.min(documents.len()))
            }
            "$limit" => {
                let count = stage_number(spec, "$limit")?;
                documents.truncate(count);
                documents
            }
            "$count" => {
                let field = spec
                    .as_str()
                    .ok_or_else(|| stage_error("$count expects a field name"))?;

                vec![doc! { field: documents.len() as i64 }]
            }
            "$project" => {
                let projection = spec
                    .as_document()
                    .ok_or_else(|| stage_error("$project expects a projection document"))?;

                documents
                    .iter()
                    .map(|document| project_document(document, projection))
                    .collect()
            }
            other => return Err(ModelStoreError::UnsupportedOperator(other.to_string())),
        };
    }

    Ok(documents)
}

fn stage_number(spec: &Bson, stage: &str) -> ModelStoreResult<usize> {
    match spec {
        Bson::Int32(v) if *v >= 0 => Ok(*v as usize),
        Bson::Int64(v) if *v >= 0 => Ok(*v as usize),
        _ => Err(stage_error(&format!("{stage} expects a non-negative integer"))),
    }
}

fn stage_error(message: &str) -> ModelStoreError {
    ModelStoreError::UnsupportedOperator(message.to_string())
}
