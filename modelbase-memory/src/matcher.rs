//! Driver-style filter evaluation for in-memory document matching.
//!
//! Filters are raw BSON documents in the MongoDB query dialect. Multiple
//! top-level fields combine with implicit AND; `$and`/`$or` compose
//! sub-filters; per-field operator documents support the comparison set
//! `$eq $ne $gt $gte $lt $lte $in $nin $exists`.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use modelbase_core::error::{ModelStoreError, ModelStoreResult};

/// Type-erased, comparable representation of BSON values.
///
/// Normalizes all numeric types to f64 so filters can compare an Int32
/// stored value against an Int64 operand and vice versa.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// Document identifier
    ObjectId(ObjectId),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr.iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>(),
            ),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Looks up a possibly dotted field path inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut current = document;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let value = current.get(segment)?;

        if segments.peek().is_none() {
            return Some(value);
        }

        current = value.as_document()?;
    }

    None
}

/// Evaluates a filter document against a stored document.
pub(crate) fn matches(filter: &Document, document: &Document) -> ModelStoreResult<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => {
                let mut all = true;
                for sub in sub_filters(condition)? {
                    if !matches(sub, document)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let mut any = false;
                for sub in sub_filters(condition)? {
                    if matches(sub, document)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            field => matches_field(document, field, condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

fn sub_filters(condition: &Bson) -> ModelStoreResult<impl Iterator<Item = &Document>> {
    let array = condition
        .as_array()
        .ok_or_else(|| ModelStoreError::UnsupportedOperator(
            "$and/$or expects an array of filters".to_string(),
        ))?;

    Ok(array.iter().filter_map(Bson::as_document))
}

fn matches_field(document: &Document, field: &str, condition: &Bson) -> ModelStoreResult<bool> {
    let value = lookup(document, field);

    match condition {
        // An all-$-keyed document is an operator set, anything else is a
        // literal equality match (including empty documents).
        Bson::Document(ops)
            if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) =>
        {
            for (op, operand) in ops {
                if !apply_operator(value, op, operand)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        literal => Ok(value.is_some_and(|v| Comparable::from(v) == Comparable::from(literal))),
    }
}

fn apply_operator(value: Option<&Bson>, op: &str, operand: &Bson) -> ModelStoreResult<bool> {
    match op {
        "$exists" => Ok(value.is_some() == operand.as_bool().unwrap_or(true)),
        "$eq" => Ok(value.is_some_and(|v| Comparable::from(v) == Comparable::from(operand))),
        "$ne" => Ok(value.is_none_or(|v| Comparable::from(v) != Comparable::from(operand))),
        "$gt" | "$gte" | "$lt" | "$lte" => {
            let Some(value) = value else {
                return Ok(false);
            };

            match Comparable::from(value).partial_cmp(&Comparable::from(operand)) {
                Some(ordering) => Ok(match op {
                    "$gt" => ordering == Ordering::Greater,
                    "$gte" => ordering != Ordering::Less,
                    "$lt" => ordering == Ordering::Less,
                    "$lte" => ordering != Ordering::Greater,
                    _ => unreachable!(),
                }),
                None => Ok(false),
            }
        }
        "$in" => {
            let candidates = operand
                .as_array()
                .ok_or_else(|| ModelStoreError::UnsupportedOperator(
                    "$in expects an array".to_string(),
                ))?;

            Ok(value.is_some_and(|v| {
                candidates
                    .iter()
                    .any(|c| Comparable::from(v) == Comparable::from(c))
            }))
        }
        "$nin" => {
            let candidates = operand
                .as_array()
                .ok_or_else(|| ModelStoreError::UnsupportedOperator(
                    "$nin expects an array".to_string(),
                ))?;

            Ok(value.is_none_or(|v| {
                !candidates
                    .iter()
                    .any(|c| Comparable::from(v) == Comparable::from(c))
            }))
        }
        other => Err(ModelStoreError::UnsupportedOperator(other.to_string())),
    }
}
