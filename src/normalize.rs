//! Response normalization across OData metadata verbosity formats.
//!
//! The service can return the same entity in several envelopes depending on
//! the `Accept` header:
//!
//! | Shape | Example |
//! |-------|---------|
//! | verbose collection | `{"d":{"results":[{...}]}}` |
//! | verbose entity | `{"d":{...}}` |
//! | minimal/no-metadata collection | `{"value":[{...}]}` or `[{...}]` |
//! | minimal/no-metadata entity | `{...}` |
//!
//! `d` and `value` are envelopes only when no other member (apart from
//! `odata.*` annotations) sits beside them. Shapes are tried in that order
//! and the first match wins. Canonical output
//! is compact JSON with key order preserved: an entity as its bare object, a
//! collection as a bare array. Normalizing canonical output again returns the
//! same bytes.

use serde_json::{Map, Value};

use crate::error::{NormalizeError, RemoteError};

/// A normalized response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Canonical bytes of a single entity object.
    Entity(Vec<u8>),
    /// Canonical bytes of each collection item, in original order.
    Collection(Vec<Vec<u8>>),
}

impl Normalized {
    /// The canonical payload: the entity object, or a JSON array of items.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Normalized::Entity(bytes) => bytes.clone(),
            Normalized::Collection(items) => join_items(items),
        }
    }
}

/// Detected payload envelope.
#[derive(Debug)]
enum Shape<'a> {
    VerboseCollection(&'a [Value]),
    VerboseEntity(&'a Map<String, Value>),
    Collection(&'a [Value]),
    Entity(&'a Map<String, Value>),
}

impl<'a> Shape<'a> {
    fn detect(value: &'a Value) -> Option<Self> {
        if let Value::Object(map) = value {
            if let Some(d) = sole_envelope(map, "d") {
                if let Some(results) = d.get("results").and_then(Value::as_array) {
                    return Some(Shape::VerboseCollection(results));
                }
                if let Some(d) = d.as_object() {
                    return Some(Shape::VerboseEntity(d));
                }
            }
            if let Some(items) = sole_envelope(map, "value").and_then(Value::as_array) {
                return Some(Shape::Collection(items));
            }
        }
        match value {
            Value::Array(items) => Some(Shape::Collection(items)),
            Value::Object(map) => Some(Shape::Entity(map)),
            _ => None,
        }
    }

    fn into_normalized(self) -> Result<Normalized, serde_json::Error> {
        match self {
            Shape::VerboseCollection(items) | Shape::Collection(items) => items
                .iter()
                .map(serde_json::to_vec)
                .collect::<Result<Vec<_>, _>>()
                .map(Normalized::Collection),
            Shape::VerboseEntity(map) | Shape::Entity(map) => {
                serde_json::to_vec(map).map(Normalized::Entity)
            }
        }
    }
}

/// The member `key` when every other member is an `odata.*` annotation.
///
/// Entities may carry their own `d` or `value` fields, so those names only
/// mark an envelope when nothing else sits beside them.
fn sole_envelope<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let member = map.get(key)?;
    map.keys()
        .all(|k| k == key || k.starts_with("odata.") || k.contains("@odata."))
        .then_some(member)
}

/// Normalize a payload of unknown kind.
///
/// # Errors
///
/// Returns `NormalizeError::InvalidJson` for unparsable input,
/// `NormalizeError::Remote` for an OData error envelope, and
/// `NormalizeError::UnrecognizedShape` for JSON scalars.
pub fn normalize(payload: &[u8]) -> Result<Normalized, NormalizeError> {
    let value = parse(payload)?;
    let shape = Shape::detect(&value).ok_or_else(|| NormalizeError::UnrecognizedShape {
        raw: payload.to_vec(),
        expected: "an entity object or a collection",
    })?;
    shape.into_normalized().map_err(|source| NormalizeError::InvalidJson {
        raw: payload.to_vec(),
        source,
    })
}

/// Normalize a payload expected to hold a single entity.
pub fn normalize_entity(payload: &[u8]) -> Result<Vec<u8>, NormalizeError> {
    match normalize(payload) {
        Ok(Normalized::Entity(bytes)) => Ok(bytes),
        Ok(Normalized::Collection(_)) | Err(NormalizeError::UnrecognizedShape { .. }) => {
            Err(NormalizeError::UnrecognizedShape {
                raw: payload.to_vec(),
                expected: "an entity object",
            })
        }
        Err(e) => Err(e),
    }
}

/// Normalize a payload expected to hold a collection.
///
/// Plain objects that carry no collection envelope are rejected rather than
/// treated as a single entity.
pub fn normalize_collection(payload: &[u8]) -> Result<Vec<Vec<u8>>, NormalizeError> {
    match normalize(payload) {
        Ok(Normalized::Collection(items)) => Ok(items),
        Ok(Normalized::Entity(_)) | Err(NormalizeError::UnrecognizedShape { .. }) => {
            Err(NormalizeError::UnrecognizedShape {
                raw: payload.to_vec(),
                expected: "a collection (d.results, value, or array)",
            })
        }
        Err(e) => Err(e),
    }
}

/// Join canonical item bytes into one JSON array.
pub(crate) fn join_items(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(items.iter().map(|i| i.len() + 1).sum::<usize>() + 2);
    out.push(b'[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        out.extend_from_slice(item);
    }
    out.push(b']');
    out
}

fn parse(payload: &[u8]) -> Result<Value, NormalizeError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|source| NormalizeError::InvalidJson {
            raw: payload.to_vec(),
            source,
        })?;

    if let Some(error) = odata_error(&value) {
        return Err(NormalizeError::Remote {
            raw: payload.to_vec(),
            error,
        });
    }
    Ok(value)
}

/// Decode an OData error envelope (`error` in verbose, `odata.error` in
/// minimal metadata) when it is the only member of the payload.
fn odata_error(value: &Value) -> Option<RemoteError> {
    let map = value.as_object().filter(|m| m.len() == 1)?;
    let body = map
        .get("error")
        .or_else(|| map.get("odata.error"))?
        .as_object()?;
    let code_field = body.get("code")?.as_str()?;

    let message = match body.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(m)) => m
            .get("value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    };

    // "-2147024809, System.ArgumentException"
    let (code, type_name) = match code_field.split_once(',') {
        Some((num, ty)) => match num.trim().parse::<i64>() {
            Ok(n) => (n, ty.trim().to_string()),
            Err(_) => (0, code_field.to_string()),
        },
        None => (0, code_field.to_string()),
    };

    Some(RemoteError {
        message,
        code,
        type_name,
        correlation_id: None,
        value: None,
    })
}
