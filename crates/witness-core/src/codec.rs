//! Conversion between [`DataWrapper`]s and stored [`Document`]s.
//!
//! Encoding and decoding mirror each other for every supported value, so a
//! wrapper survives a round trip unchanged. Values the document model cannot
//! hold, such as lists nested directly in lists, are dropped with a warning.

use tracing::warn;
use witness_proto::{DataKey, DataValue, DataWrapper};

use crate::document::{Document, Value};

/// Encode a wrapper as a document.
pub fn to_document(wrapper: &DataWrapper) -> Document {
    encode_wrapper(wrapper, None)
}

/// Decode a document into a wrapper.
pub fn from_document(document: &Document) -> DataWrapper {
    decode_document(document, None)
}

/// Encode a single scalar or wrapper value, as used in filter predicates.
pub fn encode_value(value: &DataValue) -> Option<Value> {
    encode(value, &DataKey::default())
}

fn encode_wrapper(wrapper: &DataWrapper, parent: Option<&DataKey>) -> Document {
    let mut document = Document::new();
    for (name, value) in wrapper.iter() {
        if name.is_empty() {
            continue;
        }
        let path = match parent {
            Some(parent) => parent.then(name),
            None => DataKey::of(name),
        };
        if let Some(encoded) = encode(value, &path) {
            document.insert(name, encoded);
        }
    }
    document
}

fn encode(value: &DataValue, path: &DataKey) -> Option<Value> {
    let encoded = match value {
        DataValue::Bool(b) => Value::Bool(*b),
        DataValue::Int(i) => Value::Int(*i),
        DataValue::Float(f) => Value::Double(*f),
        DataValue::String(s) => Value::String(s.clone()),
        DataValue::Timestamp(ts) => Value::DateTime(*ts),
        DataValue::Wrapper(inner) => Value::Document(encode_wrapper(inner, Some(path))),
        DataValue::List(items) => {
            let encoded: Vec<Value> = items
                .iter()
                .filter_map(|item| match item {
                    DataValue::List(_) => {
                        warn!(field = %path, "Unsupported nested list in record, dropping element");
                        None
                    }
                    other => encode(other, path),
                })
                .collect();
            if encoded.is_empty() && !items.is_empty() {
                return None;
            }
            Value::Array(encoded)
        }
    };
    Some(encoded)
}

fn decode_document(document: &Document, parent: Option<&DataKey>) -> DataWrapper {
    let mut wrapper = DataWrapper::new();
    for (name, value) in document.iter() {
        let path = match parent {
            Some(parent) => parent.then(name),
            None => DataKey::of(name),
        };
        if let Some(decoded) = decode(value, &path) {
            wrapper.set(&DataKey::of(name), decoded);
        }
    }
    wrapper
}

fn decode(value: &Value, path: &DataKey) -> Option<DataValue> {
    let decoded = match value {
        Value::Null => return None,
        Value::Bool(b) => DataValue::Bool(*b),
        Value::Int(i) => DataValue::Int(*i),
        Value::Double(f) => DataValue::Float(*f),
        Value::String(s) => DataValue::String(s.clone()),
        Value::DateTime(ts) => DataValue::Timestamp(*ts),
        Value::Document(inner) => DataValue::Wrapper(decode_document(inner, Some(path))),
        Value::Array(items) => DataValue::List(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Array(_) => {
                        warn!(field = %path, "Unsupported nested array, dropping element");
                        None
                    }
                    other => decode(other, path),
                })
                .collect(),
        ),
    };
    Some(decoded)
}
