// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::modules::{
    folder::{
        query::MIME_FIELD,
        value::{TypedObject, TypedValue},
        RawItem,
    },
    mapper::attachment::{attachment_name, is_attachment},
    utils::iso8601,
};

pub mod attachment;
pub mod contact;

const MESSAGE_ID: &str = "message_id";
const DATETIME_RECEIVED: &str = "datetime_received";
const DATETIME_SENT: &str = "datetime_sent";
const DATETIME_CREATED: &str = "datetime_created";

/// A mapped message: a flat JSON object with camelCase keys, plus the two
/// attributes the cursor bookkeeping needs in typed form.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub id: String,
    pub received: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.fields)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// `this_is_a_field` → `thisIsAField`.
pub fn camel_case(name: &str) -> String {
    let mut parts = name.split('_');
    let mut out = parts.next().unwrap_or_default().to_string();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out
}

/// Renames every object key in the tree to camelCase. Bare strings inside
/// lists are names too and get the same treatment; a string held under an
/// object key is a value and stays as it is.
pub fn keys_to_camel_case(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (camel_case(&key), keys_to_camel_case(value)))
                .collect(),
        ),
        Value::Array(values) => Value::Array(
            values
                .into_iter()
                .map(|value| match value {
                    Value::String(name) => Value::String(camel_case(&name)),
                    other => keys_to_camel_case(other),
                })
                .collect(),
        ),
        other => other,
    }
}

/// JSON form of a single value, `None` for null.
pub fn typed_to_json(value: &TypedValue) -> Option<Value> {
    match value {
        TypedValue::Null => None,
        TypedValue::Bool(b) => Some(Value::Bool(*b)),
        TypedValue::Int(n) => Some(Value::Number((*n).into())),
        TypedValue::Float(f) => Some(
            Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string())),
        ),
        TypedValue::Text(s) => Some(Value::String(s.clone())),
        TypedValue::DateTime(dt) => Some(Value::String(iso8601(dt))),
        TypedValue::List(values) => Some(Value::Array(
            values
                .iter()
                .map(|v| typed_to_json(v).unwrap_or(Value::Null))
                .collect(),
        )),
        TypedValue::Object(object) => Some(Value::Object(object_to_json(object))),
        TypedValue::Binary(bytes) => Some(Value::String(crate::base64_encode!(bytes))),
        TypedValue::Opaque { repr, .. } => Some(Value::String(repr.clone())),
    }
}

/// Expands a typed sub-object into its named attributes, recursively.
pub fn object_to_json(object: &TypedObject) -> Map<String, Value> {
    let mut map: Map<String, Value> = object
        .fields
        .iter()
        .filter_map(|(name, value)| typed_to_json(value).map(|json| (name.clone(), json)))
        .collect();
    if is_attachment(object) {
        if let Some(name) = attachment_name(object) {
            map.insert("attachment_name".into(), Value::String(name));
        }
    }
    map
}

/// Turns a remote item into a record.
///
/// With `include_mime` the raw MIME content is carried as text under
/// `mimeContent`; without it the field is dropped.
pub fn map_item(item: &RawItem, include_mime: bool) -> Record {
    let mut map = Map::new();
    map.insert(MESSAGE_ID.into(), Value::String(item.id.clone()));
    map.insert(DATETIME_RECEIVED.into(), Value::String(iso8601(&item.received)));
    if let Some(sent) = &item.sent {
        map.insert(DATETIME_SENT.into(), Value::String(iso8601(sent)));
    }
    if let Some(created) = &item.created {
        map.insert(DATETIME_CREATED.into(), Value::String(iso8601(created)));
    }

    for (name, value) in &item.fields {
        if map.contains_key(name) {
            continue;
        }
        if name == MIME_FIELD {
            if include_mime {
                if let Some(mime) = mime_text(value) {
                    map.insert(name.clone(), Value::String(mime));
                }
            }
            continue;
        }
        if let Some(json) = typed_to_json(value) {
            map.insert(name.clone(), json);
        }
    }

    let fields = map
        .into_iter()
        .map(|(key, value)| (camel_case(&key), keys_to_camel_case(value)))
        .collect();

    Record {
        id: item.id.clone(),
        received: item.received,
        fields,
    }
}

fn mime_text(value: &TypedValue) -> Option<String> {
    match value {
        TypedValue::Binary(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        TypedValue::Text(text) => Some(text.clone()),
        _ => None,
    }
}
