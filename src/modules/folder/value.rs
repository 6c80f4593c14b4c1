// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{DateTime, Utc};

/// A field value as it comes back from the remote folder.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    List(Vec<TypedValue>),
    Object(TypedObject),
    Binary(Vec<u8>),
    /// A value of a type the mapper has no dedicated rule for, carried as
    /// its string representation.
    Opaque { type_name: String, repr: String },
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::Text(value.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::Text(value)
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        TypedValue::Bool(value)
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        TypedValue::Int(value)
    }
}

impl From<DateTime<Utc>> for TypedValue {
    fn from(value: DateTime<Utc>) -> Self {
        TypedValue::DateTime(value)
    }
}

impl From<TypedObject> for TypedValue {
    fn from(value: TypedObject) -> Self {
        TypedValue::Object(value)
    }
}

impl<T: Into<TypedValue>> From<Option<T>> for TypedValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(TypedValue::Null)
    }
}

impl<T: Into<TypedValue>> From<Vec<T>> for TypedValue {
    fn from(value: Vec<T>) -> Self {
        TypedValue::List(value.into_iter().map(Into::into).collect())
    }
}

/// A nested typed sub-object (postal address, phone number, item id, mailbox …).
/// Attribute order is the order the remote side declared them in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypedObject {
    pub kind: String,
    pub fields: Vec<(String, TypedValue)>,
}

impl TypedObject {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<TypedValue>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn item_id(id: &str, changekey: &str) -> Self {
        TypedObject::new("ItemId")
            .with("id", id)
            .with("changekey", changekey)
    }

    pub fn mailbox(email_address: Option<&str>, item_id: Option<TypedObject>) -> Self {
        TypedObject::new("Mailbox")
            .with("email_address", email_address)
            .with("item_id", item_id)
    }

    pub fn phone_number(label: &str, phone_number: Option<&str>) -> Self {
        TypedObject::new("PhoneNumber")
            .with("label", label)
            .with("phone_number", phone_number)
    }
}
