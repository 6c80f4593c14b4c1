// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::{Map, Value};

use crate::modules::{
    folder::value::{TypedObject, TypedValue},
    mapper::{object_to_json, typed_to_json},
};

const ADDRESS_FIELDS: &[&str] = &["city", "country", "label", "state", "street", "zipcode"];

/// Postal address attributes, absent ones left out.
pub fn parse_physical_address(address: &TypedObject) -> Map<String, Value> {
    ADDRESS_FIELDS
        .iter()
        .filter_map(|field| {
            address
                .get(field)
                .and_then(typed_to_json)
                .map(|value| (field.to_string(), value))
        })
        .collect()
}

/// A phone number entry, or `None` when no number is actually set.
pub fn parse_phone_number(phone: &TypedObject) -> Option<Map<String, Value>> {
    match phone.get("phone_number") {
        Some(TypedValue::Text(number)) if !number.trim().is_empty() => Some(object_to_json(phone)),
        _ => None,
    }
}
