// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    modules::{
        error::{code::ErrorCode, MailwatchResult},
        folder::value::{TypedObject, TypedValue},
        mapper::{
            contact::{parse_phone_number, parse_physical_address},
            keys_to_camel_case, object_to_json,
        },
    },
    raise_error,
};

pub const FULL_CONTACT_INFO: &str = "FullContactInfo";

/// One answer of a name-resolution request.
#[derive(Clone, Debug, PartialEq)]
pub enum NameResolution {
    /// A matching mailbox, with its directory contact when one exists.
    Found {
        mailbox: TypedObject,
        contact: Option<TypedObject>,
    },
    NoResults,
    Failed(String),
}

/// Directory lookup of mailboxes and contacts.
pub trait NameResolver: Send + Sync {
    async fn resolve_names(&self, identifiers: &[String]) -> MailwatchResult<Vec<NameResolution>>;
}

/// Adds the `smtp:` routing prefix to a bare address. Display names and
/// identifiers that already carry a prefix are returned unchanged.
pub fn format_identifier(identifier: &str) -> String {
    if identifier.contains('@') && !identifier.contains(':') {
        format!("smtp:{}", identifier)
    } else {
        identifier.to_string()
    }
}

fn contact_to_json(contact: &TypedObject) -> Map<String, Value> {
    let mut map = object_to_json(contact);
    if let Some(TypedValue::List(numbers)) = contact.get("phone_numbers") {
        let numbers: Vec<Value> = numbers
            .iter()
            .filter_map(|number| match number {
                TypedValue::Object(number) => parse_phone_number(number).map(Value::Object),
                _ => None,
            })
            .collect();
        map.insert("phone_numbers".into(), Value::Array(numbers));
    }
    if let Some(TypedValue::List(addresses)) = contact.get("physical_addresses") {
        let addresses: Vec<Value> = addresses
            .iter()
            .filter_map(|address| match address {
                TypedValue::Object(address) => {
                    Some(Value::Object(parse_physical_address(address)))
                }
                _ => None,
            })
            .collect();
        map.insert("physical_addresses".into(), Value::Array(addresses));
    }
    map
}

/// Resolves `identifier` against the directory.
///
/// Every match becomes a camelCase mailbox object; matches that came with a
/// contact carry it under `FullContactInfo`. A "no results" answer yields an
/// empty list.
pub async fn resolve_name<R: NameResolver>(
    resolver: &R,
    identifier: &str,
) -> MailwatchResult<Vec<Value>> {
    let identifier = format_identifier(identifier);
    let answers = resolver
        .resolve_names(std::slice::from_ref(&identifier))
        .await?;

    let mut resolved = Vec::new();
    for answer in answers {
        match answer {
            NameResolution::Found { mailbox, contact } => {
                let mut entry = match keys_to_camel_case(Value::Object(object_to_json(&mailbox))) {
                    Value::Object(entry) => entry,
                    _ => Map::new(),
                };
                if let Some(contact) = contact {
                    entry.insert(
                        FULL_CONTACT_INFO.into(),
                        keys_to_camel_case(Value::Object(contact_to_json(&contact))),
                    );
                }
                resolved.push(Value::Object(entry));
            }
            NameResolution::NoResults => {
                debug!(identifier = %identifier, "No results were found.");
            }
            NameResolution::Failed(detail) => {
                return Err(raise_error!(
                    format!("Failed to resolve '{}': {}", identifier, detail),
                    ErrorCode::NameResolutionFailed
                ));
            }
        }
    }
    Ok(resolved)
}
