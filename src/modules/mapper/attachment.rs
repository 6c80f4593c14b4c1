// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::folder::value::{TypedObject, TypedValue};

const ATTACHMENT_KINDS: &[&str] = &["FileAttachment", "ItemAttachment"];

pub fn is_attachment(object: &TypedObject) -> bool {
    ATTACHMENT_KINDS.contains(&object.kind.as_str())
}

/// Unique display name for an attachment: prefixed with its content id, or
/// with its attachment id when the content id is missing or empty.
pub fn format_attachment_name(
    attachment_name: &str,
    content_id: Option<&str>,
    attachment_id: &str,
) -> String {
    let prefix = content_id
        .filter(|cid| !cid.is_empty())
        .unwrap_or(attachment_id);
    format!("{}-attachmentName-{}", prefix, attachment_name)
}

pub(crate) fn attachment_name(object: &TypedObject) -> Option<String> {
    let name = object.get("name").and_then(TypedValue::as_text)?;
    let attachment_id = match object.get("attachment_id") {
        Some(TypedValue::Text(id)) => id.as_str(),
        Some(TypedValue::Object(id)) => id.get("id").and_then(TypedValue::as_text)?,
        _ => return None,
    };
    let content_id = object.get("content_id").and_then(TypedValue::as_text);
    Some(format_attachment_name(name, content_id, attachment_id))
}
