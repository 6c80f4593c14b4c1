// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use tracing::debug;

use crate::modules::{
    error::MailwatchResult,
    folder::{FolderQuery, MailFolder, QueryOrder, StreamElement},
};

/// Fields the mapper turns into incident records.
pub const PROJECTION: &[&str] = &[
    "message_id",
    "item_id",
    "conversation_id",
    "subject",
    "body",
    "text_body",
    "importance",
    "categories",
    "is_read",
    "has_attachments",
    "attachments",
    "headers",
    "author",
    "sender",
    "to_recipients",
    "cc_recipients",
    "bcc_recipients",
    "reply_to",
    "datetime_received",
    "datetime_sent",
    "datetime_created",
];

pub const MIME_FIELD: &str = "mime_content";

/// Upper bound on the page size requested from the backend.
pub const MAX_PAGE_SIZE: usize = 100;

/// Page size for a cycle that wants at most `max_fetch` items.
pub fn page_size(max_fetch: usize) -> usize {
    max_fetch.clamp(1, MAX_PAGE_SIZE)
}

pub fn build_query(since: DateTime<Utc>, page_size: usize, include_mime: bool) -> FolderQuery {
    let mut projection = PROJECTION.to_vec();
    if include_mime {
        projection.push(MIME_FIELD);
    }
    FolderQuery {
        since,
        projection,
        order: QueryOrder::ReceivedAscending,
        page_size,
    }
}

/// Asks `folder` for everything received at or after `watermark`. Errors
/// raised while setting the query up are returned as-is; they are fatal
/// for the cycle.
pub async fn query_folder<F: MailFolder>(
    folder: &F,
    watermark: DateTime<Utc>,
    page_size: usize,
    include_mime: bool,
) -> MailwatchResult<BoxStream<'static, StreamElement>> {
    debug!(
        folder = folder.path(),
        since = %watermark,
        page_size,
        "querying folder"
    );
    folder
        .query(build_query(watermark, page_size, include_mime))
        .await
}
