// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use tracing::warn;

use crate::{
    modules::{
        error::{code::ErrorCode, MailwatchResult},
        folder::RawItem,
        mapper::{map_item, Record},
    },
    raise_error,
};

/// Why the server could not hand back one of the requested items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemFetchError {
    InvalidIdMalformed(String),
    ItemNotFound(String),
    Other(String),
}

impl fmt::Display for ItemFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemFetchError::InvalidIdMalformed(detail) => write!(f, "malformed id ({})", detail),
            ItemFetchError::ItemNotFound(detail) => write!(f, "not found ({})", detail),
            ItemFetchError::Other(detail) => write!(f, "{}", detail),
        }
    }
}

/// Bulk lookup of messages by ID.
pub trait ItemFetcher: Send + Sync {
    /// One answer per requested ID, in request order.
    async fn fetch(&self, ids: &[String]) -> MailwatchResult<Vec<Result<RawItem, ItemFetchError>>>;
}

/// Fetches every item in `ids`. If any of them cannot be returned the whole
/// call fails with a single [`ErrorCode::ItemFetchFailed`] naming each
/// missing ID.
pub async fn get_items_from_mailbox<F: ItemFetcher>(
    fetcher: &F,
    ids: &[String],
) -> MailwatchResult<Vec<RawItem>> {
    if let Some(blank) = ids.iter().position(|id| id.trim().is_empty()) {
        return Err(raise_error!(
            format!("Item id at position {} is empty", blank),
            ErrorCode::MalformedItemId
        ));
    }

    let mut answers = fetcher.fetch(ids).await?.into_iter();
    let mut items = Vec::with_capacity(ids.len());
    let mut failures = Vec::new();
    for id in ids {
        match answers.next() {
            Some(Ok(item)) => items.push(item),
            Some(Err(e)) => failures.push(format!("{}: {}", id, e)),
            None => failures.push(format!("{}: no answer from server", id)),
        }
    }

    if !failures.is_empty() {
        warn!(
            requested = ids.len(),
            failed = failures.len(),
            "Some requested items could not be fetched"
        );
        return Err(raise_error!(
            format!(
                "Could not fetch {} of {} requested items: {}",
                failures.len(),
                ids.len(),
                failures.join("; ")
            ),
            ErrorCode::ItemFetchFailed
        ));
    }
    Ok(items)
}

/// [`get_items_from_mailbox`] followed by mapping every item to a record.
pub async fn get_item_records<F: ItemFetcher>(
    fetcher: &F,
    ids: &[String],
    include_mime: bool,
) -> MailwatchResult<Vec<Record>> {
    let items = get_items_from_mailbox(fetcher, ids).await?;
    Ok(items
        .iter()
        .map(|item| map_item(item, include_mime))
        .collect())
}
