// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::modules::{error::MailwatchResult, folder::value::TypedValue};

pub mod query;
pub mod reader;
pub mod value;

/// One message as handed out by the remote folder.
#[derive(Clone, Debug, PartialEq)]
pub struct RawItem {
    /// Message identifier used for deduplication.
    pub id: String,
    pub received: DateTime<Utc>,
    pub sent: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    /// Every other attribute, keyed by its word-separated remote name.
    pub fields: Vec<(String, TypedValue)>,
}

impl RawItem {
    pub fn new(id: &str, received: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            received,
            sent: None,
            created: None,
            fields: Vec::new(),
        }
    }

    pub fn sent(mut self, sent: DateTime<Utc>) -> Self {
        self.sent = Some(sent);
        self
    }

    pub fn created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    pub fn field(mut self, name: &str, value: impl Into<TypedValue>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

/// Why an element of a result stream could not be turned into an item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementError {
    /// The server failed to convert the message's MIME content. The stream
    /// itself is still healthy.
    MimeContentConversionFailed(String),
    /// Anything else. The stream cannot be trusted past this point.
    Unexpected(String),
}

impl fmt::Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementError::MimeContentConversionFailed(detail) => {
                write!(f, "MIME content conversion failed: {}", detail)
            }
            ElementError::Unexpected(detail) => write!(f, "{}", detail),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StreamElement {
    Item(RawItem),
    Corrupt(ElementError),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryOrder {
    ReceivedAscending,
}

/// What the executor asks of a folder: items received at or after `since`,
/// restricted to `projection`, ordered by `order`.
#[derive(Clone, Debug, PartialEq)]
pub struct FolderQuery {
    pub since: DateTime<Utc>,
    pub projection: Vec<&'static str>,
    pub order: QueryOrder,
    /// Paging hint for the backend. The stream keeps going past one page;
    /// the consumer decides when to stop reading.
    pub page_size: usize,
}

/// A resolved remote folder.
pub trait MailFolder: Send + Sync {
    fn path(&self) -> &str;

    /// Runs the query remotely. The returned stream is single-pass; pulling
    /// from it may block on the network.
    async fn query(&self, query: FolderQuery)
        -> MailwatchResult<BoxStream<'static, StreamElement>>;
}

pub trait FolderResolver: Send + Sync {
    type Folder: MailFolder;

    async fn resolve(&self, path: &str) -> MailwatchResult<Self::Folder>;
}
