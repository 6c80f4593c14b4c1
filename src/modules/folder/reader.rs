// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use futures::{stream::BoxStream, StreamExt};
use tracing::debug;

use crate::{
    modules::{
        error::{code::ErrorCode, MailwatchResult},
        folder::{ElementError, RawItem, StreamElement},
    },
    raise_error, run_with_timeout,
};

pub const STREAM_ERROR_HINT: &str =
    "Got an error when pulling incidents. You might be using the wrong exchange version.";

/// Pulls well-formed items out of a folder result stream.
///
/// Elements whose MIME content the server could not convert are dropped and
/// counted; any other element error ends the read with
/// [`ErrorCode::UnexpectedStreamError`].
pub struct ResilientReader {
    stream: BoxStream<'static, StreamElement>,
    timeout: Option<Duration>,
    skipped: usize,
}

impl ResilientReader {
    pub fn new(stream: BoxStream<'static, StreamElement>) -> Self {
        Self {
            stream,
            timeout: None,
            skipped: 0,
        }
    }

    /// Bounds every pull from the underlying stream.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Number of corrupt elements dropped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub async fn next_item(&mut self) -> MailwatchResult<Option<RawItem>> {
        loop {
            let element = match self.timeout {
                Some(timeout) => run_with_timeout!(
                    timeout,
                    self.stream.next(),
                    raise_error!(
                        format!(
                            "Timed out after {:?} while reading the folder result stream",
                            timeout
                        ),
                        ErrorCode::ConnectionTimeout
                    )
                )?,
                None => self.stream.next().await,
            };

            match element {
                None => return Ok(None),
                Some(StreamElement::Item(item)) => return Ok(Some(item)),
                Some(StreamElement::Corrupt(ElementError::MimeContentConversionFailed(detail))) => {
                    self.skipped += 1;
                    debug!(
                        skipped = self.skipped,
                        "Encountered a corrupt object in the result stream, skipping it: {}", detail
                    );
                }
                Some(StreamElement::Corrupt(error @ ElementError::Unexpected(_))) => {
                    return Err(raise_error!(
                        format!("{} {}", STREAM_ERROR_HINT, error),
                        ErrorCode::UnexpectedStreamError
                    ));
                }
            }
        }
    }

    /// Collects up to `limit` well-formed items, keeping their order.
    pub async fn read(&mut self, limit: usize) -> MailwatchResult<Vec<RawItem>> {
        let mut items = Vec::new();
        while items.len() < limit {
            match self.next_item().await? {
                Some(item) => items.push(item),
                None => break,
            }
        }
        Ok(items)
    }
}

pub async fn read_resilient(
    stream: BoxStream<'static, StreamElement>,
    limit: usize,
) -> MailwatchResult<Vec<RawItem>> {
    ResilientReader::new(stream).read(limit).await
}
