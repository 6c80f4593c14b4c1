// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::modules::{
    cursor::{entity::CursorStore, Cursor},
    error::{code::ErrorCode, MailwatchError, MailwatchResult},
    folder::FolderResolver,
    ingest::{run_cycle, CycleOutcome},
    mapper::Record,
    settings::FetchOptions,
};

/// Downstream consumer of a cycle's records.
pub trait IncidentSink: Send + Sync {
    /// Receives one batch, in receipt-time order. An error aborts the cycle
    /// before the cursor moves.
    async fn emit(&self, target: &str, records: &[Record]) -> MailwatchResult<()>;
}

/// Drives fetch cycles for any number of targets.
///
/// Cycles for the same target never overlap; distinct targets proceed
/// concurrently.
pub struct MailPoller<S, R, K> {
    store: S,
    resolver: R,
    sink: K,
    options: FetchOptions,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl<S, R, K> MailPoller<S, R, K>
where
    S: CursorStore,
    R: FolderResolver,
    K: IncidentSink,
{
    pub fn new(store: S, resolver: R, sink: K, options: FetchOptions) -> Self {
        Self {
            store,
            resolver,
            sink,
            options,
            in_flight: DashMap::new(),
        }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// One fetch cycle for `target`, reading from `folder_path`.
    ///
    /// The cursor is loaded once and saved once. On failure the saved cursor
    /// only differs by its failure counter, and once that counter reaches
    /// the configured bound the error comes back as
    /// [`ErrorCode::ConsecutiveFailuresExceeded`].
    ///
    /// Delivery is at least once: records reach the sink before the cursor is
    /// saved, so if that save fails the same batch is emitted again on the
    /// next poll.
    pub async fn poll(&self, target: &str, folder_path: &str) -> MailwatchResult<CycleOutcome> {
        let lock = self
            .in_flight
            .entry(target.to_string())
            .or_default()
            .value()
            .clone();
        let _guard = lock.lock().await;

        let cursor = self.store.load(target, self.options.lookback).await?;
        match self.cycle(target, folder_path, &cursor).await {
            Ok(outcome) => {
                if let Err(e) = self.store.save(target, folder_path, &outcome.cursor).await {
                    error!(
                        target_id = target,
                        emitted = outcome.records.len(),
                        "Emitted {} records but failed to save the cursor, they will be emitted again: {:#?}",
                        outcome.records.len(),
                        e
                    );
                    return Err(e);
                }
                Ok(outcome)
            }
            Err(e) => Err(self.fail(target, folder_path, &cursor, e).await),
        }
    }

    async fn cycle(
        &self,
        target: &str,
        folder_path: &str,
        cursor: &Cursor,
    ) -> MailwatchResult<CycleOutcome> {
        let folder = self.resolver.resolve(folder_path).await?;
        let outcome = run_cycle(cursor, &folder, &self.options).await?;
        if !outcome.records.is_empty() {
            self.sink.emit(target, &outcome.records).await?;
        }
        Ok(outcome)
    }

    async fn fail(
        &self,
        target: &str,
        folder_path: &str,
        cursor: &Cursor,
        cause: MailwatchError,
    ) -> MailwatchError {
        let failed = cursor.record_failure();
        if let Err(e) = self.store.save(target, folder_path, &failed).await {
            error!(target_id = target, "Failed to record the failed cycle: {:#?}", e);
        }

        if failed.error_counter >= self.options.max_consecutive_failures {
            error!(
                target_id = target,
                error_counter = failed.error_counter,
                "Fetch cycle failed {} times in a row: {}",
                failed.error_counter,
                cause
            );
            return cause.escalate(ErrorCode::ConsecutiveFailuresExceeded);
        }

        warn!(
            target_id = target,
            error_counter = failed.error_counter,
            retryable = cause.code().is_retryable(),
            "Fetch cycle failed: {}",
            cause
        );
        cause
    }
}
