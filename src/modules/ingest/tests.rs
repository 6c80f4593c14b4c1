// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use native_db::Builder;

use crate::{
    modules::{
        cursor::{
            entity::{CursorStore, NativeDbCursorStore},
            Cursor,
        },
        database::CURSOR_MODELS,
        error::{code::ErrorCode, MailwatchResult},
        folder::{
            query::MIME_FIELD, reader::STREAM_ERROR_HINT, ElementError, FolderQuery,
            FolderResolver, MailFolder, RawItem, StreamElement,
        },
        ingest::{
            poller::{IncidentSink, MailPoller},
            run_cycle,
        },
        mapper::Record,
        settings::FetchOptions,
    },
    raise_error,
};

fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 7, 14, hour, minute, second).unwrap()
}

fn message(id: &str, received: DateTime<Utc>) -> StreamElement {
    StreamElement::Item(
        RawItem::new(id, received)
            .sent(received)
            .created(received)
            .field("subject", id)
            .field("text_body", "Hello World"),
    )
}

fn messages() -> Vec<StreamElement> {
    vec![
        message("message1", at(13, 0, 0)),
        message("message2", at(13, 9, 0)),
        message("message3", at(13, 9, 0)),
        StreamElement::Item(
            RawItem::new("message4", at(13, 10, 0))
                .sent(at(13, 9, 0))
                .created(at(13, 11, 0)),
        ),
    ]
}

fn corrupt() -> StreamElement {
    StreamElement::Corrupt(ElementError::MimeContentConversionFailed(
        "conversion of the MIME content failed".into(),
    ))
}

fn cursor(watermark: DateTime<Utc>, ids: &[&str]) -> Cursor {
    Cursor {
        watermark,
        emitted_ids: ids.iter().map(|id| id.to_string()).collect(),
        error_counter: 0,
    }
}

fn options(max_fetch: usize) -> FetchOptions {
    FetchOptions {
        max_fetch,
        ..Default::default()
    }
}

fn ids(records: &[Record]) -> Vec<&str> {
    records.iter().map(|record| record.id.as_str()).collect()
}

/// Hands back all of its elements regardless of the time filter or page size,
/// the way a paging backend keeps fetching pages until the reader stops.
#[derive(Clone, Default)]
struct FakeFolder {
    elements: Arc<Mutex<Vec<StreamElement>>>,
    queries: Arc<Mutex<Vec<FolderQuery>>>,
}

impl FakeFolder {
    fn with(elements: Vec<StreamElement>) -> Self {
        let folder = Self::default();
        folder.set(elements);
        folder
    }

    fn set(&self, elements: Vec<StreamElement>) {
        *self.elements.lock().unwrap() = elements;
    }

    fn last_query(&self) -> FolderQuery {
        self.queries.lock().unwrap().last().cloned().unwrap()
    }
}

impl MailFolder for FakeFolder {
    fn path(&self) -> &str {
        "Inbox"
    }

    async fn query(
        &self,
        query: FolderQuery,
    ) -> MailwatchResult<BoxStream<'static, StreamElement>> {
        self.queries.lock().unwrap().push(query);
        let elements = self.elements.lock().unwrap().clone();
        Ok(stream::iter(elements).boxed())
    }
}

#[derive(Default)]
struct FakeResolver {
    folder: FakeFolder,
    unreachable: AtomicBool,
}

impl FolderResolver for FakeResolver {
    type Folder = FakeFolder;

    async fn resolve(&self, path: &str) -> MailwatchResult<FakeFolder> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(raise_error!(
                format!("No such folder: {}", path),
                ErrorCode::FolderNotFound
            ));
        }
        Ok(self.folder.clone())
    }
}

#[derive(Default)]
struct RecordingSink {
    batches: Mutex<Vec<Vec<String>>>,
    broken: AtomicBool,
}

impl RecordingSink {
    fn emitted(&self) -> Vec<String> {
        self.batches.lock().unwrap().concat()
    }
}

impl IncidentSink for RecordingSink {
    async fn emit(&self, _target: &str, records: &[Record]) -> MailwatchResult<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(raise_error!(
                "incident queue is full".into(),
                ErrorCode::SinkFailed
            ));
        }
        self.batches
            .lock()
            .unwrap()
            .push(records.iter().map(|record| record.id.clone()).collect());
        Ok(())
    }
}

/// Cursor store whose saves can be made to fail.
struct FlakyStore {
    inner: NativeDbCursorStore,
    fail_saves: AtomicBool,
}

impl CursorStore for FlakyStore {
    async fn load(&self, target: &str, lookback: Duration) -> MailwatchResult<Cursor> {
        self.inner.load(target, lookback).await
    }

    async fn save(&self, target: &str, folder_name: &str, cursor: &Cursor) -> MailwatchResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(raise_error!(
                "state database is read-only".into(),
                ErrorCode::InternalError
            ));
        }
        self.inner.save(target, folder_name, cursor).await
    }
}

fn poller(
    elements: Vec<StreamElement>,
    options: FetchOptions,
) -> MailPoller<NativeDbCursorStore, FakeResolver, RecordingSink> {
    let db = Builder::new().create_in_memory(&CURSOR_MODELS).unwrap();
    let resolver = FakeResolver::default();
    resolver.folder.set(elements);
    MailPoller::new(
        NativeDbCursorStore::new(Arc::new(db)),
        resolver,
        RecordingSink::default(),
        options,
    )
}

async fn seed(
    poller: &MailPoller<NativeDbCursorStore, FakeResolver, RecordingSink>,
    target: &str,
    watermark: DateTime<Utc>,
) {
    poller
        .store()
        .save(target, "Inbox", &cursor(watermark, &[]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_queries_from_watermark_with_page_size_hint() {
    let folder = FakeFolder::with(messages());
    let prior = cursor(at(13, 9, 0), &["message2", "message3"]);
    run_cycle(&prior, &folder, &options(2)).await.unwrap();

    let query = folder.last_query();
    assert_eq!(query.since, at(13, 9, 0));
    assert_eq!(query.page_size, 2);
    assert!(!query.projection.contains(&MIME_FIELD));

    let with_mime = FetchOptions {
        include_mime: true,
        ..options(2)
    };
    run_cycle(&prior, &folder, &with_mime).await.unwrap();
    assert!(folder.last_query().projection.contains(&MIME_FIELD));
}

#[tokio::test]
async fn test_second_run_found_one_incident() {
    let folder = FakeFolder::with(messages()[..1].to_vec());
    let outcome = run_cycle(&cursor(at(12, 59, 17), &[]), &folder, &options(1))
        .await
        .unwrap();
    assert_eq!(ids(&outcome.records), vec!["message1"]);
    assert_eq!(outcome.cursor, cursor(at(13, 0, 0), &["message1"]));
}

#[tokio::test]
async fn test_already_emitted_message_does_not_use_up_max_fetch() {
    let folder = FakeFolder::with(messages()[0..3].to_vec());
    let outcome = run_cycle(&cursor(at(13, 5, 17), &["message1"]), &folder, &options(1))
        .await
        .unwrap();
    assert_eq!(ids(&outcome.records), vec!["message2"]);
    assert_eq!(outcome.cursor, cursor(at(13, 9, 0), &["message2"]));
}

#[tokio::test]
async fn test_same_timestamp_siblings_accumulate_across_cycles() {
    let folder = FakeFolder::with(messages()[0..3].to_vec());
    let first = run_cycle(&cursor(at(13, 5, 17), &["message1"]), &folder, &options(1))
        .await
        .unwrap();

    folder.set(messages()[1..3].to_vec());
    let second = run_cycle(&first.cursor, &folder, &options(1)).await.unwrap();
    assert_eq!(ids(&second.records), vec!["message3"]);
    assert_eq!(
        second.cursor,
        cursor(at(13, 9, 0), &["message2", "message3"])
    );

    let third = run_cycle(&second.cursor, &folder, &options(1)).await.unwrap();
    assert!(third.records.is_empty());
    assert_eq!(third.cursor, second.cursor);
}

#[tokio::test]
async fn test_no_incidents_keeps_cursor() {
    let folder = FakeFolder::with(vec![]);
    let prior = cursor(at(12, 59, 17), &["message1"]);
    let outcome = run_cycle(&prior, &folder, &options(1)).await.unwrap();
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.cursor, prior);
}

#[tokio::test]
async fn test_watermark_follows_received_time() {
    let folder = FakeFolder::with(messages()[3..].to_vec());
    let outcome = run_cycle(&cursor(at(13, 9, 0), &[]), &folder, &options(1))
        .await
        .unwrap();
    assert_eq!(outcome.cursor, cursor(at(13, 10, 0), &["message4"]));
    let record = &outcome.records[0];
    assert_eq!(record.get("datetimeCreated").unwrap(), "2021-07-14T13:11:00Z");
}

#[tokio::test]
async fn test_max_fetch_caps_emitted_records() {
    let five: Vec<StreamElement> = (0..5)
        .map(|n| message(&format!("message{}", n), at(14, n, 0)))
        .collect();
    for (max_fetch, expected) in [(6, 5), (2, 2), (5, 5)] {
        let folder = FakeFolder::with(five.clone());
        let outcome = run_cycle(&cursor(at(13, 0, 0), &[]), &folder, &options(max_fetch))
            .await
            .unwrap();
        assert_eq!(outcome.records.len(), expected);
        assert!(outcome
            .records
            .windows(2)
            .all(|pair| pair[0].received <= pair[1].received));
    }

    let folder = FakeFolder::with(messages()[0..3].to_vec());
    let outcome = run_cycle(&cursor(at(12, 0, 0), &[]), &folder, &options(2))
        .await
        .unwrap();
    assert_eq!(ids(&outcome.records), vec!["message1", "message2"]);
    assert_eq!(outcome.cursor, cursor(at(13, 9, 0), &["message2"]));
}

#[tokio::test]
async fn test_corrupt_message_is_skipped() {
    let folder = FakeFolder::with(vec![
        message("message1", at(13, 0, 0)),
        corrupt(),
        message("message2", at(13, 9, 0)),
    ]);
    let outcome = run_cycle(&cursor(at(12, 0, 0), &[]), &folder, &options(3))
        .await
        .unwrap();
    assert_eq!(ids(&outcome.records), vec!["message1", "message2"]);
    assert_eq!(outcome.cursor, cursor(at(13, 9, 0), &["message2"]));
}

#[tokio::test]
async fn test_corrupt_head_does_not_stall_watermark() {
    let folder = FakeFolder::with(vec![corrupt(), message("message1", at(13, 0, 0))]);
    let mut current = cursor(at(12, 0, 0), &[]);
    let mut emitted = Vec::new();
    for _ in 0..3 {
        let outcome = run_cycle(&current, &folder, &options(1)).await.unwrap();
        emitted.extend(ids(&outcome.records).into_iter().map(String::from));
        current = outcome.cursor;
    }
    assert_eq!(emitted, vec!["message1"]);
    assert_eq!(current, cursor(at(13, 0, 0), &["message1"]));
    assert_eq!(folder.last_query().page_size, 1);
}

#[tokio::test]
async fn test_reads_past_corrupt_and_known_items_beyond_one_page() {
    let folder = FakeFolder::with(vec![
        corrupt(),
        corrupt(),
        corrupt(),
        message("message1", at(13, 0, 0)),
        message("message2", at(13, 9, 0)),
    ]);
    let outcome = run_cycle(&cursor(at(13, 0, 0), &["message1"]), &folder, &options(1))
        .await
        .unwrap();
    assert_eq!(ids(&outcome.records), vec!["message2"]);
    assert_eq!(outcome.cursor, cursor(at(13, 9, 0), &["message2"]));
}

#[tokio::test]
async fn test_unexpected_stream_error_fails_cycle() {
    let folder = FakeFolder::with(vec![
        corrupt(),
        StreamElement::Corrupt(ElementError::Unexpected("ValueError".into())),
        message("message1", at(13, 0, 0)),
    ]);
    let err = run_cycle(&cursor(at(12, 0, 0), &[]), &folder, &options(1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnexpectedStreamError);
    assert!(err.message().starts_with(STREAM_ERROR_HINT));
}

#[tokio::test]
async fn test_first_run_without_messages_persists_lookback() {
    let poller = poller(vec![], FetchOptions::default());
    let started = Utc::now();
    let outcome = poller.poll("inbox", "Inbox").await.unwrap();
    assert!(outcome.records.is_empty());
    assert!(poller.sink().emitted().is_empty());

    let stored = poller.store().get("inbox").await.unwrap().unwrap();
    assert_eq!(stored.folder_name, "Inbox");
    assert!(stored.ids.is_empty());
    assert_eq!(stored.error_counter, 0);
    let watermark = stored.to_cursor(Duration::minutes(10)).unwrap().watermark;
    assert!(watermark >= started - Duration::minutes(10) - Duration::seconds(1));
    assert!(watermark <= Utc::now() - Duration::minutes(10));
}

#[tokio::test]
async fn test_poll_emits_and_persists() {
    let poller = poller(messages()[..1].to_vec(), options(1));
    seed(&poller, "inbox", at(12, 59, 17)).await;
    poller.poll("inbox", "Inbox").await.unwrap();
    assert_eq!(poller.sink().emitted(), vec!["message1"]);

    let stored = poller.store().get("inbox").await.unwrap().unwrap();
    assert_eq!(stored.last_run_time.as_deref(), Some("2021-07-14T13:00:00Z"));
    assert_eq!(stored.ids, vec!["message1"]);
    assert_eq!(stored.error_counter, 0);
}

#[tokio::test]
async fn test_repeated_failures_escalate_and_success_resets() {
    let poller = poller(messages(), options(10));
    seed(&poller, "inbox", at(12, 0, 0)).await;
    poller.resolver().unreachable.store(true, Ordering::SeqCst);

    for expected in [1, 2] {
        let err = poller.poll("inbox", "Inbox").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::FolderNotFound);
        let stored = poller.store().get("inbox").await.unwrap().unwrap();
        assert_eq!(stored.error_counter, expected);
        assert_eq!(stored.last_run_time.as_deref(), Some("2021-07-14T12:00:00Z"));
    }
    let err = poller.poll("inbox", "Inbox").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConsecutiveFailuresExceeded);
    assert!(err.message().contains("No such folder"));

    poller.resolver().unreachable.store(false, Ordering::SeqCst);
    poller.poll("inbox", "Inbox").await.unwrap();
    let stored = poller.store().get("inbox").await.unwrap().unwrap();
    assert_eq!(stored.error_counter, 0);
    assert_eq!(stored.last_run_time.as_deref(), Some("2021-07-14T13:10:00Z"));
}

#[tokio::test]
async fn test_sink_failure_does_not_advance_cursor() {
    let poller = poller(messages()[..1].to_vec(), options(1));
    seed(&poller, "inbox", at(12, 0, 0)).await;
    poller.sink().broken.store(true, Ordering::SeqCst);
    let err = poller.poll("inbox", "Inbox").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::SinkFailed);
    assert!(err.code().is_retryable());

    let stored = poller.store().get("inbox").await.unwrap().unwrap();
    assert!(stored.ids.is_empty());
    assert_eq!(stored.error_counter, 1);

    poller.sink().broken.store(false, Ordering::SeqCst);
    poller.poll("inbox", "Inbox").await.unwrap();
    assert_eq!(poller.sink().emitted(), vec!["message1"]);
}

#[tokio::test]
async fn test_failed_save_after_emit_redelivers_batch() {
    let db = Builder::new().create_in_memory(&CURSOR_MODELS).unwrap();
    let store = FlakyStore {
        inner: NativeDbCursorStore::new(Arc::new(db)),
        fail_saves: AtomicBool::new(false),
    };
    store
        .inner
        .save("inbox", "Inbox", &cursor(at(12, 0, 0), &[]))
        .await
        .unwrap();
    let resolver = FakeResolver::default();
    resolver.folder.set(messages()[..1].to_vec());
    let poller = MailPoller::new(store, resolver, RecordingSink::default(), options(1));

    poller.store().fail_saves.store(true, Ordering::SeqCst);
    let err = poller.poll("inbox", "Inbox").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(poller.sink().emitted(), vec!["message1"]);
    let stored = poller.store().inner.get("inbox").await.unwrap().unwrap();
    assert!(stored.ids.is_empty());
    assert_eq!(stored.last_run_time.as_deref(), Some("2021-07-14T12:00:00Z"));

    poller.store().fail_saves.store(false, Ordering::SeqCst);
    poller.poll("inbox", "Inbox").await.unwrap();
    assert_eq!(poller.sink().emitted(), vec!["message1", "message1"]);
    let stored = poller.store().inner.get("inbox").await.unwrap().unwrap();
    assert_eq!(stored.ids, vec!["message1"]);
}

#[tokio::test]
async fn test_overlapping_polls_of_one_target_emit_once() {
    let poller = poller(messages()[..1].to_vec(), options(1));
    seed(&poller, "inbox", at(12, 0, 0)).await;
    let (first, second) = tokio::join!(
        poller.poll("inbox", "Inbox"),
        poller.poll("inbox", "Inbox")
    );
    first.unwrap();
    second.unwrap();
    assert_eq!(poller.sink().emitted(), vec!["message1"]);
}

#[tokio::test]
async fn test_targets_keep_separate_cursors() {
    let poller = poller(messages()[..1].to_vec(), options(1));
    let (first, second) = tokio::join!(
        poller.poll("alice/Inbox", "Inbox"),
        poller.poll("bob/Inbox", "Inbox")
    );
    first.unwrap();
    second.unwrap();
    assert_eq!(poller.sink().emitted(), vec!["message1", "message1"]);
}
