// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

use crate::{
    modules::{
        cursor::Cursor,
        database::{async_find_impl, manager::open_cursor_database, upsert_impl},
        error::{code::ErrorCode, MailwatchResult},
        settings::cli::Settings,
        utils::iso8601,
    },
    raise_error, utc_now,
};

/// Persisted shape of a [`Cursor`], one row per polled target.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct FetchCursorEntity {
    #[primary_key]
    pub target: String,
    pub folder_name: String,
    pub last_run_time: Option<String>,
    pub ids: Vec<String>,
    pub error_counter: u32,
    pub updated_at: i64,
}

impl FetchCursorEntity {
    pub fn new(target: &str, folder_name: &str, cursor: &Cursor) -> Self {
        Self {
            target: target.to_string(),
            folder_name: folder_name.to_string(),
            last_run_time: Some(iso8601(&cursor.watermark)),
            ids: cursor.emitted_ids.iter().cloned().sorted().collect(),
            error_counter: cursor.error_counter,
            updated_at: utc_now!(),
        }
    }

    /// Rebuilds the cursor; a row without a run time starts `lookback`
    /// before now.
    pub fn to_cursor(&self, lookback: Duration) -> MailwatchResult<Cursor> {
        let watermark = match &self.last_run_time {
            Some(time) => DateTime::parse_from_rfc3339(time)
                .map_err(|e| {
                    raise_error!(
                        format!(
                            "Stored last run time '{}' of target '{}' is not ISO-8601: {}",
                            time, self.target, e
                        ),
                        ErrorCode::InternalError
                    )
                })?
                .with_timezone(&Utc),
            None => Utc::now() - lookback,
        };
        Ok(Cursor {
            watermark,
            emitted_ids: self.ids.iter().cloned().collect(),
            error_counter: self.error_counter,
        })
    }
}

/// Keeps one cursor per target between cycles.
pub trait CursorStore: Send + Sync {
    /// The stored cursor, or a fresh one looking `lookback` into the past.
    async fn load(&self, target: &str, lookback: Duration) -> MailwatchResult<Cursor>;

    /// Replaces the stored cursor in one write.
    async fn save(&self, target: &str, folder_name: &str, cursor: &Cursor) -> MailwatchResult<()>;
}

pub struct NativeDbCursorStore {
    database: Arc<Database<'static>>,
}

impl NativeDbCursorStore {
    pub fn new(database: Arc<Database<'static>>) -> Self {
        Self { database }
    }

    /// Store on the database configured by `mailwatch_state_db`.
    pub fn open(settings: &Settings) -> MailwatchResult<Self> {
        open_cursor_database(settings.mailwatch_state_db.as_deref()).map(Self::new)
    }

    pub async fn get(&self, target: &str) -> MailwatchResult<Option<FetchCursorEntity>> {
        async_find_impl(&self.database, target.to_string()).await
    }
}

impl CursorStore for NativeDbCursorStore {
    async fn load(&self, target: &str, lookback: Duration) -> MailwatchResult<Cursor> {
        match self.get(target).await? {
            Some(entity) => entity.to_cursor(lookback),
            None => Ok(Cursor::initial(Utc::now(), lookback)),
        }
    }

    async fn save(&self, target: &str, folder_name: &str, cursor: &Cursor) -> MailwatchResult<()> {
        upsert_impl(
            &self.database,
            FetchCursorEntity::new(target, folder_name, cursor),
        )
        .await
    }
}
