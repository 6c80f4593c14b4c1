// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use tracing::{debug, info};

use crate::modules::{
    cursor::Cursor,
    error::MailwatchResult,
    folder::{
        query::{page_size, query_folder},
        reader::ResilientReader,
        MailFolder,
    },
    mapper::{map_item, Record},
    settings::FetchOptions,
};

pub mod poller;
#[cfg(test)]
mod tests;

/// Result of one fetch cycle: the cursor to persist and the records to emit.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleOutcome {
    pub cursor: Cursor,
    pub records: Vec<Record>,
}

/// Runs one query → read → map → filter/advance pass over `folder`.
///
/// Items whose ID the cursor already emitted are read past without counting
/// toward `max_fetch`, but they still take part in advancing the cursor.
/// Reading stops once `max_fetch` fresh items are in or the stream ends;
/// the query's page size never truncates the stream.
/// The returned cursor has its failure counter reset.
pub async fn run_cycle<F: MailFolder>(
    cursor: &Cursor,
    folder: &F,
    options: &FetchOptions,
) -> MailwatchResult<CycleOutcome> {
    let stream = query_folder(
        folder,
        cursor.watermark,
        page_size(options.max_fetch),
        options.include_mime,
    )
    .await?;

    let mut reader = ResilientReader::new(stream);
    if let Some(timeout) = options.request_timeout {
        reader = reader.with_timeout(timeout);
    }

    let mut seen = Vec::new();
    let mut fresh = 0;
    while fresh < options.max_fetch {
        let Some(item) = reader.next_item().await? else {
            break;
        };
        if cursor.is_emitted(&item.id) {
            debug!(id = %item.id, "message already emitted, skipping");
        } else {
            fresh += 1;
        }
        seen.push(map_item(&item, options.include_mime));
    }

    let next = cursor.advance(&seen).reset_failures();
    let records: Vec<Record> = seen
        .into_iter()
        .filter(|record| !cursor.is_emitted(&record.id))
        .collect();

    info!(
        folder = folder.path(),
        fetched = records.len(),
        skipped_corrupt = reader.skipped(),
        watermark = %next.watermark,
        "fetch cycle finished"
    );
    Ok(CycleOutcome {
        cursor: next,
        records,
    })
}
