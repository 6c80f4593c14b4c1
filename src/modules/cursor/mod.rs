// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use ahash::AHashSet;
use chrono::{DateTime, Duration, Utc};

use crate::modules::mapper::Record;

pub mod entity;

/// Where a target's polling left off.
///
/// `emitted_ids` only ever holds IDs of messages received exactly at
/// `watermark`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub watermark: DateTime<Utc>,
    pub emitted_ids: AHashSet<String>,
    pub error_counter: u32,
}

impl Cursor {
    /// Cursor for a target that was never polled.
    pub fn initial(now: DateTime<Utc>, lookback: Duration) -> Self {
        Self {
            watermark: now - lookback,
            emitted_ids: AHashSet::new(),
            error_counter: 0,
        }
    }

    pub fn is_emitted(&self, id: &str) -> bool {
        self.emitted_ids.contains(id)
    }

    /// Folds a receipt-time ascending batch into the cursor.
    ///
    /// When the batch reaches past the watermark, the ID set restarts with
    /// the IDs at the new maximum. When it ends exactly at the watermark the
    /// IDs accumulate. Empty batches, and batches that end before the
    /// watermark, leave the cursor untouched.
    pub fn advance(&self, batch: &[Record]) -> Cursor {
        let Some(last) = batch.last() else {
            return self.clone();
        };
        let max_time = last.received;
        if max_time < self.watermark {
            return self.clone();
        }

        let at_max = batch
            .iter()
            .filter(|record| record.received == max_time)
            .map(|record| record.id.clone());

        let emitted_ids = if max_time > self.watermark {
            at_max.collect()
        } else {
            // TODO: cap this set; a folder stuck on one timestamp grows it without bound.
            let mut ids = self.emitted_ids.clone();
            ids.extend(at_max);
            ids
        };

        Cursor {
            watermark: max_time,
            emitted_ids,
            error_counter: self.error_counter,
        }
    }

    /// Cursor after a failed cycle: unchanged except for the counter.
    pub fn record_failure(&self) -> Cursor {
        Cursor {
            error_counter: self.error_counter.saturating_add(1),
            ..self.clone()
        }
    }

    pub fn reset_failures(mut self) -> Cursor {
        self.error_counter = 0;
        self
    }
}
