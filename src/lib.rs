// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

pub mod modules;

pub use modules::{
    cursor::{entity::CursorStore, Cursor},
    error::{code::ErrorCode, MailwatchError, MailwatchResult},
    folder::{FolderResolver, MailFolder, RawItem, StreamElement},
    ingest::{
        poller::{IncidentSink, MailPoller},
        run_cycle, CycleOutcome,
    },
    mapper::{map_item, Record},
    settings::{cli::Settings, FetchOptions},
};
