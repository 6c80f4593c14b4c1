// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

pub mod cli;

use std::time::Duration;

use crate::modules::settings::cli::Settings;

/// The per-cycle knobs, threaded explicitly into every fetch cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    pub max_fetch: usize,
    pub lookback: chrono::Duration,
    pub request_timeout: Option<Duration>,
    pub max_consecutive_failures: u32,
    pub include_mime: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_fetch: 50,
            lookback: chrono::Duration::minutes(10),
            request_timeout: Some(Duration::from_secs(120)),
            max_consecutive_failures: 3,
            include_mime: false,
        }
    }
}

impl From<&Settings> for FetchOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            max_fetch: settings.mailwatch_max_fetch as usize,
            lookback: chrono::Duration::minutes(settings.mailwatch_first_fetch_minutes),
            request_timeout: Some(settings.request_timeout()),
            max_consecutive_failures: settings.mailwatch_max_consecutive_failures,
            include_mime: settings.mailwatch_include_mime,
        }
    }
}
