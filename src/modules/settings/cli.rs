// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use clap::{builder::ValueParser, Parser};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Parser)]
#[clap(
    name = "mailwatch",
    about = "Polls a mailbox folder and turns newly arrived messages into deduplicated, ordered incident records.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Settings {
    /// mailwatch log level (default: "info")
    #[clap(
        long,
        default_value = "info",
        env,
        help = "Set the log level for mailwatch"
    )]
    pub mailwatch_log_level: String,

    /// Enable ANSI logs (default: true)
    #[clap(long, default_value = "true", env, help = "Enable ANSI formatted logs")]
    pub mailwatch_ansi_logs: bool,

    /// Enable log file output (default: false)
    /// If false, logs will be printed to stdout
    #[clap(
        long,
        default_value = "false",
        env,
        help = "Enable log file output (otherwise logs go to stdout)"
    )]
    pub mailwatch_log_to_file: bool,

    #[clap(
        long,
        env,
        help = "Directory for rolling log files, required when logging to file"
    )]
    pub mailwatch_log_dir: Option<PathBuf>,

    /// Maximum number of log files (default: 5)
    #[clap(
        long,
        default_value = "5",
        env,
        help = "Set the maximum number of server log files"
    )]
    pub mailwatch_max_server_log_files: usize,

    #[clap(
        long,
        default_value = "Inbox",
        env,
        help = "Folder path polled for new messages"
    )]
    pub mailwatch_folder: String,

    #[clap(
        long,
        default_value = "50",
        env,
        help = "Maximum number of incidents emitted per fetch cycle",
        value_parser = clap::value_parser!(u32).range(1..=200)
    )]
    pub mailwatch_max_fetch: u32,

    #[clap(
        long,
        default_value = "10",
        env,
        help = "How far back (in minutes) the first fetch looks for messages",
        value_parser = ValueParser::new(|s: &str| {
            let value = s.parse::<i64>().map_err(|_| {
                format!("Invalid value: {}. Please provide a number of minutes.", s)
            })?;
            if value < 1 {
                return Err("First fetch lookback must be at least 1 minute.".to_string());
            }
            if value > 60 * 24 * 30 {
                return Err("First fetch lookback must be at most 30 days.".to_string());
            }
            Ok(value)
        })
    )]
    pub mailwatch_first_fetch_minutes: i64,

    #[clap(
        long,
        default_value = "120",
        env,
        help = "Timeout (in seconds) for every call to the mail server",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub mailwatch_request_timeout_secs: u64,

    #[clap(
        long,
        default_value = "3",
        env,
        help = "Consecutive failed cycles after which a target is reported as faulty",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub mailwatch_max_consecutive_failures: u32,

    #[clap(
        long,
        default_value = "false",
        env,
        help = "Include the raw MIME content of each message in its incident record"
    )]
    pub mailwatch_include_mime: bool,

    #[clap(
        long,
        env,
        help = "File path of the cursor database; cursors are kept in memory when unset"
    )]
    pub mailwatch_state_db: Option<PathBuf>,
}

impl Settings {
    pub fn load() -> Self {
        Settings::parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.mailwatch_request_timeout_secs)
    }

    #[cfg(test)]
    pub fn new_for_test() -> Self {
        Self {
            mailwatch_log_level: "info".to_string(),
            mailwatch_ansi_logs: false,
            mailwatch_log_to_file: false,
            mailwatch_log_dir: None,
            mailwatch_max_server_log_files: 5,
            mailwatch_folder: "Inbox".to_string(),
            mailwatch_max_fetch: 50,
            mailwatch_first_fetch_minutes: 10,
            mailwatch_request_timeout_secs: 120,
            mailwatch_max_consecutive_failures: 3,
            mailwatch_include_mime: false,
            mailwatch_state_db: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_command_line() {
        let settings = Settings::try_parse_from(["mailwatch"]).unwrap();
        assert_eq!(settings.mailwatch_max_fetch, 50);
        assert_eq!(settings.mailwatch_first_fetch_minutes, 10);
        assert_eq!(settings.mailwatch_folder, "Inbox");
        assert_eq!(settings.request_timeout(), Duration::from_secs(120));
        assert!(settings.mailwatch_state_db.is_none());
    }

    #[test]
    fn test_max_fetch_is_range_checked() {
        assert!(Settings::try_parse_from(["mailwatch", "--mailwatch-max-fetch", "0"]).is_err());
        assert!(Settings::try_parse_from(["mailwatch", "--mailwatch-max-fetch", "201"]).is_err());
        let settings =
            Settings::try_parse_from(["mailwatch", "--mailwatch-max-fetch", "2"]).unwrap();
        assert_eq!(settings.mailwatch_max_fetch, 2);
    }

    #[test]
    fn test_lookback_rejects_zero() {
        assert!(
            Settings::try_parse_from(["mailwatch", "--mailwatch-first-fetch-minutes", "0"])
                .is_err()
        );
    }
}
