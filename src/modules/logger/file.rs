use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailwatchResult;
use crate::modules::logger::{parse_log_level, LocalTimer};
use crate::modules::settings::cli::Settings;
use crate::raise_error;
use std::sync::OnceLock;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

pub static LOG_WORKER_GUARD: OnceLock<Vec<WorkerGuard>> = OnceLock::new();

pub fn setup_file_logger(settings: &Settings) -> MailwatchResult<()> {
    let level = parse_log_level(&settings.mailwatch_log_level)?;

    let (server_nonb, server_guard) = server_log_writer(settings)?;
    LOG_WORKER_GUARD.set(vec![server_guard]).map_err(|_| {
        raise_error!(
            "File logging has already been initialized".into(),
            ErrorCode::InternalError
        )
    })?;

    let server_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_ansi(settings.mailwatch_ansi_logs)
        .with_level(true)
        .with_writer(server_nonb)
        .with_target(true);

    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(server_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
}

fn server_log_writer(settings: &Settings) -> MailwatchResult<(NonBlocking, WorkerGuard)> {
    let log_dir = settings.mailwatch_log_dir.clone().ok_or_else(|| {
        raise_error!(
            "`mailwatch_log_dir` is required when `mailwatch_log_to_file` is enabled".into(),
            ErrorCode::MissingConfiguration
        )
    })?;
    let rolling = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("mailwatch")
        .max_log_files(settings.mailwatch_max_server_log_files)
        .build(log_dir)
        .map_err(|e| {
            raise_error!(
                format!("failed to initialize rolling file appender: {:#?}", e),
                ErrorCode::InternalError
            )
        })?;
    Ok(tracing_appender::non_blocking(rolling))
}
