use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailwatchResult;
use crate::modules::logger::file::setup_file_logger;
use crate::modules::settings::cli::Settings;
use crate::{mailwatch_version, raise_error};
use chrono::Local;
use tracing::{info, Level};
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

mod file;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

pub fn initialize_logging(settings: &Settings) -> MailwatchResult<()> {
    if settings.mailwatch_log_to_file {
        setup_file_logger(settings)?;
    } else {
        setup_stdout_logger(settings)?;
    }
    info!("mailwatch {} logging initialized", mailwatch_version!());
    Ok(())
}

fn setup_stdout_logger(settings: &Settings) -> MailwatchResult<()> {
    let level = parse_log_level(&settings.mailwatch_log_level)?;

    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_target(true)
        .with_timer(LocalTimer);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(settings.mailwatch_ansi_logs)
        .with_writer(std::io::stdout)
        .event_format(format)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
}

fn parse_log_level(value: &str) -> MailwatchResult<Level> {
    value.parse::<Level>().map_err(|_| {
        raise_error!(
            format!(
                "Invalid log level specified. Use one of: error, warn, info, debug, trace. \
                 The log level you currently specified is 'mailwatch_log_level'='{}'",
                value
            ),
            ErrorCode::MissingConfiguration
        )
    })
}
