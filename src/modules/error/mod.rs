// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use code::ErrorCode;
use snafu::{Location, Snafu};

pub mod code;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MailwatchError {
    #[snafu(display("{message}"))]
    Generic {
        message: String,
        #[snafu(implicit)]
        location: Location,
        code: ErrorCode,
    },
}

pub type MailwatchResult<T, E = MailwatchError> = std::result::Result<T, E>;

impl MailwatchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MailwatchError::Generic { code, .. } => *code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            MailwatchError::Generic { message, .. } => message,
        }
    }

    /// Same error, re-tagged with another code. Used when a cycle failure
    /// escalates into an operational fault.
    pub fn escalate(self, code: ErrorCode) -> Self {
        match self {
            MailwatchError::Generic {
                message, location, ..
            } => MailwatchError::Generic {
                message,
                location,
                code,
            },
        }
    }
}
