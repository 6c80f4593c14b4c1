// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ErrorCode {
    // Client-side errors (10000–10999)
    InvalidParameter = 10000,
    MissingConfiguration = 10020,
    MalformedItemId = 10100,

    // Resource errors (30000–30999)
    ResourceNotFound = 30000,
    FolderNotFound = 30030,

    // Network connection errors (40000–40999)
    NetworkError = 40000,
    ConnectionTimeout = 40010,

    // Mail service errors (50000–50999)
    FolderQueryFailed = 50100,
    UnexpectedStreamError = 50110,
    ItemFetchFailed = 50120,
    NameResolutionFailed = 50130,
    SendFailed = 50140,
    SinkFailed = 50150,

    // Operational faults (60000–60999)
    ConsecutiveFailuresExceeded = 60100,

    // Internal system errors (70000–70999)
    InternalError = 70000,
}

impl ErrorCode {
    /// Whether a failure with this code is worth another attempt on the next
    /// polling tick without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::NetworkError
                | ErrorCode::ConnectionTimeout
                | ErrorCode::FolderQueryFailed
                | ErrorCode::UnexpectedStreamError
                | ErrorCode::SinkFailed
        )
    }
}
