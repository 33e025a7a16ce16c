// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use poem::http::StatusCode;
use poem_openapi::Enum;

#[derive(Copy, Clone, Debug, Enum, Eq, PartialEq)]
#[repr(u32)]
pub enum ErrorCode {
    // Configuration errors (10000–10999)
    InvalidParameter = 10000,
    MissingConfiguration = 10020,
    MethodNotAllowed = 10090,

    // Order content errors (30000–30999)
    ResourceNotFound = 30000,
    NoDraftFound = 30010,
    MalformedAddress = 30020,
    MessageParseError = 30030,
    ArchiveFailed = 30040,

    // Network connection errors (40000–40999)
    NetworkError = 40000,
    ConnectionTimeout = 40010,

    // Mail service errors (50000–50999)
    ImapCommandFailed = 50000,
    ImapAuthenticationFailed = 50010,
    ImapUnexpectedResult = 50020,
    SmtpCommandFailed = 50030,
    SmtpConnectionFailed = 50040,

    // Internal system errors (70000–70999)
    InternalError = 70000,
    UnhandledPoemError = 70010,
}

impl ErrorCode {
    /// Every failed order run is reported as a server error; only routing
    /// problems on the HTTP trigger map to client statuses.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::InvalidParameter
            | ErrorCode::MissingConfiguration
            | ErrorCode::NoDraftFound
            | ErrorCode::MalformedAddress
            | ErrorCode::MessageParseError
            | ErrorCode::ArchiveFailed
            | ErrorCode::NetworkError
            | ErrorCode::ConnectionTimeout
            | ErrorCode::ImapCommandFailed
            | ErrorCode::ImapAuthenticationFailed
            | ErrorCode::ImapUnexpectedResult
            | ErrorCode::SmtpCommandFailed
            | ErrorCode::SmtpConnectionFailed
            | ErrorCode::InternalError
            | ErrorCode::UnhandledPoemError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_failures_are_server_errors() {
        for code in [
            ErrorCode::NoDraftFound,
            ErrorCode::MalformedAddress,
            ErrorCode::ImapCommandFailed,
            ErrorCode::SmtpCommandFailed,
        ] {
            assert_eq!(code.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
        assert_eq!(ErrorCode::ResourceNotFound.status(), StatusCode::NOT_FOUND);
    }
}
