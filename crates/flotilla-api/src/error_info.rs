//! Structured error surface.
//!
//! Wire errors carry a stable machine-readable code plus the human-readable
//! message. The code mapping is total over [`flotilla_core::Error`];
//! unclassified backend failures map to [`ErrorCode::Backend`] with their
//! message propagated verbatim.

use flotilla_core::Error;
use serde::Deserialize;
use serde::Serialize;

/// Stable error codes observable by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    InvalidTag,
    PermissionDenied,
    NotFound,
    NotProvisioned,
    BadId,
    UnknownFacade,
    ManualMachinesRemain,
    RemovalTimeout,
    WatcherStartFailed,
    Stopped,
    Timeout,
    Backend,
}

/// One wire-visible error: code plus message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> ErrorInfo {
        ErrorInfo {
            code,
            message: message.into(),
        }
    }

    /// Map an `anyhow` boundary error onto the wire surface.
    ///
    /// Domain errors keep their code; anything else is reported as an
    /// unclassified backend failure.
    pub fn from_anyhow(err: &anyhow::Error) -> ErrorInfo {
        match err.downcast_ref::<Error>() {
            Some(domain) => ErrorInfo::from(domain),
            None => ErrorInfo::new(ErrorCode::Backend, err.to_string()),
        }
    }
}

impl From<&Error> for ErrorInfo {
    fn from(err: &Error) -> ErrorInfo {
        let code = match err {
            Error::InvalidTag { .. } => ErrorCode::InvalidTag,
            Error::PermissionDenied => ErrorCode::PermissionDenied,
            Error::NotFound { .. } => ErrorCode::NotFound,
            Error::NotProvisioned { .. } => ErrorCode::NotProvisioned,
            Error::BadId { .. } => ErrorCode::BadId,
            Error::UnknownFacade { .. } => ErrorCode::UnknownFacade,
            Error::ManualMachinesRemain { .. } => ErrorCode::ManualMachinesRemain,
            Error::RemovalTimeout { .. } => ErrorCode::RemovalTimeout,
            Error::WatcherStartFailed => ErrorCode::WatcherStartFailed,
            Error::Stopped => ErrorCode::Stopped,
            Error::Timeout { .. } => ErrorCode::Timeout,
            Error::Backend { .. } => ErrorCode::Backend,
        };
        ErrorInfo::new(code, err.to_string())
    }
}

impl From<Error> for ErrorInfo {
    fn from(err: Error) -> ErrorInfo {
        ErrorInfo::from(&err)
    }
}
