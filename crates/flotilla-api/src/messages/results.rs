//! Result types for batch and administrative operations.
//!
//! Every batch result list matches its input 1:1: one slot per input tag,
//! in input order, never reordered or dropped.

use flotilla_core::EnvironConfig;
use flotilla_core::Life;
use serde::Deserialize;
use serde::Serialize;

use crate::error_info::ErrorInfo;

/// One slot with no value, only success or failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub error: Option<ErrorInfo>,
}

impl ErrorResult {
    pub fn ok() -> ErrorResult {
        ErrorResult { error: None }
    }

    pub fn err(error: impl Into<ErrorInfo>) -> ErrorResult {
        ErrorResult {
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResults {
    pub results: Vec<ErrorResult>,
}

/// One lifecycle lookup slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeResult {
    pub life: Option<Life>,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeResults {
    pub results: Vec<LifeResult>,
}

/// One string-valued slot (e.g. an instance id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringResult {
    pub result: Option<String>,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringResults {
    pub results: Vec<StringResult>,
}

/// One string-list-valued slot (e.g. a machine's authorized keys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringsResult {
    pub result: Option<Vec<String>>,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringsResults {
    pub results: Vec<StringsResult>,
}

/// The environment configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironConfigResult {
    pub config: EnvironConfig,
}

/// Outcome of one remote command execution.
///
/// Unlike batch results these are sorted by target tag: execution order is
/// nondeterministic, so the aggregate is sorted before returning to give
/// callers a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    pub tag: String,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub code: i32,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResults {
    pub results: Vec<ExecResult>,
}
