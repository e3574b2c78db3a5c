//! Watcher subscribe and poll result types.
//!
//! A successful subscribe response carries both the new watcher id and the
//! already-consumed initial snapshot; the snapshot is never re-delivered on
//! later polls. Poll responses reuse the same shapes with the id absent.

use serde::Deserialize;
use serde::Serialize;

use crate::error_info::ErrorInfo;

/// Subscribe result for a pulse watcher. The initial pulse is consumed
/// before registration, so a successful result already means "current
/// state observed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyWatchResult {
    pub watcher_id: Option<String>,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyWatchResults {
    pub results: Vec<NotifyWatchResult>,
}

/// Subscribe or poll result for an identifier-batch watcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringsWatchResult {
    /// Present on subscribe, absent on poll.
    pub watcher_id: Option<String>,
    /// The initial snapshot (subscribe) or the next delta (poll).
    #[serde(default)]
    pub changes: Vec<String>,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringsWatchResults {
    pub results: Vec<StringsWatchResult>,
}
