//! The domain error taxonomy shared by every facade.
//!
//! These are kinds, not a catch-all: the facade layer matches on them to
//! decide wire codes and masking behavior. Unclassified backend failures
//! travel in [`Error::Backend`] with their message propagated verbatim.

use thiserror::Error;

/// Errors produced by the control-plane API and its collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The string does not parse as `<known-kind>-<id>`.
    #[error("\"{tag}\" is not a valid tag")]
    InvalidTag {
        /// The offending input, verbatim.
        tag: String,
    },

    /// The authenticated principal may not act on the target entity.
    ///
    /// Also used to mask `NotFound` for unauthorized callers so that they
    /// cannot distinguish "exists but forbidden" from "does not exist".
    #[error("permission denied")]
    PermissionDenied,

    /// The entity does not exist.
    #[error("{what} not found")]
    NotFound {
        /// What was looked up, e.g. `machine 42`.
        what: String,
    },

    /// The machine has no backing instance yet.
    #[error("{tag} not provisioned")]
    NotProvisioned {
        /// Tag of the unprovisioned machine.
        tag: String,
    },

    /// A facade was addressed with an instance id it does not recognize.
    #[error("bad id \"{id}\"")]
    BadId {
        /// The offending facade instance id.
        id: String,
    },

    /// No facade is registered under the requested name.
    #[error("unknown facade \"{name}\"")]
    UnknownFacade {
        /// The requested facade name.
        name: String,
    },

    /// Teardown precondition: manually provisioned machines must be removed
    /// by hand before the environment can be destroyed.
    #[error("manually provisioned machines must first be destroyed with: {}", ids.join(", "))]
    ManualMachinesRemain {
        /// Ids of the offending machines, in backend order.
        ids: Vec<String>,
    },

    /// A unit did not disappear from the backend within the drain budget.
    #[error("{tag} was not removed within the allotted time")]
    RemovalTimeout {
        /// Tag of the lingering unit.
        tag: String,
    },

    /// A backend watcher closed before delivering its initial snapshot and
    /// stored no error of its own.
    #[error("watcher failed to start")]
    WatcherStartFailed,

    /// The watcher was deliberately stopped; no further changes will arrive.
    #[error("watcher has been stopped")]
    Stopped,

    /// A bounded wait expired.
    #[error("operation timed out after {duration_ms}ms")]
    Timeout {
        /// Duration in milliseconds before expiry.
        duration_ms: u64,
    },

    /// Unclassified collaborator failure, message propagated verbatim.
    #[error("{reason}")]
    Backend {
        /// Human-readable description from the collaborator.
        reason: String,
    },
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Error {
        Error::NotFound { what: what.into() }
    }

    /// Convenience constructor for [`Error::Backend`].
    pub fn backend(reason: impl Into<String>) -> Error {
        Error::Backend { reason: reason.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::PermissionDenied)
    }

    pub fn is_not_provisioned(&self) -> bool {
        matches!(self, Error::NotProvisioned { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_tag_display() {
        let err = Error::InvalidTag { tag: "blimp-0".into() };
        assert_eq!(err.to_string(), "\"blimp-0\" is not a valid tag");
    }

    #[test]
    fn not_found_display() {
        let err = Error::not_found("machine 42");
        assert_eq!(err.to_string(), "machine 42 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn manual_machines_display_joins_ids() {
        let err = Error::ManualMachinesRemain {
            ids: vec!["3".into(), "7".into()],
        };
        assert_eq!(err.to_string(), "manually provisioned machines must first be destroyed with: 3, 7");
    }

    #[test]
    fn backend_message_is_verbatim() {
        let err = Error::backend("machine 0 has unit \"wordpress/0\" assigned");
        assert_eq!(err.to_string(), "machine 0 has unit \"wordpress/0\" assigned");
    }

    #[test]
    fn removal_timeout_display() {
        let err = Error::RemovalTimeout { tag: "unit-mysql-0".into() };
        assert_eq!(err.to_string(), "unit-mysql-0 was not removed within the allotted time");
    }

    #[test]
    fn predicates() {
        assert!(Error::PermissionDenied.is_permission_denied());
        assert!(!Error::PermissionDenied.is_not_found());
        assert!(Error::NotProvisioned { tag: "machine-1".into() }.is_not_provisioned());
    }
}
