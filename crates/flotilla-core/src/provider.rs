//! Cloud-provider collaborator interface.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;

/// Opaque identifier of one provider instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> InstanceId {
        InstanceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bulk instance operations offered by the cloud provider.
///
/// Termination is all-or-nothing per batch: the provider either accepts the
/// whole request or fails it, and the error propagates as-is. There is no
/// partial-success distinction at this layer.
#[async_trait]
pub trait InstanceBroker: Send + Sync {
    /// Request termination of the given instances.
    async fn stop_instances(&self, ids: &[InstanceId]) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_id_display() {
        let id = InstanceId::new("i-02fa4");
        assert_eq!(id.to_string(), "i-02fa4");
        assert_eq!(id.as_str(), "i-02fa4");
    }
}
