//! Per-connection context.
//!
//! Every dependency a facade can need travels in here, injected explicitly
//! at login time: the state backend, the cloud-provider broker, the remote
//! command runner, the connection's resource table, and the authenticated
//! principal. There is no package-level mutable state anywhere in the
//! facade layer.

use std::sync::Arc;

use flotilla_auth::Authorizer;
use flotilla_core::CommandRunner;
use flotilla_core::InstanceBroker;
use flotilla_core::StateBackend;

use crate::config::ApiConfig;
use crate::resources::ResourceRegistry;

/// Context for one authenticated connection, shared by every facade call
/// dispatched on it.
#[derive(Clone)]
pub struct ConnectionContext {
    /// Cluster state backend.
    pub state: Arc<dyn StateBackend>,
    /// Cloud-provider bulk instance operations.
    pub instances: Arc<dyn InstanceBroker>,
    /// Remote command execution.
    pub runner: Arc<dyn CommandRunner>,
    /// Live subscriptions owned by this connection. Stopped wholesale when
    /// the connection terminates, normally or not.
    pub resources: Arc<ResourceRegistry>,
    /// The authenticated principal's role predicates.
    pub auth: Arc<Authorizer>,
    /// Tunables for polls and timeouts.
    pub config: ApiConfig,
}

impl std::fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("auth", &self.auth)
            .field("resources", &self.resources.count())
            .finish_non_exhaustive()
    }
}
