//! Facade registry: dispatching `(facade, id, method, args)` calls.
//!
//! All facade factories self-register via `submit_facade_factory!` and
//! are collected here at construction. Dispatch looks the factory up by
//! name and creates the facade per call; construction is where the
//! caller's role is checked, so a role mismatch fails fast with
//! `PermissionDenied` before any method logic runs.

use std::collections::HashMap;

use anyhow::Result;
use flotilla_api::ApiCall;
use flotilla_api::ApiResponse;
use flotilla_core::Error;
use flotilla_rpc_core::collect_facade_factories;
use flotilla_rpc_core::ConnectionContext;
use flotilla_rpc_core::FacadeFactory;
use tracing::debug;
use tracing::warn;

/// Registry of facade factories, keyed by facade name.
pub struct FacadeRegistry {
    factories: HashMap<&'static str, &'static dyn FacadeFactory>,
}

impl Default for FacadeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FacadeRegistry {
    /// Collect every factory registered via `submit_facade_factory!`.
    pub fn new() -> FacadeRegistry {
        let mut factories: HashMap<&'static str, &'static dyn FacadeFactory> = HashMap::new();
        for factory in collect_facade_factories() {
            if factories.insert(factory.name(), factory).is_some() {
                warn!(facade = factory.name(), "duplicate facade factory registration, keeping the last");
            }
        }
        debug!(facade_count = factories.len(), "facade registry initialized");
        FacadeRegistry { factories }
    }

    /// Registered facade names, sorted.
    pub fn facade_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch one call on a connection.
    ///
    /// # Errors
    ///
    /// `UnknownFacade` for an unregistered name, `PermissionDenied` from
    /// the factory when the caller's role does not match, `BadId` for an
    /// instance-id mismatch, and whatever the facade method itself
    /// produces.
    pub async fn dispatch(&self, call: ApiCall, ctx: &ConnectionContext) -> Result<ApiResponse> {
        let factory = self
            .factories
            .get(call.facade.as_str())
            .copied()
            .ok_or_else(|| Error::UnknownFacade { name: call.facade.clone() })?;

        let facade = factory.create(ctx)?;
        if !facade.accepts_id(&call.id) {
            return Err(Error::BadId { id: call.id }.into());
        }
        if !facade.can_handle(&call.request) {
            anyhow::bail!("facade {} does not implement the requested method", facade.name());
        }
        debug!(facade = facade.name(), id = %call.id, "dispatching request to facade");
        facade.handle(call.request, &call.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_builtin_facades_are_registered() {
        let registry = FacadeRegistry::new();
        let names = registry.facade_names();
        for expected in ["Agent", "Client", "Firewaller", "KeyUpdater", "NotifyWatcher", "StringsWatcher", "Uniter"] {
            assert!(names.contains(&expected), "missing facade {expected}; got {names:?}");
        }
    }
}
