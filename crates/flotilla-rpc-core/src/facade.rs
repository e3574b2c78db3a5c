//! Facade trait and factory for domain-specific RPC facades.
//!
//! Each facade is one RPC-addressable group of related methods exposed to
//! a class of callers. A facade instance lives for one dispatched call: it
//! is created by its factory from the connection context, handles the
//! request, and is dropped. All state lives in the context; facades hold
//! only cheap handles.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use flotilla_api::ApiRequest;
use flotilla_api::ApiResponse;
use flotilla_core::Error;

use crate::context::ConnectionContext;

/// Trait for domain-specific facades.
///
/// `can_handle` must be fast and perform no I/O; it is used by the facade
/// registry to reject method selectors the facade does not implement.
#[async_trait]
pub trait Facade: Send + Sync {
    /// The facade name used for addressing and logging.
    fn name(&self) -> &'static str;

    /// Whether the facade accepts this instance id.
    ///
    /// Ordinary facades accept only the empty id; watcher facades are
    /// addressed with a resource id. A mismatch is reported as `BadId`.
    fn accepts_id(&self, id: &str) -> bool {
        id.is_empty()
    }

    /// Returns true if this facade implements the given method selector.
    fn can_handle(&self, request: &ApiRequest) -> bool;

    /// Process the request.
    ///
    /// Batch methods report per-item failures inside the response; an
    /// `Err` here means the whole call failed (e.g. the AuthFunc could not
    /// be built) and no partial results exist.
    async fn handle(&self, request: ApiRequest, id: &str) -> Result<ApiResponse>;
}

/// Factory trait for creating facades per dispatched call.
///
/// `create` re-checks the caller's role against the facade's requirement
/// and fails fast with [`Error::PermissionDenied`] when it does not
/// match; a partial facade is never returned.
pub trait FacadeFactory: Send + Sync + 'static {
    /// The facade name this factory serves.
    fn name(&self) -> &'static str;

    /// Build a facade bound to this connection.
    fn create(&self, ctx: &ConnectionContext) -> Result<Arc<dyn Facade>, Error>;
}

// Inventory collection for facade factories.
inventory::collect!(&'static dyn FacadeFactory);

/// Collect all facade factories registered via `submit_facade_factory!`.
pub fn collect_facade_factories() -> Vec<&'static dyn FacadeFactory> {
    inventory::iter::<&'static dyn FacadeFactory>.into_iter().copied().collect()
}

/// Register a facade factory for inventory collection at link time.
///
/// # Example
///
/// ```ignore
/// pub struct ClientFacadeFactory;
/// impl FacadeFactory for ClientFacadeFactory { /* ... */ }
///
/// submit_facade_factory!(ClientFacadeFactory);
/// ```
#[macro_export]
macro_rules! submit_facade_factory {
    ($factory:ty) => {
        $crate::inventory::submit! {
            &<$factory>::new() as &'static dyn $crate::FacadeFactory
        }
    };
}
