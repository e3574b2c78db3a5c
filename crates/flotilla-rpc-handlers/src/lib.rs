//! Facade registry and concrete facades for the flotilla control plane.
//!
//! The [`registry::FacadeRegistry`] dispatches `(facade, id, method, args)`
//! calls to facades assembled from the capability mixins in [`common`].
//! Each facade is bound to a class of callers and re-checks the caller's
//! role at construction time; the environment teardown orchestrator in
//! [`teardown`] is the most involved consumer of the framework.

pub mod common;
pub mod exec;
pub mod facades;
pub mod registry;
pub mod teardown;
pub mod test_support;

pub use registry::FacadeRegistry;
