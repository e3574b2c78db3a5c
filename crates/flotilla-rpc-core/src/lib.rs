//! Facade framework for the flotilla control plane.
//!
//! This crate defines the core `Facade` trait that all domain facades
//! implement, the `FacadeFactory` trait for self-registration via the
//! inventory pattern, the per-connection dependency bundle
//! ([`ConnectionContext`]) and resource table ([`ResourceRegistry`]), the
//! watcher-subscribe protocol, and the batched multi-entity operation
//! helpers.
//!
//! # Facade Plugin Architecture
//!
//! Facades self-register using the `inventory` crate, so adding a facade
//! does not require touching a central registry. Factories are invoked per
//! dispatched call; each factory re-checks the caller's role and fails
//! fast with `PermissionDenied` rather than returning a partial facade.

pub mod batch;
pub mod config;
pub mod context;
pub mod facade;
pub mod resources;
pub mod subscribe;

// Re-exported for the submit_facade_factory! macro expansion.
pub use inventory;

pub use batch::aggregate_destroy_errors;
pub use batch::run_batch;
pub use config::ApiConfig;
pub use context::ConnectionContext;
pub use facade::collect_facade_factories;
pub use facade::Facade;
pub use facade::FacadeFactory;
pub use resources::Resource;
pub use resources::ResourceRegistry;
pub use subscribe::subscribe_notify;
pub use subscribe::subscribe_strings;
