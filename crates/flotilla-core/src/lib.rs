//! Core types and collaborator traits for the flotilla control plane.
//!
//! This crate defines the vocabulary shared by every facade: entity tags,
//! lifecycle values, the domain error taxonomy, the change-stream (watcher)
//! primitives, and the narrow interfaces through which the control plane
//! consumes its collaborators (the state backend, the cloud-provider
//! instance broker, and the remote command runner).
//!
//! Nothing here talks to a real store or a real cloud. The deterministic
//! in-memory backend in [`test_support`] exists so that the facade layer can
//! be exercised end to end without either.

pub mod error;
pub mod exec;
pub mod life;
pub mod provider;
pub mod retry;
pub mod state;
pub mod tag;
pub mod test_support;
pub mod watch;

pub use error::Error;
pub use exec::CommandRunner;
pub use exec::ExecOutput;
pub use life::EntityStatus;
pub use life::Life;
pub use provider::InstanceBroker;
pub use provider::InstanceId;
pub use retry::retry_until;
pub use state::EnvironConfig;
pub use state::Entity;
pub use state::EnvironmentEntity;
pub use state::MachineEntity;
pub use state::ServiceEntity;
pub use state::StateBackend;
pub use state::StateEntity;
pub use state::UnitEntity;
pub use tag::Tag;
pub use tag::TagKind;
pub use watch::NotifySender;
pub use watch::NotifyWatcher;
pub use watch::StringsSender;
pub use watch::StringsWatcher;
pub use watch::Watcher;
pub use watch::WatcherSender;
