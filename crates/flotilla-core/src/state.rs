//! Collaborator traits for the cluster state backend.
//!
//! The persistent store (entity CRUD, transactions, document lifecycle) is
//! not implemented here. Facades consume it through these narrow handles
//! and treat it as a safe, linearizable collaborator; the deterministic
//! in-memory implementation in [`crate::test_support`] stands in for it
//! under test.
//!
//! Entity resolution returns the [`Entity`] sum type, matched explicitly at
//! each call site. Handles are thin references into the backend: `life()`
//! and friends re-read on every call, so there is no separate refresh step.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::life::EntityStatus;
use crate::life::Life;
use crate::provider::InstanceId;
use crate::tag::Tag;
use crate::watch::NotifyWatcher;
use crate::watch::StringsWatcher;

/// Environment-wide configuration, an open key/value document.
pub type EnvironConfig = serde_json::Map<String, serde_json::Value>;

/// Behavior common to every entity handle.
#[async_trait]
pub trait StateEntity: Send + Sync {
    /// The entity's tag.
    fn tag(&self) -> Tag;

    /// Current lifecycle value, read fresh from the backend.
    async fn life(&self) -> Result<Life, Error>;
}

/// Handle on one machine.
#[async_trait]
pub trait MachineEntity: StateEntity {
    /// The machine id, e.g. `"0"`.
    fn id(&self) -> String;

    /// The cloud instance backing this machine.
    ///
    /// Fails with [`Error::NotProvisioned`] while no instance has been
    /// started for it.
    async fn instance_id(&self) -> Result<InstanceId, Error>;

    /// Whether the machine's compute was provisioned outside the cluster's
    /// own provider integration. An explicit flag on the entity; never
    /// derived from instance-id formatting.
    async fn is_manual(&self) -> Result<bool, Error>;

    /// Whether the machine runs the control plane itself. Manager machines
    /// are exempt from ordinary destroy/teardown operations.
    async fn is_manager(&self) -> Result<bool, Error>;

    /// Names of the units currently assigned to this machine.
    async fn unit_names(&self) -> Result<Vec<String>, Error>;

    async fn set_status(&self, status: EntityStatus, info: &str) -> Result<(), Error>;

    /// Advance the machine to Dying. The backend refuses machines that
    /// still host units or that the environment requires.
    async fn destroy(&self) -> Result<(), Error>;

    /// Advance the machine to Dead.
    async fn ensure_dead(&self) -> Result<(), Error>;
}

/// Handle on one unit.
#[async_trait]
pub trait UnitEntity: StateEntity {
    /// The unit name, e.g. `"wordpress/0"`.
    fn name(&self) -> String;

    /// Name of the service this unit belongs to.
    fn service_name(&self) -> String;

    /// Whether this is a principal unit (as opposed to a subordinate).
    async fn is_principal(&self) -> Result<bool, Error>;

    async fn set_status(&self, status: EntityStatus, info: &str) -> Result<(), Error>;

    async fn destroy(&self) -> Result<(), Error>;

    async fn ensure_dead(&self) -> Result<(), Error>;
}

/// Handle on one service.
#[async_trait]
pub trait ServiceEntity: StateEntity {
    fn name(&self) -> String;

    async fn destroy(&self) -> Result<(), Error>;
}

/// Handle on the cluster-wide environment entity.
#[async_trait]
pub trait EnvironmentEntity: StateEntity {
    /// Advance the environment to Dying. Also schedules backend cleanup of
    /// dependent entities such as services. Idempotent once Dying or Dead;
    /// the transition is never reversed.
    async fn destroy(&self) -> Result<(), Error>;

    /// Advance the environment to Dead: terminal and irreversible, the
    /// signal for every remaining agent to self-terminate and uninstall.
    async fn ensure_dead(&self) -> Result<(), Error>;
}

/// Result of generic entity resolution, matched explicitly at call sites.
#[derive(Clone)]
pub enum Entity {
    Machine(Arc<dyn MachineEntity>),
    Unit(Arc<dyn UnitEntity>),
    Service(Arc<dyn ServiceEntity>),
    Environment(Arc<dyn EnvironmentEntity>),
}

impl Entity {
    pub fn tag(&self) -> Tag {
        match self {
            Entity::Machine(m) => m.tag(),
            Entity::Unit(u) => u.tag(),
            Entity::Service(s) => s.tag(),
            Entity::Environment(e) => e.tag(),
        }
    }

    pub async fn life(&self) -> Result<Life, Error> {
        match self {
            Entity::Machine(m) => m.life().await,
            Entity::Unit(u) => u.life().await,
            Entity::Service(s) => s.life().await,
            Entity::Environment(e) => e.life().await,
        }
    }

    /// Set status on entities that support it; machines and units do,
    /// services and the environment do not.
    pub async fn set_status(&self, status: EntityStatus, info: &str) -> Result<(), Error> {
        match self {
            Entity::Machine(m) => m.set_status(status, info).await,
            Entity::Unit(u) => u.set_status(status, info).await,
            Entity::Service(s) => Err(Error::backend(format!("cannot set status of service {}", s.name()))),
            Entity::Environment(_) => Err(Error::backend("cannot set status of the environment")),
        }
    }

    /// Advance to Dead, for entity kinds that support it.
    pub async fn ensure_dead(&self) -> Result<(), Error> {
        match self {
            Entity::Machine(m) => m.ensure_dead().await,
            Entity::Unit(u) => u.ensure_dead().await,
            Entity::Service(s) => Err(Error::backend(format!("cannot ensure death of service {}", s.name()))),
            Entity::Environment(e) => e.ensure_dead().await,
        }
    }
}

/// The state backend consumed by every facade.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Resolve a tag to an entity handle.
    ///
    /// Fails with [`Error::NotFound`] when the entity is absent. Callers in
    /// the batch path must authorize the tag before resolving it.
    async fn find_entity(&self, tag: &Tag) -> Result<Entity, Error>;

    async fn machine(&self, id: &str) -> Result<Arc<dyn MachineEntity>, Error>;

    async fn unit(&self, name: &str) -> Result<Arc<dyn UnitEntity>, Error>;

    async fn service(&self, name: &str) -> Result<Arc<dyn ServiceEntity>, Error>;

    async fn environment(&self) -> Result<Arc<dyn EnvironmentEntity>, Error>;

    async fn all_machines(&self) -> Result<Vec<Arc<dyn MachineEntity>>, Error>;

    async fn all_units(&self) -> Result<Vec<Arc<dyn UnitEntity>>, Error>;

    async fn all_services(&self) -> Result<Vec<Arc<dyn ServiceEntity>>, Error>;

    async fn environ_config(&self) -> Result<EnvironConfig, Error>;

    /// Watch one entity for changes: an initial pulse, then one pulse per
    /// change to the entity's document.
    async fn watch_entity(&self, tag: &Tag) -> Result<NotifyWatcher, Error>;

    /// Watch the set of machines in the environment: an initial batch of
    /// all machine ids, then batches of ids whose lifecycle changed.
    async fn watch_environ_machines(&self) -> Result<StringsWatcher, Error>;

    /// Watch the units assigned to one machine.
    async fn watch_units(&self, machine_id: &str) -> Result<StringsWatcher, Error>;

    /// Watch the environment configuration document.
    async fn watch_environ_config(&self) -> Result<NotifyWatcher, Error>;
}
