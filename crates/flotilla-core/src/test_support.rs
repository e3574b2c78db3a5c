//! Deterministic in-memory collaborators.
//!
//! [`MemoryState`] implements the full [`StateBackend`] surface against
//! plain maps so the facade layer can be exercised end to end with no
//! store and no network. Change watchers are backed by the same bounded
//! channels production watchers use; every mutation notifies the relevant
//! watcher lists synchronously, which keeps test interleavings
//! deterministic.
//!
//! Also provides [`StaticInstanceBroker`] (records termination requests)
//! and [`EchoRunner`] (echoes remote commands) for the other two
//! collaborator seams.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::MutexGuard;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;
use crate::exec::CommandRunner;
use crate::exec::ExecOutput;
use crate::life::EntityStatus;
use crate::life::Life;
use crate::provider::InstanceBroker;
use crate::provider::InstanceId;
use crate::state::Entity;
use crate::state::EnvironConfig;
use crate::state::EnvironmentEntity;
use crate::state::MachineEntity;
use crate::state::ServiceEntity;
use crate::state::StateBackend;
use crate::state::StateEntity;
use crate::state::UnitEntity;
use crate::tag::Tag;
use crate::tag::TagKind;
use crate::watch::channel;
use crate::watch::NotifySender;
use crate::watch::NotifyWatcher;
use crate::watch::StringsSender;
use crate::watch::StringsWatcher;
use crate::watch::WATCH_BUFFER;

/// Fixed environment UUID used by every `MemoryState`.
pub const TEST_ENV_UUID: &str = "6e06febc-6f5b-4e2c-9c3a-4b8e3d2f91a7";

#[derive(Debug, Clone)]
struct MachineRecord {
    life: Life,
    status: (EntityStatus, String),
    instance_id: Option<InstanceId>,
    is_manual: bool,
    is_manager: bool,
}

#[derive(Debug, Clone)]
struct UnitRecord {
    service: String,
    machine: Option<String>,
    life: Life,
    is_principal: bool,
    status: (EntityStatus, String),
}

#[derive(Debug, Clone)]
struct ServiceRecord {
    life: Life,
}

struct StateInner {
    env_life: Life,
    env_config: EnvironConfig,
    machines: BTreeMap<String, MachineRecord>,
    units: BTreeMap<String, UnitRecord>,
    services: BTreeMap<String, ServiceRecord>,
    machine_watchers: Vec<StringsSender>,
    unit_watchers: Vec<(String, StringsSender)>,
    config_watchers: Vec<NotifySender>,
    entity_watchers: Vec<(Tag, NotifySender)>,
    remove_units_on_destroy: bool,
}

impl StateInner {
    fn notify_machines(&mut self, ids: Vec<String>) {
        self.machine_watchers.retain(|w| !w.is_stopped());
        for w in &self.machine_watchers {
            w.try_send(ids.clone());
        }
    }

    fn notify_units(&mut self, machine_id: &str, names: Vec<String>) {
        self.unit_watchers.retain(|(_, w)| !w.is_stopped());
        for (mid, w) in &self.unit_watchers {
            if mid == machine_id {
                w.try_send(names.clone());
            }
        }
    }

    fn notify_config(&mut self) {
        self.config_watchers.retain(|w| !w.is_stopped());
        for w in &self.config_watchers {
            w.try_send(());
        }
    }

    fn notify_entity(&mut self, tag: &Tag) {
        self.entity_watchers.retain(|(_, w)| !w.is_stopped());
        for (watched, w) in &self.entity_watchers {
            if watched == tag {
                w.try_send(());
            }
        }
    }
}

/// Parameters for [`MemoryState::add_machine_with`].
#[derive(Debug, Clone, Default)]
pub struct MachineParams {
    pub is_manager: bool,
    pub is_manual: bool,
    pub instance_id: Option<String>,
}

/// Deterministic in-memory state backend.
#[derive(Clone)]
pub struct MemoryState {
    inner: Arc<StdMutex<StateInner>>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(inner: &StdMutex<StateInner>) -> MutexGuard<'_, StateInner> {
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MemoryState {
    pub fn new() -> MemoryState {
        MemoryState {
            inner: Arc::new(StdMutex::new(StateInner {
                env_life: Life::Alive,
                env_config: EnvironConfig::new(),
                machines: BTreeMap::new(),
                units: BTreeMap::new(),
                services: BTreeMap::new(),
                machine_watchers: Vec::new(),
                unit_watchers: Vec::new(),
                config_watchers: Vec::new(),
                entity_watchers: Vec::new(),
                remove_units_on_destroy: false,
            })),
        }
    }

    /// Add an ordinary provisioned machine.
    pub fn add_machine(&self, id: &str, instance_id: Option<&str>) {
        self.add_machine_with(
            id,
            MachineParams {
                instance_id: instance_id.map(str::to_string),
                ..MachineParams::default()
            },
        );
    }

    pub fn add_machine_with(&self, id: &str, params: MachineParams) {
        let mut inner = lock(&self.inner);
        inner.machines.insert(
            id.to_string(),
            MachineRecord {
                life: Life::Alive,
                status: (EntityStatus::Pending, String::new()),
                instance_id: params.instance_id.map(InstanceId::new),
                is_manual: params.is_manual,
                is_manager: params.is_manager,
            },
        );
        inner.notify_machines(vec![id.to_string()]);
    }

    pub fn add_service(&self, name: &str) {
        let mut inner = lock(&self.inner);
        inner.services.insert(name.to_string(), ServiceRecord { life: Life::Alive });
    }

    /// Add a principal unit of `service`, optionally assigned to a machine.
    pub fn add_unit(&self, service: &str, name: &str, machine: Option<&str>) {
        self.insert_unit(service, name, machine, true);
    }

    pub fn add_subordinate_unit(&self, service: &str, name: &str, machine: Option<&str>) {
        self.insert_unit(service, name, machine, false);
    }

    fn insert_unit(&self, service: &str, name: &str, machine: Option<&str>, is_principal: bool) {
        let mut inner = lock(&self.inner);
        inner.units.insert(
            name.to_string(),
            UnitRecord {
                service: service.to_string(),
                machine: machine.map(str::to_string),
                life: Life::Alive,
                is_principal,
                status: (EntityStatus::Pending, String::new()),
            },
        );
        if let Some(mid) = machine {
            let names = vec![name.to_string()];
            inner.notify_units(mid, names);
        }
    }

    /// When set, destroying a unit removes it from the backend immediately,
    /// simulating an agent that completes its cleanup promptly.
    pub fn set_remove_units_on_destroy(&self, on: bool) {
        lock(&self.inner).remove_units_on_destroy = on;
    }

    /// Update one environment config key and pulse the config watchers.
    pub fn set_environ_config_value(&self, key: &str, value: serde_json::Value) {
        let mut inner = lock(&self.inner);
        inner.env_config.insert(key.to_string(), value);
        inner.notify_config();
    }

    // Test accessors. These read the backend directly, bypassing the
    // facade layer, so assertions do not disturb watcher state.

    pub fn env_life_now(&self) -> Life {
        lock(&self.inner).env_life
    }

    pub fn machine_life_now(&self, id: &str) -> Option<Life> {
        lock(&self.inner).machines.get(id).map(|m| m.life)
    }

    pub fn unit_life_now(&self, name: &str) -> Option<Life> {
        lock(&self.inner).units.get(name).map(|u| u.life)
    }

    pub fn service_life_now(&self, name: &str) -> Option<Life> {
        lock(&self.inner).services.get(name).map(|s| s.life)
    }

    pub fn has_unit(&self, name: &str) -> bool {
        lock(&self.inner).units.contains_key(name)
    }

    pub fn machine_status_now(&self, id: &str) -> Option<(EntityStatus, String)> {
        lock(&self.inner).machines.get(id).map(|m| m.status.clone())
    }

    pub fn unit_status_now(&self, name: &str) -> Option<(EntityStatus, String)> {
        lock(&self.inner).units.get(name).map(|u| u.status.clone())
    }
}

// =============================================================================
// Entity handles
// =============================================================================

struct MemoryMachine {
    id: String,
    inner: Arc<StdMutex<StateInner>>,
}

impl MemoryMachine {
    fn with_record<T>(&self, f: impl FnOnce(&MachineRecord) -> T) -> Result<T, Error> {
        let inner = lock(&self.inner);
        let record = inner
            .machines
            .get(&self.id)
            .ok_or_else(|| Error::not_found(format!("machine {}", self.id)))?;
        Ok(f(record))
    }
}

#[async_trait]
impl StateEntity for MemoryMachine {
    fn tag(&self) -> Tag {
        Tag::machine(self.id.as_str())
    }

    async fn life(&self) -> Result<Life, Error> {
        self.with_record(|m| m.life)
    }
}

#[async_trait]
impl MachineEntity for MemoryMachine {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn instance_id(&self) -> Result<InstanceId, Error> {
        self.with_record(|m| m.instance_id.clone())?.ok_or(Error::NotProvisioned {
            tag: Tag::machine(self.id.as_str()).to_string(),
        })
    }

    async fn is_manual(&self) -> Result<bool, Error> {
        self.with_record(|m| m.is_manual)
    }

    async fn is_manager(&self) -> Result<bool, Error> {
        self.with_record(|m| m.is_manager)
    }

    async fn unit_names(&self) -> Result<Vec<String>, Error> {
        let inner = lock(&self.inner);
        if !inner.machines.contains_key(&self.id) {
            return Err(Error::not_found(format!("machine {}", self.id)));
        }
        Ok(inner
            .units
            .iter()
            .filter(|(_, u)| u.machine.as_deref() == Some(self.id.as_str()))
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn set_status(&self, status: EntityStatus, info: &str) -> Result<(), Error> {
        let mut inner = lock(&self.inner);
        let record = inner
            .machines
            .get_mut(&self.id)
            .ok_or_else(|| Error::not_found(format!("machine {}", self.id)))?;
        record.status = (status, info.to_string());
        let tag = Tag::machine(self.id.as_str());
        inner.notify_entity(&tag);
        Ok(())
    }

    async fn destroy(&self) -> Result<(), Error> {
        let mut inner = lock(&self.inner);
        let assigned: Vec<String> = inner
            .units
            .iter()
            .filter(|(_, u)| u.machine.as_deref() == Some(self.id.as_str()))
            .map(|(name, _)| name.clone())
            .collect();
        let record = inner
            .machines
            .get_mut(&self.id)
            .ok_or_else(|| Error::not_found(format!("machine {}", self.id)))?;
        if record.is_manager {
            return Err(Error::backend(format!("machine {} is required by the environment", self.id)));
        }
        if let Some(unit) = assigned.first() {
            return Err(Error::backend(format!("machine {} has unit \"{unit}\" assigned", self.id)));
        }
        if record.life == Life::Alive {
            record.life = Life::Dying;
        }
        let id = self.id.clone();
        inner.notify_machines(vec![id]);
        let tag = Tag::machine(self.id.as_str());
        inner.notify_entity(&tag);
        Ok(())
    }

    async fn ensure_dead(&self) -> Result<(), Error> {
        let mut inner = lock(&self.inner);
        let record = inner
            .machines
            .get_mut(&self.id)
            .ok_or_else(|| Error::not_found(format!("machine {}", self.id)))?;
        record.life = Life::Dead;
        let id = self.id.clone();
        inner.notify_machines(vec![id]);
        let tag = Tag::machine(self.id.as_str());
        inner.notify_entity(&tag);
        Ok(())
    }
}

struct MemoryUnit {
    name: String,
    service: String,
    inner: Arc<StdMutex<StateInner>>,
}

impl MemoryUnit {
    fn with_record<T>(&self, f: impl FnOnce(&UnitRecord) -> T) -> Result<T, Error> {
        let inner = lock(&self.inner);
        let record = inner
            .units
            .get(&self.name)
            .ok_or_else(|| Error::not_found(format!("unit {}", self.name)))?;
        Ok(f(record))
    }
}

#[async_trait]
impl StateEntity for MemoryUnit {
    fn tag(&self) -> Tag {
        Tag::unit(&self.name)
    }

    async fn life(&self) -> Result<Life, Error> {
        self.with_record(|u| u.life)
    }
}

#[async_trait]
impl UnitEntity for MemoryUnit {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn service_name(&self) -> String {
        self.service.clone()
    }

    async fn is_principal(&self) -> Result<bool, Error> {
        self.with_record(|u| u.is_principal)
    }

    async fn set_status(&self, status: EntityStatus, info: &str) -> Result<(), Error> {
        let mut inner = lock(&self.inner);
        let record = inner
            .units
            .get_mut(&self.name)
            .ok_or_else(|| Error::not_found(format!("unit {}", self.name)))?;
        record.status = (status, info.to_string());
        let tag = Tag::unit(&self.name);
        inner.notify_entity(&tag);
        Ok(())
    }

    async fn destroy(&self) -> Result<(), Error> {
        let mut inner = lock(&self.inner);
        let remove = inner.remove_units_on_destroy;
        let machine = {
            let record = inner
                .units
                .get_mut(&self.name)
                .ok_or_else(|| Error::not_found(format!("unit {}", self.name)))?;
            if remove {
                record.life = Life::Dead;
            } else if record.life == Life::Alive {
                record.life = Life::Dying;
            }
            record.machine.clone()
        };
        if remove {
            inner.units.remove(&self.name);
        }
        if let Some(mid) = machine {
            let names = vec![self.name.clone()];
            inner.notify_units(&mid, names);
        }
        let tag = Tag::unit(&self.name);
        inner.notify_entity(&tag);
        Ok(())
    }

    async fn ensure_dead(&self) -> Result<(), Error> {
        let mut inner = lock(&self.inner);
        let record = inner
            .units
            .get_mut(&self.name)
            .ok_or_else(|| Error::not_found(format!("unit {}", self.name)))?;
        record.life = Life::Dead;
        let tag = Tag::unit(&self.name);
        inner.notify_entity(&tag);
        Ok(())
    }
}

struct MemoryService {
    name: String,
    inner: Arc<StdMutex<StateInner>>,
}

#[async_trait]
impl StateEntity for MemoryService {
    fn tag(&self) -> Tag {
        Tag::service(self.name.as_str())
    }

    async fn life(&self) -> Result<Life, Error> {
        let inner = lock(&self.inner);
        inner
            .services
            .get(&self.name)
            .map(|s| s.life)
            .ok_or_else(|| Error::not_found(format!("service {}", self.name)))
    }
}

#[async_trait]
impl ServiceEntity for MemoryService {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn destroy(&self) -> Result<(), Error> {
        let mut inner = lock(&self.inner);
        let record = inner
            .services
            .get_mut(&self.name)
            .ok_or_else(|| Error::not_found(format!("service {}", self.name)))?;
        if record.life == Life::Alive {
            record.life = Life::Dying;
        }
        let tag = Tag::service(self.name.as_str());
        inner.notify_entity(&tag);
        Ok(())
    }
}

struct MemoryEnvironment {
    inner: Arc<StdMutex<StateInner>>,
}

#[async_trait]
impl StateEntity for MemoryEnvironment {
    fn tag(&self) -> Tag {
        Tag::environment(TEST_ENV_UUID)
    }

    async fn life(&self) -> Result<Life, Error> {
        Ok(lock(&self.inner).env_life)
    }
}

#[async_trait]
impl EnvironmentEntity for MemoryEnvironment {
    async fn destroy(&self) -> Result<(), Error> {
        let mut inner = lock(&self.inner);
        if inner.env_life == Life::Alive {
            inner.env_life = Life::Dying;
            // Scheduled cleanup of dependents: services stop accepting new
            // units the moment the environment starts dying.
            for service in inner.services.values_mut() {
                if service.life == Life::Alive {
                    service.life = Life::Dying;
                }
            }
        }
        let tag = Tag::environment(TEST_ENV_UUID);
        inner.notify_entity(&tag);
        Ok(())
    }

    async fn ensure_dead(&self) -> Result<(), Error> {
        let mut inner = lock(&self.inner);
        inner.env_life = Life::Dead;
        let tag = Tag::environment(TEST_ENV_UUID);
        inner.notify_entity(&tag);
        Ok(())
    }
}

// =============================================================================
// StateBackend implementation
// =============================================================================

#[async_trait]
impl StateBackend for MemoryState {
    async fn find_entity(&self, tag: &Tag) -> Result<Entity, Error> {
        match tag.kind() {
            TagKind::Machine => Ok(Entity::Machine(self.machine(tag.id()).await?)),
            TagKind::Unit => {
                let name = tag
                    .unit_name()
                    .ok_or_else(|| Error::InvalidTag { tag: tag.to_string() })?;
                Ok(Entity::Unit(self.unit(&name).await?))
            }
            TagKind::Service => Ok(Entity::Service(self.service(tag.id()).await?)),
            TagKind::Environment => {
                if tag.id() != TEST_ENV_UUID {
                    return Err(Error::not_found(format!("environment {}", tag.id())));
                }
                Ok(Entity::Environment(self.environment().await?))
            }
            kind => Err(Error::not_found(format!("{kind} {}", tag.id()))),
        }
    }

    async fn machine(&self, id: &str) -> Result<Arc<dyn MachineEntity>, Error> {
        let inner = lock(&self.inner);
        if !inner.machines.contains_key(id) {
            return Err(Error::not_found(format!("machine {id}")));
        }
        Ok(Arc::new(MemoryMachine {
            id: id.to_string(),
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn unit(&self, name: &str) -> Result<Arc<dyn UnitEntity>, Error> {
        let inner = lock(&self.inner);
        let record = inner
            .units
            .get(name)
            .ok_or_else(|| Error::not_found(format!("unit {name}")))?;
        Ok(Arc::new(MemoryUnit {
            name: name.to_string(),
            service: record.service.clone(),
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn service(&self, name: &str) -> Result<Arc<dyn ServiceEntity>, Error> {
        let inner = lock(&self.inner);
        if !inner.services.contains_key(name) {
            return Err(Error::not_found(format!("service {name}")));
        }
        Ok(Arc::new(MemoryService {
            name: name.to_string(),
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn environment(&self) -> Result<Arc<dyn EnvironmentEntity>, Error> {
        Ok(Arc::new(MemoryEnvironment {
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn all_machines(&self) -> Result<Vec<Arc<dyn MachineEntity>>, Error> {
        let ids: Vec<String> = lock(&self.inner).machines.keys().cloned().collect();
        Ok(ids
            .into_iter()
            .map(|id| {
                Arc::new(MemoryMachine {
                    id,
                    inner: Arc::clone(&self.inner),
                }) as Arc<dyn MachineEntity>
            })
            .collect())
    }

    async fn all_units(&self) -> Result<Vec<Arc<dyn UnitEntity>>, Error> {
        let pairs: Vec<(String, String)> = lock(&self.inner)
            .units
            .iter()
            .map(|(name, u)| (name.clone(), u.service.clone()))
            .collect();
        Ok(pairs
            .into_iter()
            .map(|(name, service)| {
                Arc::new(MemoryUnit {
                    name,
                    service,
                    inner: Arc::clone(&self.inner),
                }) as Arc<dyn UnitEntity>
            })
            .collect())
    }

    async fn all_services(&self) -> Result<Vec<Arc<dyn ServiceEntity>>, Error> {
        let names: Vec<String> = lock(&self.inner).services.keys().cloned().collect();
        Ok(names
            .into_iter()
            .map(|name| {
                Arc::new(MemoryService {
                    name,
                    inner: Arc::clone(&self.inner),
                }) as Arc<dyn ServiceEntity>
            })
            .collect())
    }

    async fn environ_config(&self) -> Result<EnvironConfig, Error> {
        Ok(lock(&self.inner).env_config.clone())
    }

    async fn watch_entity(&self, tag: &Tag) -> Result<NotifyWatcher, Error> {
        self.find_entity(tag).await?;
        let (tx, watcher) = channel(WATCH_BUFFER);
        tx.try_send(());
        let mut inner = lock(&self.inner);
        inner.entity_watchers.push((tag.clone(), tx));
        Ok(watcher)
    }

    async fn watch_environ_machines(&self) -> Result<StringsWatcher, Error> {
        let (tx, watcher) = channel(WATCH_BUFFER);
        let mut inner = lock(&self.inner);
        let ids: Vec<String> = inner.machines.keys().cloned().collect();
        tx.try_send(ids);
        inner.machine_watchers.push(tx);
        Ok(watcher)
    }

    async fn watch_units(&self, machine_id: &str) -> Result<StringsWatcher, Error> {
        let (tx, watcher) = channel(WATCH_BUFFER);
        let mut inner = lock(&self.inner);
        if !inner.machines.contains_key(machine_id) {
            return Err(Error::not_found(format!("machine {machine_id}")));
        }
        let names: Vec<String> = inner
            .units
            .iter()
            .filter(|(_, u)| u.machine.as_deref() == Some(machine_id))
            .map(|(name, _)| name.clone())
            .collect();
        tx.try_send(names);
        inner.unit_watchers.push((machine_id.to_string(), tx));
        Ok(watcher)
    }

    async fn watch_environ_config(&self) -> Result<NotifyWatcher, Error> {
        let (tx, watcher) = channel(WATCH_BUFFER);
        tx.try_send(());
        let mut inner = lock(&self.inner);
        inner.config_watchers.push(tx);
        Ok(watcher)
    }
}

// =============================================================================
// Provider and runner doubles
// =============================================================================

/// Records every bulk-termination request; optionally fails them all.
#[derive(Default)]
pub struct StaticInstanceBroker {
    calls: StdMutex<Vec<Vec<InstanceId>>>,
    fail_with: StdMutex<Option<String>>,
}

impl StaticInstanceBroker {
    pub fn new() -> StaticInstanceBroker {
        StaticInstanceBroker::default()
    }

    /// Make every subsequent `stop_instances` call fail with this reason.
    pub fn fail_with(&self, reason: &str) {
        match self.fail_with.lock() {
            Ok(mut slot) => *slot = Some(reason.to_string()),
            Err(poisoned) => *poisoned.into_inner() = Some(reason.to_string()),
        }
    }

    /// Every batch passed to `stop_instances`, in call order.
    pub fn stopped(&self) -> Vec<Vec<InstanceId>> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// All stopped instance ids, flattened in call order.
    pub fn stopped_flat(&self) -> Vec<InstanceId> {
        self.stopped().into_iter().flatten().collect()
    }
}

#[async_trait]
impl InstanceBroker for StaticInstanceBroker {
    async fn stop_instances(&self, ids: &[InstanceId]) -> Result<(), Error> {
        let fail = match self.fail_with.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        if let Some(reason) = fail {
            return Err(Error::backend(reason));
        }
        match self.calls.lock() {
            Ok(mut calls) => calls.push(ids.to_vec()),
            Err(poisoned) => poisoned.into_inner().push(ids.to_vec()),
        }
        Ok(())
    }
}

/// Echoes commands back as stdout, prefixed with the target tag.
#[derive(Default)]
pub struct EchoRunner {
    fail_targets: StdMutex<Vec<String>>,
}

impl EchoRunner {
    pub fn new() -> EchoRunner {
        EchoRunner::default()
    }

    /// Make runs against this target tag fail.
    pub fn fail_target(&self, tag: &str) {
        match self.fail_targets.lock() {
            Ok(mut targets) => targets.push(tag.to_string()),
            Err(poisoned) => poisoned.into_inner().push(tag.to_string()),
        }
    }
}

#[async_trait]
impl CommandRunner for EchoRunner {
    async fn run(&self, target: &Tag, commands: &str, _timeout: Duration) -> Result<ExecOutput, Error> {
        let failing = match self.fail_targets.lock() {
            Ok(targets) => targets.contains(&target.to_string()),
            Err(poisoned) => poisoned.into_inner().contains(&target.to_string()),
        };
        if failing {
            return Err(Error::backend(format!("cannot reach {target}")));
        }
        Ok(ExecOutput {
            stdout: format!("{target}: {commands}"),
            stderr: String::new(),
            code: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn find_entity_resolves_each_kind() {
        let state = MemoryState::new();
        state.add_machine("0", Some("i-0"));
        state.add_service("mysql");
        state.add_unit("mysql", "mysql/0", Some("0"));

        assert!(matches!(
            state.find_entity(&Tag::machine("0")).await.unwrap(),
            Entity::Machine(_)
        ));
        assert!(matches!(state.find_entity(&Tag::unit("mysql/0")).await.unwrap(), Entity::Unit(_)));
        assert!(matches!(
            state.find_entity(&Tag::service("mysql")).await.unwrap(),
            Entity::Service(_)
        ));
        assert!(matches!(
            state.find_entity(&Tag::environment(TEST_ENV_UUID)).await.unwrap(),
            Entity::Environment(_)
        ));
    }

    #[tokio::test]
    async fn find_entity_not_found_message() {
        let state = MemoryState::new();
        let err = state.find_entity(&Tag::machine("42")).await.err().unwrap();
        assert_eq!(err.to_string(), "machine 42 not found");
    }

    #[tokio::test]
    async fn destroy_machine_with_unit_fails() {
        let state = MemoryState::new();
        state.add_machine("0", Some("i-0"));
        state.add_service("wordpress");
        state.add_unit("wordpress", "wordpress/0", Some("0"));

        let machine = state.machine("0").await.unwrap();
        let err = machine.destroy().await.unwrap_err();
        assert_eq!(err.to_string(), "machine 0 has unit \"wordpress/0\" assigned");
        assert_eq!(state.machine_life_now("0"), Some(Life::Alive));
    }

    #[tokio::test]
    async fn destroy_manager_machine_fails() {
        let state = MemoryState::new();
        state.add_machine_with(
            "1",
            MachineParams {
                is_manager: true,
                ..MachineParams::default()
            },
        );
        let machine = state.machine("1").await.unwrap();
        let err = machine.destroy().await.unwrap_err();
        assert_eq!(err.to_string(), "machine 1 is required by the environment");
    }

    #[tokio::test]
    async fn environment_destroy_marks_services_dying() {
        let state = MemoryState::new();
        state.add_service("mysql");
        let env = state.environment().await.unwrap();
        env.destroy().await.unwrap();
        assert_eq!(state.env_life_now(), Life::Dying);
        assert_eq!(state.service_life_now("mysql"), Some(Life::Dying));
        // Idempotent re-entry.
        env.destroy().await.unwrap();
        assert_eq!(state.env_life_now(), Life::Dying);
    }

    #[tokio::test]
    async fn unprovisioned_machine_instance_id() {
        let state = MemoryState::new();
        state.add_machine("0", None);
        let machine = state.machine("0").await.unwrap();
        let err = machine.instance_id().await.unwrap_err();
        assert!(err.is_not_provisioned());
    }

    #[tokio::test]
    async fn machine_watcher_sees_snapshot_then_changes() {
        let state = MemoryState::new();
        state.add_machine("0", Some("i-0"));
        state.add_machine("1", Some("i-1"));

        let watcher = state.watch_environ_machines().await.unwrap();
        assert_eq!(watcher.next().await.unwrap(), vec!["0".to_string(), "1".to_string()]);

        state.add_machine("2", Some("i-2"));
        assert_eq!(watcher.next().await.unwrap(), vec!["2".to_string()]);
    }

    #[tokio::test]
    async fn destroyed_unit_is_removed_when_configured() {
        let state = MemoryState::new();
        state.add_service("mysql");
        state.add_unit("mysql", "mysql/0", None);
        state.set_remove_units_on_destroy(true);

        let unit = state.unit("mysql/0").await.unwrap();
        unit.destroy().await.unwrap();
        assert!(!state.has_unit("mysql/0"));
        assert!(state.unit("mysql/0").await.is_err());
    }
}
