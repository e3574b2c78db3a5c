//! Test context builder.
//!
//! Wires the deterministic in-memory collaborators from
//! `flotilla_core::test_support` into a [`ConnectionContext`] with a
//! chosen principal. Tests hold on to the concrete doubles for
//! assertions; the context only sees the trait objects.

use std::sync::Arc;

use flotilla_auth::Authorizer;
use flotilla_auth::Principal;
use flotilla_core::test_support::EchoRunner;
use flotilla_core::test_support::MemoryState;
use flotilla_core::test_support::StaticInstanceBroker;
use flotilla_core::CommandRunner;
use flotilla_core::InstanceBroker;
use flotilla_core::StateBackend;
use flotilla_core::Tag;
use flotilla_rpc_core::ApiConfig;
use flotilla_rpc_core::ConnectionContext;
use flotilla_rpc_core::ResourceRegistry;

/// Builder for test connection contexts.
pub struct TestContextBuilder {
    state: MemoryState,
    broker: Arc<StaticInstanceBroker>,
    runner: Arc<EchoRunner>,
    principal: Principal,
    config: ApiConfig,
}

impl Default for TestContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContextBuilder {
    pub fn new() -> TestContextBuilder {
        TestContextBuilder {
            state: MemoryState::new(),
            broker: Arc::new(StaticInstanceBroker::new()),
            runner: Arc::new(EchoRunner::new()),
            principal: Principal::Client {
                user: Tag::user("admin"),
            },
            config: ApiConfig::default(),
        }
    }

    pub fn with_state(mut self, state: MemoryState) -> Self {
        self.state = state;
        self
    }

    pub fn with_broker(mut self, broker: Arc<StaticInstanceBroker>) -> Self {
        self.broker = broker;
        self
    }

    pub fn with_runner(mut self, runner: Arc<EchoRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = principal;
        self
    }

    pub fn with_config(mut self, config: ApiConfig) -> Self {
        self.config = config;
        self
    }

    /// Shorthand: log in as a client user.
    pub fn as_client(self, user: &str) -> Self {
        self.with_principal(Principal::Client { user: Tag::user(user) })
    }

    /// Shorthand: log in as the machine agent for `machine_id`.
    pub fn as_machine_agent(self, machine_id: &str, manager: bool) -> Self {
        self.with_principal(Principal::MachineAgent {
            tag: Tag::machine(machine_id),
            manager,
        })
    }

    /// Shorthand: log in as the unit agent for `unit_name`.
    pub fn as_unit_agent(self, unit_name: &str) -> Self {
        self.with_principal(Principal::UnitAgent {
            tag: Tag::unit(unit_name),
        })
    }

    pub fn build(self) -> ConnectionContext {
        ConnectionContext {
            state: Arc::new(self.state) as Arc<dyn StateBackend>,
            instances: self.broker as Arc<dyn InstanceBroker>,
            runner: self.runner as Arc<dyn CommandRunner>,
            resources: Arc::new(ResourceRegistry::new()),
            auth: Arc::new(Authorizer::new(self.principal)),
            config: self.config,
        }
    }
}
