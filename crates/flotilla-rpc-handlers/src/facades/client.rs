//! The administrative client facade.
//!
//! Handles: DestroyEnvironment, DestroySystem, DestroyMachines,
//! DestroyUnits, Run, RunOnAllMachines, EnvironConfig,
//! WatchEnvironMachines.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use flotilla_api::ApiRequest;
use flotilla_api::ApiResponse;
use flotilla_api::DestroyMachinesArgs;
use flotilla_api::DestroySystemArgs;
use flotilla_api::DestroyUnitsArgs;
use flotilla_api::RunArgs;
use flotilla_api::RunOnAllMachinesArgs;
use flotilla_core::CommandRunner;
use flotilla_core::Error;
use flotilla_core::InstanceBroker;
use flotilla_core::MachineEntity;
use flotilla_core::StateBackend;
use flotilla_core::StateEntity;
use flotilla_core::Tag;
use flotilla_core::UnitEntity;
use flotilla_rpc_core::aggregate_destroy_errors;
use flotilla_rpc_core::ApiConfig;
use flotilla_rpc_core::ConnectionContext;
use flotilla_rpc_core::Facade;
use flotilla_rpc_core::FacadeFactory;
use flotilla_rpc_core::ResourceRegistry;
use flotilla_rpc_core::submit_facade_factory;
use tracing::info;

use crate::common::EnvironConfigWatcher;
use crate::common::EnvironMachinesWatcher;
use crate::exec::run_on_targets;
use crate::teardown;
use crate::teardown::DrainBudget;

/// Facade for administrative clients.
pub struct ClientFacade {
    state: Arc<dyn StateBackend>,
    instances: Arc<dyn InstanceBroker>,
    runner: Arc<dyn CommandRunner>,
    config: ApiConfig,
    machines_watcher: EnvironMachinesWatcher,
    config_watcher: EnvironConfigWatcher,
}

impl ClientFacade {
    pub fn new(ctx: &ConnectionContext) -> ClientFacade {
        let state = Arc::clone(&ctx.state);
        let resources: Arc<ResourceRegistry> = Arc::clone(&ctx.resources);
        ClientFacade {
            state: Arc::clone(&state),
            instances: Arc::clone(&ctx.instances),
            runner: Arc::clone(&ctx.runner),
            config: ctx.config.clone(),
            machines_watcher: EnvironMachinesWatcher::new(Arc::clone(&state), Arc::clone(&resources)),
            config_watcher: EnvironConfigWatcher::new(state, resources),
        }
    }

    async fn destroy_machines(&self, args: &DestroyMachinesArgs) -> Result<(), Error> {
        let mut errors = Vec::new();
        for id in &args.machine_ids {
            let outcome = match self.state.machine(id).await {
                Ok(machine) => machine.destroy().await,
                Err(err) => Err(err),
            };
            if let Err(err) = outcome {
                errors.push(err.to_string());
            }
        }
        aggregate_destroy_errors("machines", args.machine_ids.len(), errors)
    }

    async fn destroy_units(&self, args: &DestroyUnitsArgs) -> Result<(), Error> {
        let mut errors = Vec::new();
        for name in &args.unit_names {
            let outcome = match self.state.unit(name).await {
                Ok(unit) => unit.destroy().await,
                Err(err) => Err(err),
            };
            if let Err(err) = outcome {
                errors.push(err.to_string());
            }
        }
        aggregate_destroy_errors("units", args.unit_names.len(), errors)
    }

    async fn destroy_system(&self, args: &DestroySystemArgs) -> Result<(), Error> {
        let drain = args.drain_timeout_ms.map(|ms| DrainBudget {
            total: Duration::from_millis(ms),
            poll_interval: self.config.removal_poll_interval(),
        });
        teardown::destroy_system(&self.state, &self.instances, drain).await
    }

    async fn run(&self, args: &RunArgs) -> ApiResponse {
        let timeout = args
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.config.exec_timeout());

        // Tags that do not parse still get a result slot; they just never
        // reach a worker.
        let mut targets = Vec::new();
        let mut failures = Vec::new();
        for raw in &args.targets {
            match Tag::parse(raw) {
                Ok(tag) => targets.push(tag),
                Err(err) => failures.push((raw.clone(), err)),
            }
        }

        let mut results = run_on_targets(Arc::clone(&self.runner), targets, args.commands.clone(), timeout).await;
        for (tag, err) in failures {
            results.results.push(flotilla_api::ExecResult {
                tag,
                stdout: String::new(),
                stderr: String::new(),
                code: -1,
                error: Some(flotilla_api::ErrorInfo::from(err)),
            });
        }
        results.results.sort_by(|a, b| a.tag.cmp(&b.tag));
        ApiResponse::Exec(results)
    }

    async fn run_on_all_machines(&self, args: &RunOnAllMachinesArgs) -> Result<ApiResponse, Error> {
        let timeout = args
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.config.exec_timeout());
        let targets: Vec<Tag> = self.state.all_machines().await?.iter().map(|m| m.tag()).collect();
        let results = run_on_targets(Arc::clone(&self.runner), targets, args.commands.clone(), timeout).await;
        Ok(ApiResponse::Exec(results))
    }
}

#[async_trait]
impl Facade for ClientFacade {
    fn name(&self) -> &'static str {
        "Client"
    }

    fn can_handle(&self, request: &ApiRequest) -> bool {
        matches!(
            request,
            ApiRequest::DestroyEnvironment
                | ApiRequest::DestroySystem(_)
                | ApiRequest::DestroyMachines(_)
                | ApiRequest::DestroyUnits(_)
                | ApiRequest::Run(_)
                | ApiRequest::RunOnAllMachines(_)
                | ApiRequest::EnvironConfig
                | ApiRequest::WatchEnvironMachines
        )
    }

    async fn handle(&self, request: ApiRequest, _id: &str) -> Result<ApiResponse> {
        match request {
            ApiRequest::DestroyEnvironment => {
                info!("client requested environment destruction");
                teardown::destroy_environment(&self.state, &self.instances).await?;
                Ok(ApiResponse::Empty)
            }
            ApiRequest::DestroySystem(args) => {
                info!("client requested full system destruction");
                self.destroy_system(&args).await?;
                Ok(ApiResponse::Empty)
            }
            ApiRequest::DestroyMachines(args) => {
                self.destroy_machines(&args).await?;
                Ok(ApiResponse::Empty)
            }
            ApiRequest::DestroyUnits(args) => {
                self.destroy_units(&args).await?;
                Ok(ApiResponse::Empty)
            }
            ApiRequest::Run(args) => Ok(self.run(&args).await),
            ApiRequest::RunOnAllMachines(args) => Ok(self.run_on_all_machines(&args).await?),
            ApiRequest::EnvironConfig => Ok(ApiResponse::EnvironConfig(self.config_watcher.environ_config().await?)),
            ApiRequest::WatchEnvironMachines => {
                Ok(ApiResponse::StringsWatch(self.machines_watcher.watch_environ_machines().await?))
            }
            _ => anyhow::bail!("request not handled by ClientFacade"),
        }
    }
}

/// Factory for [`ClientFacade`]: requires a client-user principal.
pub struct ClientFacadeFactory;

impl ClientFacadeFactory {
    pub const fn new() -> ClientFacadeFactory {
        ClientFacadeFactory
    }
}

impl FacadeFactory for ClientFacadeFactory {
    fn name(&self) -> &'static str {
        "Client"
    }

    fn create(&self, ctx: &ConnectionContext) -> Result<Arc<dyn Facade>, Error> {
        if !ctx.auth.auth_client() {
            return Err(Error::PermissionDenied);
        }
        Ok(Arc::new(ClientFacade::new(ctx)))
    }
}

submit_facade_factory!(ClientFacadeFactory);
