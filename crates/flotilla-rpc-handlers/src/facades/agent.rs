//! The agent facade: self-service operations for machine and unit agents.
//!
//! Every endpoint is owner-scoped: an agent may only touch the entity it
//! runs as.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use flotilla_api::ApiRequest;
use flotilla_api::ApiResponse;
use flotilla_auth::factory_owner;
use flotilla_core::Error;
use flotilla_rpc_core::submit_facade_factory;
use flotilla_rpc_core::ConnectionContext;
use flotilla_rpc_core::Facade;
use flotilla_rpc_core::FacadeFactory;

use crate::common::AgentEntityWatcher;
use crate::common::DeadEnsurer;
use crate::common::LifeGetter;
use crate::common::StatusSetter;

/// Facade for machine and unit agents.
pub struct AgentFacade {
    life: LifeGetter,
    status: StatusSetter,
    dead: DeadEnsurer,
    watcher: AgentEntityWatcher,
}

impl AgentFacade {
    pub fn new(ctx: &ConnectionContext) -> AgentFacade {
        let owner = factory_owner(&ctx.auth);
        AgentFacade {
            life: LifeGetter::new(Arc::clone(&ctx.state), owner.clone()),
            status: StatusSetter::new(Arc::clone(&ctx.state), owner.clone()),
            dead: DeadEnsurer::new(Arc::clone(&ctx.state), owner.clone()),
            watcher: AgentEntityWatcher::new(Arc::clone(&ctx.state), Arc::clone(&ctx.resources), owner),
        }
    }
}

#[async_trait]
impl Facade for AgentFacade {
    fn name(&self) -> &'static str {
        "Agent"
    }

    fn can_handle(&self, request: &ApiRequest) -> bool {
        matches!(
            request,
            ApiRequest::Life(_) | ApiRequest::SetStatus(_) | ApiRequest::EnsureDead(_) | ApiRequest::Watch(_)
        )
    }

    async fn handle(&self, request: ApiRequest, _id: &str) -> Result<ApiResponse> {
        match request {
            ApiRequest::Life(args) => Ok(ApiResponse::Life(self.life.life(&args).await?)),
            ApiRequest::SetStatus(args) => Ok(ApiResponse::Errors(self.status.set_status(&args).await?)),
            ApiRequest::EnsureDead(args) => Ok(ApiResponse::Errors(self.dead.ensure_dead(&args).await?)),
            ApiRequest::Watch(args) => Ok(ApiResponse::NotifyWatches(self.watcher.watch(&args).await?)),
            _ => anyhow::bail!("request not handled by AgentFacade"),
        }
    }
}

/// Factory for [`AgentFacade`]: requires a machine-agent or unit-agent
/// principal.
pub struct AgentFacadeFactory;

impl AgentFacadeFactory {
    pub const fn new() -> AgentFacadeFactory {
        AgentFacadeFactory
    }
}

impl FacadeFactory for AgentFacadeFactory {
    fn name(&self) -> &'static str {
        "Agent"
    }

    fn create(&self, ctx: &ConnectionContext) -> Result<Arc<dyn Facade>, Error> {
        if !ctx.auth.auth_machine_agent() && !ctx.auth.auth_unit_agent() {
            return Err(Error::PermissionDenied);
        }
        Ok(Arc::new(AgentFacade::new(ctx)))
    }
}

submit_facade_factory!(AgentFacadeFactory);
