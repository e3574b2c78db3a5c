//! The uniter facade: the unit agent's view of its own unit.
//!
//! Lifecycle lookups are scoped to the agent's unit OR the service that
//! owns it (the owning service is resolved from the backend per call);
//! mutating endpoints stay strictly owner-scoped.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use flotilla_api::ApiRequest;
use flotilla_api::ApiResponse;
use flotilla_auth::factory_owner;
use flotilla_auth::factory_unit_or_owning_service;
use flotilla_core::Error;
use flotilla_rpc_core::submit_facade_factory;
use flotilla_rpc_core::ConnectionContext;
use flotilla_rpc_core::Facade;
use flotilla_rpc_core::FacadeFactory;

use crate::common::AgentEntityWatcher;
use crate::common::DeadEnsurer;
use crate::common::LifeGetter;
use crate::common::StatusSetter;

/// Facade for unit agents.
pub struct UniterFacade {
    life: LifeGetter,
    status: StatusSetter,
    dead: DeadEnsurer,
    watcher: AgentEntityWatcher,
}

impl UniterFacade {
    pub fn new(ctx: &ConnectionContext) -> UniterFacade {
        let owner = factory_owner(&ctx.auth);
        let unit_or_service = factory_unit_or_owning_service(&ctx.auth, Arc::clone(&ctx.state));
        UniterFacade {
            life: LifeGetter::new(Arc::clone(&ctx.state), unit_or_service),
            status: StatusSetter::new(Arc::clone(&ctx.state), owner.clone()),
            dead: DeadEnsurer::new(Arc::clone(&ctx.state), owner.clone()),
            watcher: AgentEntityWatcher::new(Arc::clone(&ctx.state), Arc::clone(&ctx.resources), owner),
        }
    }
}

#[async_trait]
impl Facade for UniterFacade {
    fn name(&self) -> &'static str {
        "Uniter"
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
            _ => anyhow::bail!("request not handled by UniterFacade"),
        }
    }
}

/// Factory for [`UniterFacade`]: requires a unit-agent principal.
pub struct UniterFacadeFactory;

impl UniterFacadeFactory {
    pub const fn new() -> UniterFacadeFactory {
        UniterFacadeFactory
    }
}

impl FacadeFactory for UniterFacadeFactory {
    fn name(&self) -> &'static str {
        "Uniter"
    }

    fn create(&self, ctx: &ConnectionContext) -> Result<Arc<dyn Facade>, Error> {
        if !ctx.auth.auth_unit_agent() {
            return Err(Error::PermissionDenied);
        }
        Ok(Arc::new(UniterFacade::new(ctx)))
    }
}

submit_facade_factory!(UniterFacadeFactory);
