//! The firewaller facade: environment-wide machine and config
//! observation for the firewall worker.
//!
//! Requires an environment-manager principal. Machine endpoints accept
//! any machine tag without ownership restriction; lifecycle lookups also
//! accept unit and service tags, since the firewaller tracks exposure
//! across all three.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use flotilla_api::ApiRequest;
use flotilla_api::ApiResponse;
use flotilla_auth::auth_either;
use flotilla_auth::auth_for_tag_kind;
use flotilla_auth::factory_const;
use flotilla_auth::factory_for_tag_kind;
use flotilla_core::Error;
use flotilla_core::TagKind;
use flotilla_rpc_core::submit_facade_factory;
use flotilla_rpc_core::ConnectionContext;
use flotilla_rpc_core::Facade;
use flotilla_rpc_core::FacadeFactory;

use crate::common::EnvironConfigWatcher;
use crate::common::EnvironMachinesWatcher;
use crate::common::InstanceIdGetter;
use crate::common::LifeGetter;
use crate::common::UnitsWatcher;

/// Facade for the firewall worker.
pub struct FirewallerFacade {
    life: LifeGetter,
    instance_ids: InstanceIdGetter,
    units_watcher: UnitsWatcher,
    machines_watcher: EnvironMachinesWatcher,
    config_watcher: EnvironConfigWatcher,
}

impl FirewallerFacade {
    pub fn new(ctx: &ConnectionContext) -> FirewallerFacade {
        let machines = factory_for_tag_kind(TagKind::Machine);
        let any_entity = factory_const(auth_either(
            auth_for_tag_kind(TagKind::Unit),
            auth_either(auth_for_tag_kind(TagKind::Service), auth_for_tag_kind(TagKind::Machine)),
        ));
        FirewallerFacade {
            life: LifeGetter::new(Arc::clone(&ctx.state), any_entity),
            instance_ids: InstanceIdGetter::new(Arc::clone(&ctx.state), machines.clone()),
            units_watcher: UnitsWatcher::new(Arc::clone(&ctx.state), Arc::clone(&ctx.resources), machines),
            machines_watcher: EnvironMachinesWatcher::new(Arc::clone(&ctx.state), Arc::clone(&ctx.resources)),
            config_watcher: EnvironConfigWatcher::new(Arc::clone(&ctx.state), Arc::clone(&ctx.resources)),
        }
    }
}

#[async_trait]
impl Facade for FirewallerFacade {
    fn name(&self) -> &'static str {
        "Firewaller"
    }

    fn can_handle(&self, request: &ApiRequest) -> bool {
        matches!(
            request,
            ApiRequest::Life(_)
                | ApiRequest::InstanceId(_)
                | ApiRequest::WatchUnits(_)
                | ApiRequest::WatchEnvironMachines
                | ApiRequest::WatchForEnvironConfigChanges
                | ApiRequest::EnvironConfig
        )
    }

    async fn handle(&self, request: ApiRequest, _id: &str) -> Result<ApiResponse> {
        match request {
            ApiRequest::Life(args) => Ok(ApiResponse::Life(self.life.life(&args).await?)),
            ApiRequest::InstanceId(args) => Ok(ApiResponse::Strings(self.instance_ids.instance_id(&args).await?)),
            ApiRequest::WatchUnits(args) => {
                Ok(ApiResponse::StringsWatches(self.units_watcher.watch_units(&args).await?))
            }
            ApiRequest::WatchEnvironMachines => {
                Ok(ApiResponse::StringsWatch(self.machines_watcher.watch_environ_machines().await?))
            }
            ApiRequest::WatchForEnvironConfigChanges => Ok(ApiResponse::NotifyWatch(
                self.config_watcher.watch_for_environ_config_changes().await?,
            )),
            ApiRequest::EnvironConfig => Ok(ApiResponse::EnvironConfig(self.config_watcher.environ_config().await?)),
            _ => anyhow::bail!("request not handled by FirewallerFacade"),
        }
    }
}

/// Factory for [`FirewallerFacade`]: requires an environment manager.
pub struct FirewallerFacadeFactory;

impl FirewallerFacadeFactory {
    pub const fn new() -> FirewallerFacadeFactory {
        FirewallerFacadeFactory
    }
}

impl FacadeFactory for FirewallerFacadeFactory {
    fn name(&self) -> &'static str {
        "Firewaller"
    }

    fn create(&self, ctx: &ConnectionContext) -> Result<Arc<dyn Facade>, Error> {
        if !ctx.auth.auth_environ_manager() {
            return Err(Error::PermissionDenied);
        }
        Ok(Arc::new(FirewallerFacade::new(ctx)))
    }
}

submit_facade_factory!(FirewallerFacadeFactory);
