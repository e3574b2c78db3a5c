//! Watch capability mixins.
//!
//! Each `watch_*` endpoint follows the subscribe protocol: the initial
//! snapshot is consumed synchronously and folded into the response, then
//! the watcher lives in the connection's resource registry until stopped.

use std::sync::Arc;

use flotilla_api::Entities;
use flotilla_api::EnvironConfigResult;
use flotilla_api::ErrorInfo;
use flotilla_api::NotifyWatchResult;
use flotilla_api::NotifyWatchResults;
use flotilla_api::StringsWatchResult;
use flotilla_api::StringsWatchResults;
use flotilla_auth::AuthFuncFactory;
use flotilla_core::Error;
use flotilla_core::StateBackend;
use flotilla_core::TagKind;
use flotilla_rpc_core::subscribe_notify;
use flotilla_rpc_core::subscribe_strings;
use flotilla_rpc_core::ResourceRegistry;
use flotilla_rpc_core::run_batch;

/// Watches individual entities for document changes.
pub struct AgentEntityWatcher {
    state: Arc<dyn StateBackend>,
    resources: Arc<ResourceRegistry>,
    get_auth: AuthFuncFactory,
}

impl AgentEntityWatcher {
    pub fn new(
        state: Arc<dyn StateBackend>,
        resources: Arc<ResourceRegistry>,
        get_auth: AuthFuncFactory,
    ) -> AgentEntityWatcher {
        AgentEntityWatcher {
            state,
            resources,
            get_auth,
        }
    }

    pub async fn watch(&self, args: &Entities) -> Result<NotifyWatchResults, Error> {
        let auth = (self.get_auth)().await?;
        let tags: Vec<String> = args.tags().map(str::to_string).collect();
        let state = Arc::clone(&self.state);
        let resources = Arc::clone(&self.resources);
        let slots = run_batch(&tags, &auth, move |tag| {
            let state = Arc::clone(&state);
            let resources = Arc::clone(&resources);
            async move {
                let watcher = state.watch_entity(&tag).await?;
                subscribe_notify(&resources, watcher).await
            }
        })
        .await;
        Ok(NotifyWatchResults {
            results: slots.into_iter().map(to_notify_result).collect(),
        })
    }
}

/// Watches the units assigned to a batch of machines.
pub struct UnitsWatcher {
    state: Arc<dyn StateBackend>,
    resources: Arc<ResourceRegistry>,
    get_auth: AuthFuncFactory,
}

impl UnitsWatcher {
    pub fn new(state: Arc<dyn StateBackend>, resources: Arc<ResourceRegistry>, get_auth: AuthFuncFactory) -> UnitsWatcher {
        UnitsWatcher {
            state,
            resources,
            get_auth,
        }
    }

    pub async fn watch_units(&self, args: &Entities) -> Result<StringsWatchResults, Error> {
        let auth = (self.get_auth)().await?;
        let tags: Vec<String> = args.tags().map(str::to_string).collect();
        let state = Arc::clone(&self.state);
        let resources = Arc::clone(&self.resources);
        let slots = run_batch(&tags, &auth, move |tag| {
            let state = Arc::clone(&state);
            let resources = Arc::clone(&resources);
            async move {
                if tag.kind() != TagKind::Machine {
                    return Err(Error::backend(format!("{tag} is not a machine")));
                }
                let watcher = state.watch_units(tag.id()).await?;
                subscribe_strings(&resources, watcher).await
            }
        })
        .await;
        Ok(StringsWatchResults {
            results: slots.into_iter().map(to_strings_result).collect(),
        })
    }
}

/// Watches the set of machines in the environment.
pub struct EnvironMachinesWatcher {
    state: Arc<dyn StateBackend>,
    resources: Arc<ResourceRegistry>,
}

impl EnvironMachinesWatcher {
    pub fn new(state: Arc<dyn StateBackend>, resources: Arc<ResourceRegistry>) -> EnvironMachinesWatcher {
        EnvironMachinesWatcher { state, resources }
    }

    pub async fn watch_environ_machines(&self) -> Result<StringsWatchResult, Error> {
        let watcher = self.state.watch_environ_machines().await?;
        let (id, changes) = subscribe_strings(&self.resources, watcher).await?;
        Ok(StringsWatchResult {
            watcher_id: Some(id),
            changes,
            error: None,
        })
    }
}

/// Watches and reads the environment configuration.
pub struct EnvironConfigWatcher {
    state: Arc<dyn StateBackend>,
    resources: Arc<ResourceRegistry>,
}

impl EnvironConfigWatcher {
    pub fn new(state: Arc<dyn StateBackend>, resources: Arc<ResourceRegistry>) -> EnvironConfigWatcher {
        EnvironConfigWatcher { state, resources }
    }

    pub async fn watch_for_environ_config_changes(&self) -> Result<NotifyWatchResult, Error> {
        let watcher = self.state.watch_environ_config().await?;
        let id = subscribe_notify(&self.resources, watcher).await?;
        Ok(NotifyWatchResult {
            watcher_id: Some(id),
            error: None,
        })
    }

    pub async fn environ_config(&self) -> Result<EnvironConfigResult, Error> {
        Ok(EnvironConfigResult {
            config: self.state.environ_config().await?,
        })
    }
}

fn to_notify_result(slot: Result<String, Error>) -> NotifyWatchResult {
    match slot {
        Ok(id) => NotifyWatchResult {
            watcher_id: Some(id),
            error: None,
        },
        Err(err) => NotifyWatchResult {
            watcher_id: None,
            error: Some(ErrorInfo::from(err)),
        },
    }
}

fn to_strings_result(slot: Result<(String, Vec<String>), Error>) -> StringsWatchResult {
    match slot {
        Ok((id, changes)) => StringsWatchResult {
            watcher_id: Some(id),
            changes,
            error: None,
        },
        Err(err) => StringsWatchResult {
            watcher_id: None,
            changes: Vec::new(),
            error: Some(ErrorInfo::from(err)),
        },
    }
}
