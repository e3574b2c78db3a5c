//! The keyupdater facade: authorized-key distribution to machine agents.
//!
//! Keys live in the environment configuration under `authorized-keys`,
//! one key per line. A machine agent may read and watch only its own
//! machine's keys; watching rides the environ-config pulse stream, since
//! that is the document the keys live in.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use flotilla_api::ApiRequest;
use flotilla_api::ApiResponse;
use flotilla_api::Entities;
use flotilla_api::ErrorInfo;
use flotilla_api::NotifyWatchResults;
use flotilla_api::StringsResult;
use flotilla_api::StringsResults;
use flotilla_auth::factory_owner;
use flotilla_auth::AuthFuncFactory;
use flotilla_core::Error;
use flotilla_core::StateBackend;
use flotilla_rpc_core::run_batch;
use flotilla_rpc_core::submit_facade_factory;
use flotilla_rpc_core::ConnectionContext;
use flotilla_rpc_core::Facade;
use flotilla_rpc_core::FacadeFactory;

/// Config key holding the newline-separated authorized keys.
const AUTHORIZED_KEYS_KEY: &str = "authorized-keys";

/// Facade for machine agents fetching SSH authorized keys.
pub struct KeyUpdaterFacade {
    state: Arc<dyn StateBackend>,
    get_auth: AuthFuncFactory,
    watcher: KeyWatcher,
}

impl KeyUpdaterFacade {
    pub fn new(ctx: &ConnectionContext) -> KeyUpdaterFacade {
        let owner = factory_owner(&ctx.auth);
        KeyUpdaterFacade {
            state: Arc::clone(&ctx.state),
            get_auth: owner.clone(),
            watcher: KeyWatcher {
                state: Arc::clone(&ctx.state),
                resources: Arc::clone(&ctx.resources),
                get_auth: owner,
            },
        }
    }

    async fn authorized_keys(&self, args: &Entities) -> Result<StringsResults, Error> {
        let auth = (self.get_auth)().await?;
        let tags: Vec<String> = args.tags().map(str::to_string).collect();
        let state = Arc::clone(&self.state);
        let slots = run_batch(&tags, &auth, move |tag| {
            let state = Arc::clone(&state);
            async move {
                // The tag is the agent's own machine; existence still has
                // to hold before its keys are handed out.
                state.find_entity(&tag).await?;
                let config = state.environ_config().await?;
                let keys = config
                    .get(AUTHORIZED_KEYS_KEY)
                    .and_then(|value| value.as_str())
                    .map(split_keys)
                    .unwrap_or_default();
                Ok(keys)
            }
        })
        .await;
        Ok(StringsResults {
            results: slots
                .into_iter()
                .map(|slot| match slot {
                    Ok(keys) => StringsResult {
                        result: Some(keys),
                        error: None,
                    },
                    Err(err) => StringsResult {
                        result: None,
                        error: Some(ErrorInfo::from(err)),
                    },
                })
                .collect(),
        })
    }
}

/// Per-machine key watching, delegated to the environ-config stream.
struct KeyWatcher {
    state: Arc<dyn StateBackend>,
    resources: Arc<flotilla_rpc_core::ResourceRegistry>,
    get_auth: AuthFuncFactory,
}

impl KeyWatcher {
    async fn watch_authorized_keys(&self, args: &Entities) -> Result<NotifyWatchResults, Error> {
        let auth = (self.get_auth)().await?;
        let tags: Vec<String> = args.tags().map(str::to_string).collect();
        let state = Arc::clone(&self.state);
        let resources = Arc::clone(&self.resources);
        let slots = run_batch(&tags, &auth, move |tag| {
            let state = Arc::clone(&state);
            let resources = Arc::clone(&resources);
            async move {
                state.find_entity(&tag).await?;
                let watcher = state.watch_environ_config().await?;
                flotilla_rpc_core::subscribe_notify(&resources, watcher).await
            }
        })
        .await;
        Ok(NotifyWatchResults {
            results: slots
                .into_iter()
                .map(|slot| match slot {
                    Ok(id) => flotilla_api::NotifyWatchResult {
                        watcher_id: Some(id),
                        error: None,
                    },
                    Err(err) => flotilla_api::NotifyWatchResult {
                        watcher_id: None,
                        error: Some(ErrorInfo::from(err)),
                    },
                })
                .collect(),
        })
    }
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_string).collect()
}

#[async_trait]
impl Facade for KeyUpdaterFacade {
    fn name(&self) -> &'static str {
        "KeyUpdater"
    }

    fn can_handle(&self, request: &ApiRequest) -> bool {
        matches!(request, ApiRequest::AuthorizedKeys(_) | ApiRequest::WatchAuthorizedKeys(_))
    }

    async fn handle(&self, request: ApiRequest, _id: &str) -> Result<ApiResponse> {
        match request {
            ApiRequest::AuthorizedKeys(args) => Ok(ApiResponse::StringsLists(self.authorized_keys(&args).await?)),
            ApiRequest::WatchAuthorizedKeys(args) => {
                Ok(ApiResponse::NotifyWatches(self.watcher.watch_authorized_keys(&args).await?))
            }
            _ => anyhow::bail!("request not handled by KeyUpdaterFacade"),
        }
    }
}

/// Factory for [`KeyUpdaterFacade`]: requires a machine-agent principal.
pub struct KeyUpdaterFacadeFactory;

impl KeyUpdaterFacadeFactory {
    pub const fn new() -> KeyUpdaterFacadeFactory {
        KeyUpdaterFacadeFactory
    }
}

impl FacadeFactory for KeyUpdaterFacadeFactory {
    fn name(&self) -> &'static str {
        "KeyUpdater"
    }

    fn create(&self, ctx: &ConnectionContext) -> Result<Arc<dyn Facade>, Error> {
        if !ctx.auth.auth_machine_agent() {
            return Err(Error::PermissionDenied);
        }
        Ok(Arc::new(KeyUpdaterFacade::new(ctx)))
    }
}

submit_facade_factory!(KeyUpdaterFacadeFactory);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keys_drops_blank_lines() {
        let keys = split_keys("ssh-ed25519 AAA alice\n\n  ssh-rsa BBB bob  \n");
        assert_eq!(keys, vec!["ssh-ed25519 AAA alice".to_string(), "ssh-rsa BBB bob".to_string()]);
    }
}
