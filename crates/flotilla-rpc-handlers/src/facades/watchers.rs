//! Watcher facades: polling and stopping registered watchers by id.
//!
//! Unlike every other facade these are instance-addressed: the facade id
//! is the resource id returned by the subscribe call. An unknown id, or
//! an id registered for a watcher of the other shape, is `BadId`. The
//! registry is connection-scoped, so ids never cross connections.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use flotilla_api::ApiRequest;
use flotilla_api::ApiResponse;
use flotilla_api::StringsWatchResult;
use flotilla_core::Error;
use flotilla_core::NotifyWatcher;
use flotilla_core::StringsWatcher;
use flotilla_rpc_core::submit_facade_factory;
use flotilla_rpc_core::ConnectionContext;
use flotilla_rpc_core::Facade;
use flotilla_rpc_core::FacadeFactory;
use flotilla_rpc_core::ResourceRegistry;

/// Polls pulse watchers.
pub struct NotifyWatcherFacade {
    resources: Arc<ResourceRegistry>,
}

#[async_trait]
impl Facade for NotifyWatcherFacade {
    fn name(&self) -> &'static str {
        "NotifyWatcher"
    }

    fn accepts_id(&self, id: &str) -> bool {
        !id.is_empty()
    }

    fn can_handle(&self, request: &ApiRequest) -> bool {
        matches!(request, ApiRequest::WatcherNext | ApiRequest::WatcherStop)
    }

    async fn handle(&self, request: ApiRequest, id: &str) -> Result<ApiResponse> {
        match request {
            ApiRequest::WatcherNext => {
                let resource = self.resources.get(id).ok_or_else(|| Error::BadId { id: id.to_string() })?;
                let watcher = resource
                    .as_any()
                    .downcast_ref::<NotifyWatcher>()
                    .ok_or_else(|| Error::BadId { id: id.to_string() })?;
                match watcher.next().await {
                    Some(()) => Ok(ApiResponse::Empty),
                    None => {
                        let err = watcher.error().unwrap_or(Error::Stopped);
                        let _ = self.resources.stop(id).await;
                        Err(err.into())
                    }
                }
            }
            ApiRequest::WatcherStop => {
                self.resources.stop(id).await?;
                Ok(ApiResponse::Empty)
            }
            _ => anyhow::bail!("request not handled by NotifyWatcherFacade"),
        }
    }
}

/// Polls identifier-batch watchers.
pub struct StringsWatcherFacade {
    resources: Arc<ResourceRegistry>,
}

#[async_trait]
impl Facade for StringsWatcherFacade {
    fn name(&self) -> &'static str {
        "StringsWatcher"
    }

    fn accepts_id(&self, id: &str) -> bool {
        !id.is_empty()
    }

    fn can_handle(&self, request: &ApiRequest) -> bool {
        matches!(request, ApiRequest::WatcherNext | ApiRequest::WatcherStop)
    }

    async fn handle(&self, request: ApiRequest, id: &str) -> Result<ApiResponse> {
        match request {
            ApiRequest::WatcherNext => {
                let resource = self.resources.get(id).ok_or_else(|| Error::BadId { id: id.to_string() })?;
                let watcher = resource
                    .as_any()
                    .downcast_ref::<StringsWatcher>()
                    .ok_or_else(|| Error::BadId { id: id.to_string() })?;
                match watcher.next().await {
                    Some(changes) => Ok(ApiResponse::StringsWatch(StringsWatchResult {
                        watcher_id: None,
                        changes,
                        error: None,
                    })),
                    None => {
                        let err = watcher.error().unwrap_or(Error::Stopped);
                        let _ = self.resources.stop(id).await;
                        Err(err.into())
                    }
                }
            }
            ApiRequest::WatcherStop => {
                self.resources.stop(id).await?;
                Ok(ApiResponse::Empty)
            }
            _ => anyhow::bail!("request not handled by StringsWatcherFacade"),
        }
    }
}

/// Factory for [`NotifyWatcherFacade`]: any authenticated principal; the
/// registry itself is connection-scoped, which is the real boundary.
pub struct NotifyWatcherFacadeFactory;

impl NotifyWatcherFacadeFactory {
    pub const fn new() -> NotifyWatcherFacadeFactory {
        NotifyWatcherFacadeFactory
    }
}

impl FacadeFactory for NotifyWatcherFacadeFactory {
    fn name(&self) -> &'static str {
        "NotifyWatcher"
    }

    fn create(&self, ctx: &ConnectionContext) -> Result<Arc<dyn Facade>, Error> {
        Ok(Arc::new(NotifyWatcherFacade {
            resources: Arc::clone(&ctx.resources),
        }))
    }
}

/// Factory for [`StringsWatcherFacade`].
pub struct StringsWatcherFacadeFactory;

impl StringsWatcherFacadeFactory {
    pub const fn new() -> StringsWatcherFacadeFactory {
        StringsWatcherFacadeFactory
    }
}

impl FacadeFactory for StringsWatcherFacadeFactory {
    fn name(&self) -> &'static str {
        "StringsWatcher"
    }

    fn create(&self, ctx: &ConnectionContext) -> Result<Arc<dyn Facade>, Error> {
        Ok(Arc::new(StringsWatcherFacade {
            resources: Arc::clone(&ctx.resources),
        }))
    }
}

submit_facade_factory!(NotifyWatcherFacadeFactory);
submit_facade_factory!(StringsWatcherFacadeFactory);
