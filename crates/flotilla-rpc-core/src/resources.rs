//! Per-connection resource registry.
//!
//! Live subscriptions, chiefly watchers, are registered here under
//! fresh, connection-scoped string ids and polled by later calls that
//! reference the id. The registry exclusively owns a resource once it is
//! registered; the facade that created it holds no further reference.
//!
//! Ids are monotonically increasing and never reused within a
//! connection's lifetime. Stopping is idempotent, and `stop_all` runs at
//! connection teardown (normal or not) so no backend watcher outlives its
//! client.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::MutexGuard;

use async_trait::async_trait;
use flotilla_core::Error;
use flotilla_core::Watcher;
use tracing::warn;

/// Any stoppable subscription that can live in the registry.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Release the resource. Must be safe to call more than once.
    async fn stop(&self) -> Result<(), Error>;

    /// Downcast support so facades can recover the concrete watcher type.
    fn as_any(&self) -> &dyn Any;
}

#[async_trait]
impl<T: Send + Sync + 'static> Resource for Watcher<T> {
    async fn stop(&self) -> Result<(), Error> {
        Watcher::stop(self);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct RegistryInner {
    next_id: u64,
    resources: HashMap<String, Arc<dyn Resource>>,
}

/// The per-connection table of live resources.
pub struct ResourceRegistry {
    inner: StdMutex<RegistryInner>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry {
    pub fn new() -> ResourceRegistry {
        ResourceRegistry {
            inner: StdMutex::new(RegistryInner {
                next_id: 1,
                resources: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a resource under a fresh id and transfer ownership to the
    /// registry.
    pub fn register(&self, resource: Arc<dyn Resource>) -> String {
        let mut inner = self.lock();
        let id = inner.next_id.to_string();
        inner.next_id += 1;
        inner.resources.insert(id.clone(), resource);
        id
    }

    /// Look up a live resource.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Resource>> {
        self.lock().resources.get(id).cloned()
    }

    /// Remove and stop a resource. Stopping an unknown (or already
    /// stopped) id is not an error.
    pub async fn stop(&self, id: &str) -> Result<(), Error> {
        let resource = self.lock().resources.remove(id);
        match resource {
            Some(resource) => resource.stop().await,
            None => Ok(()),
        }
    }

    /// Stop every resource still registered. Invoked when the owning
    /// connection terminates.
    pub async fn stop_all(&self) {
        let drained: Vec<(String, Arc<dyn Resource>)> = self.lock().resources.drain().collect();
        for (id, resource) in drained {
            if let Err(error) = resource.stop().await {
                warn!(resource_id = %id, %error, "failed to stop resource at connection teardown");
            }
        }
    }

    /// Number of live resources.
    pub fn count(&self) -> usize {
        self.lock().resources.len()
    }
}

#[cfg(test)]
mod tests {
    use flotilla_core::watch::channel;

    use super::*;

    #[tokio::test]
    async fn ids_are_monotonic_and_never_reused() {
        let registry = ResourceRegistry::new();
        let (_tx1, w1) = channel::<()>(4);
        let (_tx2, w2) = channel::<()>(4);

        let id1 = registry.register(Arc::new(w1));
        registry.stop(&id1).await.unwrap();
        let id2 = registry.register(Arc::new(w2));
        assert_ne!(id1, id2);
        assert!(id2.parse::<u64>().unwrap() > id1.parse::<u64>().unwrap());
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_get_misses_afterwards() {
        let registry = ResourceRegistry::new();
        let (_tx, watcher) = channel::<()>(4);
        let id = registry.register(Arc::new(watcher));
        assert!(registry.get(&id).is_some());

        registry.stop(&id).await.unwrap();
        assert!(registry.get(&id).is_none());
        // Second stop is fine.
        registry.stop(&id).await.unwrap();
        // Stopping a never-registered id is fine too.
        registry.stop("999").await.unwrap();
    }

    #[tokio::test]
    async fn stop_terminates_the_watcher() {
        let registry = ResourceRegistry::new();
        let (tx, watcher) = channel::<()>(4);
        let id = registry.register(Arc::new(watcher));
        registry.stop(&id).await.unwrap();
        assert!(!tx.send(()).await, "producer must observe the stop");
    }

    #[tokio::test]
    async fn stop_all_empties_the_registry() {
        let registry = ResourceRegistry::new();
        for _ in 0..3 {
            let (_tx, watcher) = channel::<Vec<String>>(4);
            registry.register(Arc::new(watcher));
        }
        assert_eq!(registry.count(), 3);
        registry.stop_all().await;
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn downcast_recovers_concrete_type() {
        let registry = ResourceRegistry::new();
        let (_tx, watcher) = channel::<Vec<String>>(4);
        let id = registry.register(Arc::new(watcher));

        let resource = registry.get(&id).unwrap();
        assert!(resource.as_any().downcast_ref::<Watcher<Vec<String>>>().is_some());
        assert!(resource.as_any().downcast_ref::<Watcher<()>>().is_none());
    }
}
