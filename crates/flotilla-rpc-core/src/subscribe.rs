//! The watcher-subscribe protocol.
//!
//! Remote callers cannot peek a stream non-destructively, so the initial
//! snapshot must be folded into the subscribe response: a second round
//! trip could race with the first change. Every `WatchX` endpoint
//! therefore:
//!
//! 1. blocks until the backend watcher yields its first batch (the
//!    snapshot) or closes;
//! 2. on closure-before-first, fails with the watcher's stored error (or
//!    a generic start failure) and registers nothing;
//! 3. otherwise registers the watcher and returns `(id, snapshot)` in the
//!    same response. Later polls on the id return only changes that
//!    occurred after step 1.

use std::sync::Arc;

use flotilla_core::Error;
use flotilla_core::NotifyWatcher;
use flotilla_core::StringsWatcher;

use crate::resources::ResourceRegistry;

/// Subscribe an identifier-batch watcher: consume the initial snapshot,
/// register, and hand both back.
pub async fn subscribe_strings(
    resources: &ResourceRegistry,
    watcher: StringsWatcher,
) -> Result<(String, Vec<String>), Error> {
    match watcher.next().await {
        Some(changes) => {
            let id = resources.register(Arc::new(watcher));
            Ok((id, changes))
        }
        None => Err(watcher.error().unwrap_or(Error::WatcherStartFailed)),
    }
}

/// Subscribe a pulse watcher: consume the initial pulse, register, and
/// hand back the id. The successful response itself is the snapshot
/// signal.
pub async fn subscribe_notify(resources: &ResourceRegistry, watcher: NotifyWatcher) -> Result<String, Error> {
    match watcher.next().await {
        Some(()) => Ok(resources.register(Arc::new(watcher))),
        None => Err(watcher.error().unwrap_or(Error::WatcherStartFailed)),
    }
}

#[cfg(test)]
mod tests {
    use flotilla_core::watch::channel;
    use flotilla_core::Watcher;

    use super::*;

    #[tokio::test]
    async fn strings_subscribe_returns_snapshot_and_registers() {
        let resources = ResourceRegistry::new();
        let (tx, watcher) = channel(4);
        assert!(tx.try_send(vec!["0".to_string(), "1".to_string()]));

        let (id, changes) = subscribe_strings(&resources, watcher).await.unwrap();
        assert_eq!(changes, vec!["0".to_string(), "1".to_string()]);
        assert_eq!(resources.count(), 1);

        // The snapshot is never re-delivered: the next poll only sees
        // changes sent after subscription.
        assert!(tx.send(vec!["2".to_string()]).await);
        let resource = resources.get(&id).unwrap();
        let watcher = resource.as_any().downcast_ref::<Watcher<Vec<String>>>().unwrap();
        assert_eq!(watcher.next().await.unwrap(), vec!["2".to_string()]);
    }

    #[tokio::test]
    async fn failed_start_registers_nothing() {
        let resources = ResourceRegistry::new();
        let (tx, watcher) = channel::<Vec<String>>(4);
        tx.fail(Error::backend("watch stream refused"));

        let err = subscribe_strings(&resources, watcher).await.unwrap_err();
        assert_eq!(err, Error::backend("watch stream refused"));
        assert_eq!(resources.count(), 0, "no orphaned resource after a failed subscribe");
    }

    #[tokio::test]
    async fn closed_without_error_reports_start_failure() {
        let resources = ResourceRegistry::new();
        let (tx, watcher) = channel::<()>(4);
        drop(tx);

        let err = subscribe_notify(&resources, watcher).await.unwrap_err();
        assert_eq!(err, Error::WatcherStartFailed);
        assert_eq!(resources.count(), 0);
    }

    #[tokio::test]
    async fn notify_subscribe_consumes_initial_pulse() {
        let resources = ResourceRegistry::new();
        let (tx, watcher) = channel(4);
        assert!(tx.try_send(()));

        let id = subscribe_notify(&resources, watcher).await.unwrap();
        let resource = resources.get(&id).unwrap();
        let watcher = resource.as_any().downcast_ref::<Watcher<()>>().unwrap();

        // Initial pulse was consumed at subscribe time; only a fresh pulse
        // wakes the poll.
        assert!(tx.try_send(()));
        assert_eq!(watcher.next().await, Some(()));
    }
}
