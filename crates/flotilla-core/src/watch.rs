//! Change-stream primitives.
//!
//! A [`Watcher`] is a live subscription to backend changes: a lazy,
//! non-restartable sequence of change batches. The backend seeds the stream
//! with one initial batch describing current state (the snapshot); every
//! later batch describes a delta. The stream terminates either with a final
//! stored error (backend failure) or with plain end-of-stream after a
//! deliberate [`Watcher::stop`].
//!
//! Two shapes cover every endpoint in the facade layer:
//! [`NotifyWatcher`] delivers a bare "something changed" pulse, and
//! [`StringsWatcher`] delivers batches of changed entity identifiers.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// Default channel depth for backend-produced watchers. Change batches are
/// coalesced upstream; a small buffer is enough to decouple producer bursts
/// from consumer polls.
pub const WATCH_BUFFER: usize = 16;

struct Shared {
    error: StdMutex<Option<Error>>,
    cancel: CancellationToken,
}

impl Shared {
    fn set_error(&self, err: Error) {
        let mut slot = match self.error.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        // First failure wins.
        slot.get_or_insert(err);
    }

    fn error(&self) -> Option<Error> {
        match self.error.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Consumer half of a change stream.
///
/// Reads are serialized through an internal async mutex so the watcher can
/// be shared as `Arc<Watcher<T>>` once registered; a watcher id is owned by
/// exactly one connection, so contention is not a concern.
pub struct Watcher<T> {
    rx: Mutex<mpsc::Receiver<T>>,
    shared: Arc<Shared>,
}

/// Producer half of a change stream, held by the state backend.
pub struct WatcherSender<T> {
    tx: mpsc::Sender<T>,
    shared: Arc<Shared>,
}

impl<T> Clone for WatcherSender<T> {
    fn clone(&self) -> Self {
        WatcherSender {
            tx: self.tx.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

/// A watcher that delivers a bare change pulse.
pub type NotifyWatcher = Watcher<()>;
/// A watcher that delivers batches of changed identifiers.
pub type StringsWatcher = Watcher<Vec<String>>;
pub type NotifySender = WatcherSender<()>;
pub type StringsSender = WatcherSender<Vec<String>>;

/// Create a connected producer/consumer pair with the given buffer depth.
pub fn channel<T>(buffer: usize) -> (WatcherSender<T>, Watcher<T>) {
    let (tx, rx) = mpsc::channel(buffer);
    let shared = Arc::new(Shared {
        error: StdMutex::new(None),
        cancel: CancellationToken::new(),
    });
    let sender = WatcherSender {
        tx,
        shared: Arc::clone(&shared),
    };
    let watcher = Watcher {
        rx: Mutex::new(rx),
        shared,
    };
    (sender, watcher)
}

impl<T> Watcher<T> {
    /// Wait for the next change batch.
    ///
    /// Returns `None` once the stream has terminated: either the producer
    /// went away (check [`Watcher::error`] for why) or [`Watcher::stop`] was
    /// called. A terminated stream never yields again.
    pub async fn next(&self) -> Option<T> {
        let mut rx = self.rx.lock().await;
        tokio::select! {
            biased;
            _ = self.shared.cancel.cancelled() => None,
            item = rx.recv() => item,
        }
    }

    /// Deliberately stop the stream. Pending and future [`Watcher::next`]
    /// calls return `None`; the producer observes the stop and quits.
    pub fn stop(&self) {
        self.shared.cancel.cancel();
    }

    /// The stored terminal error, if the producer failed.
    ///
    /// `None` after a deliberate stop or while the stream is still live.
    pub fn error(&self) -> Option<Error> {
        self.shared.error()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }
}

impl<T> WatcherSender<T> {
    /// Deliver a change batch, waiting for buffer space.
    ///
    /// Returns `false` once the consumer is gone or the stream was stopped;
    /// producers should quit when they see it.
    pub async fn send(&self, batch: T) -> bool {
        tokio::select! {
            biased;
            _ = self.shared.cancel.cancelled() => false,
            sent = self.tx.send(batch) => sent.is_ok(),
        }
    }

    /// Deliver a change batch without waiting. Used for the initial
    /// snapshot, which is always written into a fresh, empty buffer.
    pub fn try_send(&self, batch: T) -> bool {
        if self.shared.cancel.is_cancelled() {
            return false;
        }
        self.tx.try_send(batch).is_ok()
    }

    /// Record a terminal error and close the stream. The consumer's next
    /// read returns `None` and [`Watcher::error`] yields this error.
    pub fn fail(self, err: Error) {
        self.shared.set_error(err);
        // Dropping the sender closes the channel once sibling clones agree.
        drop(self.tx);
    }

    /// True once the consumer stopped the stream or dropped out.
    pub fn is_stopped(&self) -> bool {
        self.shared.cancel.is_cancelled() || self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_batches_in_order() {
        let (tx, rx) = channel(4);
        assert!(tx.send(vec!["a".to_string()]).await);
        assert!(tx.send(vec!["b".to_string()]).await);
        assert_eq!(rx.next().await.unwrap(), vec!["a".to_string()]);
        assert_eq!(rx.next().await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn stop_terminates_stream() {
        let (tx, rx) = channel::<()>(4);
        rx.stop();
        assert!(rx.next().await.is_none());
        assert!(rx.error().is_none(), "deliberate stop stores no error");
        assert!(!tx.send(()).await, "producer observes stop");
    }

    #[tokio::test]
    async fn producer_failure_surfaces_stored_error() {
        let (tx, rx) = channel::<()>(4);
        tx.fail(Error::backend("session expired"));
        assert!(rx.next().await.is_none());
        assert_eq!(rx.error(), Some(Error::backend("session expired")));
    }

    #[tokio::test]
    async fn terminated_stream_never_yields_again() {
        let (tx, rx) = channel(4);
        assert!(tx.send(1u32).await);
        drop(tx);
        assert_eq!(rx.next().await, Some(1));
        assert_eq!(rx.next().await, None);
        assert_eq!(rx.next().await, None);
    }

    #[tokio::test]
    async fn first_failure_wins() {
        let (tx, rx) = channel::<()>(4);
        let tx2 = tx.clone();
        tx.fail(Error::backend("first"));
        tx2.fail(Error::backend("second"));
        assert!(rx.next().await.is_none());
        assert_eq!(rx.error(), Some(Error::backend("first")));
    }
}
