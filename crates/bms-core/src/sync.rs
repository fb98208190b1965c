// ── Device state synchronizer ──
//
// Binds the local mirror to a remote store. Reads update the mirror on
// success and degrade to "no data" on failure. Writes update the mirror
// first, then go to a single writer task so they reach the store in
// the order they were issued.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::{StoreConfig, SyncOptions};
use crate::error::CoreError;
use crate::mirror::Mirror;
use crate::model::{StorePath, Value};
use crate::store::{RemoteStore, RtdbStore};
use crate::stream::Subscription;

/// Result of a [`Synchronizer::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The store acknowledged the write.
    Success,
    /// The store rejected the write. The mirror keeps the new value.
    Failure(String),
    /// Queued without waiting; completion is only logged.
    Pending,
}

impl WriteOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

enum WriteJob {
    Write {
        path: StorePath,
        value: Value,
        reply: Option<oneshot::Sender<Result<(), CoreError>>>,
    },
    Flush(oneshot::Sender<()>),
}

/// The main entry point for device state.
///
/// Cheaply cloneable via `Arc`; clones share the mirror and the write
/// queue. Must be created inside a tokio runtime.
#[derive(Clone)]
pub struct Synchronizer {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    store: Arc<dyn RemoteStore>,
    mirror: Arc<Mirror>,
    options: SyncOptions,
    write_tx: mpsc::UnboundedSender<WriteJob>,
}

impl Synchronizer {
    pub fn new(store: Arc<dyn RemoteStore>, options: SyncOptions) -> Self {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        tokio::spawn(write_task(Arc::clone(&store), write_rx));

        Self {
            inner: Arc::new(SyncInner {
                store,
                mirror: Arc::new(Mirror::new()),
                options,
                write_tx,
            }),
        }
    }

    /// Synchronizer over the realtime database described by `config`.
    pub fn connect(config: &StoreConfig) -> Result<Self, CoreError> {
        let store = RtdbStore::new(config)?;
        debug!(url = %config.database_url, "realtime database store ready");
        Ok(Self::new(Arc::new(store), config.sync))
    }

    pub fn mirror(&self) -> &Arc<Mirror> {
        &self.inner.mirror
    }

    pub fn options(&self) -> SyncOptions {
        self.inner.options
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Fetch the value at `path` once.
    ///
    /// `None` when nothing is stored or the store could not be reached;
    /// the failure is logged and the mirror is left alone.
    pub async fn read_once(&self, path: impl Into<StorePath> + Send) -> Option<Value> {
        let path = path.into();
        match self.try_read_once(&path).await {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path, error = %e, "read failed, treating as no data");
                None
            }
        }
    }

    /// Like [`read_once`](Self::read_once) but reports store failures.
    pub async fn try_read_once(&self, path: &StorePath) -> Result<Option<Value>, CoreError> {
        debug!(path = %path, "read once");
        let value = self.inner.store.read_once(path).await?;
        if let Some(v) = &value {
            self.inner.mirror.apply(path, v);
        }
        Ok(value)
    }

    /// Read once, falling back to `default` when nothing comes back.
    /// The resolved value is recorded in the mirror either way.
    pub async fn hydrate(&self, path: impl Into<StorePath> + Send, default: Value) -> Value {
        let path = path.into();
        if let Some(value) = self.read_once(path.clone()).await {
            return value;
        }
        self.inner.mirror.apply(&path, &default);
        default
    }

    /// Listen for every change at `path`.
    ///
    /// If the store refuses the listener the failure is logged and the
    /// returned subscription is already finished.
    pub async fn read_continuous(&self, path: impl Into<StorePath> + Send) -> Subscription {
        let path = path.into();
        let mirror = Arc::clone(&self.inner.mirror);
        match self.inner.store.read_continuous(&path).await {
            Ok(stream) => {
                debug!(path = %path, "continuous read started");
                Subscription::new(path, mirror, stream)
            }
            Err(e) => {
                warn!(path = %path, error = %e, "continuous read failed");
                Subscription::finished(path, mirror)
            }
        }
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Set `path` to `value`, replacing whatever was there.
    ///
    /// The mirror is updated immediately. Whether the call waits for the
    /// store depends on [`SyncOptions::ack_required`]. Failed writes are
    /// neither retried nor rolled back.
    pub async fn write(
        &self,
        path: impl Into<StorePath> + Send,
        value: impl Into<Value> + Send,
    ) -> WriteOutcome {
        if self.inner.options.ack_required {
            self.write_acked(path, value).await
        } else {
            self.write_detached(path, value)
        }
    }

    /// Write and wait for the store's answer.
    pub async fn write_acked(
        &self,
        path: impl Into<StorePath> + Send,
        value: impl Into<Value> + Send,
    ) -> WriteOutcome {
        let (tx, rx) = oneshot::channel();
        if let Err(reason) = self.enqueue(path.into(), value.into(), Some(tx)) {
            return WriteOutcome::Failure(reason);
        }
        match rx.await {
            Ok(Ok(())) => WriteOutcome::Success,
            Ok(Err(e)) => WriteOutcome::Failure(e.to_string()),
            Err(_) => WriteOutcome::Failure("write task stopped".into()),
        }
    }

    /// Queue a write without waiting.
    pub fn write_detached(
        &self,
        path: impl Into<StorePath>,
        value: impl Into<Value>,
    ) -> WriteOutcome {
        match self.enqueue(path.into(), value.into(), None) {
            Ok(()) => WriteOutcome::Pending,
            Err(reason) => WriteOutcome::Failure(reason),
        }
    }

    /// Wait until every write queued so far has reached the store.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.inner.write_tx.send(WriteJob::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    fn enqueue(
        &self,
        path: StorePath,
        value: Value,
        reply: Option<oneshot::Sender<Result<(), CoreError>>>,
    ) -> Result<(), String> {
        self.inner.mirror.apply(&path, &value);
        self.inner
            .write_tx
            .send(WriteJob::Write { path, value, reply })
            .map_err(|_| "write task stopped".to_owned())
    }
}

/// Drains the write queue in order. Ends when every `Synchronizer`
/// clone has been dropped.
async fn write_task(store: Arc<dyn RemoteStore>, mut rx: mpsc::UnboundedReceiver<WriteJob>) {
    while let Some(job) = rx.recv().await {
        match job {
            WriteJob::Write { path, value, reply } => {
                let result = store.write(&path, value).await;
                match &result {
                    Ok(()) => info!(path = %path, "write acknowledged"),
                    Err(e) => warn!(path = %path, error = %e, "write failed"),
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            WriteJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("write task stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn sync_over(store: &MemoryStore, ack_required: bool) -> Synchronizer {
        Synchronizer::new(Arc::new(store.clone()), SyncOptions { ack_required })
    }

    #[tokio::test]
    async fn read_failure_is_no_data() {
        let store = MemoryStore::new();
        store.set("digitalLED/state", Value::Bool(true));
        store.fail_reads(Some("offline"));
        let sync = sync_over(&store, false);

        assert_eq!(sync.read_once("digitalLED/state").await, None);
        assert!(sync.mirror().is_empty());
        assert!(sync.try_read_once(&"digitalLED/state".into()).await.is_err());
    }

    #[tokio::test]
    async fn hydrate_records_default() {
        let store = MemoryStore::new();
        let sync = sync_over(&store, false);

        let value = sync.hydrate("digitalLED/state", Value::Bool(true)).await;
        assert_eq!(value, Value::Bool(true));
        assert_eq!(
            sync.mirror().get(&"digitalLED/state".into()),
            Some(Value::Bool(true))
        );
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn detached_writes_land_in_order() {
        let store = MemoryStore::new();
        let sync = sync_over(&store, false);

        for pct in [10.0, 20.0, 30.0] {
            assert_eq!(sync.write("smartLight/brightness", pct).await, WriteOutcome::Pending);
        }
        sync.flush().await;

        let written: Vec<Value> = store.writes().into_iter().map(|(_, v)| v).collect();
        assert_eq!(
            written,
            vec![Value::Number(10.0), Value::Number(20.0), Value::Number(30.0)]
        );
    }

    #[tokio::test]
    async fn acked_failure_keeps_local_value() {
        let store = MemoryStore::new();
        store.fail_writes(Some("permission denied"));
        let sync = sync_over(&store, true);

        let outcome = sync.write("digitalLED/state", false).await;
        assert_eq!(outcome, WriteOutcome::Failure("Store unreachable: permission denied".into()));
        assert_eq!(
            sync.mirror().get(&"digitalLED/state".into()),
            Some(Value::Bool(false))
        );
        assert_eq!(store.get("digitalLED/state"), None);
    }
}
