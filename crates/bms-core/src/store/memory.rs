// ── In-memory store ──
//
// A complete `RemoteStore` held in process memory. Subscribers whose
// path overlaps a write receive the new value at their own path, and
// only when it actually changed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

use super::tree::{get_at, set_at};
use super::{RemoteStore, ValueStream};
use crate::error::CoreError;
use crate::model::{StorePath, Value};

/// In-memory tree store with failure injection.
///
/// Cheaply cloneable; clones share the same tree, so a test can keep a
/// handle while the synchronizer owns another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    root: Option<Value>,
    subscribers: Vec<Subscriber>,
    fail_reads: Option<String>,
    fail_writes: Option<String>,
    writes: Vec<(StorePath, Value)>,
}

struct Subscriber {
    path: StorePath,
    /// Last value delivered, used to suppress duplicate notifications.
    last: Option<Value>,
    tx: mpsc::UnboundedSender<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose whole tree starts as `root`.
    pub fn with_root(root: Value) -> Self {
        let store = Self::new();
        store.lock().root = Some(root);
        store
    }

    /// Change the tree directly, as another client would. Subscribers
    /// are notified; the write log is not touched.
    pub fn set(&self, path: impl Into<StorePath>, value: Value) {
        self.lock().apply(&path.into(), Some(value));
    }

    /// Delete the value at `path`, as another client would.
    pub fn remove(&self, path: impl Into<StorePath>) {
        self.lock().apply(&path.into(), None);
    }

    /// Peek at the stored value without going through the port.
    pub fn get(&self, path: impl Into<StorePath>) -> Option<Value> {
        let path = path.into();
        let segs: Vec<&str> = path.segments().collect();
        get_at(self.lock().root.as_ref(), &segs).cloned()
    }

    /// Make every subsequent read fail with `reason` (`None` to heal).
    pub fn fail_reads(&self, reason: Option<&str>) {
        self.lock().fail_reads = reason.map(str::to_owned);
    }

    /// Make every subsequent write fail with `reason` (`None` to heal).
    pub fn fail_writes(&self, reason: Option<&str>) {
        self.lock().fail_writes = reason.map(str::to_owned);
    }

    /// Successful writes received through the port, in arrival order.
    pub fn writes(&self) -> Vec<(StorePath, Value)> {
        self.lock().writes.clone()
    }

    /// Number of live continuous reads. Dropped subscriptions are pruned.
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|s| !s.tx.is_closed());
        inner.subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn apply(&mut self, path: &StorePath, value: Option<Value>) {
        let segs: Vec<&str> = path.segments().collect();
        set_at(&mut self.root, &segs, value);

        self.subscribers.retain(|s| !s.tx.is_closed());
        for sub in &mut self.subscribers {
            if !sub.path.overlaps(path) {
                continue;
            }
            let segs: Vec<&str> = sub.path.segments().collect();
            let current = get_at(self.root.as_ref(), &segs).cloned();
            if current == sub.last {
                continue;
            }
            sub.last.clone_from(&current);
            if let Some(value) = current {
                // A send error means the receiver is gone; pruned next time.
                let _ = sub.tx.send(value);
            }
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn read_once(&self, path: &StorePath) -> Result<Option<Value>, CoreError> {
        let inner = self.lock();
        if let Some(reason) = &inner.fail_reads {
            return Err(CoreError::Transport {
                message: reason.clone(),
            });
        }
        let segs: Vec<&str> = path.segments().collect();
        Ok(get_at(inner.root.as_ref(), &segs).cloned())
    }

    async fn read_continuous(&self, path: &StorePath) -> Result<ValueStream, CoreError> {
        let mut inner = self.lock();
        if let Some(reason) = &inner.fail_reads {
            return Err(CoreError::Transport {
                message: reason.clone(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let segs: Vec<&str> = path.segments().collect();
        let current = get_at(inner.root.as_ref(), &segs).cloned();
        if let Some(value) = &current {
            let _ = tx.send(value.clone());
        }
        inner.subscribers.push(Subscriber {
            path: path.clone(),
            last: current,
            tx,
        });
        debug!(path = %path, "memory subscription opened");

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn write(&self, path: &StorePath, value: Value) -> Result<(), CoreError> {
        let mut inner = self.lock();
        if let Some(reason) = &inner.fail_writes {
            return Err(CoreError::Transport {
                message: reason.clone(),
            });
        }
        inner.writes.push((path.clone(), value.clone()));
        inner.apply(path, Some(value));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn read_of_absent_path_is_none() {
        let store = MemoryStore::new();
        let value = store.read_once(&"digitalLED/state".into()).await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn write_replaces_and_is_logged() {
        let store = MemoryStore::new();
        let path = StorePath::new("smartLight/brightness");
        store.write(&path, Value::Number(47.0)).await.unwrap();
        store.write(&path, Value::Number(80.0)).await.unwrap();

        assert_eq!(store.get("smartLight/brightness"), Some(Value::Number(80.0)));
        assert_eq!(store.writes().len(), 2);
    }

    #[tokio::test]
    async fn subscriber_sees_current_then_changes() {
        let store = MemoryStore::new();
        store.set("sensorData/temperature", Value::Number(22.0));

        let mut stream = store.read_continuous(&"sensorData".into()).await.unwrap();
        assert_eq!(
            stream.next().await.unwrap(),
            Value::map([("temperature", 22.0)])
        );

        store.set("sensorData/humidity", Value::Number(55.0));
        assert_eq!(
            stream.next().await.unwrap(),
            Value::map([("temperature", 22.0), ("humidity", 55.0)])
        );
    }

    #[tokio::test]
    async fn ancestor_write_reaches_child_subscriber() {
        let store = MemoryStore::new();
        let mut state = store.read_continuous(&"smartLight/state".into()).await.unwrap();

        store.set(
            "smartLight",
            Value::map([("state", Value::Bool(false)), ("brightness", Value::Number(10.0))]),
        );
        assert_eq!(state.next().await.unwrap(), Value::Bool(false));
    }

    #[tokio::test]
    async fn unchanged_value_is_not_redelivered() {
        let store = MemoryStore::new();
        store.set("digitalLED/state", Value::Bool(true));
        let mut stream = store.read_continuous(&"digitalLED/state".into()).await.unwrap();
        assert_eq!(stream.next().await.unwrap(), Value::Bool(true));

        store.set("digitalLED/state", Value::Bool(true));
        store.set("digitalLED/state", Value::Bool(false));
        assert_eq!(stream.next().await.unwrap(), Value::Bool(false));
    }

    #[tokio::test]
    async fn unrelated_write_is_not_delivered() {
        let store = MemoryStore::new();
        let mut stream = store.read_continuous(&"sensorData".into()).await.unwrap();
        store.set("consumption/Jan", Value::Number(40.0));
        store.set("sensorData/temperature", Value::Number(21.0));
        assert_eq!(
            stream.next().await.unwrap(),
            Value::map([("temperature", 21.0)])
        );
    }

    #[tokio::test]
    async fn dropped_subscription_is_released() {
        let store = MemoryStore::new();
        let stream = store.read_continuous(&"sensorData".into()).await.unwrap();
        assert_eq!(store.subscriber_count(), 1);
        drop(stream);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn injected_failures() {
        let store = MemoryStore::new();
        store.fail_writes(Some("offline"));
        let err = store
            .write(&"digitalLED/state".into(), Value::Bool(true))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Transport { ref message } if message == "offline"));
        assert!(store.writes().is_empty());

        store.fail_reads(Some("offline"));
        assert!(store.read_once(&"digitalLED/state".into()).await.is_err());
        store.fail_reads(None);
        assert!(store.read_once(&"digitalLED/state".into()).await.is_ok());
    }
}
