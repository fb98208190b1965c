// ── Reactive streams ──
//
// `Subscription` is the consumer side of a continuous read; `PathWatch`
// follows one path of the local mirror.

use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;

use crate::mirror::Mirror;
use crate::model::{StorePath, Value};
use crate::store::ValueStream;

// ── Mirror observation ───────────────────────────────────────────────

/// Mirrored values of one path, from [`Mirror::watch`].
///
/// Consecutive duplicates are skipped. A path that drops out of the
/// mirror yields nothing until it comes back.
pub struct PathWatch {
    path: StorePath,
    inner: ValueStream,
}

impl PathWatch {
    pub(crate) fn new(
        mirror: Weak<Mirror>,
        mut changes: watch::Receiver<u64>,
        path: StorePath,
    ) -> Self {
        let at = path.clone();
        let inner: ValueStream = Box::pin(async_stream::stream! {
            let mut last: Option<Value> = None;
            loop {
                let current = match mirror.upgrade() {
                    Some(live) => live.get(&at),
                    None => break,
                };
                match current {
                    Some(value) if last.as_ref() != Some(&value) => {
                        last = Some(value.clone());
                        yield value;
                    }
                    Some(_) => {}
                    None => last = None,
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        });
        Self { path, inner }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }
}

impl Stream for PathWatch {
    type Item = Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Value>> {
        self.inner.as_mut().poll_next(cx)
    }
}

// ── Continuous read subscription ─────────────────────────────────────

/// Live feed of one path.
///
/// Each value is written to the mirror before it is handed out, so
/// `mirror().get(path)` never lags what the consumer has seen. Values
/// arrive once each, in store order. Dropping the subscription (or
/// calling [`cancel`](Self::cancel)) releases the remote listener;
/// mirror entries already written stay.
pub struct Subscription {
    path: StorePath,
    mirror: Arc<Mirror>,
    inner: Option<ValueStream>,
}

impl Subscription {
    pub(crate) fn new(path: StorePath, mirror: Arc<Mirror>, inner: ValueStream) -> Self {
        Self {
            path,
            mirror,
            inner: Some(inner),
        }
    }

    /// A subscription that never yields.
    pub(crate) fn finished(path: StorePath, mirror: Arc<Mirror>) -> Self {
        Self {
            path,
            mirror,
            inner: None,
        }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// `false` once cancelled or ended by the store.
    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    /// Wait for the next value. `None` once the feed has ended.
    pub async fn recv(&mut self) -> Option<Value> {
        futures_util::StreamExt::next(self).await
    }

    /// Stop listening. No further values are observed.
    pub fn cancel(&mut self) {
        self.inner = None;
    }
}

impl Stream for Subscription {
    type Item = Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Value>> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(value)) => {
                self.mirror.apply(&self.path, &value);
                Poll::Ready(Some(value))
            }
            Poll::Ready(None) => {
                self.inner = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn subscription_writes_mirror_before_yielding() {
        let mirror = Arc::new(Mirror::new());
        let path = StorePath::new("sensorData/temperature");
        let feed: ValueStream = Box::pin(futures_util::stream::iter(vec![
            Value::Number(21.0),
            Value::Number(22.0),
        ]));
        let mut sub = Subscription::new(path.clone(), Arc::clone(&mirror), feed);

        assert_eq!(sub.recv().await, Some(Value::Number(21.0)));
        assert_eq!(mirror.get(&path), Some(Value::Number(21.0)));
        assert_eq!(sub.recv().await, Some(Value::Number(22.0)));
        assert_eq!(sub.recv().await, None);
        assert!(!sub.is_active());
    }

    #[tokio::test]
    async fn cancelled_subscription_yields_nothing() {
        let mirror = Arc::new(Mirror::new());
        let feed: ValueStream = Box::pin(futures_util::stream::iter(vec![Value::Bool(true)]));
        let mut sub = Subscription::new("digitalLED/state".into(), Arc::clone(&mirror), feed);
        sub.cancel();
        assert_eq!(sub.recv().await, None);
        assert!(mirror.is_empty());
    }

    #[test]
    fn idle_feed_stays_pending() {
        let mirror = Arc::new(Mirror::new());
        let feed: ValueStream = Box::pin(futures_util::stream::pending());
        let mut sub = Subscription::new("sensorData".into(), mirror, feed);
        let mut next = tokio_test::task::spawn(sub.recv());
        tokio_test::assert_pending!(next.poll());
        drop(next);
        assert!(sub.is_active());
    }

    #[tokio::test]
    async fn path_watch_follows_one_path() {
        let mirror = Arc::new(Mirror::new());
        mirror.apply(&"smartLight".into(), &Value::map([("brightness", 47.0)]));
        let mut watch = mirror.watch("smartLight/brightness".into());
        assert_eq!(watch.next().await, Some(Value::Number(47.0)));

        // A sibling change wakes the watch but yields nothing new.
        mirror.apply(&"smartLight/state".into(), &Value::Bool(true));
        mirror.apply(&"smartLight/brightness".into(), &Value::Number(80.0));
        assert_eq!(watch.next().await, Some(Value::Number(80.0)));

        drop(mirror);
        assert_eq!(watch.next().await, None);
    }

    #[test]
    fn path_watch_waits_for_first_value() {
        let mirror = Arc::new(Mirror::new());
        let mut watch = mirror.watch("sensorData".into());
        let mut next = tokio_test::task::spawn(watch.next());
        tokio_test::assert_pending!(next.poll());

        mirror.apply(&"digitalLED/state".into(), &Value::Bool(true));
        tokio_test::assert_pending!(next.poll());

        mirror.apply(&"sensorData".into(), &Value::map([("temperature", 22.0)]));
        assert!(next.is_woken());
        tokio_test::assert_ready_eq!(
            next.poll(),
            Some(Value::map([("temperature", 22.0)]))
        );
    }
}
