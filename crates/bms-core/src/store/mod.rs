// ── Remote store port ──
//
// The synchronizer talks to the backend only through `RemoteStore`.
// `MemoryStore` backs tests and `--memory` runs; `RtdbStore` speaks to
// the realtime database over REST.

mod memory;
mod rtdb;
pub(crate) mod tree;

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::CoreError;
use crate::model::{StorePath, Value};

pub use memory::MemoryStore;
pub use rtdb::RtdbStore;

/// Stream of values pushed for a continuous read.
///
/// Yields the full value at the subscribed path each time it changes.
/// Dropping the stream releases the subscription.
pub type ValueStream = Pin<Box<dyn Stream<Item = Value> + Send + 'static>>;

/// A tree-structured key-value store addressed by slash-delimited paths.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the current value. `Ok(None)` when nothing is stored.
    async fn read_once(&self, path: &StorePath) -> Result<Option<Value>, CoreError>;

    /// Subscribe to every change at `path`.
    ///
    /// The current value, if any, arrives first. Nothing is yielded
    /// while the path is absent.
    async fn read_continuous(&self, path: &StorePath) -> Result<ValueStream, CoreError>;

    /// Replace the value at `path` entirely.
    async fn write(&self, path: &StorePath, value: Value) -> Result<(), CoreError>;
}
