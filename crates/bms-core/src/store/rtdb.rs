// ── Realtime database adapter ──
//
// `RemoteStore` over `bms_api::RtdbClient`. Streaming reads fold the
// server's put/patch events into a local copy of the subscribed subtree
// and yield the whole value after each change.

use async_trait::async_trait;
use futures_util::StreamExt;
use indexmap::IndexMap;
use tracing::{debug, warn};

use bms_api::{RtdbClient, StreamEvent};

use super::tree::{merge_at, set_at};
use super::{RemoteStore, ValueStream};
use crate::config::StoreConfig;
use crate::error::CoreError;
use crate::model::{StorePath, Value};

/// Realtime database backed store.
#[derive(Clone)]
pub struct RtdbStore {
    client: RtdbClient,
}

impl RtdbStore {
    pub fn new(config: &StoreConfig) -> Result<Self, CoreError> {
        let client = RtdbClient::new(
            config.database_url.clone(),
            config.auth_token.clone(),
            &config.transport(),
        )?;
        Ok(Self { client })
    }

    pub fn from_client(client: RtdbClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteStore for RtdbStore {
    async fn read_once(&self, path: &StorePath) -> Result<Option<Value>, CoreError> {
        match self.client.get(path.as_str()).await {
            Ok(json) => Ok(json.and_then(Value::from_json)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_continuous(&self, path: &StorePath) -> Result<ValueStream, CoreError> {
        let mut events = Box::pin(self.client.stream(path.as_str()).await?);
        let path = path.clone();

        Ok(Box::pin(async_stream::stream! {
            let mut doc: Option<Value> = None;
            while let Some(event) = events.next().await {
                let before = doc.clone();
                match event {
                    Ok(StreamEvent::Put { path: at, data }) => {
                        let segs = event_segments(&at);
                        set_at(&mut doc, &segs, Value::from_json(data));
                    }
                    Ok(StreamEvent::Patch { path: at, data }) => {
                        let segs = event_segments(&at);
                        merge_at(&mut doc, &segs, patch_children(data));
                    }
                    Ok(StreamEvent::KeepAlive) => continue,
                    Ok(StreamEvent::Cancel(reason)) => {
                        warn!(path = %path, reason = %reason, "stream cancelled by server");
                        break;
                    }
                    Ok(StreamEvent::AuthRevoked) => {
                        warn!(path = %path, "stream auth revoked");
                        break;
                    }
                    Err(e @ bms_api::Error::StreamProtocol { .. }) => {
                        warn!(path = %path, error = %e, "skipping malformed stream event");
                        continue;
                    }
                    Err(e) => {
                        warn!(path = %path, error = %e, "stream ended");
                        break;
                    }
                }

                if doc != before {
                    if let Some(value) = &doc {
                        debug!(path = %path, "stream update");
                        yield value.clone();
                    }
                }
            }
        }))
    }

    async fn write(&self, path: &StorePath, value: Value) -> Result<(), CoreError> {
        self.client.put(path.as_str(), &value.to_json()).await?;
        Ok(())
    }
}

fn event_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn patch_children(data: serde_json::Value) -> IndexMap<String, Option<Value>> {
    match data {
        serde_json::Value::Object(obj) => obj
            .into_iter()
            .map(|(k, v)| (k, Value::from_json(v)))
            .collect(),
        _ => IndexMap::new(),
    }
}
