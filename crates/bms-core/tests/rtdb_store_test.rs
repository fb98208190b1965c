#![allow(clippy::unwrap_used)]
// `RtdbStore` over a mock event stream: how put/patch frames fold into
// the subscribed subtree.

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bms_api::RtdbClient;
use bms_core::{RemoteStore, RtdbStore, StorePath, Value};

async fn store_streaming(at: &str, body: String) -> (MockServer, RtdbStore) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{at}.json")))
        .and(header("accept", "text/event-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let base_url = Url::parse(&server.uri()).unwrap();
    let client = RtdbClient::with_client(reqwest::Client::new(), base_url, None).unwrap();
    (server, RtdbStore::from_client(client))
}

fn frame(event: &str, data: &str) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

fn put(at: &str, data: serde_json::Value) -> String {
    frame("put", &json!({"path": at, "data": data}).to_string())
}

fn patch(at: &str, data: serde_json::Value) -> String {
    frame("patch", &json!({"path": at, "data": data}).to_string())
}

fn value(json: serde_json::Value) -> Value {
    Value::from_json(json).unwrap()
}

async fn collect(store: &RtdbStore, at: &str) -> Vec<Value> {
    store
        .read_continuous(&StorePath::new(at))
        .await
        .unwrap()
        .collect()
        .await
}

#[tokio::test]
async fn events_fold_into_subtree() {
    let body = [
        put("/", json!({"temperature": 22, "humidity": 55})),
        frame("keep-alive", "null"),
        put("/temperature", json!(23)),
        patch("/", json!({"humidity": 50})),
        // Same value again: nothing new to report.
        put("/humidity", json!(50)),
        // Path removed: no value to yield.
        put("/", serde_json::Value::Null),
        put("/", json!({"temperature": 1})),
    ]
    .concat();
    let (_server, store) = store_streaming("sensorData", body).await;

    assert_eq!(
        collect(&store, "sensorData").await,
        vec![
            value(json!({"temperature": 22, "humidity": 55})),
            value(json!({"temperature": 23, "humidity": 55})),
            value(json!({"temperature": 23, "humidity": 50})),
            value(json!({"temperature": 1})),
        ]
    );
}

#[tokio::test]
async fn patch_null_removes_child() {
    let body = [
        put("/", json!({"state": true, "brightness": 47})),
        patch("/", json!({"brightness": null})),
    ]
    .concat();
    let (_server, store) = store_streaming("smartLight", body).await;

    assert_eq!(
        collect(&store, "smartLight").await,
        vec![
            value(json!({"state": true, "brightness": 47})),
            value(json!({"state": true})),
        ]
    );
}

#[tokio::test]
async fn cancel_ends_stream() {
    let body = [
        put("/", json!(true)),
        frame("cancel", "rules changed"),
        put("/", json!(false)),
    ]
    .concat();
    let (_server, store) = store_streaming("digitalLED/state", body).await;

    assert_eq!(
        collect(&store, "digitalLED/state").await,
        vec![Value::Bool(true)]
    );
}

#[tokio::test]
async fn auth_revoked_ends_stream_after_skipping_bad_frames() {
    let body = [
        put("/", json!(10)),
        frame("mystery", "{}"),
        frame("put", "not json"),
        put("/", json!(20)),
        frame("auth_revoked", "null"),
        put("/", json!(30)),
    ]
    .concat();
    let (_server, store) = store_streaming("smartLight/brightness", body).await;

    assert_eq!(
        collect(&store, "smartLight/brightness").await,
        vec![Value::Number(10.0), Value::Number(20.0)]
    );
}

#[tokio::test]
async fn absent_path_yields_nothing() {
    let body = [frame("keep-alive", "null"), put("/", serde_json::Value::Null)].concat();
    let (_server, store) = store_streaming("consumption", body).await;

    assert!(collect(&store, "consumption").await.is_empty());
}
