#![allow(clippy::unwrap_used)]
// End-to-end behavior of the synchronizer and panels over the
// in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveTime;
use pretty_assertions::assert_eq;
use serde_json::json;

use bms_core::panel::{format_short_time, parse_short_time};
use bms_core::{
    ConsumptionPanel, DigitalLedPanel, MemoryStore, Scene, SceneBoard, SensorPanel,
    SensorReading, SmartLightPanel, StorePath, SyncOptions, Synchronizer, Value, WriteOutcome,
};

fn sync_over(store: &MemoryStore) -> Synchronizer {
    Synchronizer::new(Arc::new(store.clone()), SyncOptions::default())
}

fn acked_sync_over(store: &MemoryStore) -> Synchronizer {
    Synchronizer::new(Arc::new(store.clone()), SyncOptions { ack_required: true })
}

// ── Hydration ───────────────────────────────────────────────────────

#[tokio::test]
async fn empty_store_keeps_panel_defaults() {
    let store = MemoryStore::new();
    let sync = sync_over(&store);

    assert_eq!(sync.read_once("digitalLED/state").await, None);

    let mut led = DigitalLedPanel::new(sync.clone());
    led.load().await;
    assert!(led.is_on());

    let mut light = SmartLightPanel::new(sync.clone());
    light.load().await;
    assert!(light.is_on());
    assert!((light.brightness_percent() - 47.0).abs() < f64::EPSILON);
    assert_eq!(light.schedule(), None);

    let mut scenes = SceneBoard::new(sync.clone());
    scenes.load().await;
    assert!(scenes.is_on(Scene::GetUp));
    assert!(!scenes.is_on(Scene::GoOut));

    sync.flush().await;
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn unreachable_store_keeps_panel_defaults() {
    let store = MemoryStore::new();
    store.set("digitalLED/state", Value::Bool(false));
    store.fail_reads(Some("connection refused"));
    let sync = sync_over(&store);

    let mut led = DigitalLedPanel::new(sync);
    led.load().await;
    assert!(led.is_on());
}

#[tokio::test]
async fn stored_values_override_defaults() {
    let store = MemoryStore::new();
    store.set(
        "smartLight",
        Value::from_json(json!({
            "state": false,
            "brightness": 80,
            "schedule": {"scheduleFrom": "7:30 AM", "scheduleTo": "10:15 PM"}
        }))
        .unwrap(),
    );
    let mut light = SmartLightPanel::new(sync_over(&store));
    light.load().await;

    assert!(!light.is_on());
    assert!((light.brightness() - 0.8).abs() < 1e-9);
    let schedule = light.schedule().unwrap();
    assert_eq!(format_short_time(schedule.from), "7:30 AM");
    assert_eq!(format_short_time(schedule.to), "10:15 PM");
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn led_toggle_round_trip() {
    let store = MemoryStore::new();
    let sync = sync_over(&store);

    let mut led = DigitalLedPanel::new(sync.clone());
    led.load().await;
    led.toggle().await;
    sync.flush().await;

    assert!(!led.is_on());
    assert_eq!(store.get("digitalLED/state"), Some(Value::Bool(false)));

    let mut reloaded = DigitalLedPanel::new(sync_over(&store));
    reloaded.load().await;
    assert!(!reloaded.is_on());
}

#[tokio::test]
async fn brightness_is_stored_as_rounded_percent() {
    let store = MemoryStore::new();
    let sync = sync_over(&store);
    let mut light = SmartLightPanel::new(sync.clone());

    for (fraction, stored) in [(0.0, 0.0), (0.474, 47.0), (0.476, 48.0), (1.0, 100.0), (1.7, 100.0)] {
        light.set_brightness(fraction).await;
        sync.flush().await;
        assert_eq!(
            store.get("smartLight/brightness"),
            Some(Value::Number(stored)),
            "fraction {fraction}"
        );
    }
}

#[tokio::test]
async fn schedule_round_trip() {
    let store = MemoryStore::new();
    let sync = sync_over(&store);
    let mut light = SmartLightPanel::new(sync.clone());

    let from = parse_short_time("9:00 AM").unwrap();
    let to = parse_short_time("6:00 PM").unwrap();
    assert_eq!(to, NaiveTime::from_hms_opt(18, 0, 0).unwrap());

    light.set_schedule(from, to).await;
    sync.flush().await;
    assert_eq!(
        store.get("smartLight/schedule"),
        Some(Value::map([("scheduleFrom", "9:00 AM"), ("scheduleTo", "6:00 PM")]))
    );

    let mut reloaded = SmartLightPanel::new(sync_over(&store));
    reloaded.load().await;
    let schedule = reloaded.schedule().unwrap();
    assert_eq!((schedule.from, schedule.to), (from, to));
}

#[tokio::test]
async fn scene_flip_writes_whole_map() {
    let store = MemoryStore::new();
    let sync = sync_over(&store);
    let mut scenes = SceneBoard::new(sync.clone());

    scenes.toggle(Scene::Lobby).await;
    sync.flush().await;

    let writes = store.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, StorePath::new("buildingAutomationStatus"));
    assert_eq!(
        writes[0].1,
        Value::map([
            ("getUp", true),
            ("goodNight", false),
            ("goOut", false),
            ("lobby", true),
            ("conferenceRoom", true),
        ])
    );
}

#[tokio::test]
async fn acked_write_reports_store_answer() {
    let store = MemoryStore::new();
    let sync = acked_sync_over(&store);
    let mut led = DigitalLedPanel::new(sync.clone());

    assert_eq!(led.set_on(false).await, WriteOutcome::Success);

    store.fail_writes(Some("permission denied"));
    let outcome = led.set_on(true).await;
    assert!(outcome.is_failure());
    assert!(led.is_on());
    assert_eq!(store.get("digitalLED/state"), Some(Value::Bool(false)));
}

#[tokio::test]
async fn last_write_wins_in_store() {
    let store = MemoryStore::new();
    let sync = sync_over(&store);
    let mut light = SmartLightPanel::new(sync.clone());

    light.set_brightness(0.2).await;
    light.set_brightness(0.9).await;
    light.set_brightness(0.55).await;
    sync.flush().await;

    assert_eq!(store.get("smartLight/brightness"), Some(Value::Number(55.0)));
}

#[tokio::test]
async fn replacing_parent_forgets_missing_child() {
    let store = MemoryStore::new();
    let sync = acked_sync_over(&store);

    assert_eq!(
        sync.write("smartLight/state", true).await,
        WriteOutcome::Success
    );
    assert_eq!(
        sync.write("smartLight", Value::map([("brightness", 10.0)])).await,
        WriteOutcome::Success
    );

    assert_eq!(store.get("smartLight/state"), None);
    assert_eq!(sync.mirror().get(&"smartLight/state".into()), None);
    assert_eq!(
        sync.mirror().get(&"smartLight".into()),
        Some(Value::map([("brightness", 10.0)]))
    );
}

// ── Consumption ─────────────────────────────────────────────────────

#[tokio::test]
async fn consumption_alert_fires_above_threshold() {
    let store = MemoryStore::new();
    store.set(
        "consumption",
        Value::from_json(json!({"Jan": 40, "Feb": 85, "Mar": 60})).unwrap(),
    );
    let mut panel = ConsumptionPanel::new(sync_over(&store));
    panel.load().await;

    let alert = panel.alert().unwrap();
    assert_eq!(alert.month, "Feb");
    assert!((alert.kw - 85.0).abs() < f64::EPSILON);
    assert_eq!(panel.chart().len(), 3);
}

#[tokio::test]
async fn consumption_at_or_below_threshold_is_quiet() {
    let store = MemoryStore::new();
    store.set(
        "consumption",
        Value::from_json(json!({"Jan": 40, "Feb": 80, "Mar": 60})).unwrap(),
    );
    let mut panel = ConsumptionPanel::new(sync_over(&store));
    panel.load().await;
    assert_eq!(panel.alert(), None);
}

// ── Continuous reads ────────────────────────────────────────────────

#[tokio::test]
async fn sensor_updates_arrive_in_order() {
    let store = MemoryStore::new();
    let sync = sync_over(&store);
    let mut sensors = SensorPanel::new(sync.clone());
    sensors.start().await;
    assert!(sensors.is_live());

    store.set(
        "sensorData",
        Value::map([("temperature", 22.0), ("humidity", 55.0)]),
    );
    store.set(
        "sensorData",
        Value::map([("temperature", 23.0), ("humidity", 50.0)]),
    );

    let first = sensors.next_reading().await.unwrap();
    let second = sensors.next_reading().await.unwrap();
    assert_eq!(
        first,
        SensorReading {
            temperature: 22.0,
            humidity: 55
        }
    );
    assert_eq!(
        second,
        SensorReading {
            temperature: 23.0,
            humidity: 50
        }
    );
    assert_eq!(
        sync.mirror().get(&"sensorData/temperature".into()),
        Some(Value::Number(23.0))
    );

    // Each update is delivered once.
    let extra = tokio::time::timeout(Duration::from_millis(100), sensors.next_reading()).await;
    assert!(extra.is_err(), "unexpected reading: {extra:?}");
}

#[tokio::test]
async fn cancelled_feed_never_sees_later_updates() {
    let store = MemoryStore::new();
    let sync = sync_over(&store);
    let mut sensors = SensorPanel::new(sync.clone());
    sensors.start().await;

    store.set(
        "sensorData",
        Value::map([("temperature", 20.0), ("humidity", 50.0)]),
    );
    assert!(sensors.next_reading().await.is_some());

    sensors.stop();
    store.set(
        "sensorData",
        Value::map([("temperature", 30.0), ("humidity", 70.0)]),
    );

    assert!(!sensors.is_live());
    assert_eq!(sensors.next_reading().await, None);
    assert_eq!(sensors.reading().humidity, 50);
    assert_eq!(
        sync.mirror().get(&"sensorData/temperature".into()),
        Some(Value::Number(20.0))
    );
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test]
async fn refused_listener_is_already_finished() {
    let store = MemoryStore::new();
    store.fail_reads(Some("permission denied"));
    let sync = sync_over(&store);

    let mut sub = sync.read_continuous("sensorData").await;
    assert!(!sub.is_active());
    assert_eq!(sub.recv().await, None);
}

#[tokio::test]
async fn mirror_tracks_parent_and_child_paths() {
    let store = MemoryStore::new();
    let sync = sync_over(&store);

    let mut light = SmartLightPanel::new(sync.clone());
    store.set(
        "smartLight",
        Value::map([("state", Value::Bool(true)), ("brightness", Value::Number(47.0))]),
    );
    light.load().await;

    light.set_on(false).await;
    assert_eq!(
        sync.mirror().get(&"smartLight".into()),
        Some(Value::map([
            ("state", Value::Bool(false)),
            ("brightness", Value::Number(47.0)),
        ]))
    );
}
