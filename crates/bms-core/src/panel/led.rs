// ── Digital LED ──

use super::report;
use crate::error::CoreError;
use crate::model::{StorePath, Value};
use crate::sync::{Synchronizer, WriteOutcome};

pub const LED_STATE_PATH: &str = "digitalLED/state";

/// Single on/off LED, on by default.
pub struct DigitalLedPanel {
    sync: Synchronizer,
    on: bool,
}

impl DigitalLedPanel {
    pub fn new(sync: Synchronizer) -> Self {
        Self { sync, on: true }
    }

    pub async fn load(&mut self) {
        let value = self.sync.hydrate(LED_STATE_PATH, Value::Bool(self.on)).await;
        match value {
            Value::Bool(on) => self.on = on,
            other => report(&CoreError::decode(
                &StorePath::new(LED_STATE_PATH),
                format!("expected bool, found {}", other.kind()),
            )),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub async fn set_on(&mut self, on: bool) -> WriteOutcome {
        self.on = on;
        self.sync.write(LED_STATE_PATH, on).await
    }

    pub async fn toggle(&mut self) -> WriteOutcome {
        self.set_on(!self.on).await
    }
}
