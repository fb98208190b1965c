// ── Live temperature / humidity feed ──

use serde::Serialize;
use tracing::debug;

use crate::model::Value;
use crate::stream::Subscription;
use crate::sync::Synchronizer;

pub const SENSOR_PATH: &str = "sensorData";

const DEFAULT_TEMPERATURE: f64 = 25.0;
const DEFAULT_HUMIDITY: i64 = 60;
const TEMPERATURE_GAUGE_MAX: f64 = 50.0;
const HUMIDITY_GAUGE_MAX: f64 = 100.0;

/// One sample from the environment sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, whole percent.
    pub humidity: i64,
}

impl Default for SensorReading {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            humidity: DEFAULT_HUMIDITY,
        }
    }
}

impl SensorReading {
    /// Decode a `sensorData` map. A missing or non-numeric field falls
    /// back to its default, not to the previous sample.
    pub fn from_value(value: &Value) -> Self {
        let temperature = value
            .get("temperature")
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_TEMPERATURE);
        let humidity = value
            .get("humidity")
            .and_then(Value::as_f64)
            .map_or(DEFAULT_HUMIDITY, round_percent);
        Self {
            temperature,
            humidity,
        }
    }

    /// Temperature gauge fill, `0.0..=1.0` over a 50 °C scale.
    pub fn temperature_fill(&self) -> f64 {
        (self.temperature / TEMPERATURE_GAUGE_MAX).clamp(0.0, 1.0)
    }

    /// Humidity gauge fill, `0.0..=1.0`.
    pub fn humidity_fill(&self) -> f64 {
        #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
        let h = self.humidity as f64;
        (h / HUMIDITY_GAUGE_MAX).clamp(0.0, 1.0)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn round_percent(raw: f64) -> i64 {
    raw.round().clamp(-1.0e9, 1.0e9) as i64
}

/// Continuous view of `sensorData`.
pub struct SensorPanel {
    sync: Synchronizer,
    reading: SensorReading,
    feed: Option<Subscription>,
}

impl SensorPanel {
    pub fn new(sync: Synchronizer) -> Self {
        Self {
            sync,
            reading: SensorReading::default(),
            feed: None,
        }
    }

    /// Open the live feed. Calling it again replaces the old listener.
    pub async fn start(&mut self) {
        self.feed = Some(self.sync.read_continuous(SENSOR_PATH).await);
    }

    /// Wait for the next sample. `None` once the feed has stopped.
    pub async fn next_reading(&mut self) -> Option<SensorReading> {
        let value = self.feed.as_mut()?.recv().await?;
        self.reading = SensorReading::from_value(&value);
        debug!(
            temperature = self.reading.temperature,
            humidity = self.reading.humidity,
            "sensor sample"
        );
        Some(self.reading)
    }

    /// Release the feed. The last reading is kept.
    pub fn stop(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.cancel();
        }
    }

    pub fn is_live(&self) -> bool {
        self.feed.as_ref().is_some_and(Subscription::is_active)
    }

    pub fn reading(&self) -> SensorReading {
        self.reading
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let r = SensorReading::from_value(&Value::map([("temperature", 22.5)]));
        assert!((r.temperature - 22.5).abs() < f64::EPSILON);
        assert_eq!(r.humidity, 60);

        let r = SensorReading::from_value(&Value::Bool(true));
        assert_eq!(r, SensorReading::default());
    }

    #[test]
    fn humidity_is_rounded() {
        let r = SensorReading::from_value(&Value::map([("humidity", 55.6)]));
        assert_eq!(r.humidity, 56);
    }

    #[test]
    fn gauges_clamp() {
        let hot = SensorReading {
            temperature: 75.0,
            humidity: 40,
        };
        assert!((hot.temperature_fill() - 1.0).abs() < f64::EPSILON);
        assert!((hot.humidity_fill() - 0.4).abs() < f64::EPSILON);

        let mild = SensorReading::default();
        assert!((mild.temperature_fill() - 0.5).abs() < f64::EPSILON);
    }
}
