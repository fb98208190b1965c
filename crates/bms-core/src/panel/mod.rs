// ── Device panels ──
//
// Typed views over well-known store paths. Each panel owns its default
// state, hydrates it through the synchronizer, and writes the whole
// affected sub-value on every edit.

mod consumption;
mod floor;
mod led;
mod light;
mod scenes;
mod sensors;

pub use consumption::{
    ConsumptionAlert, ConsumptionPanel, MonthlyUsage, CONSUMPTION_PATH, THRESHOLD_KW,
};
pub use floor::{Cabin, CabinDevice, FloorPanel, FIRST_FLOOR};
pub use led::{DigitalLedPanel, LED_STATE_PATH};
pub use light::{
    format_short_time, parse_short_time, to_fraction, to_percent, Schedule, SmartLightPanel,
    DEFAULT_BRIGHTNESS, LIGHT_PATH,
};
pub use scenes::{Scene, SceneBoard, SCENES_PATH};
pub use sensors::{SensorPanel, SensorReading, SENSOR_PATH};

use tracing::warn;

use crate::error::CoreError;
use crate::model::{StorePath, Value};

/// Boolean child of a map, or a `Decode` error naming the child path.
pub(crate) fn bool_field(
    parent: &StorePath,
    value: &Value,
    key: &str,
) -> Result<Option<bool>, CoreError> {
    match value.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(CoreError::decode(
            &parent.join(key),
            format!("expected bool, found {}", other.kind()),
        )),
    }
}

/// Numeric child of a map, or a `Decode` error naming the child path.
pub(crate) fn number_field(
    parent: &StorePath,
    value: &Value,
    key: &str,
) -> Result<Option<f64>, CoreError> {
    match value.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(*n)),
        Some(other) => Err(CoreError::decode(
            &parent.join(key),
            format!("expected number, found {}", other.kind()),
        )),
    }
}

/// Log a decode problem; the caller keeps its current state.
pub(crate) fn report(err: &CoreError) {
    warn!(error = %err, "ignoring unexpected value");
}
