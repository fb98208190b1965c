// ── Smart light: power, brightness and schedule ──

use chrono::NaiveTime;
use tracing::debug;

use super::{bool_field, number_field, report};
use crate::error::CoreError;
use crate::model::{StorePath, Value};
use crate::sync::{Synchronizer, WriteOutcome};

pub const LIGHT_PATH: &str = "smartLight";
pub const DEFAULT_BRIGHTNESS: f64 = 0.47;

const SCHEDULE_FROM: &str = "scheduleFrom";
const SCHEDULE_TO: &str = "scheduleTo";

/// Slider fraction to stored percent: `round(clamp(f, 0, 1) * 100)`.
pub fn to_percent(fraction: f64) -> f64 {
    if fraction.is_nan() {
        return 0.0;
    }
    (fraction.clamp(0.0, 1.0) * 100.0).round()
}

/// Stored percent to slider fraction.
pub fn to_fraction(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0) / 100.0
}

/// `9:00 AM` style.
pub fn format_short_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// Parse `9:00 AM`, `9:00am`, `09:00 PM` or 24-hour `18:00`.
pub fn parse_short_time(input: &str) -> Result<NaiveTime, CoreError> {
    // Some clocks put a narrow no-break space before the meridiem.
    let cleaned = input
        .trim()
        .replace(['\u{202f}', '\u{a0}'], " ")
        .to_ascii_uppercase();

    ["%I:%M %p", "%I:%M%p", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&cleaned, fmt).ok())
        .ok_or_else(|| CoreError::InvalidTime {
            input: input.to_owned(),
        })
}

/// On/off window for the light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub from: NaiveTime,
    pub to: NaiveTime,
}

impl Schedule {
    pub fn to_value(self) -> Value {
        Value::map([
            (SCHEDULE_FROM, format_short_time(self.from)),
            (SCHEDULE_TO, format_short_time(self.to)),
        ])
    }

    pub fn from_value(path: &StorePath, value: &Value) -> Result<Self, CoreError> {
        let field = |key: &str| -> Result<NaiveTime, CoreError> {
            let text = value
                .get(key)
                .and_then(Value::as_str)
                .ok_or_else(|| CoreError::decode(&path.join(key), "expected a time string"))?;
            parse_short_time(text).map_err(|e| CoreError::decode(&path.join(key), e.to_string()))
        };
        Ok(Self {
            from: field(SCHEDULE_FROM)?,
            to: field(SCHEDULE_TO)?,
        })
    }
}

/// The smart light subtree: `state`, `brightness` (percent) and
/// `schedule`.
pub struct SmartLightPanel {
    sync: Synchronizer,
    on: bool,
    brightness: f64,
    schedule: Option<Schedule>,
}

impl SmartLightPanel {
    pub fn new(sync: Synchronizer) -> Self {
        Self {
            sync,
            on: true,
            brightness: DEFAULT_BRIGHTNESS,
            schedule: None,
        }
    }

    /// Read the whole subtree once and adopt whatever parts are valid.
    pub async fn load(&mut self) {
        let path = StorePath::new(LIGHT_PATH);
        let Some(value) = self.sync.read_once(path.clone()).await else {
            debug!("no stored light settings, keeping defaults");
            return;
        };

        match number_field(&path, &value, "brightness") {
            Ok(Some(pct)) => self.brightness = to_fraction(pct),
            Ok(None) => {}
            Err(e) => report(&e),
        }
        match bool_field(&path, &value, "state") {
            Ok(Some(on)) => self.on = on,
            Ok(None) => {}
            Err(e) => report(&e),
        }
        if let Some(raw) = value.get("schedule") {
            match Schedule::from_value(&path.join("schedule"), raw) {
                Ok(schedule) => self.schedule = Some(schedule),
                Err(e) => report(&e),
            }
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Brightness as a `0.0..=1.0` fraction.
    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    pub fn brightness_percent(&self) -> f64 {
        to_percent(self.brightness)
    }

    pub fn schedule(&self) -> Option<Schedule> {
        self.schedule
    }

    pub async fn set_on(&mut self, on: bool) -> WriteOutcome {
        self.on = on;
        self.sync.write(format!("{LIGHT_PATH}/state"), on).await
    }

    /// Store `fraction` as a whole percent. Out-of-range input is clamped.
    pub async fn set_brightness(&mut self, fraction: f64) -> WriteOutcome {
        let percent = to_percent(fraction);
        self.brightness = to_fraction(percent);
        self.sync
            .write(format!("{LIGHT_PATH}/brightness"), percent)
            .await
    }

    pub async fn set_schedule(&mut self, from: NaiveTime, to: NaiveTime) -> WriteOutcome {
        let schedule = Schedule { from, to };
        self.schedule = Some(schedule);
        self.sync
            .write(format!("{LIGHT_PATH}/schedule"), schedule.to_value())
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn percent_rounds_and_clamps() {
        assert!((to_percent(0.47) - 47.0).abs() < f64::EPSILON);
        assert!((to_percent(0.455) - 46.0).abs() < f64::EPSILON);
        assert!((to_percent(1.7) - 100.0).abs() < f64::EPSILON);
        assert!((to_percent(-0.2)).abs() < f64::EPSILON);
        assert!((to_fraction(250.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn brightness_round_trip_is_idempotent() {
        for f in [0.0, 0.004, 0.333, 0.47, 0.995, 1.0] {
            let once = to_fraction(to_percent(f));
            let twice = to_fraction(to_percent(once));
            assert!((once - twice).abs() < f64::EPSILON, "{f}");
        }
    }

    #[test]
    fn short_time_formats() {
        assert_eq!(format_short_time(t(9, 0)), "9:00 AM");
        assert_eq!(format_short_time(t(18, 0)), "6:00 PM");
        assert_eq!(format_short_time(t(0, 5)), "12:05 AM");
    }

    #[test]
    fn short_time_parses_common_spellings() {
        assert_eq!(parse_short_time("9:00 AM").unwrap(), t(9, 0));
        assert_eq!(parse_short_time("6:00 pm").unwrap(), t(18, 0));
        assert_eq!(parse_short_time("6:00PM").unwrap(), t(18, 0));
        assert_eq!(parse_short_time("6:00\u{202f}PM").unwrap(), t(18, 0));
        assert_eq!(parse_short_time("18:00").unwrap(), t(18, 0));
        assert!(matches!(
            parse_short_time("teatime"),
            Err(CoreError::InvalidTime { .. })
        ));
    }

    #[test]
    fn schedule_value_round_trip() {
        let schedule = Schedule {
            from: t(9, 0),
            to: t(18, 0),
        };
        let value = schedule.to_value();
        assert_eq!(
            value,
            Value::map([("scheduleFrom", "9:00 AM"), ("scheduleTo", "6:00 PM")])
        );
        let back = Schedule::from_value(&StorePath::new("smartLight/schedule"), &value).unwrap();
        assert_eq!(back, schedule);
    }

    #[test]
    fn schedule_missing_field_is_decode_error() {
        let value = Value::map([("scheduleFrom", "9:00 AM")]);
        let err = Schedule::from_value(&StorePath::new("smartLight/schedule"), &value).unwrap_err();
        assert!(matches!(err, CoreError::Decode { ref path, .. } if path.as_str() == "smartLight/schedule/scheduleTo"));
    }
}
