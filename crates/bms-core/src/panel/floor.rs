// ── Floor and cabin device toggles ──

use indexmap::IndexMap;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use super::{bool_field, report};
use crate::error::CoreError;
use crate::model::{StorePath, Value};
use crate::sync::{Synchronizer, WriteOutcome};

pub const FIRST_FLOOR: &str = "First Floor";

/// Devices fitted in every cabin. The serialized name is the key in
/// the cabin's stored map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum CabinDevice {
    AirCondition,
    SmartLight,
    AirPurifier,
    #[strum(serialize = "LEDLight")]
    LedLight,
    #[strum(serialize = "HVAC")]
    Hvac,
    #[strum(serialize = "IAQSensor")]
    IaqSensor,
}

impl CabinDevice {
    pub fn key(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AirCondition => "Air Condition",
            Self::SmartLight => "Smart Light",
            Self::AirPurifier => "Air Purifier",
            Self::LedLight => "LED Light",
            Self::Hvac => "HVAC",
            Self::IaqSensor => "IAQ Sensor",
        }
    }
}

/// One cabin and the on/off state of each of its devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cabin {
    pub name: String,
    pub devices: IndexMap<CabinDevice, bool>,
}

impl Cabin {
    /// `flags` follows [`CabinDevice`] declaration order.
    pub fn new(name: impl Into<String>, flags: [bool; 6]) -> Self {
        Self {
            name: name.into(),
            devices: CabinDevice::iter().zip(flags).collect(),
        }
    }

    pub fn is_on(&self, device: CabinDevice) -> bool {
        self.devices.get(&device).copied().unwrap_or(false)
    }

    pub fn to_value(&self) -> Value {
        Value::map(self.devices.iter().map(|(d, on)| (d.key(), *on)))
    }
}

/// Every cabin on a floor, each stored at `<floor>/<cabin>`.
pub struct FloorPanel {
    sync: Synchronizer,
    floor: StorePath,
    cabins: Vec<Cabin>,
}

impl FloorPanel {
    pub fn new(sync: Synchronizer, floor: impl Into<StorePath>, cabins: Vec<Cabin>) -> Self {
        Self {
            sync,
            floor: floor.into(),
            cabins,
        }
    }

    /// The first floor with its factory device layout.
    pub fn first_floor(sync: Synchronizer) -> Self {
        let cabins = vec![
            Cabin::new("Cabin 1", [true, false, true, false, false, true]),
            Cabin::new("Cabin 2", [false, false, true, false, true, false]),
            Cabin::new("Cabin 3", [true, true, false, true, false, false]),
            Cabin::new("Cabin 4", [false, true, true, false, true, true]),
        ];
        Self::new(sync, FIRST_FLOOR, cabins)
    }

    pub fn floor(&self) -> &StorePath {
        &self.floor
    }

    pub fn cabins(&self) -> &[Cabin] {
        &self.cabins
    }

    pub fn cabin(&self, name: &str) -> Option<&Cabin> {
        self.cabins.iter().find(|c| c.name == name)
    }

    /// Read each cabin once; stored flags override the layout.
    pub async fn load(&mut self) {
        for cabin in &mut self.cabins {
            let path = self.floor.join(&cabin.name);
            let Some(value) = self.sync.read_once(path.clone()).await else {
                continue;
            };
            for device in CabinDevice::iter() {
                match bool_field(&path, &value, device.key()) {
                    Ok(Some(on)) => {
                        cabin.devices.insert(device, on);
                    }
                    Ok(None) => {}
                    Err(e) => report(&e),
                }
            }
        }
    }

    /// Switch one device and write that cabin's full map.
    pub async fn set(
        &mut self,
        cabin: &str,
        device: CabinDevice,
        on: bool,
    ) -> Result<WriteOutcome, CoreError> {
        let floor = self.floor.clone();
        let entry = self
            .cabins
            .iter_mut()
            .find(|c| c.name == cabin)
            .ok_or_else(|| CoreError::NotFound {
                path: floor.join(cabin).to_string(),
            })?;
        entry.devices.insert(device, on);
        let value = entry.to_value();
        Ok(self.sync.write(floor.join(cabin), value).await)
    }

    pub async fn toggle(
        &mut self,
        cabin: &str,
        device: CabinDevice,
    ) -> Result<WriteOutcome, CoreError> {
        let on = !self
            .cabin(cabin)
            .map(|c| c.is_on(device))
            .ok_or_else(|| CoreError::NotFound {
                path: self.floor.join(cabin).to_string(),
            })?;
        self.set(cabin, device, on).await
    }

    /// Toggle by device key, e.g. `"HVAC"` or `"airPurifier"`.
    pub async fn toggle_named(
        &mut self,
        cabin: &str,
        device: &str,
    ) -> Result<WriteOutcome, CoreError> {
        let parsed = device
            .parse::<CabinDevice>()
            .map_err(|_| CoreError::UnknownDevice {
                cabin: cabin.to_owned(),
                device: device.to_owned(),
            })?;
        self.toggle(cabin, parsed).await
    }

    /// Write every cabin's map.
    pub async fn sync_all(&self) -> Vec<WriteOutcome> {
        let mut outcomes = Vec::with_capacity(self.cabins.len());
        for cabin in &self.cabins {
            let path = self.floor.join(&cabin.name);
            outcomes.push(self.sync.write(path, cabin.to_value()).await);
        }
        outcomes
    }
}
