// ── Device values ──
//
// The four shapes a device property can take, plus the conversions to
// and from the JSON the database speaks.

use std::fmt;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use super::StorePath;

/// A value stored at a path.
///
/// Maps keep the order the store delivered their keys in; the
/// consumption alert depends on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    Map(IndexMap<String, Value>),
}

/// Shape of a [`Value`], without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Number,
    Text,
    Map,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::Text,
            Self::Map(_) => ValueKind::Map,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Child of a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Build a map value from `(key, value)` pairs, keeping their order.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    // ── JSON conversion ──────────────────────────────────────────────

    /// Convert a database JSON value.
    ///
    /// `null`, empty objects and empty arrays mean "nothing here" and
    /// yield `None`. Arrays become maps keyed by index, which is how the
    /// database stores them. Null children are dropped.
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Self::Bool(b)),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::Text(s)),
            serde_json::Value::Array(items) => {
                let map: IndexMap<String, Value> = items
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, v)| Self::from_json(v).map(|v| (i.to_string(), v)))
                    .collect();
                (!map.is_empty()).then_some(Self::Map(map))
            }
            serde_json::Value::Object(obj) => {
                let map: IndexMap<String, Value> = obj
                    .into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect();
                (!map.is_empty()).then_some(Self::Map(map))
            }
        }
    }

    /// Convert to JSON for the wire. Integral numbers are written
    /// without a fractional part (`47`, not `47.0`).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => integral(*n).map_or_else(
                || {
                    serde_json::Number::from_f64(*n)
                        .map_or(serde_json::Value::Null, serde_json::Value::Number)
                },
                serde_json::Value::from,
            ),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Map(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// `Some(i)` when `n` is a whole number that fits an `i64` exactly.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn integral(n: f64) -> Option<i64> {
    const LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53
    (n.is_finite() && n.fract().abs() < f64::EPSILON && n.abs() <= LIMIT).then_some(n as i64)
}

// ── Conversions into Value ───────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(m: IndexMap<String, Value>) -> Self {
        Self::Map(m)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => match integral(*n) {
                Some(i) => write!(f, "{i}"),
                None => write!(f, "{n}"),
            },
            Self::Text(s) => f.write_str(s),
            Self::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => match integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Self::Text(s) => serializer.serialize_str(s),
            Self::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(json).ok_or_else(|| D::Error::custom("empty value (null or {})"))
    }
}

// ── Device property ──────────────────────────────────────────────────

/// A named device setting bound to a store path.
///
/// Identity is the path; two properties at the same path are the same
/// property regardless of the expected kind.
#[derive(Debug, Clone, Eq)]
pub struct DeviceProperty {
    pub path: StorePath,
    pub kind: ValueKind,
}

impl DeviceProperty {
    pub fn new(path: impl Into<StorePath>, kind: ValueKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Whether `value` has the shape this property expects.
    pub fn accepts(&self, value: &Value) -> bool {
        value.kind() == self.kind
    }
}

impl PartialEq for DeviceProperty {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl std::hash::Hash for DeviceProperty {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn null_and_empty_are_absent() {
        assert_eq!(Value::from_json(json!(null)), None);
        assert_eq!(Value::from_json(json!({})), None);
        assert_eq!(Value::from_json(json!({"a": null})), None);
    }

    #[test]
    fn objects_keep_key_order() {
        let v = Value::from_json(json!({"Mar": 60, "Jan": 40, "Feb": 85})).unwrap();
        let keys: Vec<&String> = v.as_map().unwrap().keys().collect();
        assert_eq!(keys, vec!["Mar", "Jan", "Feb"]);
    }

    #[test]
    fn arrays_become_index_maps() {
        let v = Value::from_json(json!([true, null, false])).unwrap();
        assert_eq!(v, Value::map([("0", true), ("2", false)]));
    }

    #[test]
    fn whole_numbers_serialize_without_fraction() {
        assert_eq!(Value::Number(47.0).to_json(), json!(47));
        assert_eq!(Value::Number(0.5).to_json(), json!(0.5));
        assert_eq!(serde_json::to_string(&Value::Number(80.0)).unwrap(), "80");
        assert_eq!(Value::Number(23.5).to_string(), "23.5");
    }

    #[test]
    fn deserialize_rejects_null() {
        assert!(serde_json::from_str::<Value>("null").is_err());
        let v: Value = serde_json::from_str(r#"{"state": true}"#).unwrap();
        assert_eq!(v.get("state"), Some(&Value::Bool(true)));
    }

    #[test]
    fn property_identity_is_path() {
        let a = DeviceProperty::new("digitalLED/state", ValueKind::Bool);
        let b = DeviceProperty::new("/digitalLED/state/", ValueKind::Number);
        assert_eq!(a, b);
        assert!(a.accepts(&Value::Bool(false)));
        assert!(!a.accepts(&Value::Number(1.0)));
    }
}
