// ── Domain model ──

mod path;
mod value;

pub use path::StorePath;
pub use value::{DeviceProperty, Value, ValueKind};
