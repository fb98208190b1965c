//! Device state layer between `bms-api` and the CLI.
//!
//! This crate owns the synchronization rules, the local mirror and the
//! typed device panels for a building's smart devices:
//!
//! - **[`Synchronizer`]**: binds a [`RemoteStore`] to the local
//!   [`Mirror`]. One-shot reads degrade to "no data" on failure,
//!   continuous reads hand out a cancellable [`Subscription`], and all
//!   writes flow through one ordered writer task. With
//!   [`SyncOptions::ack_required`] a write reports the store's answer
//!   as a [`WriteOutcome`].
//!
//! - **[`RemoteStore`]**: the seam to the backend. [`RtdbStore`] speaks
//!   the realtime database REST/SSE protocol; [`MemoryStore`] keeps the
//!   tree in memory for tests and offline runs.
//!
//! - **[`Mirror`]**: `DashMap` of every path the synchronizer has
//!   seen. [`Mirror::watch`] follows one path as a [`PathWatch`].
//!
//! - **Panels** ([`panel`]): scenes, smart light, digital LED, live
//!   sensors, monthly consumption and per-cabin floor toggles, each
//!   mapped onto its well-known store path.
//!
//! - **Auth** ([`auth`]): [`AuthSession`] over pluggable
//!   [`AuthProvider`] and [`BiometricProvider`] ports.

pub mod auth;
pub mod config;
pub mod error;
pub mod mirror;
pub mod model;
pub mod panel;
pub mod store;
pub mod stream;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{
    identity_provider, AuthProvider, AuthSession, BiometricProvider, MemoryAuth, UserIdentity,
};
pub use config::{StoreConfig, SyncOptions};
pub use error::CoreError;
pub use mirror::{Mirror, MirrorSnapshot};
pub use model::{DeviceProperty, StorePath, Value, ValueKind};
pub use store::{MemoryStore, RemoteStore, RtdbStore, ValueStream};
pub use stream::{PathWatch, Subscription};
pub use sync::{Synchronizer, WriteOutcome};

pub use panel::{
    Cabin, CabinDevice, ConsumptionAlert, ConsumptionPanel, DigitalLedPanel, FloorPanel,
    MonthlyUsage, Scene, SceneBoard, Schedule, SensorPanel, SensorReading, SmartLightPanel,
};
