// ── Building automation scenes ──

use indexmap::IndexMap;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::debug;

use super::{bool_field, report};
use crate::model::{StorePath, Value};
use crate::sync::{Synchronizer, WriteOutcome};

pub const SCENES_PATH: &str = "buildingAutomationStatus";

/// A named building-wide preset that can be switched on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum Scene {
    GetUp,
    GoodNight,
    GoOut,
    Lobby,
    ConferenceRoom,
}

impl Scene {
    /// Key inside the stored map.
    pub fn key(self) -> &'static str {
        self.into()
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::GetUp => "Get Up",
            Self::GoodNight => "Good Night",
            Self::GoOut => "Away Mode",
            Self::Lobby => "Lobby",
            Self::ConferenceRoom => "Conference Room",
        }
    }

    fn default_on(self) -> bool {
        matches!(self, Self::GetUp | Self::ConferenceRoom)
    }
}

/// The five scene toggles, stored together as one map.
///
/// Flipping any scene writes the full map, never a single key.
pub struct SceneBoard {
    sync: Synchronizer,
    states: IndexMap<Scene, bool>,
}

impl SceneBoard {
    pub fn new(sync: Synchronizer) -> Self {
        let states = Scene::iter().map(|s| (s, s.default_on())).collect();
        Self { sync, states }
    }

    /// Pull the stored map once. Missing or malformed keys keep their
    /// current value.
    pub async fn load(&mut self) {
        let path = StorePath::new(SCENES_PATH);
        let Some(value) = self.sync.read_once(path.clone()).await else {
            debug!("no stored scenes, keeping defaults");
            return;
        };
        for scene in Scene::iter() {
            match bool_field(&path, &value, scene.key()) {
                Ok(Some(on)) => {
                    self.states.insert(scene, on);
                }
                Ok(None) => {}
                Err(e) => report(&e),
            }
        }
    }

    pub fn is_on(&self, scene: Scene) -> bool {
        self.states.get(&scene).copied().unwrap_or_else(|| scene.default_on())
    }

    /// Every scene with its state, in display order.
    pub fn states(&self) -> impl Iterator<Item = (Scene, bool)> + '_ {
        self.states.iter().map(|(s, on)| (*s, *on))
    }

    pub async fn set(&mut self, scene: Scene, on: bool) -> WriteOutcome {
        self.states.insert(scene, on);
        self.sync.write(SCENES_PATH, self.to_value()).await
    }

    pub async fn toggle(&mut self, scene: Scene) -> WriteOutcome {
        let on = !self.is_on(scene);
        self.set(scene, on).await
    }

    /// The map as written to the store.
    pub fn to_value(&self) -> Value {
        Value::map(self.states.iter().map(|(s, on)| (s.key(), *on)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SyncOptions;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn scene_keys_are_camel_case() {
        assert_eq!(Scene::ConferenceRoom.key(), "conferenceRoom");
        assert_eq!("goOut".parse::<Scene>().unwrap(), Scene::GoOut);
        assert_eq!("goodnight".parse::<Scene>().unwrap(), Scene::GoodNight);
        assert_eq!(Scene::GoOut.label(), "Away Mode");
    }

    #[tokio::test]
    async fn defaults_then_full_map_on_toggle() {
        let store = MemoryStore::new();
        let sync = Synchronizer::new(Arc::new(store.clone()), SyncOptions::default());
        let mut board = SceneBoard::new(sync.clone());
        board.load().await;

        assert!(board.is_on(Scene::GetUp));
        assert!(board.is_on(Scene::ConferenceRoom));
        assert!(!board.is_on(Scene::Lobby));

        board.toggle(Scene::Lobby).await;
        sync.flush().await;

        assert_eq!(
            store.get(SCENES_PATH),
            Some(Value::map([
                ("getUp", true),
                ("goodNight", false),
                ("goOut", false),
                ("lobby", true),
                ("conferenceRoom", true),
            ]))
        );
    }

    #[tokio::test]
    async fn load_keeps_defaults_for_bad_keys() {
        let store = MemoryStore::new();
        store.set(
            SCENES_PATH,
            Value::map([
                ("goOut", Value::Bool(true)),
                ("lobby", Value::Text("yes".into())),
            ]),
        );
        let sync = Synchronizer::new(Arc::new(store), SyncOptions::default());
        let mut board = SceneBoard::new(sync);
        board.load().await;

        assert!(board.is_on(Scene::GoOut));
        assert!(!board.is_on(Scene::Lobby));
        assert!(board.is_on(Scene::GetUp));
    }
}
