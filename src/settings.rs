//! Pet settings and the "settings changed" bus.

use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PetError;
use crate::species::SpeciesId;
use crate::store::KvStore;

/// Store key of the settings record.
pub const SETTINGS_KEY: &str = "pet-settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetSettings {
    pub enable_pets: bool,
    /// Raw species key. Unknown keys are kept and simply show no pet.
    pub pet_type: String,
    pub pet_name: String,
}

impl Default for PetSettings {
    fn default() -> Self {
        Self {
            enable_pets: true,
            pet_type: SpeciesId::Cat.key().to_string(),
            pet_name: "Mochi".to_string(),
        }
    }
}

/// Partial update: every present field overwrites, absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsChanged {
    pub enable_pets: Option<bool>,
    pub pet_type: Option<SpeciesId>,
    pub pet_name: Option<String>,
}

/// What an applied change actually altered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsDelta {
    pub enabled: bool,
    pub species: bool,
    pub name: bool,
}

impl SettingsDelta {
    pub fn any(&self) -> bool {
        self.enabled || self.species || self.name
    }
}

impl PetSettings {
    /// Load settings, merging defaults into whatever fields are present and
    /// well-typed. The normalized record is written back once if it differed.
    pub fn load(store: &mut dyn KvStore) -> Self {
        let raw = match store.get(SETTINGS_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Failed to read settings, using defaults: {e}");
                return Self::default();
            }
        };

        let empty = Map::new();
        let map = match &raw {
            Some(Value::Object(map)) => map,
            _ => &empty,
        };
        let defaults = Self::default();
        let settings = Self {
            enable_pets: map
                .get("enablePets")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.enable_pets),
            pet_type: map
                .get("petType")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(defaults.pet_type),
            pet_name: map
                .get("petName")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(defaults.pet_name),
        };

        let normalized = serde_json::to_value(&settings).ok();
        if normalized.is_some() && normalized != raw {
            settings.persist(store);
        }
        settings
    }

    /// Species to simulate, if the stored key is one we know.
    pub fn species(&self) -> Option<SpeciesId> {
        SpeciesId::parse(&self.pet_type)
    }

    /// Apply a partial update and persist immediately.
    pub fn apply(&mut self, change: &SettingsChanged, store: &mut dyn KvStore) -> SettingsDelta {
        let mut delta = SettingsDelta::default();

        if let Some(enabled) = change.enable_pets {
            delta.enabled = enabled != self.enable_pets;
            self.enable_pets = enabled;
        }
        if let Some(species) = change.pet_type {
            delta.species = species.key() != self.pet_type;
            self.pet_type = species.key().to_string();
        }
        if let Some(name) = &change.pet_name {
            delta.name = *name != self.pet_name;
            self.pet_name = name.clone();
        }

        self.persist(store);
        delta
    }

    fn persist(&self, store: &mut dyn KvStore) {
        let result = serde_json::to_value(self)
            .map_err(PetError::from)
            .and_then(|value| store.set(SETTINGS_KEY, value));
        if let Err(e) = result {
            log::warn!("Failed to persist settings: {e}");
        }
    }
}

/// Cloneable handle for publishing settings changes.
#[derive(Debug, Clone)]
pub struct SettingsPublisher(Sender<SettingsChanged>);

impl SettingsPublisher {
    pub fn publish(&self, change: SettingsChanged) {
        if self.0.send(change).is_err() {
            log::debug!("Settings bus closed, change dropped");
        }
    }
}

/// Queue of settings changes, drained by the host between ticks.
pub struct SettingsBus {
    tx: Sender<SettingsChanged>,
    rx: Receiver<SettingsChanged>,
}

impl SettingsBus {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn publisher(&self) -> SettingsPublisher {
        SettingsPublisher(self.tx.clone())
    }

    /// All changes published since the last drain, oldest first.
    pub fn drain(&self) -> Vec<SettingsChanged> {
        self.rx.try_iter().collect()
    }
}
