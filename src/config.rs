//! Host configuration, read from a TOML file.
//!
//! Looked up at `$PETTOY_CONFIG`, then `<config_dir>/pettoy/pettoy.toml`.
//! Every section and field is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::species::SpeciesProfile;
use crate::store::JsonFileStore;

const CONFIG_ENV: &str = "PETTOY_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Nominal tick length (ms).
    pub tick_ms: f32,
    /// Cap on simulated time owed after a stall (ms).
    pub max_catch_up_ms: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16.0,
            max_catch_up_ms: 250.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(JsonFileStore::default_path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 480,
            height: 220,
            title: "PetToy".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub store: StoreConfig,
    pub window: WindowConfig,
    /// Replacement profiles for built-in species.
    pub species: Vec<SpeciesProfile>,
}

impl AppConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(content)?;
        config.sanitize();
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load from the usual location. A missing file gives defaults; an
    /// unreadable or malformed one is logged and gives defaults.
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    fn sanitize(&mut self) {
        let defaults = SimulationConfig::default();
        let sim = &mut self.simulation;
        if !(sim.tick_ms.is_finite() && sim.tick_ms > 0.0) {
            log::warn!("tick_ms must be positive, using {}", defaults.tick_ms);
            sim.tick_ms = defaults.tick_ms;
        }
        if !(sim.max_catch_up_ms.is_finite() && sim.max_catch_up_ms >= sim.tick_ms) {
            log::warn!(
                "max_catch_up_ms must be at least one tick, using {}",
                defaults.max_catch_up_ms.max(sim.tick_ms)
            );
            sim.max_catch_up_ms = defaults.max_catch_up_ms.max(sim.tick_ms);
        }
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("pettoy").join("pettoy.toml"))
}
