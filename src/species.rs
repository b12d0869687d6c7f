//! Species roster.
//!
//! Every species is a `SpeciesProfile` value: dimensions, speeds, behavior
//! durations, collectible physics and the animation assets it ships with.
//! One generic simulation runs whichever profile the settings select.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ecs::components::ActionKind;
use crate::error::{PetError, Result};
use crate::util::dice::Dice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeciesId {
    Cat,
    Dog,
    Fox,
    Bunny,
}

impl SpeciesId {
    pub const ALL: [SpeciesId; 4] = [
        SpeciesId::Cat,
        SpeciesId::Dog,
        SpeciesId::Fox,
        SpeciesId::Bunny,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SpeciesId::Cat => "cat",
            SpeciesId::Dog => "dog",
            SpeciesId::Fox => "fox",
            SpeciesId::Bunny => "bunny",
        }
    }

    /// Resolve a persisted species key. Unknown keys yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    /// Next species in roster order (wraps).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Inclusive duration range in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min_ms: f32,
    pub max_ms: f32,
}

impl DurationRange {
    pub const fn new(min_ms: f32, max_ms: f32) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn draw(&self, rng: &mut impl Dice) -> f32 {
        rng.between(self.min_ms, self.max_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Sprite width in pixels.
    pub size: f32,
    /// Highest point a climb reaches, in pixels above the floor.
    pub max_height: f32,
}

/// Speeds in pixels per nominal tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Speeds {
    pub walk: f32,
    pub run: f32,
    pub climb: f32,
    pub chase: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Durations {
    pub rest: DurationRange,
    pub walk: DurationRange,
    pub run: DurationRange,
    pub climb: DurationRange,
}

/// Physics of the items this species chases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollectibleSpec {
    pub size: f32,
    /// Fall speed in pixels per nominal tick.
    pub fall_speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProfile {
    pub id: SpeciesId,
    pub dimensions: Dimensions,
    pub speeds: Speeds,
    pub durations: Durations,
    pub collectible: CollectibleSpec,
    /// Animation asset per supported action. `idle` is mandatory.
    pub assets: BTreeMap<ActionKind, String>,
}

impl SpeciesProfile {
    pub fn supports(&self, action: ActionKind) -> bool {
        self.assets.contains_key(&action)
    }

    pub fn can_climb(&self) -> bool {
        self.supports(ActionKind::Climb) && self.dimensions.max_height > 0.0
    }

    /// Asset for `action`, falling back to the idle asset.
    pub fn asset_for(&self, action: ActionKind) -> &str {
        self.assets
            .get(&action)
            .or_else(|| self.assets.get(&ActionKind::Idle))
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| PetError::InvalidProfile {
            species: self.id,
            reason: reason.to_string(),
        };

        if !self.supports(ActionKind::Idle) {
            return Err(invalid("missing idle asset"));
        }
        let (s, d) = (&self.speeds, &self.durations);
        let numbers = [
            self.dimensions.size,
            self.dimensions.max_height,
            self.collectible.size,
            self.collectible.fall_speed,
            s.walk,
            s.run,
            s.climb,
            s.chase,
        ]
        .into_iter()
        .chain([d.rest, d.walk, d.run, d.climb].into_iter().flat_map(|r| [r.min_ms, r.max_ms]));
        for v in numbers {
            if !v.is_finite() {
                return Err(invalid("values must be finite numbers"));
            }
        }
        if self.dimensions.size <= 0.0 || self.collectible.size <= 0.0 {
            return Err(invalid("sizes must be positive"));
        }
        if self.dimensions.max_height < 0.0 {
            return Err(invalid("max_height must not be negative"));
        }
        if [s.walk, s.run, s.climb, s.chase, self.collectible.fall_speed]
            .iter()
            .any(|v| *v <= 0.0)
        {
            return Err(invalid("speeds must be positive"));
        }
        for range in [d.rest, d.walk, d.run, d.climb] {
            if range.min_ms < 0.0 || range.min_ms > range.max_ms {
                return Err(invalid("duration ranges must satisfy 0 <= min <= max"));
            }
        }
        Ok(())
    }
}

fn assets(species: &str, actions: &[ActionKind]) -> BTreeMap<ActionKind, String> {
    actions
        .iter()
        .map(|a| (*a, format!("pets/{species}/{}.gif", a.label())))
        .collect()
}

/// Built-in profile for `id`.
pub fn builtin(id: SpeciesId) -> SpeciesProfile {
    use ActionKind::*;

    match id {
        SpeciesId::Cat => SpeciesProfile {
            id,
            dimensions: Dimensions { size: 48.0, max_height: 120.0 },
            speeds: Speeds { walk: 1.2, run: 3.0, climb: 1.5, chase: 3.5 },
            durations: Durations {
                rest: DurationRange::new(2000.0, 5000.0),
                walk: DurationRange::new(3000.0, 6000.0),
                run: DurationRange::new(1500.0, 3000.0),
                climb: DurationRange::new(1500.0, 3000.0),
            },
            collectible: CollectibleSpec { size: 24.0, fall_speed: 3.0 },
            assets: assets("cat", &[Idle, Walk, Run, Sit, Stand, Climb, Swipe]),
        },
        SpeciesId::Dog => SpeciesProfile {
            id,
            dimensions: Dimensions { size: 56.0, max_height: 0.0 },
            speeds: Speeds { walk: 1.5, run: 3.5, climb: 1.0, chase: 4.0 },
            durations: Durations {
                rest: DurationRange::new(1500.0, 4000.0),
                walk: DurationRange::new(3000.0, 7000.0),
                run: DurationRange::new(2000.0, 4000.0),
                climb: DurationRange::new(1000.0, 1000.0),
            },
            collectible: CollectibleSpec { size: 24.0, fall_speed: 4.0 },
            assets: assets("dog", &[Idle, Walk, Run, Sit, Stand, Swipe]),
        },
        SpeciesId::Fox => SpeciesProfile {
            id,
            dimensions: Dimensions { size: 52.0, max_height: 90.0 },
            speeds: Speeds { walk: 1.4, run: 3.2, climb: 1.2, chase: 3.8 },
            durations: Durations {
                rest: DurationRange::new(2500.0, 6000.0),
                walk: DurationRange::new(2500.0, 5000.0),
                run: DurationRange::new(1200.0, 2500.0),
                climb: DurationRange::new(1000.0, 2500.0),
            },
            collectible: CollectibleSpec { size: 24.0, fall_speed: 3.0 },
            assets: assets("fox", &[Idle, Walk, Run, Stand, Climb]),
        },
        SpeciesId::Bunny => SpeciesProfile {
            id,
            dimensions: Dimensions { size: 40.0, max_height: 0.0 },
            speeds: Speeds { walk: 1.0, run: 2.6, climb: 1.0, chase: 3.0 },
            durations: Durations {
                rest: DurationRange::new(3000.0, 7000.0),
                walk: DurationRange::new(2000.0, 4000.0),
                run: DurationRange::new(800.0, 1800.0),
                climb: DurationRange::new(1000.0, 1000.0),
            },
            collectible: CollectibleSpec { size: 20.0, fall_speed: 2.5 },
            assets: assets("bunny", &[Idle, Walk, Run, Sit]),
        },
    }
}

/// Lookup table from species to profile, resolved once at construction.
#[derive(Debug, Clone)]
pub struct Roster {
    profiles: BTreeMap<SpeciesId, SpeciesProfile>,
}

impl Roster {
    /// Built-in roster with valid overrides applied. Invalid overrides are
    /// logged and the built-in entry is kept.
    pub fn with_overrides(overrides: &[SpeciesProfile]) -> Self {
        let mut profiles: BTreeMap<SpeciesId, SpeciesProfile> =
            SpeciesId::ALL.into_iter().map(|id| (id, builtin(id))).collect();

        for profile in overrides {
            match profile.validate() {
                Ok(()) => {
                    log::info!("Using configured profile for {}", profile.id);
                    profiles.insert(profile.id, profile.clone());
                }
                Err(e) => log::warn!("Ignoring species override: {e}"),
            }
        }

        Self { profiles }
    }

    pub fn get(&self, id: SpeciesId) -> &SpeciesProfile {
        // Every id is inserted by construction.
        &self.profiles[&id]
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::with_overrides(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_valid() {
        for id in SpeciesId::ALL {
            builtin(id).validate().unwrap();
        }
    }

    #[test]
    fn parse_roundtrips_keys_and_rejects_unknown() {
        for id in SpeciesId::ALL {
            assert_eq!(SpeciesId::parse(id.key()), Some(id));
        }
        assert_eq!(SpeciesId::parse("dragon"), None);
    }

    #[test]
    fn next_cycles_through_roster() {
        let mut id = SpeciesId::Cat;
        for _ in 0..SpeciesId::ALL.len() {
            id = id.next();
        }
        assert_eq!(id, SpeciesId::Cat);
    }

    #[test]
    fn missing_asset_falls_back_to_idle() {
        let fox = builtin(SpeciesId::Fox);
        assert!(!fox.supports(ActionKind::Sit));
        assert_eq!(fox.asset_for(ActionKind::Sit), "pets/fox/idle.gif");
        assert_eq!(fox.asset_for(ActionKind::Climb), "pets/fox/climb.gif");
    }

    #[test]
    fn climbing_needs_asset_and_height() {
        assert!(builtin(SpeciesId::Cat).can_climb());
        assert!(!builtin(SpeciesId::Dog).can_climb());
        assert!(!builtin(SpeciesId::Bunny).can_climb());
    }

    #[test]
    fn invalid_override_is_ignored() {
        let mut broken = builtin(SpeciesId::Cat);
        broken.assets.remove(&ActionKind::Idle);
        broken.dimensions.size = 999.0;

        let roster = Roster::with_overrides(&[broken]);
        assert_eq!(roster.get(SpeciesId::Cat).dimensions.size, 48.0);
    }

    #[test]
    fn valid_override_replaces_builtin() {
        let mut bigger = builtin(SpeciesId::Dog);
        bigger.dimensions.size = 80.0;

        let roster = Roster::with_overrides(&[bigger]);
        assert_eq!(roster.get(SpeciesId::Dog).dimensions.size, 80.0);
    }

    #[test]
    fn inverted_duration_range_is_rejected() {
        let mut p = builtin(SpeciesId::Bunny);
        p.durations.rest = DurationRange::new(5000.0, 100.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut p = builtin(SpeciesId::Cat);
        p.speeds.walk = f32::NAN;
        assert!(p.validate().is_err());

        let mut p = builtin(SpeciesId::Cat);
        p.dimensions.max_height = f32::INFINITY;
        assert!(p.validate().is_err());

        let mut p = builtin(SpeciesId::Dog);
        p.durations.walk = DurationRange::new(f32::NAN, 100.0);
        assert!(p.validate().is_err());
    }
}
