//! Hunger: a 0-100 satiety level that decays over real time and is restored
//! by eating. One record per species lives in the key-value store.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PetError;
use crate::species::SpeciesId;
use crate::store::KvStore;
use crate::util::dice::Dice;

/// Store key of the per-species hunger record.
pub const HUNGER_KEY: &str = "pet-hunger";
/// Minimum wall-clock gap between two decay steps.
pub const DECAY_INTERVAL_MS: u64 = 40_000;
pub const MAX_LEVEL: u8 = 100;
/// Above this level a decay step may take 2 instead of 1.
const FAST_DECAY_ABOVE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HungerState {
    pub level: u8,
    /// Wall-clock ms of the last decay step.
    pub last_tick: Option<u64>,
}

impl Default for HungerState {
    fn default() -> Self {
        Self {
            level: MAX_LEVEL,
            last_tick: None,
        }
    }
}

pub type HungerRecord = BTreeMap<SpeciesId, HungerState>;

/// Milliseconds since the Unix epoch.
pub fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn parse_entry(value: &Value) -> Option<HungerState> {
    serde_json::from_value::<HungerState>(value.clone())
        .ok()
        .filter(|s| s.level <= MAX_LEVEL)
}

/// Bring a raw stored blob into the current shape: one valid entry per
/// roster species, defaults filling anything absent or malformed. Returns
/// the record and whether it differs from what was stored.
pub fn normalize_record(raw: Option<&Value>) -> (HungerRecord, bool) {
    let Some(Value::Object(map)) = raw else {
        let fresh = SpeciesId::ALL
            .into_iter()
            .map(|id| (id, HungerState::default()))
            .collect();
        return (fresh, true);
    };

    let mut changed = map.len() != SpeciesId::ALL.len();
    let mut record = HungerRecord::new();
    for id in SpeciesId::ALL {
        match map.get(id.key()).and_then(parse_entry) {
            Some(state) => {
                record.insert(id, state);
            }
            None => {
                changed = true;
                record.insert(id, HungerState::default());
            }
        }
    }
    (record, changed)
}

fn read_record(store: &dyn KvStore) -> crate::error::Result<Option<Value>> {
    store.get(HUNGER_KEY)
}

fn write_record(store: &mut dyn KvStore, record: &HungerRecord) {
    let result = serde_json::to_value(record)
        .map_err(PetError::from)
        .and_then(|value| store.set(HUNGER_KEY, value));
    if let Err(e) = result {
        log::warn!("Failed to persist hunger: {e}");
    }
}

/// Hunger of the active species.
#[derive(Debug, Clone)]
pub struct HungerModel {
    species: SpeciesId,
    state: HungerState,
}

impl HungerModel {
    /// Load and migrate the stored record. An unreadable store leaves the
    /// stored data alone and starts from defaults in memory.
    pub fn load(store: &mut dyn KvStore, species: SpeciesId) -> Self {
        let state = match read_record(store) {
            Ok(raw) => {
                let (record, changed) = normalize_record(raw.as_ref());
                if changed {
                    log::warn!("Hunger record missing or outdated, writing normalized defaults");
                    write_record(store, &record);
                }
                record.get(&species).copied().unwrap_or_default()
            }
            Err(e) => {
                log::warn!("Failed to read hunger, using defaults: {e}");
                HungerState::default()
            }
        };
        log::debug!("Hunger for {species}: {}", state.level);
        Self { species, state }
    }

    /// In-memory model with no store backing, for tests.
    #[cfg(test)]
    pub fn with_state(species: SpeciesId, state: HungerState) -> Self {
        Self { species, state }
    }

    #[cfg(test)]
    pub fn state(&self) -> HungerState {
        self.state
    }

    pub fn level(&self) -> u8 {
        self.state.level
    }

    pub fn is_hungry(&self) -> bool {
        self.state.level == 0
    }

    /// Pick up changes written by other users of the store. Malformed or
    /// unreadable records leave the in-memory state untouched.
    pub fn sync(&mut self, store: &dyn KvStore) {
        match read_record(store) {
            Ok(Some(Value::Object(map))) => {
                if let Some(state) = map.get(self.species.key()).and_then(parse_entry) {
                    self.state = state;
                }
            }
            Ok(_) => {}
            Err(e) => log::warn!("Failed to read hunger: {e}"),
        }
    }

    /// Eat: +5 or +10, capped at 100. Returns the new level.
    pub fn level_up(&mut self, rng: &mut impl Dice, store: &mut dyn KvStore) -> u8 {
        let gain = if rng.chance(0.5) { 10 } else { 5 };
        self.state.level = self.state.level.saturating_add(gain).min(MAX_LEVEL);
        log::debug!("{} ate, hunger now {}", self.species, self.state.level);
        self.persist(store);
        self.state.level
    }

    /// Decay by 1 (or 2 above level 10, half the time) if at least
    /// `DECAY_INTERVAL_MS` passed since the last step. A clock that went
    /// backwards counts as no time passed. Returns whether a step happened.
    pub fn level_down(&mut self, now_ms: u64, rng: &mut impl Dice, store: &mut dyn KvStore) -> bool {
        if let Some(last) = self.state.last_tick {
            if now_ms.saturating_sub(last) < DECAY_INTERVAL_MS {
                return false;
            }
        }

        let loss = if self.state.level > FAST_DECAY_ABOVE && rng.chance(0.5) {
            2
        } else {
            1
        };
        self.state.level = self.state.level.saturating_sub(loss);
        self.state.last_tick = Some(now_ms);
        log::debug!("{} hunger decayed to {}", self.species, self.state.level);
        self.persist(store);
        true
    }

    fn persist(&self, store: &mut dyn KvStore) {
        let mut record = match read_record(store) {
            Ok(raw) => normalize_record(raw.as_ref()).0,
            Err(e) => {
                log::warn!("Failed to read hunger before write: {e}");
                normalize_record(None).0
            }
        };
        record.insert(self.species, self.state);
        write_record(store, &record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::FailingStore;
    use crate::store::MemoryStore;
    use crate::util::dice::ScriptedDice;
    use serde_json::json;

    fn stored(store: &MemoryStore, species: SpeciesId) -> HungerState {
        let raw = store.get(HUNGER_KEY).unwrap().unwrap();
        parse_entry(&raw[species.key()]).unwrap()
    }

    #[test]
    fn first_decay_steps_and_stamps() {
        let mut store = MemoryStore::new();
        let mut hunger = HungerModel::load(&mut store, SpeciesId::Cat);
        let mut rng = fastrand::Rng::with_seed(3);

        assert!(hunger.level_down(1_000, &mut rng, &mut store));
        assert!(matches!(hunger.level(), 98 | 99));
        assert_eq!(hunger.state().last_tick, Some(1_000));

        // Immediate second call is gated.
        let level = hunger.level();
        assert!(!hunger.level_down(1_000, &mut rng, &mut store));
        assert_eq!(hunger.level(), level);
        assert_eq!(stored(&store, SpeciesId::Cat), hunger.state());
    }

    #[test]
    fn decay_is_rate_gated() {
        let mut store = MemoryStore::new();
        let mut hunger = HungerModel::load(&mut store, SpeciesId::Cat);
        let mut rng = fastrand::Rng::with_seed(11);

        hunger.level_down(0, &mut rng, &mut store);
        let after_first = hunger.level();
        assert!(!hunger.level_down(39_999, &mut rng, &mut store));
        assert_eq!(hunger.level(), after_first);
        assert!(hunger.level_down(40_000, &mut rng, &mut store));
        assert!(hunger.level() < after_first);
    }

    #[test]
    fn backwards_clock_does_not_decay() {
        let mut store = MemoryStore::new();
        let mut hunger = HungerModel::with_state(
            SpeciesId::Cat,
            HungerState { level: 50, last_tick: Some(100_000) },
        );
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(!hunger.level_down(10, &mut rng, &mut store));
        assert_eq!(hunger.level(), 50);
    }

    #[test]
    fn low_levels_decay_by_one() {
        let mut store = MemoryStore::new();
        let mut hunger =
            HungerModel::with_state(SpeciesId::Cat, HungerState { level: 10, last_tick: None });
        // A roll that would pick the fast step above the threshold.
        let mut dice = ScriptedDice::new(&[0.0]);
        hunger.level_down(0, &mut dice, &mut store);
        assert_eq!(hunger.level(), 9);
    }

    #[test]
    fn decay_bottoms_out_and_reports_hungry() {
        let mut store = MemoryStore::new();
        let mut hunger =
            HungerModel::with_state(SpeciesId::Dog, HungerState { level: 1, last_tick: None });
        let mut rng = fastrand::Rng::with_seed(5);
        assert!(!hunger.is_hungry());
        hunger.level_down(0, &mut rng, &mut store);
        assert_eq!(hunger.level(), 0);
        assert!(hunger.is_hungry());
        hunger.level_down(DECAY_INTERVAL_MS, &mut rng, &mut store);
        assert_eq!(hunger.level(), 0);
    }

    #[test]
    fn level_up_adds_five_or_ten() {
        let mut store = MemoryStore::new();
        let mut hunger =
            HungerModel::with_state(SpeciesId::Cat, HungerState { level: 40, last_tick: None });
        let mut dice = ScriptedDice::new(&[0.9, 0.1]);
        assert_eq!(hunger.level_up(&mut dice, &mut store), 45);
        assert_eq!(hunger.level_up(&mut dice, &mut store), 55);
        assert_eq!(stored(&store, SpeciesId::Cat).level, 55);
    }

    #[test]
    fn level_up_clamps_to_max() {
        let mut store = MemoryStore::new();
        let mut hunger =
            HungerModel::with_state(SpeciesId::Cat, HungerState { level: 0, last_tick: None });
        let mut rng = fastrand::Rng::with_seed(9);
        for _ in 0..40 {
            assert!(hunger.level_up(&mut rng, &mut store) <= MAX_LEVEL);
        }
        assert_eq!(hunger.level(), MAX_LEVEL);
    }

    #[test]
    fn absent_record_writes_full_defaults() {
        let mut store = MemoryStore::new();
        let hunger = HungerModel::load(&mut store, SpeciesId::Fox);
        assert_eq!(hunger.state(), HungerState::default());

        let raw = store.get(HUNGER_KEY).unwrap().unwrap();
        for id in SpeciesId::ALL {
            assert_eq!(parse_entry(&raw[id.key()]), Some(HungerState::default()));
        }
    }

    #[test]
    fn partial_record_is_merged_with_defaults() {
        let mut store = MemoryStore::new();
        store
            .set(
                HUNGER_KEY,
                json!({
                    "cat": {"level": 42, "lastTick": 1234},
                    "dog": {"level": "lots"},
                    "dragon": {"level": 5, "lastTick": null}
                }),
            )
            .unwrap();

        let hunger = HungerModel::load(&mut store, SpeciesId::Cat);
        assert_eq!(hunger.state(), HungerState { level: 42, last_tick: Some(1234) });
        assert_eq!(stored(&store, SpeciesId::Dog), HungerState::default());
        assert_eq!(stored(&store, SpeciesId::Cat).level, 42);
        assert!(store.get(HUNGER_KEY).unwrap().unwrap().get("dragon").is_none());
    }

    #[test]
    fn out_of_range_level_is_malformed() {
        let (record, changed) =
            normalize_record(Some(&json!({"cat": {"level": 150, "lastTick": null}})));
        assert!(changed);
        assert_eq!(record[&SpeciesId::Cat], HungerState::default());
    }

    #[test]
    fn well_formed_record_is_left_alone() {
        let (record, _) = normalize_record(None);
        let raw = serde_json::to_value(&record).unwrap();
        let (again, changed) = normalize_record(Some(&raw));
        assert!(!changed);
        assert_eq!(again, record);
    }

    #[test]
    fn sync_picks_up_other_writers() {
        let mut store = MemoryStore::new();
        let mut hunger = HungerModel::load(&mut store, SpeciesId::Cat);

        let mut other = HungerModel::load(&mut store, SpeciesId::Cat);
        let mut dice = ScriptedDice::new(&[0.9]);
        other.level_down(5_000, &mut dice, &mut store);

        hunger.sync(&store);
        assert_eq!(hunger.state(), other.state());
    }

    #[test]
    fn store_failures_keep_in_memory_state() {
        let mut store = FailingStore;
        let mut hunger = HungerModel::load(&mut store, SpeciesId::Cat);
        let mut rng = fastrand::Rng::with_seed(2);

        assert!(hunger.level_down(0, &mut rng, &mut store));
        let level = hunger.level();
        hunger.sync(&store);
        assert_eq!(hunger.level(), level);
    }
}
