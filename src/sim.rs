//! One running pet: the world, its hunger, and the per-tick driver.

use glam::Vec2;

use crate::ecs::components::{Collectible, PetState, Position};
use crate::ecs::systems::collectibles::{self, CollectibleIds};
use crate::ecs::systems::{self, click, TickContext};
use crate::geometry::{ContainerSize, MovementBounds};
use crate::hunger::HungerModel;
use crate::pet::{self, animation};
use crate::pet::animation::{PetFrame, RenderSurface};
use crate::settings::PetSettings;
use crate::species::{Roster, SpeciesId, SpeciesProfile};
use crate::store::KvStore;

pub struct Simulation {
    world: hecs::World,
    pet: hecs::Entity,
    profile: SpeciesProfile,
    name: String,
    hunger: HungerModel,
    ids: CollectibleIds,
    rng: fastrand::Rng,
    /// Nominal tick length (ms). Speeds are per nominal tick.
    tick_ms: f32,
    /// Simulated time (ms) since start.
    clock_ms: f64,
    tick_count: u64,
    prune_buf: Vec<hecs::Entity>,
}

impl Simulation {
    pub fn new(
        profile: SpeciesProfile,
        name: String,
        container: ContainerSize,
        tick_ms: f32,
        store: &mut dyn KvStore,
        mut rng: fastrand::Rng,
    ) -> Self {
        let bounds = MovementBounds::compute(container, &profile);
        let mut world = hecs::World::new();
        let pet = pet::spawn_pet(&mut world, &bounds, &mut rng);
        let hunger = HungerModel::load(store, profile.id);

        log::info!("Simulation started: {} the {}", name, profile.id);

        Self {
            world,
            pet,
            profile,
            name,
            hunger,
            ids: CollectibleIds::default(),
            rng,
            tick_ms,
            clock_ms: 0.0,
            tick_count: 0,
            prune_buf: Vec::new(),
        }
    }

    /// Build the simulation the settings ask for. Disabled pets and species
    /// keys we don't know produce nothing.
    pub fn from_settings(
        settings: &PetSettings,
        roster: &Roster,
        container: ContainerSize,
        tick_ms: f32,
        store: &mut dyn KvStore,
    ) -> Option<Self> {
        if !settings.enable_pets {
            return None;
        }
        let Some(species) = settings.species() else {
            log::debug!("No pet for unknown species {:?}", settings.pet_type);
            return None;
        };
        Some(Self::new(
            roster.get(species).clone(),
            settings.pet_name.clone(),
            container,
            tick_ms,
            store,
            fastrand::Rng::new(),
        ))
    }

    /// Advance one tick of `dt_ms` simulated milliseconds and push the
    /// resulting frame to `surface`.
    pub fn tick(
        &mut self,
        dt_ms: f32,
        wall_ms: u64,
        container: ContainerSize,
        store: &mut dyn KvStore,
        surface: &mut dyn RenderSurface,
    ) {
        self.clock_ms += dt_ms as f64;
        self.tick_count += 1;

        // Hunger is read once and decays at most once per tick.
        self.hunger.sync(store);
        self.hunger.level_down(wall_ms, &mut self.rng, store);

        let ctx = TickContext {
            bounds: MovementBounds::compute(container, &self.profile),
            profile: &self.profile,
            dt_ms,
            scale: dt_ms / self.tick_ms,
            now_ms: self.clock_ms,
        };
        systems::tick(
            &mut self.world,
            self.pet,
            &mut self.hunger,
            store,
            &ctx,
            &mut self.rng,
            &mut self.prune_buf,
        );

        if let Some(frame) = self.frame() {
            surface.present(&frame);
        }
    }

    /// Primary click at container-local `click_x`. Runs between ticks.
    pub fn pointer_down(&mut self, click_x: f32, container: ContainerSize) -> Collectible {
        let bounds = MovementBounds::compute(container, &self.profile);
        click::pointer_down(
            &mut self.world,
            self.pet,
            &mut self.ids,
            click_x,
            &bounds,
            &self.profile,
            self.clock_ms,
        )
    }

    pub fn rename(&mut self, name: String) {
        log::info!("{} is now called {}", self.name, name);
        self.name = name;
    }

    pub fn frame(&self) -> Option<PetFrame> {
        animation::build_frame(
            &self.world,
            self.pet,
            &self.profile,
            &self.name,
            self.hunger.level(),
        )
    }

    pub fn species(&self) -> SpeciesId {
        self.profile.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn hunger(&self) -> &HungerModel {
        &self.hunger
    }

    pub fn position(&self) -> Vec2 {
        self.world
            .get::<&Position>(self.pet)
            .map(|p| p.0)
            .unwrap_or(Vec2::ZERO)
    }

    pub fn state(&self) -> PetState {
        self.world
            .get::<&PetState>(self.pet)
            .map(|s| *s)
            .unwrap_or_default()
    }

    pub fn collectibles(&self) -> Vec<Collectible> {
        collectibles::all(&self.world)
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        log::info!(
            "Simulation stopped: {} the {} after {} ticks",
            self.name,
            self.profile.id,
            self.tick_count
        );
    }
}
