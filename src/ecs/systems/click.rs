use crate::ecs::components::{ActionKind, BehaviorState, Collectible, CueKind, Cues, PetState};
use crate::ecs::systems::collectibles::{self, CollectibleIds};
use crate::geometry::MovementBounds;
use crate::species::SpeciesProfile;

/// The pet stands and looks up this long before running at a fresh drop.
pub const STAND_BEFORE_CHASE_MS: f64 = 300.0;
/// Pause after eating before running on to the next item or idling.
pub const SETTLE_AFTER_COLLECT_MS: f64 = 500.0;

/// Pointer down on the pet's container: drop food at `click_x` and get the
/// pet's attention.
pub fn pointer_down(
    world: &mut hecs::World,
    pet: hecs::Entity,
    ids: &mut CollectibleIds,
    click_x: f32,
    bounds: &MovementBounds,
    profile: &SpeciesProfile,
    now_ms: f64,
) -> Collectible {
    let item = collectibles::spawn(world, ids, click_x, bounds, profile);

    if let Ok((state, cues)) = world.query_one_mut::<(&mut PetState, &mut Cues)>(pet) {
        if state.behavior == BehaviorState::Chasing {
            state.action = ActionKind::Run;
        } else {
            state.action = ActionKind::Stand;
            cues.schedule(CueKind::StartChase, now_ms + STAND_BEFORE_CHASE_MS);
        }
    }

    item
}

/// The pet just ate: swipe at it, then settle.
pub fn on_collected(world: &mut hecs::World, pet: hecs::Entity, profile: &SpeciesProfile, now_ms: f64) {
    if let Ok((state, cues)) = world.query_one_mut::<(&mut PetState, &mut Cues)>(pet) {
        if profile.supports(ActionKind::Swipe) {
            state.action = ActionKind::Swipe;
        }
        cues.schedule(CueKind::Settle, now_ms + SETTLE_AFTER_COLLECT_MS);
    }
}
