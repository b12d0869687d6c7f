use crate::ecs::components::{
    ActionKind, BehaviorState, ChaseTarget, CueKind, Cues, Direction, Facing, PetState, Position,
};
use crate::ecs::systems::collectibles;
use crate::geometry::MovementBounds;
use crate::species::SpeciesProfile;
use crate::util::dice::Dice;

/// Rest after a chase ends with nothing left to chase (ms).
const CHASE_COOLDOWN_MS: f32 = 2000.0;
/// A roaming pet at a wall climbs when its draw beats this.
const CLIMB_THRESHOLD: f32 = 0.7;
/// Chance a resting pet sits rather than idles.
const SIT_CHANCE: f32 = 0.5;
/// Chance a roaming pet runs rather than walks.
const RUN_CHANCE: f32 = 0.4;

/// Fire cues that are due: the stand→run after a drop and the settle after eating.
/// A stand→run with nothing left uneaten is dropped.
pub fn run_cues(world: &mut hecs::World, pet: hecs::Entity, now_ms: f64) {
    let food_left = collectibles::any_uncollected(world);
    let Ok((state, cues)) = world.query_one_mut::<(&mut PetState, &mut Cues)>(pet) else {
        return;
    };

    for cue in cues.take_due(now_ms) {
        match cue.kind {
            CueKind::StartChase => {
                if !food_left {
                    continue;
                }
                state.behavior = BehaviorState::Chasing;
                if !(state.action == ActionKind::Swipe && cues.pending(CueKind::Settle)) {
                    state.action = ActionKind::Run;
                }
            }
            CueKind::Settle => {
                if state.behavior == BehaviorState::Chasing {
                    state.action = ActionKind::Run;
                } else if state.action == ActionKind::Swipe {
                    state.action = ActionKind::Idle;
                }
            }
        }
    }
}

/// Re-evaluate the pet's behavior for this tick.
pub fn update(
    world: &mut hecs::World,
    pet: hecs::Entity,
    bounds: &MovementBounds,
    profile: &SpeciesProfile,
    hungry: bool,
    dt_ms: f32,
    rng: &mut impl Dice,
) {
    let Ok(x) = world.get::<&Position>(pet).map(|p| p.0.x) else {
        return;
    };
    let nearest = collectibles::nearest_eligible(world, x);
    let in_flight = collectibles::any_in_flight(world);

    let Ok((state, facing, target, cues)) =
        world.query_one_mut::<(&mut PetState, &mut Facing, &mut ChaseTarget, &Cues)>(pet)
    else {
        return;
    };

    let before = *state;

    // Hunger overrides everything.
    if hungry {
        state.behavior = BehaviorState::Resting;
        state.action = ActionKind::Sit;
        state.timer = profile.durations.rest.draw(rng);
        target.clear();
    } else if let Some(item) = nearest {
        state.behavior = BehaviorState::Chasing;
        target.target_x = Some(item.x);
        target.moving = true;

        let waiting = (state.action == ActionKind::Stand && cues.pending(CueKind::StartChase))
            || (state.action == ActionKind::Swipe && cues.pending(CueKind::Settle));
        if !waiting {
            state.action = ActionKind::Run;
        }
    } else if state.behavior == BehaviorState::Chasing {
        target.clear();
        // Food still falling: keep waiting for it.
        if !in_flight {
            state.behavior = BehaviorState::Resting;
            state.timer = CHASE_COOLDOWN_MS;
            if !(state.action == ActionKind::Swipe && cues.pending(CueKind::Settle)) {
                state.action = ActionKind::Idle;
            }
        }
    } else if state.timer > 0.0 && !target.moving {
        state.timer -= dt_ms;
    } else {
        transition(state, facing, bounds, profile, x, rng);
    }

    if state.behavior != before.behavior || state.action != before.action {
        log::debug!(
            "Pet {:?}/{} -> {:?}/{}",
            before.behavior,
            before.action.label(),
            state.behavior,
            state.action.label(),
        );
    }
}

/// Roam-or-rest decision once the current behavior's timer has run out.
fn transition(
    state: &mut PetState,
    facing: &mut Facing,
    bounds: &MovementBounds,
    profile: &SpeciesProfile,
    x: f32,
    rng: &mut impl Dice,
) {
    let durations = &profile.durations;

    match state.behavior {
        BehaviorState::Roaming => {
            let at_left = bounds.near_left_wall(x);
            let at_right = bounds.near_right_wall(x);
            if (at_left || at_right) && profile.can_climb() && rng.roll() > CLIMB_THRESHOLD {
                state.behavior = BehaviorState::Climbing;
                state.action = ActionKind::Climb;
                state.timer = durations.climb.draw(rng);
                facing.0 = if at_left { Direction::Left } else { Direction::Right };
            } else {
                state.behavior = BehaviorState::Resting;
                state.action = if profile.supports(ActionKind::Sit) && rng.chance(SIT_CHANCE) {
                    ActionKind::Sit
                } else {
                    ActionKind::Idle
                };
                state.timer = durations.rest.draw(rng);
            }
        }
        BehaviorState::Climbing => {
            state.behavior = BehaviorState::Resting;
            state.action = if profile.supports(ActionKind::Stand) {
                ActionKind::Stand
            } else {
                ActionKind::Idle
            };
            state.timer = durations.rest.draw(rng);
        }
        BehaviorState::Resting | BehaviorState::Chasing => {
            state.behavior = BehaviorState::Roaming;
            if rng.chance(RUN_CHANCE) {
                state.action = ActionKind::Run;
                state.timer = durations.run.draw(rng);
            } else {
                state.action = ActionKind::Walk;
                state.timer = durations.walk.draw(rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Collectible;
    use crate::geometry::ContainerSize;
    use crate::species::{builtin, SpeciesId};
    use crate::util::dice::ScriptedDice;
    use glam::Vec2;

    const TICK: f32 = 16.0;

    fn setup(species: SpeciesId, x: f32, state: PetState) -> (hecs::World, hecs::Entity, MovementBounds, SpeciesProfile) {
        let profile = builtin(species);
        let bounds = MovementBounds::compute(
            ContainerSize { width: 348.0, height: 200.0 },
            &profile,
        );
        let mut world = hecs::World::new();
        let pet = world.spawn((
            Position(Vec2::new(x, 0.0)),
            Facing(Direction::Right),
            state,
            ChaseTarget::default(),
            Cues::default(),
        ));
        (world, pet, bounds, profile)
    }

    fn state(behavior: BehaviorState, action: ActionKind, timer: f32) -> PetState {
        PetState { behavior, action, timer }
    }

    fn landed(world: &mut hecs::World, id: u32, x: f32) {
        world.spawn((Collectible { id, x, y: 0.0, dropping: false, collected_at: None },));
    }

    fn pet_state(world: &hecs::World, pet: hecs::Entity) -> PetState {
        *world.get::<&PetState>(pet).unwrap()
    }

    #[test]
    fn roaming_at_left_wall_climbs() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Cat, 15.0, state(BehaviorState::Roaming, ActionKind::Walk, 0.0));
        let mut dice = ScriptedDice::new(&[0.9, 0.5]);

        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);

        let s = pet_state(&world, pet);
        assert_eq!(s.behavior, BehaviorState::Climbing);
        assert_eq!(s.action, ActionKind::Climb);
        assert_eq!(s.timer, 2250.0);
        assert_eq!(world.get::<&Facing>(pet).unwrap().0, Direction::Left);
    }

    #[test]
    fn species_without_climb_rests_at_wall() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Dog, 15.0, state(BehaviorState::Roaming, ActionKind::Walk, 0.0));
        let mut dice = ScriptedDice::new(&[0.1, 0.0]);

        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);

        let s = pet_state(&world, pet);
        assert_eq!(s.behavior, BehaviorState::Resting);
        assert_eq!(s.action, ActionKind::Sit);
    }

    #[test]
    fn low_roll_at_wall_rests_instead() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Cat, 285.0, state(BehaviorState::Roaming, ActionKind::Run, 0.0));
        let mut dice = ScriptedDice::new(&[0.3, 0.9, 0.0]);

        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);

        let s = pet_state(&world, pet);
        assert_eq!(s.behavior, BehaviorState::Resting);
        assert_eq!(s.action, ActionKind::Idle);
        assert_eq!(s.timer, 2000.0);
    }

    #[test]
    fn fox_never_sits() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Fox, 150.0, state(BehaviorState::Roaming, ActionKind::Walk, 0.0));
        let mut dice = ScriptedDice::new(&[0.0, 0.0]);

        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);

        assert_eq!(pet_state(&world, pet).action, ActionKind::Idle);
    }

    #[test]
    fn climbing_ends_standing() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Cat, 10.0, state(BehaviorState::Climbing, ActionKind::Climb, 0.0));
        let mut dice = ScriptedDice::new(&[0.0]);

        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);

        let s = pet_state(&world, pet);
        assert_eq!(s.behavior, BehaviorState::Resting);
        assert_eq!(s.action, ActionKind::Stand);
        assert_eq!(s.timer, 2000.0);
    }

    #[test]
    fn resting_moves_on_to_roaming() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Cat, 150.0, state(BehaviorState::Resting, ActionKind::Sit, 0.0));

        let mut dice = ScriptedDice::new(&[0.1, 0.0]);
        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);
        let s = pet_state(&world, pet);
        assert_eq!((s.behavior, s.action, s.timer), (BehaviorState::Roaming, ActionKind::Run, 1500.0));

        world.get::<&mut PetState>(pet).unwrap().behavior = BehaviorState::Resting;
        world.get::<&mut PetState>(pet).unwrap().timer = 0.0;
        let mut dice = ScriptedDice::new(&[0.9, 1.0]);
        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);
        let s = pet_state(&world, pet);
        assert_eq!((s.behavior, s.action, s.timer), (BehaviorState::Roaming, ActionKind::Walk, 6000.0));
    }

    #[test]
    fn running_timer_counts_down() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Cat, 150.0, state(BehaviorState::Roaming, ActionKind::Walk, 100.0));
        let mut dice = ScriptedDice::new(&[]);

        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);
        let s = pet_state(&world, pet);
        assert_eq!(s.behavior, BehaviorState::Roaming);
        assert_eq!(s.timer, 84.0);
    }

    #[test]
    fn hunger_forces_rest_mid_chase() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Cat, 150.0, state(BehaviorState::Chasing, ActionKind::Run, 0.0));
        landed(&mut world, 1, 60.0);
        world.get::<&mut ChaseTarget>(pet).unwrap().target_x = Some(60.0);
        let mut dice = ScriptedDice::new(&[0.0]);

        update(&mut world, pet, &bounds, &profile, true, TICK, &mut dice);

        let s = pet_state(&world, pet);
        assert_eq!(s.behavior, BehaviorState::Resting);
        assert_eq!(s.action, ActionKind::Sit);
        assert_eq!(s.timer, 2000.0);
        assert_eq!(world.get::<&ChaseTarget>(pet).unwrap().target_x, None);
    }

    #[test]
    fn nearest_landed_item_starts_a_chase() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Cat, 150.0, state(BehaviorState::Roaming, ActionKind::Walk, 3000.0));
        landed(&mut world, 1, 40.0);
        landed(&mut world, 2, 200.0);
        let mut dice = ScriptedDice::new(&[]);

        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);

        let s = pet_state(&world, pet);
        assert_eq!(s.behavior, BehaviorState::Chasing);
        assert_eq!(s.action, ActionKind::Run);
        let target = *world.get::<&ChaseTarget>(pet).unwrap();
        assert_eq!(target.target_x, Some(200.0));
        assert!(target.moving);
    }

    #[test]
    fn standing_pet_waits_for_its_cue() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Cat, 150.0, state(BehaviorState::Resting, ActionKind::Stand, 1000.0));
        world.get::<&mut Cues>(pet).unwrap().schedule(CueKind::StartChase, 300.0);
        landed(&mut world, 1, 40.0);
        let mut dice = ScriptedDice::new(&[]);

        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);
        let s = pet_state(&world, pet);
        assert_eq!(s.behavior, BehaviorState::Chasing);
        assert_eq!(s.action, ActionKind::Stand);

        run_cues(&mut world, pet, 300.0);
        assert_eq!(pet_state(&world, pet).action, ActionKind::Run);
        assert!(!world.get::<&Cues>(pet).unwrap().pending(CueKind::StartChase));
    }

    #[test]
    fn chase_ends_within_one_tick_of_last_collection() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Cat, 60.0, state(BehaviorState::Chasing, ActionKind::Run, 0.0));
        world.spawn((Collectible { id: 1, x: 60.0, y: 0.0, dropping: false, collected_at: Some(0.0) },));
        let mut dice = ScriptedDice::new(&[]);

        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);

        let s = pet_state(&world, pet);
        assert_eq!(s.behavior, BehaviorState::Resting);
        assert_eq!(s.action, ActionKind::Idle);
        assert_eq!(s.timer, CHASE_COOLDOWN_MS);
        assert_eq!(world.get::<&ChaseTarget>(pet).unwrap().target_x, None);
    }

    #[test]
    fn chase_holds_while_food_is_falling() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Cat, 60.0, state(BehaviorState::Chasing, ActionKind::Run, 0.0));
        world.spawn((Collectible { id: 1, x: 200.0, y: -10.0, dropping: true, collected_at: None },));
        let mut dice = ScriptedDice::new(&[]);

        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);

        assert_eq!(pet_state(&world, pet).behavior, BehaviorState::Chasing);
    }

    #[test]
    fn swipe_holds_until_settle() {
        let (mut world, pet, bounds, profile) =
            setup(SpeciesId::Cat, 60.0, state(BehaviorState::Chasing, ActionKind::Swipe, 0.0));
        world.get::<&mut Cues>(pet).unwrap().schedule(CueKind::Settle, 500.0);
        let mut dice = ScriptedDice::new(&[]);

        update(&mut world, pet, &bounds, &profile, false, TICK, &mut dice);
        let s = pet_state(&world, pet);
        assert_eq!(s.behavior, BehaviorState::Resting);
        assert_eq!(s.action, ActionKind::Swipe);

        run_cues(&mut world, pet, 499.0);
        assert_eq!(pet_state(&world, pet).action, ActionKind::Swipe);
        run_cues(&mut world, pet, 500.0);
        assert_eq!(pet_state(&world, pet).action, ActionKind::Idle);
    }

    #[test]
    fn settle_while_chasing_runs_on() {
        let (mut world, pet, _, _) =
            setup(SpeciesId::Cat, 60.0, state(BehaviorState::Chasing, ActionKind::Swipe, 0.0));
        world.get::<&mut Cues>(pet).unwrap().schedule(CueKind::Settle, 500.0);

        run_cues(&mut world, pet, 600.0);
        assert_eq!(pet_state(&world, pet).action, ActionKind::Run);
    }

    #[test]
    fn start_cue_is_dropped_once_the_food_is_eaten() {
        let (mut world, pet, _, _) =
            setup(SpeciesId::Cat, 100.0, state(BehaviorState::Resting, ActionKind::Swipe, 1000.0));
        world.spawn((Collectible { id: 1, x: 100.0, y: 0.0, dropping: false, collected_at: Some(128.0) },));
        {
            let mut cues = world.get::<&mut Cues>(pet).unwrap();
            cues.schedule(CueKind::StartChase, 300.0);
            cues.schedule(CueKind::Settle, 628.0);
        }

        run_cues(&mut world, pet, 304.0);
        let s = pet_state(&world, pet);
        assert_eq!(s.behavior, BehaviorState::Resting);
        assert_eq!(s.action, ActionKind::Swipe);
        assert!(!world.get::<&Cues>(pet).unwrap().pending(CueKind::StartChase));
    }

    #[test]
    fn start_cue_during_swipe_keeps_the_swipe() {
        let (mut world, pet, _, _) =
            setup(SpeciesId::Cat, 100.0, state(BehaviorState::Resting, ActionKind::Swipe, 1000.0));
        landed(&mut world, 2, 250.0);
        {
            let mut cues = world.get::<&mut Cues>(pet).unwrap();
            cues.schedule(CueKind::StartChase, 300.0);
            cues.schedule(CueKind::Settle, 628.0);
        }

        run_cues(&mut world, pet, 304.0);
        let s = pet_state(&world, pet);
        assert_eq!(s.behavior, BehaviorState::Chasing);
        assert_eq!(s.action, ActionKind::Swipe);

        run_cues(&mut world, pet, 628.0);
        assert_eq!(pet_state(&world, pet).action, ActionKind::Run);
    }
}
