use glam::Vec2;

use crate::ecs::components::{
    ActionKind, BehaviorState, ChaseTarget, Direction, Facing, PetState, Position,
};
use crate::geometry::MovementBounds;
use crate::species::SpeciesProfile;

/// Height lost per nominal tick when falling back to the floor.
const GRAVITY_STEP: f32 = 4.0;
/// Gentler settle while patrolling off a wall.
const SETTLE_STEP: f32 = 2.0;

// Every step function clamps its own output, so no caller can leave the
// pet outside `bounds`.

/// Walk or run along the floor, turning around at the walls.
pub fn patrol(pos: &mut Vec2, facing: &mut Direction, speed: f32, settle: f32, bounds: &MovementBounds) {
    pos.x += facing.sign() * speed;
    if pos.x <= bounds.min_x {
        pos.x = bounds.min_x;
        *facing = Direction::Right;
    } else if pos.x >= bounds.max_x {
        pos.x = bounds.max_x;
        *facing = Direction::Left;
    }

    if pos.y > 0.0 {
        pos.y = (pos.y - settle).max(0.0);
    }
    *pos = bounds.clamp(*pos);
}

/// Step toward `target_x`. Returns true once the target is reached.
pub fn seek_target(
    pos: &mut Vec2,
    facing: &mut Direction,
    target_x: f32,
    speed: f32,
    bounds: &MovementBounds,
) -> bool {
    let target_x = bounds.clamp_x(target_x);
    let dx = target_x - pos.x;
    let arrived = dx.abs() <= speed;

    if arrived {
        pos.x = target_x;
    } else {
        pos.x += speed * dx.signum();
        *facing = facing.toward(dx);
    }
    *pos = bounds.clamp(*pos);
    arrived
}

/// Climb the wall the pet faces.
pub fn climb(pos: &mut Vec2, facing: Direction, climb_speed: f32, bounds: &MovementBounds) {
    pos.y = (pos.y + climb_speed).min(bounds.max_y);
    pos.x = match facing {
        Direction::Left => bounds.min_x,
        Direction::Right => bounds.max_x,
    };
    *pos = bounds.clamp(*pos);
}

/// Fall back toward the floor.
pub fn apply_gravity(pos: &mut Vec2, step: f32, bounds: &MovementBounds) {
    if pos.y > 0.0 {
        pos.y = (pos.y - step).max(0.0);
    }
    *pos = bounds.clamp(*pos);
}

/// Run the movement step for the pet's current behavior and action.
/// `scale` is this tick's length in nominal ticks.
pub fn integrate(
    world: &mut hecs::World,
    pet: hecs::Entity,
    bounds: &MovementBounds,
    profile: &SpeciesProfile,
    scale: f32,
) {
    let Ok((pos, facing, state, target)) = world
        .query_one_mut::<(&mut Position, &mut Facing, &PetState, &mut ChaseTarget)>(pet)
    else {
        return;
    };

    let speeds = &profile.speeds;
    let gravity = GRAVITY_STEP * scale;

    match state.behavior {
        BehaviorState::Climbing => {
            climb(&mut pos.0, facing.0, speeds.climb * scale, bounds);
        }
        BehaviorState::Chasing if target.moving && state.action == ActionKind::Run => {
            if let Some(target_x) = target.target_x {
                if seek_target(&mut pos.0, &mut facing.0, target_x, speeds.chase * scale, bounds) {
                    target.moving = false;
                }
            }
            apply_gravity(&mut pos.0, gravity, bounds);
        }
        BehaviorState::Roaming if matches!(state.action, ActionKind::Walk | ActionKind::Run) => {
            let speed = if state.action == ActionKind::Run {
                speeds.run
            } else {
                speeds.walk
            };
            patrol(&mut pos.0, &mut facing.0, speed * scale, SETTLE_STEP * scale, bounds);
        }
        _ => apply_gravity(&mut pos.0, gravity, bounds),
    }
}
