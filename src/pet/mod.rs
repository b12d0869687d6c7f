pub mod animation;

use glam::Vec2;

use crate::ecs::components::*;
use crate::geometry::MovementBounds;
use crate::util::dice::Dice;

/// Spawn the pet on the floor at a random spot, resting with an expired
/// timer so it starts roaming on the first tick.
pub fn spawn_pet(world: &mut hecs::World, bounds: &MovementBounds, rng: &mut impl Dice) -> hecs::Entity {
    let x = rng.between(bounds.min_x, bounds.max_x);
    let facing = if rng.chance(0.5) {
        Direction::Left
    } else {
        Direction::Right
    };

    world.spawn((
        Position(Vec2::new(x, 0.0)),
        Facing(facing),
        PetState::default(),
        ChaseTarget::default(),
        Cues::default(),
    ))
}

fn pick<'a>(parts: &[&'a str], rng: &mut impl Dice) -> &'a str {
    let idx = (rng.roll() * parts.len() as f32) as usize;
    parts[idx.min(parts.len() - 1)]
}

/// A fresh name for a renamed pet: usually a plain name, now and then a
/// title or an epithet.
pub fn generate_pet_name(rng: &mut impl Dice) -> String {
    const TITLES: &[&str] = &["Sir", "Lady", "Captain", "Professor", "Little", "Duke"];
    const NAMES: &[&str] = &[
        "Mochi", "Biscuit", "Noodle", "Pepper", "Tofu", "Pickles", "Waffles",
        "Hazel", "Clover", "Juniper", "Maple", "Pebble", "Sprout", "Pixel",
        "Bean", "Nugget", "Toffee", "Chai", "Olive", "Button", "Rusty", "Poppy",
    ];
    const EPITHETS: &[&str] = &["the Brave", "the Hungry", "McFluff", "Jr."];

    let mut name = pick(NAMES, rng).to_string();
    if rng.chance(0.2) {
        name = format!("{} {name}", pick(TITLES, rng));
    }
    if rng.chance(0.15) {
        name = format!("{name} {}", pick(EPITHETS, rng));
    }
    name
}
