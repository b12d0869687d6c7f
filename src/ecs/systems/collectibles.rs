use hecs::{Entity, World};

use crate::ecs::components::Collectible;
use crate::geometry::MovementBounds;
use crate::species::SpeciesProfile;

/// Collected items stay this long so the eat animation can play.
pub const COLLECTED_GRACE_MS: f64 = 2000.0;
/// Landed items at or below this height are reachable.
const REACHABLE_Y: f32 = 5.0;

/// Monotonic collectible id source.
#[derive(Debug, Default)]
pub struct CollectibleIds(u32);

impl CollectibleIds {
    pub fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }
}

/// Landed, uncollected and low enough to reach.
pub fn eligible(item: &Collectible) -> bool {
    !item.collected() && !item.dropping && item.y <= REACHABLE_Y
}

/// Drop a new item at `click_x`, clamped into the pet's movement range.
pub fn spawn(
    world: &mut World,
    ids: &mut CollectibleIds,
    click_x: f32,
    bounds: &MovementBounds,
    profile: &SpeciesProfile,
) -> Collectible {
    let item = Collectible {
        id: ids.next(),
        x: bounds.clamp_x(click_x),
        y: -profile.collectible.size,
        dropping: true,
        collected_at: None,
    };
    world.spawn((item,));
    log::debug!("Collectible #{} dropped at x={:.1}", item.id, item.x);
    item
}

/// Advance falling items and collect grounded ones within reach of the pet.
/// Items are kept inside `bounds`, which move when the container resizes.
/// `scale` is this tick's length in nominal ticks. Returns how many items
/// were collected.
pub fn update(
    world: &mut World,
    agent_x: f32,
    bounds: &MovementBounds,
    profile: &SpeciesProfile,
    scale: f32,
    now_ms: f64,
) -> u32 {
    let fall = profile.collectible.fall_speed * scale;
    let reach = profile.dimensions.size / 1.5;
    let mut collected = 0;

    for (_, item) in world.query_mut::<&mut Collectible>() {
        item.x = bounds.clamp_x(item.x);
        if item.collected() {
            continue;
        }

        if item.dropping {
            item.y += fall;
            if item.y >= 0.0 {
                item.y = 0.0;
                item.dropping = false;
                log::debug!("Collectible #{} landed", item.id);
            }
        }

        if !item.dropping && (item.x - agent_x).abs() < reach {
            item.collected_at = Some(now_ms);
            collected += 1;
            log::debug!("Collectible #{} collected", item.id);
        }
    }

    collected
}

/// Despawn items collected at least `COLLECTED_GRACE_MS` ago.
/// `buf` is scratch space reused across ticks.
pub fn prune(world: &mut World, now_ms: f64, buf: &mut Vec<Entity>) -> usize {
    buf.clear();
    for (entity, item) in world.query::<&Collectible>().iter() {
        if let Some(at) = item.collected_at {
            if now_ms - at >= COLLECTED_GRACE_MS {
                buf.push(entity);
            }
        }
    }

    let removed = buf.len();
    for entity in buf.drain(..) {
        let _ = world.despawn(entity);
    }
    if removed > 0 {
        log::debug!("Pruned {removed} collected item(s)");
    }
    removed
}

/// Closest eligible item by horizontal distance. Ties go to the older item.
pub fn nearest_eligible(world: &World, agent_x: f32) -> Option<Collectible> {
    world
        .query::<&Collectible>()
        .iter()
        .map(|(_, item)| *item)
        .filter(eligible)
        .min_by(|a, b| {
            (a.x - agent_x)
                .abs()
                .total_cmp(&(b.x - agent_x).abs())
                .then(a.id.cmp(&b.id))
        })
}

/// Any uncollected item still falling.
pub fn any_in_flight(world: &World) -> bool {
    world
        .query::<&Collectible>()
        .iter()
        .any(|(_, item)| !item.collected() && item.dropping)
}

/// Any item not yet collected, falling or landed.
pub fn any_uncollected(world: &World) -> bool {
    world
        .query::<&Collectible>()
        .iter()
        .any(|(_, item)| !item.collected())
}

/// Snapshot of all items, ordered by id.
pub fn all(world: &World) -> Vec<Collectible> {
    let mut items: Vec<Collectible> = world
        .query::<&Collectible>()
        .iter()
        .map(|(_, item)| *item)
        .collect();
    items.sort_by_key(|item| item.id);
    items
}
