pub mod behavior;
pub mod click;
pub mod collectibles;
pub mod movement;

use crate::ecs::components::Position;
use crate::geometry::MovementBounds;
use crate::hunger::HungerModel;
use crate::species::SpeciesProfile;
use crate::store::KvStore;
use crate::util::dice::Dice;

/// Per-tick inputs shared by every system.
pub struct TickContext<'a> {
    pub bounds: MovementBounds,
    pub profile: &'a SpeciesProfile,
    /// Length of this tick in ms.
    pub dt_ms: f32,
    /// Length of this tick in nominal ticks.
    pub scale: f32,
    /// Simulated time at the end of this tick.
    pub now_ms: f64,
}

/// Run all simulation systems for one fixed tick. Each stage sees the
/// finished output of the stages before it.
pub fn tick(
    world: &mut hecs::World,
    pet: hecs::Entity,
    hunger: &mut HungerModel,
    store: &mut dyn KvStore,
    ctx: &TickContext,
    rng: &mut impl Dice,
    prune_buf: &mut Vec<hecs::Entity>,
) {
    let Ok(agent_x) = world.get::<&Position>(pet).map(|p| p.0.x) else {
        return;
    };

    // 1. Collectibles: fall, collect + reward, expire
    let collected = collectibles::update(
        world,
        agent_x,
        &ctx.bounds,
        ctx.profile,
        ctx.scale,
        ctx.now_ms,
    );
    for _ in 0..collected {
        hunger.level_up(rng, store);
        click::on_collected(world, pet, ctx.profile, ctx.now_ms);
    }
    collectibles::prune(world, ctx.now_ms, prune_buf);

    // 2. Behavior state machine
    behavior::run_cues(world, pet, ctx.now_ms);
    behavior::update(
        world,
        pet,
        &ctx.bounds,
        ctx.profile,
        hunger.is_hungry(),
        ctx.dt_ms,
        rng,
    );

    // 3. Movement integration
    movement::integrate(world, pet, &ctx.bounds, ctx.profile, ctx.scale);
}
