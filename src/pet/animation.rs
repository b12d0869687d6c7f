//! Presentation boundary: turns the pet's simulated state into what a
//! rendering surface draws. Surfaces are pushed a frame every tick and never
//! queried back.

use glam::Vec2;

use crate::ecs::components::{ActionKind, Collectible, Direction, Facing, PetState, Position};
use crate::ecs::systems::collectibles;
use crate::species::{SpeciesId, SpeciesProfile};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectibleView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub collected: bool,
}

impl From<Collectible> for CollectibleView {
    fn from(item: Collectible) -> Self {
        Self {
            id: item.id,
            x: item.x,
            y: item.y,
            collected: item.collected(),
        }
    }
}

/// Everything a surface needs to draw one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PetFrame {
    pub species: SpeciesId,
    pub name: String,
    pub position: Vec2,
    pub direction: Direction,
    /// Assets face right; a left-facing pet is drawn mirrored.
    pub mirrored: bool,
    pub action: ActionKind,
    /// Animation asset for `action`, or the idle asset if the species has none.
    pub asset: String,
    pub hunger: u8,
    pub collectibles: Vec<CollectibleView>,
}

pub trait RenderSurface {
    fn present(&mut self, frame: &PetFrame);
}

/// Build this tick's frame for the pet entity.
pub fn build_frame(
    world: &hecs::World,
    pet: hecs::Entity,
    profile: &SpeciesProfile,
    name: &str,
    hunger: u8,
) -> Option<PetFrame> {
    let mut query = world
        .query_one::<(&Position, &Facing, &PetState)>(pet)
        .ok()?;
    let (pos, facing, state) = query.get()?;

    Some(PetFrame {
        species: profile.id,
        name: name.to_string(),
        position: pos.0,
        direction: facing.0,
        mirrored: facing.0 == Direction::Left,
        action: state.action,
        asset: profile.asset_for(state.action).to_string(),
        hunger,
        collectibles: collectibles::all(world)
            .into_iter()
            .map(CollectibleView::from)
            .collect(),
    })
}

/// Surface that logs whenever the visible animation changes.
#[derive(Debug, Default)]
pub struct LogSurface {
    last: Option<(ActionKind, Direction)>,
}

impl RenderSurface for LogSurface {
    fn present(&mut self, frame: &PetFrame) {
        let now = (frame.action, frame.direction);
        if self.last != Some(now) {
            log::debug!(
                "{} now {} ({:?}) at ({:.0}, {:.0}) using {}",
                frame.name,
                frame.action.label(),
                frame.direction,
                frame.position.x,
                frame.position.y,
                frame.asset,
            );
            self.last = Some(now);
        }
    }
}

/// Surface that keeps every frame, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub frames: Vec<PetFrame>,
}

#[cfg(test)]
impl RenderSurface for RecordingSurface {
    fn present(&mut self, frame: &PetFrame) {
        self.frames.push(frame.clone());
    }
}
