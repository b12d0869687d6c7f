use glam::Vec2;

use crate::species::SpeciesProfile;

/// Gap kept between the pet and the container's side walls.
const WALL_MARGIN: f32 = 10.0;
/// Distance from a wall at which a roaming pet counts as "at the wall".
const NEAR_WALL_DIST: f32 = 20.0;

/// Measured size of the container the pet lives in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    pub width: f32,
    pub height: f32,
}

/// Allowed pet positions. Derived from the container on every use, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl MovementBounds {
    /// Bounds for a pet of `profile` inside `container`. A container too
    /// narrow for the pet collapses the range to `min_x`.
    pub fn compute(container: ContainerSize, profile: &SpeciesProfile) -> Self {
        let min_x = WALL_MARGIN;
        let max_x = (container.width - profile.dimensions.size - WALL_MARGIN).max(min_x);
        Self {
            min_x,
            max_x,
            min_y: 0.0,
            max_y: profile.dimensions.max_height.max(0.0),
        }
    }

    pub fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(self.min_x, self.max_x)
    }

    pub fn clamp_y(&self, y: f32) -> f32 {
        y.clamp(self.min_y, self.max_y)
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(self.clamp_x(p.x), self.clamp_y(p.y))
    }

    #[cfg(test)]
    pub fn contains(&self, p: Vec2) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_y..=self.max_y).contains(&p.y)
    }

    pub fn near_left_wall(&self, x: f32) -> bool {
        x - self.min_x <= NEAR_WALL_DIST
    }

    pub fn near_right_wall(&self, x: f32) -> bool {
        self.max_x - x <= NEAR_WALL_DIST
    }
}
