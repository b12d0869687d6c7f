/// Source of uniform random draws for behavior and hunger decisions.
///
/// Implemented for `fastrand::Rng`; tests swap in scripted draws to force a
/// particular branch.
pub trait Dice {
    /// Uniform draw in `[0, 1)`.
    fn roll(&mut self) -> f32;

    /// True with probability `p`.
    fn chance(&mut self, p: f32) -> bool {
        self.roll() < p
    }

    /// Uniform draw in `[min, max]`.
    fn between(&mut self, min: f32, max: f32) -> f32 {
        min + self.roll() * (max - min)
    }
}

impl Dice for fastrand::Rng {
    fn roll(&mut self) -> f32 {
        self.f32()
    }
}

/// Replays a fixed sequence of draws, then falls back to 0.5.
#[cfg(test)]
pub struct ScriptedDice {
    rolls: std::collections::VecDeque<f32>,
}

#[cfg(test)]
impl ScriptedDice {
    pub fn new(rolls: &[f32]) -> Self {
        Self {
            rolls: rolls.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl Dice for ScriptedDice {
    fn roll(&mut self) -> f32 {
        self.rolls.pop_front().unwrap_or(0.5)
    }
}
