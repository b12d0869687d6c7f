use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Pet position in container pixels. `x` runs from the container's left
/// edge, `y` is height above the floor (0 = standing on the ground).
#[derive(Debug, Clone, Copy)]
pub struct Position(pub Vec2);

/// Horizontal facing. Doubles as the mirror flag for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// -1.0 for left, 1.0 for right.
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    /// Facing that points along `dx`. Zero keeps `self`.
    pub fn toward(self, dx: f32) -> Self {
        if dx < 0.0 {
            Direction::Left
        } else if dx > 0.0 {
            Direction::Right
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Facing(pub Direction);

/// Fine-grained animation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Idle,
    Walk,
    Run,
    Sit,
    Stand,
    Climb,
    Swipe,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Idle => "idle",
            ActionKind::Walk => "walk",
            ActionKind::Run => "run",
            ActionKind::Sit => "sit",
            ActionKind::Stand => "stand",
            ActionKind::Climb => "climb",
            ActionKind::Swipe => "swipe",
        }
    }
}

/// Coarse behavior mode. Drives which transition rule and movement step apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorState {
    Roaming,
    Resting,
    Climbing,
    Chasing,
}

/// Current behavior state machine values.
#[derive(Debug, Clone, Copy)]
pub struct PetState {
    pub behavior: BehaviorState,
    pub action: ActionKind,
    /// Milliseconds left before the behavior is reconsidered.
    pub timer: f32,
}

impl Default for PetState {
    /// Resting with an expired timer, so the first evaluation starts roaming.
    fn default() -> Self {
        Self {
            behavior: BehaviorState::Resting,
            action: ActionKind::Idle,
            timer: 0.0,
        }
    }
}

/// Chase destination. Only populated while Chasing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChaseTarget {
    pub target_x: Option<f32>,
    pub moving: bool,
}

impl ChaseTarget {
    pub fn clear(&mut self) {
        self.target_x = None;
        self.moving = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    /// End of the stand pause after a drop: start running at the food.
    StartChase,
    /// End of the collection pause: back to running or idle.
    Settle,
}

/// An action change due at a simulated time.
#[derive(Debug, Clone, Copy)]
pub struct Cue {
    pub at_ms: f64,
    pub kind: CueKind,
}

/// Pending cues, fired in order of `at_ms` by the behavior system.
#[derive(Debug, Clone, Default)]
pub struct Cues(pub Vec<Cue>);

impl Cues {
    /// Schedule `kind`, replacing any pending cue of the same kind.
    pub fn schedule(&mut self, kind: CueKind, at_ms: f64) {
        self.0.retain(|c| c.kind != kind);
        self.0.push(Cue { at_ms, kind });
    }

    pub fn pending(&self, kind: CueKind) -> bool {
        self.0.iter().any(|c| c.kind == kind)
    }

    /// Remove and return every cue due at or before `now_ms`, earliest first.
    pub fn take_due(&mut self, now_ms: f64) -> Vec<Cue> {
        let mut due: Vec<Cue> = self.0.iter().copied().filter(|c| c.at_ms <= now_ms).collect();
        self.0.retain(|c| c.at_ms > now_ms);
        due.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
        due
    }
}

/// Food or toy dropped by a click. `y` is negative while above the floor
/// and reaches 0 on landing.
#[derive(Debug, Clone, Copy)]
pub struct Collectible {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub dropping: bool,
    /// Simulated time of collection, if collected.
    pub collected_at: Option<f64>,
}

impl Collectible {
    pub fn collected(&self) -> bool {
        self.collected_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_toward_keeps_facing_on_zero() {
        assert_eq!(Direction::Left.toward(0.0), Direction::Left);
        assert_eq!(Direction::Left.toward(3.0), Direction::Right);
        assert_eq!(Direction::Right.toward(-0.5), Direction::Left);
    }

    #[test]
    fn cues_fire_in_time_order_and_replace_same_kind() {
        let mut cues = Cues::default();
        cues.schedule(CueKind::Settle, 500.0);
        cues.schedule(CueKind::StartChase, 300.0);
        cues.schedule(CueKind::Settle, 800.0);
        assert_eq!(cues.0.len(), 2);

        assert!(cues.take_due(299.0).is_empty());
        let due = cues.take_due(900.0);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].kind, CueKind::StartChase);
        assert_eq!(due[1].kind, CueKind::Settle);
        assert!(cues.0.is_empty());
    }
}
