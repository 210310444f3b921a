//! Tension - one player's hostility toward another

use serde::{Deserialize, Serialize};

pub const TENSION_MIN: i32 = 0;
pub const TENSION_MAX: i32 = 1100;

// Stance change modifiers, added to tension on both sides
pub const CONTACT_MODIFIER: i32 = 0;
pub const ALLIANCE_MODIFIER: i32 = -100;
pub const DROP_ALLIANCE_MODIFIER: i32 = 50;
pub const PEACE_TREATY_MODIFIER: i32 = -250;
pub const CEASE_FIRE_MODIFIER: i32 = -250;
pub const WAR_MODIFIER: i32 = 500;
pub const RESUME_WAR_MODIFIER: i32 = 250;
/// Breaking peace into a cease-fire undoes the peace treaty's goodwill
pub const BREAK_PEACE_MODIFIER: i32 = -PEACE_TREATY_MODIFIER;

/// Named tension bands; each limit is the upper bound of its band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TensionLevel {
    Happy,
    Content,
    Displeased,
    Angry,
    Hateful,
}

impl TensionLevel {
    pub fn limit(&self) -> i32 {
        match self {
            TensionLevel::Happy => 100,
            TensionLevel::Content => 600,
            TensionLevel::Displeased => 700,
            TensionLevel::Angry => 800,
            TensionLevel::Hateful => 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tension(i32);

impl Tension {
    pub const MIN: Tension = Tension(TENSION_MIN);

    pub fn new(value: i32) -> Self {
        Self(value.clamp(TENSION_MIN, TENSION_MAX))
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    /// Add `delta`, clamped to the valid range
    pub fn modify(&mut self, delta: i32) {
        self.0 = (self.0.saturating_add(delta)).clamp(TENSION_MIN, TENSION_MAX);
    }

    pub fn level(&self) -> TensionLevel {
        [
            TensionLevel::Happy,
            TensionLevel::Content,
            TensionLevel::Displeased,
            TensionLevel::Angry,
        ]
        .into_iter()
        .find(|l| self.0 <= l.limit())
        .unwrap_or(TensionLevel::Hateful)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tension_clamps() {
        let mut t = Tension::new(50);
        t.modify(-500);
        assert_eq!(t.value(), TENSION_MIN);
        t.modify(5000);
        assert_eq!(t.value(), TENSION_MAX);
        assert_eq!(Tension::new(-3).value(), 0);
    }

    #[test]
    fn test_levels() {
        assert_eq!(Tension::new(0).level(), TensionLevel::Happy);
        assert_eq!(Tension::new(100).level(), TensionLevel::Happy);
        assert_eq!(Tension::new(101).level(), TensionLevel::Content);
        assert_eq!(Tension::new(750).level(), TensionLevel::Angry);
        assert_eq!(Tension::new(1050).level(), TensionLevel::Hateful);
    }
}
