//! Diplomatic stance and its transition rules

use serde::{Deserialize, Serialize};

use super::tension::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    #[default]
    Uncontacted,
    Alliance,
    Peace,
    CeaseFire,
    War,
}

impl Stance {
    pub const ALL: [Stance; 5] = [
        Stance::Uncontacted,
        Stance::Alliance,
        Stance::Peace,
        Stance::CeaseFire,
        Stance::War,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Stance::Uncontacted => "uncontacted",
            Stance::Alliance => "alliance",
            Stance::Peace => "peace",
            Stance::CeaseFire => "cease_fire",
            Stance::War => "war",
        }
    }

    /// Transitions a request may make
    ///
    /// Leaving `Uncontacted` happens only through first contact, and
    /// nothing returns to it.
    pub fn can_transition_to(&self, to: Stance) -> bool {
        matches!(
            (self, to),
            (Stance::Alliance, Stance::Peace)
                | (Stance::Peace, Stance::Alliance)
                | (Stance::Peace, Stance::CeaseFire)
                | (Stance::Peace, Stance::War)
                | (Stance::CeaseFire, Stance::Peace)
                | (Stance::CeaseFire, Stance::War)
                | (Stance::War, Stance::CeaseFire)
        )
    }

    /// Tension delta applied when moving from `self` to `to`
    ///
    /// # Panics
    /// On pairs outside the modifier matrix. Callers validate the
    /// transition first, so reaching the panic means a broken invariant.
    pub fn tension_modifier(&self, to: Stance) -> i32 {
        match (to, self) {
            (Stance::Alliance, Stance::Alliance) => 0,
            (Stance::Alliance, Stance::Peace) => ALLIANCE_MODIFIER,
            (Stance::Alliance, Stance::CeaseFire) => ALLIANCE_MODIFIER + PEACE_TREATY_MODIFIER,
            (Stance::Alliance, Stance::War) => {
                ALLIANCE_MODIFIER + CEASE_FIRE_MODIFIER + PEACE_TREATY_MODIFIER
            }
            (Stance::Peace, Stance::Uncontacted) => CONTACT_MODIFIER,
            (Stance::Peace, Stance::Alliance) => DROP_ALLIANCE_MODIFIER,
            (Stance::Peace, Stance::Peace) => 0,
            (Stance::Peace, Stance::CeaseFire) => PEACE_TREATY_MODIFIER,
            (Stance::Peace, Stance::War) => CEASE_FIRE_MODIFIER + PEACE_TREATY_MODIFIER,
            (Stance::CeaseFire, Stance::Peace) => BREAK_PEACE_MODIFIER,
            (Stance::CeaseFire, Stance::CeaseFire) => 0,
            (Stance::CeaseFire, Stance::War) => CEASE_FIRE_MODIFIER,
            (Stance::War, Stance::CeaseFire) => RESUME_WAR_MODIFIER,
            (Stance::War, Stance::War) => 0,
            (Stance::War, _) => WAR_MODIFIER,
            (to, from) => panic!("bad stance transition: {} -> {}", from.key(), to.key()),
        }
    }

    /// Stance implied by a tension value, with a hysteresis margin
    pub fn from_tension(&self, tension: Tension, margin: i32) -> Stance {
        let value = tension.value();
        let escalates = value > TensionLevel::Hateful.limit() + margin;
        match self {
            Stance::War => {
                if value <= TensionLevel::Content.limit() - margin {
                    Stance::CeaseFire
                } else {
                    Stance::War
                }
            }
            Stance::CeaseFire => {
                if value <= TensionLevel::Happy.limit() - margin {
                    Stance::Peace
                } else if escalates {
                    Stance::War
                } else {
                    Stance::CeaseFire
                }
            }
            Stance::Alliance | Stance::Peace => {
                if escalates {
                    Stance::War
                } else {
                    *self
                }
            }
            Stance::Uncontacted => Stance::Uncontacted,
        }
    }

    /// Legal single steps leading from `self` to `to`
    ///
    /// Empty when already there; None when `to` cannot be reached
    /// without passing through `Uncontacted`.
    pub fn path_to(&self, to: Stance) -> Option<Vec<Stance>> {
        if *self == to {
            return Some(Vec::new());
        }
        if self.can_transition_to(to) {
            return Some(vec![to]);
        }
        Stance::ALL
            .into_iter()
            .find(|mid| self.can_transition_to(*mid) && mid.can_transition_to(to))
            .map(|mid| vec![mid, to])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_table() {
        assert!(Stance::Peace.can_transition_to(Stance::War));
        assert!(Stance::War.can_transition_to(Stance::CeaseFire));
        assert!(!Stance::War.can_transition_to(Stance::Peace));
        assert!(!Stance::Alliance.can_transition_to(Stance::War));
        assert!(!Stance::Uncontacted.can_transition_to(Stance::Peace));
        for s in Stance::ALL {
            assert!(!s.can_transition_to(Stance::Uncontacted));
        }
    }

    #[test]
    fn test_every_legal_transition_has_a_modifier() {
        for from in Stance::ALL {
            for to in Stance::ALL {
                if from.can_transition_to(to) {
                    let _ = from.tension_modifier(to);
                }
            }
        }
        assert_eq!(Stance::Uncontacted.tension_modifier(Stance::Peace), CONTACT_MODIFIER);
        assert_eq!(Stance::CeaseFire.tension_modifier(Stance::War), RESUME_WAR_MODIFIER);
    }

    #[test]
    #[should_panic(expected = "bad stance transition")]
    fn test_modifier_for_reentering_uncontacted_panics() {
        Stance::Peace.tension_modifier(Stance::Uncontacted);
    }

    #[test]
    fn test_hysteresis_boundaries() {
        let margin = 10;
        let content = TensionLevel::Content.limit();
        assert_eq!(Stance::War.from_tension(Tension::new(content - margin), margin), Stance::CeaseFire);
        assert_eq!(Stance::War.from_tension(Tension::new(content - margin + 1), margin), Stance::War);

        let hateful = TensionLevel::Hateful.limit();
        assert_eq!(Stance::Peace.from_tension(Tension::new(hateful + margin), margin), Stance::Peace);
        assert_eq!(Stance::Peace.from_tension(Tension::new(hateful + margin + 1), margin), Stance::War);

        let happy = TensionLevel::Happy.limit();
        assert_eq!(Stance::CeaseFire.from_tension(Tension::new(happy - margin), margin), Stance::Peace);
        assert_eq!(Stance::CeaseFire.from_tension(Tension::new(happy), margin), Stance::CeaseFire);
    }

    #[test]
    fn test_path_through_peace() {
        assert_eq!(Stance::Alliance.path_to(Stance::War), Some(vec![Stance::Peace, Stance::War]));
        assert_eq!(Stance::War.path_to(Stance::Peace), Some(vec![Stance::CeaseFire, Stance::Peace]));
        assert_eq!(Stance::Peace.path_to(Stance::Uncontacted), None);
    }
}
