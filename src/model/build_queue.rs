//! Build queue - ordered buildables with a completion policy

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rules::Buildable;

/// What happens to a queue when its head completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionAction {
    /// Pop the finished item
    #[default]
    Remove,
    /// Pop unless it is the last item and a unit, which repeats
    RemoveExceptLast,
    /// Keep every item and reorder the queue
    Shuffle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildQueue {
    items: Vec<Buildable>,
    completion: CompletionAction,
}

impl BuildQueue {
    pub fn new(completion: CompletionAction) -> Self {
        Self {
            items: Vec::new(),
            completion,
        }
    }

    pub fn completion(&self) -> CompletionAction {
        self.completion
    }

    pub fn current(&self) -> Option<Buildable> {
        self.items.first().copied()
    }

    pub fn items(&self) -> &[Buildable] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: Buildable) {
        self.items.push(item);
    }

    pub fn set_items(&mut self, items: Vec<Buildable>) {
        self.items = items;
    }

    pub fn remove_current(&mut self) -> Option<Buildable> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    /// Retire the finished head according to the completion policy
    pub fn complete_current<R: Rng>(&mut self, rng: &mut R) {
        match self.completion {
            CompletionAction::Shuffle => {
                if self.items.len() > 1 {
                    self.items.shuffle(rng);
                }
            }
            CompletionAction::RemoveExceptLast => {
                let repeats = self.items.len() == 1 && matches!(self.current(), Some(Buildable::Unit(_)));
                if !repeats {
                    self.remove_current();
                }
            }
            CompletionAction::Remove => {
                self.remove_current();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{BuildingTypeId, UnitTypeId};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_remove_pops_head() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut q = BuildQueue::new(CompletionAction::Remove);
        q.push(Buildable::Building(BuildingTypeId(1)));
        q.push(Buildable::Unit(UnitTypeId(2)));
        q.complete_current(&mut rng);
        assert_eq!(q.current(), Some(Buildable::Unit(UnitTypeId(2))));
        q.complete_current(&mut rng);
        assert!(q.is_empty());
    }

    #[test]
    fn test_remove_except_last_repeats_final_unit() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut q = BuildQueue::new(CompletionAction::RemoveExceptLast);
        q.push(Buildable::Unit(UnitTypeId(0)));
        q.complete_current(&mut rng);
        assert_eq!(q.current(), Some(Buildable::Unit(UnitTypeId(0))));

        let mut q = BuildQueue::new(CompletionAction::RemoveExceptLast);
        q.push(Buildable::Building(BuildingTypeId(3)));
        q.complete_current(&mut rng);
        assert!(q.is_empty());
    }

    #[test]
    fn test_shuffle_keeps_all_items() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut q = BuildQueue::new(CompletionAction::Shuffle);
        for i in 0..6 {
            q.push(Buildable::Unit(UnitTypeId(i)));
        }
        q.complete_current(&mut rng);
        assert_eq!(q.len(), 6);
        let mut ids: Vec<u16> = q
            .items()
            .iter()
            .filter_map(|b| match b {
                Buildable::Unit(u) => Some(u.0),
                _ => None,
            })
            .collect();
        ids.sort();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    }
}
