//! Goods container - per-colony stored goods

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rules::GoodsTypeId;

/// Stored goods plus the amounts saved at the start of the turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoodsContainer {
    stored: BTreeMap<GoodsTypeId, u32>,
    #[serde(default)]
    old: BTreeMap<GoodsTypeId, u32>,
}

impl GoodsContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amount(&self, goods: GoodsTypeId) -> u32 {
        self.stored.get(&goods).copied().unwrap_or(0)
    }

    /// Amount recorded by the last `save_state`
    pub fn old_amount(&self, goods: GoodsTypeId) -> u32 {
        self.old.get(&goods).copied().unwrap_or(0)
    }

    pub fn add(&mut self, goods: GoodsTypeId, amount: u32) {
        if amount == 0 {
            return;
        }
        *self.stored.entry(goods).or_insert(0) += amount;
    }

    /// Remove up to `amount`; returns the amount actually removed
    pub fn remove(&mut self, goods: GoodsTypeId, amount: u32) -> u32 {
        let Some(current) = self.stored.get_mut(&goods) else { return 0 };
        let removed = amount.min(*current);
        *current -= removed;
        if *current == 0 {
            self.stored.remove(&goods);
        }
        removed
    }

    /// Remove everything of one type; returns what was there
    pub fn remove_all(&mut self, goods: GoodsTypeId) -> u32 {
        self.stored.remove(&goods).unwrap_or(0)
    }

    pub fn set(&mut self, goods: GoodsTypeId, amount: u32) {
        if amount == 0 {
            self.stored.remove(&goods);
        } else {
            self.stored.insert(goods, amount);
        }
    }

    /// Apply a signed net change, clamping at zero
    ///
    /// Returns true when the combined total would have gone negative.
    pub fn apply_net(&mut self, goods: GoodsTypeId, net: i32) -> bool {
        let stored = self.amount(goods) as i64;
        let total = stored + net as i64;
        if total <= 0 {
            self.remove_all(goods);
            total < 0
        } else {
            self.set(goods, total as u32);
            false
        }
    }

    pub fn has_all(&self, requirements: &[(GoodsTypeId, u32)]) -> bool {
        requirements.iter().all(|(g, n)| self.amount(*g) >= *n)
    }

    /// Remember current amounts for end-of-turn comparisons
    pub fn save_state(&mut self) {
        self.old = self.stored.clone();
    }

    /// Non-empty entries in goods order
    pub fn iter(&self) -> impl Iterator<Item = (GoodsTypeId, u32)> + '_ {
        self.stored.iter().map(|(g, n)| (*g, *n))
    }

    pub fn is_empty(&self) -> bool {
        self.stored.is_empty()
    }
}
