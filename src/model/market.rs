//! Market - sale prices and the per-player sales ledger

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rules::{GoodsTypeId, RuleTable};

/// Units sold before the price drops by one
pub const PRICE_DROP_VOLUME: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub sold: u32,
    pub income: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Market {
    sales: BTreeMap<GoodsTypeId, SalesRecord>,
}

impl Market {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current per-unit price; falls as volume is sold, never below 1
    pub fn sale_price(&self, rules: &RuleTable, goods: GoodsTypeId) -> u32 {
        let base = rules.goods(goods).price;
        if base == 0 {
            return 0;
        }
        let drop = self.record(goods).sold / PRICE_DROP_VOLUME;
        base.saturating_sub(drop).max(1)
    }

    /// Sell goods, returning income after tax
    pub fn sell(&mut self, rules: &RuleTable, goods: GoodsTypeId, amount: u32, tax: u32) -> i64 {
        let gross = self.sale_price(rules, goods) as i64 * amount as i64;
        let net = gross - gross * tax.min(100) as i64 / 100;
        let record = self.sales.entry(goods).or_default();
        record.sold += amount;
        record.income += net;
        net
    }

    pub fn record(&self, goods: GoodsTypeId) -> SalesRecord {
        self.sales.get(&goods).copied().unwrap_or_default()
    }

    pub fn records(&self) -> impl Iterator<Item = (GoodsTypeId, SalesRecord)> + '_ {
        self.sales.iter().map(|(g, r)| (*g, *r))
    }
}
