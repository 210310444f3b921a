//! Colony siting - read-only scoring of candidate settlement sites

pub mod claim;
pub mod value;

pub use claim::{
    can_claim_free_center_tile, can_own_tile_reason, claim_for_settlement_reason, claim_to_found_reason,
    is_in_use, land_price, NoClaimReason,
};
pub use value::{colony_value, colony_values, rank_sites, ColonyValue, ColonyValueCategory, NoValueType};
