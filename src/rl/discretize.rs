// src/rl/discretize.rs
//
// State discretization for the tabular agent.
//
// Continuous fields are binned into three levels with two thresholds per
// field; compromise flags pass through as 0/1. The key space is
// 2 x 2 x 3 x 3 x 3 = 108.

use serde::{Deserialize, Serialize};

use crate::config::{BinThresholds, Config};
use crate::state::SimState;

/// Number of distinct keys `discretize` can produce.
pub const STATE_SPACE_SIZE: usize = 2 * 2 * 3 * 3 * 3;

/// Lookup key into the value table.
///
/// Field order matches the derived `Ord`, so BTreeMap iteration walks keys
/// lexicographically by (it_comp, ot_comp, id_cap_bin, damage_bin, outage_bin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscreteState {
    pub it_comp: u8,
    pub ot_comp: u8,
    pub id_cap_bin: u8,
    pub damage_bin: u8,
    pub outage_bin: u8,
}

impl DiscreteState {
    /// Dense index in [0, STATE_SPACE_SIZE).
    pub fn ordinal(&self) -> usize {
        let mut i = self.it_comp as usize;
        i = i * 2 + self.ot_comp as usize;
        i = i * 3 + self.id_cap_bin as usize;
        i = i * 3 + self.damage_bin as usize;
        i * 3 + self.outage_bin as usize
    }

    pub fn is_valid(&self) -> bool {
        self.it_comp <= 1
            && self.ot_comp <= 1
            && self.id_cap_bin <= 2
            && self.damage_bin <= 2
            && self.outage_bin <= 2
    }
}

/// 0 if `x < lo`, 1 if `lo <= x < high`, else 2.
#[inline]
pub fn bin(x: f64, lo: f64, high: f64) -> u8 {
    if x < lo {
        0
    } else if x < high {
        1
    } else {
        2
    }
}

#[inline]
fn bin_with(x: f64, t: BinThresholds) -> u8 {
    bin(x, t.lo, t.high)
}

/// Map the current state onto its table key.
pub fn discretize(cfg: &Config, state: &SimState) -> DiscreteState {
    let rl = &cfg.rl;
    DiscreteState {
        it_comp: u8::from(state.it_comp),
        ot_comp: u8::from(state.ot_comp),
        id_cap_bin: bin_with(state.id_cap, rl.id_cap_bins),
        damage_bin: bin_with(state.phys_damage, rl.damage_bins),
        outage_bin: bin_with(state.outage, rl.outage_bins),
    }
}
