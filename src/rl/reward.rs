// src/rl/reward.rs
//
// Per-step reward shaping.
//
//   loss   = w_damage_step * damage_step
//          + w_outage      * outage_next
//          + w_it_comp     * it_comp_end
//          + w_ot_comp     * ot_comp_end
//          + w_phys_damage * phys_damage_next
//   cost   = cost_active (ACTIVE) | cost_recover (RECOVER) | 0 (PASSIVE)
//   reward = -(loss + cost)

use serde::{Deserialize, Serialize};

use crate::config::{Config, RewardWeights};
use crate::types::Action;

/// Raw inputs to the reward, kept separately for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardComponents {
    /// Physical damage accrued this step (before recovery / decay).
    pub damage_step: f64,
    pub phys_damage_next: f64,
    pub outage_next: f64,
    pub it_comp_end: bool,
    pub ot_comp_end: bool,
    pub action: Option<Action>,
}

impl RewardComponents {
    /// Weighted operational loss, excluding the action cost.
    pub fn loss(&self, w: &RewardWeights) -> f64 {
        w.w_damage_step * self.damage_step
            + w.w_outage * self.outage_next
            + w.w_it_comp * f64::from(u8::from(self.it_comp_end))
            + w.w_ot_comp * f64::from(u8::from(self.ot_comp_end))
            + w.w_phys_damage * self.phys_damage_next
    }

    pub fn action_cost(&self, w: &RewardWeights) -> f64 {
        match self.action {
            Some(Action::Active) => w.cost_active,
            Some(Action::Recover) => w.cost_recover,
            Some(Action::Passive) | None => 0.0,
        }
    }

    pub fn compute_reward(&self, w: &RewardWeights) -> f64 {
        -(self.loss(w) + self.action_cost(w))
    }
}

/// Scalar reward for one transition.
pub fn reward(
    cfg: &Config,
    damage_step: f64,
    phys_damage_next: f64,
    outage_next: f64,
    it_comp_end: bool,
    ot_comp_end: bool,
    action: Action,
) -> f64 {
    RewardComponents {
        damage_step,
        phys_damage_next,
        outage_next,
        it_comp_end,
        ot_comp_end,
        action: Some(action),
    }
    .compute_reward(&cfg.rl.reward)
}
