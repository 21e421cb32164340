// src/defender.rs
//
// Defender policy: choose an action for the current timestep, then turn it
// into state changes (PASSIVE) or transient boosts (ACTIVE / RECOVER) that
// the dynamics phases consume later in the same step.

use serde::{Deserialize, Serialize};

use crate::config::{Config, PolicyKind};
use crate::error::{SimError, SimResult};
use crate::rl::agent::QLearner;
use crate::rl::discretize::discretize;
use crate::rng::DrawSource;
use crate::state::{clamp01, governance_multiplier, SimState};
use crate::types::Action;

/// Action-derived adjustments, valid only within the step that made them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionEffect {
    pub detect_boost: f64,
    pub contain_boost: f64,
    pub recover_clear_boost: f64,
    pub downtime_reduction_boost: f64,
    pub active_damage_reduction: f64,
}

/// Fixed-priority heuristic (`threshold_v1`); first matching rule wins.
pub fn threshold_action(cfg: &Config, state: &SimState) -> Action {
    let p = &cfg.policy;

    if state.ot_comp {
        return Action::Recover;
    }
    if state.phys_damage >= p.phys_damage_threshold || state.outage >= p.outage_high_threshold {
        return Action::Recover;
    }
    if state.it_comp {
        return Action::Active;
    }
    if state.id_cap < p.id_cap_min_threshold {
        // Low identification capability: harden and build it up.
        return Action::Passive;
    }
    Action::Passive
}

/// Select the defender action according to `cfg.policy.kind`.
///
/// `qlearn_v1` only reads the agent's table; learning happens after the
/// step's dynamics have run.
pub fn choose_action<R: DrawSource + ?Sized>(
    cfg: &Config,
    state: &SimState,
    rng: &mut R,
    _t: u64,
    agent: Option<&QLearner>,
) -> SimResult<Action> {
    match cfg.policy.kind {
        PolicyKind::AlwaysPassive => Ok(Action::Passive),
        PolicyKind::Random => Action::from_index(rng.index(Action::COUNT)),
        PolicyKind::ThresholdV1 => Ok(threshold_action(cfg, state)),
        PolicyKind::QLearnV1 => {
            let agent = agent.ok_or(SimError::MissingAgent {
                policy: PolicyKind::QLearnV1.as_str(),
            })?;
            let s = discretize(cfg, state);
            Action::from_index(agent.select_action(&s, cfg.rl.epsilon, rng))
        }
    }
}

/// Apply the chosen action. PASSIVE mutates the state directly; the other
/// actions only populate boosts. All benefits scale with governance.
pub fn apply_defender_action(cfg: &Config, state: &mut SimState, action: Action) -> ActionEffect {
    let gm = governance_multiplier(cfg);
    let d = &cfg.defender;
    let mut effect = ActionEffect::default();

    match action {
        Action::Passive => {
            state.it_vuln = clamp01(state.it_vuln - gm * d.delta_it_vuln);
            state.ot_vuln = clamp01(state.ot_vuln - gm * d.delta_ot_vuln);
            state.id_cap = clamp01(state.id_cap + gm * d.delta_id_cap);
        }
        Action::Active => {
            effect.detect_boost = gm * d.delta_detect;
            effect.contain_boost = gm * d.delta_contain;
            effect.active_damage_reduction = clamp01(gm * d.active_damage_reduction);
        }
        Action::Recover => {
            effect.recover_clear_boost = gm * d.delta_recover_clear;
            effect.downtime_reduction_boost = clamp01(gm * d.delta_downtime_reduction);
        }
    }

    effect
}
