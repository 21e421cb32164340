// src/dynamics.rs
//
// Per-step dynamics after the attack has been resolved. The orchestrator
// calls these in a fixed order; each reads what the previous one wrote:
//
//   1. detection_and_containment_step   (draws: 0-2 per compromised layer)
//   2. physical_damage_step             (deterministic)
//   3. downtime_update_step             (deterministic)
//   4. recovery_resolution_step         (draws: 1 per compromised layer, RECOVER only)
//   5. damage_persistence_step          (deterministic)
//   6. outage_update_step               (deterministic)

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::defender::ActionEffect;
use crate::rng::DrawSource;
use crate::state::{clamp01, SimState};
use crate::types::{Action, Intensity};

/// Outcome of detection / containment for both layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionOutcome {
    pub it_detected: bool,
    pub it_contained: bool,
    pub ot_detected: bool,
    pub ot_contained: bool,
    /// Compromise flags after containment, before recovery.
    pub it_comp_post: bool,
    pub ot_comp_post: bool,
}

/// Outcome of the RECOVER-only recovery phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryOutcome {
    pub recovery_it_cleared: bool,
    pub recovery_ot_cleared: bool,
    /// Absolute physical damage removed by recovery.
    pub damage_reduction: f64,
}

/// Detect then contain one layer. Uncompromised layers draw nothing.
fn detect_and_contain_one<R: DrawSource + ?Sized>(
    cfg: &Config,
    comp: &mut bool,
    rng: &mut R,
    effect: &ActionEffect,
) -> (bool, bool) {
    if !*comp {
        return (false, false);
    }

    let p_detect = clamp01(cfg.defender.p_detect_base + effect.detect_boost);
    if !rng.bernoulli(p_detect) {
        return (false, false);
    }

    let p_contain = clamp01(cfg.defender.p_contain_base + effect.contain_boost);
    let contained = rng.bernoulli(p_contain);
    if contained {
        *comp = false;
    }
    (true, contained)
}

/// Phase 1: IT then OT, independently.
pub fn detection_and_containment_step<R: DrawSource + ?Sized>(
    cfg: &Config,
    state: &mut SimState,
    rng: &mut R,
    effect: &ActionEffect,
) -> DetectionOutcome {
    let (it_detected, it_contained) = detect_and_contain_one(cfg, &mut state.it_comp, rng, effect);
    let (ot_detected, ot_contained) = detect_and_contain_one(cfg, &mut state.ot_comp, rng, effect);

    DetectionOutcome {
        it_detected,
        it_contained,
        ot_detected,
        ot_contained,
        it_comp_post: state.it_comp,
        ot_comp_post: state.ot_comp,
    }
}

/// Phase 2: accrue physical damage while OT stays compromised.
///
/// Returns the damage added this step.
pub fn physical_damage_step(
    cfg: &Config,
    state: &mut SimState,
    intensity: Intensity,
    effect: &ActionEffect,
) -> f64 {
    if !state.ot_comp {
        return 0.0;
    }

    let dy = &cfg.dynamics;
    let mut damage = dy.base_damage;
    if intensity == Intensity::High {
        damage *= dy.high_damage_multiplier;
    }
    damage *= 1.0 - effect.active_damage_reduction;

    state.phys_damage = (state.phys_damage + damage).max(0.0);
    damage
}

/// Phase 3: downtime accrues from compromise and accumulated damage.
///
/// Returns the gross increment before decay / RECOVER reduction.
pub fn downtime_update_step(
    cfg: &Config,
    state: &mut SimState,
    effect: &ActionEffect,
    action: Action,
) -> f64 {
    let dy = &cfg.dynamics;
    let comp_present = if state.any_compromised() { 1.0 } else { 0.0 };

    let increment = dy.downtime_comp_cost * comp_present + dy.downtime_damage_cost * state.phys_damage;

    let mut downtime = (state.downtime + increment - dy.downtime_decay).max(0.0);
    if action == Action::Recover {
        downtime = (downtime * (1.0 - effect.downtime_reduction_boost)).max(0.0);
    }

    state.downtime = downtime;
    increment
}

/// Phase 4: RECOVER may clear compromise (even undetected) and shave damage.
pub fn recovery_resolution_step<R: DrawSource + ?Sized>(
    cfg: &Config,
    state: &mut SimState,
    rng: &mut R,
    effect: &ActionEffect,
    action: Action,
) -> RecoveryOutcome {
    let mut out = RecoveryOutcome::default();
    if action != Action::Recover {
        return out;
    }

    let dy = &cfg.dynamics;
    let p_clear = clamp01(dy.p_recover_clear_base + effect.recover_clear_boost);

    if state.it_comp && rng.bernoulli(p_clear) {
        state.it_comp = false;
        out.recovery_it_cleared = true;
    }
    if state.ot_comp && rng.bernoulli(p_clear) {
        state.ot_comp = false;
        out.recovery_ot_cleared = true;
    }

    let frac = clamp01(dy.damage_recover_decay);
    if frac > 0.0 {
        let before = state.phys_damage;
        let after = (before * (1.0 - frac)).max(0.0);
        state.phys_damage = after;
        out.damage_reduction = before - after;
    }

    out
}

/// Phase 5: background maintenance decays damage every step.
pub fn damage_persistence_step(cfg: &Config, state: &mut SimState) {
    state.phys_damage = (state.phys_damage * cfg.dynamics.damage_persistence).max(0.0);
}

/// Phase 6: exponentially smoothed outage from final compromise and damage.
///
/// Returns the raw (pre-smoothing) outage pressure.
pub fn outage_update_step(cfg: &Config, state: &mut SimState) -> f64 {
    let dy = &cfg.dynamics;
    let comp_present = if state.any_compromised() { 1.0 } else { 0.0 };

    let raw = dy.outage_comp_cost * comp_present + dy.outage_damage_cost * state.phys_damage;
    state.outage = clamp01((1.0 - dy.outage_decay) * state.outage + raw);
    raw
}
