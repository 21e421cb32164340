// src/attacker.rs
//
// Probabilistic attacker: occurrence, target layer, intensity and success.
//
// Draw order per timestep is fixed for reproducibility:
//   occurrence -> target -> intensity   (sample_attacker_event)
//   success                             (resolve_attack, only if targeted)
// A step without an attack consumes exactly one draw here.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::rng::DrawSource;
use crate::state::{clamp01, SimState};
use crate::types::{AttackTarget, Intensity};

/// What the attacker attempts this timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackerEvent {
    pub target: AttackTarget,
    pub intensity: Intensity,
}

impl AttackerEvent {
    pub const NONE: AttackerEvent = AttackerEvent {
        target: AttackTarget::None,
        intensity: Intensity::None,
    };

    pub fn is_attack(&self) -> bool {
        self.target != AttackTarget::None
    }
}

/// Result of resolving an attempted attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub p_success: f64,
    pub success: bool,
}

/// P(HIGH) = clamp01(p_high_base * exp(-k_deterrence * id_cap)).
pub fn high_intensity_probability(cfg: &Config, state: &SimState) -> f64 {
    let a = &cfg.attacker;
    clamp01(a.p_high_base * (-a.k_deterrence * state.id_cap).exp())
}

/// Probability that an attack lands on the OT layer.
pub fn ot_target_probability(cfg: &Config, state: &SimState) -> f64 {
    let a = &cfg.attacker;
    let mut p_ot = a.p_ot_given_attack_base;
    if state.it_comp {
        p_ot += a.p_ot_bonus_if_it_comp;
    }
    if state.ot_vuln >= a.ot_high_vuln_threshold {
        p_ot += a.p_ot_bonus_if_ot_high_vuln;
    }
    clamp01(p_ot)
}

/// Sample whether an attack occurs and, if so, its target and intensity.
pub fn sample_attacker_event<R: DrawSource + ?Sized>(
    cfg: &Config,
    state: &SimState,
    rng: &mut R,
) -> AttackerEvent {
    if rng.uniform() >= cfg.attacker.p_attack {
        return AttackerEvent::NONE;
    }

    let target = if rng.bernoulli(ot_target_probability(cfg, state)) {
        AttackTarget::Ot
    } else {
        AttackTarget::It
    };

    let intensity = if rng.bernoulli(high_intensity_probability(cfg, state)) {
        Intensity::High
    } else {
        Intensity::Low
    };

    AttackerEvent { target, intensity }
}

/// Success probability of an attack on `target` at `intensity`.
pub fn attack_success_probability(
    cfg: &Config,
    state: &SimState,
    target: AttackTarget,
    intensity: Intensity,
) -> f64 {
    let vuln = match target {
        AttackTarget::None => return 0.0,
        AttackTarget::It => state.it_vuln,
        AttackTarget::Ot => state.ot_vuln,
    };

    let mut p = cfg.attacker.base_success_mult * vuln;
    if intensity == Intensity::High {
        p += cfg.attacker.high_success_bonus;
    }
    clamp01(p)
}

/// Resolve an attack. On success the targeted layer becomes compromised.
pub fn resolve_attack<R: DrawSource + ?Sized>(
    cfg: &Config,
    state: &mut SimState,
    rng: &mut R,
    event: AttackerEvent,
) -> AttackOutcome {
    if !event.is_attack() {
        return AttackOutcome {
            p_success: 0.0,
            success: false,
        };
    }

    let p_success = attack_success_probability(cfg, state, event.target, event.intensity);
    let success = rng.bernoulli(p_success);

    if success {
        match event.target {
            AttackTarget::It => state.it_comp = true,
            AttackTarget::Ot => state.ot_comp = true,
            AttackTarget::None => {}
        }
    }

    AttackOutcome { p_success, success }
}
