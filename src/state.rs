// src/state.rs
//
// Mutable per-run infrastructure state, plus the two scalar helpers every
// phase leans on (`clamp01`, `governance_multiplier`).
//
// Bounded fields (it_vuln, ot_vuln, id_cap, outage) are kept in [0,1] by an
// explicit clamp at every write site; downtime and phys_damage are
// non-negative accumulators.

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Clip `x` into [0, 1].
#[inline]
pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Institutional strength scalar `0.5 + 0.5 * clamp01(G)`, in [0.5, 1.0].
pub fn governance_multiplier(cfg: &Config) -> f64 {
    0.5 + 0.5 * clamp01(cfg.governance)
}

/// Current infrastructure condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimState {
    // ----- Hardening / capability levels, each in [0,1] -----
    pub it_vuln: f64,
    pub ot_vuln: f64,
    /// Identification capability; deters HIGH intensity attacks.
    pub id_cap: f64,

    // ----- Compromise flags -----
    pub it_comp: bool,
    pub ot_comp: bool,

    // ----- Accumulators -----
    pub downtime: f64,
    pub phys_damage: f64,
    /// Smoothed service outage level in [0,1].
    pub outage: f64,
}

impl SimState {
    /// Build the initial state from the `*_init` parameters.
    pub fn new(cfg: &Config) -> Self {
        let init = &cfg.initial;
        Self {
            it_vuln: clamp01(init.it_vuln),
            ot_vuln: clamp01(init.ot_vuln),
            id_cap: clamp01(init.id_cap),
            it_comp: init.it_comp,
            ot_comp: init.ot_comp,
            downtime: init.downtime.max(0.0),
            phys_damage: init.phys_damage.max(0.0),
            outage: clamp01(init.outage),
        }
    }

    /// True if either layer is compromised.
    pub fn any_compromised(&self) -> bool {
        self.it_comp || self.ot_comp
    }

    /// Name of the first field outside its documented range, if any.
    pub fn bounds_violation(&self) -> Option<&'static str> {
        let unit = |x: f64| (0.0..=1.0).contains(&x);
        if !unit(self.it_vuln) {
            return Some("it_vuln");
        }
        if !unit(self.ot_vuln) {
            return Some("ot_vuln");
        }
        if !unit(self.id_cap) {
            return Some("id_cap");
        }
        if !unit(self.outage) {
            return Some("outage");
        }
        if !(self.downtime >= 0.0) {
            return Some("downtime");
        }
        if !(self.phys_damage >= 0.0) {
            return Some("phys_damage");
        }
        None
    }

    /// Pre-action snapshot for the trajectory log.
    pub fn snapshot(&self, cfg: &Config, t: u64) -> StateSnapshot {
        StateSnapshot {
            t,
            g: clamp01(cfg.governance),
            gov_mult: governance_multiplier(cfg),
            it_vuln: self.it_vuln,
            ot_vuln: self.ot_vuln,
            id_cap: self.id_cap,
            it_comp: self.it_comp,
            ot_comp: self.ot_comp,
            downtime: self.downtime,
            phys_damage: self.phys_damage,
            outage: self.outage,
        }
    }
}

/// Pre-action view of the state at the start of timestep `t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub t: u64,
    #[serde(rename = "G")]
    pub g: f64,
    pub gov_mult: f64,
    pub it_vuln: f64,
    pub ot_vuln: f64,
    pub id_cap: f64,
    pub it_comp: bool,
    pub ot_comp: bool,
    pub downtime: f64,
    pub phys_damage: f64,
    pub outage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp01_clips_both_sides() {
        assert_eq!(clamp01(-0.3), 0.0);
        assert_eq!(clamp01(0.42), 0.42);
        assert_eq!(clamp01(1.7), 1.0);
    }

    #[test]
    fn governance_multiplier_spans_half_to_one() {
        let mut cfg = Config::default();
        cfg.governance = -2.0;
        assert_eq!(governance_multiplier(&cfg), 0.5);
        cfg.governance = 5.0;
        assert_eq!(governance_multiplier(&cfg), 1.0);
        cfg.governance = 0.6;
        assert!((governance_multiplier(&cfg) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn initial_state_clamps_out_of_range_inits() {
        let mut cfg = Config::default();
        cfg.initial.it_vuln = 1.4;
        cfg.initial.id_cap = -0.1;
        cfg.initial.phys_damage = -3.0;
        let s = SimState::new(&cfg);
        assert_eq!(s.it_vuln, 1.0);
        assert_eq!(s.id_cap, 0.0);
        assert_eq!(s.phys_damage, 0.0);
        assert!(s.bounds_violation().is_none());
    }

    #[test]
    fn default_initial_state_matches_config() {
        let cfg = Config::default();
        let s = SimState::new(&cfg);
        assert_eq!(s.it_vuln, 0.6);
        assert_eq!(s.ot_vuln, 0.7);
        assert_eq!(s.id_cap, 0.2);
        assert!(!s.any_compromised());
    }
}
