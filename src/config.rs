// src/config.rs
//
// Central configuration for a simulation run.
// Every probability, multiplier and threshold used by the attacker model,
// defender policy, dynamics engine and RL subsystem lives here, grouped
// into sub-configs. Values are immutable for the duration of a run; any
// per-scenario override happens before the run starts.
//
// The flat parameter names (`p_attack`, `rl_epsilon`, `G`, ...)
// remain addressable through `set_param` / `get_param`, which is what the
// YAML loader and the `BASTION_*` environment overrides go through.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Human-readable config version.
    pub version: String,
    /// Number of timesteps per run (`T`).
    pub horizon: u64,
    /// Seed for the per-run random stream.
    pub seed: u64,
    /// Governance strength `G`; scales every defender-action benefit.
    pub governance: f64,
    pub initial: InitialConfig,
    pub attacker: AttackerConfig,
    pub defender: DefenderConfig,
    pub dynamics: DynamicsConfig,
    pub policy: PolicyConfig,
    pub rl: RlConfig,
}

/// Initial defender state (the `*_init` parameters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialConfig {
    pub it_vuln: f64,
    pub ot_vuln: f64,
    pub id_cap: f64,
    pub it_comp: bool,
    pub ot_comp: bool,
    pub downtime: f64,
    pub phys_damage: f64,
    pub outage: f64,
}

/// Attack occurrence, targeting, intensity and success parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackerConfig {
    /// Per-step probability that an attack occurs.
    pub p_attack: f64,
    /// Base probability that an attack targets OT rather than IT.
    pub p_ot_given_attack_base: f64,
    /// Added to the OT probability while IT is compromised (pivoting).
    pub p_ot_bonus_if_it_comp: f64,
    /// Added to the OT probability while OT vulnerability is high.
    pub p_ot_bonus_if_ot_high_vuln: f64,
    pub ot_high_vuln_threshold: f64,
    pub base_success_mult: f64,
    /// Additive success bonus for HIGH intensity attacks.
    pub high_success_bonus: f64,
    /// P(HIGH) at zero identification capability.
    pub p_high_base: f64,
    /// Exponential deterrence rate of identification capability.
    pub k_deterrence: f64,
}

/// Defender action effects (before the governance multiplier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenderConfig {
    // ----- PASSIVE -----
    pub delta_it_vuln: f64,
    pub delta_ot_vuln: f64,
    pub delta_id_cap: f64,

    // ----- Detection / containment -----
    pub p_detect_base: f64,
    pub p_contain_base: f64,

    // ----- ACTIVE -----
    pub delta_detect: f64,
    pub delta_contain: f64,
    pub active_damage_reduction: f64,

    // ----- RECOVER -----
    pub delta_recover_clear: f64,
    pub delta_downtime_reduction: f64,
}

/// Damage, downtime, outage and recovery coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicsConfig {
    /// Damage per step while OT is compromised (LOW intensity).
    pub base_damage: f64,
    pub high_damage_multiplier: f64,
    /// Per-step retention of physical damage (1.0 = no decay).
    pub damage_persistence: f64,

    pub downtime_comp_cost: f64,
    pub downtime_damage_cost: f64,
    pub downtime_decay: f64,

    pub p_recover_clear_base: f64,
    /// Fraction of physical damage removed by a RECOVER step.
    pub damage_recover_decay: f64,

    pub outage_decay: f64,
    pub outage_comp_cost: f64,
    pub outage_damage_cost: f64,
}

/// Defender policy selection and threshold-heuristic parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub kind: PolicyKind,
    pub id_cap_min_threshold: f64,
    pub phys_damage_threshold: f64,
    pub outage_high_threshold: f64,
}

/// Two-threshold, three-level binning of a continuous state field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinThresholds {
    pub lo: f64,
    pub high: f64,
}

/// Per-step loss weights; reward = -(weighted loss + action cost).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardWeights {
    pub w_damage_step: f64,
    pub w_outage: f64,
    pub w_it_comp: f64,
    pub w_ot_comp: f64,
    /// Penalises the accumulated damage stock, not just the per-step flow.
    pub w_phys_damage: f64,
    pub cost_active: f64,
    pub cost_recover: f64,
}

/// Tabular Q-learning hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RlConfig {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    /// Training mode. When false the Q-table is never mutated.
    pub learn: bool,
    pub id_cap_bins: BinThresholds,
    pub damage_bins: BinThresholds,
    pub outage_bins: BinThresholds,
    pub reward: RewardWeights,
}

/// Defender policy variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    #[serde(rename = "always_passive")]
    AlwaysPassive,
    #[serde(rename = "random")]
    Random,
    #[default]
    #[serde(rename = "threshold_v1")]
    ThresholdV1,
    #[serde(rename = "qlearn_v1")]
    QLearnV1,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::AlwaysPassive,
        PolicyKind::Random,
        PolicyKind::ThresholdV1,
        PolicyKind::QLearnV1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::AlwaysPassive => "always_passive",
            PolicyKind::Random => "random",
            PolicyKind::ThresholdV1 => "threshold_v1",
            PolicyKind::QLearnV1 => "qlearn_v1",
        }
    }

    /// Parse a policy name. Unknown names are a fatal configuration error.
    pub fn parse(s: &str) -> Result<PolicyKind, ConfigError> {
        match s.trim() {
            "always_passive" => Ok(PolicyKind::AlwaysPassive),
            "random" => Ok(PolicyKind::Random),
            "threshold_v1" => Ok(PolicyKind::ThresholdV1),
            "qlearn_v1" => Ok(PolicyKind::QLearnV1),
            other => Err(ConfigError::UnknownPolicy {
                name: other.to_string(),
            }),
        }
    }

    pub fn is_qlearn(&self) -> bool {
        matches!(self, PolicyKind::QLearnV1)
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse threat level preset used by the harnesses.
///
/// Only `p_attack` differs between presets; `Baseline` is the default table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatProfile {
    Low,
    Baseline,
    High,
}

impl ThreatProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatProfile::Low => "low",
            ThreatProfile::Baseline => "baseline",
            ThreatProfile::High => "high",
        }
    }

    /// Parse a profile name (case-insensitive). Returns None if unrecognized.
    pub fn parse(s: &str) -> Option<ThreatProfile> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Some(ThreatProfile::Low),
            "baseline" | "base" | "b" => Some(ThreatProfile::Baseline),
            "high" | "h" => Some(ThreatProfile::High),
            _ => None,
        }
    }

    pub fn p_attack(&self) -> f64 {
        match self {
            ThreatProfile::Low => 0.10,
            ThreatProfile::Baseline => 0.35,
            ThreatProfile::High => 0.60,
        }
    }
}

/// A single flat parameter value: numeric or textual.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Interpret a raw string (env var, CLI) as a number when possible.
    pub fn from_raw(raw: &str) -> ParamValue {
        match raw.trim().parse::<f64>() {
            Ok(v) => ParamValue::Number(v),
            Err(_) => ParamValue::Text(raw.trim().to_string()),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(v) => write!(f, "{v}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

/// Every recognised flat parameter name.
pub const PARAM_NAMES: &[&str] = &[
    "T",
    "Seed",
    "G",
    "it_vuln_init",
    "ot_vuln_init",
    "id_cap_init",
    "it_comp_init",
    "ot_comp_init",
    "downtime_init",
    "phys_damage_init",
    "outage_init",
    "p_attack",
    "p_ot_given_attack_base",
    "p_ot_bonus_if_it_comp",
    "p_ot_bonus_if_ot_high_vuln",
    "ot_high_vuln_threshold",
    "base_success_mult",
    "high_success_bonus",
    "p_high_base",
    "k_deterrence",
    "delta_it_vuln",
    "delta_ot_vuln",
    "delta_id_cap",
    "p_detect_base",
    "p_contain_base",
    "delta_detect",
    "delta_contain",
    "active_damage_reduction",
    "delta_recover_clear",
    "delta_downtime_reduction",
    "base_damage",
    "high_damage_multiplier",
    "damage_persistence",
    "downtime_comp_cost",
    "downtime_damage_cost",
    "downtime_decay",
    "p_recover_clear_base",
    "damage_recover_decay",
    "outage_decay",
    "outage_comp_cost",
    "outage_damage_cost",
    "defender_policy",
    "id_cap_min_threshold",
    "phys_damage_threshold",
    "outage_high_threshold",
    "rl_alpha",
    "rl_gamma",
    "rl_epsilon",
    "rl_learn",
    "rl_id_cap_lo",
    "rl_id_cap_high",
    "rl_damage_lo",
    "rl_damage_high",
    "rl_outage_lo",
    "rl_outage_high",
    "rl_w_damage_step",
    "rl_w_outage",
    "rl_w_it_comp",
    "rl_w_ot_comp",
    "rl_w_phys_damage",
    "rl_cost_active",
    "rl_cost_recover",
];

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "bastion-v0.1".to_string(),
            horizon: 500,
            seed: 1,
            governance: 0.6,
            initial: InitialConfig {
                it_vuln: 0.6,
                ot_vuln: 0.7,
                id_cap: 0.2,
                it_comp: false,
                ot_comp: false,
                downtime: 0.0,
                phys_damage: 0.0,
                outage: 0.0,
            },
            attacker: AttackerConfig {
                p_attack: 0.35,
                p_ot_given_attack_base: 0.35,
                p_ot_bonus_if_it_comp: 0.20,
                p_ot_bonus_if_ot_high_vuln: 0.20,
                ot_high_vuln_threshold: 0.7,
                base_success_mult: 1.0,
                high_success_bonus: 0.25,
                p_high_base: 0.50,
                k_deterrence: 2.0,
            },
            defender: DefenderConfig {
                delta_it_vuln: 0.04,
                delta_ot_vuln: 0.02,
                delta_id_cap: 0.03,
                p_detect_base: 0.10,
                p_contain_base: 0.20,
                delta_detect: 0.25,
                delta_contain: 0.25,
                active_damage_reduction: 0.35,
                delta_recover_clear: 0.30,
                delta_downtime_reduction: 0.40,
            },
            dynamics: DynamicsConfig {
                base_damage: 0.02,
                high_damage_multiplier: 3.0,
                damage_persistence: 0.95,
                downtime_comp_cost: 0.05,
                downtime_damage_cost: 0.02,
                downtime_decay: 0.0,
                p_recover_clear_base: 0.10,
                damage_recover_decay: 0.05,
                outage_decay: 0.60,
                outage_comp_cost: 0.40,
                outage_damage_cost: 0.20,
            },
            policy: PolicyConfig {
                kind: PolicyKind::ThresholdV1,
                id_cap_min_threshold: 0.30,
                phys_damage_threshold: 0.50,
                outage_high_threshold: 0.60,
            },
            rl: RlConfig {
                alpha: 0.15,
                gamma: 0.95,
                epsilon: 0.20,
                learn: true,
                id_cap_bins: BinThresholds {
                    lo: 0.33,
                    high: 0.66,
                },
                damage_bins: BinThresholds {
                    lo: 0.25,
                    high: 0.75,
                },
                outage_bins: BinThresholds {
                    lo: 0.25,
                    high: 0.60,
                },
                reward: RewardWeights {
                    w_damage_step: 5.0,
                    w_outage: 2.0,
                    w_it_comp: 0.5,
                    w_ot_comp: 2.0,
                    w_phys_damage: 2.0,
                    cost_active: 0.05,
                    cost_recover: 0.10,
                },
            },
        }
    }
}

impl Config {
    /// Default table with `p_attack` taken from the threat preset.
    pub fn for_threat(profile: ThreatProfile) -> Self {
        let mut cfg = Config::default();
        cfg.attacker.p_attack = profile.p_attack();
        cfg
    }

    /// Builder-style policy override.
    pub fn with_policy(mut self, kind: PolicyKind) -> Self {
        self.policy.kind = kind;
        self
    }

    /// Governance multiplier `0.5 + 0.5 * clamp01(G)`, in [0.5, 1.0].
    pub fn governance_multiplier(&self) -> f64 {
        crate::state::governance_multiplier(self)
    }

    pub fn param_names() -> &'static [&'static str] {
        PARAM_NAMES
    }

    /// Mutable slot for every purely numeric (f64) parameter.
    fn numeric_slot(&mut self, name: &str) -> Option<&mut f64> {
        let slot = match name {
            "G" => &mut self.governance,
            "it_vuln_init" => &mut self.initial.it_vuln,
            "ot_vuln_init" => &mut self.initial.ot_vuln,
            "id_cap_init" => &mut self.initial.id_cap,
            "downtime_init" => &mut self.initial.downtime,
            "phys_damage_init" => &mut self.initial.phys_damage,
            "outage_init" => &mut self.initial.outage,
            "p_attack" => &mut self.attacker.p_attack,
            "p_ot_given_attack_base" => &mut self.attacker.p_ot_given_attack_base,
            "p_ot_bonus_if_it_comp" => &mut self.attacker.p_ot_bonus_if_it_comp,
            "p_ot_bonus_if_ot_high_vuln" => &mut self.attacker.p_ot_bonus_if_ot_high_vuln,
            "ot_high_vuln_threshold" => &mut self.attacker.ot_high_vuln_threshold,
            "base_success_mult" => &mut self.attacker.base_success_mult,
            "high_success_bonus" => &mut self.attacker.high_success_bonus,
            "p_high_base" => &mut self.attacker.p_high_base,
            "k_deterrence" => &mut self.attacker.k_deterrence,
            "delta_it_vuln" => &mut self.defender.delta_it_vuln,
            "delta_ot_vuln" => &mut self.defender.delta_ot_vuln,
            "delta_id_cap" => &mut self.defender.delta_id_cap,
            "p_detect_base" => &mut self.defender.p_detect_base,
            "p_contain_base" => &mut self.defender.p_contain_base,
            "delta_detect" => &mut self.defender.delta_detect,
            "delta_contain" => &mut self.defender.delta_contain,
            "active_damage_reduction" => &mut self.defender.active_damage_reduction,
            "delta_recover_clear" => &mut self.defender.delta_recover_clear,
            "delta_downtime_reduction" => &mut self.defender.delta_downtime_reduction,
            "base_damage" => &mut self.dynamics.base_damage,
            "high_damage_multiplier" => &mut self.dynamics.high_damage_multiplier,
            "damage_persistence" => &mut self.dynamics.damage_persistence,
            "downtime_comp_cost" => &mut self.dynamics.downtime_comp_cost,
            "downtime_damage_cost" => &mut self.dynamics.downtime_damage_cost,
            "downtime_decay" => &mut self.dynamics.downtime_decay,
            "p_recover_clear_base" => &mut self.dynamics.p_recover_clear_base,
            "damage_recover_decay" => &mut self.dynamics.damage_recover_decay,
            "outage_decay" => &mut self.dynamics.outage_decay,
            "outage_comp_cost" => &mut self.dynamics.outage_comp_cost,
            "outage_damage_cost" => &mut self.dynamics.outage_damage_cost,
            "id_cap_min_threshold" => &mut self.policy.id_cap_min_threshold,
            "phys_damage_threshold" => &mut self.policy.phys_damage_threshold,
            "outage_high_threshold" => &mut self.policy.outage_high_threshold,
            "rl_alpha" => &mut self.rl.alpha,
            "rl_gamma" => &mut self.rl.gamma,
            "rl_epsilon" => &mut self.rl.epsilon,
            "rl_id_cap_lo" => &mut self.rl.id_cap_bins.lo,
            "rl_id_cap_high" => &mut self.rl.id_cap_bins.high,
            "rl_damage_lo" => &mut self.rl.damage_bins.lo,
            "rl_damage_high" => &mut self.rl.damage_bins.high,
            "rl_outage_lo" => &mut self.rl.outage_bins.lo,
            "rl_outage_high" => &mut self.rl.outage_bins.high,
            "rl_w_damage_step" => &mut self.rl.reward.w_damage_step,
            "rl_w_outage" => &mut self.rl.reward.w_outage,
            "rl_w_it_comp" => &mut self.rl.reward.w_it_comp,
            "rl_w_ot_comp" => &mut self.rl.reward.w_ot_comp,
            "rl_w_phys_damage" => &mut self.rl.reward.w_phys_damage,
            "rl_cost_active" => &mut self.rl.reward.cost_active,
            "rl_cost_recover" => &mut self.rl.reward.cost_recover,
            _ => return None,
        };
        Some(slot)
    }

    /// Set a parameter by its flat name.
    pub fn set_param(
        &mut self,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<(), ConfigError> {
        let value = value.into();
        let invalid = || ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };

        match name {
            "defender_policy" => {
                let ParamValue::Text(s) = &value else {
                    return Err(invalid());
                };
                self.policy.kind = PolicyKind::parse(s)?;
            }
            "T" => self.horizon = as_count(&value).ok_or_else(invalid)?,
            "Seed" => self.seed = as_count(&value).ok_or_else(invalid)?,
            "it_comp_init" => self.initial.it_comp = as_flag(&value).ok_or_else(invalid)?,
            "ot_comp_init" => self.initial.ot_comp = as_flag(&value).ok_or_else(invalid)?,
            "rl_learn" => self.rl.learn = as_flag(&value).ok_or_else(invalid)?,
            _ => {
                if self.numeric_slot(name).is_none() {
                    return Err(ConfigError::UnknownParameter {
                        name: name.to_string(),
                    });
                }
                let v = match &value {
                    ParamValue::Number(v) if v.is_finite() => *v,
                    _ => return Err(invalid()),
                };
                if let Some(slot) = self.numeric_slot(name) {
                    *slot = v;
                }
            }
        }
        Ok(())
    }

    /// Read a parameter by its flat name.
    pub fn get_param(&self, name: &str) -> Option<ParamValue> {
        let value = match name {
            "defender_policy" => ParamValue::Text(self.policy.kind.as_str().to_string()),
            "T" => ParamValue::Number(self.horizon as f64),
            "Seed" => ParamValue::Number(self.seed as f64),
            "it_comp_init" => ParamValue::Number(flag(self.initial.it_comp)),
            "ot_comp_init" => ParamValue::Number(flag(self.initial.ot_comp)),
            "rl_learn" => ParamValue::Number(flag(self.rl.learn)),
            _ => {
                // numeric_slot needs &mut; work on a scratch copy.
                let mut scratch = self.clone();
                ParamValue::Number(*scratch.numeric_slot(name)?)
            }
        };
        Some(value)
    }

    /// Apply a flat mapping of overrides on top of the current values.
    pub fn apply_overrides<I, K>(&mut self, overrides: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, ParamValue)>,
        K: AsRef<str>,
    {
        for (name, value) in overrides {
            self.set_param(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Parse a flat YAML mapping of parameter overrides onto the defaults.
    ///
    /// ```yaml
    /// T: 1000
    /// p_attack: 0.6
    /// defender_policy: qlearn_v1
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, serde_yaml::Value> =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
                reason: e.to_string(),
            })?;

        let mut cfg = Config::default();
        for (name, v) in raw {
            let value = match v {
                serde_yaml::Value::Number(n) => match n.as_f64() {
                    Some(f) => ParamValue::Number(f),
                    None => {
                        return Err(ConfigError::InvalidValue {
                            name,
                            value: n.to_string(),
                        })
                    }
                },
                serde_yaml::Value::Bool(b) => ParamValue::Number(flag(b)),
                serde_yaml::Value::String(s) => ParamValue::Text(s),
                other => {
                    return Err(ConfigError::InvalidValue {
                        name,
                        value: format!("{other:?}"),
                    })
                }
            };
            cfg.set_param(&name, value)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::IoError {
            path: path.as_ref().display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Start from a threat preset and apply `BASTION_<NAME>` env overrides.
    ///
    /// The variable name is the flat parameter name upper-cased, e.g.
    /// `BASTION_P_ATTACK=0.5`, `BASTION_DEFENDER_POLICY=random`.
    /// Any variable that fails to apply is ignored with a warning.
    pub fn from_env_or_profile(profile: ThreatProfile) -> Self {
        let mut cfg = Config::for_threat(profile);

        for name in PARAM_NAMES {
            let var = format!("BASTION_{}", name.to_ascii_uppercase());
            let Ok(raw) = std::env::var(&var) else {
                continue;
            };
            match cfg.set_param(name, ParamValue::from_raw(&raw)) {
                Ok(()) => info!(%var, value = %raw, "config override applied"),
                Err(err) => warn!(%var, value = %raw, %err, "ignoring config override"),
            }
        }

        cfg
    }

    /// Reject parameter combinations the model cannot interpret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon == 0 {
            return Err(validation("T", "horizon must be > 0"));
        }

        let probabilities = [
            ("p_attack", self.attacker.p_attack),
            ("p_ot_given_attack_base", self.attacker.p_ot_given_attack_base),
            ("p_high_base", self.attacker.p_high_base),
            ("p_detect_base", self.defender.p_detect_base),
            ("p_contain_base", self.defender.p_contain_base),
            ("p_recover_clear_base", self.dynamics.p_recover_clear_base),
            ("damage_persistence", self.dynamics.damage_persistence),
            ("outage_decay", self.dynamics.outage_decay),
            ("rl_alpha", self.rl.alpha),
            ("rl_gamma", self.rl.gamma),
            ("rl_epsilon", self.rl.epsilon),
        ];
        for (field, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(validation(field, "must lie in [0, 1]"));
            }
        }

        let non_negative = [
            ("base_damage", self.dynamics.base_damage),
            ("high_damage_multiplier", self.dynamics.high_damage_multiplier),
            ("k_deterrence", self.attacker.k_deterrence),
            ("downtime_decay", self.dynamics.downtime_decay),
        ];
        for (field, v) in non_negative {
            if v < 0.0 {
                return Err(validation(field, "must be >= 0"));
            }
        }

        let bins = [
            ("rl_id_cap_lo", self.rl.id_cap_bins),
            ("rl_damage_lo", self.rl.damage_bins),
            ("rl_outage_lo", self.rl.outage_bins),
        ];
        for (field, b) in bins {
            if b.lo > b.high {
                return Err(validation(field, "lower bin threshold exceeds upper"));
            }
        }

        Ok(())
    }
}

fn validation(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// 0/1 flags; "true"/"false" also accepted.
fn as_flag(v: &ParamValue) -> Option<bool> {
    match v {
        ParamValue::Number(x) if *x == 0.0 => Some(false),
        ParamValue::Number(x) if *x == 1.0 => Some(true),
        ParamValue::Text(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_count(v: &ParamValue) -> Option<u64> {
    match v {
        ParamValue::Number(x) if x.is_finite() && *x >= 0.0 && x.fract() == 0.0 => Some(*x as u64),
        _ => None,
    }
}
