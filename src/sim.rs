// src/sim.rs
//
// Simulation orchestrator.
//
// `step` advances one timestep through a fixed phase order:
//
//    1. snapshot pre-action state
//    2. discretize pre-action state (qlearn only)
//    3. choose action
//    4. apply action effect
//    5. sample attacker event
//    6. resolve attack
//    7. detection & containment       (IT, then OT)
//    8. physical damage
//    9. downtime update
//   10. recovery resolution           (RECOVER only)
//   11. damage persistence decay
//   12. outage update
//   13. RL update                     (qlearn only)
//   14. append trajectory record
//
// Every phase after (1) reads what the previous phase wrote, and the number
// and order of random draws is fixed, so a (config, seed) pair always
// reproduces the same trajectory.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::attacker::{high_intensity_probability, resolve_attack, sample_attacker_event};
use crate::config::{Config, PolicyKind};
use crate::defender::{apply_defender_action, choose_action, ActionEffect};
use crate::dynamics::{
    damage_persistence_step, detection_and_containment_step, downtime_update_step,
    outage_update_step, physical_damage_step, recovery_resolution_step, DetectionOutcome,
    RecoveryOutcome,
};
use crate::error::SimResult;
use crate::logging::{NoopSink, TrajectorySink};
use crate::rl::agent::{qlearn_update_step, QLearner};
use crate::rl::discretize::discretize;
use crate::rng::{seeded_rng, DrawSource};
use crate::state::{SimState, StateSnapshot};
use crate::types::{Action, AttackTarget, Intensity};

/// One timestep of the run, as logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    /// Pre-action state.
    #[serde(flatten)]
    pub pre: StateSnapshot,

    pub action: Action,
    #[serde(flatten)]
    pub effect: ActionEffect,

    // ----- Attacker -----
    pub attack: AttackTarget,
    pub intensity: Intensity,
    /// P(HIGH) evaluated on the end-of-step state.
    pub p_high: f64,
    pub p_success: f64,
    pub attack_success: bool,

    /// Per-layer detection / containment, and flags before recovery.
    #[serde(flatten)]
    pub detection: DetectionOutcome,

    // ----- End-of-step state -----
    pub it_comp_end: bool,
    pub ot_comp_end: bool,
    pub it_vuln_next: f64,
    pub ot_vuln_next: f64,
    pub id_cap_next: f64,

    pub damage_step: f64,
    pub phys_damage_next: f64,
    pub downtime_step: f64,
    pub downtime_next: f64,
    /// Raw outage pressure before smoothing.
    pub outage_status: f64,
    pub outage_next: f64,

    #[serde(flatten)]
    pub recovery: RecoveryOutcome,

    /// 0 unless the policy is learning-based.
    pub rl_reward: f64,
    /// Table size after this step's update; `None` for non-learning policies.
    pub q_size: Option<usize>,
}

/// Advance one timestep, appending its record. Returns `t + 1`.
pub fn step<R: DrawSource + ?Sized>(
    cfg: &Config,
    state: &mut SimState,
    rng: &mut R,
    t: u64,
    mut agent: Option<&mut QLearner>,
    records: &mut Vec<TrajectoryRecord>,
) -> SimResult<u64> {
    let pre = state.snapshot(cfg, t);

    let s_pre = if cfg.policy.kind.is_qlearn() {
        Some(discretize(cfg, state))
    } else {
        None
    };

    let action = choose_action(cfg, state, rng, t, agent.as_deref())?;
    let effect = apply_defender_action(cfg, state, action);

    let event = sample_attacker_event(cfg, state, rng);
    let outcome = resolve_attack(cfg, state, rng, event);

    let detection = detection_and_containment_step(cfg, state, rng, &effect);

    let damage_step = physical_damage_step(cfg, state, event.intensity, &effect);
    let downtime_step = downtime_update_step(cfg, state, &effect, action);
    let recovery = recovery_resolution_step(cfg, state, rng, &effect, action);
    damage_persistence_step(cfg, state);

    let it_comp_end = state.it_comp;
    let ot_comp_end = state.ot_comp;

    let outage_status = outage_update_step(cfg, state);

    let mut rl_reward = 0.0;
    let mut q_size = None;
    if let (Some(s_pre), Some(agent)) = (s_pre, agent.as_deref_mut()) {
        rl_reward = qlearn_update_step(cfg, state, agent, s_pre, action, damage_step)?;
        q_size = Some(agent.len());
    }

    records.push(TrajectoryRecord {
        pre,
        action,
        effect,
        attack: event.target,
        intensity: event.intensity,
        p_high: high_intensity_probability(cfg, state),
        p_success: outcome.p_success,
        attack_success: outcome.success,
        detection,
        it_comp_end,
        ot_comp_end,
        it_vuln_next: state.it_vuln,
        ot_vuln_next: state.ot_vuln,
        id_cap_next: state.id_cap,
        damage_step,
        phys_damage_next: state.phys_damage,
        downtime_step,
        downtime_next: state.downtime,
        outage_status,
        outage_next: state.outage,
        recovery,
        rl_reward,
        q_size,
    });

    Ok(t + 1)
}

/// Upper bound on the up-front record reservation; longer runs grow the Vec.
const MAX_RESERVED_RECORDS: u64 = 1 << 16;

fn record_capacity(horizon: u64) -> usize {
    horizon.min(MAX_RESERVED_RECORDS) as usize
}

/// Run `cfg.horizon` steps from `state`, returning every record in order.
pub fn run<R: DrawSource + ?Sized>(
    cfg: &Config,
    state: &mut SimState,
    rng: &mut R,
    mut agent: Option<&mut QLearner>,
) -> SimResult<Vec<TrajectoryRecord>> {
    let mut records = Vec::with_capacity(record_capacity(cfg.horizon));
    let mut t = 0;
    for _ in 0..cfg.horizon {
        t = step(cfg, state, rng, t, agent.as_deref_mut(), &mut records)?;
    }
    Ok(records)
}

/// Like `run`, also streaming each record to `sink` as it is produced.
pub fn run_with_sink<R: DrawSource + ?Sized>(
    cfg: &Config,
    state: &mut SimState,
    rng: &mut R,
    mut agent: Option<&mut QLearner>,
    sink: &mut dyn TrajectorySink,
) -> SimResult<Vec<TrajectoryRecord>> {
    let mut records = Vec::with_capacity(record_capacity(cfg.horizon));
    let mut t = 0;
    for _ in 0..cfg.horizon {
        t = step(cfg, state, rng, t, agent.as_deref_mut(), &mut records)?;
        if let Some(rec) = records.last() {
            sink.log_record(rec);
        }
    }
    sink.flush();
    Ok(records)
}

// ----- Single-run harness -----

/// Per-run overrides applied on a copy of the base config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    pub seed: u64,
    pub policy: PolicyKind,
    pub horizon: u64,
    /// Overrides `rl.learn` when set.
    pub learn: Option<bool>,
    /// Overrides `rl.epsilon` when set.
    pub epsilon: Option<f64>,
}

impl RunSpec {
    pub fn new(seed: u64, policy: PolicyKind, horizon: u64) -> Self {
        Self {
            seed,
            policy,
            horizon,
            learn: None,
            epsilon: None,
        }
    }

    pub fn with_learn(mut self, learn: bool) -> Self {
        self.learn = Some(learn);
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    /// The base config with this spec's overrides applied.
    pub fn apply(&self, base: &Config) -> Config {
        let mut cfg = base.clone();
        cfg.seed = self.seed;
        cfg.horizon = self.horizon;
        cfg.policy.kind = self.policy;
        if let Some(learn) = self.learn {
            cfg.rl.learn = learn;
        }
        if let Some(epsilon) = self.epsilon {
            cfg.rl.epsilon = epsilon;
        }
        cfg
    }
}

/// Run one independent simulation: fresh initial state, private stream
/// seeded from `spec.seed`.
pub fn run_one(
    base: &Config,
    spec: &RunSpec,
    agent: Option<&mut QLearner>,
) -> SimResult<Vec<TrajectoryRecord>> {
    run_one_with_sink(base, spec, agent, &mut NoopSink)
}

/// `run_one`, also streaming each record to `sink`.
pub fn run_one_with_sink(
    base: &Config,
    spec: &RunSpec,
    agent: Option<&mut QLearner>,
    sink: &mut dyn TrajectorySink,
) -> SimResult<Vec<TrajectoryRecord>> {
    let cfg = spec.apply(base);
    cfg.validate()?;

    info!(
        seed = cfg.seed,
        policy = cfg.policy.kind.as_str(),
        horizon = cfg.horizon,
        learn = cfg.rl.learn,
        epsilon = cfg.rl.epsilon,
        "run start"
    );

    let mut rng = seeded_rng(cfg.seed);
    let mut state = SimState::new(&cfg);
    let records = run_with_sink(&cfg, &mut state, &mut rng, agent, sink)?;

    debug!(
        seed = cfg.seed,
        steps = records.len(),
        q_size = records.last().and_then(|r| r.q_size),
        "run end"
    );
    Ok(records)
}

/// How a trained agent is handed to evaluation runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentHandoff {
    /// Evaluate on a clone; the trained table is never touched.
    #[default]
    Snapshot,
    /// Evaluate on the live agent; any learning during evaluation persists.
    Continue,
}

impl AgentHandoff {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentHandoff::Snapshot => "snapshot",
            AgentHandoff::Continue => "continue",
        }
    }

    pub fn parse(s: &str) -> Option<AgentHandoff> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Some(AgentHandoff::Snapshot),
            "continue" => Some(AgentHandoff::Continue),
            _ => None,
        }
    }

    /// `run_one_with_sink` with the agent handed over per this mode.
    pub fn run_eval(
        self,
        base: &Config,
        spec: &RunSpec,
        trained: &mut QLearner,
        sink: &mut dyn TrajectorySink,
    ) -> SimResult<Vec<TrajectoryRecord>> {
        match self {
            AgentHandoff::Snapshot => {
                let mut snapshot = trained.clone();
                run_one_with_sink(base, spec, Some(&mut snapshot), sink)
            }
            AgentHandoff::Continue => run_one_with_sink(base, spec, Some(trained), sink),
        }
    }
}
