//! Bastion core library.
//!
//! A discrete-time defender/attacker simulation of a two-layer (IT / OT)
//! infrastructure, with a tabular Q-learning defender. The binaries
//! (`src/main.rs`, `src/bin/threat_sweep.rs`) are thin research harnesses
//! around these components.

pub mod attacker;
pub mod config;
pub mod defender;
pub mod dynamics;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod rl;
pub mod rng;
pub mod sim;
pub mod state;
pub mod sweep;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{Config, ParamValue, PolicyKind, ThreatProfile};

pub use error::{ConfigError, SimError, SimResult};

pub use types::{Action, AttackTarget, Intensity};

pub use rng::{seeded_rng, DrawSource, ScriptedDraws};

pub use state::{clamp01, governance_multiplier, SimState, StateSnapshot};

pub use attacker::{resolve_attack, sample_attacker_event, AttackOutcome, AttackerEvent};

pub use defender::{apply_defender_action, choose_action, threshold_action, ActionEffect};

pub use dynamics::{DetectionOutcome, RecoveryOutcome};

pub use rl::{bin, discretize, qlearn_update_step, reward, DiscreteState, QLearner};

pub use sim::{
    run, run_one, run_one_with_sink, run_with_sink, step, AgentHandoff, RunSpec, TrajectoryRecord,
};

pub use metrics::{
    rolling_action_freq, summarize_run, trajectory_checksum, ActionFreq, OnlineStats, RunSummary,
};

pub use logging::{init_tracing, JsonlSink, NoopSink, TrajectorySink};

pub use sweep::{evaluate_policies, threat_check, SweepCell};

// --- End-to-end smoke tests -------------------------------------------------
