// src/rl/mod.rs
//
// Tabular reinforcement learning for the defender.
//
// Key components:
// - DiscreteState: 5-tuple lookup key (108 possible values)
// - RewardComponents: per-step loss terms and action cost
// - QLearner: sparse value table, epsilon-greedy selection, one-step update
//
// The agent only ever mutates its table inside `update`; action selection
// and evaluation lookups are read-only.

pub mod agent;
pub mod discretize;
pub mod reward;

pub use agent::{qlearn_update_step, QLearner, QRow, QTableEntry};
pub use discretize::{bin, discretize, DiscreteState, STATE_SPACE_SIZE};
pub use reward::{reward, RewardComponents};
