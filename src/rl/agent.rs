// src/rl/agent.rs
//
// Tabular Q-learner.
//
// The table is sparse: rows are created lazily, and only `update` creates
// them. `qvals` and `select_action` never insert, so greedy evaluation does
// not inflate the table with states it merely looked at.
//
// Keys live in a BTreeMap so `entries()` and serialized dumps come out in a
// stable order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::discretize::{discretize, DiscreteState};
use super::reward::reward;
use crate::config::Config;
use crate::error::{SimError, SimResult};
use crate::rng::DrawSource;
use crate::state::SimState;
use crate::types::Action;

/// One row of action values.
pub type QRow = Vec<f64>;

/// Flattened table row, for JSON dumps (struct keys cannot be JSON map keys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTableEntry {
    pub state: DiscreteState,
    pub values: QRow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QLearner {
    n_actions: usize,
    table: BTreeMap<DiscreteState, QRow>,
}

impl Default for QLearner {
    fn default() -> Self {
        Self::new(Action::COUNT)
    }
}

impl QLearner {
    pub fn new(n_actions: usize) -> Self {
        Self {
            n_actions: n_actions.max(1),
            table: BTreeMap::new(),
        }
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Number of materialized rows.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn contains(&self, s: &DiscreteState) -> bool {
        self.table.contains_key(s)
    }

    /// Stored row for `s`, or all zeros. Never mutates the table.
    pub fn qvals(&self, s: &DiscreteState) -> QRow {
        match self.table.get(s) {
            Some(row) => row.clone(),
            None => vec![0.0; self.n_actions],
        }
    }

    /// Rows in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&DiscreteState, &QRow)> {
        self.table.iter()
    }

    /// Snapshot of every row in key order.
    pub fn dump(&self) -> Vec<QTableEntry> {
        self.entries()
            .map(|(state, values)| QTableEntry {
                state: *state,
                values: values.clone(),
            })
            .collect()
    }

    fn row(&mut self, s: DiscreteState) -> &mut QRow {
        let n = self.n_actions;
        self.table.entry(s).or_insert_with(|| vec![0.0; n])
    }

    /// Epsilon-greedy choice.
    ///
    /// One uniform decides explore vs exploit. Exploring then draws an index
    /// over all actions; exploiting draws an index over the argmax set, so
    /// ties are broken at random rather than toward the lowest action.
    pub fn select_action<R: DrawSource + ?Sized>(
        &self,
        s: &DiscreteState,
        epsilon: f64,
        rng: &mut R,
    ) -> usize {
        if rng.uniform() < epsilon {
            return rng.index(self.n_actions);
        }

        let q = self.qvals(s);
        let best = greedy_set(&q);
        best[rng.index(best.len())]
    }

    /// One-step Q-learning update:
    /// `Q[s][a] += alpha * (r + gamma * max(Q[s_next]) - Q[s][a])`.
    ///
    /// Materializes both rows. Returns the TD error. An action index outside
    /// the table is rejected before anything is inserted.
    pub fn update(
        &mut self,
        s: DiscreteState,
        a: usize,
        r: f64,
        s_next: DiscreteState,
        alpha: f64,
        gamma: f64,
    ) -> SimResult<f64> {
        if a >= self.n_actions {
            return Err(SimError::InvalidAction { index: a });
        }

        let next_max = max_value(self.row(s_next));
        let td_target = r + gamma * next_max;

        let q = &mut self.row(s)[a];
        let td_error = td_target - *q;
        *q += alpha * td_error;
        Ok(td_error)
    }
}

fn max_value(q: &[f64]) -> f64 {
    q.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Indices of every action attaining the row maximum, ascending.
fn greedy_set(q: &[f64]) -> Vec<usize> {
    let max = max_value(q);
    q.iter()
        .enumerate()
        .filter(|(_, v)| **v == max)
        .map(|(i, _)| i)
        .collect()
}

/// Learning transition for one step.
///
/// Computes the reward from the post-step state, discretizes it, and
/// updates the table only when `cfg.rl.learn` is set. The reward is
/// returned either way.
pub fn qlearn_update_step(
    cfg: &Config,
    state: &SimState,
    agent: &mut QLearner,
    s_pre: DiscreteState,
    action: Action,
    damage_step: f64,
) -> SimResult<f64> {
    let r = reward(
        cfg,
        damage_step,
        state.phys_damage,
        state.outage,
        state.it_comp,
        state.ot_comp,
        action,
    );

    let s_post = discretize(cfg, state);
    if cfg.rl.learn {
        agent.update(s_pre, action.index(), r, s_post, cfg.rl.alpha, cfg.rl.gamma)?;
    }
    Ok(r)
}
