// src/sweep.rs
//
// Multi-run evaluation harnesses.
//
// - evaluate_policies: (policy x seed) grid, optionally across worker threads
// - threat_check:      the same grid repeated under several attack rates
//
// Each cell is an independent run with its own state and random stream.
// Learning-based cells get their own clone of the agent and never learn, so
// no table is ever written from two places at once. Results always come
// back in cell order (policy-major, then seed) regardless of thread count.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{Config, PolicyKind};
use crate::error::{SimError, SimResult};
use crate::metrics::{summarize_run, trajectory_checksum, RunSummary};
use crate::rl::agent::QLearner;
use crate::sim::{run_one, RunSpec};

/// Outcome of one (policy, seed) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepCell {
    pub policy: PolicyKind,
    pub seed: u64,
    pub p_attack: f64,
    pub summary: RunSummary,
    pub checksum: String,
}

/// Evaluation spec for one cell: learned policies run greedily with learning off.
pub fn eval_spec(policy: PolicyKind, seed: u64, horizon: u64) -> RunSpec {
    let spec = RunSpec::new(seed, policy, horizon);
    if policy.is_qlearn() {
        spec.with_learn(false).with_epsilon(0.0)
    } else {
        spec
    }
}

fn run_cell(
    base: &Config,
    policy: PolicyKind,
    seed: u64,
    agent: Option<&QLearner>,
) -> SimResult<SweepCell> {
    let spec = eval_spec(policy, seed, base.horizon);
    let mut local = if policy.is_qlearn() {
        agent.cloned()
    } else {
        None
    };
    let records = run_one(base, &spec, local.as_mut())?;
    Ok(SweepCell {
        policy,
        seed,
        p_attack: base.attacker.p_attack,
        summary: summarize_run(&records, &base.rl.reward),
        checksum: trajectory_checksum(&records),
    })
}

/// Evaluate every (policy, seed) pair under `base`.
///
/// `threads` is clamped to [1, cells]. `agent` is required only if a
/// learning-based policy is in `policies`.
pub fn evaluate_policies(
    base: &Config,
    policies: &[PolicyKind],
    seeds: &[u64],
    agent: Option<&QLearner>,
    threads: usize,
) -> SimResult<Vec<SweepCell>> {
    let cells: Vec<(PolicyKind, u64)> = policies
        .iter()
        .flat_map(|p| seeds.iter().map(move |s| (*p, *s)))
        .collect();
    if cells.is_empty() {
        return Ok(Vec::new());
    }

    let threads = threads.clamp(1, cells.len());
    info!(
        cells = cells.len(),
        threads,
        p_attack = base.attacker.p_attack,
        horizon = base.horizon,
        "policy sweep start"
    );

    if threads == 1 {
        return cells
            .iter()
            .map(|(policy, seed)| run_cell(base, *policy, *seed, agent))
            .collect();
    }

    // Local pool sized to `threads`; the indexed collect keeps cell order.
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| SimError::ThreadPool {
            reason: e.to_string(),
        })?;
    pool.install(|| {
        cells
            .par_iter()
            .map(|(policy, seed)| run_cell(base, *policy, *seed, agent))
            .collect::<SimResult<Vec<_>>>()
    })
}

/// Repeat the policy grid at each attack rate with one fixed seed.
pub fn threat_check(
    base: &Config,
    policies: &[PolicyKind],
    p_attacks: &[f64],
    seed: u64,
    agent: Option<&QLearner>,
    threads: usize,
) -> SimResult<Vec<SweepCell>> {
    let mut out = Vec::with_capacity(policies.len() * p_attacks.len());
    for &p_attack in p_attacks {
        let mut cfg = base.clone();
        cfg.attacker.p_attack = p_attack;
        out.extend(evaluate_policies(&cfg, policies, &[seed], agent, threads)?);
    }
    Ok(out)
}
