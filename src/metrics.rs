// src/metrics.rs
//
// Run-level metrics for the research harnesses.
// - OnlineStats:         Welford running mean/variance + min/max.
// - RunSummary:          per-run aggregates over a trajectory.
// - rolling_action_freq: action mix per fixed-size window.
// - trajectory_checksum: SHA-256 over the exact bits of a trajectory.
//
// Everything here is a pure function of the records, so summaries of a
// seeded run are as reproducible as the run itself.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::RewardWeights;
use crate::rl::reward::RewardComponents;
use crate::sim::TrajectoryRecord;
use crate::types::{Action, AttackTarget};

#[derive(Debug, Clone, Copy)]
pub struct OnlineStats {
    n: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for OnlineStats {
    fn default() -> Self {
        Self {
            n: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl OnlineStats {
    /// Adds a sample if finite. Non-finite samples are ignored.
    pub fn add(&mut self, x: f64) {
        if !x.is_finite() {
            return;
        }

        self.n += 1;
        self.min = self.min.min(x);
        self.max = self.max.max(x);

        let delta = x - self.mean;
        self.mean += delta / (self.n as f64);
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn min(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.min
        }
    }

    pub fn max(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.max
        }
    }

    /// Sample variance (divide by n-1).
    pub fn variance_sample(&self) -> f64 {
        if self.n <= 1 {
            0.0
        } else {
            self.m2 / ((self.n as f64) - 1.0)
        }
    }

    pub fn stddev_sample(&self) -> f64 {
        self.variance_sample().sqrt()
    }
}

impl FromIterator<f64> for OnlineStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut s = OnlineStats::default();
        for x in iter {
            s.add(x);
        }
        s
    }
}

// ----- Action mix -----

/// Fraction of steps spent in each action. Sums to 1 for a non-empty window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionFreq {
    #[serde(rename = "PASSIVE")]
    pub passive: f64,
    #[serde(rename = "ACTIVE")]
    pub active: f64,
    #[serde(rename = "RECOVER")]
    pub recover: f64,
}

impl ActionFreq {
    pub fn from_records(records: &[TrajectoryRecord]) -> Self {
        let mut counts = [0usize; Action::COUNT];
        for r in records {
            counts[r.action.index()] += 1;
        }
        let n = records.len().max(1) as f64;
        ActionFreq {
            passive: counts[Action::Passive.index()] as f64 / n,
            active: counts[Action::Active.index()] as f64 / n,
            recover: counts[Action::Recover.index()] as f64 / n,
        }
    }

    pub fn get(&self, action: Action) -> f64 {
        match action {
            Action::Passive => self.passive,
            Action::Active => self.active,
            Action::Recover => self.recover,
        }
    }
}

/// Action mix per consecutive window of `window` steps (last one may be short).
pub fn rolling_action_freq(records: &[TrajectoryRecord], window: usize) -> Vec<ActionFreq> {
    records
        .chunks(window.max(1))
        .map(ActionFreq::from_records)
        .collect()
}

// ----- Run summary -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: usize,
    /// Mean logged `rl_reward` (0 for non-learning policies).
    pub mean_reward: f64,
    /// Mean shaped loss plus action cost, recomputed for every policy so
    /// heuristics and learned policies are comparable.
    pub mean_cost: f64,
    pub mean_outage: f64,
    pub mean_damage_step: f64,
    pub mean_downtime: f64,
    /// Fraction of steps ending with IT / OT compromised.
    pub time_it_comp: f64,
    pub time_ot_comp: f64,
    pub attack_rate: f64,
    pub attack_success_rate: f64,
    pub action_freq: ActionFreq,
    pub final_phys_damage: f64,
    pub q_size_end: Option<usize>,
}

/// Step cost for any record, as the learner would have been charged.
pub fn step_cost(record: &TrajectoryRecord, weights: &RewardWeights) -> f64 {
    -RewardComponents {
        damage_step: record.damage_step,
        phys_damage_next: record.phys_damage_next,
        outage_next: record.outage_next,
        it_comp_end: record.it_comp_end,
        ot_comp_end: record.ot_comp_end,
        action: Some(record.action),
    }
    .compute_reward(weights)
}

fn fraction(records: &[TrajectoryRecord], pred: impl Fn(&TrajectoryRecord) -> bool) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().filter(|r| pred(r)).count() as f64 / records.len() as f64
}

fn mean_of(records: &[TrajectoryRecord], f: impl Fn(&TrajectoryRecord) -> f64) -> f64 {
    records.iter().map(f).collect::<OnlineStats>().mean()
}

pub fn summarize_run(records: &[TrajectoryRecord], weights: &RewardWeights) -> RunSummary {
    let attacks = records.iter().filter(|r| r.attack != AttackTarget::None);
    let (n_attacks, n_success) = attacks.fold((0usize, 0usize), |(n, s), r| {
        (n + 1, s + usize::from(r.attack_success))
    });

    RunSummary {
        steps: records.len(),
        mean_reward: mean_of(records, |r| r.rl_reward),
        mean_cost: mean_of(records, |r| step_cost(r, weights)),
        mean_outage: mean_of(records, |r| r.outage_next),
        mean_damage_step: mean_of(records, |r| r.damage_step),
        mean_downtime: mean_of(records, |r| r.downtime_next),
        time_it_comp: fraction(records, |r| r.it_comp_end),
        time_ot_comp: fraction(records, |r| r.ot_comp_end),
        attack_rate: fraction(records, |r| r.attack != AttackTarget::None),
        attack_success_rate: if n_attacks == 0 {
            0.0
        } else {
            n_success as f64 / n_attacks as f64
        },
        action_freq: ActionFreq::from_records(records),
        final_phys_damage: records.last().map_or(0.0, |r| r.phys_damage_next),
        q_size_end: records.last().and_then(|r| r.q_size),
    }
}

// ----- Determinism checksum -----

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

fn hash_record(h: &mut Sha256, r: &TrajectoryRecord) {
    let p = &r.pre;
    h.update(p.t.to_le_bytes());
    for x in [
        p.g,
        p.gov_mult,
        p.it_vuln,
        p.ot_vuln,
        p.id_cap,
        p.downtime,
        p.phys_damage,
        p.outage,
    ] {
        h.update(x.to_bits().to_le_bytes());
    }
    h.update([
        u8::from(p.it_comp),
        u8::from(p.ot_comp),
        r.action as u8,
        r.attack as u8,
        r.intensity as u8,
        u8::from(r.attack_success),
        u8::from(r.detection.it_detected),
        u8::from(r.detection.it_contained),
        u8::from(r.detection.ot_detected),
        u8::from(r.detection.ot_contained),
        u8::from(r.detection.it_comp_post),
        u8::from(r.detection.ot_comp_post),
        u8::from(r.it_comp_end),
        u8::from(r.ot_comp_end),
        u8::from(r.recovery.recovery_it_cleared),
        u8::from(r.recovery.recovery_ot_cleared),
    ]);

    let e = &r.effect;
    for x in [
        e.detect_boost,
        e.contain_boost,
        e.recover_clear_boost,
        e.downtime_reduction_boost,
        e.active_damage_reduction,
        r.p_high,
        r.p_success,
        r.it_vuln_next,
        r.ot_vuln_next,
        r.id_cap_next,
        r.damage_step,
        r.phys_damage_next,
        r.downtime_step,
        r.downtime_next,
        r.outage_status,
        r.outage_next,
        r.recovery.damage_reduction,
        r.rl_reward,
    ] {
        h.update(x.to_bits().to_le_bytes());
    }

    match r.q_size {
        Some(n) => {
            h.update([1u8]);
            h.update((n as u64).to_le_bytes());
        }
        None => h.update([0u8]),
    }
}

/// SHA-256 over every field of every record, floats by exact bit pattern.
///
/// Two runs with equal checksums produced bit-identical trajectories.
pub fn trajectory_checksum(records: &[TrajectoryRecord]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((records.len() as u64).to_le_bytes());
    for r in records {
        hash_record(&mut hasher, r);
    }
    hex_encode(&hasher.finalize())
}
