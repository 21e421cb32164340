// src/bin/threat_sweep.rs
//
// Multi-seed policy comparison harness.
//
// Runs every requested policy over `--runs` consecutive seeds (optionally
// across worker threads) and prints per-policy distribution summaries of
// the headline run metrics. If qlearn_v1 is requested, an agent is trained
// first on `--train-seed` and evaluated greedily.
//
// Usage:
//   threat_sweep --runs 50 --steps 2000 --profile high
//   threat_sweep --policies threshold_v1,random --threads 4 --csv-out sweep.csv

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use bastion::{
    evaluate_policies, init_tracing, run_one, Config, OnlineStats, PolicyKind, QLearner, RunSpec,
    SweepCell, ThreatProfile,
};

#[derive(Parser, Debug)]
#[command(name = "threat_sweep", version)]
struct Args {
    /// Number of seeds per policy.
    #[arg(long, default_value_t = 20)]
    runs: u64,

    /// First seed; run i uses seed + i.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Steps per evaluation run.
    #[arg(long, default_value_t = 2_000)]
    steps: u64,

    /// Threat preset (low | baseline | high).
    #[arg(long, default_value = "baseline", env = "BASTION_PROFILE")]
    profile: String,

    /// Explicit attack rate; overrides the preset.
    #[arg(long)]
    p_attack: Option<f64>,

    /// Comma-separated policy names.
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "always_passive,random,threshold_v1,qlearn_v1"
    )]
    policies: Vec<String>,

    /// Training steps for qlearn_v1.
    #[arg(long, default_value_t = 50_000)]
    train_steps: u64,

    #[arg(long, default_value_t = 1)]
    train_seed: u64,

    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Optional per-run CSV output.
    #[arg(long)]
    csv_out: Option<PathBuf>,

    #[arg(long)]
    quiet: bool,
}

fn percentile(sorted: &[f64], p01: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let p = p01.clamp(0.0, 1.0);
    let idx = (p * ((sorted.len() - 1) as f64)).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn p05_p50_p95(mut xs: Vec<f64>) -> (f64, f64, f64) {
    xs.sort_by(|a, b| a.total_cmp(b));
    (
        percentile(&xs, 0.05),
        percentile(&xs, 0.50),
        percentile(&xs, 0.95),
    )
}

fn write_csv(path: &Path, cells: &[SweepCell]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create CSV {}", path.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(
        w,
        "policy,seed,p_attack,mean_cost,mean_outage,mean_damage_step,time_it_comp,time_ot_comp,final_phys_damage,checksum"
    )?;
    for c in cells {
        let s = &c.summary;
        writeln!(
            w,
            "{},{},{:.4},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{}",
            c.policy,
            c.seed,
            c.p_attack,
            s.mean_cost,
            s.mean_outage,
            s.mean_damage_step,
            s.time_it_comp,
            s.time_ot_comp,
            s.final_phys_damage,
            c.checksum
        )?;
    }
    w.flush()?;
    Ok(())
}

fn print_metric(name: &str, xs: Vec<f64>) {
    let stats: OnlineStats = xs.iter().copied().collect();
    let (p05, p50, p95) = p05_p50_p95(xs);
    println!(
        "    {:<17} mean={:.4}  std={:.4}  min={:.4}  max={:.4}  p05={:.4}  p50={:.4}  p95={:.4}",
        name,
        stats.mean(),
        stats.stddev_sample(),
        stats.min(),
        stats.max(),
        p05,
        p50,
        p95
    );
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing("warn");

    let profile = ThreatProfile::parse(&args.profile)
        .with_context(|| format!("Unknown threat profile {:?}", args.profile))?;
    let mut cfg = Config::from_env_or_profile(profile);
    cfg.horizon = args.steps;
    if let Some(p) = args.p_attack {
        cfg.set_param("p_attack", p)?;
    }
    cfg.validate()?;

    let policies = args
        .policies
        .iter()
        .map(|s| PolicyKind::parse(s))
        .collect::<Result<Vec<_>, _>>()?;
    let seeds: Vec<u64> = (0..args.runs).map(|i| args.seed.wrapping_add(i)).collect();

    println!(
        "bastion-sweep v{} | profile={} p_attack={:.2} runs={} steps={} seed={} threads={} policies={}",
        env!("CARGO_PKG_VERSION"),
        profile.as_str(),
        cfg.attacker.p_attack,
        args.runs,
        args.steps,
        args.seed,
        args.threads,
        args.policies.join(",")
    );

    let agent = if policies.iter().any(|p| p.is_qlearn()) {
        let mut agent = QLearner::default();
        let train = RunSpec::new(args.train_seed, PolicyKind::QLearnV1, args.train_steps)
            .with_learn(true);
        run_one(&cfg, &train, Some(&mut agent)).context("qlearn training run failed")?;
        info!(q_size = agent.len(), "training done");
        Some(agent)
    } else {
        None
    };

    let cells = evaluate_policies(&cfg, &policies, &seeds, agent.as_ref(), args.threads)?;

    if let Some(path) = &args.csv_out {
        write_csv(path, &cells)?;
    }

    if !args.quiet {
        for c in &cells {
            println!(
                "{:<15} seed={:<8} cost={:>8.4} outage={:>6.4} it={:>6.4} ot={:>6.4} mix=[{:.2} {:.2} {:.2}]",
                c.policy.as_str(),
                c.seed,
                c.summary.mean_cost,
                c.summary.mean_outage,
                c.summary.time_it_comp,
                c.summary.time_ot_comp,
                c.summary.action_freq.passive,
                c.summary.action_freq.active,
                c.summary.action_freq.recover,
            );
        }
    }

    println!();
    println!("SUMMARY");
    for policy in &policies {
        let mine: Vec<&SweepCell> = cells.iter().filter(|c| c.policy == *policy).collect();
        println!("  {} ({} runs)", policy.as_str(), mine.len());
        print_metric("mean_cost:", mine.iter().map(|c| c.summary.mean_cost).collect());
        print_metric("mean_outage:", mine.iter().map(|c| c.summary.mean_outage).collect());
        print_metric(
            "time_ot_comp:",
            mine.iter().map(|c| c.summary.time_ot_comp).collect(),
        );
        print_metric(
            "final_damage:",
            mine.iter().map(|c| c.summary.final_phys_damage).collect(),
        );
    }

    Ok(())
}
