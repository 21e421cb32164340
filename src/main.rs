// src/main.rs
//
// Train + evaluate harness for the tabular Q-learning defender.
// All of the real logic lives in the lib crate (sim, rl, metrics, sweep).
//
//   1. train qlearn_v1 with learning on
//   2. evaluate it greedily on a held-out seed, next to the heuristics
//   3. threat check: every policy under low / high attack rates

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::info;

use bastion::{
    init_tracing, rolling_action_freq, run_one_with_sink, summarize_run, threat_check,
    AgentHandoff, Config, JsonlSink, NoopSink, PolicyKind, QLearner, RunSpec, ThreatProfile,
    TrajectoryRecord, TrajectorySink,
};

/// Command-line arguments for the bastion binary.
#[derive(Parser, Debug)]
#[command(name = "bastion", version)]
struct Cli {
    /// Steps in the training run.
    #[arg(long, default_value_t = 100_000)]
    train_steps: u64,

    /// Steps in each evaluation run.
    #[arg(long, default_value_t = 25_000)]
    eval_steps: u64,

    #[arg(long, default_value_t = 1)]
    train_seed: u64,

    #[arg(long, default_value_t = 2)]
    eval_seed: u64,

    /// Exploration rate during training (defaults to the config value).
    #[arg(long)]
    epsilon: Option<f64>,

    #[arg(long, default_value_t = 0.10)]
    p_attack_low: f64,

    #[arg(long, default_value_t = 0.60)]
    p_attack_high: f64,

    /// Seed for the threat check runs.
    #[arg(long, default_value_t = 123)]
    threat_seed: u64,

    /// Print rolling action mix for the training and greedy eval runs.
    #[arg(long)]
    print_action_mix: bool,

    /// Optional YAML file of flat parameter overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Threat preset used when no config file is given (low | baseline | high).
    #[arg(long, default_value = "baseline", env = "BASTION_PROFILE")]
    profile: String,

    /// How the trained agent is handed to evaluation (snapshot | continue).
    #[arg(long, default_value = "snapshot")]
    handoff: String,

    /// Optional JSONL path for the greedy evaluation trajectory.
    #[arg(long)]
    trajectory_out: Option<PathBuf>,

    /// Optional JSON path for the trained value table.
    #[arg(long)]
    q_table_out: Option<PathBuf>,

    /// Worker threads for the threat check.
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut cfg = match &cli.config {
        Some(path) => Config::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let profile = ThreatProfile::parse(&cli.profile)
                .with_context(|| format!("Unknown threat profile {:?}", cli.profile))?;
            Config::from_env_or_profile(profile)
        }
    };
    if let Some(eps) = cli.epsilon {
        cfg.set_param("rl_epsilon", eps)?;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Build the trajectory sink as a trait object so we can choose between
/// JsonlSink and NoopSink at runtime.
fn build_sink(path: Option<&PathBuf>) -> Result<Box<dyn TrajectorySink>> {
    match path {
        Some(p) => {
            let sink = JsonlSink::create(p)
                .with_context(|| format!("Failed to create trajectory file {}", p.display()))?;
            Ok(Box::new(sink))
        }
        None => Ok(Box::new(NoopSink)),
    }
}

fn run_spec(
    base: &Config,
    spec: &RunSpec,
    agent: Option<&mut QLearner>,
    sink: &mut dyn TrajectorySink,
) -> Result<Vec<TrajectoryRecord>> {
    run_one_with_sink(base, spec, agent, sink)
        .with_context(|| format!("{} run (seed {}) failed", spec.policy, spec.seed))
}

fn print_json(title: &str, value: &serde_json::Value) -> Result<()> {
    println!("\n{title}:");
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let cfg = load_config(&cli)?;
    let handoff = AgentHandoff::parse(&cli.handoff)
        .with_context(|| format!("Unknown handoff mode {:?}", cli.handoff))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        train_steps = cli.train_steps,
        eval_steps = cli.eval_steps,
        epsilon = cfg.rl.epsilon,
        handoff = handoff.as_str(),
        "bastion train/eval"
    );

    // ---------- Training ----------
    let mut agent = QLearner::new(bastion::Action::COUNT);
    let train = RunSpec::new(cli.train_seed, PolicyKind::QLearnV1, cli.train_steps)
        .with_learn(true)
        .with_epsilon(cfg.rl.epsilon);
    let train_records = run_spec(&cfg, &train, Some(&mut agent), &mut NoopSink)?;
    let train_summary = summarize_run(&train_records, &cfg.rl.reward);
    info!(q_size = agent.len(), "training done");

    // ---------- Evaluation ----------
    let greedy = RunSpec::new(cli.eval_seed, PolicyKind::QLearnV1, cli.eval_steps)
        .with_learn(false)
        .with_epsilon(0.0);
    let mut sink = build_sink(cli.trajectory_out.as_ref())?;
    let eval_q = handoff
        .run_eval(&cfg, &greedy, &mut agent, sink.as_mut())
        .with_context(|| format!("greedy eval run (seed {}) failed", cli.eval_seed))?;

    let mut eval_summary = serde_json::Map::new();
    eval_summary.insert(
        "qlearn_greedy".to_string(),
        serde_json::to_value(summarize_run(&eval_q, &cfg.rl.reward))?,
    );
    for policy in [
        PolicyKind::ThresholdV1,
        PolicyKind::AlwaysPassive,
        PolicyKind::Random,
    ] {
        let spec = RunSpec::new(cli.eval_seed, policy, cli.eval_steps);
        let records = run_spec(&cfg, &spec, None, &mut NoopSink)?;
        eval_summary.insert(
            policy.as_str().to_string(),
            serde_json::to_value(summarize_run(&records, &cfg.rl.reward))?,
        );
    }

    print_json("Training Summary", &serde_json::to_value(&train_summary)?)?;
    print_json("Evaluation Summary", &serde_json::Value::Object(eval_summary))?;

    if cli.print_action_mix {
        let train_mix = rolling_action_freq(&train_records, 500);
        let eval_mix = rolling_action_freq(&eval_q, 250);
        println!("\nQ size end (train): {:?}", train_summary.q_size_end);
        print_json(
            "Train action mix by window (head)",
            &serde_json::to_value(&train_mix[..train_mix.len().min(5)])?,
        )?;
        print_json(
            "Eval action mix (qlearn greedy) by window (head)",
            &serde_json::to_value(&eval_mix[..eval_mix.len().min(5)])?,
        )?;
    }

    // ---------- Threat check ----------
    let cells = threat_check(
        &cfg,
        &[
            PolicyKind::QLearnV1,
            PolicyKind::ThresholdV1,
            PolicyKind::Random,
        ],
        &[cli.p_attack_low, cli.p_attack_high],
        cli.threat_seed,
        Some(&agent),
        cli.threads,
    )?;
    let rows: Vec<_> = cells
        .iter()
        .map(|c| {
            json!({
                "policy": c.policy.as_str(),
                "p_attack": c.p_attack,
                "summary": c.summary,
            })
        })
        .collect();
    print_json("Threat Check", &serde_json::Value::Array(rows))?;

    if let Some(path) = &cli.q_table_out {
        let file = File::create(path)
            .with_context(|| format!("Failed to create q-table file {}", path.display()))?;
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, &agent.dump())?;
        w.flush()?;
        info!(path = %path.display(), rows = agent.len(), "q-table written");
    }

    Ok(())
}
