// tests/config_tests.rs
//
// Configuration loading from files and the environment, and the bastion
// binary driven by a config file.

use std::env;
use std::fs;
use std::process::Command;
use std::sync::{Mutex, MutexGuard};

use bastion::rl::QTableEntry;
use bastion::{Config, ConfigError, ParamValue, PolicyKind, ThreatProfile};
use tempfile::tempdir;

/// Serializes environment mutation against child-process spawns in this binary.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn env_guard() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}

/// Run `f` with `vars` set, restoring previous values afterwards.
fn with_env_overrides<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let _guard = env_guard();
    let prev: Vec<(&str, Option<String>)> =
        vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();
    for (k, v) in vars {
        env::set_var(k, v);
    }

    let result = f();

    for (k, old) in prev {
        match old {
            Some(v) => env::set_var(k, v),
            None => env::remove_var(k),
        }
    }
    result
}

#[test]
fn yaml_file_overrides_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.yaml");
    fs::write(
        &path,
        "T: 250\nSeed: 42\nG: 0.8\ndefender_policy: qlearn_v1\nrl_epsilon: 0.05\not_comp_init: 1\n",
    )
    .unwrap();

    let cfg = Config::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.horizon, 250);
    assert_eq!(cfg.seed, 42);
    assert_eq!(cfg.governance, 0.8);
    assert_eq!(cfg.policy.kind, PolicyKind::QLearnV1);
    assert_eq!(cfg.rl.epsilon, 0.05);
    assert!(cfg.initial.ot_comp);
    assert!(!cfg.initial.it_comp);
    assert_eq!(cfg.get_param("rl_epsilon"), Some(ParamValue::Number(0.05)));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    match Config::from_yaml_file(&path) {
        Err(ConfigError::IoError { path: p, .. }) => assert!(p.ends_with("absent.yaml")),
        other => panic!("expected IoError, got {other:?}"),
    }
}

#[test]
fn bad_yaml_entries_are_fatal() {
    assert!(matches!(
        Config::from_yaml_str("p_atack: 0.2\n"),
        Err(ConfigError::UnknownParameter { .. })
    ));
    assert!(matches!(
        Config::from_yaml_str("defender_policy: sarsa\n"),
        Err(ConfigError::UnknownPolicy { .. })
    ));
    assert!(matches!(
        Config::from_yaml_str("p_attack: [0.1, 0.2]\n"),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        Config::from_yaml_str("- 1\n- 2\n"),
        Err(ConfigError::ParseError { .. })
    ));
    assert!(matches!(
        Config::from_yaml_str("T: 0\n"),
        Err(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn environment_overrides_profile() {
    let cfg = with_env_overrides(
        &[
            ("BASTION_OUTAGE_DECAY", "0.25"),
            ("BASTION_DEFENDER_POLICY", "random"),
            ("BASTION_RL_ALPHA", "fast"),
        ],
        || Config::from_env_or_profile(ThreatProfile::High),
    );

    assert_eq!(cfg.attacker.p_attack, 0.60);
    assert_eq!(cfg.dynamics.outage_decay, 0.25);
    assert_eq!(cfg.policy.kind, PolicyKind::Random);
    // Unparseable values are ignored, leaving the default.
    assert_eq!(cfg.rl.alpha, Config::default().rl.alpha);
    assert!(env::var("BASTION_OUTAGE_DECAY").is_err());
}

#[test]
fn bastion_binary_runs_from_config_file() {
    let dir = tempdir().unwrap();
    let cfg_path = dir.path().join("quick.yaml");
    let q_path = dir.path().join("q.json");
    let traj_path = dir.path().join("eval.jsonl");
    fs::write(&cfg_path, "p_attack: 0.5\nrl_epsilon: 0.3\n").unwrap();

    let _env = env_guard();
    let out = Command::new(env!("CARGO_BIN_EXE_bastion"))
        .args(["--train-steps", "800", "--eval-steps", "150", "--log-level", "error"])
        .arg("--config")
        .arg(&cfg_path)
        .arg("--q-table-out")
        .arg(&q_path)
        .arg("--trajectory-out")
        .arg(&traj_path)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Training Summary"));
    assert!(stdout.contains("Evaluation Summary"));
    assert!(stdout.contains("Threat Check"));

    let table: Vec<QTableEntry> = serde_json::from_str(&fs::read_to_string(&q_path).unwrap()).unwrap();
    assert!(!table.is_empty());
    assert_eq!(fs::read_to_string(&traj_path).unwrap().lines().count(), 150);
}

#[test]
fn bastion_binary_rejects_unknown_profile() {
    let _env = env_guard();
    let out = Command::new(env!("CARGO_BIN_EXE_bastion"))
        .args(["--profile", "apocalyptic", "--train-steps", "10"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("apocalyptic"));
}
