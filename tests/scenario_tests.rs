// tests/scenario_tests.rs
//
// End-to-end scenarios through the public step / run API.

use bastion::{
    run, run_one, seeded_rng, step, threshold_action, Action, AttackTarget, Config, Intensity,
    PolicyKind, RunSpec, ScriptedDraws, SimError, SimState,
};

fn config(policy: PolicyKind, p_attack: f64, horizon: u64) -> Config {
    let mut cfg = Config::default().with_policy(policy);
    cfg.attacker.p_attack = p_attack;
    cfg.horizon = horizon;
    cfg
}

#[test]
fn no_attack_means_no_attack_events_for_any_policy() {
    for policy in [
        PolicyKind::AlwaysPassive,
        PolicyKind::Random,
        PolicyKind::ThresholdV1,
    ] {
        let cfg = config(policy, 0.0, 2_000);
        let records = run_one(&cfg, &RunSpec::new(8, policy, 2_000), None).unwrap();
        assert!(records.iter().all(|r| r.attack == AttackTarget::None));
        assert!(records.iter().all(|r| r.intensity == Intensity::None));
        assert!(records.iter().all(|r| !r.attack_success));
        assert!(records.iter().all(|r| r.p_success == 0.0));
    }
}

#[test]
fn certain_attack_targets_a_layer_every_step() {
    let cfg = config(PolicyKind::ThresholdV1, 1.0, 1_000);
    let mut state = SimState::new(&cfg);
    let mut rng = seeded_rng(21);
    let records = run(&cfg, &mut state, &mut rng, None).unwrap();
    assert!(records.iter().all(|r| r.attack != AttackTarget::None));
    assert!(records.iter().all(|r| r.intensity != Intensity::None));
    assert!(records.iter().any(|r| r.attack == AttackTarget::It));
    assert!(records.iter().any(|r| r.attack == AttackTarget::Ot));
}

#[test]
fn always_passive_never_deviates() {
    let mut cfg = config(PolicyKind::AlwaysPassive, 0.9, 1_500);
    cfg.initial.it_comp = true;
    cfg.initial.ot_comp = true;
    cfg.initial.phys_damage = 5.0;
    let mut state = SimState::new(&cfg);
    let mut rng = seeded_rng(3);
    let records = run(&cfg, &mut state, &mut rng, None).unwrap();
    assert_eq!(records.len(), 1_500);
    assert!(records.iter().all(|r| r.action == Action::Passive));
    assert!(records.iter().all(|r| !r.recovery.recovery_it_cleared));
}

#[test]
fn quiet_ten_step_passive_run_stays_uncompromised() {
    let cfg = config(PolicyKind::AlwaysPassive, 0.0, 10);
    let mut state = SimState::new(&cfg);
    let mut rng = seeded_rng(cfg.seed);
    let records = run(&cfg, &mut state, &mut rng, None).unwrap();

    assert_eq!(records.len(), 10);
    for (t, r) in records.iter().enumerate() {
        assert_eq!(r.pre.t, t as u64);
        assert!(!r.it_comp_end);
        assert!(!r.ot_comp_end);
        assert_eq!(r.phys_damage_next, 0.0);
    }
}

#[test]
fn ot_compromise_forces_recover_over_every_other_trigger() {
    let cfg = Config::default();
    let mut state = SimState::new(&cfg);
    state.ot_comp = true;
    state.it_comp = true;
    state.id_cap = 0.0;
    state.phys_damage = 0.0;
    state.outage = 0.0;
    assert_eq!(threshold_action(&cfg, &state), Action::Recover);

    // Also through the full step, with no attack to muddy the record.
    let cfg = config(PolicyKind::ThresholdV1, 0.0, 1);
    let mut records = Vec::new();
    let mut rng = seeded_rng(1);
    step(&cfg, &mut state, &mut rng, 0, None, &mut records).unwrap();
    assert_eq!(records[0].action, Action::Recover);
    assert!(records[0].effect.recover_clear_boost > 0.0);
}

#[test]
fn forced_low_ot_attack_with_certain_success() {
    let mut cfg = config(PolicyKind::AlwaysPassive, 1.0, 1);
    cfg.initial.ot_vuln = 1.0;
    cfg.attacker.base_success_mult = 1.0;
    cfg.attacker.high_success_bonus = 0.0;
    // keep OT vulnerability pinned at 1 through the PASSIVE hardening phase
    cfg.defender.delta_ot_vuln = 0.0;

    let mut state = SimState::new(&cfg);
    // occurrence, target -> OT, intensity -> LOW, success, OT detection miss
    let mut draws = ScriptedDraws::new([0.0, 0.0, 0.999, 0.999, 0.5]);
    let mut records = Vec::new();
    step(&cfg, &mut state, &mut draws, 0, None, &mut records).unwrap();

    let r = &records[0];
    assert_eq!(r.attack, AttackTarget::Ot);
    assert_eq!(r.intensity, Intensity::Low);
    assert_eq!(r.p_success, 1.0);
    assert!(r.attack_success);
    assert!(!r.detection.ot_detected);
    assert!(r.detection.ot_comp_post);
    assert!(r.ot_comp_end);
    assert!(state.ot_comp);
    assert!(!state.it_comp);
    assert_eq!(draws.remaining(), 0);
    assert_eq!(draws.consumed(), 5);
}

#[test]
fn recovery_can_clear_an_undetected_compromise() {
    let mut cfg = config(PolicyKind::ThresholdV1, 0.0, 1);
    cfg.initial.ot_comp = true;
    let mut state = SimState::new(&cfg);
    // attack occurrence (none), OT detection miss, OT recovery clear
    let mut draws = ScriptedDraws::new([0.99, 0.99, 0.0]);
    let mut records = Vec::new();
    step(&cfg, &mut state, &mut draws, 0, None, &mut records).unwrap();

    let r = &records[0];
    assert_eq!(r.action, Action::Recover);
    assert!(!r.detection.ot_detected);
    assert!(r.detection.ot_comp_post);
    assert!(r.recovery.recovery_ot_cleared);
    assert!(!r.ot_comp_end);
    assert_eq!(draws.consumed(), 3);
}

#[test]
fn qlearn_policy_without_agent_aborts_the_run() {
    let cfg = config(PolicyKind::QLearnV1, 0.35, 50);
    let err = run_one(&cfg, &RunSpec::new(1, PolicyKind::QLearnV1, 50), None).unwrap_err();
    assert!(matches!(err, SimError::MissingAgent { policy: "qlearn_v1" }));
}
