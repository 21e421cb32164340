// tests/invariant_tests.rs
//
// State invariants over arbitrary configurations and seeds.
//
// Bounded fields stay in [0,1], accumulators stay non-negative, and the
// discretized key is always one of the 108 valid tuples, no matter how
// aggressive the parameters are.

use bastion::rl::discretize::STATE_SPACE_SIZE;
use bastion::{
    bin, discretize, seeded_rng, step, Config, PolicyKind, QLearner, SimState, TrajectoryRecord,
};
use proptest::prelude::*;

fn policy_strategy() -> impl Strategy<Value = PolicyKind> {
    prop_oneof![
        Just(PolicyKind::AlwaysPassive),
        Just(PolicyKind::Random),
        Just(PolicyKind::ThresholdV1),
        Just(PolicyKind::QLearnV1),
    ]
}

prop_compose! {
    fn arb_config()(
        policy in policy_strategy(),
        g in -1.0f64..2.0,
        p_attack in 0.0f64..=1.0,
        it_vuln in -0.5f64..1.5,
        ot_vuln in -0.5f64..1.5,
        id_cap in -0.5f64..1.5,
        base_success_mult in 0.0f64..3.0,
        high_success_bonus in 0.0f64..1.0,
        delta in 0.0f64..0.8,
        active_damage_reduction in 0.0f64..2.0,
        delta_downtime_reduction in 0.0f64..2.0,
        base_damage in 0.0f64..0.5,
        outage_comp_cost in 0.0f64..2.0,
        damage_recover_decay in -0.5f64..1.5,
        epsilon in 0.0f64..=1.0,
    ) -> Config {
        let mut cfg = Config::default().with_policy(policy);
        cfg.governance = g;
        cfg.attacker.p_attack = p_attack;
        cfg.initial.it_vuln = it_vuln;
        cfg.initial.ot_vuln = ot_vuln;
        cfg.initial.id_cap = id_cap;
        cfg.attacker.base_success_mult = base_success_mult;
        cfg.attacker.high_success_bonus = high_success_bonus;
        cfg.defender.delta_it_vuln = delta;
        cfg.defender.delta_ot_vuln = delta;
        cfg.defender.delta_id_cap = delta;
        cfg.defender.delta_detect = delta;
        cfg.defender.active_damage_reduction = active_damage_reduction;
        cfg.defender.delta_downtime_reduction = delta_downtime_reduction;
        cfg.dynamics.base_damage = base_damage;
        cfg.dynamics.outage_comp_cost = outage_comp_cost;
        cfg.dynamics.damage_recover_decay = damage_recover_decay;
        cfg.rl.epsilon = epsilon;
        cfg
    }
}

fn assert_record_bounds(r: &TrajectoryRecord) {
    for (name, x) in [
        ("it_vuln_next", r.it_vuln_next),
        ("ot_vuln_next", r.ot_vuln_next),
        ("id_cap_next", r.id_cap_next),
        ("outage_next", r.outage_next),
        ("p_high", r.p_high),
        ("p_success", r.p_success),
        ("active_damage_reduction", r.effect.active_damage_reduction),
        ("downtime_reduction_boost", r.effect.downtime_reduction_boost),
    ] {
        assert!((0.0..=1.0).contains(&x), "{name} = {x} at t={}", r.pre.t);
    }
    assert!(r.phys_damage_next >= 0.0);
    assert!(r.downtime_next >= 0.0);
    assert!(r.damage_step >= 0.0);
    assert!(r.recovery.damage_reduction >= 0.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn state_stays_bounded(cfg in arb_config(), seed in any::<u64>(), steps in 1u64..300) {
        let mut state = SimState::new(&cfg);
        let mut rng = seeded_rng(seed);
        let mut agent = QLearner::default();
        let mut records = Vec::new();

        let mut t = 0;
        for _ in 0..steps {
            let agent_ref = if cfg.policy.kind.is_qlearn() { Some(&mut agent) } else { None };
            t = step(&cfg, &mut state, &mut rng, t, agent_ref, &mut records).unwrap();
            prop_assert_eq!(state.bounds_violation(), None);

            let s = discretize(&cfg, &state);
            prop_assert!(s.is_valid());
            prop_assert!(s.ordinal() < STATE_SPACE_SIZE);
        }

        prop_assert_eq!(records.len() as u64, steps);
        for r in &records {
            assert_record_bounds(r);
        }
        prop_assert!(agent.len() <= STATE_SPACE_SIZE);
    }

    #[test]
    fn bin_is_monotone_and_half_open(lo in 0.0f64..1.0, width in 0.0f64..1.0, x in -1.0f64..3.0) {
        let high = lo + width;
        let b = bin(x, lo, high);
        prop_assert!(b <= 2);
        prop_assert_eq!(bin(lo, lo, high) , if width > 0.0 { 1 } else { 2 });
        prop_assert_eq!(bin(high, lo, high), 2);
        if x < lo {
            prop_assert_eq!(b, 0);
        } else if x < high {
            prop_assert_eq!(b, 1);
        } else {
            prop_assert_eq!(b, 2);
        }
    }
}

#[test]
fn every_reachable_key_is_one_of_108() {
    // Sweep the continuous fields across and beyond their bin thresholds.
    let cfg = Config::default();
    let mut state = SimState::new(&cfg);
    let grid = [-1.0, 0.0, 0.05, 0.1, 0.3, 0.5, 0.7, 1.0, 2.5, 10.0];
    let mut seen = std::collections::BTreeSet::new();
    for it in [false, true] {
        for ot in [false, true] {
            for &a in &grid {
                for &b in &grid {
                    for &c in &grid {
                        state.it_comp = it;
                        state.ot_comp = ot;
                        state.id_cap = a;
                        state.phys_damage = b;
                        state.outage = c;
                        let s = discretize(&cfg, &state);
                        assert!(s.is_valid());
                        seen.insert(s);
                    }
                }
            }
        }
    }
    assert!(seen.len() <= STATE_SPACE_SIZE);
    assert_eq!(seen.len(), STATE_SPACE_SIZE);
}
