#![deny(warnings)]

//! Monte Carlo engine for Verdict.
//!
//! This crate simulates a decaying resource level under random shocks for
//! the two candidate policies (take the action, or don't), aggregates
//! survival and terminal-resource statistics, and applies a deterministic
//! comparison rule to produce a YES/NO recommendation.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;
use verdict_core::{
    validate_config, validate_params, AggregateStats, DecisionParams, EngineConfig, ParamError,
    Policy, Recommendation, RunOutcome, Verdict,
};

/// Derive a reproducible seed from the scenario parameters.
///
/// Identical inputs always roll the same randomness, so repeating a
/// question yields the same answer. An explicit `rng_seed` in the config
/// takes precedence over this.
pub fn derive_seed(params: &DecisionParams, cfg: &EngineConfig) -> u64 {
    let key = format!(
        "{}-{}-{}-{}-{}",
        cfg.initial_resources, params.cost, params.benefit, params.risk, params.horizon
    );
    let hash = blake3::hash(key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Simulate one trajectory under the given policy.
///
/// The trial is dead the moment resources drop to or below zero; from then
/// on resources stay clamped at 0 and no further steps apply.
fn run_trial(
    params: &DecisionParams,
    cfg: &EngineConfig,
    policy: Policy,
    shock: Option<&Normal<f64>>,
    rng: &mut ChaCha8Rng,
) -> RunOutcome {
    let mut resources = cfg.initial_resources;
    let mut alive = true;

    let decay = match policy {
        Policy::Act => cfg.base_decay * (1.0 - params.benefit),
        Policy::Refrain => cfg.base_decay,
    };
    if policy == Policy::Act {
        // One-time upfront cost, paid before the step loop.
        resources -= cfg.initial_resources * params.cost;
        if resources <= 0.0 {
            resources = 0.0;
            alive = false;
        }
    }

    for _ in 0..params.horizon {
        if !alive {
            break;
        }
        resources *= 1.0 - decay;
        if let Some(dist) = shock {
            resources += dist.sample(rng);
        }
        if resources <= 0.0 {
            resources = 0.0;
            alive = false;
        }
    }

    RunOutcome {
        survived: alive,
        final_resources: resources,
    }
}

/// Run `cfg.trials` independent trajectories under one policy and
/// aggregate their outcomes.
///
/// Trial `t` uses a ChaCha stream with index `t` derived from `seed`, so
/// trials are statistically independent of each other and the two policy
/// runs of the same trial share one shock sequence (common random
/// numbers, which keeps the YES/NO comparison low-variance). With
/// `risk == 0` no randomness is consumed and every trial is identical.
pub fn run_policy(
    params: &DecisionParams,
    cfg: &EngineConfig,
    policy: Policy,
    seed: u64,
) -> Result<AggregateStats, ParamError> {
    validate_params(params)?;
    validate_config(cfg)?;

    let shock_std = cfg.shock_scale * cfg.initial_resources * params.risk;
    let shock = if shock_std > 0.0 {
        Some(Normal::new(0.0, shock_std).map_err(|_| ParamError::InvalidRisk(params.risk))?)
    } else {
        None
    };

    let mut outcomes = Vec::with_capacity(cfg.trials as usize);
    for trial in 0..cfg.trials {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(trial as u64);
        outcomes.push(run_trial(params, cfg, policy, shock.as_ref(), &mut rng));
    }

    Ok(AggregateStats::from_outcomes(&outcomes))
}

/// Deterministic comparison of the two policies' aggregate outcomes.
///
/// Survival dominates: whichever side's survival rate exceeds the other's
/// by more than `epsilon` wins. Within the tolerance the higher mean final
/// resource level decides, and an exact tie on both metrics favors YES.
pub fn decide(acted: &AggregateStats, declined: &AggregateStats, epsilon: f64) -> Verdict {
    if acted.survival_rate - declined.survival_rate > epsilon {
        return Verdict::Yes;
    }
    if declined.survival_rate - acted.survival_rate > epsilon {
        return Verdict::No;
    }
    if acted.mean_final_resources >= declined.mean_final_resources {
        Verdict::Yes
    } else {
        Verdict::No
    }
}

/// Validate inputs, simulate both policies, and recommend one.
///
/// All validation happens here at the boundary; nothing runs on invalid
/// parameters.
pub fn evaluate(
    params: &DecisionParams,
    cfg: &EngineConfig,
) -> Result<Recommendation, ParamError> {
    validate_params(params)?;
    validate_config(cfg)?;

    let seed = cfg.rng_seed.unwrap_or_else(|| derive_seed(params, cfg));
    let acted = run_policy(params, cfg, Policy::Act, seed)?;
    let declined = run_policy(params, cfg, Policy::Refrain, seed)?;
    let verdict = decide(&acted, &declined, cfg.survival_epsilon);

    debug!(
        %verdict,
        seed,
        trials = cfg.trials,
        acted_survival = acted.survival_rate,
        declined_survival = declined.survival_rate,
        acted_mean = acted.mean_final_resources,
        declined_mean = declined.mean_final_resources,
        "evaluation complete"
    );

    Ok(Recommendation {
        verdict,
        acted,
        declined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params() -> DecisionParams {
        DecisionParams {
            cost: 0.2,
            benefit: 0.5,
            risk: 0.3,
            horizon: 50,
        }
    }

    fn config(trials: u32, seed: u64) -> EngineConfig {
        EngineConfig {
            trials,
            rng_seed: Some(seed),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn zero_risk_is_fully_deterministic() {
        let p = DecisionParams {
            risk: 0.0,
            ..params()
        };
        // Every trial is identical, so the trial count cannot matter.
        let few = run_policy(&p, &config(1, 7), Policy::Act, 7).unwrap();
        let many = run_policy(&p, &config(256, 7), Policy::Act, 7).unwrap();
        assert_eq!(few, many);

        // Closed form: 80 after the upfront cost, then 50 steps of 2.5% decay.
        let expected = 80.0 * (1.0 - 0.025f64).powi(50);
        assert!((few.mean_final_resources - expected).abs() < 1e-9);
        assert_eq!(few.survival_rate, 1.0);
    }

    #[test]
    fn neutral_action_is_a_true_tie() {
        let p = DecisionParams {
            cost: 0.0,
            benefit: 0.0,
            risk: 0.0,
            horizon: 30,
        };
        let cfg = config(100, 11);
        let rec = evaluate(&p, &cfg).unwrap();
        assert_eq!(rec.acted, rec.declined);
        // Exact ties favor YES under the documented rule.
        assert_eq!(rec.verdict, Verdict::Yes);
    }

    #[test]
    fn fixed_seed_reproduces_exactly() {
        let cfg = config(500, 42);
        let a = evaluate(&params(), &cfg).unwrap();
        let b = evaluate(&params(), &cfg).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn trial_count_only_moves_stats_within_noise() {
        let p = params();
        let small = run_policy(&p, &config(500, 42), Policy::Refrain, 42).unwrap();
        let large = run_policy(&p, &config(4000, 42), Policy::Refrain, 42).unwrap();
        assert!((small.survival_rate - large.survival_rate).abs() < 0.1);
        assert!((small.mean_final_resources - large.mean_final_resources).abs() < 5.0);
    }

    #[test]
    fn higher_benefit_never_hurts_mean_resources() {
        let low = DecisionParams {
            benefit: 0.2,
            ..params()
        };
        let high = DecisionParams {
            benefit: 0.6,
            ..params()
        };
        let cfg = config(400, 9);
        let s_low = run_policy(&low, &cfg, Policy::Act, 9).unwrap();
        let s_high = run_policy(&high, &cfg, Policy::Act, 9).unwrap();
        // Shared per-trial shock streams make this hold pointwise.
        assert!(s_high.mean_final_resources >= s_low.mean_final_resources);
    }

    #[test]
    fn single_step_horizon_applies_cost_and_one_step() {
        let p = DecisionParams {
            cost: 0.2,
            benefit: 0.5,
            risk: 0.0,
            horizon: 1,
        };
        let stats = run_policy(&p, &config(10, 3), Policy::Act, 3).unwrap();
        // 100 - 20 upfront, then one step at 2.5% decay.
        assert!((stats.mean_final_resources - 78.0).abs() < 1e-9);
        assert_eq!(stats.survival_rate, 1.0);
    }

    #[test]
    fn lethal_upfront_cost_kills_before_the_first_step() {
        let p = DecisionParams {
            cost: 1.0,
            benefit: 0.5,
            risk: 0.0,
            horizon: 10,
        };
        let stats = run_policy(&p, &config(10, 3), Policy::Act, 3).unwrap();
        assert_eq!(stats.survival_rate, 0.0);
        assert_eq!(stats.mean_final_resources, 0.0);
    }

    #[test]
    fn reference_scenario_recommends_yes() {
        // cost=0.2, benefit=0.5, risk=0.3, horizon=50, 1000 trials, fixed seed:
        // halving the decay for a 20% upfront cost dominates on survival.
        let cfg = config(1000, 42);
        let rec = evaluate(&params(), &cfg).unwrap();
        assert!(rec.acted.survival_rate > rec.declined.survival_rate + cfg.survival_epsilon);
        assert_eq!(rec.verdict, Verdict::Yes);
    }

    #[test]
    fn invalid_cost_is_rejected_before_any_trial() {
        let p = DecisionParams {
            cost: 1.5,
            ..params()
        };
        let err = evaluate(&p, &EngineConfig::default()).unwrap_err();
        assert_eq!(err, ParamError::CostOutOfRange(1.5));
    }

    #[test]
    fn decide_prefers_survival_beyond_epsilon() {
        let strong = AggregateStats {
            survival_rate: 0.9,
            mean_final_resources: 5.0,
        };
        let weak = AggregateStats {
            survival_rate: 0.5,
            mean_final_resources: 50.0,
        };
        assert_eq!(decide(&strong, &weak, 0.01), Verdict::Yes);
        assert_eq!(decide(&weak, &strong, 0.01), Verdict::No);
    }

    #[test]
    fn decide_breaks_near_ties_on_mean_resources() {
        let a = AggregateStats {
            survival_rate: 0.80,
            mean_final_resources: 30.0,
        };
        let b = AggregateStats {
            survival_rate: 0.805,
            mean_final_resources: 40.0,
        };
        assert_eq!(decide(&a, &b, 0.01), Verdict::No);
        assert_eq!(decide(&b, &a, 0.01), Verdict::Yes);
    }

    #[test]
    fn derived_seed_is_stable_and_parameter_sensitive() {
        let cfg = EngineConfig::default();
        let p = params();
        assert_eq!(derive_seed(&p, &cfg), derive_seed(&p, &cfg));
        let shifted = DecisionParams {
            risk: 0.31,
            ..p
        };
        assert_ne!(derive_seed(&p, &cfg), derive_seed(&shifted, &cfg));
    }

    proptest! {
        #[test]
        fn stats_stay_in_range(cost in 0.0f64..=1.0,
                               benefit in 0.0f64..=1.0,
                               risk in 0.0f64..2.0,
                               horizon in 1u32..60) {
            let p = DecisionParams { cost, benefit, risk, horizon };
            let cfg = config(64, 5);
            for policy in [Policy::Act, Policy::Refrain] {
                let stats = run_policy(&p, &cfg, policy, 5).unwrap();
                prop_assert!((0.0..=1.0).contains(&stats.survival_rate));
                prop_assert!(stats.mean_final_resources >= 0.0);
                prop_assert!(stats.mean_final_resources.is_finite());
            }
        }
    }
}
