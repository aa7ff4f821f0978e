#![deny(warnings)]

//! Core domain models and invariants for Verdict.
//!
//! This crate defines the serializable types shared across the simulation
//! with validation helpers to guarantee basic invariants: decision
//! parameters, engine configuration, per-trial outcomes, aggregate
//! statistics, and the final recommendation.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Scalar inputs describing the decision under consideration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionParams {
    /// Fraction of resources paid immediately if the action is taken, in [0,1].
    pub cost: f64,
    /// Fractional reduction of the decay rate if the action is taken, in [0,1].
    pub benefit: f64,
    /// Environment volatility scale (>= 0); shock magnitude grows linearly with it.
    pub risk: f64,
    /// Number of discrete time steps to simulate (>= 1).
    pub horizon: u32,
}

/// Engine configuration: the simulation constants with documented defaults.
///
/// Every "magic number" of the model lives here so tests and callers can
/// override it explicitly rather than patching globals.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Resource level every trajectory starts from.
    pub initial_resources: f64,
    /// Baseline fractional decay per time step.
    pub base_decay: f64,
    /// Shock std dev per unit of risk, as a fraction of `initial_resources`.
    pub shock_scale: f64,
    /// Survival-rate differences within this tolerance count as a tie.
    pub survival_epsilon: f64,
    /// Number of independent trajectories per policy.
    pub trials: u32,
    /// Explicit RNG seed; `None` derives one from the parameters.
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_resources: 100.0,
            base_decay: 0.05,
            shock_scale: 0.1,
            survival_epsilon: 0.01,
            trials: 1000,
            rng_seed: None,
        }
    }
}

/// Which of the two candidate paths a run simulates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Policy {
    /// Take the action: pay the upfront cost, enjoy the reduced decay.
    Act,
    /// Decline the action: no cost, baseline decay.
    Refrain,
}

/// Result of a single simulated trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Resources stayed positive through every step.
    pub survived: bool,
    /// Resource level after the final step, clamped at 0 if depleted.
    pub final_resources: f64,
}

/// Aggregate statistics over a batch of trajectories.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Fraction of trajectories that survived, in [0,1].
    pub survival_rate: f64,
    /// Arithmetic mean of final resources across all trajectories.
    pub mean_final_resources: f64,
}

impl AggregateStats {
    /// Aggregate a batch of outcomes. Empty input yields all-zero stats.
    pub fn from_outcomes(outcomes: &[RunOutcome]) -> Self {
        if outcomes.is_empty() {
            return Self {
                survival_rate: 0.0,
                mean_final_resources: 0.0,
            };
        }
        let n = outcomes.len() as f64;
        let survived = outcomes.iter().filter(|o| o.survived).count() as f64;
        let total: f64 = outcomes.iter().map(|o| o.final_resources).sum();
        Self {
            survival_rate: survived / n,
            mean_final_resources: total / n,
        }
    }
}

/// The recommended answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Yes,
    No,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Yes => write!(f, "YES"),
            Verdict::No => write!(f, "NO"),
        }
    }
}

/// Final output: the verdict plus the statistics that justify it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// The recommended answer.
    pub verdict: Verdict,
    /// Outcomes if the action is taken (the YES path).
    pub acted: AggregateStats,
    /// Outcomes if the action is declined (the NO path).
    pub declined: AggregateStats,
}

/// Validation errors for decision parameters and engine configuration.
///
/// These are boundary errors: rejection happens before any trial runs,
/// and values are never silently clamped.
#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    /// Cost must be within [0,1].
    #[error("cost must be within [0,1], got {0}")]
    CostOutOfRange(f64),
    /// Benefit must be within [0,1].
    #[error("benefit must be within [0,1], got {0}")]
    BenefitOutOfRange(f64),
    /// Risk must be finite and non-negative.
    #[error("risk must be a finite value >= 0, got {0}")]
    InvalidRisk(f64),
    /// Horizon must be at least one step.
    #[error("horizon must be >= 1")]
    ZeroHorizon,
    /// Trial count must be at least one.
    #[error("trial count must be >= 1")]
    ZeroTrials,
    /// Initial resources must be finite and strictly positive.
    #[error("initial resources must be finite and > 0, got {0}")]
    InvalidInitialResources(f64),
    /// Base decay must be within [0,1].
    #[error("base decay must be within [0,1], got {0}")]
    InvalidBaseDecay(f64),
    /// Shock scale must be finite and non-negative.
    #[error("shock scale must be a finite value >= 0, got {0}")]
    InvalidShockScale(f64),
    /// Survival epsilon must be finite and non-negative.
    #[error("survival epsilon must be a finite value >= 0, got {0}")]
    InvalidEpsilon(f64),
}

/// Validate decision parameters.
pub fn validate_params(p: &DecisionParams) -> Result<(), ParamError> {
    if !p.cost.is_finite() || !(0.0..=1.0).contains(&p.cost) {
        return Err(ParamError::CostOutOfRange(p.cost));
    }
    if !p.benefit.is_finite() || !(0.0..=1.0).contains(&p.benefit) {
        return Err(ParamError::BenefitOutOfRange(p.benefit));
    }
    if !p.risk.is_finite() || p.risk < 0.0 {
        return Err(ParamError::InvalidRisk(p.risk));
    }
    if p.horizon == 0 {
        return Err(ParamError::ZeroHorizon);
    }
    Ok(())
}

/// Validate engine configuration.
pub fn validate_config(c: &EngineConfig) -> Result<(), ParamError> {
    if !c.initial_resources.is_finite() || c.initial_resources <= 0.0 {
        return Err(ParamError::InvalidInitialResources(c.initial_resources));
    }
    if !c.base_decay.is_finite() || !(0.0..=1.0).contains(&c.base_decay) {
        return Err(ParamError::InvalidBaseDecay(c.base_decay));
    }
    if !c.shock_scale.is_finite() || c.shock_scale < 0.0 {
        return Err(ParamError::InvalidShockScale(c.shock_scale));
    }
    if !c.survival_epsilon.is_finite() || c.survival_epsilon < 0.0 {
        return Err(ParamError::InvalidEpsilon(c.survival_epsilon));
    }
    if c.trials == 0 {
        return Err(ParamError::ZeroTrials);
    }
    Ok(())
}
