//! Configuration settings for the decomposition masters.

use serde::{Deserialize, Serialize};

/// Settings for the Dantzig-Wolfe restricted master.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DwSettings {
    /// Relative gap at which phase 2 stops.
    pub gap_tol: f64,

    /// A column prices in if its subproblem objective is below the
    /// convexity dual by more than this.
    pub pricing_tol: f64,

    /// Phase 1 succeeds once total infeasibility drops below this.
    pub feas_tol: f64,

    /// Maximum master iterations per `solve`.
    pub iteration_limit: usize,

    /// Wall-clock limit per `solve` in seconds. Each master LP resolve gets
    /// the time that remains.
    pub time_limit: Option<f64>,

    /// Time limit handed to subproblem workers in phase 2.
    pub sub_time_limit: Option<f64>,

    /// Deactivate nonbasic columns older than this many iterations.
    pub column_age_limit: Option<usize>,

    /// Emit per-iteration progress lines.
    pub verbose: bool,

    /// Print every N iterations.
    pub log_freq: usize,
}

impl Default for DwSettings {
    fn default() -> Self {
        Self {
            gap_tol: 1e-4,
            pricing_tol: 1e-4,
            feas_tol: 1e-6,
            iteration_limit: 10_000,
            time_limit: None,
            sub_time_limit: None,
            column_age_limit: None,
            verbose: false,
            log_freq: 1,
        }
    }
}

impl DwSettings {
    /// Set the relative gap tolerance.
    pub fn with_gap_tol(mut self, tol: f64) -> Self {
        self.gap_tol = tol;
        self
    }

    /// Set the pricing tolerance.
    pub fn with_pricing_tol(mut self, tol: f64) -> Self {
        self.pricing_tol = tol;
        self
    }

    /// Set the phase-1 feasibility tolerance.
    pub fn with_feas_tol(mut self, tol: f64) -> Self {
        self.feas_tol = tol;
        self
    }

    /// Set the iteration limit.
    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = limit;
        self
    }

    /// Set the wall-clock limit per solve.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    /// Enable column aging.
    pub fn with_column_age_limit(mut self, limit: usize) -> Self {
        self.column_age_limit = Some(limit);
        self
    }

    /// Enable progress logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Settings for the trust-region dual-decomposition master.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustRegionSettings {
    /// Use a trust region around the stability center.
    pub enabled: bool,

    /// Initial trust-region radius.
    pub initial_radius: f64,

    /// Upper cap on the radius.
    pub max_radius: f64,

    /// Allow the radius to shrink on null steps.
    pub allow_decrease: bool,

    /// Relative gap at which the outer loop stops.
    pub stop_tol: f64,

    /// Cuts younger than this are never deleted.
    pub cut_age_limit: usize,

    /// Primal-progress factor in the cut deletion rule.
    pub cut_del_param: f64,

    /// A multiplier within this distance of its trust-region bound sits on
    /// the boundary.
    pub boundary_eps: f64,

    /// Minimum violation for a cut to be added or recruited.
    pub cut_violation_tol: f64,

    /// Cut multipliers below this magnitude count as zero.
    pub cut_dual_tol: f64,

    /// Maximum outer iterations for [`run`](crate::TrustRegionMaster::run).
    pub iteration_limit: usize,

    /// Emit per-iteration progress lines.
    pub verbose: bool,

    /// Print every N iterations.
    pub log_freq: usize,
}

impl Default for TrustRegionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_radius: 0.1,
            max_radius: 1e4,
            allow_decrease: true,
            stop_tol: 1e-5,
            cut_age_limit: 100,
            cut_del_param: 0.5,
            boundary_eps: 1e-6,
            cut_violation_tol: 1e-6,
            cut_dual_tol: 1e-8,
            iteration_limit: 1000,
            verbose: false,
            log_freq: 1,
        }
    }
}

impl TrustRegionSettings {
    /// Disable the trust region (infinite radius).
    pub fn without_trust_region(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the initial radius.
    pub fn with_initial_radius(mut self, radius: f64) -> Self {
        self.initial_radius = radius;
        self
    }

    /// Set the stopping tolerance.
    pub fn with_stop_tol(mut self, tol: f64) -> Self {
        self.stop_tol = tol;
        self
    }

    /// Set the cut age limit.
    pub fn with_cut_age_limit(mut self, limit: usize) -> Self {
        self.cut_age_limit = limit;
        self
    }

    /// Set the outer iteration limit.
    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = limit;
        self
    }

    /// Enable progress logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Measure of disagreement between scenario copies of a first-stage column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviationMeasure {
    /// max_s x[s,j] − min_s x[s,j].
    #[default]
    Range,
    /// Probability-weighted L2 distance from the reference value.
    L2,
}

/// Settings for nonanticipativity branching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchSettings {
    /// Search integer columns before continuous ones.
    pub integer_first: bool,

    /// Deviations at or below this are ignored.
    pub epsilon: f64,

    /// Half-width of the gap cut out around a continuous branching value.
    pub epsilon_bb: f64,

    /// Deviation measure.
    pub deviation: DeviationMeasure,
}

impl Default for BranchSettings {
    fn default() -> Self {
        Self {
            integer_first: true,
            epsilon: 1e-6,
            epsilon_bb: 1e-6,
            deviation: DeviationMeasure::Range,
        }
    }
}

impl BranchSettings {
    /// Search all columns in one pass.
    pub fn without_integer_first(mut self) -> Self {
        self.integer_first = false;
        self
    }

    /// Set the deviation measure.
    pub fn with_deviation(mut self, deviation: DeviationMeasure) -> Self {
        self.deviation = deviation;
        self
    }

    /// Set the continuous branching epsilon.
    pub fn with_epsilon_bb(mut self, eps: f64) -> Self {
        self.epsilon_bb = eps;
        self
    }
}
