//! Non-anticipativity branching.
//!
//! The master solution holds one copy of every first-stage column per
//! scenario. The generator picks the first-stage column whose copies
//! disagree the most and splits its range around the probability-weighted
//! reference value.

use crate::error::{DecompError, DecompResult, StateErrorCode};
use crate::model::{MasterStructure, TwoStageInfo};
use crate::settings::{BranchSettings, DeviationMeasure};

/// Squared L2 deviations at or below this are treated as zero.
const L2_ZERO_TOL: f64 = 1e-10;

/// Direction of a child relative to the branching value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchDirection {
    /// Raised lower bound.
    Up,
    /// Lowered upper bound.
    Down,
}

impl BranchDirection {
    /// `+1` for up, `-1` for down.
    pub fn sign(self) -> i32 {
        match self {
            BranchDirection::Up => 1,
            BranchDirection::Down => -1,
        }
    }
}

/// Bound restrictions defining one child node.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchingObject {
    /// Original columns with restricted bounds.
    pub indices: Vec<usize>,

    /// New lower bounds, parallel to `indices`.
    pub lower: Vec<f64>,

    /// New upper bounds, parallel to `indices`.
    pub upper: Vec<f64>,

    /// Best dual bound of the parent.
    pub best_bound: f64,

    /// Dual solution of the parent's best bound.
    pub dual_solution: Vec<f64>,

    /// Direction of the new restriction.
    pub direction: BranchDirection,

    /// Node ordering score.
    pub estimate: f64,
}

impl BranchingObject {
    /// An object with no bound restrictions.
    pub fn new(direction: BranchDirection) -> Self {
        Self {
            indices: Vec::new(),
            lower: Vec::new(),
            upper: Vec::new(),
            best_bound: f64::NEG_INFINITY,
            dual_solution: Vec::new(),
            direction,
            estimate: 0.0,
        }
    }

    /// Append a bound restriction.
    pub fn push(&mut self, index: usize, lower: f64, upper: f64) {
        self.indices.push(index);
        self.lower.push(lower);
        self.upper.push(upper);
    }

    /// Number of restricted columns.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True if nothing is restricted.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Restricted bounds of column `index`, if present.
    pub fn bounds_of(&self, index: usize) -> Option<(f64, f64)> {
        self.indices
            .iter()
            .position(|&j| j == index)
            .map(|k| (self.lower[k], self.upper[k]))
    }

    pub(crate) fn validate(&self, num_cols: usize) -> DecompResult<()> {
        if self.lower.len() != self.indices.len() || self.upper.len() != self.indices.len() {
            return Err(DecompError::InvalidModel(format!(
                "branching object has {} indices, {} lower and {} upper bounds",
                self.indices.len(),
                self.lower.len(),
                self.upper.len()
            )));
        }
        if let Some(&j) = self.indices.iter().find(|&&j| j >= num_cols) {
            return Err(DecompError::state(
                StateErrorCode::BranchingIndexOutOfRange,
                format!("branching index {} beyond {} columns", j, num_cols),
            ));
        }
        Ok(())
    }
}

/// Master state read by the branching generator.
#[derive(Debug, Clone, Copy)]
pub struct BranchingView<'a> {
    /// Recovered master solution over original columns.
    pub solution: &'a [f64],

    /// Current node lower bounds.
    pub node_lower: &'a [f64],

    /// Current node upper bounds.
    pub node_upper: &'a [f64],

    /// Root lower bounds.
    pub root_lower: &'a [f64],

    /// Root upper bounds.
    pub root_upper: &'a [f64],

    /// Best dual bound at the node.
    pub best_bound: f64,

    /// Dual solution of the best bound.
    pub dual_solution: &'a [f64],
}

/// Branching on disagreement between scenario copies of first-stage columns.
#[derive(Debug, Clone)]
pub struct NonantBranching {
    info: TwoStageInfo,
    integer: Vec<bool>,
    settings: BranchSettings,
}

impl NonantBranching {
    /// `integer` flags the first-stage columns.
    pub fn new(info: TwoStageInfo, integer: Vec<bool>, settings: BranchSettings) -> DecompResult<Self> {
        if integer.len() != info.num_first_stage {
            return Err(DecompError::InvalidModel(format!(
                "{} integer flags for {} first-stage columns",
                integer.len(),
                info.num_first_stage
            )));
        }
        Ok(Self {
            info,
            integer,
            settings,
        })
    }

    /// Build from a two-stage master structure.
    pub fn from_structure(structure: &MasterStructure, settings: BranchSettings) -> DecompResult<Self> {
        let info = structure.two_stage.clone().ok_or_else(|| {
            DecompError::InvalidModel("non-anticipativity branching needs a two-stage structure".into())
        })?;
        let integer = structure.integer[..info.num_first_stage].to_vec();
        Self::new(info, integer, settings)
    }

    /// Probability-weighted first-stage reference solution.
    pub fn reference_solution(&self, x: &[f64]) -> Vec<f64> {
        let n1 = self.info.num_first_stage;
        let mut reference = vec![0.0; n1];
        for (s, &p) in self.info.probabilities.iter().enumerate() {
            for (j, r) in reference.iter_mut().enumerate() {
                *r += p * x[self.info.copy_index(s, j)];
            }
        }
        reference
    }

    /// Per-column disagreement between scenario copies.
    pub fn deviations(&self, x: &[f64], reference: &[f64]) -> Vec<f64> {
        let n1 = self.info.num_first_stage;
        match self.settings.deviation {
            DeviationMeasure::Range => (0..n1)
                .map(|j| {
                    let (lo, hi) = (0..self.info.num_scenarios)
                        .map(|s| x[self.info.copy_index(s, j)])
                        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                            (lo.min(v), hi.max(v))
                        });
                    (hi - lo).max(0.0)
                })
                .collect(),
            DeviationMeasure::L2 => (0..n1)
                .map(|j| {
                    let sq: f64 = self
                        .info
                        .probabilities
                        .iter()
                        .enumerate()
                        .map(|(s, &p)| p * (x[self.info.copy_index(s, j)] - reference[j]).powi(2))
                        .sum();
                    if sq > L2_ZERO_TOL {
                        sq.sqrt()
                    } else {
                        0.0
                    }
                })
                .collect(),
        }
    }

    /// Up and down children for the most divergent first-stage column.
    ///
    /// Returns no objects if every column's copies agree within epsilon.
    pub fn choose(&self, view: &BranchingView<'_>) -> DecompResult<Vec<BranchingObject>> {
        let ncopies = self.info.num_scenarios * self.info.num_first_stage;
        let dims = [
            view.solution.len(),
            view.node_lower.len(),
            view.node_upper.len(),
            view.root_lower.len(),
            view.root_upper.len(),
        ];
        if dims.iter().any(|&d| d < ncopies) {
            return Err(DecompError::state(
                StateErrorCode::BranchingIndexOutOfRange,
                format!("branching view shorter than {} first-stage copies", ncopies),
            ));
        }

        let reference = self.reference_solution(view.solution);
        let deviation = self.deviations(view.solution, &reference);

        let first_pass = if self.settings.integer_first { 0 } else { 1 };
        let mut best: Option<usize> = None;
        let mut max_dev = 0.0;
        for pass in first_pass..2 {
            for (j, &dev) in deviation.iter().enumerate() {
                if pass == 0 && !self.integer[j] {
                    continue;
                }
                if dev > self.settings.epsilon.max(max_dev) {
                    max_dev = dev;
                    best = Some(j);
                }
            }
            if best.is_some() {
                break;
            }
        }

        let Some(index) = best else {
            log::debug!("No first-stage column deviates above {:e}", self.settings.epsilon);
            return Ok(Vec::new());
        };

        let value = reference[index];
        let (down_value, up_value) = if self.integer[index] {
            (value.floor(), value.ceil())
        } else {
            (value - self.settings.epsilon_bb, value + self.settings.epsilon_bb)
        };
        log::debug!(
            "Branching on first-stage column {} (reference {:e}, deviation {:e}): <= {:e} | >= {:e}",
            index,
            value,
            max_dev,
            down_value,
            up_value
        );

        let mut up = BranchingObject::new(BranchDirection::Up);
        let mut down = BranchingObject::new(BranchDirection::Down);
        let mut up_ok = true;
        let mut down_ok = true;
        for j in 0..ncopies {
            let (lb, ub) = (view.node_lower[j], view.node_upper[j]);
            if j % self.info.num_first_stage == index {
                let up_lb = up_value.min(ub);
                let down_ub = lb.max(down_value);
                up_ok &= up_value <= ub && up_lb > lb;
                down_ok &= lb <= down_value && down_ub < ub;
                up.push(j, up_lb, ub);
                down.push(j, lb, down_ub);
            } else if lb > view.root_lower[j] || ub < view.root_upper[j] {
                up.push(j, lb, ub);
                down.push(j, lb, ub);
            }
        }

        let mut objects = Vec::with_capacity(2);
        for (mut obj, ok) in [(up, up_ok), (down, down_ok)] {
            if !ok {
                continue;
            }
            obj.best_bound = view.best_bound;
            obj.dual_solution = view.dual_solution.to_vec();
            obj.estimate = max_dev;
            objects.push(obj);
        }
        Ok(objects)
    }
}
