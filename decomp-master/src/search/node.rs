//! Node-local master state.

use super::BranchingObject;
use crate::model::{MasterStatus, Phase};

/// Snapshot of the restricted master at a search node.
///
/// Holds only what differs between nodes; the LP is rebuilt from the
/// shared column pool on restore.
#[derive(Debug, Clone)]
pub struct NodeState {
    /// Branching object applied at the node.
    pub branching: Option<BranchingObject>,

    /// Per-column active flags of the pool.
    pub active: Vec<bool>,

    /// Phase at capture time.
    pub phase: Phase,

    /// Node lower bounds on original columns.
    pub node_lower: Vec<f64>,

    /// Node upper bounds on original columns.
    pub node_upper: Vec<f64>,

    /// Best dual bound at the node.
    pub best_dual: f64,

    /// Row duals of the best dual bound.
    pub best_dual_solution: Vec<f64>,

    /// Master status at capture time.
    pub status: MasterStatus,
}
