//! Branching objects and node snapshots for an enclosing search tree.

mod branching;
mod node;

pub use branching::{BranchDirection, BranchingObject, BranchingView, NonantBranching};
pub use node::NodeState;
