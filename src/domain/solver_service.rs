// Domain service interface for solving allocation problems
// Defines the contract that any solver backend must follow

use super::models::{AllocationProblem, AllocationResult};
use super::value_objects::GroupId;

/// Error types for building and solving allocation problems
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AllocationError {
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid weight {weight} for group '{group}': weights must be positive and finite")]
    InvalidWeight { group: GroupId, weight: f64 },

    #[error("Infeasible problem: {0}")]
    InfeasibleProblem(String),

    #[error("Solver not available: {0}")]
    SolverUnavailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

impl AllocationError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AllocationError>;

/// Domain service interface for allocation solvers
///
/// Implementations must be safe to call from several threads at once and must
/// keep no state between calls: every `solve` builds its own model.
pub trait AllocationSolver: Send + Sync {
    /// Solve an already validated allocation problem
    fn solve(&self, problem: &AllocationProblem) -> Result<AllocationResult>;

    /// Get the name of this solver backend
    fn name(&self) -> &str;
}
