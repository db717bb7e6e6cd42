// Domain layer: allocation models, derivations and the solver contract
pub mod domain;

// Application layer: simulations, sweeps and site summaries
pub mod application;

// Solver adapters: Concrete implementations of AllocationSolver
pub mod solver;

// Dataset readers and writers
pub mod parsers;

// Re-export commonly used types
pub use domain::{
    derive_group_demand, derive_shortage, AllocationError, AllocationProblem, AllocationResult,
    AllocationRow, AllocationSolver, CapacityPolicy, Group, GroupAllocation, GroupId,
    SolverConfig,
};

pub use application::{optimize, run_simulation, AllocationService, SimulationRequest};

pub use solver::LinearAllocationSolver;
