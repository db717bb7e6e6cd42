// Solver adapters module

pub mod linear_solver;

pub use linear_solver::LinearAllocationSolver;
