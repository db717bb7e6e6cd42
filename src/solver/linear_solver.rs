// Linear solver adapter
// Translates allocation problems into a good_lp model and back

use crate::domain::{
    models::{AllocationProblem, AllocationResult, SolverStatistics},
    solver_service::{AllocationError, AllocationSolver, Result},
    value_objects::CapacityPolicy,
};
use good_lp::{
    default_solver, variable, variables, Expression, ResolutionError, Solution, SolverModel,
    Variable,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Allocation solver backed by good_lp's pure-Rust simplex (microlp).
///
/// Holds no state: every call builds, solves and drops its own model, so one
/// instance can serve concurrent requests.
pub struct LinearAllocationSolver;

impl LinearAllocationSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinearAllocationSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationSolver for LinearAllocationSolver {
    fn solve(&self, problem: &AllocationProblem) -> Result<AllocationResult> {
        let start_time = Instant::now();
        let groups = problem.groups();
        let policy = problem.config().capacity_policy;

        // One non-negative variable per group, optionally bounded by demand
        let mut vars = variables!();
        let mut lp_variables: Vec<Variable> = Vec::with_capacity(groups.len());
        for group in groups {
            let definition = match policy {
                CapacityPolicy::Uncapped => variable().min(0.0),
                CapacityPolicy::CapAtDemand => variable().min(0.0).max(group.demand),
            };
            lp_variables.push(vars.add(definition));
        }

        // Σ w·(d − x) = Σ w·d − Σ w·x; the constant does not move the optimum
        let mut objective: Expression = 0.into();
        let mut used: Expression = 0.into();
        for (group, &var) in groups.iter().zip(&lp_variables) {
            objective += -group.weight * var;
            used += var;
        }

        // The capacity row is what keeps the model bounded
        let model = vars
            .minimise(objective)
            .using(default_solver)
            .with(used.leq(problem.capacity()));

        tracing::debug!(
            problem = problem.name(),
            groups = groups.len(),
            capacity = problem.capacity(),
            %policy,
            "solving allocation model"
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(move || model.solve()));
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;

        let statistics = SolverStatistics {
            solve_time_ms: solve_time,
            num_variables: lp_variables.len() as u32,
            num_constraints: 1,
        };

        let solution = match outcome {
            Ok(Ok(solution)) => solution,
            Ok(Err(ResolutionError::Infeasible)) => {
                return Err(AllocationError::InfeasibleProblem(
                    "no allocation satisfies the capacity constraint".to_string(),
                ))
            }
            Ok(Err(ResolutionError::Unbounded)) => {
                return Err(AllocationError::ExecutionFailed(
                    "solver reported an unbounded model despite the capacity row".to_string(),
                ))
            }
            Ok(Err(e)) => return Err(AllocationError::SolverUnavailable(format!("{:?}", e))),
            Err(payload) => {
                return Err(AllocationError::SolverUnavailable(format!(
                    "solver panicked: {}",
                    panic_message(payload.as_ref())
                )))
            }
        };

        // Round-off can leave values like -1e-12; clamp them to the bound
        let allocated: Vec<f64> = lp_variables
            .iter()
            .map(|&var| solution.value(var).max(0.0))
            .collect();

        let slack = problem.config().tolerance * problem.capacity().max(1.0);
        let total: f64 = allocated.iter().sum();
        if total > problem.capacity() + slack {
            return Err(AllocationError::ExecutionFailed(format!(
                "solver allocated {} but capacity is {}",
                total,
                problem.capacity()
            )));
        }

        tracing::debug!(solve_time_ms = solve_time, total_allocated = total, "solved");

        Ok(AllocationResult::new(problem, allocated)
            .with_statistics(statistics)
            .with_message(format!("Optimal allocation found for '{}'", problem.name())))
    }

    fn name(&self) -> &str {
        "good_lp (microlp)"
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
