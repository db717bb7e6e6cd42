// Allocation use cases: single solves and concurrent capacity sweeps

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{
    AllocationError, AllocationProblem, AllocationResult, AllocationSolver, Group, Result,
    SolverConfig,
};
use crate::solver::LinearAllocationSolver;

/// Builds a fresh problem, solves it and returns the allocation.
///
/// Inputs are validated before any model is built, so a bad weight or a
/// negative capacity never reaches the solver.
pub fn optimize(groups: Vec<Group>, capacity: f64, config: SolverConfig) -> Result<AllocationResult> {
    let problem = AllocationProblem::new(groups, capacity, config)?;
    LinearAllocationSolver::new().solve(&problem)
}

/// One capacity level of a sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub capacity: f64,
    pub objective_value: f64,
    pub total_allocated: f64,
    pub total_shortage: f64,
}

/// Entry point for surrounding services that dispatch solves concurrently
#[derive(Clone)]
pub struct AllocationService {
    solver: Arc<dyn AllocationSolver>,
}

impl AllocationService {
    pub fn new(solver: Arc<dyn AllocationSolver>) -> Self {
        Self { solver }
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    pub fn solve(&self, problem: &AllocationProblem) -> Result<AllocationResult> {
        info!(
            problem = problem.name(),
            groups = problem.num_groups(),
            capacity = problem.capacity(),
            solver = self.solver.name(),
            "solving allocation problem"
        );
        let result = self.solver.solve(problem)?;
        info!(
            objective = result.objective_value,
            allocated = result.total_allocated(),
            "allocation solved"
        );
        Ok(result)
    }

    /// Runs the solve on tokio's blocking pool.
    pub async fn solve_async(&self, problem: AllocationProblem) -> Result<AllocationResult> {
        let solver = Arc::clone(&self.solver);
        tokio::task::spawn_blocking(move || solver.solve(&problem))
            .await
            .map_err(|e| AllocationError::SolverUnavailable(format!("solver task failed: {e}")))?
    }

    /// Solves the same groups at each capacity concurrently. Points come back
    /// in the order the capacities were given.
    pub async fn capacity_sweep(
        &self,
        groups: &[Group],
        config: SolverConfig,
        capacities: &[f64],
    ) -> Result<Vec<SweepPoint>> {
        let problems = capacities
            .iter()
            .map(|&capacity| {
                AllocationProblem::new(groups.to_vec(), capacity, config)
                    .map(|p| p.with_name(format!("sweep@{capacity}")))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(points = problems.len(), "starting capacity sweep");

        let results = join_all(problems.into_iter().map(|p| self.solve_async(p))).await;

        results
            .into_iter()
            .map(|result| {
                result.map(|r| SweepPoint {
                    capacity: r.capacity,
                    objective_value: r.objective_value,
                    total_allocated: r.total_allocated(),
                    total_shortage: r.total_shortage(),
                })
            })
            .collect()
    }
}

impl Default for AllocationService {
    fn default() -> Self {
        Self::new(Arc::new(LinearAllocationSolver::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CapacityPolicy;
    use float_eq::assert_float_eq;

    fn groups() -> Vec<Group> {
        vec![
            Group::new("moderate", 30.0, 1.0),
            Group::new("severe", 40.0, 2.0),
            Group::new("critical", 30.0, 3.0),
        ]
    }

    /// Always fails, standing in for a backend that cannot be reached
    struct OfflineSolver;

    impl AllocationSolver for OfflineSolver {
        fn solve(&self, _problem: &AllocationProblem) -> Result<AllocationResult> {
            Err(AllocationError::SolverUnavailable("backend offline".into()))
        }

        fn name(&self) -> &str {
            "offline"
        }
    }

    #[test]
    fn optimize_rejects_invalid_weight_before_solving() {
        let mut g = groups();
        g[2].weight = -1.0;
        let err = optimize(g, 100.0, SolverConfig::default()).unwrap_err();
        assert!(matches!(err, AllocationError::InvalidWeight { .. }));
    }

    #[test]
    fn unavailable_solver_is_reported_not_masked() {
        let service = AllocationService::new(Arc::new(OfflineSolver));
        let problem = AllocationProblem::new(groups(), 10.0, SolverConfig::default()).unwrap();
        let err = service.solve(&problem).unwrap_err();
        assert!(matches!(err, AllocationError::SolverUnavailable(_)));
        assert_eq!(service.solver_name(), "offline");
    }

    #[tokio::test]
    async fn solve_async_matches_sync_solve() {
        let service = AllocationService::default();
        let problem = AllocationProblem::new(groups(), 60.0, SolverConfig::default()).unwrap();

        let sync = service.solve(&problem).unwrap();
        let concurrent = service.solve_async(problem).await.unwrap();
        assert_eq!(sync.rows(), concurrent.rows());
    }

    #[tokio::test]
    async fn sweep_keeps_order_and_is_monotone() {
        let service = AllocationService::default();
        let config = SolverConfig::default().with_capacity_policy(CapacityPolicy::CapAtDemand);
        let capacities = [0.0, 25.0, 50.0, 75.0, 100.0, 125.0];

        let points = service
            .capacity_sweep(&groups(), config, &capacities)
            .await
            .unwrap();

        assert_eq!(points.len(), capacities.len());
        for (point, &capacity) in points.iter().zip(&capacities) {
            assert_float_eq!(point.capacity, capacity, abs <= 1e-12);
        }
        for pair in points.windows(2) {
            assert!(pair[1].objective_value <= pair[0].objective_value + 1e-6);
        }
        assert_float_eq!(points[0].total_shortage, 100.0, abs <= 1e-6);
        assert_float_eq!(points[5].total_shortage, 0.0, abs <= 1e-6);
    }

    #[tokio::test]
    async fn sweep_fails_on_negative_capacity() {
        let service = AllocationService::default();
        let err = service
            .capacity_sweep(&groups(), SolverConfig::default(), &[10.0, -5.0])
            .await
            .unwrap_err();
        assert!(matches!(err, AllocationError::InfeasibleProblem(_)));
    }
}
