use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::deriver::derive_shortage;
use super::solver_service::{AllocationError, Result};
use super::value_objects::{CapacityPolicy, GroupId};

/// A demand group competing for the shared capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    /// Beds the group would consume if unconstrained
    pub demand: f64,
    /// Penalty per unit of unmet demand
    pub weight: f64,
}

impl Group {
    pub fn new(id: impl Into<GroupId>, demand: f64, weight: f64) -> Self {
        Self {
            id: id.into(),
            demand,
            weight,
        }
    }
}

/// Configuration for the solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub capacity_policy: CapacityPolicy,
    /// Relative slack allowed when checking the extracted solution against
    /// the capacity
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            capacity_policy: CapacityPolicy::Uncapped,
            tolerance: 1e-6,
        }
    }
}

impl SolverConfig {
    pub fn with_capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.capacity_policy = policy;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Validated allocation problem. Built fresh per request and read-only after
/// construction.
#[derive(Debug, Clone)]
pub struct AllocationProblem {
    name: String,
    groups: Vec<Group>,
    capacity: f64,
    config: SolverConfig,
}

impl AllocationProblem {
    /// Builds a problem, rejecting it before any model exists if an input is
    /// out of range.
    pub fn new(groups: Vec<Group>, capacity: f64, config: SolverConfig) -> Result<Self> {
        let problem = Self {
            name: String::new(),
            groups,
            capacity,
            config,
        };
        problem.validate()?;
        Ok(problem)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(AllocationError::invalid_input(
                "groups",
                "at least one group is required",
            ));
        }

        let mut seen = HashSet::with_capacity(self.groups.len());
        for group in &self.groups {
            if !seen.insert(&group.id) {
                return Err(AllocationError::invalid_input(
                    format!("groups.{}", group.id),
                    "duplicate group name",
                ));
            }
            if !group.demand.is_finite() || group.demand < 0.0 {
                return Err(AllocationError::invalid_input(
                    format!("groups.{}.demand", group.id),
                    format!("demand must be finite and non-negative, got {}", group.demand),
                ));
            }
            if !group.weight.is_finite() || group.weight <= 0.0 {
                return Err(AllocationError::InvalidWeight {
                    group: group.id.clone(),
                    weight: group.weight,
                });
            }
        }

        if !self.capacity.is_finite() {
            return Err(AllocationError::invalid_input(
                "capacity",
                format!("capacity must be finite, got {}", self.capacity),
            ));
        }
        if self.capacity < 0.0 {
            return Err(AllocationError::InfeasibleProblem(format!(
                "capacity {} is negative, no allocation can satisfy it",
                self.capacity
            )));
        }

        if !self.config.tolerance.is_finite() || self.config.tolerance < 0.0 {
            return Err(AllocationError::invalid_input(
                "tolerance",
                "tolerance must be finite and non-negative",
            ));
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn total_demand(&self) -> f64 {
        self.groups.iter().map(|g| g.demand).sum()
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
}

const OVER_ALLOCATION_SLACK: f64 = 1e-6;

/// Allocation decided for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAllocation {
    pub group: GroupId,
    pub demand: f64,
    pub weight: f64,
    pub allocated: f64,
}

impl GroupAllocation {
    /// `demand − allocated`; negative when the group got more than it asked for
    pub fn unmet(&self) -> f64 {
        self.demand - self.allocated
    }

    /// Unmet demand floored at zero, for display
    pub fn shortage(&self) -> f64 {
        derive_shortage(self.demand, self.allocated)
    }

    /// Allocation beyond demand, ignoring solver noise
    pub fn is_over_allocated(&self) -> bool {
        self.allocated > self.demand + OVER_ALLOCATION_SLACK * self.demand.max(1.0)
    }
}

/// One line of the allocation table handed to the display layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AllocationRow {
    pub group: GroupId,
    pub allocated: f64,
    pub demand: f64,
    pub unmet: f64,
}

/// Solution to an allocation problem
#[derive(Debug, Clone, Serialize)]
pub struct AllocationResult {
    pub allocations: Vec<GroupAllocation>,
    pub capacity: f64,
    pub capacity_policy: CapacityPolicy,
    /// Total weighted unmet demand, `Σ w·(d − x)`
    pub objective_value: f64,
    pub message: String,
    pub statistics: SolverStatistics,
}

impl AllocationResult {
    pub fn new(problem: &AllocationProblem, allocated: Vec<f64>) -> Self {
        let allocations: Vec<GroupAllocation> = problem
            .groups()
            .iter()
            .zip(allocated)
            .map(|(group, allocated)| GroupAllocation {
                group: group.id.clone(),
                demand: group.demand,
                weight: group.weight,
                allocated,
            })
            .collect();

        let objective_value = allocations.iter().map(|a| a.weight * a.unmet()).sum();

        Self {
            allocations,
            capacity: problem.capacity(),
            capacity_policy: problem.config().capacity_policy,
            objective_value,
            message: String::new(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn get(&self, group: &str) -> Option<&GroupAllocation> {
        self.allocations.iter().find(|a| a.group.as_str() == group)
    }

    pub fn total_allocated(&self) -> f64 {
        self.allocations.iter().map(|a| a.allocated).sum()
    }

    pub fn total_demand(&self) -> f64 {
        self.allocations.iter().map(|a| a.demand).sum()
    }

    pub fn total_unmet(&self) -> f64 {
        self.allocations.iter().map(|a| a.unmet()).sum()
    }

    pub fn total_shortage(&self) -> f64 {
        self.allocations.iter().map(|a| a.shortage()).sum()
    }

    /// Groups that received more beds than they need
    pub fn over_allocated(&self) -> Vec<&GroupAllocation> {
        self.allocations
            .iter()
            .filter(|a| a.is_over_allocated())
            .collect()
    }

    pub fn unused_capacity(&self) -> f64 {
        (self.capacity - self.total_allocated()).max(0.0)
    }

    pub fn rows(&self) -> Vec<AllocationRow> {
        self.allocations
            .iter()
            .map(|a| AllocationRow {
                group: a.group.clone(),
                allocated: a.allocated,
                demand: a.demand,
                unmet: a.unmet(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    fn icu_groups() -> Vec<Group> {
        vec![
            Group::new("moderate", 30.0, 1.0),
            Group::new("severe", 40.0, 2.0),
            Group::new("critical", 30.0, 3.0),
        ]
    }

    #[test]
    fn negative_capacity_is_infeasible() {
        let err = AllocationProblem::new(icu_groups(), -5.0, SolverConfig::default()).unwrap_err();
        assert!(matches!(err, AllocationError::InfeasibleProblem(_)));
    }

    #[test]
    fn non_positive_weight_is_rejected_with_group_name() {
        let mut groups = icu_groups();
        groups[2].weight = -1.0;
        let err = AllocationProblem::new(groups, 100.0, SolverConfig::default()).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InvalidWeight {
                group: GroupId::new("critical"),
                weight: -1.0
            }
        );

        for weight in [0.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut groups = icu_groups();
            groups[0].weight = weight;
            let err = AllocationProblem::new(groups, 100.0, SolverConfig::default()).unwrap_err();
            match err {
                AllocationError::InvalidWeight { group, weight: got } => {
                    assert_eq!(group.as_str(), "moderate");
                    assert!((got.is_nan() && weight.is_nan()) || got == weight);
                }
                other => panic!("expected invalid weight for {weight}, got {other:?}"),
            }
        }
    }

    #[test]
    fn bad_demand_and_capacity_are_invalid_input() {
        let mut groups = icu_groups();
        groups[1].demand = -3.0;
        match AllocationProblem::new(groups, 10.0, SolverConfig::default()) {
            Err(AllocationError::InvalidInput { field, .. }) => {
                assert_eq!(field, "groups.severe.demand")
            }
            other => panic!("expected invalid input, got {other:?}"),
        }

        let err =
            AllocationProblem::new(icu_groups(), f64::NAN, SolverConfig::default()).unwrap_err();
        assert!(matches!(err, AllocationError::InvalidInput { .. }));
    }

    #[test]
    fn duplicate_and_empty_group_sets_are_rejected() {
        let groups = vec![Group::new("a", 1.0, 1.0), Group::new("a", 2.0, 1.0)];
        assert!(AllocationProblem::new(groups, 1.0, SolverConfig::default()).is_err());
        assert!(AllocationProblem::new(Vec::new(), 1.0, SolverConfig::default()).is_err());
    }

    #[test]
    fn over_allocation_is_reported_per_group() {
        let problem = AllocationProblem::new(icu_groups(), 50.0, SolverConfig::default()).unwrap();
        let result = AllocationResult::new(&problem, vec![0.0, 0.0, 50.0]);

        let over: Vec<&str> = result
            .over_allocated()
            .iter()
            .map(|a| a.group.as_str())
            .collect();
        assert_eq!(over, ["critical"]);
        assert_float_eq!(result.get("critical").unwrap().unmet(), -20.0, abs <= 1e-12);

        let exact = AllocationResult::new(&problem, vec![0.0, 20.0, 30.0 + 1e-12]);
        assert!(exact.over_allocated().is_empty());
    }

    #[test]
    fn result_derives_unmet_and_objective() {
        let problem = AllocationProblem::new(icu_groups(), 100.0, SolverConfig::default()).unwrap();
        let result = AllocationResult::new(&problem, vec![0.0, 0.0, 100.0]);

        let critical = result.get("critical").unwrap();
        assert_float_eq!(critical.unmet(), -70.0, abs <= 1e-12);
        assert_float_eq!(critical.shortage(), 0.0, abs <= 1e-12);
        // 1*30 + 2*40 + 3*(30-100)
        assert_float_eq!(result.objective_value, -100.0, abs <= 1e-9);
        assert_float_eq!(result.total_allocated(), 100.0, abs <= 1e-12);
        assert_float_eq!(result.total_shortage(), 70.0, abs <= 1e-12);

        let rows = result.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].group.as_str(), "moderate");
        assert_float_eq!(rows[1].unmet, 40.0, abs <= 1e-12);
    }
}
