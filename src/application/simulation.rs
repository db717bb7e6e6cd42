// Simulation requests: user-level inputs turned into allocation problems

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{
    derive_group_demand, percentage_total, AllocationError, AllocationProblem, AllocationResult,
    CapacityPolicy, Group, GroupId, Result, SolverConfig,
};

use super::allocation_service::AllocationService;

/// Upper bound accepted for the projected patient count
pub const MAX_PROJECTED_PATIENTS: u32 = 100_000;

/// Share of the projected patients that falls into one group, with its priority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupShare {
    pub name: GroupId,
    /// Percent of projected patients, 0 to 100
    pub percentage: f64,
    pub weight: f64,
}

impl GroupShare {
    pub fn new(name: impl Into<GroupId>, percentage: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            percentage,
            weight,
        }
    }
}

/// A "run simulation" request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub projected_patients: u32,
    /// Beds available; the projected patient count when absent
    #[serde(default)]
    pub capacity: Option<f64>,
    pub groups: Vec<GroupShare>,
    #[serde(default)]
    pub capacity_policy: CapacityPolicy,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            projected_patients: 100,
            capacity: None,
            groups: vec![
                GroupShare::new("moderate", 50.0, 1.0),
                GroupShare::new("severe", 30.0, 2.0),
                GroupShare::new("critical", 20.0, 3.0),
            ],
            capacity_policy: CapacityPolicy::Uncapped,
        }
    }
}

impl SimulationRequest {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn effective_capacity(&self) -> f64 {
        self.capacity.unwrap_or(self.projected_patients as f64)
    }

    pub fn percentages(&self) -> Vec<(GroupId, f64)> {
        self.groups
            .iter()
            .map(|g| (g.name.clone(), g.percentage))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.projected_patients > MAX_PROJECTED_PATIENTS {
            return Err(AllocationError::invalid_input(
                "projected_patients",
                format!(
                    "must be at most {MAX_PROJECTED_PATIENTS}, got {}",
                    self.projected_patients
                ),
            ));
        }
        for share in &self.groups {
            if !(0.0..=100.0).contains(&share.percentage) {
                return Err(AllocationError::invalid_input(
                    format!("groups.{}.percentage", share.name),
                    format!("must be within [0, 100], got {}", share.percentage),
                ));
            }
        }
        Ok(())
    }

    /// Derives per-group demand and builds the allocation problem.
    pub fn to_problem(&self) -> Result<AllocationProblem> {
        self.validate()?;

        let demand = derive_group_demand(self.projected_patients as f64, &self.percentages());
        let groups = demand
            .into_iter()
            .zip(&self.groups)
            .map(|((id, demand), share)| Group::new(id, demand, share.weight))
            .collect();

        let config = SolverConfig::default().with_capacity_policy(self.capacity_policy);
        Ok(
            AllocationProblem::new(groups, self.effective_capacity(), config)?
                .with_name("icu-simulation"),
        )
    }
}

/// Runs one simulation end to end.
pub fn run_simulation(
    request: &SimulationRequest,
    service: &AllocationService,
) -> Result<AllocationResult> {
    let split = percentage_total(&request.percentages());
    if (split - 100.0).abs() > 1e-9 {
        warn!(
            total = split,
            "group percentages do not sum to 100, total demand differs from projected patients"
        );
    }

    let problem = request.to_problem()?;
    info!(
        patients = request.projected_patients,
        capacity = problem.capacity(),
        policy = %request.capacity_policy,
        "running simulation"
    );
    let result = service.solve(&problem)?;

    for allocation in result.over_allocated() {
        warn!(
            group = %allocation.group,
            allocated = allocation.allocated,
            demand = allocation.demand,
            "group allocated beyond its demand; use cap-at-demand to bound each group"
        );
    }
    Ok(result)
}
