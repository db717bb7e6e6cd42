// Application layer: use cases built on the domain

pub mod allocation_service;
pub mod simulation;
pub mod sites;

pub use allocation_service::{optimize, AllocationService, SweepPoint};
pub use simulation::{run_simulation, GroupShare, SimulationRequest, MAX_PROJECTED_PATIENTS};
pub use sites::{SiteDataset, SiteFilter, SiteRecord, SiteSummary, UrbanStatusSummary};
