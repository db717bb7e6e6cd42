use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use icu_alloc::{application::GroupShare, CapacityPolicy, SimulationRequest};

pub mod simulate;
pub mod sites;
pub mod sweep;

/// Inputs shared by `simulate` and `sweep`
#[derive(Args)]
pub struct RequestArgs {
    /// JSON file holding a simulation request; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Projected total patients
    #[arg(short, long)]
    patients: Option<u32>,

    /// Beds available (defaults to the projected patients)
    #[arg(long)]
    capacity: Option<f64>,

    /// Group as name:percentage:weight, repeatable
    #[arg(short, long = "group", value_parser = parse_group_share)]
    groups: Vec<GroupShare>,

    /// Never allocate a group more than its own demand
    #[arg(long)]
    cap_at_demand: bool,
}

impl RequestArgs {
    pub fn to_request(&self) -> Result<SimulationRequest, anyhow::Error> {
        let mut request = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                SimulationRequest::from_json(&json)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => SimulationRequest::default(),
        };

        if let Some(patients) = self.patients {
            request.projected_patients = patients;
        }
        if self.capacity.is_some() {
            request.capacity = self.capacity;
        }
        if !self.groups.is_empty() {
            request.groups = self.groups.clone();
        }
        if self.cap_at_demand {
            request.capacity_policy = CapacityPolicy::CapAtDemand;
        }
        Ok(request)
    }
}

pub fn parse_group_share(input: &str) -> Result<GroupShare, String> {
    let parts: Vec<&str> = input.split(':').collect();
    let [name, percentage, weight] = parts.as_slice() else {
        return Err(String::from("expected name:percentage:weight"));
    };
    if name.is_empty() {
        return Err(String::from("group name is empty"));
    }
    let percentage = percentage
        .parse::<f64>()
        .map_err(|_| format!("invalid percentage '{percentage}'"))?;
    let weight = weight
        .parse::<f64>()
        .map_err(|_| format!("invalid weight '{weight}'"))?;
    Ok(GroupShare::new(*name, percentage, weight))
}

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn fmt_quantity(value: f64) -> String {
    format!("{value:.1}")
}
