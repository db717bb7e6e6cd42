use clap::Args;
use icu_alloc::AllocationService;

use super::{fmt_quantity, new_table, RequestArgs};

#[derive(Args)]
pub struct SweepArgs {
    #[command(flatten)]
    request: RequestArgs,

    /// Capacities to evaluate, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    capacities: Vec<f64>,
}

pub async fn run(args: SweepArgs) -> Result<(), anyhow::Error> {
    let request = args.request.to_request()?;
    let problem = request.to_problem()?;
    let service = AllocationService::default();

    let points = service
        .capacity_sweep(problem.groups(), *problem.config(), &args.capacities)
        .await?;

    let mut table = new_table(vec!["Capacity", "Allocated", "Shortage", "Weighted unmet"]);
    for point in &points {
        table.add_row(vec![
            fmt_quantity(point.capacity),
            fmt_quantity(point.total_allocated),
            fmt_quantity(point.total_shortage),
            format!("{:.2}", point.objective_value),
        ]);
    }
    println!("{table}");

    Ok(())
}
