use clap::Args;
use icu_alloc::{run_simulation, AllocationResult, AllocationService};
use tracing::info;

use super::{fmt_quantity, new_table, RequestArgs};

#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    request: RequestArgs,

    /// Print the result as JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub fn run(args: SimulateArgs) -> Result<(), anyhow::Error> {
    let request = args.request.to_request()?;
    let service = AllocationService::default();

    let result = run_simulation(&request, &service)?;
    info!(
        solver = service.solver_name(),
        solve_time_ms = result.statistics.solve_time_ms,
        "{}",
        result.message
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.rows())?);
    } else {
        print_result(&result);
    }

    Ok(())
}

fn print_result(result: &AllocationResult) {
    let mut table = new_table(vec!["Group", "Allocated", "Demand", "Unmet"]);
    for row in result.rows() {
        table.add_row(vec![
            row.group.to_string(),
            fmt_quantity(row.allocated),
            fmt_quantity(row.demand),
            fmt_quantity(row.unmet),
        ]);
    }
    println!("{table}");
    println!(
        "Capacity {} ({}), allocated {}, shortage {}, weighted unmet demand {:.2}",
        fmt_quantity(result.capacity),
        result.capacity_policy,
        fmt_quantity(result.total_allocated()),
        fmt_quantity(result.total_shortage()),
        result.objective_value
    );
}
