use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use icu_alloc::{
    application::{SiteDataset, SiteFilter},
    parsers::{export_sites, load_sites},
};
use tracing::info;

use super::{fmt_quantity, new_table};

#[derive(Args)]
pub struct SitesArgs {
    /// Hospital allocation CSV
    #[arg(short, long)]
    input: PathBuf,

    /// Keep only these states, repeatable (default: all)
    #[arg(short, long = "state")]
    states: Vec<String>,

    /// Keep only these urban statuses, repeatable (default: all)
    #[arg(short, long = "urban")]
    urban_statuses: Vec<String>,

    /// Write the filtered rows, with shortage, to this CSV
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Number of rows to show in the site table
    #[arg(short, long, default_value_t = 20)]
    limit: usize,
}

pub fn run(args: SitesArgs) -> Result<(), anyhow::Error> {
    let dataset = load_sites(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    info!(
        rows = dataset.records.len(),
        states = dataset.states().len(),
        "loaded site dataset"
    );

    let filtered = dataset.filter(&SiteFilter {
        states: args.states,
        urban_statuses: args.urban_statuses,
    });

    print_summary(&filtered);
    print_urban_groups(&filtered);
    print_sites(&filtered, args.limit);

    if let Some(path) = args.export {
        export_sites(&path, &filtered).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), rows = filtered.records.len(), "exported filtered sites");
    }

    Ok(())
}

fn print_summary(dataset: &SiteDataset) {
    let summary = dataset.summary();
    let mut table = new_table(vec![
        "Sites",
        "Total ICU Demand",
        "Total ICU Allocated",
        "Total Shortage",
    ]);
    table.add_row(vec![
        format_sites(summary.sites, summary.incomplete_sites),
        format!("{:.0}", summary.total_demand),
        format!("{:.0}", summary.total_allocated),
        format!("{:.0}", summary.total_shortage),
    ]);
    println!("{table}");
}

fn print_urban_groups(dataset: &SiteDataset) {
    let groups = dataset.by_urban_status();
    if groups.is_empty() {
        return;
    }
    let mut table = new_table(vec!["Urban Status", "Demand", "Allocated", "Shortage"]);
    for group in groups {
        table.add_row(vec![
            group.urban_status,
            fmt_quantity(group.demand),
            fmt_quantity(group.allocated),
            fmt_quantity(group.net_shortage),
        ]);
    }
    println!("{table}");
}

fn print_sites(dataset: &SiteDataset, limit: usize) {
    let mut header = vec!["State", "Demand", "Allocated", "Shortage"];
    if dataset.has_urban_status {
        header.push("Urban Status");
    }
    let mut table = new_table(header);
    let rows = dataset.sorted_by_shortage();
    for record in rows.iter().take(limit) {
        let mut cells = vec![
            record.state.clone(),
            fmt_optional(record.observed_demand),
            fmt_optional(record.icu_allocated),
            fmt_optional(record.shortage()),
        ];
        if dataset.has_urban_status {
            cells.push(record.urban_status.clone().unwrap_or_default());
        }
        table.add_row(cells);
    }
    println!("{table}");
    if rows.len() > limit {
        println!("... {} more sites", rows.len() - limit);
    }
}

fn format_sites(sites: usize, incomplete: usize) -> String {
    if incomplete == 0 {
        sites.to_string()
    } else {
        format!("{sites} ({incomplete} incomplete)")
    }
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), fmt_quantity)
}
