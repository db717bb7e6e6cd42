use clap::{Parser, Subcommand};

use crate::commands::{simulate::SimulateArgs, sites::SitesArgs, sweep::SweepArgs};

mod commands;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate beds across patient groups for one projection
    Simulate {
        #[command(flatten)]
        args: SimulateArgs,
    },
    /// Weighted unmet demand across several capacity levels
    Sweep {
        #[command(flatten)]
        args: SweepArgs,
    },
    /// Observed demand, allocation and shortage per hospital
    Sites {
        #[command(flatten)]
        args: SitesArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Commands::Simulate { args } => commands::simulate::run(args)?,
        Commands::Sweep { args } => commands::sweep::run(args).await?,
        Commands::Sites { args } => commands::sites::run(args)?,
    }

    Ok(())
}
