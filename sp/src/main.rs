mod heatmap;
mod record;
mod simpoints;
mod ui;

use std::io;

use clap::{Parser, Subcommand};
use heatmap::{heatmap, HeatmapArgs};
use record::{record, RecordArgs};
use simpoints::{simpoints, SimpointsArgs};

#[derive(Parser)]
#[command(version, about = "Basic block vector analysis tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Hide progress bars and per-cluster summaries.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the pairwise dissimilarity of all intervals as a PDF heatmap.
    Heatmap(HeatmapArgs),
    /// Cluster intervals and write representative simpoints and their weights.
    Simpoints(SimpointsArgs),
    /// Build a BBV file from a basic block execution trace.
    Record(RecordArgs),
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Heatmap(args) => heatmap(args, cli.quiet),
        Commands::Simpoints(args) => simpoints(args, cli.quiet),
        Commands::Record(args) => record(args),
    }
}
