//! CLI for calonoise: look up, inject and filter calorimeter cell noise.

mod commands;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "calonoise")]
#[command(about = "calonoise: electronic and pileup noise for calorimeter cells")]
#[command(version = calonoise_core::VERSION)]
struct Cli {
    #[command(flatten)]
    tool: ToolArgs,

    /// Print per-cell diagnostics (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that needs a configured noise tool.
#[derive(Args)]
pub struct ToolArgs {
    /// Configuration JSON (defaults are used for anything it leaves out)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Noise curve file (.json or .json.gz), overrides the configuration
    #[arg(long, global = true)]
    noise_file: Option<String>,

    /// Number of radial layers to load noise curves for
    #[arg(long, global = true)]
    layers: Option<usize>,

    /// Electronic noise only, ignore pileup curves
    #[arg(long, global = true)]
    no_pileup: bool,

    /// Filter threshold in units of sigma (<= 0 disables filtering)
    #[arg(long, global = true, allow_negative_numbers = true)]
    threshold: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the loaded noise table and readout
    Inspect,

    /// Noise breakdown (eta, layer, bin, electronic, pileup, total) per cell
    Estimate {
        /// Cells JSON: [{"cell_id": u64, "energy": f64}, ...]
        #[arg(long, conflicts_with = "ids")]
        cells: Option<String>,

        /// Comma-separated cell ids (decimal or 0x-prefixed hex)
        #[arg(long)]
        ids: Option<String>,

        /// Write JSON to path instead of stdout
        #[arg(long)]
        output: Option<String>,
    },

    /// Add Gaussian noise (sigma from the noise table) to every cell energy
    Inject {
        /// Cells JSON: [{"cell_id": u64, "energy": f64}, ...]
        #[arg(long)]
        cells: String,

        /// Seed for reproducible noise (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Write JSON to path instead of stdout
        #[arg(long)]
        output: Option<String>,

        /// Also drop cells below the filter threshold after injection
        #[arg(long)]
        filter: bool,
    },

    /// Drop cells whose energy is below threshold * sigma
    Filter {
        /// Cells JSON: [{"cell_id": u64, "energy": f64}, ...]
        #[arg(long)]
        cells: String,

        /// Write JSON to path instead of stdout
        #[arg(long)]
        output: Option<String>,
    },

    /// Attach 3D positions to cells using the configured position provider
    Positions {
        /// Cells JSON: [{"cell_id": u64, "energy": f64}, ...]
        #[arg(long)]
        cells: String,

        /// Write JSON to path instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Inspect => commands::inspect::run(&cli.tool),
        Commands::Estimate { cells, ids, output } => commands::estimate::run(
            &cli.tool,
            cells.as_deref(),
            ids.as_deref(),
            output.as_deref(),
        ),
        Commands::Inject {
            cells,
            seed,
            output,
            filter,
        } => commands::inject::run(&cli.tool, &cells, seed, output.as_deref(), filter),
        Commands::Filter { cells, output } => {
            commands::filter::run(&cli.tool, &cells, output.as_deref())
        }
        Commands::Positions { cells, output } => {
            commands::positions::run(&cli.tool, &cells, output.as_deref())
        }
    }
}
