use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use sen2cor_wrapper::Resolution;

#[derive(Parser)]
#[command(name = "sen2cor-wrapper", version, about = "Sen2Cor scene classification wrapper")]
pub struct CliArgs {
    /// Verbose (debug) logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Run sen2cor on one L1C product and georeference its SCL files
    Process {
        /// Input L1C SAFE directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output resolution in metres (10, 20 or 60)
        #[arg(short, long, value_enum, default_value_t = Resolution::R60)]
        resolution: Resolution,

        /// Only run sen2cor, do not write projections
        #[arg(long, default_value_t = false)]
        no_projection: bool,

        #[command(flatten)]
        runner: RunnerArgs,
    },

    /// Process every L1C product in a directory
    Batch {
        /// Directory containing L1C SAFE subdirectories
        #[arg(long)]
        input_dir: PathBuf,

        /// Output resolution in metres (10, 20 or 60)
        #[arg(short, long, value_enum, default_value_t = Resolution::R60)]
        resolution: Resolution,

        /// Keep going when a product fails
        #[arg(long, default_value_t = false)]
        continue_on_error: bool,

        #[command(flatten)]
        runner: RunnerArgs,
    },

    /// Write projection and geotransform from metadata onto existing SCL files
    SetProjection {
        /// L2A SAFE directory produced by sen2cor
        #[arg(long)]
        l2a: PathBuf,

        /// Metadata document: tile XML, product XML or L1C SAFE directory
        #[arg(short, long)]
        metadata: PathBuf,

        /// Output resolution in metres (10, 20 or 60)
        #[arg(short, long, value_enum, default_value_t = Resolution::R60)]
        resolution: Resolution,
    },

    /// Print tile projections and geotransforms as JSON
    Projtrans {
        /// Metadata document: tile XML, product XML or L1C SAFE directory
        #[arg(short, long)]
        metadata: PathBuf,

        /// Tiles to look up (e.g. 32PNA,T32PNB)
        #[arg(short, long, value_delimiter = ',', required = true)]
        tiles: Vec<String>,

        /// Output resolution in metres (10, 20 or 60)
        #[arg(short, long, value_enum, default_value_t = Resolution::R60)]
        resolution: Resolution,
    },
}

/// Options controlling how sen2cor is launched and awaited
#[derive(Args)]
pub struct RunnerArgs {
    /// JSON file with runner parameters (command, sc_only, poll_interval, max_wait)
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Sen2Cor executable (default: L2A_Process)
    #[arg(long)]
    pub sen2cor: Option<String>,

    /// Seconds between two looks for the output files (default: 30)
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Seconds to wait for the output files after sen2cor exits (default: 1800)
    #[arg(long)]
    pub max_wait: Option<u64>,
}
