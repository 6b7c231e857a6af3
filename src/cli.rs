use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "slicesweep",
    version = "0.1",
    author = "Y. Wu, B. Reber, M. Gould",
    about = "Cache/TLB slice partitioning sweeps for RSIM and CACTI"
)]
pub struct Cli {
    /// Path to the yaml sweep configuration
    #[arg(short = 'c', long = "config", global = true)]
    pub config_path: Option<PathBuf>,

    /// Print out all debugging messages
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every partition of the slice budget with its derived sizes
    Enumerate,

    /// Write one RSIM configuration per partition
    Configs {
        /// Output directory, overrides the configured one
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,
    },

    /// Collect CACTI power and area estimates for every partitioned component
    Power {
        /// Regenerate the power table even though it already exists
        #[arg(short = 'r', long)]
        rerun: bool,

        /// Power table location, overrides the configured one
        #[arg(short = 't', long)]
        table: Option<PathBuf>,
    },

    /// Parse and print a CACTI output file
    CactiOutput {
        /// Path to the CACTI .out file
        #[arg(default_value = "cache.cfg.out")]
        path: PathBuf,
    },

    /// List the run folders of a TLB scaling sweep
    Scaling {
        /// Benchmark prefix of the folder names
        #[arg(short = 'p', long)]
        prefix: String,

        /// TLB level whose size is scaled (1 or 2), may be repeated
        #[arg(short = 'l', long = "level", required = true)]
        levels: Vec<crate::scaling::TlbLevel>,
    },

    /// List the statistics files of run directories
    Stats {
        /// Run directories
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },
}
