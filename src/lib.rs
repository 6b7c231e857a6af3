use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::partition::SweepConfig;
use std::path::Path;

/// Running CACTI and reading back its output table
pub mod cacti;
pub mod cli;
/// Yaml sweep configuration
pub mod config;
pub mod error;
/// Core partition enumeration and derived sizes
pub mod partition;
pub mod power;
/// RSIM configuration files
pub mod rsim;
pub mod scaling;
pub mod stats;
/// Power of two capacity normalization
pub mod utils;

pub use error::Error;

pub fn load_config(cli: &Cli) -> Result<Config, Error> {
    match cli.config_path {
        Some(ref path) => {
            log::info!("config path: {}", path.display());
            Config::load(path)
        }
        None => Ok(Config::default()),
    }
}

pub fn run_this(cli: Cli) -> Result<(), Error> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Enumerate => run_enumerate(&config.sweep),
        Command::Configs { ref output_dir } => {
            let output_dir = output_dir.as_deref().unwrap_or(config.rsim_dir.as_path());
            run_configs(&config.sweep, output_dir)
        }
        Command::Power { rerun, ref table } => {
            let table = table.as_deref().unwrap_or(config.power_table.as_path());
            run_power(&config, table, rerun)
        }
        Command::CactiOutput { ref path } => run_cacti_output(path),
        Command::Scaling {
            ref prefix,
            ref levels,
        } => run_scaling(prefix, levels),
        Command::Stats { ref dirs } => run_stats(dirs),
    }
}

pub fn run_enumerate(sweep: &SweepConfig) -> Result<(), Error> {
    println!(
        "{:<3} {:<24} {:>10} {:>10} {:>10}",
        "#", "subexperiment", "stlb", "l2 KB", "l3 KB"
    );
    for (i, subex) in sweep.enumerate_partitions().iter().enumerate() {
        println!(
            "{:<3} {:<24} {:>10} {:>10} {:>10}",
            i,
            subex.canonical_suffix(),
            subex.l2_tlb_entry_count(sweep)?,
            utils::kilobytes(subex.l2_cache_byte_capacity(sweep)?),
            utils::kilobytes(subex.l3_cache_byte_capacity(sweep)?),
        );
    }
    Ok(())
}

pub fn run_configs(sweep: &SweepConfig, output_dir: &Path) -> Result<(), Error> {
    let written = rsim::write_configurations(sweep, output_dir)?;
    println!("wrote {} configurations to {}", written.len(), output_dir.display());
    Ok(())
}

pub fn run_power(config: &Config, table: &Path, rerun: bool) -> Result<(), Error> {
    let mut runner = config.cacti.clone();
    let power = power::sweep_power(&config.sweep, &config.cacti, table, rerun, &mut runner)?;
    power.display();
    println!("{}", "-".repeat(70));
    Ok(())
}

pub fn run_cacti_output(path: &Path) -> Result<(), Error> {
    let output = cacti::CactiOutput::from_path(path)?;
    for (column, value) in output.data() {
        println!("{column}: {value}");
    }
    Ok(())
}

pub fn run_scaling(prefix: &str, levels: &[scaling::TlbLevel]) -> Result<(), Error> {
    for name in scaling::folder_names(prefix, levels)? {
        println!("{name}");
    }
    Ok(())
}

pub fn run_stats(dirs: &[std::path::PathBuf]) -> Result<(), Error> {
    let files_per_dir = stats::stat_files_per_dir(dirs)?;
    for (dir, files) in dirs.iter().zip(&files_per_dir) {
        println!("{}: {} stats files", dir.display(), files.len());
        for file in files {
            println!("    {}", file.display());
        }
    }
    if let Some(end) = stats::end_file_number_of(&files_per_dir) {
        println!("end file number: {end}");
    }
    Ok(())
}
