use clap::Parser;
use color_eyre::eyre::{self, WrapErr};
use slice_sweep::cli::Cli;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let level = if cli.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    slice_sweep::run_this(cli).wrap_err("sweep failed")?;
    Ok(())
}
