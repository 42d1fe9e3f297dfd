//! Command-line interface for fetching normalised habitat layers.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod elapsed;
mod error;
mod fetch;
mod logging;
mod output;

pub use error::CliError;

use fetch::{FetchArgs, run_fetch};

const ARG_LAYERS: &str = "layers";
const ARG_VRI_SOURCE: &str = "vri-source";
const ARG_BEM_SOURCE: &str = "bem-source";
const ARG_WETLANDS_SOURCE: &str = "wetlands-source";
const ARG_RIVERS_SOURCE: &str = "rivers-source";
const ARG_CCB_SOURCE: &str = "ccb-source";
const ARG_AOI: &str = "aoi";
const ARG_AOI_FILE: &str = "aoi-file";
const ARG_OUTPUT_DIR: &str = "output-dir";
const ARG_CATALOG_URL: &str = "catalog-url";
const ENV_OUTPUT_DIR: &str = "HABITAT_CMDS_FETCH_OUTPUT_DIR";

/// Run the habitat CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    logging::init();
    match cli.command {
        Command::Fetch(args) => run_fetch(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "habitat",
    about = "Fetch and normalise habitat layers for wildlife modelling",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest layers from local datasets or the remote catalog.
    Fetch(FetchArgs),
}

#[cfg(test)]
mod tests;
