//! The command line interface for the program.
use crate::input::load_network;
use crate::log;
use crate::lp_file::write_lp_file;
use crate::model::build_model;
use crate::output::{create_output_directory, get_output_dir, write_flows_to_csv};
use crate::results::extract_flows;
use crate::settings::Settings;
use crate::solver::{SolveStatus, solve};
use ::log::{info, warn};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(version, about)]
/// The command line interface for the program.
pub struct Cli {
    #[command(subcommand)]
    /// The available commands.
    pub command: Commands,
}

#[derive(Subcommand)]
/// The available commands.
pub enum Commands {
    /// Build, solve and extract flows for a network model.
    Run {
        #[arg(help = "Path to the model directory")]
        /// Path to the model directory.
        model_dir: PathBuf,
        #[arg(long, help = "Directory for output files")]
        /// Directory for output files (defaults to flowplan_results/<model name>).
        output_dir: Option<PathBuf>,
    },
}

/// Handle the `run` command.
pub fn handle_run_command(model_dir: &Path, output_dir: Option<&Path>) -> Result<()> {
    let settings = Settings::from_path(model_dir)?;
    log::init(settings.log_level.as_deref()).context("Failed to initialise logging.")?;

    let (network, time_index) = load_network(model_dir).context("Failed to load model.")?;
    info!(
        "Loaded network with {} nodes over {} timesteps",
        network.num_nodes(),
        time_index.len()
    );

    let output_dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => get_output_dir(model_dir)?,
    };
    create_output_directory(&output_dir).context("Failed to create output directory.")?;

    let compiled = build_model(&network, &time_index).context("Failed to build model.")?;
    info!(
        "Compiled linear program with {} variables and {} constraints",
        compiled.program.variables.len(),
        compiled.program.constraints.len()
    );

    // The LP file is an audit artifact; failing to write it does not stop the run
    match write_lp_file(&compiled.program, &output_dir) {
        Ok(path) => info!("Linear program written to {}", path.display()),
        Err(err) => warn!("Could not write LP file: {err:#}"),
    }

    let solution = solve(&compiled.program);
    if solution.status != SolveStatus::Optimal {
        bail!("Could not solve model: solver status was {}", solution.status);
    }

    let results = extract_flows(&solution, &compiled.variables)?;
    let file_path = write_flows_to_csv(&output_dir, &results)?;
    info!("Flows written to {}", file_path.display());

    Ok(())
}
