//! The main entry point of the program.
use anyhow::Result;
use clap::Parser;
use flowplan::commands::{Cli, Commands, handle_run_command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            model_dir,
            output_dir,
        } => handle_run_command(&model_dir, output_dir.as_deref()),
    }
}
