//! The module responsible for writing output data to disk.
use crate::id::NodeID;
use crate::results::FlowResults;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "flowplan_results";

/// The output file name for solved flows
const FLOWS_FILE_NAME: &str = "flows.csv";

/// Get the default output directory for the model at the specified path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create the output directory (and parents) if it does not already exist
pub fn create_output_directory(output_dir: &Path) -> Result<()> {
    if output_dir.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(output_dir)?;

    Ok(())
}

/// Represents a row of the flows output CSV file
#[derive(Serialize, Debug, PartialEq)]
struct FlowRow<'a> {
    source: &'a NodeID,
    target: &'a NodeID,
    timestep: usize,
    value: f64,
}

/// Write the solved flows to `flows.csv` in the output directory, returning the file's path.
pub fn write_flows_to_csv(output_dir: &Path, results: &FlowResults) -> Result<PathBuf> {
    let file_path = output_dir.join(FLOWS_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;

    for ((source, target), series) in results {
        for (timestep, value) in series.iter().enumerate() {
            writer.serialize(FlowRow {
                source,
                target,
                timestep,
                value: *value,
            })?;
        }
    }
    writer.flush()?;

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_flows_to_csv() {
        let mut results = FlowResults::new();
        results.insert(("source_1".into(), "com_1".into()), vec![1.0, 2.5]);
        results.insert(("bel".into(), "sink_el".into()), vec![0.1, 0.2]);

        let dir = TempDir::new().unwrap();
        let file_path = write_flows_to_csv(dir.path(), &results).unwrap();

        let contents = fs::read_to_string(file_path).unwrap();
        assert_eq!(
            contents,
            "source,target,timestep,value\n\
             source_1,com_1,0,1.0\n\
             source_1,com_1,1,2.5\n\
             bel,sink_el,0,0.1\n\
             bel,sink_el,1,0.2\n"
        );
    }

    #[test]
    fn test_create_output_directory() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().join("a").join("b");
        create_output_directory(&output_dir).unwrap();
        assert!(output_dir.is_dir());

        // Idempotent
        create_output_directory(&output_dir).unwrap();
    }
}
