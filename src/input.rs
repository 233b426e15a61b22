//! Code for loading a model directory from disk.
//!
//! A model directory contains `network.toml` (time index plus node and flow declarations),
//! `profiles.csv` (one column per fixed profile, one row per timestep) and an optional
//! `settings.toml` (see [`crate::settings`]).
use crate::error::NetworkError;
use crate::network::{EnergyNetwork, Flow, Node};
use crate::time_index::TimeIndex;
use anyhow::{Context, Result, ensure};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// The file name for the network definition
const NETWORK_FILE_NAME: &str = "network.toml";

/// The file name for the per-timestep profiles
const PROFILES_FILE_NAME: &str = "profiles.csv";

/// The format accepted for the time index start timestamp
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a TOML file into the given type
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read {}", file_path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Could not parse {}", file_path.display()))
}

/// The contents of a `network.toml` file
#[derive(Debug, Deserialize, PartialEq)]
struct NetworkFile {
    /// The time index definition
    time: TimeSection,
    /// Balancing nodes
    #[serde(default)]
    bus: Vec<BusRecord>,
    /// Producing terminal nodes
    #[serde(default)]
    source: Vec<SourceRecord>,
    /// Consuming terminal nodes
    #[serde(default)]
    sink: Vec<SinkRecord>,
    /// Converting nodes
    #[serde(default)]
    transformer: Vec<TransformerRecord>,
}

/// The `[time]` section: hourly timestamps from a start point
#[derive(Debug, Deserialize, PartialEq)]
struct TimeSection {
    /// First timestamp, e.g. "2023-01-01T00:00:00"
    start: String,
    /// Number of hourly timesteps
    periods: usize,
}

/// A `[[bus]]` entry
#[derive(Debug, Deserialize, PartialEq)]
struct BusRecord {
    label: String,
}

/// A `[[source]]` entry
#[derive(Debug, Deserialize, PartialEq)]
struct SourceRecord {
    label: String,
    /// The node the source produces into
    target: String,
    #[serde(default = "default_nominal_value")]
    nominal_value: f64,
    /// Name of the profile column pinning this source's flow, if any
    profile: Option<String>,
    #[serde(default)]
    cost: f64,
}

/// A `[[sink]]` entry
#[derive(Debug, Deserialize, PartialEq)]
struct SinkRecord {
    label: String,
    /// The node the sink consumes from
    source: String,
    #[serde(default = "default_nominal_value")]
    nominal_value: f64,
    /// Constant upper bound on the consumed flow (unbounded if absent)
    max: Option<f64>,
    /// Name of the profile column pinning this sink's flow, if any
    profile: Option<String>,
    #[serde(default)]
    cost: f64,
}

/// A `[[transformer]]` entry
#[derive(Debug, Deserialize, PartialEq)]
struct TransformerRecord {
    label: String,
    /// Labels of the nodes the transformer draws from
    inputs: Vec<String>,
    /// Labels of the nodes the transformer feeds into (the first is the reference)
    outputs: Vec<String>,
    /// Per-neighbour conversion factors (default 1 for missing entries)
    #[serde(default)]
    conversion_factors: IndexMap<String, f64>,
}

fn default_nominal_value() -> f64 {
    1.0
}

/// Per-timestep profiles read from `profiles.csv`, keyed by column name
pub type ProfileMap = IndexMap<String, Vec<f64>>;

/// Read per-timestep profiles from a CSV file with one column per profile.
pub fn read_profiles(file_path: &Path) -> Result<ProfileMap> {
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("Could not read {}", file_path.display()))?;

    let headers = reader.headers()?.clone();
    let mut profiles: ProfileMap = headers
        .iter()
        .map(|name| (name.to_string(), Vec::new()))
        .collect();

    for record in reader.records() {
        let record = record?;
        for (name, value) in headers.iter().zip(record.iter()) {
            let value: f64 = value
                .parse()
                .with_context(|| format!("Invalid value '{value}' in column {name}"))?;
            profiles
                .get_mut(name)
                .expect("Profile columns match headers")
                .push(value);
        }
    }

    ensure!(
        profiles.values().all(|profile| !profile.is_empty()),
        "Profiles file cannot be empty"
    );

    Ok(profiles)
}

/// Look up a profile column and check its length against the time index.
fn get_profile(profiles: &ProfileMap, column: &str, periods: usize) -> Result<Vec<f64>> {
    let profile = profiles
        .get(column)
        .ok_or_else(|| NetworkError::MissingColumn(column.to_string()))?;
    if profile.len() != periods {
        Err(NetworkError::LengthMismatch {
            subject: format!("column {column}"),
            expected: periods,
            actual: profile.len(),
        })?;
    }

    Ok(profile.clone())
}

/// Load the network and time index from the given model directory.
///
/// Profile-length and missing-column checks happen here, so a bad model directory fails before
/// any model is built or solved.
pub fn load_network(model_dir: &Path) -> Result<(EnergyNetwork, TimeIndex)> {
    let file: NetworkFile = read_toml(&model_dir.join(NETWORK_FILE_NAME))?;

    let start = NaiveDateTime::parse_from_str(&file.time.start, TIMESTAMP_FORMAT)
        .with_context(|| format!("Invalid start timestamp '{}'", file.time.start))?;
    let time_index = TimeIndex::hourly(start, file.time.periods)?;

    // Only read the profiles file if some node references a profile column
    let needs_profiles = file.source.iter().any(|s| s.profile.is_some())
        || file.sink.iter().any(|s| s.profile.is_some());
    let profiles = if needs_profiles {
        read_profiles(&model_dir.join(PROFILES_FILE_NAME))?
    } else {
        ProfileMap::new()
    };

    let network = assemble_network(&file, &profiles, time_index.len())?;
    Ok((network, time_index))
}

/// Assemble the network from the parsed records and profiles.
fn assemble_network(
    file: &NetworkFile,
    profiles: &ProfileMap,
    periods: usize,
) -> Result<EnergyNetwork> {
    let mut network = EnergyNetwork::new();

    for bus in &file.bus {
        network.add_node(&bus.label, Node::Bus)?;
    }

    for source in &file.source {
        let mut flow = match &source.profile {
            Some(column) => Flow::fixed(get_profile(profiles, column, periods)?, source.nominal_value),
            None => Flow {
                nominal_value: source.nominal_value,
                ..Flow::default()
            },
        };
        flow.cost = source.cost;
        network.add_node(
            &source.label,
            Node::Source {
                target: source.target.as_str().into(),
                flow,
            },
        )?;
    }

    for sink in &file.sink {
        let mut flow = match (&sink.profile, sink.max) {
            (Some(column), _) => {
                Flow::fixed(get_profile(profiles, column, periods)?, sink.nominal_value)
            }
            (None, Some(max)) => Flow::bounded(vec![max; periods], sink.nominal_value),
            (None, None) => Flow {
                nominal_value: sink.nominal_value,
                ..Flow::default()
            },
        };
        flow.cost = sink.cost;
        network.add_node(
            &sink.label,
            Node::Sink {
                source: sink.source.as_str().into(),
                flow,
            },
        )?;
    }

    for transformer in &file.transformer {
        network.add_node(
            &transformer.label,
            Node::Transformer {
                inputs: transformer
                    .inputs
                    .iter()
                    .map(|label| (label.into(), Flow::new()))
                    .collect(),
                outputs: transformer
                    .outputs
                    .iter()
                    .map(|label| (label.into(), Flow::new()))
                    .collect(),
                conversion_factors: transformer
                    .conversion_factors
                    .iter()
                    .map(|(label, factor)| (label.into(), *factor))
                    .collect(),
            },
        )?;
    }

    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    const NETWORK_TOML: &str = r#"
        [time]
        start = "2023-01-01T00:00:00"
        periods = 3

        [[bus]]
        label = "bel"

        [[source]]
        label = "source_1"
        target = "bel"
        profile = "com_1"

        [[sink]]
        label = "sink_el"
        source = "bel"
    "#;

    /// Create a model directory containing the given files
    fn model_dir(network_toml: &str, profiles_csv: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join(NETWORK_FILE_NAME))
            .unwrap()
            .write_all(network_toml.as_bytes())
            .unwrap();
        if let Some(contents) = profiles_csv {
            File::create(dir.path().join(PROFILES_FILE_NAME))
                .unwrap()
                .write_all(contents.as_bytes())
                .unwrap();
        }

        dir
    }

    #[test]
    fn test_load_network() {
        let dir = model_dir(NETWORK_TOML, Some("com_1,com_2\n1.0,4.0\n2.0,5.0\n3.0,6.0\n"));
        let (network, time_index) = load_network(dir.path()).unwrap();

        assert_eq!(time_index.len(), 3);
        assert_eq!(network.num_nodes(), 3);
        let flow = network
            .get_flow(&"source_1".into(), &"bel".into())
            .unwrap();
        assert_eq!(flow.fix, Some(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_load_network_missing_column() {
        let dir = model_dir(NETWORK_TOML, Some("com_2\n4.0\n5.0\n6.0\n"));
        let err = load_network(dir.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<NetworkError>(),
            Some(&NetworkError::MissingColumn("com_1".to_string()))
        );
    }

    #[test]
    fn test_load_network_length_mismatch() {
        // Two rows of profile data against a three-step time index
        let dir = model_dir(NETWORK_TOML, Some("com_1\n1.0\n2.0\n"));
        let err = load_network(dir.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<NetworkError>(),
            Some(&NetworkError::LengthMismatch {
                subject: "column com_1".to_string(),
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn test_load_network_no_profiles_needed() {
        let toml = r#"
            [time]
            start = "2023-01-01T00:00:00"
            periods = 2

            [[bus]]
            label = "bel"

            [[source]]
            label = "grid"
            target = "bel"

            [[sink]]
            label = "load"
            source = "bel"
            max = 5.0
        "#;
        let dir = model_dir(toml, None);
        let (network, _) = load_network(dir.path()).unwrap();

        let flow = network.get_flow(&"bel".into(), &"load".into()).unwrap();
        assert_eq!(flow.max, Some(vec![5.0, 5.0]));
    }

    #[test]
    fn test_read_profiles_bad_value() {
        let dir = model_dir(NETWORK_TOML, Some("com_1\noops\n"));
        let err = read_profiles(&dir.path().join(PROFILES_FILE_NAME)).unwrap_err();
        assert!(err.to_string().contains("Invalid value 'oops'"));
    }
}
