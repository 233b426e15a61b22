//! Mapping solved variable values back to per-flow time series.
//!
//! This is a pure reshape over already-solved values: no recomputation, no side effects. The
//! variable map's column order matches the order the solver reports values in, so extraction is
//! a single zip.
use crate::error::NetworkError;
use crate::id::NodeID;
use crate::model::VariableMap;
use crate::solver::Solution;
use indexmap::IndexMap;

/// Solved flow trajectories, keyed by `(source, target)` and aligned to the time index.
pub type FlowResults = IndexMap<(NodeID, NodeID), Vec<f64>>;

/// Reshape the solution's values into per-flow time series.
///
/// Fails with [`NetworkError::IncompleteSolution`] if the solution does not provide a value for
/// every `(flow, timestep)` variable. That only happens when extraction is attempted on a
/// non-optimal solution, so callers must check [`Solution::status`] first.
pub fn extract_flows(
    solution: &Solution,
    variables: &VariableMap,
) -> Result<FlowResults, NetworkError> {
    if solution.values.len() != variables.len() {
        return Err(NetworkError::IncompleteSolution {
            expected: variables.len(),
            actual: solution.values.len(),
        });
    }

    let mut results = FlowResults::new();
    for (key, value) in variables.iter_keys().zip(solution.values.iter().copied()) {
        let series = results
            .entry((key.source.clone(), key.target.clone()))
            .or_default();
        debug_assert_eq!(series.len(), key.timestep);
        series.push(value);
    }

    Ok(results)
}
