//! Code for compiling an energy network into a linear program.
//!
//! One continuous decision variable is created per `(flow, timestep)` pair; buses and
//! transformers contribute one equality constraint per timestep. The compiled program carries
//! symbolic variable and constraint names so it can be persisted in a human-readable form.
use crate::error::NetworkError;
use crate::id::NodeID;
use crate::network::{EnergyNetwork, Flow, Node};
use crate::time_index::TimeIndex;
use indexmap::IndexMap;

/// The definition of a decision variable in the linear program.
///
/// Fixed flows are pinned by setting `min == max`; this is a hard equality, not a soft target.
#[derive(PartialEq, Clone, Debug)]
pub struct VariableDefinition {
    /// Symbolic name, used when persisting the program
    pub name: String,
    /// The variable's minimum value
    pub min: f64,
    /// The variable's maximum value
    pub max: f64,
    /// The coefficient of the variable in the objective
    pub coefficient: f64,
}

/// A linear constraint of the form `min <= a1*x1 + a2*x2 + ... <= max`.
///
/// All constraints this builder produces are equalities (`min == max`), but the representation
/// permits one-sided rows too.
#[derive(PartialEq, Clone, Debug)]
pub struct Constraint {
    /// Symbolic name, used when persisting the program
    pub name: String,
    /// The minimum value for the constraint
    pub min: f64,
    /// The maximum value for the constraint
    pub max: f64,
    /// Sparse terms as (column index, coefficient) pairs
    pub terms: Vec<(usize, f64)>,
}

/// A compiled linear program: variables, constraints and a minimisation objective.
///
/// A derived, single-use artifact scoped to one solve invocation. Building the same network
/// twice yields equal programs, so solves are reproducible.
#[derive(PartialEq, Clone, Debug, Default)]
pub struct LinearProgram {
    /// The decision variables, in column order
    pub variables: Vec<VariableDefinition>,
    /// The constraints, in row order
    pub constraints: Vec<Constraint>,
}

/// Identifies the `(flow, timestep)` combination a decision variable corresponds to
#[derive(Eq, PartialEq, Hash, Clone, Debug)]
pub struct VariableKey {
    /// Label of the flow's producing node
    pub source: NodeID,
    /// Label of the flow's consuming node
    pub target: NodeID,
    /// Timestep number within the time index
    pub timestep: usize,
}

/// A map for looking up the column index of each `(flow, timestep)` variable.
///
/// The entries are ordered (see [`IndexMap`]): columns appear in the order variables were added,
/// which is also the order the solver reports values in. The result extractor walks this map to
/// label the solved values.
#[derive(Default, PartialEq, Debug)]
pub struct VariableMap(IndexMap<VariableKey, usize>);

impl VariableMap {
    /// Get the column index corresponding to the given parameters
    fn get(&self, source: &NodeID, target: &NodeID, timestep: usize) -> usize {
        let key = VariableKey {
            source: source.clone(),
            target: target.clone(),
            timestep,
        };

        *self
            .0
            .get(&key)
            .expect("No variable found for given params")
    }

    /// The number of variables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the keys in column order
    pub fn iter_keys(&self) -> impl Iterator<Item = &VariableKey> {
        self.0.keys()
    }
}

/// A network compiled against a time index, ready to be handed to the solver
pub struct CompiledModel {
    /// The linear program
    pub program: LinearProgram,
    /// Which `(flow, timestep)` pair each column corresponds to
    pub variables: VariableMap,
}

/// Compile the network and time index into a linear program.
///
/// Fails with [`NetworkError::UnknownNode`] if a flow references a label that was never added,
/// and with [`NetworkError::LengthMismatch`] if a fix or bound profile disagrees with the time
/// index length. Both checks happen here, before any solve attempt.
pub fn build_model(
    network: &EnergyNetwork,
    time_index: &TimeIndex,
) -> Result<CompiledModel, NetworkError> {
    network.validate()?;

    let mut program = LinearProgram::default();
    let variables = add_variables(&mut program, network, time_index)?;
    add_balance_constraints(&mut program, &variables, network, time_index);
    add_conversion_constraints(&mut program, &variables, network, time_index);

    Ok(CompiledModel { program, variables })
}

/// Look up a per-timestep value in an optional profile, checking its length against the index
fn profile_value(
    profile: Option<&Vec<f64>>,
    t: usize,
    n: usize,
    subject: &str,
    default: f64,
) -> Result<f64, NetworkError> {
    let Some(profile) = profile else {
        return Ok(default);
    };
    if profile.len() != n {
        return Err(NetworkError::LengthMismatch {
            subject: subject.to_string(),
            expected: n,
            actual: profile.len(),
        });
    }

    Ok(profile[t])
}

/// Add one bounded variable per `(flow, timestep)` pair.
fn add_variables(
    program: &mut LinearProgram,
    network: &EnergyNetwork,
    time_index: &TimeIndex,
) -> Result<VariableMap, NetworkError> {
    let n = time_index.len();
    let mut variables = VariableMap::default();

    for ((source, target), flow) in network.iter_flows() {
        let subject = format!("flow {source} -> {target}");

        for t in time_index.timesteps() {
            let (min, max) = variable_bounds(flow, t, n, &subject)?;
            let column = program.variables.len();
            program.variables.push(VariableDefinition {
                name: format!("flow__{source}__{target}__t{t}"),
                min,
                max,
                coefficient: flow.cost,
            });

            let key = VariableKey {
                source: source.clone(),
                target: target.clone(),
                timestep: t,
            };
            let existing = variables.0.insert(key, column).is_some();
            assert!(!existing, "Duplicate entry for var");
        }
    }

    Ok(variables)
}

/// The bounds for one flow variable at one timestep.
///
/// A fixed profile pins the variable exactly; otherwise the bound window (defaulting to
/// `[0, +inf)`) is scaled by the flow's nominal value.
fn variable_bounds(
    flow: &Flow,
    t: usize,
    n: usize,
    subject: &str,
) -> Result<(f64, f64), NetworkError> {
    if let Some(fix) = &flow.fix {
        let value = profile_value(Some(fix), t, n, subject, 0.0)? * flow.nominal_value;
        return Ok((value, value));
    }

    let min = profile_value(flow.min.as_ref(), t, n, subject, 0.0)? * flow.nominal_value;
    let max = match &flow.max {
        Some(max) => profile_value(Some(max), t, n, subject, 0.0)? * flow.nominal_value,
        None => f64::INFINITY,
    };

    Ok((min, max))
}

/// Add the per-bus, per-timestep balance equalities: inflows minus outflows equal zero.
///
/// No storage or slack term exists, so a supply/demand mismatch at any timestep makes the whole
/// program infeasible.
fn add_balance_constraints(
    program: &mut LinearProgram,
    variables: &VariableMap,
    network: &EnergyNetwork,
    time_index: &TimeIndex,
) {
    for (label, node) in network.iter_nodes() {
        if *node != Node::Bus {
            continue;
        }

        for t in time_index.timesteps() {
            let mut terms = Vec::new();
            for (source, target) in network.flows_into(label) {
                terms.push((variables.get(source, target, t), 1.0));
            }
            for (source, target) in network.flows_from(label) {
                terms.push((variables.get(source, target, t), -1.0));
            }

            program.constraints.push(Constraint {
                name: format!("balance__{label}__t{t}"),
                min: 0.0,
                max: 0.0,
                terms,
            });
        }
    }
}

/// Add the per-transformer, per-timestep conversion equalities.
///
/// The first declared output is the reference: every input and every additional output must
/// satisfy `x / factor - x_ref / factor_ref == 0`, with a missing factor defaulting to 1. A
/// transformer with no outputs contributes nothing.
fn add_conversion_constraints(
    program: &mut LinearProgram,
    variables: &VariableMap,
    network: &EnergyNetwork,
    time_index: &TimeIndex,
) {
    for (label, node) in network.iter_nodes() {
        let Node::Transformer {
            inputs,
            outputs,
            conversion_factors,
        } = node
        else {
            continue;
        };
        let Some((reference, _)) = outputs.first() else {
            continue;
        };

        let factor =
            |neighbour: &NodeID| conversion_factors.get(neighbour).copied().unwrap_or(1.0);

        for t in time_index.timesteps() {
            let reference_term = (variables.get(label, reference, t), -1.0 / factor(reference));

            for (source, _) in inputs {
                // Enforce (x / factor) - (x_ref / factor_ref) = 0
                let var = variables.get(source, label, t);
                program.constraints.push(Constraint {
                    name: format!("conversion__{label}__{source}__t{t}"),
                    min: 0.0,
                    max: 0.0,
                    terms: vec![(var, 1.0 / factor(source)), reference_term],
                });
            }

            // Any additional outputs are tied to the reference the same way
            for (target, _) in outputs.iter().skip(1) {
                let var = variables.get(label, target, t);
                program.constraints.push(Constraint {
                    name: format!("conversion__{label}__out_{target}__t{t}"),
                    min: 0.0,
                    max: 0.0,
                    terms: vec![(var, 1.0 / factor(target)), reference_term],
                });
            }
        }
    }
}
