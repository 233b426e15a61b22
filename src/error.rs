//! The error kinds that the network-to-model pipeline can raise.
//!
//! These are all fatal to the current run. Callers that need to distinguish the kind (e.g. tests,
//! or code deciding whether a failure is a data problem or a caller bug) can match on the variant;
//! everything else can let the error propagate via [`anyhow`].
use std::error::Error;
use std::fmt;

/// An error raised while assembling a network or compiling/extracting a model from it.
///
/// Node labels are carried as plain strings so the error is `Send + Sync` and can travel through
/// [`anyhow::Error`].
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// A node with this label has already been added to the network
    DuplicateLabel(String),
    /// A flow between this pair of nodes has already been declared
    DuplicateFlow(String, String),
    /// A flow references a node label that was never added to the network
    UnknownNode(String),
    /// A per-timestep profile has a different length from the time index
    LengthMismatch {
        /// What the profile belongs to (e.g. a flow or CSV column)
        subject: String,
        /// Length of the time index
        expected: usize,
        /// Length of the offending profile
        actual: usize,
    },
    /// A profile column referenced by a node is missing from the input CSV
    MissingColumn(String),
    /// The solver's variable values do not cover every (flow, timestep) pair
    IncompleteSolution {
        /// Number of variables the model defines
        expected: usize,
        /// Number of values the solution provides
        actual: usize,
    },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NetworkError::DuplicateLabel(label) => {
                write!(f, "A node with label {label} already exists")
            }
            NetworkError::DuplicateFlow(source, target) => {
                write!(f, "A flow from {source} to {target} already exists")
            }
            NetworkError::UnknownNode(label) => {
                write!(f, "Flow references unknown node {label}")
            }
            NetworkError::LengthMismatch {
                subject,
                expected,
                actual,
            } => write!(
                f,
                "Profile for {subject} has length {actual} but the time index has length {expected}"
            ),
            NetworkError::MissingColumn(column) => {
                write!(f, "Column {column} is missing from the profiles file")
            }
            NetworkError::IncompleteSolution { expected, actual } => write!(
                f,
                "Solution provides {actual} values for {expected} variables; \
                 was the solver status checked before extraction?"
            ),
        }
    }
}

impl Error for NetworkError {}
