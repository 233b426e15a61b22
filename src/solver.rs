//! The adapter around the HiGHS solver.
//!
//! The rest of the pipeline only depends on the `solve` contract: hand over a linear program, get
//! back a status and (on success) one value per variable column. Solver internals, including
//! timeouts, stay behind this boundary; a timeout surfaces as [`SolveStatus::Error`].
use crate::model::LinearProgram;
use highs::{HighsModelStatus, RowProblem, Sense};
use log::debug;
use std::fmt;

/// Outcome classification of a solve attempt
#[derive(PartialEq, Clone, Debug)]
pub enum SolveStatus {
    /// An optimal (here: feasible) assignment was found
    Optimal,
    /// The constraints cannot be satisfied simultaneously
    Infeasible,
    /// The objective can be improved without bound
    Unbounded,
    /// Any other solver outcome, with the raw status for diagnostics
    Error(String),
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unbounded => write!(f, "unbounded"),
            SolveStatus::Error(detail) => write!(f, "error ({detail})"),
        }
    }
}

/// The outcome of a solve: a status plus, on success, one value per variable column.
///
/// Callers must check `status` before using `values`; on a non-optimal status `values` is empty.
#[derive(PartialEq, Clone, Debug)]
pub struct Solution {
    /// The outcome classification
    pub status: SolveStatus,
    /// The resolved variable values, in column order (empty unless optimal)
    pub values: Vec<f64>,
}

/// Solve the given linear program with HiGHS, minimising the objective.
pub fn solve(program: &LinearProgram) -> Solution {
    let mut problem = RowProblem::default();

    let mut columns = Vec::with_capacity(program.variables.len());
    for var in &program.variables {
        columns.push(problem.add_column(var.coefficient, var.min..=var.max));
    }

    for constraint in &program.constraints {
        let terms = constraint
            .terms
            .iter()
            .map(|&(column, coeff)| (columns[column], coeff));
        problem.add_row(constraint.min..=constraint.max, terms);
    }

    let solved = problem.optimise(Sense::Minimise).solve();
    let status = solved.status();
    debug!("HiGHS returned status {status:?}");

    match status {
        HighsModelStatus::Optimal => Solution {
            status: SolveStatus::Optimal,
            values: solved.get_solution().columns().to_vec(),
        },
        HighsModelStatus::Infeasible => Solution {
            status: SolveStatus::Infeasible,
            values: Vec::new(),
        },
        HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => Solution {
            status: SolveStatus::Unbounded,
            values: Vec::new(),
        },
        other => Solution {
            status: SolveStatus::Error(format!("{other:?}")),
            values: Vec::new(),
        },
    }
}
