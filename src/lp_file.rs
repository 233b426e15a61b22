//! Persisting compiled linear programs in CPLEX LP text format.
//!
//! The file carries the symbolic variable and constraint names assigned by the model builder, so
//! a persisted program can be audited (or fed back to a solver) by hand. One file is written per
//! invocation, named by timestamp; the pipeline never reads it back.
use crate::model::{Constraint, LinearProgram, VariableDefinition};
use anyhow::{Context, Result};
use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write the program to a timestamped `.lp` file in `dir`, returning the file's path.
///
/// Callers treat a failure here as non-fatal: the run command logs a warning and continues.
pub fn write_lp_file(program: &LinearProgram, dir: &Path) -> Result<PathBuf> {
    let file_name = Local::now().format("%Y-%m-%dT%H-%M-%S.lp").to_string();
    let path = dir.join(file_name);
    let file = File::create(&path)
        .with_context(|| format!("Could not create LP file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_lp(program, &mut writer)?;
    writer.flush()?;

    Ok(path)
}

/// Serialise the program in CPLEX LP format to the given writer.
pub fn write_lp(program: &LinearProgram, writer: &mut impl Write) -> Result<()> {
    writeln!(writer, "\\ Generated by flowplan")?;

    writeln!(writer, "Minimize")?;
    write_objective(program, writer)?;

    writeln!(writer, "Subject To")?;
    for constraint in &program.constraints {
        write_constraint(constraint, &program.variables, writer)?;
    }

    writeln!(writer, "Bounds")?;
    for var in &program.variables {
        write_bounds(var, writer)?;
    }

    writeln!(writer, "End")?;
    Ok(())
}

/// Format a linear expression from sparse (column, coefficient) terms
fn format_terms(terms: &[(usize, f64)], variables: &[VariableDefinition]) -> String {
    let mut out = String::new();
    for (i, &(column, coeff)) in terms.iter().enumerate() {
        let name = &variables[column].name;
        if i == 0 {
            if coeff < 0.0 {
                out.push_str(&format!("- {} {name}", -coeff));
            } else {
                out.push_str(&format!("{coeff} {name}"));
            }
        } else if coeff < 0.0 {
            out.push_str(&format!(" - {} {name}", -coeff));
        } else {
            out.push_str(&format!(" + {coeff} {name}"));
        }
    }

    out
}

/// Write the objective row.
///
/// Zero coefficients are omitted; a pure feasibility program gets a single zero term so the
/// section is never empty (some parsers reject a bare label).
fn write_objective(program: &LinearProgram, writer: &mut impl Write) -> Result<()> {
    let terms: Vec<_> = program
        .variables
        .iter()
        .enumerate()
        .filter(|(_, var)| var.coefficient != 0.0)
        .map(|(column, var)| (column, var.coefficient))
        .collect();

    let expression = if terms.is_empty() {
        match program.variables.first() {
            Some(var) => format!("0 {}", var.name),
            None => String::new(),
        }
    } else {
        format_terms(&terms, &program.variables)
    };
    writeln!(writer, " obj: {expression}")?;

    Ok(())
}

/// Write one constraint row (two rows for a ranged constraint).
fn write_constraint(
    constraint: &Constraint,
    variables: &[VariableDefinition],
    writer: &mut impl Write,
) -> Result<()> {
    let expression = format_terms(&constraint.terms, variables);
    let name = &constraint.name;

    if constraint.min == constraint.max {
        writeln!(writer, " {name}: {expression} = {}", constraint.max)?;
    } else {
        // One row per finite side
        if constraint.min.is_finite() {
            writeln!(writer, " {name}__lo: {expression} >= {}", constraint.min)?;
        }
        if constraint.max.is_finite() {
            writeln!(writer, " {name}__up: {expression} <= {}", constraint.max)?;
        }
    }

    Ok(())
}

/// Write the bounds line for one variable.
fn write_bounds(var: &VariableDefinition, writer: &mut impl Write) -> Result<()> {
    let name = &var.name;
    if var.min == var.max {
        writeln!(writer, " {name} = {}", var.max)?;
    } else if var.min.is_infinite() && var.max.is_infinite() {
        writeln!(writer, " {name} free")?;
    } else if var.max.is_infinite() {
        writeln!(writer, " {name} >= {}", var.min)?;
    } else {
        writeln!(writer, " {} <= {name} <= {}", var.min, var.max)?;
    }

    Ok(())
}
