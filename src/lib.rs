//! Common functionality for flowplan.
#![warn(missing_docs)]
pub mod commands;
pub mod error;
pub mod id;
pub mod input;
pub mod log;
pub mod lp_file;
pub mod model;
pub mod network;
pub mod output;
pub mod results;
pub mod settings;
pub mod solver;
pub mod time_index;

#[cfg(test)]
mod fixture;
