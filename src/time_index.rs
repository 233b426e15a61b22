//! Code for working with the model's time index.
//!
//! The time index is the ordered sequence of timestamps the model covers. Every per-timestep
//! profile and every decision variable is aligned to it.
use anyhow::{Result, ensure};
use chrono::{NaiveDateTime, TimeDelta};
use std::ops::Range;

/// An ordered, strictly increasing sequence of timestamps defining the model horizon.
///
/// Immutable once constructed.
#[derive(PartialEq, Clone, Debug)]
pub struct TimeIndex(Vec<NaiveDateTime>);

impl TimeIndex {
    /// Create a time index from an explicit list of timestamps.
    ///
    /// The list must be non-empty and strictly increasing.
    pub fn new(timestamps: Vec<NaiveDateTime>) -> Result<Self> {
        ensure!(!timestamps.is_empty(), "Time index cannot be empty");
        ensure!(
            timestamps.windows(2).all(|pair| pair[0] < pair[1]),
            "Timestamps must be strictly increasing"
        );

        Ok(Self(timestamps))
    }

    /// Create a time index of `periods` hourly timestamps starting at `start`.
    pub fn hourly(start: NaiveDateTime, periods: usize) -> Result<Self> {
        ensure!(periods > 0, "Time index cannot be empty");

        let timestamps = (0..periods)
            .map(|i| start + TimeDelta::hours(i as i64))
            .collect();
        Ok(Self(timestamps))
    }

    /// The number of timesteps
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the time index is empty (never true for a constructed index)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The range of timestep numbers, for iterating alongside profiles
    pub fn timesteps(&self) -> Range<usize> {
        0..self.0.len()
    }

    /// Iterate over the timestamps in order
    pub fn iter(&self) -> impl Iterator<Item = &NaiveDateTime> {
        self.0.iter()
    }
}
