//! Window variance and the combined per-tick assessment.
//!
//! "Variance" here is not the statistical one: it is the absolute change between
//! the newest reading and the oldest one still held in the [`History`] window.

use crate::{history::History, tendency::Tendency, Measurement};

/// Absolute difference between two readings. Symmetric in its arguments.
pub fn variance(newest: Measurement, oldest: Measurement) -> u64 {
    oldest.abs_diff(newest)
}

/// Variance across the whole window, or `None` with fewer than two samples.
pub fn window_variance(history: &History) -> Option<u64> {
    Some(variance(history.newest()?, history.oldest()?))
}

/// What the scheduler gets to see each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    /// Not enough readings yet to say anything about the trend.
    Insufficient { samples: usize },
    Ready {
        newest: Measurement,
        tendency: Tendency,
        variance: u64,
    },
}

impl Assessment {
    pub fn is_ready(&self) -> bool {
        matches!(self, Assessment::Ready { .. })
    }
}

/// Derive tendency and variance from the current window.
pub fn assess(history: &History) -> Assessment {
    match (
        history.newest(),
        Tendency::of_history(history),
        window_variance(history),
    ) {
        (Some(newest), Some(tendency), Some(variance)) => Assessment::Ready {
            newest,
            tendency,
            variance,
        },
        _ => Assessment::Insufficient {
            samples: history.len(),
        },
    }
}
