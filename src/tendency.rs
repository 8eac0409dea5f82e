//! Direction of change between the two newest readings.

use crate::{history::History, Measurement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-way direction signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tendency {
    Up,
    Down,
    Equal,
}

impl Tendency {
    /// Compare the newest reading against the one before it.
    ///
    /// Total over all integer pairs: a falling level is [`Tendency::Down`], a
    /// rising one [`Tendency::Up`], and identical readings [`Tendency::Equal`].
    pub fn classify(newest: Measurement, previous: Measurement) -> Self {
        if previous > newest {
            Tendency::Down
        } else if previous < newest {
            Tendency::Up
        } else {
            Tendency::Equal
        }
    }

    /// Tendency of the two newest readings, or `None` with fewer than two.
    pub fn of_history(history: &History) -> Option<Self> {
        Some(Self::classify(history.newest()?, history.previous()?))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tendency::Up => "up",
            Tendency::Down => "down",
            Tendency::Equal => "equal",
        }
    }
}

impl fmt::Display for Tendency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
