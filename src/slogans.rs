//! # Slogan Pools
//!
//! Human-written one-liners that get prefixed to posts. Each tendency has its own
//! pool file: plain UTF-8, one slogan per line. Blank lines (including the one a
//! trailing newline leaves behind) are never picked.
//!
//! Pool files are re-read on every request so they can be edited while the
//! tracker is running.

use crate::tendency::Tendency;
use rand::{seq::SliceRandom, RngCore};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("cannot read message pool {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("message pool {0} has no usable lines")]
    Empty(PathBuf),
}

/// Anything that can hand out a slogan for a tendency.
pub trait SloganSource {
    /// `Ok(None)` means no pool is configured for this tendency.
    fn slogan(&self, tendency: Tendency, rng: &mut dyn RngCore)
        -> Result<Option<String>, PoolError>;
}

/// Parsed contents of one pool file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePool {
    lines: Vec<String>,
}

impl MessagePool {
    pub fn parse(content: &str) -> Self {
        let lines = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Self { lines }
    }

    pub fn load(path: &Path) -> Result<Self, PoolError> {
        let content = fs::read_to_string(path).map_err(|source| PoolError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let pool = Self::parse(&content);
        debug!(path = %path.display(), count = pool.len(), "loaded message pool");
        if pool.is_empty() {
            return Err(PoolError::Empty(path.to_path_buf()));
        }
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Uniform random pick.
    pub fn pick(&self, rng: &mut dyn RngCore) -> Option<&str> {
        self.lines.choose(rng).map(String::as_str)
    }
}

/// Pool file locations, one per tendency. Each one is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolFiles {
    pub up: Option<PathBuf>,
    pub down: Option<PathBuf>,
    pub equal: Option<PathBuf>,
}

impl PoolFiles {
    pub fn path_for(&self, tendency: Tendency) -> Option<&Path> {
        match tendency {
            Tendency::Up => self.up.as_deref(),
            Tendency::Down => self.down.as_deref(),
            Tendency::Equal => self.equal.as_deref(),
        }
    }
}

impl SloganSource for PoolFiles {
    fn slogan(
        &self,
        tendency: Tendency,
        rng: &mut dyn RngCore,
    ) -> Result<Option<String>, PoolError> {
        let Some(path) = self.path_for(tendency) else {
            return Ok(None);
        };
        let pool = MessagePool::load(path)?;
        Ok(pool.pick(rng).map(String::from))
    }
}
