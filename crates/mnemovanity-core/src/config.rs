//! Search and engine configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mnemovanity_pattern::{Criteria, CriteriaError};
use mnemovanity_wallet::{Network, WordCount};

/// Candidates per worker batch (one throughput tick per batch)
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Highest non-hardened child index
pub const MAX_ADDRESS_INDEX: u32 = (1 << 31) - 1;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
    #[error("Worker count must be at least 1")]
    NoWorkers,
    #[error("No address indices to test")]
    EmptyScope,
    #[error("Address index {0} is outside the non-hardened range 0..=2147483647")]
    InvalidIndex(u32),
    #[error("Batch size must be at least 1")]
    ZeroBatch,
}

/// Which address positions of account 0 / external chain are tested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressScope {
    /// Indices `0..n`
    First(u32),
    /// One caller-chosen index
    Single(u32),
    /// Explicit ordered list
    Custom(Vec<u32>),
}

impl AddressScope {
    pub fn indices(&self) -> Vec<u32> {
        match self {
            AddressScope::First(n) => (0..*n).collect(),
            AddressScope::Single(i) => vec![*i],
            AddressScope::Custom(v) => v.clone(),
        }
    }
}

fn default_indices() -> Vec<u32> {
    vec![0]
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Immutable per-run search configuration, shared read-only by all workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub network: Network,
    #[serde(default)]
    pub word_count: WordCount,
    #[serde(default = "default_indices")]
    pub address_indices: Vec<u32>,
    #[serde(alias = "patterns")]
    pub criteria: Criteria,
    pub worker_count: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl SearchConfig {
    /// Single worker, 12 words, index 0, default batch size
    pub fn new(network: Network, criteria: Criteria) -> Self {
        Self {
            network,
            word_count: WordCount::default(),
            address_indices: default_indices(),
            criteria,
            worker_count: 1,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn word_count(mut self, word_count: WordCount) -> Self {
        self.word_count = word_count;
        self
    }

    pub fn scope(mut self, scope: AddressScope) -> Self {
        self.address_indices = scope.indices();
        self
    }

    pub fn worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.criteria.validate()?;

        if self.worker_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatch);
        }
        if self.address_indices.is_empty() {
            return Err(ConfigError::EmptyScope);
        }
        if let Some(&bad) = self.address_indices.iter().find(|&&i| i > MAX_ADDRESS_INDEX) {
            return Err(ConfigError::InvalidIndex(bad));
        }

        Ok(())
    }
}

/// Engine tuning that is independent of any single search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// How long `stop` waits for workers before detaching them
    pub stop_timeout: Duration,
    /// Bound of the results channel (at least 1 is used)
    pub result_capacity: usize,
    /// Bound of the throughput channel (at least 1 is used)
    pub count_capacity: usize,
}

impl EngineOptions {
    /// Results channel bound actually used. A zero-capacity channel only hands
    /// over to a receiver already blocked in `recv`, so a polling caller would
    /// never see a match.
    pub fn result_bound(&self) -> usize {
        self.result_capacity.max(1)
    }

    /// Throughput channel bound actually used
    pub fn count_bound(&self) -> usize {
        self.count_capacity.max(1)
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(1),
            result_capacity: 1024,
            count_capacity: 4096,
        }
    }
}
