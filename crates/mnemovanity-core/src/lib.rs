//! MnemoVanity Core Engine
//!
//! Parallel search for BIP39 wallets whose derived addresses match a set of
//! criteria. A [`GenerationManager`] runs one search at a time on a pool of
//! worker threads and streams [`MatchResult`]s and throughput ticks back to the
//! caller over bounded channels.

mod config;
mod manager;
mod result;
mod stats;
mod worker;

pub use config::{AddressScope, ConfigError, EngineOptions, SearchConfig, DEFAULT_BATCH_SIZE, MAX_ADDRESS_INDEX};
pub use manager::{bip39_factory, EngineError, GenerationManager, SourceFactory};
pub use result::{MatchResult, ThroughputTick};
pub use stats::{format_count, ThroughputMeter};
pub use worker::{Worker, WorkerExit};

// Re-exports for convenience
pub use mnemovanity_pattern::{Criteria, CriteriaError, Match, MatchKind, PatternMatcher, RepeatLocation, RepeatRule};
pub use mnemovanity_wallet::{
    Bip39Pipeline, Candidate, CandidateSource, DeriveError, DerivedAddress, Network, WordCount, WordCountError,
};
