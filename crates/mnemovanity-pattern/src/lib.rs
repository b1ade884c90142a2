//! MnemoVanity Pattern Matching
//!
//! Match kinds, in evaluation order: starts with, ends with, contains, repeating run.

mod criteria;
mod matcher;

pub use criteria::{Criteria, CriteriaError, RepeatLocation, RepeatRule};
pub use matcher::{check, Match, MatchKind, PatternMatcher};
