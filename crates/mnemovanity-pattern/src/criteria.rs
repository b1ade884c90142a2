//! Search criteria

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matcher::MatchKind;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("No match criteria given (need starts_with, ends_with, contains or repeating)")]
    NoCriteria,
    #[error("Empty pattern string in {0} list")]
    EmptyPattern(MatchKind),
    #[error("Repeating run length must be at least 2, got {0}")]
    RunTooShort(usize),
}

/// Where a repeated-character run has to sit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatLocation {
    /// Anywhere in the address
    #[default]
    Any,
    /// Ending at the last character
    End,
}

/// Repeated single-character run criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatRule {
    /// Minimum run length
    pub min_run: usize,
    #[serde(default)]
    pub location: RepeatLocation,
}

/// The set of criteria an address is tested against.
///
/// Each kind is present when its list is non-empty (or, for `repeating`, when
/// set). At least one kind must be present for a search to start.
///
/// In JSON, `repeating` is either a `{"min_run", "location"}` object or a bare
/// run length, with the location then read from a sibling `repeating_loc`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CriteriaRepr")]
pub struct Criteria {
    pub starts_with: Vec<String>,
    pub ends_with: Vec<String>,
    pub contains: Vec<String>,
    pub repeating: Option<RepeatRule>,
    /// Compare ASCII letters without regard to case
    pub case_insensitive: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RepeatSpec {
    Run(usize),
    Rule(RepeatRule),
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct CriteriaRepr {
    starts_with: Vec<String>,
    ends_with: Vec<String>,
    contains: Vec<String>,
    repeating: Option<RepeatSpec>,
    repeating_loc: Option<RepeatLocation>,
    case_insensitive: bool,
}

impl From<CriteriaRepr> for Criteria {
    fn from(repr: CriteriaRepr) -> Self {
        let repeating = repr.repeating.map(|spec| match spec {
            RepeatSpec::Run(min_run) => RepeatRule {
                min_run,
                location: repr.repeating_loc.unwrap_or_default(),
            },
            RepeatSpec::Rule(rule) => rule,
        });
        Self {
            starts_with: repr.starts_with,
            ends_with: repr.ends_with,
            contains: repr.contains,
            repeating,
            case_insensitive: repr.case_insensitive,
        }
    }
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add prefix patterns
    pub fn starts_with<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.starts_with.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add suffix patterns
    pub fn ends_with<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ends_with.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add substring patterns
    pub fn contains<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contains.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Require a run of at least `min_run` identical characters
    pub fn repeating(mut self, min_run: usize, location: RepeatLocation) -> Self {
        self.repeating = Some(RepeatRule { min_run, location });
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Kinds that will be evaluated, in priority order
    pub fn kinds(&self) -> Vec<MatchKind> {
        let mut kinds = Vec::with_capacity(4);
        if !self.starts_with.is_empty() {
            kinds.push(MatchKind::StartsWith);
        }
        if !self.ends_with.is_empty() {
            kinds.push(MatchKind::EndsWith);
        }
        if !self.contains.is_empty() {
            kinds.push(MatchKind::Contains);
        }
        if self.repeating.is_some() {
            kinds.push(MatchKind::Repeating);
        }
        kinds
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }

    /// Reject criteria no address could be evaluated against
    pub fn validate(&self) -> Result<(), CriteriaError> {
        if self.is_empty() {
            return Err(CriteriaError::NoCriteria);
        }

        let lists = [
            (MatchKind::StartsWith, &self.starts_with),
            (MatchKind::EndsWith, &self.ends_with),
            (MatchKind::Contains, &self.contains),
        ];
        for (kind, patterns) in lists {
            if patterns.iter().any(|p| p.is_empty()) {
                return Err(CriteriaError::EmptyPattern(kind));
            }
        }

        if let Some(rule) = self.repeating {
            if rule.min_run < 2 {
                return Err(CriteriaError::RunTooShort(rule.min_run));
            }
        }

        Ok(())
    }
}
