//! Pattern matching implementation

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::criteria::{Criteria, RepeatLocation, RepeatRule};

/// Kind of criterion that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    StartsWith,
    EndsWith,
    Contains,
    Repeating,
}

impl MatchKind {
    /// Fixed score reported for this kind
    pub const fn score(self) -> u32 {
        match self {
            MatchKind::StartsWith | MatchKind::EndsWith => 10,
            MatchKind::Repeating => 9,
            MatchKind::Contains => 8,
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::StartsWith => write!(f, "starts_with"),
            MatchKind::EndsWith => write!(f, "ends_with"),
            MatchKind::Contains => write!(f, "contains"),
            MatchKind::Repeating => write!(f, "repeating"),
        }
    }
}

/// A satisfied criterion.
///
/// `fragment` is the pattern string as supplied for the substring kinds and
/// the observed run (e.g. `"111"`) for `Repeating`. `Display` renders the
/// human readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub kind: MatchKind,
    pub fragment: String,
}

impl Match {
    pub fn score(&self) -> u32 {
        self.kind.score()
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MatchKind::StartsWith => write!(f, "Starts with '{}'", self.fragment),
            MatchKind::EndsWith => write!(f, "Ends with '{}'", self.fragment),
            MatchKind::Contains => write!(f, "Contains '{}'", self.fragment),
            MatchKind::Repeating => {
                let len = self.fragment.chars().count();
                let c = self.fragment.chars().next().unwrap_or_default();
                write!(f, "{} repeating chars '{}'", len, c)
            }
        }
    }
}

/// One-shot match without a prepared matcher
pub fn check(address: &str, criteria: &Criteria) -> Option<Match> {
    PatternMatcher::new(criteria).matches(address)
}

/// Criteria prepared for repeated matching.
///
/// Holds no mutable state; one instance can be shared by every worker.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    criteria: Criteria,
    /// Lowercased copies of the three pattern lists when matching is case-insensitive
    folded: Option<[Vec<String>; 3]>,
}

impl PatternMatcher {
    pub fn new(criteria: &Criteria) -> Self {
        let folded = criteria.case_insensitive.then(|| {
            let lower = |v: &[String]| -> Vec<String> { v.iter().map(|p| p.to_ascii_lowercase()).collect() };
            [
                lower(&criteria.starts_with),
                lower(&criteria.ends_with),
                lower(&criteria.contains),
            ]
        });

        Self {
            criteria: criteria.clone(),
            folded,
        }
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Test an address; the first satisfied kind in priority order wins, and
    /// within a kind the first pattern in supplied order.
    pub fn matches(&self, address: &str) -> Option<Match> {
        let lowered;
        let (haystack, [starts, ends, contains]) = match &self.folded {
            Some(folded) => {
                lowered = address.to_ascii_lowercase();
                (lowered.as_str(), [&folded[0], &folded[1], &folded[2]])
            }
            None => (
                address,
                [
                    &self.criteria.starts_with,
                    &self.criteria.ends_with,
                    &self.criteria.contains,
                ],
            ),
        };

        let ordered = [
            (MatchKind::StartsWith, starts, &self.criteria.starts_with),
            (MatchKind::EndsWith, ends, &self.criteria.ends_with),
            (MatchKind::Contains, contains, &self.criteria.contains),
        ];

        for (kind, patterns, originals) in ordered {
            let hit = patterns.iter().position(|p| match kind {
                MatchKind::StartsWith => haystack.starts_with(p.as_str()),
                MatchKind::EndsWith => haystack.ends_with(p.as_str()),
                _ => haystack.contains(p.as_str()),
            });
            if let Some(i) = hit {
                return Some(Match {
                    kind,
                    fragment: originals[i].clone(),
                });
            }
        }

        let rule = self.criteria.repeating?;
        find_run(address, rule, self.criteria.case_insensitive).map(|fragment| Match {
            kind: MatchKind::Repeating,
            fragment,
        })
    }
}

/// Longest run of one repeated character satisfying `rule`. Ties go to the
/// earliest run. With `RepeatLocation::End` only the trailing run counts.
fn find_run(address: &str, rule: RepeatRule, fold: bool) -> Option<String> {
    let chars: Vec<char> = address.chars().collect();
    let same = |a: char, b: char| if fold { a.eq_ignore_ascii_case(&b) } else { a == b };

    // (start, len)
    let mut best: Option<(usize, usize)> = None;
    let mut start = 0;
    while start < chars.len() {
        let mut end = start + 1;
        while end < chars.len() && same(chars[start], chars[end]) {
            end += 1;
        }

        let len = end - start;
        let trailing = end == chars.len();
        let eligible = match rule.location {
            RepeatLocation::Any => true,
            RepeatLocation::End => trailing,
        };
        if eligible && len >= rule.min_run && best.map_or(true, |(_, l)| len > l) {
            best = Some((start, len));
        }

        start = end;
    }

    best.map(|(s, len)| chars[s..s + len].iter().collect())
}
