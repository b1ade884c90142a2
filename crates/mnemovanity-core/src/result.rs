//! Values emitted by workers

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use mnemovanity_pattern::{Match, MatchKind};
use mnemovanity_wallet::{DerivedAddress, Network};

/// A derived address that satisfied the criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub address: String,
    pub mnemonic: String,
    /// Address index the match was derived at
    pub index: u32,
    pub network: Network,
    pub kind: MatchKind,
    /// e.g. `Starts with '0xdead'`
    pub label: String,
    pub score: u32,
    pub found_at: DateTime<Local>,
}

impl MatchResult {
    pub fn new(network: Network, mnemonic: &str, derived: &DerivedAddress, hit: &Match) -> Self {
        Self {
            address: derived.address.clone(),
            mnemonic: mnemonic.to_string(),
            index: derived.index,
            network,
            kind: hit.kind,
            label: hit.label(),
            score: hit.score(),
            found_at: Local::now(),
        }
    }
}

/// Address checks performed by one worker batch
pub type ThroughputTick = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_from_match() {
        let derived = DerivedAddress { index: 3, address: "0xdeadbeef".into() };
        let hit = Match { kind: MatchKind::Contains, fragment: "dead".into() };
        let result = MatchResult::new(Network::Eth, "abandon about", &derived, &hit);

        assert_eq!(result.index, 3);
        assert_eq!(result.label, "Contains 'dead'");
        assert_eq!(result.score, 8);
        assert!(result.found_at <= Local::now());
    }

    #[test]
    fn test_result_json_shape() {
        let derived = DerivedAddress { index: 0, address: "1Ace".into() };
        let hit = Match { kind: MatchKind::StartsWith, fragment: "1Ace".into() };
        let json = serde_json::to_value(MatchResult::new(Network::BtcLegacy, "w", &derived, &hit)).unwrap();

        assert_eq!(json["network"], "BTC_LEGACY");
        assert_eq!(json["kind"], "starts_with");
        assert_eq!(json["score"], 10);
    }
}
