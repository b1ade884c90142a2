//! Networks, their derivation standards and address encodings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mnemovanity_crypto::{
    encoding::{base58check_encode, eip55_checksum, segwit_v0_encode},
    hash::{hash160, keccak256},
    EncodingError, Secp256k1PublicKey,
};

/// Address family searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// Ethereum, EIP-55 hex (0x...)
    #[serde(rename = "ETH")]
    Eth,
    /// Bitcoin P2PKH, Base58Check (1...)
    #[serde(rename = "BTC_LEGACY")]
    BtcLegacy,
    /// Bitcoin native segwit P2WPKH, Bech32 (bc1q...)
    #[serde(rename = "BTC_SEGWIT")]
    BtcSegwit,
}

/// BIP44-style path prefix `m / purpose' / coin_type'`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationScheme {
    pub purpose: u32,
    pub coin_type: u32,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Eth, Network::BtcLegacy, Network::BtcSegwit];

    /// Fixed network -> derivation standard lookup
    pub const fn scheme(self) -> DerivationScheme {
        match self {
            Network::Eth => DerivationScheme { purpose: 44, coin_type: 60 },
            Network::BtcLegacy => DerivationScheme { purpose: 44, coin_type: 0 },
            Network::BtcSegwit => DerivationScheme { purpose: 84, coin_type: 0 },
        }
    }

    /// Characters an address of this network can contain after its prefix
    pub fn valid_address_chars(self) -> &'static str {
        match self {
            Network::Eth => "0123456789abcdefABCDEF",
            Network::BtcLegacy => "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz",
            Network::BtcSegwit => "023456789acdefghjklmnpqrstuvwxyz",
        }
    }

    /// Fixed leading characters of every address
    pub fn address_prefix(self) -> &'static str {
        match self {
            Network::Eth => "0x",
            Network::BtcLegacy => "1",
            Network::BtcSegwit => "bc1q",
        }
    }

    /// Encode a derived public key as this network's native address string
    pub fn encode_address(self, key: &Secp256k1PublicKey) -> Result<String, EncodingError> {
        match self {
            Network::Eth => {
                // last 20 bytes of keccak256(x || y)
                let hash = keccak256(&key.xy());
                let mut address = [0u8; 20];
                address.copy_from_slice(&hash[12..]);
                Ok(eip55_checksum(&address))
            }
            Network::BtcLegacy => Ok(base58check_encode(0x00, &hash160(&key.compressed()))),
            Network::BtcSegwit => segwit_v0_encode("bc", &hash160(&key.compressed())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Eth => write!(f, "ETH"),
            Network::BtcLegacy => write!(f, "BTC_LEGACY"),
            Network::BtcSegwit => write!(f, "BTC_SEGWIT"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "eth" | "ethereum" => Ok(Network::Eth),
            "btc_legacy" | "legacy" | "p2pkh" => Ok(Network::BtcLegacy),
            "btc_segwit" | "segwit" | "p2wpkh" | "bech32" => Ok(Network::BtcSegwit),
            _ => Err(format!("Unknown network: {}", s)),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unsupported mnemonic length {0} (expected 12 or 24 words)")]
pub struct WordCountError(pub usize);

/// Mnemonic length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum WordCount {
    /// 128 bits of entropy
    #[default]
    Twelve,
    /// 256 bits of entropy
    TwentyFour,
}

impl WordCount {
    pub const fn words(self) -> usize {
        match self {
            WordCount::Twelve => 12,
            WordCount::TwentyFour => 24,
        }
    }

    pub const fn entropy_bytes(self) -> usize {
        match self {
            WordCount::Twelve => 16,
            WordCount::TwentyFour => 32,
        }
    }
}

impl TryFrom<usize> for WordCount {
    type Error = WordCountError;

    fn try_from(words: usize) -> Result<Self, Self::Error> {
        match words {
            12 => Ok(WordCount::Twelve),
            24 => Ok(WordCount::TwentyFour),
            other => Err(WordCountError(other)),
        }
    }
}

impl From<WordCount> for usize {
    fn from(count: WordCount) -> Self {
        count.words()
    }
}

impl fmt::Display for WordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} words", self.words())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> Secp256k1PublicKey {
        let mut one = [0u8; 32];
        one[31] = 1;
        let signing = bip32::secp256k1::ecdsa::SigningKey::from_slice(&one).unwrap();
        Secp256k1PublicKey::from(signing.verifying_key())
    }

    #[test]
    fn test_scheme_table() {
        assert_eq!(Network::Eth.scheme(), DerivationScheme { purpose: 44, coin_type: 60 });
        assert_eq!(Network::BtcLegacy.scheme(), DerivationScheme { purpose: 44, coin_type: 0 });
        assert_eq!(Network::BtcSegwit.scheme(), DerivationScheme { purpose: 84, coin_type: 0 });
    }

    #[test]
    fn test_address_encodings_for_key_one() {
        let key = generator();
        assert_eq!(
            Network::Eth.encode_address(&key).unwrap(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
        assert_eq!(
            Network::BtcLegacy.encode_address(&key).unwrap(),
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"
        );
        assert_eq!(
            Network::BtcSegwit.encode_address(&key).unwrap(),
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        );
    }

    #[test]
    fn test_encoded_addresses_use_prefix() {
        let key = generator();
        for network in Network::ALL {
            let address = network.encode_address(&key).unwrap();
            assert!(address.starts_with(network.address_prefix()), "{}", address);
        }
    }

    #[test]
    fn test_network_names() {
        assert_eq!("BTC_SEGWIT".parse::<Network>().unwrap(), Network::BtcSegwit);
        assert_eq!("btc-legacy".parse::<Network>().unwrap(), Network::BtcLegacy);
        assert!("doge".parse::<Network>().is_err());
        assert_eq!(serde_json::to_string(&Network::Eth).unwrap(), "\"ETH\"");
    }

    #[test]
    fn test_word_count_serde() {
        let count: WordCount = serde_json::from_str("24").unwrap();
        assert_eq!(count, WordCount::TwentyFour);
        assert_eq!(count.entropy_bytes(), 32);
        assert!(serde_json::from_str::<WordCount>("18").is_err());
        assert_eq!(WordCount::try_from(13), Err(WordCountError(13)));
    }
}
