//! MnemoVanity Wallet Derivation
//!
//! Turns random BIP39 mnemonics into the addresses a vanity search tests:
//! mnemonic -> seed -> BIP44/BIP84 account node -> per-index address.

pub mod network;
pub mod pipeline;
pub mod source;

pub use network::{DerivationScheme, Network, WordCount, WordCountError};
pub use pipeline::Bip39Pipeline;
pub use source::{Candidate, CandidateSource, DeriveError, DerivedAddress};
