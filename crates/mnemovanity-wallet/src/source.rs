//! Candidate type and the source trait workers draw from

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mnemovanity_crypto::EncodingError;

#[derive(Error, Debug)]
pub enum DeriveError {
    #[error("Mnemonic error: {0}")]
    Mnemonic(String),
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("Address index {0} is outside the non-hardened range")]
    InvalidIndex(u32),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// An address derived at one index of the external chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAddress {
    pub index: u32,
    pub address: String,
}

/// One random wallet: its phrase and the addresses at the requested indices,
/// in the order the indices were requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub mnemonic: String,
    pub addresses: Vec<DerivedAddress>,
}

/// Produces candidates for a worker.
///
/// Each worker owns its source exclusively, so implementations may keep
/// mutable context (RNG state, cached derivation nodes) without locking.
pub trait CandidateSource: Send {
    /// Generate the next candidate. An `Err` affects only this candidate.
    fn next_candidate(&mut self) -> Result<Candidate, DeriveError>;
}

impl<F> CandidateSource for F
where
    F: FnMut() -> Result<Candidate, DeriveError> + Send,
{
    fn next_candidate(&mut self) -> Result<Candidate, DeriveError> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_source() {
        let mut n = 0u32;
        let mut source = move || {
            n += 1;
            Ok(Candidate {
                mnemonic: format!("phrase {}", n),
                addresses: vec![DerivedAddress { index: 0, address: format!("0x{:02}", n) }],
            })
        };

        assert_eq!(source.next_candidate().unwrap().mnemonic, "phrase 1");
        assert_eq!(source.next_candidate().unwrap().addresses[0].address, "0x02");
    }
}
