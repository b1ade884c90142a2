//! BIP39 mnemonic -> BIP32 account node -> addresses

use bip32::{ChildNumber, XPrv};
use bip39::Mnemonic;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::debug;

use mnemovanity_crypto::Secp256k1PublicKey;

use crate::network::{Network, WordCount};
use crate::source::{Candidate, CandidateSource, DeriveError, DerivedAddress};

/// Account fixed to 0'
const ACCOUNT: u32 = 0;
/// External (receive) chain
const CHANGE_EXTERNAL: u32 = 0;

/// Random-wallet pipeline for one worker.
///
/// Owns its RNG and the precomputed path segments; never shared between
/// threads.
pub struct Bip39Pipeline {
    network: Network,
    word_count: WordCount,
    /// purpose' / coin' / account' / change
    account_path: [ChildNumber; 4],
    indices: Vec<(u32, ChildNumber)>,
    rng: StdRng,
}

impl Bip39Pipeline {
    pub fn new(network: Network, word_count: WordCount, indices: &[u32]) -> Result<Self, DeriveError> {
        Self::with_rng(network, word_count, indices, StdRng::from_entropy())
    }

    /// Pipeline with a caller-supplied RNG (seeded RNGs make runs reproducible)
    pub fn with_rng(
        network: Network,
        word_count: WordCount,
        indices: &[u32],
        rng: StdRng,
    ) -> Result<Self, DeriveError> {
        let scheme = network.scheme();
        let hardened = |i: u32| {
            ChildNumber::new(i, true).map_err(|e| DeriveError::KeyDerivation(e.to_string()))
        };
        let account_path = [
            hardened(scheme.purpose)?,
            hardened(scheme.coin_type)?,
            hardened(ACCOUNT)?,
            ChildNumber::new(CHANGE_EXTERNAL, false)
                .map_err(|e| DeriveError::KeyDerivation(e.to_string()))?,
        ];

        let indices = indices
            .iter()
            .map(|&i| {
                ChildNumber::new(i, false)
                    .map(|child| (i, child))
                    .map_err(|_| DeriveError::InvalidIndex(i))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            %network,
            path = %format!("m/{}'/{}'/{}'/{}", scheme.purpose, scheme.coin_type, ACCOUNT, CHANGE_EXTERNAL),
            indices = indices.len(),
            words = word_count.words(),
            "Derivation pipeline ready"
        );

        Ok(Self {
            network,
            word_count,
            account_path,
            indices,
            rng,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Fresh random mnemonic of the configured length
    pub fn generate_mnemonic(&mut self) -> Result<Mnemonic, DeriveError> {
        let mut entropy = [0u8; 32];
        let entropy = &mut entropy[..self.word_count.entropy_bytes()];
        self.rng.fill_bytes(entropy);
        Mnemonic::from_entropy(entropy).map_err(|e| DeriveError::Mnemonic(e.to_string()))
    }

    /// Derive the configured addresses for an existing phrase (empty passphrase)
    pub fn derive_phrase(&self, mnemonic: &Mnemonic) -> Result<Candidate, DeriveError> {
        let seed = mnemonic.to_seed("");

        let mut node = XPrv::new(seed).map_err(|e| DeriveError::KeyDerivation(e.to_string()))?;
        for child in self.account_path {
            node = node
                .derive_child(child)
                .map_err(|e| DeriveError::KeyDerivation(e.to_string()))?;
        }

        let addresses = self
            .indices
            .iter()
            .map(|&(index, child)| {
                let key = node
                    .derive_child(child)
                    .map_err(|e| DeriveError::KeyDerivation(e.to_string()))?;
                let public = Secp256k1PublicKey::from(key.private_key().verifying_key());
                Ok(DerivedAddress {
                    index,
                    address: self.network.encode_address(&public)?,
                })
            })
            .collect::<Result<Vec<_>, DeriveError>>()?;

        Ok(Candidate {
            mnemonic: mnemonic.to_string(),
            addresses,
        })
    }

    /// Parse an English phrase (checksum verified) and derive its addresses
    pub fn derive_words(&self, phrase: &str) -> Result<Candidate, DeriveError> {
        let mnemonic = Mnemonic::parse_normalized(phrase).map_err(|e| DeriveError::Mnemonic(e.to_string()))?;
        self.derive_phrase(&mnemonic)
    }
}

impl CandidateSource for Bip39Pipeline {
    fn next_candidate(&mut self) -> Result<Candidate, DeriveError> {
        let mnemonic = self.generate_mnemonic()?;
        self.derive_phrase(&mnemonic)
    }
}
