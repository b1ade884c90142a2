//! secp256k1 public key serialisation for BTC and ETH address derivation

use k256::{ecdsa::VerifyingKey, elliptic_curve::sec1::ToEncodedPoint, PublicKey};

/// A secp256k1 public key, as produced by hierarchical derivation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Secp256k1PublicKey(PublicKey);

impl Secp256k1PublicKey {
    /// Compressed SEC1 encoding (33 bytes: 0x02/0x03 || x)
    pub fn compressed(&self) -> [u8; 33] {
        let point = self.0.to_encoded_point(true);
        let mut result = [0u8; 33];
        result.copy_from_slice(point.as_bytes());
        result
    }

    /// Uncompressed coordinates without the 0x04 tag (64 bytes: x || y)
    pub fn xy(&self) -> [u8; 64] {
        let point = self.0.to_encoded_point(false);
        let mut result = [0u8; 64];
        result.copy_from_slice(&point.as_bytes()[1..65]);
        result
    }
}

impl From<&VerifyingKey> for Secp256k1PublicKey {
    fn from(key: &VerifyingKey) -> Self {
        Self(PublicKey::from(key))
    }
}
