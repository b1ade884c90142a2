//! Address encodings: Base58Check, segwit Bech32 and EIP-55 hex

use bech32::{segwit, Hrp};
use thiserror::Error;

use crate::hash::{double_sha256, keccak256};

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Invalid human readable part '{0}': {1}")]
    InvalidHrp(String, String),
    #[error("Bech32 encoding failed: {0}")]
    Bech32(String),
    #[error("Witness program must be 20 or 32 bytes, got {0}")]
    InvalidProgramLength(usize),
}

/// Base58Check: version byte, payload, first four bytes of double SHA-256
pub fn base58check_encode(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + 4);
    data.push(version);
    data.extend_from_slice(payload);

    let checksum = double_sha256(&data);
    data.extend_from_slice(&checksum[..4]);

    bs58::encode(data).into_string()
}

/// Segwit version 0 address (BIP173 Bech32) for a 20-byte key hash or
/// 32-byte script hash.
pub fn segwit_v0_encode(hrp: &str, program: &[u8]) -> Result<String, EncodingError> {
    if program.len() != 20 && program.len() != 32 {
        return Err(EncodingError::InvalidProgramLength(program.len()));
    }

    let parsed = Hrp::parse(hrp).map_err(|e| EncodingError::InvalidHrp(hrp.to_string(), e.to_string()))?;

    segwit::encode_v0(parsed, program).map_err(|e| EncodingError::Bech32(e.to_string()))
}

/// EIP-55 mixed-case checksum encoding with `0x` prefix
pub fn eip55_checksum(address: &[u8; 20]) -> String {
    let hex_addr = hex::encode(address);
    let hash = keccak256(hex_addr.as_bytes());

    let mut result = String::with_capacity(42);
    result.push_str("0x");

    for (i, c) in hex_addr.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0F
        };

        if nibble >= 8 {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base58check_p2pkh_of_generator() {
        let h160 = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();
        assert_eq!(
            base58check_encode(0x00, &h160),
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"
        );
    }

    #[test]
    fn test_segwit_v0_bip173_vector() {
        let program = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();
        assert_eq!(
            segwit_v0_encode("bc", &program).unwrap(),
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        );
    }

    #[test]
    fn test_segwit_v0_rejects_bad_program() {
        let err = segwit_v0_encode("bc", &[0u8; 19]).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidProgramLength(19)));
    }

    #[test]
    fn test_eip55_checksum() {
        let mut addr = [0u8; 20];
        hex::decode_to_slice("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed", &mut addr).unwrap();
        assert_eq!(
            eip55_checksum(&addr),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }
}
