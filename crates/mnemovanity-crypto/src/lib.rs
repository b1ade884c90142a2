//! MnemoVanity Crypto Primitives
//!
//! Hashing, address encodings and secp256k1 key serialisation shared by the
//! wallet derivation pipeline.

pub mod secp256k1;
pub mod hash;
pub mod encoding;

pub use self::secp256k1::Secp256k1PublicKey;
pub use self::encoding::EncodingError;
