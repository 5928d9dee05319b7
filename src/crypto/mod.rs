//! Cryptographic utilities for the codec
//!
//! This module provides:
//! - SHA-256 / RIPEMD-160 hashing
//! - secp256k1 key management
//! - DER ECDSA and Schnorr signing/verification
//! - Base58check address derivation

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, ripemd160, sha256, sha256_hex};
pub use keys::{
    address_from_bytes, address_to_bytes, public_key_from_hex, public_key_to_address,
    verify_any, verify_ecdsa, verify_schnorr, KeyError, KeyPair, ADDRESS_SIZE, PUBLIC_KEY_SIZE,
    SCHNORR_SIGNATURE_SIZE,
};
