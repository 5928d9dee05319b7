//! secp256k1 key management and signature schemes
//!
//! Blocks are always signed with DER-encoded ECDSA. Transactions use DER
//! ECDSA up to version 1 and 64-byte Schnorr (BIP-340 over the x-only form of
//! the compressed key) from version 2 onwards; multi-signature participants
//! always sign with Schnorr.

use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{ecdsa, schnorr, All, Keypair, Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::{double_sha256, ripemd160, sha256};

/// Shared verification/signing context.
static SECP256K1: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Length of a compressed public key
pub const PUBLIC_KEY_SIZE: usize = 33;

/// Length of a Schnorr signature
pub const SCHNORR_SIGNATURE_SIZE: usize = 64;

/// Length of a decoded address (network byte + RIPEMD-160)
pub const ADDRESS_SIZE: usize = 21;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let (secret_key, public_key) = SECP256K1.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key = SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Derive a key pair from a passphrase (secret = sha256(passphrase))
    pub fn from_passphrase(passphrase: &str) -> Result<Self, KeyError> {
        let secret_key = SecretKey::from_slice(&sha256(passphrase.as_bytes()))
            .map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the compressed public key bytes
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key.serialize()
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Address of this key on the given network
    pub fn address(&self, network: u8) -> String {
        public_key_to_address(&self.public_key, network)
    }

    /// Sign a 32-byte digest, returning a DER-encoded ECDSA signature
    pub fn sign_ecdsa(&self, hash: &[u8; 32]) -> Result<Vec<u8>, KeyError> {
        let message = Message::from_digest_slice(hash)?;
        let signature = SECP256K1.sign_ecdsa(&message, &self.secret_key);
        Ok(signature.serialize_der().to_vec())
    }

    /// Sign a 32-byte digest, returning a 64-byte Schnorr signature
    pub fn sign_schnorr(&self, hash: &[u8; 32]) -> Result<[u8; SCHNORR_SIGNATURE_SIZE], KeyError> {
        let message = Message::from_digest_slice(hash)?;
        let keypair = Keypair::from_secret_key(&SECP256K1, &self.secret_key);
        let signature = SECP256K1.sign_schnorr(&message, &keypair);
        let bytes: &[u8; SCHNORR_SIGNATURE_SIZE] = signature.as_ref();
        Ok(*bytes)
    }
}

/// Parse a compressed public key from hex
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Convert a public key to a base58check address: network byte + RIPEMD160(pubkey)
pub fn public_key_to_address(public_key: &PublicKey, network: u8) -> String {
    let mut payload = [0u8; ADDRESS_SIZE];
    payload[0] = network;
    payload[1..].copy_from_slice(&ripemd160(&public_key.serialize()));
    address_from_bytes(&payload)
}

/// Encode a raw 21-byte address with a double-SHA256 checksum
pub fn address_from_bytes(payload: &[u8; ADDRESS_SIZE]) -> String {
    let checksum = double_sha256(payload);
    let mut bytes = payload.to_vec();
    bytes.extend_from_slice(&checksum[..4]);
    bs58::encode(bytes).into_string()
}

/// Decode a base58check address into its raw 21 bytes
pub fn address_to_bytes(address: &str) -> Result<[u8; ADDRESS_SIZE], KeyError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| KeyError::InvalidAddress(e.to_string()))?;
    if bytes.len() != ADDRESS_SIZE + 4 {
        return Err(KeyError::InvalidAddress(format!(
            "expected {} bytes, got {}",
            ADDRESS_SIZE + 4,
            bytes.len()
        )));
    }

    let (payload, checksum) = bytes.split_at(ADDRESS_SIZE);
    if double_sha256(payload)[..4] != *checksum {
        return Err(KeyError::InvalidAddress("checksum mismatch".to_string()));
    }

    let mut out = [0u8; ADDRESS_SIZE];
    out.copy_from_slice(payload);
    Ok(out)
}

/// Verify a DER-encoded ECDSA signature over a 32-byte digest.
///
/// High-S signatures are normalized before verification. Malformed keys or
/// signatures verify as `false`.
pub fn verify_ecdsa(hash: &[u8; 32], signature: &[u8], public_key: &[u8]) -> bool {
    let (Ok(message), Ok(public_key)) = (
        Message::from_digest_slice(hash),
        PublicKey::from_slice(public_key),
    ) else {
        return false;
    };

    let mut signature = match ecdsa::Signature::from_der(signature) {
        Ok(signature) => signature,
        Err(e) => {
            log::debug!("Rejecting malformed DER signature: {}", e);
            return false;
        }
    };
    signature.normalize_s();

    SECP256K1
        .verify_ecdsa(&message, &signature, &public_key)
        .is_ok()
}

/// Verify a 64-byte Schnorr signature over a 32-byte digest against a compressed key
pub fn verify_schnorr(hash: &[u8; 32], signature: &[u8], public_key: &[u8]) -> bool {
    let (Ok(message), Ok(public_key)) = (
        Message::from_digest_slice(hash),
        PublicKey::from_slice(public_key),
    ) else {
        return false;
    };

    let signature = match schnorr::Signature::from_slice(signature) {
        Ok(signature) => signature,
        Err(e) => {
            log::debug!("Rejecting malformed Schnorr signature: {}", e);
            return false;
        }
    };
    let (x_only, _) = public_key.x_only_public_key();

    SECP256K1
        .verify_schnorr(&signature, &message, &x_only)
        .is_ok()
}

/// Verify with the scheme implied by the signature length: 64 bytes is
/// Schnorr, anything else is treated as DER ECDSA.
pub fn verify_any(hash: &[u8; 32], signature: &[u8], public_key: &[u8]) -> bool {
    if signature.len() == SCHNORR_SIGNATURE_SIZE {
        verify_schnorr(hash, signature, public_key)
    } else {
        verify_ecdsa(hash, signature, public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.public_key_hex().len(), 66);
    }

    #[test]
    fn test_ecdsa_sign_and_verify() {
        let kp = KeyPair::generate();
        let hash = sha256(b"Hello, ledger!");

        let signature = kp.sign_ecdsa(&hash).unwrap();
        assert_eq!(signature[0], 0x30);
        assert_eq!(signature.len(), signature[1] as usize + 2);
        assert!(verify_ecdsa(&hash, &signature, &kp.public_key_bytes()));
        assert!(verify_any(&hash, &signature, &kp.public_key_bytes()));
    }

    #[test]
    fn test_schnorr_sign_and_verify() {
        let kp = KeyPair::generate();
        let hash = sha256(b"Hello, ledger!");

        let signature = kp.sign_schnorr(&hash).unwrap();
        assert!(verify_schnorr(&hash, &signature, &kp.public_key_bytes()));
        assert!(verify_any(&hash, &signature, &kp.public_key_bytes()));

        let other = KeyPair::generate();
        assert!(!verify_schnorr(&hash, &signature, &other.public_key_bytes()));
    }

    #[test]
    fn test_malformed_inputs_verify_false() {
        let kp = KeyPair::generate();
        let hash = sha256(b"data");
        assert!(!verify_ecdsa(&hash, &[0x30, 0x01, 0x00], &kp.public_key_bytes()));
        assert!(!verify_schnorr(&hash, &[0u8; 63], &kp.public_key_bytes()));
        assert!(!verify_ecdsa(&hash, &kp.sign_ecdsa(&hash).unwrap(), &[0u8; 33]));
    }

    #[test]
    fn test_passphrase_is_deterministic() {
        let kp1 = KeyPair::from_passphrase("this is a top secret passphrase").unwrap();
        let kp2 = KeyPair::from_passphrase("this is a top secret passphrase").unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());

        let kp3 = KeyPair::from_private_key_hex(&kp1.private_key_hex()).unwrap();
        assert_eq!(kp1.public_key_hex(), kp3.public_key_hex());
    }

    #[test]
    fn test_address_round_trip() {
        let kp = KeyPair::generate();
        let address = kp.address(0x1e);
        let bytes = address_to_bytes(&address).unwrap();
        assert_eq!(bytes[0], 0x1e);
        assert_eq!(address_from_bytes(&bytes), address);
    }

    #[test]
    fn test_address_checksum_rejected() {
        let kp = KeyPair::generate();
        let mut bytes = bs58::decode(kp.address(0x17)).into_vec().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let tampered = bs58::encode(bytes).into_string();
        assert!(matches!(
            address_to_bytes(&tampered),
            Err(KeyError::InvalidAddress(_))
        ));
    }
}
