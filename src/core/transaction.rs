//! Transaction records
//!
//! Two wire generations share one record type:
//! - Version 1: 1-byte type, timestamp replay protection, DER ECDSA signatures,
//!   legacy multi-signature blob
//! - Version 2: type group + 2-byte type, nonce replay protection, Schnorr
//!   signatures, indexed quorum multi-signature entries
//!
//! Records hold keys, signatures and hashes as lowercase hex, matching their
//! JSON form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::buffer::{DecodeError, EncodeError};
use crate::crypto::{public_key_from_hex, public_key_to_address, KeyError};
use crate::multisig::{MultiSignatureAsset, MultisigError};

// =============================================================================
// Constants
// =============================================================================

/// Leading byte of every serialized transaction
pub const TRANSACTION_MARKER: u8 = 0xff;

/// Marks the start of a legacy (v1) multi-signature blob
pub const LEGACY_MULTISIG_MARKER: u8 = 0xff;

/// Type group of the built-in transaction types
pub const CORE_TYPE_GROUP: u32 = 1;

/// Built-in transaction types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CoreTransactionType {
    Transfer = 0,
    SecondSignature = 1,
    DelegateRegistration = 2,
    Vote = 3,
    MultiSignature = 4,
}

impl CoreTransactionType {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Transfer),
            1 => Some(Self::SecondSignature),
            2 => Some(Self::DelegateRegistration),
            3 => Some(Self::Vote),
            4 => Some(Self::MultiSignature),
            _ => None,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Transaction-related errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("Transaction version {0} is not supported")]
    UnsupportedVersion(u8),
    #[error("Multi-signature error: {0}")]
    MultiSignature(#[from] MultisigError),
    #[error("Unknown transaction type {type_id} in group {type_group} (version {version})")]
    UnknownType {
        type_id: u16,
        type_group: u32,
        version: u8,
    },
    #[error("Crypto error: {0}")]
    Crypto(#[from] KeyError),
}

// =============================================================================
// Assets
// =============================================================================

/// Legacy (v1) multi-signature registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMultiSignatureAsset {
    pub min: u8,
    pub lifetime: u8,
    /// Participant keys, `+`-prefixed after normalization
    pub keysgroup: Vec<String>,
}

/// Type-specific payload. Transfers carry no asset; their fields live on
/// the record itself (amount, expiration, recipient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionAsset {
    Signature {
        #[serde(rename = "publicKey")]
        public_key: String,
    },
    Delegate {
        username: String,
    },
    Votes(Vec<String>),
    MultiSignature(MultiSignatureAsset),
    MultiSignatureLegacy(LegacyMultiSignatureAsset),
}

// =============================================================================
// Transaction data
// =============================================================================

/// Structured transaction fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    pub version: u8,
    pub network: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_group: Option<u32>,
    #[serde(rename = "type")]
    pub type_id: u16,
    /// v1 replay protection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u32>,
    /// v2 replay protection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    pub sender_public_key: String,
    pub fee: u64,
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<TransactionAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_signature: Option<String>,
    /// Legacy name of `second_signature`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_signature: Option<String>,
    /// v2: 130-char hex participant entries; v1: a single legacy blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl TransactionData {
    /// Type group used for handler lookups; v1 records belong to the core group
    pub fn effective_type_group(&self) -> u32 {
        if self.version <= 1 {
            return CORE_TYPE_GROUP;
        }
        self.type_group.unwrap_or(CORE_TYPE_GROUP)
    }

    /// The second signature under either of its names
    pub fn second_signature(&self) -> Option<&str> {
        self.second_signature
            .as_deref()
            .or(self.sign_signature.as_deref())
    }

    /// Quorum asset of a v2 multi-signature registration
    pub fn multi_signature_asset(&self) -> Option<&MultiSignatureAsset> {
        match &self.asset {
            Some(TransactionAsset::MultiSignature(asset)) => Some(asset),
            _ => None,
        }
    }

    /// One-time normalization of a freshly decoded v1 record
    pub fn apply_v1_compatibility(&mut self) {
        if self.second_signature.is_none() {
            self.second_signature = self.sign_signature.clone();
        }
        self.type_group = Some(CORE_TYPE_GROUP);

        match CoreTransactionType::from_u16(self.type_id) {
            Some(CoreTransactionType::Vote) if !self.sender_public_key.is_empty() => {
                match public_key_from_hex(&self.sender_public_key) {
                    Ok(public_key) => {
                        self.recipient_id = Some(public_key_to_address(&public_key, self.network));
                    }
                    Err(e) => log::warn!("Vote sender key is not a valid point: {}", e),
                }
            }
            Some(CoreTransactionType::MultiSignature) => {
                if let Some(TransactionAsset::MultiSignatureLegacy(legacy)) = &mut self.asset {
                    for key in legacy.keysgroup.iter_mut() {
                        if !key.starts_with('+') {
                            key.insert(0, '+');
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// A decoded transaction with its canonical bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub data: TransactionData,
    /// The exact span consumed during decode (or produced by serialize)
    pub serialized: Vec<u8>,
    /// Lowercase hex sha256 of `serialized`
    pub id: String,
}

impl Transaction {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn serialized_hex(&self) -> String {
        hex::encode(&self.serialized)
    }
}
