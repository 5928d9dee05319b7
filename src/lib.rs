//! Ledger-Codec: canonical wire encoding and signature verification for ledger records
//!
//! This crate sits between untrusted network/storage bytes and validated
//! ledger records. It provides:
//! - Block header, signature and payload (de)serialization
//! - Canonical block identifiers (full sha256 or legacy 64-bit) with a content-keyed cache
//! - Collect-all block verification diagnostics
//! - Multi-version transaction codec (v1 ECDSA/timestamp, v2 Schnorr/nonce)
//! - Primary, second and quorum multi-signature verification
//! - Milestone-aware schema validation and historical exception whitelists
//!
//! # Example
//!
//! ```rust
//! use ledger_codec::config::{NetworkConfig, ProtocolContext};
//! use ledger_codec::core::{BlockVerifier, TransactionCodec};
//!
//! let config = NetworkConfig::devnet();
//! let context = ProtocolContext::from_config(&config).unwrap();
//!
//! let transactions = TransactionCodec::new(context.clone());
//! let blocks = BlockVerifier::new(context);
//! # let _ = (transactions, blocks);
//! ```

pub mod config;
pub mod core;
pub mod crypto;
pub mod multisig;

// Re-export commonly used types
pub use config::{
    ExceptionRegistry, Milestone, MilestoneProvider, MilestoneSchedule, NetworkConfig,
    ProtocolContext,
};
pub use core::{
    Block, BlockCodec, BlockData, BlockError, BlockFactory, BlockHeader, BlockPayloadError,
    BlockSignedSection, BlockVerifier, DecodeError, EncodeError, SignatureExclusions,
    Transaction, TransactionCodec, TransactionData, TransactionError, TransactionVerifier,
};
pub use crypto::KeyPair;
pub use multisig::{MultiSignatureAsset, MultisigError};
