//! Core codec components
//!
//! This module contains the record types and their wire handling:
//! - Byte reader and hex helpers shared by every codec
//! - Transactions (v1 ECDSA/timestamp and v2 Schnorr/nonce) and the type registry
//! - Transaction codec with signature exclusions, signing and id derivation
//! - Transaction verification (primary, second and quorum signatures)
//! - Declarative schema validation
//! - Blocks, the block codec with its id cache, and block verification

pub mod block;
pub mod block_codec;
pub mod block_verifier;
pub mod buffer;
pub mod schema;
pub mod transaction;
pub mod transaction_codec;
pub mod transaction_verifier;
pub mod types;

pub use block::{
    id_to_hex, Block, BlockData, BlockError, BlockFactory, BlockHeader, BlockJson,
    BlockSchemaError, BlockSignedSection, BLOCK_VERSION_LEGACY, BLOCK_VERSION_VOTES,
};
pub use block_codec::{BlockCodec, DEFAULT_ID_CACHE_SIZE};
pub use block_verifier::{BlockPayloadError, BlockVerifier};
pub use buffer::{ByteReader, DecodeError, EncodeError};
pub use schema::{Rule, Schema, SchemaError, SchemaValidator, BLOCK_SCHEMA};
pub use transaction::{
    CoreTransactionType, LegacyMultiSignatureAsset, Transaction, TransactionAsset,
    TransactionData, TransactionError, CORE_TYPE_GROUP, TRANSACTION_MARKER,
};
pub use transaction_codec::{DeserializeOptions, SignatureExclusions, TransactionCodec};
pub use transaction_verifier::TransactionVerifier;
pub use types::{TransactionTypeHandler, TransactionTypeKey, TransactionTypeRegistry};
