//! Block records
//!
//! A block is layered: the signed section is what the generator signs, the
//! header adds the DER signature, and the block data adds the raw
//! transaction blobs in block order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::block_codec::BlockCodec;
use super::buffer::{DecodeError, EncodeError};
use super::transaction::{Transaction, TransactionData, TransactionError};
use super::transaction_codec::{DeserializeOptions, TransactionCodec};
use crate::config::ProtocolContext;
use crate::crypto::{KeyError, KeyPair};

// =============================================================================
// Constants
// =============================================================================

/// Block version without previous-block votes
pub const BLOCK_VERSION_LEGACY: u32 = 0;

/// Block version carrying previous-block votes
pub const BLOCK_VERSION_VOTES: u32 = 1;

// =============================================================================
// Errors
// =============================================================================

/// A block failed schema validation and is not whitelisted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Height ({height}): {message}")]
pub struct BlockSchemaError {
    pub height: u32,
    pub message: String,
}

/// Block-related errors
#[derive(Error, Debug)]
pub enum BlockError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("Schema error: {0}")]
    Schema(#[from] BlockSchemaError),
    #[error("Transaction {index}: {source}")]
    Transaction {
        index: usize,
        #[source]
        source: TransactionError,
    },
    #[error("Crypto error: {0}")]
    Crypto(#[from] KeyError),
}

// =============================================================================
// Records
// =============================================================================

/// The fields covered by the generator's signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSignedSection {
    pub version: u32,
    pub timestamp: u32,
    pub height: u32,
    /// Decimal (short ids) or 64-char hex (full-hash ids); empty for genesis
    pub previous_block: String,
    pub number_of_transactions: u32,
    pub total_amount: u64,
    pub total_fee: u64,
    pub reward: u64,
    pub payload_length: u32,
    pub payload_hash: String,
    pub generator_public_key: String,
    /// Only on version 1 blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_block_votes: Option<Vec<String>>,
}

/// Signed section plus the DER block signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    #[serde(flatten)]
    pub signed: BlockSignedSection,
    pub block_signature: String,
}

impl std::ops::Deref for BlockHeader {
    type Target = BlockSignedSection;

    fn deref(&self) -> &Self::Target {
        &self.signed
    }
}

/// Header plus the raw transaction blobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockData {
    pub header: BlockHeader,
    pub transactions: Vec<Vec<u8>>,
}

impl std::ops::Deref for BlockData {
    type Target = BlockHeader;

    fn deref(&self) -> &Self::Target {
        &self.header
    }
}

/// A decoded, schema-checked block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub data: BlockData,
    pub id: String,
    pub transactions: Vec<Transaction>,
    pub serialized: Vec<u8>,
}

/// JSON rendering of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockJson {
    pub id: String,
    pub id_hex: String,
    pub serialized: String,
    #[serde(flatten)]
    pub header: BlockHeader,
    pub previous_block_hex: String,
    pub transactions: Vec<TransactionData>,
}

/// Convert a block id to hex: full-hash ids are returned as is, decimal
/// ids become 16 zero-padded hex chars.
pub fn id_to_hex(id: &str) -> Result<String, EncodeError> {
    if id.len() == 64 {
        return Ok(id.to_string());
    }
    if id.is_empty() {
        return Ok("0".repeat(16));
    }
    let value: u64 = id
        .parse()
        .map_err(|_| EncodeError::InvalidBlockId(id.to_string()))?;
    Ok(format!("{:016x}", value))
}

impl Block {
    pub fn header(&self) -> &BlockHeader {
        &self.data.header
    }

    pub fn height(&self) -> u32 {
        self.data.header.signed.height
    }

    pub fn to_json(&self) -> Result<BlockJson, EncodeError> {
        Ok(BlockJson {
            id: self.id.clone(),
            id_hex: id_to_hex(&self.id)?,
            serialized: hex::encode(&self.serialized),
            header: self.data.header.clone(),
            previous_block_hex: id_to_hex(&self.data.previous_block)?,
            transactions: self.transactions.iter().map(|tx| tx.data.clone()).collect(),
        })
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Builds blocks from signed sections, bytes or records
#[derive(Clone)]
pub struct BlockFactory {
    codec: BlockCodec,
    transactions: TransactionCodec,
}

impl BlockFactory {
    pub fn new(context: ProtocolContext) -> Self {
        Self {
            codec: BlockCodec::new(context.clone()),
            transactions: TransactionCodec::new(context),
        }
    }

    pub fn codec(&self) -> &BlockCodec {
        &self.codec
    }

    /// Sign a section with the generator's keys
    pub fn make(&self, section: BlockSignedSection, keys: &KeyPair) -> Result<BlockHeader, BlockError> {
        let hash = self.codec.signed_hash(&section)?;
        let signature = keys.sign_ecdsa(&hash)?;
        Ok(BlockHeader {
            signed: section,
            block_signature: hex::encode(signature),
        })
    }

    pub fn from_hex(&self, serialized: &str) -> Result<Block, BlockError> {
        let bytes = hex::decode(serialized)
            .map_err(|_| EncodeError::InvalidHex("block"))?;
        self.from_bytes(&bytes)
    }

    /// Decode a full block, its transactions, and validate it
    pub fn from_bytes(&self, serialized: &[u8]) -> Result<Block, BlockError> {
        let data = self.codec.deserialize_data(serialized)?;

        let transactions = data
            .transactions
            .iter()
            .enumerate()
            .map(|(index, blob)| {
                self.transactions
                    .deserialize(blob, DeserializeOptions::legacy())
                    .map_err(|source| BlockError::Transaction { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.codec.apply_schema(&data, &transactions)?;
        let id = self.codec.get_id(&data.header)?;

        log::debug!(
            "Decoded block {} at height {} with {} transactions",
            id,
            data.height,
            transactions.len()
        );

        Ok(Block {
            data,
            id,
            transactions,
            serialized: serialized.to_vec(),
        })
    }

    /// Build a block from a record by round-tripping it through its bytes
    pub fn from_data(&self, data: &BlockData) -> Result<Block, BlockError> {
        let serialized = self.codec.serialize_data(data)?;
        self.from_bytes(&serialized)
    }
}
