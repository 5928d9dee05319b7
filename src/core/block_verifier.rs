//! Block verification
//!
//! Every check runs; failures are collected rather than short-circuited so
//! the caller sees all of a block's problems at once. An empty list means
//! the block is valid.

use thiserror::Error;

use super::block::{BlockData, BlockHeader};
use super::block_codec::BlockCodec;
use super::transaction_codec::DeserializeOptions;
use super::transaction_verifier::TransactionVerifier;
use crate::config::ProtocolContext;
use crate::crypto::verify_ecdsa;

/// One block verification failure. `Display` is the diagnostic string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockPayloadError {
    #[error("Invalid previous block")]
    InvalidPreviousBlock,
    #[error("Invalid block reward: {actual}, expected: {expected}")]
    InvalidReward { actual: u64, expected: u64 },
    #[error("Missing block signature")]
    MissingSignature,
    #[error("Invalid block signature")]
    InvalidSignature,
    #[error("Invalid block version")]
    InvalidVersion,
    #[error("Invalid block timestamp")]
    InvalidTimestamp,
    #[error("Payload is too large: {size} > {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("Invalid transaction {index}: {reason}")]
    InvalidTransaction { index: usize, reason: String },
    #[error("{0}")]
    Unexpected(String),
}

#[derive(Clone)]
pub struct BlockVerifier {
    context: ProtocolContext,
    codec: BlockCodec,
    transactions: TransactionVerifier,
}

impl BlockVerifier {
    pub fn new(context: ProtocolContext) -> Self {
        Self {
            codec: BlockCodec::new(context.clone()),
            transactions: TransactionVerifier::new(context.clone()),
            context,
        }
    }

    /// Diagnostic strings for every failed check
    pub fn verify(&self, data: &BlockData) -> Vec<String> {
        self.verify_payload(data)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Every failed check, in check order
    pub fn verify_payload(&self, data: &BlockData) -> Vec<BlockPayloadError> {
        let mut errors = Vec::new();
        let milestone = self.context.milestones.milestone(data.height);

        if data.height != 1 && data.previous_block.is_empty() {
            errors.push(BlockPayloadError::InvalidPreviousBlock);
        }

        if data.reward != milestone.reward {
            errors.push(BlockPayloadError::InvalidReward {
                actual: data.reward,
                expected: milestone.reward,
            });
        }

        if let Some(error) = self.verify_signature(&data.header) {
            errors.push(error);
        }

        if data.version != milestone.version {
            errors.push(BlockPayloadError::InvalidVersion);
        }

        let latest = self.context.clock.now() as u64 + milestone.blocktime as u64;
        if data.timestamp as u64 > latest {
            errors.push(BlockPayloadError::InvalidTimestamp);
        }

        match self.codec.serialize_data(data) {
            Ok(serialized) if serialized.len() > milestone.max_payload => {
                errors.push(BlockPayloadError::PayloadTooLarge {
                    size: serialized.len(),
                    limit: milestone.max_payload,
                });
            }
            Ok(_) => {}
            Err(e) => errors.push(BlockPayloadError::Unexpected(e.to_string())),
        }

        for (index, blob) in data.transactions.iter().enumerate() {
            if let Some(reason) = self.verify_transaction(blob, data.height) {
                errors.push(BlockPayloadError::InvalidTransaction { index, reason });
            }
        }

        if !errors.is_empty() {
            log::warn!(
                "Block at height {} failed {} checks",
                data.height,
                errors.len()
            );
        }
        errors
    }

    /// Check the generator's DER signature over the signed section
    pub fn verify_signature(&self, header: &BlockHeader) -> Option<BlockPayloadError> {
        if header.block_signature.is_empty() {
            return Some(BlockPayloadError::MissingSignature);
        }

        let hash = match self.codec.signed_hash(&header.signed) {
            Ok(hash) => hash,
            Err(e) => return Some(BlockPayloadError::Unexpected(e.to_string())),
        };
        let (Ok(signature), Ok(public_key)) = (
            hex::decode(&header.block_signature),
            hex::decode(&header.generator_public_key),
        ) else {
            return Some(BlockPayloadError::InvalidSignature);
        };

        if !verify_ecdsa(&hash, &signature, &public_key) {
            return Some(BlockPayloadError::InvalidSignature);
        }
        None
    }

    /// Reason a transaction in a block at `height` is invalid, if it is
    fn verify_transaction(&self, blob: &[u8], height: u32) -> Option<String> {
        let transaction = match self
            .transactions
            .codec()
            .deserialize(blob, DeserializeOptions::legacy())
        {
            Ok(transaction) => transaction,
            Err(e) => return Some(e.to_string()),
        };

        match self.transactions.verify_at(&transaction.data, height) {
            Ok(true) => None,
            Ok(false)
                if transaction.data.version <= 1
                    && self.context.milestones.milestone(height).multisig_activated =>
            {
                Some(format!(
                    "version {} transaction {} not accepted at height {}",
                    transaction.data.version, transaction.id, height
                ))
            }
            Ok(false) => Some(format!("invalid signature on {}", transaction.id)),
            Err(e) => Some(e.to_string()),
        }
    }
}
