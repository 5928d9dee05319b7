//! Block wire format and identifiers
//!
//! Layout (little-endian unless noted):
//!
//! ```text
//! version u32 | timestamp u32 | height u32
//! previous block id: u64 big-endian (short ids) or [32] (full-hash ids)
//! number of transactions u32 | total amount u64 | total fee u64 | reward u64
//! payload length u32 | payload hash [32] | generator public key [33]
//! block signature: DER, length = byte[1] + 2
//! transaction lengths: u32 x N, then the N transaction blobs
//! ```
//!
//! The previous id width follows the milestone at `height - 1` (clamped to 1).

use bytes::{BufMut, BytesMut};
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::block::{
    id_to_hex, BlockData, BlockError, BlockHeader, BlockSchemaError, BlockSignedSection,
    BLOCK_VERSION_LEGACY, BLOCK_VERSION_VOTES,
};
use super::buffer::{decode_hex_exact, put_hex, put_hex_exact, ByteReader, DecodeError, EncodeError};
use super::schema::{SchemaValidator, BLOCK_SCHEMA};
use super::transaction::Transaction;
use crate::config::ProtocolContext;
use crate::crypto::{sha256, PUBLIC_KEY_SIZE};

/// Default number of cached block ids
pub const DEFAULT_ID_CACHE_SIZE: usize = 10_000;

/// Leading byte of a DER signature
const DER_SEQUENCE_TAG: u8 = 0x30;

const FULL_ID_SIZE: usize = 32;

/// Encoder/decoder for blocks with a content-keyed id cache
#[derive(Clone)]
pub struct BlockCodec {
    context: ProtocolContext,
    schemas: SchemaValidator,
    id_cache: Arc<Mutex<LruCache<Vec<u8>, String>>>,
}

impl BlockCodec {
    pub fn new(context: ProtocolContext) -> Self {
        Self::with_cache_size(context, DEFAULT_ID_CACHE_SIZE)
    }

    pub fn with_cache_size(context: ProtocolContext, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let schemas = SchemaValidator::new(
            context.milestones.clone(),
            context.exceptions.clone(),
            context.types.clone(),
        );
        Self {
            context,
            schemas,
            id_cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn context(&self) -> &ProtocolContext {
        &self.context
    }

    /// Whether the previous block id of a block at `height` is a full hash
    fn previous_id_is_full(&self, height: u32) -> bool {
        let previous = height.saturating_sub(1).max(1);
        self.context.milestones.milestone(previous).id_full_sha256
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    fn write_signed_section(
        &self,
        section: &BlockSignedSection,
        buf: &mut BytesMut,
    ) -> Result<(), EncodeError> {
        buf.put_u32_le(section.version);
        buf.put_u32_le(section.timestamp);
        buf.put_u32_le(section.height);
        self.write_previous_id(section, buf)?;
        buf.put_u32_le(section.number_of_transactions);
        buf.put_u64_le(section.total_amount);
        buf.put_u64_le(section.total_fee);
        buf.put_u64_le(section.reward);
        buf.put_u32_le(section.payload_length);
        put_hex_exact(buf, &section.payload_hash, "payloadHash", 32)?;
        put_hex_exact(
            buf,
            &section.generator_public_key,
            "generatorPublicKey",
            PUBLIC_KEY_SIZE,
        )?;

        if section.version == BLOCK_VERSION_VOTES {
            if let Some(votes) = &section.previous_block_votes {
                if !votes.is_empty() {
                    return Err(EncodeError::UnsupportedVotes);
                }
            }
        }
        Ok(())
    }

    fn write_previous_id(
        &self,
        section: &BlockSignedSection,
        buf: &mut BytesMut,
    ) -> Result<(), EncodeError> {
        let id = section.previous_block.as_str();
        let full = self.previous_id_is_full(section.height);

        match (full, id.is_empty()) {
            (true, true) => buf.put_bytes(0, FULL_ID_SIZE),
            (false, true) => buf.put_u64(0),
            (true, false) => {
                let bytes = decode_hex_exact(id, "previousBlock", FULL_ID_SIZE)
                    .map_err(|_| EncodeError::InvalidBlockId(id.to_string()))?;
                buf.put_slice(&bytes);
            }
            (false, false) => {
                let value: u64 = id
                    .parse()
                    .map_err(|_| EncodeError::InvalidBlockId(id.to_string()))?;
                buf.put_u64(value);
            }
        }
        Ok(())
    }

    /// Bytes covered by the block signature
    pub fn serialize_signed_section(
        &self,
        section: &BlockSignedSection,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut buf = BytesMut::with_capacity(256);
        self.write_signed_section(section, &mut buf)?;
        Ok(buf.to_vec())
    }

    pub fn serialize_header(&self, header: &BlockHeader) -> Result<Vec<u8>, EncodeError> {
        let mut buf = BytesMut::with_capacity(256);
        self.write_signed_section(&header.signed, &mut buf)?;
        put_hex(&mut buf, &header.block_signature, "blockSignature")?;
        Ok(buf.to_vec())
    }

    /// Header, then every transaction length, then every transaction blob
    pub fn serialize_data(&self, data: &BlockData) -> Result<Vec<u8>, EncodeError> {
        let payload: usize = data.transactions.iter().map(Vec::len).sum();
        let mut buf = BytesMut::with_capacity(256 + data.transactions.len() * 4 + payload);
        self.write_signed_section(&data.header.signed, &mut buf)?;
        put_hex(&mut buf, &data.header.block_signature, "blockSignature")?;

        for transaction in &data.transactions {
            let length = u32::try_from(transaction.len()).map_err(|_| EncodeError::TooLong {
                field: "transaction",
                actual: transaction.len(),
                limit: u32::MAX as usize,
            })?;
            buf.put_u32_le(length);
        }
        for transaction in &data.transactions {
            buf.put_slice(transaction);
        }
        Ok(buf.to_vec())
    }

    /// sha256 of the signed section: the digest the generator signs
    pub fn signed_hash(&self, section: &BlockSignedSection) -> Result<[u8; 32], EncodeError> {
        Ok(sha256(&self.serialize_signed_section(section)?))
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    fn read_signed_section(
        &self,
        reader: &mut ByteReader<'_>,
    ) -> Result<BlockSignedSection, DecodeError> {
        let version = reader.read_u32()?;
        if version != BLOCK_VERSION_LEGACY && version != BLOCK_VERSION_VOTES {
            return Err(DecodeError::UnexpectedBlockVersion(version));
        }

        let timestamp = reader.read_u32()?;
        let height = reader.read_u32()?;
        let previous_block = if self.previous_id_is_full(height) {
            reader.read_hex(FULL_ID_SIZE)?
        } else {
            reader.read_u64_be()?.to_string()
        };
        // Genesis has no previous block; zeros are how an empty id is written
        let previous_block = if height <= 1 && previous_block.bytes().all(|b| b == b'0') {
            String::new()
        } else {
            previous_block
        };

        Ok(BlockSignedSection {
            version,
            timestamp,
            height,
            previous_block,
            number_of_transactions: reader.read_u32()?,
            total_amount: reader.read_u64()?,
            total_fee: reader.read_u64()?,
            reward: reader.read_u64()?,
            payload_length: reader.read_u32()?,
            payload_hash: reader.read_hex(32)?,
            generator_public_key: reader.read_hex(PUBLIC_KEY_SIZE)?,
            // Votes have no bytes on the wire yet
            previous_block_votes: (version == BLOCK_VERSION_VOTES).then(Vec::new),
        })
    }

    fn read_block_signature(reader: &mut ByteReader<'_>) -> Result<String, DecodeError> {
        let tag = reader.peek(0)?;
        if tag != DER_SEQUENCE_TAG {
            return Err(DecodeError::NotEcdsaSignature(tag));
        }
        Ok(hex::encode(reader.read_der()?))
    }

    fn read_transactions(
        reader: &mut ByteReader<'_>,
        count: u32,
    ) -> Result<Vec<Vec<u8>>, DecodeError> {
        let count = count as usize;
        let declared = count.saturating_mul(4);
        if declared > reader.remaining() {
            return Err(DecodeError::LengthOutOfBounds {
                declared,
                limit: reader.remaining(),
            });
        }

        let lengths = (0..count)
            .map(|_| reader.read_u32())
            .collect::<Result<Vec<_>, _>>()?;

        lengths
            .into_iter()
            .map(|length| reader.read_bytes(length as usize).map(<[u8]>::to_vec))
            .collect()
    }

    pub fn deserialize_header(&self, serialized: &[u8]) -> Result<BlockHeader, DecodeError> {
        let mut reader = ByteReader::new(serialized);
        let signed = self.read_signed_section(&mut reader)?;
        let block_signature = Self::read_block_signature(&mut reader)?;
        reader.finish()?;
        Ok(BlockHeader {
            signed,
            block_signature,
        })
    }

    pub fn deserialize_data(&self, serialized: &[u8]) -> Result<BlockData, DecodeError> {
        let mut reader = ByteReader::new(serialized);
        let signed = self.read_signed_section(&mut reader)?;
        let block_signature = Self::read_block_signature(&mut reader)?;
        let transactions = Self::read_transactions(&mut reader, signed.number_of_transactions)?;
        reader.finish()?;
        Ok(BlockData {
            header: BlockHeader {
                signed,
                block_signature,
            },
            transactions,
        })
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    /// Canonical block id.
    ///
    /// sha256 of the header bytes, as hex on full-hash networks or as the
    /// decimal of its first 8 bytes (little-endian) otherwise, then mapped
    /// through the override table. Cached by header bytes.
    pub fn get_id(&self, header: &BlockHeader) -> Result<String, EncodeError> {
        let serialized = self.serialize_header(header)?;

        if let Some(id) = self.id_cache.lock().get(&serialized) {
            log::trace!("Block id cache hit for height {}", header.height);
            return Ok(id.clone());
        }

        let hash = sha256(&serialized);
        let computed = if self.context.milestones.milestone(header.height).id_full_sha256 {
            hex::encode(hash)
        } else {
            let mut low = [0u8; 8];
            low.copy_from_slice(&hash[..8]);
            u64::from_le_bytes(low).to_string()
        };
        let id = self.context.exceptions.resolve_block_id(computed);

        self.id_cache.lock().put(serialized, id.clone());
        Ok(id)
    }

    /// Hex form of a block id (16 chars for short ids)
    pub fn id_hex(&self, id: &str) -> Result<String, EncodeError> {
        id_to_hex(id)
    }

    /// Number of ids currently cached
    pub fn cached_ids(&self) -> usize {
        self.id_cache.lock().len()
    }

    // =========================================================================
    // Schema
    // =========================================================================

    /// JSON view used for schema validation: header fields plus decoded
    /// transactions
    pub fn schema_value(
        &self,
        data: &BlockData,
        transactions: &[Transaction],
    ) -> Result<Value, EncodeError> {
        let to_field_error = |e: serde_json::Error| EncodeError::InvalidField {
            field: "block",
            reason: e.to_string(),
        };

        let mut value = serde_json::to_value(&data.header).map_err(to_field_error)?;
        let transactions = transactions
            .iter()
            .map(|tx| serde_json::to_value(&tx.data))
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_field_error)?;
        if let Some(object) = value.as_object_mut() {
            object.insert("transactions".to_string(), Value::Array(transactions));
        }
        Ok(value)
    }

    /// Validate a block against the block schema.
    ///
    /// Violations inside a whitelisted transaction are skipped. Any other
    /// violation is forgiven when the block itself is whitelisted, and is
    /// otherwise a [`BlockSchemaError`].
    pub fn apply_schema(
        &self,
        data: &BlockData,
        transactions: &[Transaction],
    ) -> Result<(), BlockError> {
        let value = self.schema_value(data, transactions)?;
        let errors = self.schemas.validate(BLOCK_SCHEMA, &value);

        for error in errors {
            let transaction = transaction_index(&error.data_path).and_then(|i| transactions.get(i));
            if let Some(transaction) = transaction {
                if self.context.exceptions.is_exception_transaction(&transaction.id) {
                    log::warn!(
                        "Ignoring schema error in whitelisted transaction {}: {}",
                        transaction.id,
                        error
                    );
                    continue;
                }
            }

            if self.is_exception_block(data, transactions)? {
                log::warn!(
                    "Ignoring schema errors in whitelisted block at height {}",
                    data.height
                );
                break;
            }

            let at = if error.data_path.is_empty() {
                String::new()
            } else {
                format!(" at {}", error.data_path)
            };
            return Err(BlockSchemaError {
                height: data.height,
                message: format!("Invalid data{}: {}: {}", at, error.message, error.data),
            }
            .into());
        }
        Ok(())
    }

    /// Whether the block is on the exception whitelist
    pub fn is_exception_block(
        &self,
        data: &BlockData,
        transactions: &[Transaction],
    ) -> Result<bool, EncodeError> {
        let id = self.get_id(&data.header)?;
        let ids: Vec<String> = transactions.iter().map(|tx| tx.id.clone()).collect();
        Ok(self.context.exceptions.is_exception_block(&id, &ids))
    }
}

/// Index `i` of a `.transactions[i]...` data path
fn transaction_index(data_path: &str) -> Option<usize> {
    let rest = data_path.strip_prefix(".transactions[")?;
    let end = rest.find(']')?;
    rest[..end].parse().ok()
}
