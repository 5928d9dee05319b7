//! Transaction type registry
//!
//! Each transaction type is described by a capability record: which schema
//! validates it, whether it carries a vendor field, and how its asset bytes
//! are read and written. The registry maps `(type, type group, version)` to
//! that record; the codec never branches on concrete types itself.

use bytes::{BufMut, BytesMut};
use std::collections::HashMap;
use std::fmt;

use super::buffer::{put_hex_exact, ByteReader, DecodeError, EncodeError};
use super::transaction::{
    CoreTransactionType, LegacyMultiSignatureAsset, TransactionAsset, TransactionData,
    CORE_TYPE_GROUP,
};
use crate::config::ConfigError;
use crate::crypto::{address_from_bytes, address_to_bytes, ADDRESS_SIZE, PUBLIC_KEY_SIZE};
use crate::multisig::MultiSignatureAsset;

/// Reads a type's asset bytes into the record
pub type DeserializeAssetFn = fn(&mut ByteReader<'_>, &mut TransactionData) -> Result<(), DecodeError>;

/// Writes a type's asset bytes
pub type SerializeAssetFn = fn(&TransactionData, &mut BytesMut) -> Result<(), EncodeError>;

/// Lookup key of a transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionTypeKey {
    pub type_id: u16,
    pub type_group: u32,
    pub version: u8,
}

/// Capability record of one transaction type
#[derive(Clone, Copy)]
pub struct TransactionTypeHandler {
    pub key: TransactionTypeKey,
    /// Lenient schema id; the strict variant is `{schema_id}Strict`
    pub schema_id: &'static str,
    pub has_vendor_field: bool,
    pub deserialize_asset: DeserializeAssetFn,
    pub serialize_asset: SerializeAssetFn,
}

impl fmt::Debug for TransactionTypeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionTypeHandler")
            .field("key", &self.key)
            .field("schema_id", &self.schema_id)
            .field("has_vendor_field", &self.has_vendor_field)
            .finish()
    }
}

/// Registered transaction types
#[derive(Debug, Clone, Default)]
pub struct TransactionTypeRegistry {
    handlers: HashMap<TransactionTypeKey, TransactionTypeHandler>,
}

impl TransactionTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in types for both transaction versions
    pub fn with_core_types() -> Self {
        let mut registry = Self::new();
        for handler in core_handlers() {
            registry.handlers.insert(handler.key, handler);
        }
        registry
    }

    /// Add a type. Keys are unique.
    pub fn register(&mut self, handler: TransactionTypeHandler) -> Result<(), ConfigError> {
        if self.handlers.contains_key(&handler.key) {
            return Err(ConfigError::Invalid(format!(
                "transaction type {} in group {} (version {}) is already registered",
                handler.key.type_id, handler.key.type_group, handler.key.version
            )));
        }
        self.handlers.insert(handler.key, handler);
        Ok(())
    }

    pub fn get(&self, type_id: u16, type_group: u32, version: u8) -> Option<&TransactionTypeHandler> {
        self.handlers.get(&TransactionTypeKey {
            type_id,
            type_group,
            version,
        })
    }

    /// Handler for a record's type, group and version
    pub fn for_data(&self, data: &TransactionData) -> Option<&TransactionTypeHandler> {
        self.get(data.type_id, data.effective_type_group(), data.version)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

// =============================================================================
// Core handlers
// =============================================================================

fn core_handler(
    kind: CoreTransactionType,
    version: u8,
    schema_id: &'static str,
    has_vendor_field: bool,
    deserialize_asset: DeserializeAssetFn,
    serialize_asset: SerializeAssetFn,
) -> TransactionTypeHandler {
    TransactionTypeHandler {
        key: TransactionTypeKey {
            type_id: kind as u16,
            type_group: CORE_TYPE_GROUP,
            version,
        },
        schema_id,
        has_vendor_field,
        deserialize_asset,
        serialize_asset,
    }
}

fn core_handlers() -> Vec<TransactionTypeHandler> {
    let mut handlers = Vec::new();
    for version in [1u8, 2] {
        handlers.push(core_handler(
            CoreTransactionType::Transfer,
            version,
            "transfer",
            true,
            read_transfer,
            write_transfer,
        ));
        handlers.push(core_handler(
            CoreTransactionType::SecondSignature,
            version,
            "secondSignature",
            false,
            read_second_signature,
            write_second_signature,
        ));
        handlers.push(core_handler(
            CoreTransactionType::DelegateRegistration,
            version,
            "delegateRegistration",
            false,
            read_delegate_registration,
            write_delegate_registration,
        ));
        handlers.push(core_handler(
            CoreTransactionType::Vote,
            version,
            "vote",
            false,
            read_vote,
            write_vote,
        ));
    }

    handlers.push(core_handler(
        CoreTransactionType::MultiSignature,
        1,
        "multiSignatureLegacy",
        false,
        read_legacy_multi_signature,
        write_legacy_multi_signature,
    ));
    handlers.push(core_handler(
        CoreTransactionType::MultiSignature,
        2,
        "multiSignature",
        false,
        read_multi_signature,
        write_multi_signature,
    ));
    handlers
}

fn missing_asset(expected: &'static str) -> EncodeError {
    EncodeError::MissingField(expected)
}

// Transfer: amount u64, expiration u32, 21-byte recipient address

fn read_transfer(reader: &mut ByteReader<'_>, data: &mut TransactionData) -> Result<(), DecodeError> {
    data.amount = reader.read_u64()?;
    data.expiration = Some(reader.read_u32()?);

    let mut recipient = [0u8; ADDRESS_SIZE];
    recipient.copy_from_slice(reader.read_bytes(ADDRESS_SIZE)?);
    data.recipient_id = Some(address_from_bytes(&recipient));
    Ok(())
}

fn write_transfer(data: &TransactionData, buf: &mut BytesMut) -> Result<(), EncodeError> {
    let recipient = data
        .recipient_id
        .as_deref()
        .ok_or(EncodeError::MissingField("recipientId"))?;
    let recipient = address_to_bytes(recipient).map_err(|e| EncodeError::InvalidField {
        field: "recipientId",
        reason: e.to_string(),
    })?;

    buf.put_u64_le(data.amount);
    buf.put_u32_le(data.expiration.unwrap_or(0));
    buf.put_slice(&recipient);
    Ok(())
}

// Second signature registration: 33-byte public key

fn read_second_signature(
    reader: &mut ByteReader<'_>,
    data: &mut TransactionData,
) -> Result<(), DecodeError> {
    data.asset = Some(TransactionAsset::Signature {
        public_key: reader.read_hex(PUBLIC_KEY_SIZE)?,
    });
    Ok(())
}

fn write_second_signature(data: &TransactionData, buf: &mut BytesMut) -> Result<(), EncodeError> {
    match &data.asset {
        Some(TransactionAsset::Signature { public_key }) => {
            put_hex_exact(buf, public_key, "asset.signature.publicKey", PUBLIC_KEY_SIZE)
        }
        _ => Err(missing_asset("asset.signature")),
    }
}

// Delegate registration: username length u8 + UTF-8 bytes

fn read_delegate_registration(
    reader: &mut ByteReader<'_>,
    data: &mut TransactionData,
) -> Result<(), DecodeError> {
    let length = reader.read_u8()? as usize;
    let username = std::str::from_utf8(reader.read_bytes(length)?)
        .map_err(|_| DecodeError::InvalidUtf8("asset.delegate.username"))?;
    data.asset = Some(TransactionAsset::Delegate {
        username: username.to_string(),
    });
    Ok(())
}

fn write_delegate_registration(
    data: &TransactionData,
    buf: &mut BytesMut,
) -> Result<(), EncodeError> {
    let Some(TransactionAsset::Delegate { username }) = &data.asset else {
        return Err(missing_asset("asset.delegate"));
    };
    if username.len() > u8::MAX as usize {
        return Err(EncodeError::TooLong {
            field: "asset.delegate.username",
            actual: username.len(),
            limit: u8::MAX as usize,
        });
    }
    buf.put_u8(username.len() as u8);
    buf.put_slice(username.as_bytes());
    Ok(())
}

// Vote: count u8, then per vote a prefix byte (01 = '+', 00 = '-') and a key

fn read_vote(reader: &mut ByteReader<'_>, data: &mut TransactionData) -> Result<(), DecodeError> {
    let count = reader.read_u8()? as usize;
    if count * (PUBLIC_KEY_SIZE + 1) > reader.remaining() {
        return Err(DecodeError::LengthOutOfBounds {
            declared: count * (PUBLIC_KEY_SIZE + 1),
            limit: reader.remaining(),
        });
    }

    let mut votes = Vec::with_capacity(count);
    for _ in 0..count {
        let sign = match reader.read_u8()? {
            0x01 => '+',
            0x00 => '-',
            other => {
                return Err(DecodeError::InvalidTransactionBytes(format!(
                    "invalid vote prefix {:#04x}",
                    other
                )))
            }
        };
        votes.push(format!("{}{}", sign, reader.read_hex(PUBLIC_KEY_SIZE)?));
    }
    data.asset = Some(TransactionAsset::Votes(votes));
    Ok(())
}

fn write_vote(data: &TransactionData, buf: &mut BytesMut) -> Result<(), EncodeError> {
    let Some(TransactionAsset::Votes(votes)) = &data.asset else {
        return Err(missing_asset("asset.votes"));
    };
    if votes.len() > u8::MAX as usize {
        return Err(EncodeError::TooLong {
            field: "asset.votes",
            actual: votes.len(),
            limit: u8::MAX as usize,
        });
    }

    buf.put_u8(votes.len() as u8);
    for vote in votes {
        let (prefix, key) = if let Some(key) = vote.strip_prefix('+') {
            (0x01, key)
        } else if let Some(key) = vote.strip_prefix('-') {
            (0x00, key)
        } else {
            return Err(EncodeError::InvalidField {
                field: "asset.votes",
                reason: format!("vote '{}' must start with '+' or '-'", vote),
            });
        };
        buf.put_u8(prefix);
        put_hex_exact(buf, key, "asset.votes", PUBLIC_KEY_SIZE)?;
    }
    Ok(())
}

// Multi-signature registration: min u8, count u8, keys

fn read_public_keys(
    reader: &mut ByteReader<'_>,
    count: usize,
) -> Result<Vec<String>, DecodeError> {
    if count * PUBLIC_KEY_SIZE > reader.remaining() {
        return Err(DecodeError::LengthOutOfBounds {
            declared: count * PUBLIC_KEY_SIZE,
            limit: reader.remaining(),
        });
    }
    (0..count).map(|_| reader.read_hex(PUBLIC_KEY_SIZE)).collect()
}

fn read_multi_signature(
    reader: &mut ByteReader<'_>,
    data: &mut TransactionData,
) -> Result<(), DecodeError> {
    let min = reader.read_u8()?;
    let count = reader.read_u8()? as usize;
    let public_keys = read_public_keys(reader, count)?;
    data.asset = Some(TransactionAsset::MultiSignature(MultiSignatureAsset {
        min,
        public_keys,
    }));
    Ok(())
}

fn write_multi_signature(data: &TransactionData, buf: &mut BytesMut) -> Result<(), EncodeError> {
    let Some(asset) = data.multi_signature_asset() else {
        return Err(missing_asset("asset.multiSignature"));
    };
    if asset.public_keys.len() > u8::MAX as usize {
        return Err(EncodeError::TooLong {
            field: "asset.multiSignature.publicKeys",
            actual: asset.public_keys.len(),
            limit: u8::MAX as usize,
        });
    }

    buf.put_u8(asset.min);
    buf.put_u8(asset.public_keys.len() as u8);
    for key in &asset.public_keys {
        put_hex_exact(buf, key, "asset.multiSignature.publicKeys", PUBLIC_KEY_SIZE)?;
    }
    Ok(())
}

// Legacy multi-signature registration: min u8, count u8, lifetime u8, keys

fn read_legacy_multi_signature(
    reader: &mut ByteReader<'_>,
    data: &mut TransactionData,
) -> Result<(), DecodeError> {
    let min = reader.read_u8()?;
    let count = reader.read_u8()? as usize;
    let lifetime = reader.read_u8()?;
    let keysgroup = read_public_keys(reader, count)?;
    data.asset = Some(TransactionAsset::MultiSignatureLegacy(LegacyMultiSignatureAsset {
        min,
        lifetime,
        keysgroup,
    }));
    Ok(())
}

fn write_legacy_multi_signature(
    data: &TransactionData,
    buf: &mut BytesMut,
) -> Result<(), EncodeError> {
    let Some(TransactionAsset::MultiSignatureLegacy(legacy)) = &data.asset else {
        return Err(missing_asset("asset.multiSignatureLegacy"));
    };
    if legacy.keysgroup.len() > u8::MAX as usize {
        return Err(EncodeError::TooLong {
            field: "asset.multiSignatureLegacy.keysgroup",
            actual: legacy.keysgroup.len(),
            limit: u8::MAX as usize,
        });
    }

    buf.put_u8(legacy.min);
    buf.put_u8(legacy.keysgroup.len() as u8);
    buf.put_u8(legacy.lifetime);
    for key in &legacy.keysgroup {
        let key = key.strip_prefix('+').unwrap_or(key);
        put_hex_exact(buf, key, "asset.multiSignatureLegacy.keysgroup", PUBLIC_KEY_SIZE)?;
    }
    Ok(())
}
