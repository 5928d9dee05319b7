//! Transaction wire format
//!
//! Layout (little-endian):
//!
//! ```text
//! marker u8 (0xff) | version u8 | network u8
//! v1:  type u8 | timestamp u32
//! v2+: type group u32 | type u16 | nonce u64
//! sender public key [33] | fee u64
//! vendor field length u8 | vendor field [N]
//! asset (type specific)
//! signatures (variable shape, runs to the end of the buffer)
//! ```
//!
//! The signature section carries no length prefix. Its shape is recovered
//! from the number of bytes left: DER signatures are self-delimiting,
//! Schnorr signatures are 64 bytes and participant entries are 65.

use bitflags::bitflags;
use bytes::{BufMut, BytesMut};
use std::collections::HashSet;

use super::buffer::{put_hex, put_hex_exact, ByteReader, DecodeError, EncodeError};
use super::transaction::{
    Transaction, TransactionData, TransactionError, LEGACY_MULTISIG_MARKER, TRANSACTION_MARKER,
};
use super::types::TransactionTypeHandler;
use crate::config::ProtocolContext;
use crate::crypto::{sha256, KeyPair, PUBLIC_KEY_SIZE, SCHNORR_SIGNATURE_SIZE};
use crate::multisig::{MultiSignatureEntry, MultisigError, ENTRY_SIZE};

bitflags! {
    /// Signature fields left out of a serialization
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SignatureExclusions: u8 {
        const SIGNATURE = 0b001;
        const SECOND_SIGNATURE = 0b010;
        const MULTI_SIGNATURE = 0b100;
    }
}

impl SignatureExclusions {
    /// Bytes signed by the sender
    pub const PRIMARY: Self = Self::SIGNATURE.union(Self::SECOND_SIGNATURE);
    /// Bytes signed by the second key
    pub const SECOND: Self = Self::SECOND_SIGNATURE;
    /// Bytes signed by multi-signature participants
    pub const MULTI: Self = Self::all();
}

/// Decode leniency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeserializeOptions {
    /// Accept versions older than the active milestone supports
    pub accept_legacy_version: bool,
    /// Skip the version gate entirely
    pub disable_version_check: bool,
}

impl DeserializeOptions {
    pub fn legacy() -> Self {
        Self {
            accept_legacy_version: true,
            disable_version_check: false,
        }
    }
}

/// Encoder/decoder for transactions
#[derive(Clone)]
pub struct TransactionCodec {
    context: ProtocolContext,
}

impl TransactionCodec {
    pub fn new(context: ProtocolContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ProtocolContext {
        &self.context
    }

    /// Version accepted under the active milestone: 2 once quorum
    /// multi-signatures are active, 1 before.
    pub fn is_supported_version(&self, version: u8) -> bool {
        let supported = if self.context.milestones.active().multisig_activated {
            2
        } else {
            1
        };
        version == supported
    }

    fn handler(&self, data: &TransactionData) -> Result<&TransactionTypeHandler, TransactionError> {
        self.context
            .types
            .for_data(data)
            .ok_or(TransactionError::UnknownType {
                type_id: data.type_id,
                type_group: data.effective_type_group(),
                version: data.version,
            })
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    pub fn deserialize_hex(
        &self,
        serialized: &str,
        options: DeserializeOptions,
    ) -> Result<Transaction, TransactionError> {
        let bytes = hex::decode(serialized).map_err(|e| {
            DecodeError::InvalidTransactionBytes(format!("invalid hex: {}", e))
        })?;
        self.deserialize(&bytes, options)
    }

    /// Decode a transaction that spans the whole of `serialized`
    pub fn deserialize(
        &self,
        serialized: &[u8],
        options: DeserializeOptions,
    ) -> Result<Transaction, TransactionError> {
        let mut reader = ByteReader::new(serialized);
        let mut data = TransactionData::default();

        read_common(&mut reader, &mut data)?;

        let type_group = data.effective_type_group();
        let handler = self
            .context
            .types
            .get(data.type_id, type_group, data.version)
            .ok_or(DecodeError::UnknownTransactionType {
                type_id: data.type_id,
                type_group,
                version: data.version,
            })?;

        read_vendor_field(&mut reader, &mut data, handler.has_vendor_field)?;
        (handler.deserialize_asset)(&mut reader, &mut data)?;
        read_signatures(&mut reader, &mut data)?;
        reader.finish()?;

        if !options.accept_legacy_version
            && !options.disable_version_check
            && !self.is_supported_version(data.version)
        {
            return Err(TransactionError::UnsupportedVersion(data.version));
        }

        if data.version == 1 {
            data.apply_v1_compatibility();
        }

        let serialized = reader.consumed().to_vec();
        let id = hex::encode(sha256(&serialized));
        data.id = Some(id.clone());

        log::debug!(
            "Decoded v{} transaction {} (type {}, {} bytes)",
            data.version,
            id,
            data.type_id,
            serialized.len()
        );

        Ok(Transaction {
            data,
            serialized,
            id,
        })
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Canonical bytes of a record, leaving out the excluded signatures
    pub fn serialize(
        &self,
        data: &TransactionData,
        exclusions: SignatureExclusions,
    ) -> Result<Vec<u8>, TransactionError> {
        let handler = self.handler(data)?;
        let mut buf = BytesMut::with_capacity(256);

        write_common(data, &mut buf)?;
        write_vendor_field(data, &mut buf, handler.has_vendor_field)?;
        (handler.serialize_asset)(data, &mut buf)?;
        write_signatures(data, &mut buf, exclusions)?;

        Ok(buf.to_vec())
    }

    /// sha256 of the canonical bytes with the given exclusions
    pub fn to_hash(
        &self,
        data: &TransactionData,
        exclusions: SignatureExclusions,
    ) -> Result<[u8; 32], TransactionError> {
        Ok(sha256(&self.serialize(data, exclusions)?))
    }

    /// Transaction id: lowercase hex sha256 of the full canonical bytes
    pub fn get_id(&self, data: &TransactionData) -> Result<String, TransactionError> {
        Ok(hex::encode(self.to_hash(data, SignatureExclusions::empty())?))
    }

    /// Build a transaction from a record, filling in its id
    pub fn from_data(&self, mut data: TransactionData) -> Result<Transaction, TransactionError> {
        let serialized = self.serialize(&data, SignatureExclusions::empty())?;
        let id = hex::encode(sha256(&serialized));
        data.id = Some(id.clone());
        Ok(Transaction {
            data,
            serialized,
            id,
        })
    }

    // =========================================================================
    // Signing
    // =========================================================================

    /// Sign as sender: DER ECDSA for v1, Schnorr from v2
    pub fn sign(&self, data: &mut TransactionData, keys: &KeyPair) -> Result<(), TransactionError> {
        let hash = self.to_hash(data, SignatureExclusions::PRIMARY)?;
        data.signature = Some(sign_hash(data.version, &hash, keys)?);
        Ok(())
    }

    /// Add the second signature over the sender-signed bytes
    pub fn second_sign(
        &self,
        data: &mut TransactionData,
        keys: &KeyPair,
    ) -> Result<(), TransactionError> {
        let hash = self.to_hash(data, SignatureExclusions::SECOND)?;
        data.second_signature = Some(sign_hash(data.version, &hash, keys)?);
        Ok(())
    }

    /// Append a participant entry signed by the key at `index`
    pub fn multi_sign(
        &self,
        data: &mut TransactionData,
        keys: &KeyPair,
        index: u8,
    ) -> Result<(), TransactionError> {
        let hash = self.to_hash(data, SignatureExclusions::MULTI)?;
        let entry = MultiSignatureEntry {
            index,
            signature: keys.sign_schnorr(&hash)?,
        };
        data.signatures
            .get_or_insert_with(Vec::new)
            .push(entry.to_hex());
        Ok(())
    }
}

fn sign_hash(version: u8, hash: &[u8; 32], keys: &KeyPair) -> Result<String, TransactionError> {
    if version <= 1 {
        Ok(hex::encode(keys.sign_ecdsa(hash)?))
    } else {
        Ok(hex::encode(keys.sign_schnorr(hash)?))
    }
}

// =============================================================================
// Common fields
// =============================================================================

fn read_common(reader: &mut ByteReader<'_>, data: &mut TransactionData) -> Result<(), DecodeError> {
    reader.skip(1)?;
    data.version = reader.read_u8()?;
    data.network = reader.read_u8()?;

    if data.version == 1 {
        data.type_id = reader.read_u8()? as u16;
        data.timestamp = Some(reader.read_u32()?);
    } else {
        data.type_group = Some(reader.read_u32()?);
        data.type_id = reader.read_u16()?;
        data.nonce = Some(reader.read_u64()?);
    }

    data.sender_public_key = reader.read_hex(PUBLIC_KEY_SIZE)?;
    data.fee = reader.read_u64()?;
    data.amount = 0;
    Ok(())
}

fn write_common(data: &TransactionData, buf: &mut BytesMut) -> Result<(), EncodeError> {
    buf.put_u8(TRANSACTION_MARKER);
    buf.put_u8(data.version);
    buf.put_u8(data.network);

    if data.version == 1 {
        let type_id = u8::try_from(data.type_id).map_err(|_| EncodeError::InvalidField {
            field: "type",
            reason: format!("{} does not fit a v1 type byte", data.type_id),
        })?;
        buf.put_u8(type_id);
        buf.put_u32_le(data.timestamp.ok_or(EncodeError::MissingField("timestamp"))?);
    } else {
        buf.put_u32_le(data.effective_type_group());
        buf.put_u16_le(data.type_id);
        buf.put_u64_le(data.nonce.ok_or(EncodeError::MissingField("nonce"))?);
    }

    put_hex_exact(buf, &data.sender_public_key, "senderPublicKey", PUBLIC_KEY_SIZE)?;
    buf.put_u64_le(data.fee);
    Ok(())
}

// =============================================================================
// Vendor field
// =============================================================================

fn read_vendor_field(
    reader: &mut ByteReader<'_>,
    data: &mut TransactionData,
    supported: bool,
) -> Result<(), DecodeError> {
    let length = reader.read_u8()? as usize;
    if length == 0 {
        return Ok(());
    }

    if supported {
        let bytes = reader.read_bytes(length)?;
        let vendor_field =
            std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8("vendorField"))?;
        data.vendor_field = Some(vendor_field.to_string());
    } else {
        reader.skip(length)?;
    }
    Ok(())
}

fn write_vendor_field(
    data: &TransactionData,
    buf: &mut BytesMut,
    supported: bool,
) -> Result<(), EncodeError> {
    match data.vendor_field.as_deref() {
        Some(vendor_field) if supported && !vendor_field.is_empty() => {
            if vendor_field.len() > u8::MAX as usize {
                return Err(EncodeError::TooLong {
                    field: "vendorField",
                    actual: vendor_field.len(),
                    limit: u8::MAX as usize,
                });
            }
            buf.put_u8(vendor_field.len() as u8);
            buf.put_slice(vendor_field.as_bytes());
        }
        _ => buf.put_u8(0),
    }
    Ok(())
}

// =============================================================================
// Signatures
// =============================================================================

fn read_signatures(
    reader: &mut ByteReader<'_>,
    data: &mut TransactionData,
) -> Result<(), TransactionError> {
    if data.version != 1 && detect_schnorr(reader.remaining()) {
        read_schnorr(reader, data)
    } else {
        read_ecdsa(reader, data)?;
        Ok(())
    }
}

/// Whether the remaining byte count fits a Schnorr signature section:
/// one or two signatures, participant entries, or signatures followed by
/// entries.
fn detect_schnorr(remaining: usize) -> bool {
    let sig = SCHNORR_SIGNATURE_SIZE;
    if remaining == sig || remaining == sig * 2 {
        return true;
    }
    if remaining % ENTRY_SIZE == 0 {
        return true;
    }
    (remaining >= sig && (remaining - sig) % ENTRY_SIZE == 0)
        || (remaining >= sig * 2 && (remaining - sig * 2) % ENTRY_SIZE == 0)
}

fn read_ecdsa(reader: &mut ByteReader<'_>, data: &mut TransactionData) -> Result<(), DecodeError> {
    if reader.has_remaining() {
        data.signature = Some(hex::encode(reader.read_der()?));
    }

    if reader.has_remaining() && reader.peek(0)? != LEGACY_MULTISIG_MARKER {
        data.second_signature = Some(hex::encode(reader.read_der()?));
    }

    if reader.has_remaining() && reader.peek(0)? == LEGACY_MULTISIG_MARKER {
        reader.skip(1)?;
        let blob = reader.read_bytes(reader.remaining())?;
        data.signatures = Some(vec![hex::encode(blob)]);
    }

    if reader.has_remaining() {
        return Err(DecodeError::InvalidTransactionBytes(
            "signature buffer not exhausted".to_string(),
        ));
    }
    Ok(())
}

fn read_schnorr(
    reader: &mut ByteReader<'_>,
    data: &mut TransactionData,
) -> Result<(), TransactionError> {
    let can_read_single = |remaining: usize| {
        remaining > 0
            && (remaining % SCHNORR_SIGNATURE_SIZE == 0 || remaining % ENTRY_SIZE != 0)
    };

    if can_read_single(reader.remaining()) {
        data.signature = Some(reader.read_hex(SCHNORR_SIGNATURE_SIZE)?);
    }

    if can_read_single(reader.remaining()) {
        data.second_signature = Some(reader.read_hex(SCHNORR_SIGNATURE_SIZE)?);
    }

    if !reader.has_remaining() {
        return Ok(());
    }

    if reader.remaining() % ENTRY_SIZE != 0 {
        return Err(DecodeError::InvalidTransactionBytes(
            "signature buffer not exhausted".to_string(),
        )
        .into());
    }

    let count = reader.remaining() / ENTRY_SIZE;
    let mut indexes = HashSet::with_capacity(count);
    let mut signatures = Vec::with_capacity(count);
    for _ in 0..count {
        let index = reader.peek(0)?;
        let entry = reader.read_bytes(ENTRY_SIZE)?;
        if !indexes.insert(index) {
            return Err(MultisigError::DuplicateParticipant(index).into());
        }
        signatures.push(hex::encode(entry));
    }
    data.signatures = Some(signatures);
    Ok(())
}

fn write_signatures(
    data: &TransactionData,
    buf: &mut BytesMut,
    exclusions: SignatureExclusions,
) -> Result<(), EncodeError> {
    if !exclusions.contains(SignatureExclusions::SIGNATURE) {
        if let Some(signature) = &data.signature {
            put_hex(buf, signature, "signature")?;
        }
    }

    if !exclusions.contains(SignatureExclusions::SECOND_SIGNATURE) {
        if let Some(second_signature) = data.second_signature() {
            put_hex(buf, second_signature, "secondSignature")?;
        }
    }

    if !exclusions.contains(SignatureExclusions::MULTI_SIGNATURE) {
        if let Some(signatures) = &data.signatures {
            if data.version == 1 {
                buf.put_u8(LEGACY_MULTISIG_MARKER);
                for blob in signatures {
                    put_hex(buf, blob, "signatures")?;
                }
            } else {
                for entry in signatures {
                    put_hex_exact(buf, entry, "signatures", ENTRY_SIZE)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MilestoneSchedule, NetworkConfig};
    use crate::core::transaction::{CoreTransactionType, TransactionAsset, CORE_TYPE_GROUP};
    use crate::multisig::MultiSignatureAsset;
    use std::sync::Arc;

    fn codec(multisig_activated: bool) -> TransactionCodec {
        let mut config = NetworkConfig::devnet();
        config.current_height = Some(if multisig_activated { 20 } else { 1 });
        TransactionCodec::new(ProtocolContext::from_config(&config).unwrap())
    }

    fn transfer(version: u8, keys: &KeyPair) -> TransactionData {
        TransactionData {
            version,
            network: 0x1e,
            type_group: if version == 1 { None } else { Some(CORE_TYPE_GROUP) },
            type_id: CoreTransactionType::Transfer as u16,
            timestamp: if version == 1 { Some(1_000) } else { None },
            nonce: if version == 1 { None } else { Some(3) },
            sender_public_key: keys.public_key_hex(),
            fee: 10_000_000,
            amount: 250_000_000,
            expiration: Some(0),
            recipient_id: Some(KeyPair::generate().address(0x1e)),
            vendor_field: Some("hello".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_v2_round_trip() {
        let codec = codec(true);
        let keys = KeyPair::generate();
        let mut data = transfer(2, &keys);
        codec.sign(&mut data, &keys).unwrap();

        let bytes = codec.serialize(&data, SignatureExclusions::empty()).unwrap();
        let tx = codec.deserialize(&bytes, DeserializeOptions::default()).unwrap();

        assert_eq!(tx.serialized, bytes);
        assert_eq!(tx.id, codec.get_id(&data).unwrap());
        assert_eq!(tx.data.amount, data.amount);
        assert_eq!(tx.data.vendor_field.as_deref(), Some("hello"));
        assert_eq!(tx.data.signature, data.signature);
        assert_eq!(tx.data.nonce, Some(3));
        assert_eq!(tx.data.signature.as_ref().unwrap().len(), 128);
    }

    #[test]
    fn test_v1_round_trip_with_second_signature() {
        let codec = codec(false);
        let keys = KeyPair::generate();
        let second = KeyPair::generate();
        let mut data = transfer(1, &keys);
        codec.sign(&mut data, &keys).unwrap();
        codec.second_sign(&mut data, &second).unwrap();

        let bytes = codec.serialize(&data, SignatureExclusions::empty()).unwrap();
        let tx = codec.deserialize(&bytes, DeserializeOptions::default()).unwrap();

        assert_eq!(tx.serialized, bytes);
        assert_eq!(tx.data.signature, data.signature);
        assert_eq!(tx.data.second_signature, data.second_signature);
        assert_eq!(tx.data.type_group, Some(CORE_TYPE_GROUP));
        assert_eq!(tx.data.timestamp, Some(1_000));
    }

    #[test]
    fn test_version_gate() {
        let keys = KeyPair::generate();
        let legacy = codec(false);
        let mut data = transfer(1, &keys);
        legacy.sign(&mut data, &keys).unwrap();
        let bytes = legacy.serialize(&data, SignatureExclusions::empty()).unwrap();

        let current = codec(true);
        assert!(matches!(
            current.deserialize(&bytes, DeserializeOptions::default()),
            Err(TransactionError::UnsupportedVersion(1))
        ));
        assert!(current.deserialize(&bytes, DeserializeOptions::legacy()).is_ok());
        assert!(current
            .deserialize(
                &bytes,
                DeserializeOptions {
                    disable_version_check: true,
                    ..Default::default()
                }
            )
            .is_ok());
    }

    #[test]
    fn test_trailing_and_missing_bytes_fatal() {
        let codec = codec(true);
        let keys = KeyPair::generate();
        let mut data = transfer(2, &keys);
        codec.sign(&mut data, &keys).unwrap();
        let bytes = codec.serialize(&data, SignatureExclusions::empty()).unwrap();

        let mut longer = bytes.clone();
        longer.push(0);
        assert!(codec.deserialize(&longer, DeserializeOptions::default()).is_err());

        let shorter = &bytes[..bytes.len() - 1];
        assert!(codec.deserialize(shorter, DeserializeOptions::default()).is_err());

        assert!(matches!(
            codec.deserialize(&bytes[..20], DeserializeOptions::default()),
            Err(TransactionError::Decode(DecodeError::Truncated { .. }))
        ));
    }

    #[test]
    fn test_vendor_field_skipped_for_unsupported_type() {
        let codec = codec(true);
        let keys = KeyPair::generate();
        let mut data = TransactionData {
            version: 2,
            network: 0x1e,
            type_group: Some(CORE_TYPE_GROUP),
            type_id: CoreTransactionType::DelegateRegistration as u16,
            nonce: Some(1),
            sender_public_key: keys.public_key_hex(),
            fee: 2_500_000_000,
            asset: Some(TransactionAsset::Delegate {
                username: "alice".to_string(),
            }),
            ..Default::default()
        };
        codec.sign(&mut data, &keys).unwrap();
        let bytes = codec.serialize(&data, SignatureExclusions::empty()).unwrap();

        // Splice a vendor field in by hand: everything up to the vendor length
        // byte is 1 + 1 + 1 + 4 + 2 + 8 + 33 + 8 bytes.
        let vendor_offset = 58;
        assert_eq!(bytes[vendor_offset], 0);
        let mut spliced = bytes[..vendor_offset].to_vec();
        spliced.extend_from_slice(&[3, b'a', b'b', b'c']);
        spliced.extend_from_slice(&bytes[vendor_offset + 1..]);

        let tx = codec.deserialize(&spliced, DeserializeOptions::default()).unwrap();
        assert_eq!(tx.data.vendor_field, None);
        assert_eq!(tx.data.asset, data.asset);
        assert_eq!(tx.serialized, spliced);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let codec = codec(true);
        let keys = KeyPair::generate();
        let mut data = transfer(2, &keys);
        data.type_group = Some(9);
        assert!(matches!(
            codec.serialize(&data, SignatureExclusions::empty()),
            Err(TransactionError::UnknownType { type_group: 9, .. })
        ));

        data.type_group = Some(CORE_TYPE_GROUP);
        codec.sign(&mut data, &keys).unwrap();
        let mut bytes = codec.serialize(&data, SignatureExclusions::empty()).unwrap();
        bytes[3] = 9;
        assert!(matches!(
            codec.deserialize(&bytes, DeserializeOptions::default()),
            Err(TransactionError::Decode(DecodeError::UnknownTransactionType { .. }))
        ));
    }

    #[test]
    fn test_exclusions_shorten_bytes() {
        let codec = codec(true);
        let keys = KeyPair::generate();
        let mut data = transfer(2, &keys);
        codec.sign(&mut data, &keys).unwrap();
        codec.second_sign(&mut data, &KeyPair::generate()).unwrap();

        let full = codec.serialize(&data, SignatureExclusions::empty()).unwrap();
        let second = codec.serialize(&data, SignatureExclusions::SECOND).unwrap();
        let primary = codec.serialize(&data, SignatureExclusions::PRIMARY).unwrap();
        assert_eq!(full.len(), second.len() + 64);
        assert_eq!(second.len(), primary.len() + 64);
        assert!(full.starts_with(&primary));
    }

    #[test]
    fn test_multisig_entries_decoded() {
        let codec = codec(true);
        let sender = KeyPair::generate();
        let participants: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let mut data = TransactionData {
            version: 2,
            network: 0x1e,
            type_group: Some(CORE_TYPE_GROUP),
            type_id: CoreTransactionType::MultiSignature as u16,
            nonce: Some(1),
            sender_public_key: sender.public_key_hex(),
            fee: 500_000_000,
            asset: Some(TransactionAsset::MultiSignature(MultiSignatureAsset {
                min: 2,
                public_keys: participants.iter().map(KeyPair::public_key_hex).collect(),
            })),
            ..Default::default()
        };
        for (index, keys) in participants.iter().enumerate() {
            codec.multi_sign(&mut data, keys, index as u8).unwrap();
        }
        codec.sign(&mut data, &sender).unwrap();

        let bytes = codec.serialize(&data, SignatureExclusions::empty()).unwrap();
        let tx = codec.deserialize(&bytes, DeserializeOptions::default()).unwrap();
        assert_eq!(tx.data.signature, data.signature);
        assert_eq!(tx.data.second_signature, None);
        assert_eq!(tx.data.signatures, data.signatures);
    }

    #[test]
    fn test_duplicate_entry_index_fatal() {
        let codec = codec(true);
        let keys = KeyPair::generate();
        let mut data = transfer(2, &keys);
        codec.multi_sign(&mut data, &keys, 0).unwrap();
        codec.multi_sign(&mut data, &keys, 0).unwrap();

        let bytes = codec.serialize(&data, SignatureExclusions::empty()).unwrap();
        assert!(matches!(
            codec.deserialize(&bytes, DeserializeOptions::default()),
            Err(TransactionError::MultiSignature(MultisigError::DuplicateParticipant(0)))
        ));
    }

    #[test]
    fn test_detect_schnorr_shapes() {
        assert!(detect_schnorr(0));
        assert!(detect_schnorr(64));
        assert!(detect_schnorr(128));
        assert!(detect_schnorr(130));
        assert!(detect_schnorr(64 + 65));
        assert!(detect_schnorr(128 + 65 * 2));
        assert!(!detect_schnorr(71));
        assert!(!detect_schnorr(10));
    }

    #[test]
    fn test_legacy_multisig_blob() {
        let codec = codec(false);
        let keys = KeyPair::generate();
        let mut data = transfer(1, &keys);
        codec.sign(&mut data, &keys).unwrap();
        data.signatures = Some(vec!["aabbcc".to_string()]);

        let bytes = codec.serialize(&data, SignatureExclusions::empty()).unwrap();
        let tx = codec.deserialize(&bytes, DeserializeOptions::default()).unwrap();
        assert_eq!(tx.data.second_signature, None);
        assert_eq!(tx.data.signatures, Some(vec!["aabbcc".to_string()]));
    }

    #[test]
    fn test_custom_schedule_via_context() {
        let context = ProtocolContext::from_config(&NetworkConfig::devnet())
            .unwrap()
            .with_milestones(Arc::new(MilestoneSchedule::single(Default::default())));
        let codec = TransactionCodec::new(context);
        assert!(codec.is_supported_version(1));
        assert!(!codec.is_supported_version(2));
    }
}
