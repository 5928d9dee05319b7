//! Transaction signature and schema verification
//!
//! Signature mismatches are reported as `Ok(false)`. Multi-signature
//! violations (duplicate, out-of-range or invalid participant entries) and
//! records that cannot be serialized are errors.

use std::collections::HashSet;

use super::buffer::EncodeError;
use super::schema::{SchemaError, SchemaValidator};
use super::transaction::{TransactionData, TransactionError};
use super::transaction_codec::{SignatureExclusions, TransactionCodec};
use crate::config::ProtocolContext;
use crate::crypto::{verify_any, verify_schnorr};
use crate::multisig::{MultiSignatureAsset, MultiSignatureEntry, MultisigError};

/// Verifies transaction records against the injected protocol context
#[derive(Clone)]
pub struct TransactionVerifier {
    context: ProtocolContext,
    codec: TransactionCodec,
    schemas: SchemaValidator,
}

impl TransactionVerifier {
    pub fn new(context: ProtocolContext) -> Self {
        let schemas = SchemaValidator::new(
            context.milestones.clone(),
            context.exceptions.clone(),
            context.types.clone(),
        );
        Self {
            codec: TransactionCodec::new(context.clone()),
            context,
            schemas,
        }
    }

    pub fn codec(&self) -> &TransactionCodec {
        &self.codec
    }

    /// Whether the sender's signature is valid.
    ///
    /// Whitelisted transactions always pass. Once quorum multi-signatures
    /// are active, v1 (or unversioned) records never do.
    pub fn verify(&self, data: &TransactionData) -> Result<bool, TransactionError> {
        let multisig_activated = self.context.milestones.active().multisig_activated;
        self.verify_with(data, multisig_activated)
    }

    /// Like [`verify`](Self::verify), but with the version rule of the
    /// milestone at `height` (the height of the block carrying the record)
    pub fn verify_at(&self, data: &TransactionData, height: u32) -> Result<bool, TransactionError> {
        let multisig_activated = self.context.milestones.milestone(height).multisig_activated;
        self.verify_with(data, multisig_activated)
    }

    fn verify_with(
        &self,
        data: &TransactionData,
        multisig_activated: bool,
    ) -> Result<bool, TransactionError> {
        let id = self.codec.get_id(data)?;
        if self.context.exceptions.is_exception_transaction(&id) {
            log::debug!("Transaction {} is whitelisted", id);
            return Ok(true);
        }

        if multisig_activated && data.version <= 1 {
            log::debug!("Rejecting v{} transaction {} after multisig activation", data.version, id);
            return Ok(false);
        }

        self.verify_hash(data)
    }

    /// Check the primary signature over the bytes without signatures
    pub fn verify_hash(&self, data: &TransactionData) -> Result<bool, TransactionError> {
        let Some(signature) = data.signature.as_deref() else {
            return Ok(false);
        };
        if data.sender_public_key.is_empty() {
            return Ok(false);
        }

        let hash = self.codec.to_hash(data, SignatureExclusions::PRIMARY)?;
        Ok(verify_hex_signature(&hash, signature, &data.sender_public_key))
    }

    /// Check the second signature against the registered second public key
    pub fn verify_second_signature(
        &self,
        data: &TransactionData,
        public_key: &str,
    ) -> Result<bool, TransactionError> {
        let Some(second_signature) = data.second_signature() else {
            return Ok(false);
        };

        let hash = self.codec.to_hash(data, SignatureExclusions::SECOND)?;
        Ok(verify_hex_signature(&hash, second_signature, public_key))
    }

    /// Check participant entries against a quorum.
    ///
    /// Entries are verified in order; the result is `true` as soon as `min`
    /// distinct participants have valid signatures. A duplicate index is
    /// rejected wherever it appears in the list, even after the threshold.
    pub fn verify_signatures(
        &self,
        data: &TransactionData,
        asset: Option<&MultiSignatureAsset>,
    ) -> Result<bool, TransactionError> {
        let asset = asset.ok_or_else(|| {
            MultisigError::InvalidAsset("missing multi-signature asset".to_string())
        })?;
        let Some(signatures) = data.signatures.as_ref() else {
            return Ok(false);
        };

        let mut seen = HashSet::with_capacity(signatures.len());
        let mut entries = Vec::with_capacity(signatures.len());
        for signature in signatures {
            let entry = MultiSignatureEntry::from_hex(signature)?;
            if !seen.insert(entry.index) {
                return Err(MultisigError::DuplicateParticipant(entry.index).into());
            }
            entries.push(entry);
        }

        let hash = self.codec.to_hash(data, SignatureExclusions::MULTI)?;
        let mut verified = 0usize;
        for entry in &entries {
            let public_key = asset
                .participant(entry.index)
                .ok_or(MultisigError::InvalidIndex(entry.index))?;
            let public_key =
                hex::decode(public_key).map_err(|_| MultisigError::InvalidIndex(entry.index))?;

            if !verify_schnorr(&hash, &entry.signature, &public_key) {
                log::warn!("Invalid multi-signature entry for participant {}", entry.index);
                return Err(MultisigError::InvalidSignature(entry.index).into());
            }

            verified += 1;
            if verified == asset.min as usize {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Validate a record against its type's schema (`{id}Strict` when strict)
    pub fn verify_schema(
        &self,
        data: &TransactionData,
        strict: bool,
    ) -> Result<Vec<SchemaError>, TransactionError> {
        let handler = self
            .context
            .types
            .for_data(data)
            .ok_or(TransactionError::UnknownType {
                type_id: data.type_id,
                type_group: data.effective_type_group(),
                version: data.version,
            })?;

        let schema_id = if strict {
            format!("{}Strict", handler.schema_id)
        } else {
            handler.schema_id.to_string()
        };

        let value = serde_json::to_value(data).map_err(|e| EncodeError::InvalidField {
            field: "transaction",
            reason: e.to_string(),
        })?;
        Ok(self.schemas.validate(&schema_id, &value))
    }
}

fn verify_hex_signature(hash: &[u8; 32], signature: &str, public_key: &str) -> bool {
    let (Ok(signature), Ok(public_key)) = (hex::decode(signature), hex::decode(public_key)) else {
        log::warn!("Signature or public key is not valid hex");
        return false;
    };
    verify_any(hash, &signature, &public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExceptionConfig, ExceptionRegistry, NetworkConfig};
    use crate::core::transaction::{CoreTransactionType, TransactionAsset, CORE_TYPE_GROUP};
    use crate::crypto::KeyPair;
    use std::sync::Arc;

    fn context(multisig_activated: bool) -> ProtocolContext {
        let mut config = NetworkConfig::devnet();
        config.current_height = Some(if multisig_activated { 20 } else { 1 });
        ProtocolContext::from_config(&config).unwrap()
    }

    fn transfer(version: u8, keys: &KeyPair) -> TransactionData {
        TransactionData {
            version,
            network: 0x1e,
            type_group: Some(CORE_TYPE_GROUP),
            type_id: CoreTransactionType::Transfer as u16,
            timestamp: if version == 1 { Some(42) } else { None },
            nonce: if version == 1 { None } else { Some(1) },
            sender_public_key: keys.public_key_hex(),
            fee: 10_000_000,
            amount: 1,
            expiration: Some(0),
            recipient_id: Some(KeyPair::generate().address(0x1e)),
            ..Default::default()
        }
    }

    fn quorum(n: usize, min: u8) -> (Vec<KeyPair>, MultiSignatureAsset) {
        let keys: Vec<KeyPair> = (0..n).map(|_| KeyPair::generate()).collect();
        let asset = MultiSignatureAsset::new(min, keys.iter().map(KeyPair::public_key_hex).collect())
            .unwrap();
        (keys, asset)
    }

    #[test]
    fn test_verify_schnorr_and_tamper() {
        let verifier = TransactionVerifier::new(context(true));
        let keys = KeyPair::generate();
        let mut data = transfer(2, &keys);
        verifier.codec().sign(&mut data, &keys).unwrap();
        assert!(verifier.verify(&data).unwrap());

        let signature = data.signature.clone().unwrap();
        let mut bytes = hex::decode(&signature).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        data.signature = Some(hex::encode(bytes));
        assert!(!verifier.verify(&data).unwrap());
    }

    #[test]
    fn test_verify_ecdsa_v1() {
        let verifier = TransactionVerifier::new(context(false));
        let keys = KeyPair::generate();
        let mut data = transfer(1, &keys);
        verifier.codec().sign(&mut data, &keys).unwrap();
        assert!(verifier.verify(&data).unwrap());

        let after = TransactionVerifier::new(context(true));
        assert!(!after.verify(&data).unwrap());
        assert!(after.verify_hash(&data).unwrap());
    }

    #[test]
    fn test_verify_at_uses_height_milestone() {
        let keys = KeyPair::generate();
        let mut data = transfer(1, &keys);
        let verifier = TransactionVerifier::new(context(true));
        verifier.codec().sign(&mut data, &keys).unwrap();

        assert!(!verifier.verify(&data).unwrap());
        assert!(verifier.verify_at(&data, 5).unwrap());
        assert!(!verifier.verify_at(&data, 20).unwrap());

        data.fee += 1;
        assert!(!verifier.verify_at(&data, 5).unwrap());
    }

    #[test]
    fn test_exception_short_circuit() {
        let keys = KeyPair::generate();
        let data = transfer(1, &keys);
        let base = context(true);
        let id = TransactionCodec::new(base.clone()).get_id(&data).unwrap();

        let exceptions = ExceptionRegistry::new(
            0x1e,
            ExceptionConfig {
                transactions: vec![id],
                ..Default::default()
            },
            Vec::new(),
        );
        let verifier = TransactionVerifier::new(base.with_exceptions(Arc::new(exceptions)));

        // Unsigned, legacy version, multisig active: still accepted
        assert!(verifier.verify(&data).unwrap());
    }

    #[test]
    fn test_missing_signature_is_false() {
        let verifier = TransactionVerifier::new(context(true));
        let data = transfer(2, &KeyPair::generate());
        assert!(!verifier.verify(&data).unwrap());
        assert!(!verifier.verify_second_signature(&data, "02").unwrap());
    }

    #[test]
    fn test_second_signature() {
        let verifier = TransactionVerifier::new(context(true));
        let keys = KeyPair::generate();
        let second = KeyPair::generate();
        let mut data = transfer(2, &keys);
        verifier.codec().sign(&mut data, &keys).unwrap();
        verifier.codec().second_sign(&mut data, &second).unwrap();

        assert!(verifier.verify(&data).unwrap());
        assert!(verifier
            .verify_second_signature(&data, &second.public_key_hex())
            .unwrap());
        assert!(!verifier
            .verify_second_signature(&data, &keys.public_key_hex())
            .unwrap());
    }

    #[test]
    fn test_quorum_threshold() {
        let verifier = TransactionVerifier::new(context(true));
        let (keys, asset) = quorum(3, 2);
        let mut data = transfer(2, &keys[0]);

        verifier.codec().multi_sign(&mut data, &keys[2], 2).unwrap();
        assert!(!verifier.verify_signatures(&data, Some(&asset)).unwrap());

        verifier.codec().multi_sign(&mut data, &keys[0], 0).unwrap();
        assert!(verifier.verify_signatures(&data, Some(&asset)).unwrap());
    }

    #[test]
    fn test_duplicate_third_entry_raises() {
        let verifier = TransactionVerifier::new(context(true));
        let (keys, asset) = quorum(3, 2);
        let mut data = transfer(2, &keys[0]);
        verifier.codec().multi_sign(&mut data, &keys[0], 0).unwrap();
        verifier.codec().multi_sign(&mut data, &keys[1], 1).unwrap();
        verifier.codec().multi_sign(&mut data, &keys[1], 1).unwrap();

        assert!(matches!(
            verifier.verify_signatures(&data, Some(&asset)),
            Err(TransactionError::MultiSignature(MultisigError::DuplicateParticipant(1)))
        ));
    }

    #[test]
    fn test_index_and_signature_failures_raise() {
        let verifier = TransactionVerifier::new(context(true));
        let (keys, asset) = quorum(2, 2);

        let mut out_of_range = transfer(2, &keys[0]);
        verifier.codec().multi_sign(&mut out_of_range, &keys[0], 5).unwrap();
        assert!(matches!(
            verifier.verify_signatures(&out_of_range, Some(&asset)),
            Err(TransactionError::MultiSignature(MultisigError::InvalidIndex(5)))
        ));

        let mut wrong_key = transfer(2, &keys[0]);
        verifier.codec().multi_sign(&mut wrong_key, &keys[1], 0).unwrap();
        assert!(matches!(
            verifier.verify_signatures(&wrong_key, Some(&asset)),
            Err(TransactionError::MultiSignature(MultisigError::InvalidSignature(0)))
        ));

        let mut malformed = transfer(2, &keys[0]);
        malformed.signatures = Some(vec!["00".to_string()]);
        assert!(matches!(
            verifier.verify_signatures(&malformed, Some(&asset)),
            Err(TransactionError::MultiSignature(MultisigError::MalformedEntry(_)))
        ));
    }

    #[test]
    fn test_missing_asset_and_signatures() {
        let verifier = TransactionVerifier::new(context(true));
        let (keys, asset) = quorum(2, 2);
        let data = transfer(2, &keys[0]);

        assert!(matches!(
            verifier.verify_signatures(&data, None),
            Err(TransactionError::MultiSignature(MultisigError::InvalidAsset(_)))
        ));
        assert!(!verifier.verify_signatures(&data, Some(&asset)).unwrap());
    }

    #[test]
    fn test_verify_schema() {
        let verifier = TransactionVerifier::new(context(true));
        let keys = KeyPair::generate();
        let mut data = transfer(2, &keys);
        verifier.codec().sign(&mut data, &keys).unwrap();
        assert!(verifier.verify_schema(&data, true).unwrap().is_empty());

        data.asset = Some(TransactionAsset::Delegate {
            username: "x".to_string(),
        });
        let errors = verifier.verify_schema(&data, true).unwrap();
        assert!(errors.iter().any(|e| e.data_path == ".asset"));
        assert!(verifier.verify_schema(&data, false).unwrap().is_empty());

        data.type_id = 42;
        assert!(matches!(
            verifier.verify_schema(&data, false),
            Err(TransactionError::UnknownType { type_id: 42, .. })
        ));
    }
}
