//! Multi-signature quorum asset
//!
//! An ordered list of participant public keys and the minimum number of
//! distinct participant signatures required to authorize a transaction.
//! Entry indices refer to positions in this list, so the order is part of
//! consensus.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of participants in a quorum
pub const MAX_PARTICIPANTS: usize = 16;

/// Minimum number of participants in a quorum
pub const MIN_PARTICIPANTS: usize = 2;

/// Errors related to multi-signature handling
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Invalid multi-signature asset: {0}")]
    InvalidAsset(String),
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("Duplicate participant public key")]
    DuplicateSigner,
    #[error("Duplicate participant index: {0}")]
    DuplicateParticipant(u8),
    #[error("Invalid participant index: {0}")]
    InvalidIndex(u8),
    #[error("Invalid signature for participant {0}")]
    InvalidSignature(u8),
    #[error("Malformed multi-signature entry: {0}")]
    MalformedEntry(String),
}

/// Quorum configuration carried by a multi-signature registration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MultiSignatureAsset {
    /// Minimum signatures required (M in M-of-N)
    pub min: u8,
    /// Ordered participant public keys (hex, compressed)
    pub public_keys: Vec<String>,
}

impl MultiSignatureAsset {
    /// Create a validated quorum asset
    ///
    /// # Errors
    /// Returns an error if the threshold is out of range, the participant
    /// count is outside `MIN_PARTICIPANTS..=MAX_PARTICIPANTS`, or a key repeats.
    pub fn new(min: u8, public_keys: Vec<String>) -> Result<Self, MultisigError> {
        let asset = Self { min, public_keys };
        asset.validate()?;
        Ok(asset)
    }

    /// Check the quorum rules without constructing a new asset
    pub fn validate(&self) -> Result<(), MultisigError> {
        if self.public_keys.len() < MIN_PARTICIPANTS || self.public_keys.len() > MAX_PARTICIPANTS {
            return Err(MultisigError::InvalidAsset(format!(
                "participant count {} outside {}..={}",
                self.public_keys.len(),
                MIN_PARTICIPANTS,
                MAX_PARTICIPANTS
            )));
        }

        if self.min == 0 {
            return Err(MultisigError::InvalidThreshold(
                "threshold must be at least 1".to_string(),
            ));
        }

        if self.min as usize > self.public_keys.len() {
            return Err(MultisigError::InvalidThreshold(format!(
                "threshold {} exceeds participant count {}",
                self.min,
                self.public_keys.len()
            )));
        }

        let mut sorted = self.public_keys.clone();
        sorted.sort();
        if sorted.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(MultisigError::DuplicateSigner);
        }

        Ok(())
    }

    /// Whether the asset can be used for verification at all
    pub fn is_empty(&self) -> bool {
        self.min == 0 || self.public_keys.is_empty()
    }

    /// Public key at the given participant index
    pub fn participant(&self, index: u8) -> Option<&str> {
        self.public_keys.get(index as usize).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("02{:064x}", i + 1)).collect()
    }

    #[test]
    fn test_valid_asset() {
        let asset = MultiSignatureAsset::new(2, keys(3)).unwrap();
        assert_eq!(asset.participant(2), Some(keys(3)[2].as_str()));
        assert_eq!(asset.participant(3), None);
        assert!(!asset.is_empty());
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(matches!(
            MultiSignatureAsset::new(0, keys(3)),
            Err(MultisigError::InvalidThreshold(_))
        ));
        assert!(matches!(
            MultiSignatureAsset::new(4, keys(3)),
            Err(MultisigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_participant_bounds() {
        assert!(matches!(
            MultiSignatureAsset::new(1, keys(1)),
            Err(MultisigError::InvalidAsset(_))
        ));
        assert!(matches!(
            MultiSignatureAsset::new(1, keys(MAX_PARTICIPANTS + 1)),
            Err(MultisigError::InvalidAsset(_))
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut public_keys = keys(2);
        public_keys.push(public_keys[0].clone());
        assert_eq!(
            MultiSignatureAsset::new(2, public_keys),
            Err(MultisigError::DuplicateSigner)
        );
    }
}
