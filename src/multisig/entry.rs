//! Participant signature entries
//!
//! On the wire an entry is 65 bytes: a 1-byte participant index followed by a
//! 64-byte Schnorr signature. Records keep entries as 130-char hex strings.

use super::asset::MultisigError;
use crate::crypto::SCHNORR_SIGNATURE_SIZE;

/// Size of one serialized entry
pub const ENTRY_SIZE: usize = 1 + SCHNORR_SIGNATURE_SIZE;

/// One participant's signature
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiSignatureEntry {
    pub index: u8,
    pub signature: [u8; SCHNORR_SIGNATURE_SIZE],
}

impl MultiSignatureEntry {
    /// Parse an entry from its raw 65 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MultisigError> {
        if bytes.len() != ENTRY_SIZE {
            return Err(MultisigError::MalformedEntry(format!(
                "expected {} bytes, got {}",
                ENTRY_SIZE,
                bytes.len()
            )));
        }

        let mut signature = [0u8; SCHNORR_SIGNATURE_SIZE];
        signature.copy_from_slice(&bytes[1..]);
        Ok(Self {
            index: bytes[0],
            signature,
        })
    }

    /// Parse an entry from its 130-char hex form
    pub fn from_hex(entry: &str) -> Result<Self, MultisigError> {
        if entry.len() != ENTRY_SIZE * 2 {
            return Err(MultisigError::MalformedEntry("Invalid signature string.".to_string()));
        }
        let bytes = hex::decode(entry)
            .map_err(|_| MultisigError::MalformedEntry("Invalid signature string.".to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut out = [0u8; ENTRY_SIZE];
        out[0] = self.index;
        out[1..].copy_from_slice(&self.signature);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let entry = MultiSignatureEntry {
            index: 7,
            signature: [0xab; SCHNORR_SIGNATURE_SIZE],
        };
        let encoded = entry.to_hex();
        assert_eq!(encoded.len(), 130);
        assert!(encoded.starts_with("07abab"));
        assert_eq!(MultiSignatureEntry::from_hex(&encoded).unwrap(), entry);
    }

    #[test]
    fn test_malformed_entries() {
        assert!(MultiSignatureEntry::from_hex("00").is_err());
        assert!(MultiSignatureEntry::from_hex(&"zz".repeat(ENTRY_SIZE)).is_err());
        assert!(MultiSignatureEntry::from_bytes(&[0u8; 64]).is_err());
    }
}
