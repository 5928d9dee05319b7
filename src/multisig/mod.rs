//! Multi-signature quorum support
//!
//! M-of-N authorization where M distinct participants out of an ordered key
//! list must provide Schnorr signatures over the transaction's multi hash.
//!
//! # Example
//!
//! ```ignore
//! use ledger_codec::multisig::MultiSignatureAsset;
//!
//! // 2-of-3 quorum
//! let asset = MultiSignatureAsset::new(2, vec![pk1, pk2, pk3])?;
//! let ok = transaction_verifier.verify_signatures(&tx_data, Some(&asset))?;
//! ```

pub mod asset;
pub mod entry;

pub use asset::{MultiSignatureAsset, MultisigError, MAX_PARTICIPANTS, MIN_PARTICIPANTS};
pub use entry::{MultiSignatureEntry, ENTRY_SIZE};
