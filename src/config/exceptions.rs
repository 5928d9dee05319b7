//! Historical exception whitelists
//!
//! Some blocks and transactions were accepted by the network before a rule
//! was enforced. They stay valid forever: the registry lists them per network
//! and the codec/verifiers consult it before rejecting anything. The registry
//! also carries the override table that maps historically miscomputed block
//! ids to the id the network actually accepted.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Exception lists as declared in network configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionConfig {
    /// Whitelisted block ids (full-hash networks)
    #[serde(default)]
    pub blocks: Vec<String>,
    /// Whitelisted transaction ids
    #[serde(default)]
    pub transactions: Vec<String>,
    /// Legacy short-id blocks and the exact transaction ids they must carry
    #[serde(default)]
    pub blocks_transactions: HashMap<String, Vec<String>>,
    /// Computed block id -> accepted block id
    #[serde(default)]
    pub outlook_table: HashMap<String, String>,
}

/// Network-scoped, read-only exception lookups
///
/// Each id set is built lazily on first use and then shared.
#[derive(Debug)]
pub struct ExceptionRegistry {
    network: u8,
    config: ExceptionConfig,
    genesis_transactions: Vec<String>,
    block_ids: OnceCell<HashSet<String>>,
    transaction_ids: OnceCell<HashSet<String>>,
    genesis_ids: OnceCell<HashSet<String>>,
}

impl ExceptionRegistry {
    pub fn new(network: u8, config: ExceptionConfig, genesis_transactions: Vec<String>) -> Self {
        Self {
            network,
            config,
            genesis_transactions,
            block_ids: OnceCell::new(),
            transaction_ids: OnceCell::new(),
            genesis_ids: OnceCell::new(),
        }
    }

    /// Registry without any exceptions
    pub fn empty(network: u8) -> Self {
        Self::new(network, ExceptionConfig::default(), Vec::new())
    }

    /// Network byte this registry belongs to
    pub fn network(&self) -> u8 {
        self.network
    }

    fn exception_block_ids(&self) -> &HashSet<String> {
        self.block_ids
            .get_or_init(|| self.config.blocks.iter().cloned().collect())
    }

    fn exception_transaction_ids(&self) -> &HashSet<String> {
        self.transaction_ids
            .get_or_init(|| self.config.transactions.iter().cloned().collect())
    }

    fn genesis_transaction_ids(&self) -> &HashSet<String> {
        self.genesis_ids
            .get_or_init(|| self.genesis_transactions.iter().cloned().collect())
    }

    /// Whether a block is whitelisted.
    ///
    /// Full-hash ids (64 hex chars) are looked up directly. Legacy short ids
    /// are whitelisted only when the table lists the block and its expected
    /// transaction ids match `transaction_ids` exactly as sets.
    pub fn is_exception_block(&self, block_id: &str, transaction_ids: &[String]) -> bool {
        if block_id.len() == 64 {
            return self.exception_block_ids().contains(block_id);
        }

        let Some(expected) = self.config.blocks_transactions.get(block_id) else {
            return false;
        };

        let expected: HashSet<&str> = expected.iter().map(String::as_str).collect();
        let actual: HashSet<&str> = transaction_ids.iter().map(String::as_str).collect();
        expected == actual
    }

    pub fn is_exception_transaction(&self, transaction_id: &str) -> bool {
        self.exception_transaction_ids().contains(transaction_id)
    }

    pub fn is_genesis_transaction(&self, transaction_id: &str) -> bool {
        self.genesis_transaction_ids().contains(transaction_id)
    }

    /// Canonical id for a computed block id
    pub fn resolve_block_id(&self, computed: String) -> String {
        match self.config.outlook_table.get(&computed) {
            Some(canonical) => {
                log::debug!("Block id {} overridden to {}", computed, canonical);
                canonical.clone()
            }
            None => computed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ExceptionRegistry {
        let mut blocks_transactions = HashMap::new();
        blocks_transactions.insert(
            "12345".to_string(),
            vec!["tx-a".to_string(), "tx-b".to_string()],
        );
        let mut outlook_table = HashMap::new();
        outlook_table.insert("111".to_string(), "222".to_string());

        ExceptionRegistry::new(
            0x1e,
            ExceptionConfig {
                blocks: vec!["ab".repeat(32)],
                transactions: vec!["cd".repeat(32)],
                blocks_transactions,
                outlook_table,
            },
            vec!["ef".repeat(32)],
        )
    }

    #[test]
    fn test_full_hash_block_lookup() {
        let registry = registry();
        assert!(registry.is_exception_block(&"ab".repeat(32), &[]));
        assert!(!registry.is_exception_block(&"00".repeat(32), &[]));
    }

    #[test]
    fn test_short_id_requires_exact_transaction_set() {
        let registry = registry();
        let ids = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert!(registry.is_exception_block("12345", &ids(&["tx-b", "tx-a"])));
        assert!(!registry.is_exception_block("12345", &ids(&["tx-a"])));
        assert!(!registry.is_exception_block("12345", &ids(&["tx-a", "tx-b", "tx-c"])));
        assert!(!registry.is_exception_block("99999", &[]));
    }

    #[test]
    fn test_transaction_and_genesis_lookups() {
        let registry = registry();
        assert!(registry.is_exception_transaction(&"cd".repeat(32)));
        assert!(!registry.is_exception_transaction(&"ef".repeat(32)));
        assert!(registry.is_genesis_transaction(&"ef".repeat(32)));
        assert_eq!(registry.network(), 0x1e);
    }

    #[test]
    fn test_outlook_override() {
        let registry = registry();
        assert_eq!(registry.resolve_block_id("111".to_string()), "222");
        assert_eq!(registry.resolve_block_id("333".to_string()), "333");
    }
}
