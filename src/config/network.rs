//! Network configuration loading and network time
//!
//! A network is described by a JSON document: its address byte, the epoch
//! that block timestamps count from, the milestone declarations and the
//! exception lists.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use super::exceptions::ExceptionConfig;
use super::milestone::MilestoneSpec;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Full description of one network
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Human readable network name
    pub name: String,
    /// Address version byte, also the transaction `network` field
    pub pub_key_hash: u8,
    /// Instant that block and transaction timestamps count from
    pub epoch: DateTime<Utc>,
    /// Cumulative milestone declarations
    pub milestones: Vec<MilestoneSpec>,
    /// Historical exceptions
    #[serde(default)]
    pub exceptions: ExceptionConfig,
    /// Ids of the transactions in the genesis block
    #[serde(default)]
    pub genesis_transactions: Vec<String>,
    /// Height used for "currently active" milestone lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_height: Option<u32>,
}

impl NetworkConfig {
    /// Parse a configuration document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: NetworkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&contents)?;
        log::debug!(
            "Loaded network '{}' with {} milestones from {}",
            config.name,
            config.milestones.len(),
            path.as_ref().display()
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.milestones.is_empty() {
            return Err(ConfigError::Invalid("milestones must not be empty".to_string()));
        }
        if !self.milestones.iter().any(|m| m.height <= 1) {
            return Err(ConfigError::Invalid(
                "a milestone must activate at height 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Built-in development network.
    ///
    /// Legacy rules (short ids, v1 transactions) up to height 19, quorum
    /// multi-signatures and full-hash ids from height 20.
    pub fn devnet() -> Self {
        Self {
            name: "devnet".to_string(),
            pub_key_hash: 0x1e,
            epoch: Utc.with_ymd_and_hms(2017, 3, 21, 13, 0, 0).single().unwrap_or_default(),
            milestones: vec![
                MilestoneSpec {
                    height: 1,
                    version: Some(0),
                    reward: Some(0),
                    blocktime: Some(8),
                    id_full_sha256: Some(false),
                    multisig_activated: Some(false),
                    vendor_field_length: Some(64),
                    ..Default::default()
                },
                MilestoneSpec {
                    height: 10,
                    reward: Some(200_000_000),
                    ..Default::default()
                },
                MilestoneSpec {
                    height: 20,
                    id_full_sha256: Some(true),
                    multisig_activated: Some(true),
                    vendor_field_length: Some(255),
                    ..Default::default()
                },
            ],
            exceptions: ExceptionConfig::default(),
            genesis_transactions: Vec::new(),
            current_height: None,
        }
    }
}

// =============================================================================
// Network time
// =============================================================================

/// Source of the current network time (seconds since the network epoch)
pub trait NetworkClock: Send + Sync {
    fn now(&self) -> u32;
}

/// Wall-clock time relative to the network epoch
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: DateTime<Utc>,
}

impl SystemClock {
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self { epoch }
    }
}

impl NetworkClock for SystemClock {
    fn now(&self) -> u32 {
        let elapsed = (Utc::now() - self.epoch).num_seconds().max(0);
        u32::try_from(elapsed).unwrap_or(u32::MAX)
    }
}

/// A clock stuck at a fixed network time
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u32);

impl NetworkClock for FixedClock {
    fn now(&self) -> u32 {
        self.0
    }
}
