//! Height-keyed protocol constants
//!
//! A milestone is the bundle of consensus constants in force from its
//! activation height until the next milestone. Milestones are declared
//! cumulatively: each one only names what changes, everything else is
//! inherited from its predecessor.

use serde::{Deserialize, Serialize};

use super::network::ConfigError;

// =============================================================================
// Defaults
// =============================================================================

/// Default maximum serialized block size in bytes
pub const DEFAULT_MAX_PAYLOAD: usize = 2_097_152;

/// Default block time in seconds
pub const DEFAULT_BLOCKTIME: u32 = 8;

/// Default vendor field byte limit
pub const DEFAULT_VENDOR_FIELD_LENGTH: usize = 64;

// =============================================================================
// Milestone
// =============================================================================

/// Fully resolved constants for a height range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    /// Activation height
    pub height: u32,
    /// Expected block version
    pub version: u32,
    /// Block ids are full 32-byte sha256 hex instead of 64-bit decimals
    pub id_full_sha256: bool,
    /// Maximum canonical block size in bytes
    pub max_payload: usize,
    /// Block time (also the future-timestamp tolerance) in seconds
    pub blocktime: u32,
    /// Block reward
    pub reward: u64,
    /// Maximum vendor field length in bytes
    pub vendor_field_length: usize,
    /// Quorum multi-signatures and v2 transactions are active
    pub multisig_activated: bool,
    /// Validators always placed first in the next round
    pub trusted_validators: Option<Vec<String>>,
}

impl Default for Milestone {
    fn default() -> Self {
        Self {
            height: 1,
            version: 0,
            id_full_sha256: false,
            max_payload: DEFAULT_MAX_PAYLOAD,
            blocktime: DEFAULT_BLOCKTIME,
            reward: 0,
            vendor_field_length: DEFAULT_VENDOR_FIELD_LENGTH,
            multisig_activated: false,
            trusted_validators: None,
        }
    }
}

/// A milestone as declared in configuration: only the changed fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneSpec {
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_full_sha256: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocktime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_field_length: Option<usize>,
    #[serde(default, alias = "aip11", skip_serializing_if = "Option::is_none")]
    pub multisig_activated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_validators: Option<Vec<String>>,
}

impl MilestoneSpec {
    /// Apply this declaration on top of the previous resolved milestone
    fn resolve(&self, previous: &Milestone) -> Milestone {
        Milestone {
            height: self.height,
            version: self.version.unwrap_or(previous.version),
            id_full_sha256: self.id_full_sha256.unwrap_or(previous.id_full_sha256),
            max_payload: self.max_payload.unwrap_or(previous.max_payload),
            blocktime: self.blocktime.unwrap_or(previous.blocktime),
            reward: self.reward.unwrap_or(previous.reward),
            vendor_field_length: self
                .vendor_field_length
                .unwrap_or(previous.vendor_field_length),
            multisig_activated: self.multisig_activated.unwrap_or(previous.multisig_activated),
            trusted_validators: self
                .trusted_validators
                .clone()
                .or_else(|| previous.trusted_validators.clone()),
        }
    }
}

// =============================================================================
// Provider
// =============================================================================

/// Read-only source of milestones
pub trait MilestoneProvider: Send + Sync {
    /// Constants in force at `height`
    fn milestone(&self, height: u32) -> &Milestone;

    /// Constants in force at the provider's current height
    fn active(&self) -> &Milestone;
}

/// Milestones resolved from configuration, sorted by activation height
#[derive(Debug, Clone)]
pub struct MilestoneSchedule {
    milestones: Vec<Milestone>,
    current_height: u32,
}

impl MilestoneSchedule {
    /// Resolve cumulative declarations into a schedule
    ///
    /// The current height defaults to the last activation height.
    pub fn from_specs(specs: &[MilestoneSpec]) -> Result<Self, ConfigError> {
        if specs.is_empty() {
            return Err(ConfigError::Invalid("at least one milestone is required".to_string()));
        }

        let mut sorted = specs.to_vec();
        sorted.sort_by_key(|spec| spec.height);

        if sorted.windows(2).any(|pair| pair[0].height == pair[1].height) {
            return Err(ConfigError::Invalid("duplicate milestone height".to_string()));
        }

        let mut milestones: Vec<Milestone> = Vec::with_capacity(sorted.len());
        let mut previous = Milestone::default();
        for spec in &sorted {
            let resolved = spec.resolve(&previous);
            previous = resolved.clone();
            milestones.push(resolved);
        }

        let current_height = milestones.last().map(|m| m.height).unwrap_or(1);
        Ok(Self {
            milestones,
            current_height,
        })
    }

    /// Schedule with a single milestone active from height 1
    pub fn single(milestone: Milestone) -> Self {
        Self {
            milestones: vec![Milestone {
                height: 1,
                ..milestone
            }],
            current_height: 1,
        }
    }

    /// Set the height used by [`MilestoneProvider::active`]
    pub fn with_current_height(mut self, height: u32) -> Self {
        self.current_height = height;
        self
    }

    pub fn current_height(&self) -> u32 {
        self.current_height
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }
}

impl MilestoneProvider for MilestoneSchedule {
    fn milestone(&self, height: u32) -> &Milestone {
        // The schedule is never empty; heights below the first activation
        // fall back to the first milestone.
        let position = self.milestones.partition_point(|m| m.height <= height);
        &self.milestones[position.saturating_sub(1)]
    }

    fn active(&self) -> &Milestone {
        self.milestone(self.current_height)
    }
}
