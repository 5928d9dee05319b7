//! Protocol configuration
//!
//! This module provides:
//! - Milestones (height-keyed consensus constants) and the provider trait
//! - Exception whitelists and the block id override table
//! - Network configuration loading and network time
//! - The injected context shared by codecs and verifiers

pub mod context;
pub mod exceptions;
pub mod milestone;
pub mod network;

pub use context::ProtocolContext;
pub use exceptions::{ExceptionConfig, ExceptionRegistry};
pub use milestone::{Milestone, MilestoneProvider, MilestoneSchedule, MilestoneSpec};
pub use network::{ConfigError, FixedClock, NetworkClock, NetworkConfig, SystemClock};
