//! Injected protocol collaborators
//!
//! Every codec and verifier is constructed with a [`ProtocolContext`]; none
//! of them reach for global configuration.

use std::sync::Arc;

use super::exceptions::ExceptionRegistry;
use super::milestone::{MilestoneProvider, MilestoneSchedule};
use super::network::{ConfigError, NetworkClock, NetworkConfig, SystemClock};
use crate::core::types::TransactionTypeRegistry;

/// Read-only collaborators shared by codecs and verifiers
#[derive(Clone)]
pub struct ProtocolContext {
    pub milestones: Arc<dyn MilestoneProvider>,
    pub exceptions: Arc<ExceptionRegistry>,
    pub types: Arc<TransactionTypeRegistry>,
    pub clock: Arc<dyn NetworkClock>,
}

impl ProtocolContext {
    pub fn new(
        milestones: Arc<dyn MilestoneProvider>,
        exceptions: Arc<ExceptionRegistry>,
        types: Arc<TransactionTypeRegistry>,
        clock: Arc<dyn NetworkClock>,
    ) -> Self {
        Self {
            milestones,
            exceptions,
            types,
            clock,
        }
    }

    /// Build the context for a configured network with the core transaction types
    pub fn from_config(config: &NetworkConfig) -> Result<Self, ConfigError> {
        let mut schedule = MilestoneSchedule::from_specs(&config.milestones)?;
        if let Some(height) = config.current_height {
            schedule = schedule.with_current_height(height);
        }

        let exceptions = ExceptionRegistry::new(
            config.pub_key_hash,
            config.exceptions.clone(),
            config.genesis_transactions.clone(),
        );

        Ok(Self::new(
            Arc::new(schedule),
            Arc::new(exceptions),
            Arc::new(TransactionTypeRegistry::with_core_types()),
            Arc::new(SystemClock::new(config.epoch)),
        ))
    }

    /// Replace the clock (tests pin network time with `FixedClock`)
    pub fn with_clock(mut self, clock: Arc<dyn NetworkClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the milestone provider
    pub fn with_milestones(mut self, milestones: Arc<dyn MilestoneProvider>) -> Self {
        self.milestones = milestones;
        self
    }

    /// Replace the exception registry
    pub fn with_exceptions(mut self, exceptions: Arc<ExceptionRegistry>) -> Self {
        self.exceptions = exceptions;
        self
    }

    /// Network byte of the configured network
    pub fn network(&self) -> u8 {
        self.exceptions.network()
    }
}
