//! Versioned state record for export and import.
//!
//! The record carries every piece of session state; importing it into a
//! fresh instance reproduces all public queries without ingesting further
//! blocks. Field order is stable and all values are primitives or serde
//! structs of primitives.

use crate::bns_kill::BnsKillMachines;
use crate::bucket::BucketManager;
use crate::hierarchy::HierarchyArbiter;
use crate::hostility::HostilityManager;
use crate::ledger::DualLedger;
use crate::pause::PauseManager;
use crate::reaction::{PendingTrade, ReactionEngine};
use crate::samedir::SameDirectionManager;
use crate::snapshot::SnapshotStore;
use crate::zz::ZzStateManager;
use anyhow::Result;
use pattern_bet_core::{Direction, EngineConfig, EngineError};
use pattern_bet_patterns::{BlockTracker, EvaluatedResult, PatternLifecycle, SignalEvaluator};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current record version.
pub const STATE_RECORD_VERSION: u32 = 1;

/// Complete serialized session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub version: u32,
    pub blocks: BlockTracker,
    pub pending_signals: SignalEvaluator,
    pub results: Vec<EvaluatedResult>,
    pub pattern_cycles: PatternLifecycle,
    pub pocket_state: ZzStateManager,
    pub buckets: BucketManager,
    pub bns_kill_machines: BnsKillMachines,
    pub oz_monitoring_start_block: Option<u32>,
    pub pause_state: PauseManager,
    pub hostility: HostilityManager,
    pub same_direction: SameDirectionManager,
    pub ledger: DualLedger,
    pub decision_log: HierarchyArbiter,
    pub snapshots: SnapshotStore,
    pub pending_trade: Option<PendingTrade>,
    pub pending_sd_imaginary: Option<Direction>,
    pub cooldown_remaining: u32,
    pub consecutive_real_losses: u32,
    pub actual_pnl: Decimal,
    pub simulated_pnl: Decimal,
}

impl ReactionEngine {
    /// Exports the full session state.
    #[must_use]
    pub fn export_state(&self) -> StateRecord {
        StateRecord {
            version: STATE_RECORD_VERSION,
            blocks: self.tracker.clone(),
            pending_signals: self.evaluator.clone(),
            results: self.results.clone(),
            pattern_cycles: self.lifecycle.clone(),
            pocket_state: self.zz.clone(),
            buckets: self.buckets.clone(),
            bns_kill_machines: self.kill_machines.clone(),
            oz_monitoring_start_block: self.kill_machines.oz.monitoring_start_block,
            pause_state: self.pauses.clone(),
            hostility: self.hostility.clone(),
            same_direction: self.samedir.clone(),
            ledger: self.ledger.clone(),
            decision_log: self.arbiter.clone(),
            snapshots: self.snapshots.clone(),
            pending_trade: self.pending_trade.clone(),
            pending_sd_imaginary: self.pending_sd_imaginary,
            cooldown_remaining: self.cooldown_remaining,
            consecutive_real_losses: self.consecutive_real_losses,
            actual_pnl: self.ledger.actual_pnl(),
            simulated_pnl: self.ledger.simulated_pnl(),
        }
    }

    /// Builds an engine from an exported record.
    ///
    /// # Errors
    /// Rejects records of an unsupported version.
    pub fn import_state(config: EngineConfig, record: StateRecord) -> Result<Self, EngineError> {
        if record.version != STATE_RECORD_VERSION {
            return Err(EngineError::InvalidConfig(format!(
                "unsupported state record version {}",
                record.version
            )));
        }

        let mut engine = Self::new(config);
        engine.tracker = record.blocks;
        engine.evaluator = record.pending_signals;
        engine.results = record.results;
        engine.lifecycle = record.pattern_cycles;
        engine.zz = record.pocket_state;
        engine.buckets = record.buckets;
        engine.kill_machines = record.bns_kill_machines;
        engine.pauses = record.pause_state;
        engine.hostility = record.hostility;
        engine.samedir = record.same_direction;
        engine.ledger = record.ledger;
        engine.arbiter = record.decision_log;
        engine.snapshots = record.snapshots;
        engine.pending_trade = record.pending_trade;
        engine.pending_sd_imaginary = record.pending_sd_imaginary;
        engine.cooldown_remaining = record.cooldown_remaining;
        engine.consecutive_real_losses = record.consecutive_real_losses;
        Ok(engine)
    }

    /// Serializes the state record to JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.export_state())?)
    }

    /// Builds an engine from a JSON state record.
    ///
    /// # Errors
    /// Returns an error on malformed JSON or an unsupported version.
    pub fn import_json(config: EngineConfig, json: &str) -> Result<Self> {
        let record: StateRecord = serde_json::from_str(json)?;
        Ok(Self::import_state(config, record)?)
    }
}
