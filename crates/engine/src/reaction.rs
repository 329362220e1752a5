//! Per-block orchestration and exact rollback.
//!
//! One tick per block, eleven ordered steps: append, structural breaks,
//! signal resolution, lifecycle and hostility updates, bucket transitions,
//! detection, same-direction observation, trade settlement, the hierarchy
//! decision, and a snapshot. Undo pops the last block and re-derives every
//! subsystem by replaying the remaining history through the same pass
//! functions the live pipeline uses, so replayed state is bit-for-bit the
//! state the live path would have produced.

use crate::bns_kill::BnsKillMachines;
use crate::bucket::BucketManager;
use crate::hierarchy::{DecisionSource, HierarchyArbiter, HierarchyDecision};
use crate::hostility::HostilityManager;
use crate::ledger::{DualLedger, LedgerEntry};
use crate::pause::{PauseManager, PauseTrack};
use crate::samedir::SameDirectionManager;
use crate::snapshot::{EngineSnapshot, SnapshotStore};
use crate::zz::{ZzAction, ZzStateManager};
use pattern_bet_core::{Block, Direction, EngineConfig, EngineError, Pattern};
use pattern_bet_patterns::{
    BlockTracker, EvaluatedResult, LifecycleEvent, PatternDetector, PatternLifecycle,
    PatternSignal, RunBreak, SignalEvaluator,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Blocks of real-bet suppression armed by consecutive losses.
const COOLDOWN_BLOCKS: u32 = 3;
/// Consecutive real losses that arm the cooldown.
const COOLDOWN_LOSS_STREAK: u32 = 2;

/// A trade opened on one block, settling on the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTrade {
    pub source: DecisionSource,
    pub pattern: Option<Pattern>,
    pub direction: Direction,
    pub opened_at: u32,
    pub is_inverse: bool,
    pub is_actual: bool,
}

/// Aggregate queries the embedding reads after each block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub block_count: usize,
    pub run_count: usize,
    pub actual_pnl: Decimal,
    pub simulated_pnl: Decimal,
    pub actual_win_rate: f64,
    pub aap: Decimal,
    pub hostility_score: f64,
    pub is_locked: bool,
    pub is_stopped: bool,
    pub cooldown_remaining: u32,
    pub daily_target_reached: bool,
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOutcome {
    pub block: Block,
    pub results: Vec<EvaluatedResult>,
    pub new_signals: Vec<PatternSignal>,
    pub decision: HierarchyDecision,
    pub opened_trade: Option<PendingTrade>,
    pub closed_trade: Option<LedgerEntry>,
    pub stats: EngineStats,
}

/// The decision and state engine. Owns all mutable state; subsystems never
/// reach into their siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionEngine {
    pub(crate) config: EngineConfig,
    pub(crate) tracker: BlockTracker,
    pub(crate) evaluator: SignalEvaluator,
    pub(crate) lifecycle: PatternLifecycle,
    pub(crate) results: Vec<EvaluatedResult>,
    pub(crate) hostility: HostilityManager,
    pub(crate) pauses: PauseManager,
    pub(crate) samedir: SameDirectionManager,
    pub(crate) buckets: BucketManager,
    pub(crate) kill_machines: BnsKillMachines,
    pub(crate) zz: ZzStateManager,
    pub(crate) arbiter: HierarchyArbiter,
    pub(crate) ledger: DualLedger,
    pub(crate) snapshots: SnapshotStore,
    pub(crate) pending_trade: Option<PendingTrade>,
    pub(crate) pending_sd_imaginary: Option<Direction>,
    pub(crate) cooldown_remaining: u32,
    pub(crate) consecutive_real_losses: u32,
    pub(crate) trading_window_open: bool,
    pub(crate) halted: Option<&'static str>,
}

impl ReactionEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tracker: BlockTracker::new(),
            evaluator: SignalEvaluator::new(),
            lifecycle: PatternLifecycle::new(),
            results: Vec::new(),
            hostility: HostilityManager::new(config.hostility.clone()),
            pauses: PauseManager::new(config.pause.clone()),
            samedir: SameDirectionManager::new(config.same_direction.clone()),
            buckets: BucketManager::new(config.bucket.clone()),
            kill_machines: BnsKillMachines::new(),
            zz: ZzStateManager::new(),
            arbiter: HierarchyArbiter::new(),
            ledger: DualLedger::new(),
            snapshots: SnapshotStore::new(),
            pending_trade: None,
            pending_sd_imaginary: None,
            cooldown_remaining: 0,
            consecutive_real_losses: 0,
            trading_window_open: true,
            halted: None,
            config,
        }
    }

    /// Clears all state, equivalent to a new session.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    /// Sets the trading-window oracle supplied by the embedding.
    pub fn set_trading_window(&mut self, open: bool) {
        self.trading_window_open = open;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn tracker(&self) -> &BlockTracker {
        &self.tracker
    }

    #[must_use]
    pub fn lifecycle(&self) -> &PatternLifecycle {
        &self.lifecycle
    }

    #[must_use]
    pub fn results(&self) -> &[EvaluatedResult] {
        &self.results
    }

    #[must_use]
    pub fn pending_signals(&self) -> &[PatternSignal] {
        self.evaluator.pending()
    }

    #[must_use]
    pub fn hostility(&self) -> &HostilityManager {
        &self.hostility
    }

    #[must_use]
    pub fn pauses(&self) -> &PauseManager {
        &self.pauses
    }

    #[must_use]
    pub fn samedir(&self) -> &SameDirectionManager {
        &self.samedir
    }

    #[must_use]
    pub fn buckets(&self) -> &BucketManager {
        &self.buckets
    }

    #[must_use]
    pub fn kill_machines(&self) -> &BnsKillMachines {
        &self.kill_machines
    }

    #[must_use]
    pub fn zz(&self) -> &ZzStateManager {
        &self.zz
    }

    #[must_use]
    pub fn decisions(&self) -> &[HierarchyDecision] {
        self.arbiter.decisions()
    }

    #[must_use]
    pub fn ledger(&self) -> &DualLedger {
        &self.ledger
    }

    #[must_use]
    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    #[must_use]
    pub fn pending_trade(&self) -> Option<&PendingTrade> {
        self.pending_trade.as_ref()
    }

    #[must_use]
    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// The direction the engine currently predicts, from the open trade or
    /// the most recent decision.
    #[must_use]
    pub fn current_prediction(&self) -> Option<Direction> {
        if let Some(trade) = &self.pending_trade {
            return Some(trade.direction);
        }
        self.arbiter.decisions().last().and_then(|d| d.direction)
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            block_count: self.tracker.len(),
            run_count: self.tracker.runs().len(),
            actual_pnl: self.ledger.actual_pnl(),
            simulated_pnl: self.ledger.simulated_pnl(),
            actual_win_rate: self.ledger.actual_win_rate(),
            aap: self.lifecycle.aap(),
            hostility_score: self.hostility.score(),
            is_locked: self.hostility.is_locked(),
            is_stopped: self.pauses.is_stopped(),
            cooldown_remaining: self.cooldown_remaining,
            daily_target_reached: self.daily_target_reached(),
        }
    }

    fn daily_target_reached(&self) -> bool {
        self.ledger.actual_pnl() >= self.config.daily_target
    }

    // ------------------------------------------------------------------
    // Block ingestion
    // ------------------------------------------------------------------

    /// Ingests one block through the full pipeline.
    ///
    /// # Errors
    /// Rejects invalid input, refuses blocks after a halt, and halts on an
    /// invariant violation.
    pub fn add_block(
        &mut self,
        direction: i32,
        magnitude: Decimal,
    ) -> Result<BlockOutcome, EngineError> {
        let direction =
            Direction::from_sign(direction).ok_or(EngineError::InvalidDirection(direction))?;
        self.add_block_typed(direction, magnitude)
    }

    /// Typed variant of [`Self::add_block`].
    ///
    /// # Errors
    /// Same contract as [`Self::add_block`].
    pub fn add_block_typed(
        &mut self,
        direction: Direction,
        magnitude: Decimal,
    ) -> Result<BlockOutcome, EngineError> {
        if let Some(component) = self.halted {
            return Err(EngineError::Halted(component));
        }

        // 1. Append.
        let (block, run_break) = self.tracker.add_block(direction, magnitude)?;

        // 2. Structural breaks from run transitions.
        let prev_completed = previous_completed_length(&self.tracker);
        let mut events = structural_pass(
            &mut self.lifecycle,
            &mut self.hostility,
            run_break.as_ref(),
            prev_completed,
            block.index,
        );

        // 3-5. Resolve signals; the pocket manager, lifecycle, hostility,
        // and same-direction react to each result in insertion order.
        let mut results = self.evaluator.resolve(&block, self.config.neutral_band);
        if let Some(trade) = &self.pending_trade {
            for result in &mut results {
                if trade.pattern == Some(result.pattern) && trade.opened_at + 1 == block.index {
                    result.was_bet = true;
                }
            }
        }
        let (result_events, follow_ups) = results_pass(
            &results,
            &mut self.lifecycle,
            &mut self.hostility,
            &mut self.samedir,
            &mut self.zz,
        );
        events.extend(result_events);
        let zz_signal_created = !follow_ups.is_empty();
        for signal in follow_ups {
            self.enqueue_signal(signal);
        }
        self.results.extend(results.iter().cloned());

        // 6. Buckets: result accounting, lifecycle transitions, kills.
        buckets_pass(
            &mut self.buckets,
            &mut self.kill_machines,
            &results,
            &events,
            run_break.as_ref(),
            block.index,
        );

        // Confirmed divergence on the pocket family suppresses its betting
        // while state tracking continues.
        self.zz
            .set_bait_switch(zz_bait_switch_engaged(&self.hostility));

        // 7. Detection. The ZZ indicator is consulted only while the
        // pocket family is idle, and yields at most one signal per block.
        let detected = PatternDetector::detect(
            &self.tracker,
            |p| self.evaluator.has_pending(p),
            self.config.ap5_confirm_threshold,
        );
        for signal in detected {
            self.enqueue_signal(signal);
        }
        if self.zz.active().is_none() && !zz_signal_created {
            if let Some(indicator_direction) = PatternDetector::zz_indicator(&self.tracker) {
                if let Some(signal) = self.zz.on_indicator(indicator_direction, block.index) {
                    self.lifecycle
                        .save_indicator_direction(signal.pattern, indicator_direction);
                    self.enqueue_signal(signal);
                    if let Some(pattern) = self.zz.active() {
                        self.lifecycle.activate(pattern);
                    }
                }
            }
        }

        // 8. Same-direction block observation.
        self.samedir
            .on_block(block, run_break.as_ref(), self.zz.active().is_some());

        // 9. Settle the trade opened on the previous block.
        let closed_trade = self.settle_pending_trade(&block);
        if let Some(sd_direction) = self.pending_sd_imaginary.take() {
            self.samedir
                .on_imaginary_trade(block.direction == sd_direction, block.magnitude);
        }
        self.hostility.on_block(block.index, self.ledger.actual_pnl());
        self.pauses.check_stop_game(
            self.ledger.total_pnl(),
            self.ledger.actual_pnl(),
            block.index,
        );

        // 10. Decide and possibly open a new trade.
        let new_signals: Vec<PatternSignal> = self
            .evaluator
            .pending()
            .iter()
            .filter(|s| s.signal_index == block.index)
            .copied()
            .collect();
        let long_run_engaged =
            self.tracker.current_run_length() >= self.config.p1_consecutive_threshold;
        let decision = self.arbiter.decide(
            &block,
            &self.zz,
            &self.samedir,
            &self.buckets,
            &self.lifecycle,
            &new_signals,
            &self.pauses,
            long_run_engaged,
        );
        let opened_trade = self.open_trade(&decision, &block);
        if self.pending_trade.is_none() && self.samedir.is_active() && self.samedir.is_paused() {
            self.pending_sd_imaginary = Some(SameDirectionManager::bet_direction(block.direction));
        }

        // Cooldown and pause countdowns.
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);
        self.pauses.tick();

        // 11. Snapshot.
        self.snapshots.capture(EngineSnapshot {
            block_index: block.index,
            bucket: self.buckets.clone(),
            pause: self.pauses.clone(),
            samedir: self.samedir.clone(),
            hostility: self.hostility.clone(),
            ledger: self.ledger.clone(),
        });

        self.check_invariants()?;

        Ok(BlockOutcome {
            block,
            results,
            new_signals,
            decision,
            opened_trade,
            closed_trade,
            stats: self.stats(),
        })
    }

    fn enqueue_signal(&mut self, signal: PatternSignal) {
        if self.evaluator.has_pending(signal.pattern) {
            return;
        }
        self.lifecycle
            .note_formation(signal.pattern, signal.signal_index);
        self.evaluator.push(signal);
    }

    fn settle_pending_trade(&mut self, block: &Block) -> Option<LedgerEntry> {
        let trade = self.pending_trade.take()?;

        let is_win = block.direction == trade.direction;
        let is_actual = trade.is_actual
            && (self.trading_window_open || self.config.trading_window.allow_close_outside_window);
        let entry = LedgerEntry::new(
            block.index,
            trade.pattern,
            trade.source,
            trade.direction,
            block.magnitude,
            is_win,
            is_actual,
        );
        tracing::info!(
            block = block.index,
            source = ?trade.source,
            is_win,
            pnl = %entry.pnl,
            "trade settled"
        );

        trades_pass(
            &mut self.hostility,
            &mut self.pauses,
            &mut self.samedir,
            std::slice::from_ref(&entry),
            block.index,
        );

        if entry.is_actual {
            if is_win {
                self.consecutive_real_losses = 0;
            } else {
                self.consecutive_real_losses += 1;
                if self.consecutive_real_losses >= COOLDOWN_LOSS_STREAK
                    && self.cooldown_remaining == 0
                {
                    self.cooldown_remaining = COOLDOWN_BLOCKS;
                    tracing::info!("cooldown armed after consecutive real losses");
                }
            }
        }

        self.ledger.push(entry.clone());
        Some(entry)
    }

    fn open_trade(&mut self, decision: &HierarchyDecision, block: &Block) -> Option<PendingTrade> {
        if !decision.should_bet {
            return None;
        }
        if self.cooldown_remaining > 0 {
            tracing::debug!("bet suppressed by cooldown");
            return None;
        }
        if self.daily_target_reached() {
            tracing::debug!("bet suppressed: daily target reached");
            return None;
        }
        if self.config.trading_window.enabled && !self.trading_window_open {
            tracing::debug!("bet suppressed: outside trading window");
            return None;
        }

        let direction = decision.direction?;
        let trade = PendingTrade {
            source: decision.source,
            pattern: decision.pattern,
            direction,
            opened_at: block.index,
            is_inverse: decision.is_inverse,
            is_actual: !self.hostility.is_locked(),
        };
        if decision.is_inverse {
            if let Some(pattern) = decision.pattern {
                self.buckets
                    .note_switch_played(pattern, block.index, &mut self.kill_machines);
                self.evaluator.mark_inverse(pattern);
            }
        }
        tracing::info!(
            block = block.index,
            source = ?trade.source,
            ?direction,
            actual = trade.is_actual,
            "trade opened"
        );
        self.pending_trade = Some(trade.clone());
        Some(trade)
    }

    fn check_invariants(&mut self) -> Result<(), EngineError> {
        let checks = [
            self.tracker.check_invariants(),
            self.buckets.check_invariants(),
        ];
        for check in checks {
            if let Err(err) = check {
                let component = match &err {
                    EngineError::InvariantViolation { component, .. } => component,
                    _ => "engine",
                };
                self.halted = Some(component);
                return Err(err);
            }
        }
        if !self.zz.single_active_holds() {
            self.halted = Some("zz");
            return Err(EngineError::invariant("zz", "both pocket patterns active"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Undo
    // ------------------------------------------------------------------

    /// Pops the last block and re-derives all subsystem state from the
    /// remaining history. Returns the removed block, or `None` on an empty
    /// session.
    pub fn undo_last_block(&mut self) -> Option<Block> {
        let popped = self.tracker.pop_block()?;
        tracing::info!(block = popped.index, "undoing last block");

        // Drop everything the popped block produced.
        self.evaluator.remove_created_at(popped.index);
        let (undone, kept): (Vec<_>, Vec<_>) = self
            .results
            .drain(..)
            .partition(|r| r.eval_index == popped.index);
        self.results = kept;
        self.evaluator
            .restore_pending(undone.iter().map(EvaluatedResult::to_pending_signal));

        let removed_entries = self.ledger.remove_at(popped.index);
        self.arbiter.remove_at(popped.index);
        self.snapshots.pop_last();

        // A trade opened on the popped block vanishes; one settled on it
        // reverts to pending.
        self.pending_trade = removed_entries.first().map(|entry| {
            let is_inverse = self
                .arbiter
                .decisions()
                .iter()
                .rev()
                .find(|d| d.block_index + 1 == popped.index)
                .is_some_and(|d| d.is_inverse);
            PendingTrade {
                source: entry.source,
                pattern: entry.pattern,
                direction: entry.direction,
                opened_at: popped.index - 1,
                is_inverse,
                is_actual: entry.is_actual,
            }
        });

        self.rebuild_derived_state();

        // Historical cooldown is not re-triggered.
        self.cooldown_remaining = 0;
        self.consecutive_real_losses = self
            .ledger
            .actual
            .iter()
            .rev()
            .take_while(|e| !e.is_win)
            .count()
            .min(COOLDOWN_LOSS_STREAK as usize) as u32;

        Some(popped)
    }

    /// Replays blocks, results, structural breaks, and settled trades
    /// through fresh subsystem instances using the same pass functions as
    /// the live pipeline. Pocket assignments fall out of the replayed ZZ
    /// results; the bucket cache is re-synced to the rebuilt lifecycle at
    /// the end.
    fn rebuild_derived_state(&mut self) {
        let mut lifecycle = PatternLifecycle::new();
        let mut hostility = HostilityManager::new(self.config.hostility.clone());
        let mut pauses = PauseManager::new(self.config.pause.clone());
        let mut samedir = SameDirectionManager::new(self.config.same_direction.clone());
        let mut buckets = BucketManager::new(self.config.bucket.clone());
        let mut kill_machines = BnsKillMachines::new();
        let mut zz = ZzStateManager::new();
        let mut replay_tracker = BlockTracker::new();
        let mut pending_sd_imaginary: Option<Direction> = None;
        let mut actual_pnl = Decimal::ZERO;
        let mut total_pnl = Decimal::ZERO;

        let blocks: Vec<Block> = self.tracker.blocks().to_vec();
        let last_index = blocks.len().checked_sub(1);

        for (i, source_block) in blocks.iter().enumerate() {
            let Ok((block, run_break)) =
                replay_tracker.add_block(source_block.direction, source_block.magnitude)
            else {
                // Already validated on first ingestion.
                continue;
            };

            // Step 2.
            let prev_completed = previous_completed_length(&replay_tracker);
            let mut events = structural_pass(
                &mut lifecycle,
                &mut hostility,
                run_break.as_ref(),
                prev_completed,
                block.index,
            );

            // Steps 3-5 over the stored results of this block.
            let block_results: Vec<EvaluatedResult> = self
                .results
                .iter()
                .filter(|r| r.eval_index == block.index)
                .cloned()
                .collect();
            let (result_events, follow_ups) = results_pass(
                &block_results,
                &mut lifecycle,
                &mut hostility,
                &mut samedir,
                &mut zz,
            );
            events.extend(result_events);
            let zz_signal_created = !follow_ups.is_empty();

            // Step 6.
            buckets_pass(
                &mut buckets,
                &mut kill_machines,
                &block_results,
                &events,
                run_break.as_ref(),
                block.index,
            );

            zz.set_bait_switch(zz_bait_switch_engaged(&hostility));

            // Step 7: formations re-marked from the signals known to have
            // been created on this block; the indicator replays against
            // the same guard the live path uses.
            for (pattern, formed_at) in
                signals_created_at(&self.results, self.evaluator.pending(), block.index)
            {
                lifecycle.note_formation(pattern, formed_at);
            }
            if zz.active().is_none() && !zz_signal_created {
                if let Some(indicator_direction) = PatternDetector::zz_indicator(&replay_tracker) {
                    if let Some(signal) = zz.on_indicator(indicator_direction, block.index) {
                        lifecycle.save_indicator_direction(signal.pattern, indicator_direction);
                        if let Some(pattern) = zz.active() {
                            lifecycle.activate(pattern);
                        }
                    }
                }
            }

            // Step 8.
            samedir.on_block(block, run_break.as_ref(), zz.active().is_some());

            // Step 9 over the stored ledger entries of this block.
            let entries: Vec<LedgerEntry> = self
                .ledger
                .entries_at(block.index)
                .into_iter()
                .cloned()
                .collect();
            if let Some(sd_direction) = pending_sd_imaginary.take() {
                samedir.on_imaginary_trade(block.direction == sd_direction, block.magnitude);
            }
            for entry in &entries {
                if entry.is_actual {
                    actual_pnl += entry.pnl;
                }
                total_pnl += entry.pnl;
            }
            trades_pass(
                &mut hostility,
                &mut pauses,
                &mut samedir,
                &entries,
                block.index,
            );
            hostility.on_block(block.index, actual_pnl);
            pauses.check_stop_game(total_pnl, actual_pnl, block.index);

            // Step 10 reduced to its side effects: whether a trade opened
            // here, the switch-played mark, and the imaginary
            // same-direction bet while paused.
            let trade_opened = !self.ledger.entries_at(block.index + 1).is_empty()
                || (Some(i) == last_index && self.pending_trade.is_some());
            if trade_opened {
                let decision = self
                    .arbiter
                    .decisions()
                    .iter()
                    .find(|d| d.block_index == block.index && d.should_bet);
                if let Some(decision) = decision {
                    if decision.is_inverse {
                        if let Some(pattern) = decision.pattern {
                            buckets.note_switch_played(pattern, block.index, &mut kill_machines);
                        }
                    }
                }
            }
            if !trade_opened && samedir.is_active() && samedir.is_paused() {
                pending_sd_imaginary = Some(SameDirectionManager::bet_direction(block.direction));
            }

            pauses.tick();
        }

        buckets.sync_last_known(|p| lifecycle.is_active(p));

        self.lifecycle = lifecycle;
        self.hostility = hostility;
        self.pauses = pauses;
        self.samedir = samedir;
        self.buckets = buckets;
        self.kill_machines = kill_machines;
        self.zz = zz;
        self.pending_sd_imaginary = pending_sd_imaginary;
    }
}

// ----------------------------------------------------------------------
// Shared pass functions (live pipeline and undo replay)
// ----------------------------------------------------------------------

fn previous_completed_length(tracker: &BlockTracker) -> Option<u32> {
    let runs = tracker.runs();
    match runs.len() {
        0..=2 => None,
        n => Some(runs[n - 3].length),
    }
}

/// Confirmed observation-vs-active divergence on either pocket pattern
/// puts the family into bait-and-switch mode.
fn zz_bait_switch_engaged(hostility: &HostilityManager) -> bool {
    use crate::hostility::BaitStatus;
    hostility.bait_status(Pattern::Zz) == BaitStatus::Confirmed
        || hostility.bait_status(Pattern::AntiZz) == BaitStatus::Confirmed
}

/// Patterns and formation blocks of every signal created on `block_index`,
/// reconstructed from resolved results plus still-pending signals.
fn signals_created_at(
    results: &[EvaluatedResult],
    pending: &[PatternSignal],
    block_index: u32,
) -> Vec<(Pattern, u32)> {
    let mut created: Vec<(Pattern, u32)> = results
        .iter()
        .filter(|r| r.signal_index == block_index)
        .map(|r| (r.pattern, r.signal_index))
        .collect();
    created.extend(
        pending
            .iter()
            .filter(|s| s.signal_index == block_index)
            .map(|s| (s.pattern, s.signal_index)),
    );
    created
}

/// Step 2: break active rhythm patterns whose structure the completed run
/// violates.
fn structural_pass(
    lifecycle: &mut PatternLifecycle,
    hostility: &mut HostilityManager,
    run_break: Option<&RunBreak>,
    prev_completed: Option<u32>,
    block_index: u32,
) -> Vec<LifecycleEvent> {
    let Some(run_break) = run_break else {
        return Vec::new();
    };
    let mut events = Vec::new();
    for base in BnsKillMachines::MONITORED {
        if !BnsKillMachines::rhythm_violated(base, run_break.completed.length, prev_completed) {
            continue;
        }
        for pattern in [base, base.opposite()] {
            if let Some(event) = lifecycle.apply_structural_break(pattern, block_index) {
                hostility.on_pattern_break(pattern, event.break_run_profit, block_index);
                events.push(event);
            }
        }
    }
    events
}

/// Steps 3-5: route each result to the pocket manager, the lifecycle, the
/// hostility tracker, and the same-direction manager, in insertion order.
fn results_pass(
    results: &[EvaluatedResult],
    lifecycle: &mut PatternLifecycle,
    hostility: &mut HostilityManager,
    samedir: &mut SameDirectionManager,
    zz: &mut ZzStateManager,
) -> (Vec<LifecycleEvent>, Vec<PatternSignal>) {
    let mut events = Vec::new();
    let mut follow_ups = Vec::new();

    for result in results {
        let zz_action = match result.pattern {
            Pattern::Zz => {
                let (action, next) = zz.on_zz_result(result);
                follow_ups.extend(next);
                Some(action)
            }
            Pattern::AntiZz => {
                let (action, next) = zz.on_anti_result(result);
                follow_ups.extend(next);
                Some(action)
            }
            _ => None,
        };

        let was_active = lifecycle.is_active(result.pattern);
        let event = lifecycle.apply_result(result);
        hostility.observe_result(result, was_active);
        if event.broke {
            hostility.on_pattern_break(result.pattern, event.break_run_profit, result.eval_index);
        }
        samedir.on_pattern_result(result, zz_action);
        // Mirror pocket activity into the lifecycle so ZZ-family losses
        // run the same break-and-transfer path as bucket patterns.
        match zz_action {
            Some(ZzAction::ImaginaryPromoted | ZzAction::AntiLossSwapped) => {
                lifecycle.activate(Pattern::Zz);
            }
            Some(ZzAction::AntiWin) => lifecycle.deactivate(Pattern::AntiZz),
            _ => {}
        }
        if event.activated || event.broke {
            events.push(event);
        }
    }

    (events, follow_ups)
}

/// Step 6: bucket accounting, lifecycle-driven transitions, and the
/// structural BNS kill checks.
fn buckets_pass(
    buckets: &mut BucketManager,
    kill_machines: &mut BnsKillMachines,
    results: &[EvaluatedResult],
    events: &[LifecycleEvent],
    run_break: Option<&RunBreak>,
    block_index: u32,
) {
    for result in results {
        buckets.process_result(result, kill_machines);
    }
    let switch_settled: Vec<Pattern> = results
        .iter()
        .filter(|r| r.is_inverse_play)
        .map(|r| r.pattern)
        .collect();
    buckets.update_from_lifecycle(events, &switch_settled, block_index, kill_machines);
    if let Some(run_break) = run_break {
        for base in kill_machines.observe_run_break(run_break) {
            buckets.kill_bns(base, block_index, kill_machines);
        }
    }
}

/// Step 9 bookkeeping for settled trades: hostility counters, pause
/// tracks, and the same-direction trade feedback.
fn trades_pass(
    hostility: &mut HostilityManager,
    pauses: &mut PauseManager,
    samedir: &mut SameDirectionManager,
    entries: &[LedgerEntry],
    block_index: u32,
) {
    for entry in entries {
        hostility.observe_trade(block_index, entry.is_win, entry.magnitude);
        let track = match entry.source {
            DecisionSource::Pocket => PauseTrack::Pocket,
            DecisionSource::SameDir => PauseTrack::SameDir,
            DecisionSource::Bucket | DecisionSource::None => PauseTrack::Bucket,
        };
        pauses.record_result(track, entry.pnl, block_index);
        if entry.source == DecisionSource::SameDir {
            samedir.on_trade(entry.is_win, entry.magnitude);
        }
    }
}
