//! Bucket classification and the bait-and-switch lifecycle.
//!
//! Every non-ZZ pattern sits in one of three buckets: MAIN plays the
//! pattern's prediction, WAITING plays nothing, BNS plays the inverse once
//! a bait is confirmed. Entering BNS blocks the opposite pattern; only one
//! side of a pair may run a bait cycle at a time.

use crate::bns_kill::BnsKillMachines;
use pattern_bet_core::{BucketConfig, BucketKind, EngineError, Pattern};
use pattern_bet_patterns::{EvaluatedResult, LifecycleEvent};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bait-and-switch sub-state while a pattern is in BNS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BnsSub {
    pub waiting_for_bait: bool,
    pub cumulative_bait_profit: Decimal,
    pub bait_confirmed: bool,
    pub switch_played: bool,
    pub entered_at_block: u32,
    pub consecutive_bait_losses: u32,
}

impl BnsSub {
    fn new(seed: Decimal, entered_at_block: u32) -> Self {
        Self {
            waiting_for_bait: true,
            cumulative_bait_profit: seed,
            bait_confirmed: false,
            switch_played: false,
            entered_at_block,
            consecutive_bait_losses: 0,
        }
    }
}

/// One recorded bucket transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTransition {
    pub block_index: u32,
    pub from: BucketKind,
    pub to: BucketKind,
    pub reason: String,
}

/// Bucket state for one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternBucketState {
    pub bucket: BucketKind,
    pub bns: Option<BnsSub>,
    pub blocked_by_opposite: bool,
    pub blocked_accumulation: Decimal,
    pub consecutive_opposite_wins: u32,
    pub history: Vec<BucketTransition>,
}

impl Default for PatternBucketState {
    fn default() -> Self {
        Self {
            bucket: BucketKind::Waiting,
            bns: None,
            blocked_by_opposite: false,
            blocked_accumulation: Decimal::ZERO,
            consecutive_opposite_wins: 0,
            history: Vec::new(),
        }
    }
}

/// How the hierarchy should play a bucket pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Bet the pattern's predicted direction.
    Normal,
    /// Bet against the prediction (the switch trade).
    Inverse,
}

/// Bucket states for all non-ZZ patterns plus the lifecycle cache used for
/// edge detection after a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketManager {
    config: BucketConfig,
    states: Vec<PatternBucketState>,
    last_known_active: Vec<bool>,
}

impl BucketManager {
    #[must_use]
    pub fn new(config: BucketConfig) -> Self {
        Self {
            config,
            states: vec![PatternBucketState::default(); Pattern::COUNT],
            last_known_active: vec![false; Pattern::COUNT],
        }
    }

    #[must_use]
    pub fn state(&self, pattern: Pattern) -> &PatternBucketState {
        &self.states[pattern.index()]
    }

    #[must_use]
    pub fn bucket(&self, pattern: Pattern) -> BucketKind {
        self.states[pattern.index()].bucket
    }

    /// Whether and how the hierarchy may play this pattern's signal.
    #[must_use]
    pub fn play_mode(&self, pattern: Pattern) -> Option<PlayMode> {
        if pattern.is_zz_family() {
            return None;
        }
        let state = self.state(pattern);
        if state.blocked_by_opposite {
            return None;
        }
        match state.bucket {
            BucketKind::Main => Some(PlayMode::Normal),
            BucketKind::Bns => match &state.bns {
                Some(sub) if sub.bait_confirmed && !sub.switch_played => Some(PlayMode::Inverse),
                _ => None,
            },
            BucketKind::Waiting => None,
        }
    }

    fn transition(&mut self, pattern: Pattern, to: BucketKind, block_index: u32, reason: &str) {
        let state = &mut self.states[pattern.index()];
        let from = state.bucket;
        if from == to {
            return;
        }
        tracing::debug!(%pattern, ?from, ?to, reason, "bucket transition");
        state.history.push(BucketTransition {
            block_index,
            from,
            to,
            reason: reason.to_string(),
        });
        state.bucket = to;
        if to != BucketKind::Bns {
            state.bns = None;
        }
    }

    fn enter_bns(
        &mut self,
        pattern: Pattern,
        seed: Decimal,
        block_index: u32,
        kill_machines: &mut BnsKillMachines,
    ) {
        self.transition(pattern, BucketKind::Bns, block_index, "decisive break");
        self.states[pattern.index()].bns = Some(BnsSub::new(seed, block_index));
        kill_machines.begin_monitoring(pattern, block_index);

        let opp = pattern.opposite().index();
        self.states[opp].blocked_by_opposite = true;
        self.states[opp].blocked_accumulation = Decimal::ZERO;
        self.states[pattern.index()].consecutive_opposite_wins = 0;
        if self.states[opp].bucket == BucketKind::Main {
            let opposite = pattern.opposite();
            self.transition(opposite, BucketKind::Waiting, block_index, "paired BNS block");
        }
    }

    fn leave_bns(
        &mut self,
        pattern: Pattern,
        to: BucketKind,
        block_index: u32,
        reason: &str,
        kill_machines: &mut BnsKillMachines,
    ) {
        self.transition(pattern, to, block_index, reason);
        kill_machines.end_monitoring(pattern);
        self.unblock_opposite(pattern, block_index);
    }

    /// Clears the opposite's blocked flag and promotes it to MAIN when its
    /// accumulation while blocked cleared the bait threshold.
    fn unblock_opposite(&mut self, pattern: Pattern, block_index: u32) {
        let opposite = pattern.opposite();
        let opp = opposite.index();
        if !self.states[opp].blocked_by_opposite {
            return;
        }
        self.states[opp].blocked_by_opposite = false;
        if self.states[opp].blocked_accumulation >= self.config.single_bait_threshold {
            self.transition(
                opposite,
                BucketKind::Main,
                block_index,
                "accumulated while blocked",
            );
        }
        self.states[opp].blocked_accumulation = Decimal::ZERO;
    }

    /// Feeds one evaluated result through the bucket rules: blocked-pattern
    /// accounting, bait observation with the bait-failed exit, and switch
    /// settlement.
    pub fn process_result(
        &mut self,
        result: &EvaluatedResult,
        kill_machines: &mut BnsKillMachines,
    ) {
        let pattern = result.pattern;
        if pattern.is_zz_family() {
            return;
        }
        let idx = pattern.index();
        let block_index = result.eval_index;

        // Switch settlement.
        if result.is_inverse_play {
            if self.states[idx].bucket == BucketKind::Bns
                && self.states[idx]
                    .bns
                    .as_ref()
                    .is_some_and(|sub| sub.switch_played)
            {
                self.settle_switch(pattern, result.profit, block_index, kill_machines);
            }
            return;
        }

        // Blocked-pattern imaginary accounting feeds the BNS side's
        // consecutive-wins counter.
        if self.states[idx].blocked_by_opposite {
            self.process_blocked_result(pattern, result, kill_machines);
            return;
        }

        // Bait observation while in BNS and unconfirmed.
        if self.states[idx].bucket == BucketKind::Bns {
            self.process_bait_observation(pattern, result, kill_machines);
        }
    }

    fn process_blocked_result(
        &mut self,
        pattern: Pattern,
        result: &EvaluatedResult,
        kill_machines: &mut BnsKillMachines,
    ) {
        let idx = pattern.index();
        let opposite = pattern.opposite();
        let opp = opposite.index();
        let block_index = result.eval_index;

        if result.is_correct() {
            self.states[idx].blocked_accumulation += result.profit;
            self.states[opp].consecutive_opposite_wins += 1;
            if self.states[opp].bucket == BucketKind::Bns
                && self.states[opp].consecutive_opposite_wins
                    >= self.config.consecutive_wins_to_break_bns
            {
                self.leave_bns(
                    opposite,
                    BucketKind::Waiting,
                    block_index,
                    "opposite win streak",
                    kill_machines,
                );
            }
        } else {
            self.states[idx].blocked_accumulation =
                (self.states[idx].blocked_accumulation + result.profit).max(Decimal::ZERO);
            self.states[opp].consecutive_opposite_wins = 0;
        }
    }

    fn process_bait_observation(
        &mut self,
        pattern: Pattern,
        result: &EvaluatedResult,
        kill_machines: &mut BnsKillMachines,
    ) {
        let idx = pattern.index();
        let block_index = result.eval_index;
        let single = self.config.single_bait_threshold;
        let cumulative = self.config.cumulative_bait_threshold;

        let Some(sub) = self.states[idx].bns.as_mut() else {
            return;
        };
        if sub.bait_confirmed {
            return;
        }

        if result.is_correct() {
            sub.waiting_for_bait = false;
            sub.consecutive_bait_losses = 0;
            sub.cumulative_bait_profit += result.profit;
            if result.profit >= single || sub.cumulative_bait_profit >= cumulative {
                sub.bait_confirmed = true;
                tracing::debug!(%pattern, "bait confirmed");
            }
        } else {
            sub.consecutive_bait_losses += 1;
            if sub.cumulative_bait_profit > Decimal::ZERO {
                self.leave_bns(
                    pattern,
                    BucketKind::Waiting,
                    block_index,
                    "bait failed",
                    kill_machines,
                );
            }
        }
    }

    fn settle_switch(
        &mut self,
        pattern: Pattern,
        pnl: Decimal,
        block_index: u32,
        kill_machines: &mut BnsKillMachines,
    ) {
        let invalidation = -self.config.single_bait_threshold;
        if pnl <= invalidation {
            self.leave_bns(
                pattern,
                BucketKind::Main,
                block_index,
                "switch invalidated",
                kill_machines,
            );
        } else if pnl < Decimal::ZERO {
            self.leave_bns(
                pattern,
                BucketKind::Waiting,
                block_index,
                "switch lost",
                kill_machines,
            );
        } else {
            // Switch won: stay in BNS and wait for the next bait cycle.
            let entered = self.states[pattern.index()]
                .bns
                .as_ref()
                .map_or(block_index, |s| s.entered_at_block);
            self.states[pattern.index()].bns = Some(BnsSub::new(Decimal::ZERO, entered));
            tracing::debug!(%pattern, %pnl, "switch won, awaiting next bait");
        }
    }

    /// Applies this block's lifecycle transitions to the buckets.
    ///
    /// `switch_settled` names patterns whose break this block came from a
    /// switch settlement; their bucket transition already happened there.
    pub fn update_from_lifecycle(
        &mut self,
        events: &[LifecycleEvent],
        switch_settled: &[Pattern],
        block_index: u32,
        kill_machines: &mut BnsKillMachines,
    ) {
        for event in events {
            let pattern = event.pattern;
            if pattern.is_zz_family() {
                continue;
            }
            let idx = pattern.index();

            if event.activated {
                match self.states[idx].bucket {
                    BucketKind::Waiting => {
                        if !self.states[idx].blocked_by_opposite {
                            self.transition(pattern, BucketKind::Main, block_index, "activated");
                        }
                    }
                    BucketKind::Bns => {
                        // Re-activation is the bait confirming itself. A
                        // cycle still waiting for its first bait (fresh
                        // after a switch win) is not confirmed by it.
                        if let Some(sub) = self.states[idx].bns.as_mut() {
                            if !sub.waiting_for_bait || sub.cumulative_bait_profit > Decimal::ZERO
                            {
                                sub.bait_confirmed = true;
                                sub.waiting_for_bait = false;
                            }
                        }
                    }
                    BucketKind::Main => {}
                }
                self.last_known_active[idx] = true;
            }

            if event.broke {
                if self.states[idx].bucket == BucketKind::Main
                    && !switch_settled.contains(&pattern)
                {
                    let decisive = event.break_run_profit <= -self.config.single_bait_threshold;
                    if decisive {
                        let opposite_in_bns =
                            self.states[pattern.opposite().index()].bucket == BucketKind::Bns;
                        if opposite_in_bns {
                            self.transition(
                                pattern,
                                BucketKind::Waiting,
                                block_index,
                                "break with pair already in BNS",
                            );
                        } else {
                            let seed = if event.transferred_to_opposite > Decimal::ZERO {
                                event.transferred_to_opposite
                            } else {
                                -event.break_run_profit
                            };
                            self.enter_bns(pattern, seed, block_index, kill_machines);
                        }
                    } else {
                        self.transition(pattern, BucketKind::Waiting, block_index, "break");
                    }
                }
                self.last_known_active[idx] = false;
            }
        }
    }

    /// Kills a BNS cycle on a structural rhythm violation. The kill lands
    /// on whichever side of the base pair is in BNS.
    pub fn kill_bns(
        &mut self,
        base: Pattern,
        block_index: u32,
        kill_machines: &mut BnsKillMachines,
    ) {
        for pattern in [base, base.opposite()] {
            if self.states[pattern.index()].bucket == BucketKind::Bns {
                self.leave_bns(
                    pattern,
                    BucketKind::Waiting,
                    block_index,
                    "rhythm violation",
                    kill_machines,
                );
                return;
            }
        }
    }

    /// Marks the switch trade as played.
    pub fn note_switch_played(
        &mut self,
        pattern: Pattern,
        block_index: u32,
        kill_machines: &mut BnsKillMachines,
    ) {
        if let Some(sub) = self.states[pattern.index()].bns.as_mut() {
            sub.switch_played = true;
            kill_machines.note_switch(pattern, block_index);
        }
    }

    /// Re-synchronizes the lifecycle cache so the next block does not
    /// misread an activation edge (undo path). ZZ slots stay untouched;
    /// the pocket manager owns that family.
    pub fn sync_last_known(&mut self, is_active: impl Fn(Pattern) -> bool) {
        for pattern in Pattern::ALL {
            if pattern.is_zz_family() {
                continue;
            }
            self.last_known_active[pattern.index()] = is_active(pattern);
        }
    }

    /// Verifies that at most one side of every pair is in BNS.
    ///
    /// # Errors
    /// Returns an invariant violation naming the pair.
    pub fn check_invariants(&self) -> Result<(), EngineError> {
        for pattern in Pattern::ALL {
            if pattern.is_anti() || pattern.is_zz_family() {
                continue;
            }
            let a = self.states[pattern.index()].bucket;
            let b = self.states[pattern.opposite().index()].bucket;
            if a == BucketKind::Bns && b == BucketKind::Bns {
                return Err(EngineError::invariant(
                    "bucket",
                    format!("both {pattern} and {} in BNS", pattern.opposite()),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pattern_bet_core::{Block, Direction};
    use pattern_bet_patterns::PatternSignal;
    use rust_decimal_macros::dec;

    fn manager() -> (BucketManager, BnsKillMachines) {
        (BucketManager::new(BucketConfig::default()), BnsKillMachines::new())
    }

    fn activation(pattern: Pattern) -> LifecycleEvent {
        LifecycleEvent {
            pattern,
            activated: true,
            broke: false,
            break_run_profit: dec!(0),
            transferred_to_opposite: dec!(0),
        }
    }

    fn break_event(pattern: Pattern, run_profit: Decimal, loss: Decimal) -> LifecycleEvent {
        LifecycleEvent {
            pattern,
            activated: false,
            broke: true,
            break_run_profit: run_profit,
            transferred_to_opposite: loss,
        }
    }

    fn win(pattern: Pattern, index: u32, pct: Decimal) -> EvaluatedResult {
        let signal = PatternSignal::new(pattern, index - 1, Direction::Up);
        EvaluatedResult::resolve(&signal, &Block::new(index, Direction::Up, pct), 0.05)
    }

    fn loss(pattern: Pattern, index: u32, pct: Decimal) -> EvaluatedResult {
        let signal = PatternSignal::new(pattern, index - 1, Direction::Up);
        EvaluatedResult::resolve(&signal, &Block::new(index, Direction::Down, pct), 0.05)
    }

    fn switch_result(pattern: Pattern, index: u32, pct: Decimal, won: bool) -> EvaluatedResult {
        let signal = PatternSignal::new(pattern, index - 1, Direction::Up).inverse();
        let dir = if won { Direction::Down } else { Direction::Up };
        EvaluatedResult::resolve(&signal, &Block::new(index, dir, pct), 0.05)
    }

    fn into_bns(buckets: &mut BucketManager, kills: &mut BnsKillMachines, pattern: Pattern) {
        buckets.update_from_lifecycle(&[activation(pattern)], &[], 5, kills);
        buckets.update_from_lifecycle(&[break_event(pattern, dec!(-80), dec!(80))], &[], 6, kills);
        assert_eq!(buckets.bucket(pattern), BucketKind::Bns);
    }

    // ============================================
    // Activation / Break Transition Tests
    // ============================================

    #[test]
    fn patterns_start_waiting() {
        let (buckets, _) = manager();
        for pattern in Pattern::ALL {
            assert_eq!(buckets.bucket(pattern), BucketKind::Waiting);
        }
    }

    #[test]
    fn activation_moves_waiting_to_main() {
        let (mut buckets, mut kills) = manager();
        buckets.update_from_lifecycle(&[activation(Pattern::Xax2)], &[], 5, &mut kills);
        assert_eq!(buckets.bucket(Pattern::Xax2), BucketKind::Main);
        assert_eq!(buckets.play_mode(Pattern::Xax2), Some(PlayMode::Normal));
    }

    #[test]
    fn mild_break_moves_main_to_waiting() {
        let (mut buckets, mut kills) = manager();
        buckets.update_from_lifecycle(&[activation(Pattern::Xax2)], &[], 5, &mut kills);
        buckets.update_from_lifecycle(
            &[break_event(Pattern::Xax2, dec!(-40), dec!(40))],
            &[],
            7,
            &mut kills,
        );
        assert_eq!(buckets.bucket(Pattern::Xax2), BucketKind::Waiting);
        assert_eq!(buckets.play_mode(Pattern::Xax2), None);
    }

    #[test]
    fn decisive_break_enters_bns_and_blocks_opposite() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Xax2);

        let state = buckets.state(Pattern::Xax2);
        let sub = state.bns.as_ref().unwrap();
        assert_eq!(sub.cumulative_bait_profit, dec!(80));
        assert!(!sub.bait_confirmed);
        assert!(buckets.state(Pattern::AntiXax2).blocked_by_opposite);
        assert_eq!(buckets.play_mode(Pattern::AntiXax2), None);
        buckets.check_invariants().unwrap();
    }

    #[test]
    fn bns_entry_starts_kill_monitoring_for_rhythm_patterns() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Oz);
        assert_eq!(kills.oz.monitoring_start_block, Some(6));
    }

    #[test]
    fn blocked_pattern_cannot_activate_to_main() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Xax2);
        buckets.update_from_lifecycle(&[activation(Pattern::AntiXax2)], &[], 8, &mut kills);
        assert_eq!(buckets.bucket(Pattern::AntiXax2), BucketKind::Waiting);
    }

    #[test]
    fn pair_cannot_hold_two_bns() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Xax2);
        // Unblock the opposite artificially by killing, then drive it into
        // a decisive break while the base re-enters BNS first.
        buckets.update_from_lifecycle(&[activation(Pattern::AntiXax2)], &[], 8, &mut kills);
        buckets.update_from_lifecycle(
            &[break_event(Pattern::AntiXax2, dec!(-90), dec!(90))],
            &[],
            9,
            &mut kills,
        );
        // The opposite was blocked and WAITING, so it never reaches BNS.
        buckets.check_invariants().unwrap();
        assert_eq!(buckets.bucket(Pattern::AntiXax2), BucketKind::Waiting);
    }

    // ============================================
    // Bait Observation Tests
    // ============================================

    #[test]
    fn single_decisive_bait_confirms() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Xax2);
        buckets.process_result(&win(Pattern::Xax2, 8, dec!(70)), &mut kills);
        let sub = buckets.state(Pattern::Xax2).bns.as_ref().unwrap();
        assert!(sub.bait_confirmed);
        assert_eq!(buckets.play_mode(Pattern::Xax2), Some(PlayMode::Inverse));
    }

    #[test]
    fn cumulative_bait_confirms_with_seed() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Xax2);
        // Seed 80 plus a 25 observation win crosses 100.
        buckets.process_result(&win(Pattern::Xax2, 8, dec!(25)), &mut kills);
        let sub = buckets.state(Pattern::Xax2).bns.as_ref().unwrap();
        assert!(sub.bait_confirmed);
        assert_eq!(sub.cumulative_bait_profit, dec!(105));
    }

    #[test]
    fn bait_failed_exits_to_waiting() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Xax2);
        buckets.process_result(&loss(Pattern::Xax2, 8, dec!(30)), &mut kills);
        assert_eq!(buckets.bucket(Pattern::Xax2), BucketKind::Waiting);
        assert!(!buckets.state(Pattern::AntiXax2).blocked_by_opposite);
    }

    #[test]
    fn bait_failure_promotes_blocked_opposite_past_threshold() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Xax2);
        buckets.process_result(&win(Pattern::AntiXax2, 7, dec!(75)), &mut kills);
        buckets.process_result(&loss(Pattern::Xax2, 8, dec!(30)), &mut kills);
        assert_eq!(buckets.bucket(Pattern::AntiXax2), BucketKind::Main);
    }

    #[test]
    fn confirmed_bait_survives_observation_loss() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Xax2);
        buckets.process_result(&win(Pattern::Xax2, 8, dec!(70)), &mut kills);
        buckets.process_result(&loss(Pattern::Xax2, 10, dec!(30)), &mut kills);
        assert_eq!(buckets.bucket(Pattern::Xax2), BucketKind::Bns);
    }

    // ============================================
    // Opposite Win-Streak Tests
    // ============================================

    #[test]
    fn opposite_win_streak_kills_bns() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Xax2);
        buckets.process_result(&win(Pattern::AntiXax2, 7, dec!(40)), &mut kills);
        assert_eq!(buckets.bucket(Pattern::Xax2), BucketKind::Bns);
        buckets.process_result(&win(Pattern::AntiXax2, 8, dec!(40)), &mut kills);
        assert_eq!(buckets.bucket(Pattern::Xax2), BucketKind::Waiting);
        assert!(!buckets.state(Pattern::AntiXax2).blocked_by_opposite);
        // 40 + 40 >= 70: the unblocked pattern activates to MAIN.
        assert_eq!(buckets.bucket(Pattern::AntiXax2), BucketKind::Main);
    }

    #[test]
    fn opposite_loss_resets_streak() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Xax2);
        buckets.process_result(&win(Pattern::AntiXax2, 7, dec!(40)), &mut kills);
        buckets.process_result(&loss(Pattern::AntiXax2, 8, dec!(40)), &mut kills);
        buckets.process_result(&win(Pattern::AntiXax2, 9, dec!(40)), &mut kills);
        assert_eq!(buckets.bucket(Pattern::Xax2), BucketKind::Bns);
    }

    #[test]
    fn small_blocked_accumulation_stays_waiting() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Xax2);
        buckets.process_result(&win(Pattern::AntiXax2, 7, dec!(30)), &mut kills);
        buckets.process_result(&win(Pattern::AntiXax2, 8, dec!(30)), &mut kills);
        assert_eq!(buckets.bucket(Pattern::Xax2), BucketKind::Waiting);
        assert_eq!(buckets.bucket(Pattern::AntiXax2), BucketKind::Waiting);
    }

    // ============================================
    // Switch Settlement Tests
    // ============================================

    fn confirmed_bns(buckets: &mut BucketManager, kills: &mut BnsKillMachines) {
        into_bns(buckets, kills, Pattern::Xax2);
        buckets.process_result(&win(Pattern::Xax2, 8, dec!(70)), kills);
        buckets.note_switch_played(Pattern::Xax2, 9, kills);
    }

    #[test]
    fn switch_win_stays_bns_for_next_cycle() {
        let (mut buckets, mut kills) = manager();
        confirmed_bns(&mut buckets, &mut kills);
        buckets.process_result(&switch_result(Pattern::Xax2, 10, dec!(50), true), &mut kills);
        assert_eq!(buckets.bucket(Pattern::Xax2), BucketKind::Bns);
        let sub = buckets.state(Pattern::Xax2).bns.as_ref().unwrap();
        assert!(!sub.bait_confirmed);
        assert!(!sub.switch_played);
        assert_eq!(sub.cumulative_bait_profit, dec!(0));
    }

    #[test]
    fn decisive_switch_loss_invalidates_to_main() {
        let (mut buckets, mut kills) = manager();
        confirmed_bns(&mut buckets, &mut kills);
        buckets.process_result(&switch_result(Pattern::Xax2, 10, dec!(75), false), &mut kills);
        assert_eq!(buckets.bucket(Pattern::Xax2), BucketKind::Main);
        assert!(!buckets.state(Pattern::AntiXax2).blocked_by_opposite);
    }

    #[test]
    fn mild_switch_loss_exits_to_waiting() {
        let (mut buckets, mut kills) = manager();
        confirmed_bns(&mut buckets, &mut kills);
        buckets.process_result(&switch_result(Pattern::Xax2, 10, dec!(40), false), &mut kills);
        assert_eq!(buckets.bucket(Pattern::Xax2), BucketKind::Waiting);
    }

    // ============================================
    // Kill / Re-activation Tests
    // ============================================

    #[test]
    fn structural_kill_exits_bns() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Oz);
        buckets.kill_bns(Pattern::Oz, 9, &mut kills);
        assert_eq!(buckets.bucket(Pattern::Oz), BucketKind::Waiting);
        assert!(kills.oz.monitoring_start_block.is_none());
    }

    #[test]
    fn reactivation_in_bns_confirms_bait() {
        let (mut buckets, mut kills) = manager();
        into_bns(&mut buckets, &mut kills, Pattern::Xax2);
        buckets.update_from_lifecycle(&[activation(Pattern::Xax2)], &[], 9, &mut kills);
        assert_eq!(buckets.bucket(Pattern::Xax2), BucketKind::Bns);
        assert!(buckets.state(Pattern::Xax2).bns.as_ref().unwrap().bait_confirmed);
    }

    #[test]
    fn sync_last_known_overwrites_cache() {
        let (mut buckets, mut kills) = manager();
        buckets.update_from_lifecycle(&[activation(Pattern::Xax2)], &[], 5, &mut kills);
        buckets.sync_last_known(|_| false);
        // No stale edge: a fresh activation event still lands cleanly.
        buckets.update_from_lifecycle(&[activation(Pattern::Xax3)], &[], 6, &mut kills);
        assert_eq!(buckets.bucket(Pattern::Xax3), BucketKind::Main);
    }
}
