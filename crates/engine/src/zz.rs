//! Pocket placement and betting control for ZZ and AntiZZ.
//!
//! The pockets are the single source of truth: P1 may bet real trades, P2
//! observes. A ZZ indicator wakes the family; the side in P1 plays. ZZ in
//! P2 first evaluates an imaginary bet, and only a non-negative outcome
//! promotes it. AntiZZ plays exactly one bet per indicator; an AntiZZ loss
//! swaps the pockets and hands ZZ the run the loss proved out.

use pattern_bet_core::{Direction, Pattern, Pocket};
use pattern_bet_patterns::{EvaluatedResult, PatternSignal};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Typed outcome of a ZZ-family result, consumed by the arbiter and the
/// same-direction resume rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZzAction {
    /// ZZ lost its first bet of a run; AntiZZ becomes the candidate.
    FirstBetNegative,
    /// ZZ lost after at least one winning bet; the run is recorded.
    RunEnds,
    /// ZZ won and keeps betting.
    Continues,
    /// The imaginary first bet won; ZZ promoted to P1.
    ImaginaryPromoted,
    /// The imaginary first bet lost; AntiZZ becomes the candidate.
    ImaginaryRejected,
    /// AntiZZ won its single bet and keeps P1 for the next indicator.
    AntiWin,
    /// AntiZZ lost; pockets swap and ZZ activates immediately.
    AntiLossSwapped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZzStateManager {
    zz_pocket: Pocket,
    anti_pocket: Pocket,
    active: Option<Pattern>,
    run_profit_zz: Decimal,
    zz_first_bet_evaluated: bool,
    anti_last_outcome: Option<Decimal>,
    anti_is_candidate: bool,
    saved_indicator_direction: Option<Direction>,
    waiting_for_first_bet: bool,
    first_bet_block: Option<u32>,
    is_in_bait_switch: bool,
    awaiting_first_run_bet: bool,
    run_history: Vec<Decimal>,
}

impl Default for ZzStateManager {
    fn default() -> Self {
        Self {
            zz_pocket: Pocket::P1,
            anti_pocket: Pocket::P2,
            active: None,
            run_profit_zz: Decimal::ZERO,
            zz_first_bet_evaluated: false,
            anti_last_outcome: None,
            anti_is_candidate: false,
            saved_indicator_direction: None,
            waiting_for_first_bet: false,
            first_bet_block: None,
            is_in_bait_switch: false,
            awaiting_first_run_bet: false,
            run_history: Vec::new(),
        }
    }
}

impl ZzStateManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn zz_pocket(&self) -> Pocket {
        self.zz_pocket
    }

    #[must_use]
    pub fn anti_pocket(&self) -> Pocket {
        self.anti_pocket
    }

    #[must_use]
    pub fn active(&self) -> Option<Pattern> {
        self.active
    }

    #[must_use]
    pub fn run_profit(&self) -> Decimal {
        self.run_profit_zz
    }

    #[must_use]
    pub fn run_history(&self) -> &[Decimal] {
        &self.run_history
    }

    #[must_use]
    pub fn saved_indicator_direction(&self) -> Option<Direction> {
        self.saved_indicator_direction
    }

    #[must_use]
    pub fn anti_is_candidate(&self) -> bool {
        self.anti_is_candidate
    }

    #[must_use]
    pub fn is_waiting_for_first_bet(&self) -> bool {
        self.waiting_for_first_bet
    }

    #[must_use]
    pub fn is_in_bait_switch(&self) -> bool {
        self.is_in_bait_switch
    }

    /// Suppresses betting without stopping state tracking.
    pub fn set_bait_switch(&mut self, suppressed: bool) {
        self.is_in_bait_switch = suppressed;
    }

    fn pocket_of(&self, pattern: Pattern) -> Pocket {
        if pattern == Pattern::Zz {
            self.zz_pocket
        } else {
            self.anti_pocket
        }
    }

    /// The active pocket pattern allowed to place a real bet, if any.
    #[must_use]
    pub fn betting_pattern(&self) -> Option<Pattern> {
        let pattern = self.active?;
        if self.is_in_bait_switch || self.pocket_of(pattern) != Pocket::P1 {
            return None;
        }
        Some(pattern)
    }

    fn recompute_zz_pocket(&mut self) {
        self.zz_pocket = if self.run_profit_zz >= Decimal::ZERO {
            Pocket::P1
        } else {
            Pocket::P2
        };
    }

    /// Handles a detected indicator on `block_index`, saving the current
    /// block's direction. Returns the signal to enqueue for the next
    /// block, if any side plays this indicator.
    pub fn on_indicator(
        &mut self,
        direction: Direction,
        block_index: u32,
    ) -> Option<PatternSignal> {
        self.saved_indicator_direction = Some(direction);

        if self.anti_pocket == Pocket::P1 || self.anti_is_candidate {
            self.anti_pocket = Pocket::P1;
            self.anti_is_candidate = false;
            self.active = Some(Pattern::AntiZz);
            tracing::debug!(block_index, "indicator: AntiZZ plays its single bet");
            let expected = Pattern::AntiZz.expected_direction(direction);
            return Some(
                PatternSignal::new(Pattern::AntiZz, block_index, expected)
                    .with_indicator(direction),
            );
        }

        if self.zz_pocket == Pocket::P1 {
            self.active = Some(Pattern::Zz);
            self.awaiting_first_run_bet = true;
            tracing::debug!(block_index, "indicator: ZZ activates in P1");
            let expected = Pattern::Zz.expected_direction(direction);
            return Some(
                PatternSignal::new(Pattern::Zz, block_index, expected).with_indicator(direction),
            );
        }

        // ZZ in P2: evaluate an imaginary first bet on the next block.
        self.waiting_for_first_bet = true;
        self.awaiting_first_run_bet = true;
        self.first_bet_block = Some(block_index + 1);
        self.active = None;
        tracing::debug!(block_index, "indicator: ZZ in P2, imaginary first bet armed");
        let expected = Pattern::Zz.expected_direction(direction);
        Some(PatternSignal::new(Pattern::Zz, block_index, expected).with_indicator(direction))
    }

    /// Applies a resolved ZZ result (real or imaginary). Returns the
    /// action plus a follow-up signal when ZZ keeps betting.
    pub fn on_zz_result(&mut self, result: &EvaluatedResult) -> (ZzAction, Option<PatternSignal>) {
        if self.waiting_for_first_bet {
            let action = self.evaluate_imaginary_first_bet(result);
            let next = (action == ZzAction::ImaginaryPromoted).then(|| {
                let expected = Pattern::Zz.expected_direction(result.actual_direction);
                PatternSignal::new(Pattern::Zz, result.eval_index, expected)
            });
            return (action, next);
        }

        let first_bet = self.awaiting_first_run_bet;
        if first_bet {
            self.run_profit_zz = result.profit;
            self.awaiting_first_run_bet = false;
        } else {
            self.run_profit_zz += result.profit;
        }

        if result.is_loss() {
            if first_bet {
                self.anti_is_candidate = true;
                self.active = None;
                self.recompute_zz_pocket();
                return (ZzAction::FirstBetNegative, None);
            }
            self.run_history.push(self.run_profit_zz);
            self.recompute_zz_pocket();
            self.active = None;
            return (ZzAction::RunEnds, None);
        }

        let next = (self.active == Some(Pattern::Zz)).then(|| {
            let expected = Pattern::Zz.expected_direction(result.actual_direction);
            PatternSignal::new(Pattern::Zz, result.eval_index, expected)
        });
        (ZzAction::Continues, next)
    }

    /// Mandatory imaginary first-bet evaluation. The run profit takes the
    /// imaginary outcome unconditionally; a non-negative outcome promotes
    /// ZZ to P1 and betting starts on the following block.
    fn evaluate_imaginary_first_bet(&mut self, result: &EvaluatedResult) -> ZzAction {
        self.waiting_for_first_bet = false;
        self.awaiting_first_run_bet = false;
        self.first_bet_block = None;
        self.run_profit_zz = result.profit;

        if result.profit >= Decimal::ZERO {
            self.zz_pocket = Pocket::P1;
            self.zz_first_bet_evaluated = true;
            self.active = Some(Pattern::Zz);
            tracing::debug!(profit = %result.profit, "imaginary first bet promoted ZZ to P1");
            ZzAction::ImaginaryPromoted
        } else {
            self.recompute_zz_pocket();
            self.anti_is_candidate = true;
            self.active = None;
            tracing::debug!(profit = %result.profit, "imaginary first bet rejected ZZ");
            ZzAction::ImaginaryRejected
        }
    }

    /// Applies AntiZZ's single-bet result. A loss swaps the pockets and
    /// activates ZZ on this same block with the run profit the imaginary
    /// first bet would have earned.
    pub fn on_anti_result(
        &mut self,
        result: &EvaluatedResult,
    ) -> (ZzAction, Option<PatternSignal>) {
        self.anti_last_outcome = Some(result.profit);

        if result.is_correct() {
            self.anti_pocket = Pocket::P1;
            self.active = None;
            return (ZzAction::AntiWin, None);
        }

        self.anti_pocket = Pocket::P2;
        self.zz_pocket = Pocket::P1;
        self.active = Some(Pattern::Zz);
        self.run_profit_zz = -result.profit;
        self.awaiting_first_run_bet = false;
        self.zz_first_bet_evaluated = true;
        tracing::debug!(run_profit = %self.run_profit_zz, "AntiZZ loss swapped pockets to ZZ");

        let expected = Pattern::Zz.expected_direction(result.actual_direction);
        let next = PatternSignal::new(Pattern::Zz, result.eval_index, expected);
        (ZzAction::AntiLossSwapped, Some(next))
    }

    /// Rebuilds pocket state from the result history: ZZ's pocket from the
    /// sign of its latest run profit, AntiZZ's from its last bet. No
    /// pattern is left active and transient flags are cleared.
    #[must_use]
    pub fn rebuild(results: &[EvaluatedResult]) -> Self {
        let mut state = Self::new();
        let mut first_of_run = true;

        for result in results {
            match result.pattern {
                Pattern::Zz => {
                    let was_first = first_of_run;
                    if was_first {
                        state.run_profit_zz = result.profit;
                    } else {
                        state.run_profit_zz += result.profit;
                    }
                    first_of_run = false;
                    if result.profit < Decimal::ZERO {
                        if !was_first {
                            state.run_history.push(state.run_profit_zz);
                        }
                        first_of_run = true;
                    }
                }
                Pattern::AntiZz => {
                    state.anti_last_outcome = Some(result.profit);
                }
                _ => {}
            }
        }

        state.recompute_zz_pocket();
        state.anti_pocket = match state.anti_last_outcome {
            Some(outcome) if outcome >= Decimal::ZERO => Pocket::P1,
            _ => Pocket::P2,
        };
        state
    }

    /// At most one of the family may be active; enforced by construction,
    /// checked for the invariant suite.
    #[must_use]
    pub fn single_active_holds(&self) -> bool {
        matches!(self.active, None | Some(Pattern::Zz) | Some(Pattern::AntiZz))
    }
}
