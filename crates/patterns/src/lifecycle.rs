//! Per-pattern lifecycle: observing/active states and profit accounting.
//!
//! Each pattern owns a cycle with a non-negative cumulative profit, a live
//! per-run accumulator, and the value that accumulator held at the last
//! break. Activation comes from observation results (one decisive win or
//! enough accumulated profit); any loss while active breaks the cycle and
//! transfers the loss magnitude to the opposite pattern. ZZ and AntiZZ are
//! activated and deactivated exclusively by the pocket manager.

use crate::signal::EvaluatedResult;
use pattern_bet_core::{Direction, Pattern};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Single observation win that activates a pattern.
const ACTIVATION_SINGLE_PROFIT: Decimal = Decimal::from_parts(70, 0, 0, false, 0);
/// Accumulated profit that activates a pattern.
const ACTIVATION_CUMULATIVE_PROFIT: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Lifecycle state of one pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleState {
    Observing,
    Active,
}

/// Mutable cycle bookkeeping for one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCycle {
    pub state: CycleState,
    /// Non-negative rolling profit; feeds activation and bait thresholds.
    pub cumulative_profit: Decimal,
    /// Signed accumulator over the current active run, including the
    /// terminating loss.
    pub run_profit: Decimal,
    /// Value of `run_profit` at the most recent break.
    pub break_run_profit: Decimal,
    pub all_time_profit: Decimal,
    pub last_formation_block: Option<u32>,
    /// Direction saved from the most recent ZZ indicator (ZZ family only).
    pub saved_indicator_direction: Option<Direction>,
}

impl Default for PatternCycle {
    fn default() -> Self {
        Self {
            state: CycleState::Observing,
            cumulative_profit: Decimal::ZERO,
            run_profit: Decimal::ZERO,
            break_run_profit: Decimal::ZERO,
            all_time_profit: Decimal::ZERO,
            last_formation_block: None,
            saved_indicator_direction: None,
        }
    }
}

/// A structural break fired by run-transition analysis rather than a loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralBreak {
    pub block_index: u32,
    pub pattern: Pattern,
}

/// What happened to a pattern's cycle while applying one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub pattern: Pattern,
    pub activated: bool,
    pub broke: bool,
    /// Final run profit when `broke` is set.
    pub break_run_profit: Decimal,
    /// Loss magnitude credited to the opposite pattern, when any.
    pub transferred_to_opposite: Decimal,
}

impl LifecycleEvent {
    const fn quiet(pattern: Pattern) -> Self {
        Self {
            pattern,
            activated: false,
            broke: false,
            break_run_profit: Decimal::ZERO,
            transferred_to_opposite: Decimal::ZERO,
        }
    }
}

/// Fixed-size table of cycles, indexed by the canonical pattern order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternLifecycle {
    cycles: Vec<PatternCycle>,
    break_log: Vec<StructuralBreak>,
}

impl Default for PatternLifecycle {
    fn default() -> Self {
        Self {
            cycles: vec![PatternCycle::default(); Pattern::COUNT],
            break_log: Vec::new(),
        }
    }
}

impl PatternLifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cycle(&self, pattern: Pattern) -> &PatternCycle {
        &self.cycles[pattern.index()]
    }

    #[must_use]
    pub fn is_active(&self, pattern: Pattern) -> bool {
        self.cycle(pattern).state == CycleState::Active
    }

    /// Accumulated activation profit: sum of positive cumulative profits.
    #[must_use]
    pub fn aap(&self) -> Decimal {
        self.cycles
            .iter()
            .filter(|c| c.cumulative_profit > Decimal::ZERO)
            .map(|c| c.cumulative_profit)
            .sum()
    }

    #[must_use]
    pub fn break_log(&self) -> &[StructuralBreak] {
        &self.break_log
    }

    /// Records that a formation signal was emitted for the pattern.
    pub fn note_formation(&mut self, pattern: Pattern, block_index: u32) {
        self.cycles[pattern.index()].last_formation_block = Some(block_index);
    }

    /// Saves the ZZ indicator direction on the pattern's cycle.
    pub fn save_indicator_direction(&mut self, pattern: Pattern, direction: Direction) {
        self.cycles[pattern.index()].saved_indicator_direction = Some(direction);
    }

    /// Activates a pattern without an observation result (pocket manager
    /// path for the ZZ family).
    pub fn activate(&mut self, pattern: Pattern) {
        let cycle = &mut self.cycles[pattern.index()];
        cycle.state = CycleState::Active;
        cycle.run_profit = Decimal::ZERO;
    }

    /// Deactivates without recording a break (pocket manager path).
    pub fn deactivate(&mut self, pattern: Pattern) {
        let cycle = &mut self.cycles[pattern.index()];
        cycle.state = CycleState::Observing;
        cycle.run_profit = Decimal::ZERO;
    }

    /// Applies one evaluated result to the pattern's cycle.
    ///
    /// Wins accumulate (and may activate an observing non-ZZ pattern).
    /// Losses clamp the cumulative profit at zero; a loss while active
    /// additionally breaks the cycle and transfers the loss magnitude to
    /// the opposite pattern's cumulative profit.
    pub fn apply_result(&mut self, result: &EvaluatedResult) -> LifecycleEvent {
        let pattern = result.pattern;
        let mut event = LifecycleEvent::quiet(pattern);
        let idx = pattern.index();

        self.cycles[idx].all_time_profit += result.profit;

        if result.is_loss() {
            let loss_magnitude = -result.profit;
            let cycle = &mut self.cycles[idx];
            cycle.cumulative_profit =
                (cycle.cumulative_profit + result.profit).max(Decimal::ZERO);

            if cycle.state == CycleState::Active {
                cycle.run_profit += result.profit;
                cycle.break_run_profit = cycle.run_profit;
                cycle.state = CycleState::Observing;
                event.broke = true;
                event.break_run_profit = cycle.run_profit;
                cycle.run_profit = Decimal::ZERO;

                let opp = pattern.opposite().index();
                self.cycles[opp].cumulative_profit += loss_magnitude;
                event.transferred_to_opposite = loss_magnitude;
            }
        } else {
            let cycle = &mut self.cycles[idx];
            cycle.cumulative_profit += result.profit;
            match cycle.state {
                CycleState::Active => cycle.run_profit += result.profit,
                CycleState::Observing => {
                    let activates = !pattern.is_zz_family()
                        && (result.profit >= ACTIVATION_SINGLE_PROFIT
                            || cycle.cumulative_profit >= ACTIVATION_CUMULATIVE_PROFIT);
                    if activates {
                        cycle.state = CycleState::Active;
                        cycle.run_profit = Decimal::ZERO;
                        event.activated = true;
                    }
                }
            }
        }

        event
    }

    /// Breaks an active pattern on a structural rhythm violation.
    ///
    /// Returns the break event, or `None` if the pattern was not active.
    pub fn apply_structural_break(
        &mut self,
        pattern: Pattern,
        block_index: u32,
    ) -> Option<LifecycleEvent> {
        let cycle = &mut self.cycles[pattern.index()];
        if cycle.state != CycleState::Active {
            return None;
        }
        cycle.break_run_profit = cycle.run_profit;
        cycle.state = CycleState::Observing;
        let mut event = LifecycleEvent::quiet(pattern);
        event.broke = true;
        event.break_run_profit = cycle.run_profit;
        cycle.run_profit = Decimal::ZERO;
        self.break_log.push(StructuralBreak {
            block_index,
            pattern,
        });
        Some(event)
    }

    /// Rebuilds the whole table by replaying results and structural breaks
    /// in chronological order.
    ///
    /// At any block index, structural breaks replay before results,
    /// mirroring the live pipeline. Formation marks are re-derived from the
    /// resolved signals plus any still-pending ones. ZZ-family activation
    /// is owned by the pocket manager, so replay leaves the family
    /// observing; the caller re-syncs pocket-driven state afterwards.
    #[must_use]
    pub fn rebuild(
        results: &[EvaluatedResult],
        breaks: &[StructuralBreak],
        pending_formations: &[(Pattern, u32)],
    ) -> Self {
        let mut lifecycle = Self::new();

        let mut break_iter = breaks.iter().peekable();
        for result in results {
            while let Some(brk) = break_iter.peek() {
                if brk.block_index <= result.eval_index {
                    let _ = lifecycle.apply_structural_break(brk.pattern, brk.block_index);
                    break_iter.next();
                } else {
                    break;
                }
            }
            lifecycle.note_formation(result.pattern, result.signal_index);
            let _ = lifecycle.apply_result(result);
        }
        for brk in break_iter {
            let _ = lifecycle.apply_structural_break(brk.pattern, brk.block_index);
        }
        for (pattern, block_index) in pending_formations {
            lifecycle.note_formation(*pattern, *block_index);
        }

        lifecycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::PatternSignal;
    use pattern_bet_core::Block;
    use rust_decimal_macros::dec;

    fn win(pattern: Pattern, index: u32, pct: Decimal) -> EvaluatedResult {
        let signal = PatternSignal::new(pattern, index - 1, Direction::Up);
        EvaluatedResult::resolve(&signal, &Block::new(index, Direction::Up, pct), 0.05)
    }

    fn loss(pattern: Pattern, index: u32, pct: Decimal) -> EvaluatedResult {
        let signal = PatternSignal::new(pattern, index - 1, Direction::Up);
        EvaluatedResult::resolve(&signal, &Block::new(index, Direction::Down, pct), 0.05)
    }

    // ============================================
    // Activation Tests
    // ============================================

    #[test]
    fn single_decisive_win_activates() {
        let mut lifecycle = PatternLifecycle::new();
        let event = lifecycle.apply_result(&win(Pattern::Xax2, 3, dec!(70)));
        assert!(event.activated);
        assert!(lifecycle.is_active(Pattern::Xax2));
        assert_eq!(lifecycle.cycle(Pattern::Xax2).cumulative_profit, dec!(70));
    }

    #[test]
    fn small_wins_accumulate_to_activation() {
        let mut lifecycle = PatternLifecycle::new();
        assert!(!lifecycle.apply_result(&win(Pattern::Oz, 3, dec!(40))).activated);
        assert!(!lifecycle.is_active(Pattern::Oz));
        let event = lifecycle.apply_result(&win(Pattern::Oz, 6, dec!(60)));
        assert!(event.activated);
        assert!(lifecycle.is_active(Pattern::Oz));
    }

    #[test]
    fn sub_threshold_win_does_not_activate() {
        let mut lifecycle = PatternLifecycle::new();
        lifecycle.apply_result(&win(Pattern::Pp, 3, dec!(69.9)));
        assert!(!lifecycle.is_active(Pattern::Pp));
    }

    #[test]
    fn zz_family_never_auto_activates() {
        let mut lifecycle = PatternLifecycle::new();
        lifecycle.apply_result(&win(Pattern::Zz, 3, dec!(95)));
        lifecycle.apply_result(&win(Pattern::AntiZz, 4, dec!(95)));
        lifecycle.apply_result(&win(Pattern::AntiZz, 5, dec!(95)));
        assert!(!lifecycle.is_active(Pattern::Zz));
        assert!(!lifecycle.is_active(Pattern::AntiZz));
        // Profit still accumulates for pocket decisions.
        assert_eq!(lifecycle.cycle(Pattern::Zz).cumulative_profit, dec!(95));
    }

    #[test]
    fn pocket_manager_activation_path() {
        let mut lifecycle = PatternLifecycle::new();
        lifecycle.activate(Pattern::Zz);
        assert!(lifecycle.is_active(Pattern::Zz));
        lifecycle.deactivate(Pattern::Zz);
        assert!(!lifecycle.is_active(Pattern::Zz));
    }

    // ============================================
    // Accumulation / Clamp Tests
    // ============================================

    #[test]
    fn cumulative_profit_clamps_at_zero() {
        let mut lifecycle = PatternLifecycle::new();
        lifecycle.apply_result(&win(Pattern::St, 3, dec!(30)));
        lifecycle.apply_result(&loss(Pattern::St, 5, dec!(80)));
        assert_eq!(lifecycle.cycle(Pattern::St).cumulative_profit, dec!(0));
    }

    #[test]
    fn loss_subtracts_before_clamping() {
        let mut lifecycle = PatternLifecycle::new();
        lifecycle.apply_result(&win(Pattern::St, 3, dec!(60)));
        lifecycle.apply_result(&loss(Pattern::St, 5, dec!(20)));
        assert_eq!(lifecycle.cycle(Pattern::St).cumulative_profit, dec!(40));
    }

    #[test]
    fn all_time_profit_is_signed() {
        let mut lifecycle = PatternLifecycle::new();
        lifecycle.apply_result(&win(Pattern::St, 3, dec!(30)));
        lifecycle.apply_result(&loss(Pattern::St, 5, dec!(80)));
        assert_eq!(lifecycle.cycle(Pattern::St).all_time_profit, dec!(-50));
    }

    // ============================================
    // Break / Transfer Tests
    // ============================================

    #[test]
    fn active_loss_breaks_and_transfers() {
        let mut lifecycle = PatternLifecycle::new();
        lifecycle.apply_result(&win(Pattern::Xax2, 3, dec!(75)));
        let event = lifecycle.apply_result(&loss(Pattern::Xax2, 5, dec!(80)));

        assert!(event.broke);
        assert_eq!(event.break_run_profit, dec!(-80));
        assert_eq!(event.transferred_to_opposite, dec!(80));
        assert!(!lifecycle.is_active(Pattern::Xax2));
        assert_eq!(lifecycle.cycle(Pattern::Xax2).break_run_profit, dec!(-80));
        assert_eq!(
            lifecycle.cycle(Pattern::AntiXax2).cumulative_profit,
            dec!(80)
        );
    }

    #[test]
    fn run_profit_includes_terminating_loss() {
        let mut lifecycle = PatternLifecycle::new();
        lifecycle.apply_result(&win(Pattern::Xax3, 3, dec!(75)));
        lifecycle.apply_result(&win(Pattern::Xax3, 5, dec!(30)));
        let event = lifecycle.apply_result(&loss(Pattern::Xax3, 7, dec!(40)));
        assert_eq!(event.break_run_profit, dec!(-10));
    }

    #[test]
    fn observing_loss_does_not_transfer() {
        let mut lifecycle = PatternLifecycle::new();
        lifecycle.apply_result(&loss(Pattern::Xax2, 3, dec!(80)));
        assert_eq!(
            lifecycle.cycle(Pattern::AntiXax2).cumulative_profit,
            dec!(0)
        );
    }

    #[test]
    fn zz_pair_transfers_on_active_loss() {
        let mut lifecycle = PatternLifecycle::new();
        lifecycle.activate(Pattern::Zz);
        let event = lifecycle.apply_result(&loss(Pattern::Zz, 5, dec!(65)));
        assert!(event.broke);
        assert_eq!(lifecycle.cycle(Pattern::AntiZz).cumulative_profit, dec!(65));
    }

    #[test]
    fn structural_break_records_run_profit_without_transfer() {
        let mut lifecycle = PatternLifecycle::new();
        lifecycle.apply_result(&win(Pattern::Oz, 3, dec!(75)));
        lifecycle.apply_result(&win(Pattern::Oz, 5, dec!(20)));

        let event = lifecycle.apply_structural_break(Pattern::Oz, 6).unwrap();
        assert!(event.broke);
        assert_eq!(event.break_run_profit, dec!(20));
        assert!(!lifecycle.is_active(Pattern::Oz));
        assert_eq!(lifecycle.cycle(Pattern::AntiOz).cumulative_profit, dec!(0));
        assert_eq!(lifecycle.break_log().len(), 1);
    }

    #[test]
    fn structural_break_on_observing_pattern_is_noop() {
        let mut lifecycle = PatternLifecycle::new();
        assert!(lifecycle.apply_structural_break(Pattern::Oz, 6).is_none());
        assert!(lifecycle.break_log().is_empty());
    }

    // ============================================
    // AAP / Rebuild Tests
    // ============================================

    #[test]
    fn aap_sums_positive_cumulative_profits() {
        let mut lifecycle = PatternLifecycle::new();
        lifecycle.apply_result(&win(Pattern::Xax2, 3, dec!(40)));
        lifecycle.apply_result(&win(Pattern::Oz, 5, dec!(25)));
        assert_eq!(lifecycle.aap(), dec!(65));
    }

    #[test]
    fn rebuild_replays_results_identically() {
        let mut live = PatternLifecycle::new();
        let results = vec![
            win(Pattern::Xax2, 3, dec!(75)),
            win(Pattern::Oz, 4, dec!(40)),
            loss(Pattern::Xax2, 5, dec!(80)),
            win(Pattern::Oz, 7, dec!(65)),
        ];
        for r in &results {
            live.note_formation(r.pattern, r.signal_index);
            live.apply_result(r);
        }

        let rebuilt = PatternLifecycle::rebuild(&results, &[], &[]);
        assert_eq!(rebuilt, live);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let results = vec![
            win(Pattern::Xax2, 3, dec!(75)),
            loss(Pattern::Xax2, 5, dec!(80)),
        ];
        let once = PatternLifecycle::rebuild(&results, &[], &[]);
        let twice = PatternLifecycle::rebuild(&results, &[], &[]);
        assert_eq!(once, twice);
    }

    #[test]
    fn rebuild_interleaves_structural_breaks() {
        let mut live = PatternLifecycle::new();
        live.apply_result(&win(Pattern::Oz, 3, dec!(75)));
        live.apply_structural_break(Pattern::Oz, 4);
        live.apply_result(&win(Pattern::Oz, 6, dec!(75)));

        let results = vec![
            win(Pattern::Oz, 3, dec!(75)),
            win(Pattern::Oz, 6, dec!(75)),
        ];
        let breaks = vec![StructuralBreak {
            block_index: 4,
            pattern: Pattern::Oz,
        }];
        let rebuilt = PatternLifecycle::rebuild(&results, &breaks, &[]);
        assert_eq!(rebuilt, live);
    }
}
