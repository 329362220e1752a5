//! Pending-signal queue and resolution against incoming blocks.

use crate::signal::{EvaluatedResult, PatternSignal};
use pattern_bet_core::{Block, Pattern};
use serde::{Deserialize, Serialize};

/// Holds pending signals and resolves them in insertion order when the
/// next block arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEvaluator {
    pending: Vec<PatternSignal>,
}

impl SignalEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a signal. The detector guarantees at most one live signal
    /// per pattern; a duplicate is ignored rather than double-counted.
    pub fn push(&mut self, signal: PatternSignal) {
        if self.has_pending(signal.pattern) {
            return;
        }
        self.pending.push(signal);
    }

    /// True when the pattern has an unresolved signal.
    #[must_use]
    pub fn has_pending(&self, pattern: Pattern) -> bool {
        self.pending.iter().any(|s| s.pattern == pattern)
    }

    #[must_use]
    pub fn pending(&self) -> &[PatternSignal] {
        &self.pending
    }

    /// Resolves every pending signal that formed before `block`, in
    /// insertion order. Signals created on `block` itself stay queued for
    /// the next one.
    #[must_use]
    pub fn resolve(&mut self, block: &Block, neutral_band: f64) -> Vec<EvaluatedResult> {
        let (due, remaining): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|s| s.signal_index < block.index);
        self.pending = remaining;
        due.iter()
            .map(|s| EvaluatedResult::resolve(s, block, neutral_band))
            .collect()
    }

    /// Converts the pattern's pending signal into an inverse (switch)
    /// play, so its resolution scores against the prediction.
    pub fn mark_inverse(&mut self, pattern: Pattern) {
        if let Some(signal) = self.pending.iter_mut().find(|s| s.pattern == pattern) {
            signal.is_inverse_play = true;
        }
    }

    /// Drops signals created on the given block (undo path).
    pub fn remove_created_at(&mut self, block_index: u32) {
        self.pending.retain(|s| s.created_block != block_index);
    }

    /// Restores signals whose resolution was undone.
    pub fn restore_pending(&mut self, signals: impl IntoIterator<Item = PatternSignal>) {
        for signal in signals {
            self.push(signal);
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pattern_bet_core::Direction;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn block(index: u32, direction: Direction, pct: Decimal) -> Block {
        Block::new(index, direction, pct)
    }

    #[test]
    fn resolves_in_insertion_order() {
        let mut evaluator = SignalEvaluator::new();
        evaluator.push(PatternSignal::new(Pattern::St, 4, Direction::Up));
        evaluator.push(PatternSignal::new(Pattern::Xax2, 4, Direction::Down));

        let results = evaluator.resolve(&block(5, Direction::Up, dec!(60)), 0.05);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].pattern, Pattern::St);
        assert_eq!(results[1].pattern, Pattern::Xax2);
        assert!(evaluator.pending().is_empty());
    }

    #[test]
    fn signals_created_on_block_stay_pending() {
        let mut evaluator = SignalEvaluator::new();
        evaluator.push(PatternSignal::new(Pattern::Xax2, 5, Direction::Up));
        let results = evaluator.resolve(&block(5, Direction::Up, dec!(60)), 0.05);
        assert!(results.is_empty());
        assert!(evaluator.has_pending(Pattern::Xax2));
    }

    #[test]
    fn duplicate_pattern_push_ignored() {
        let mut evaluator = SignalEvaluator::new();
        evaluator.push(PatternSignal::new(Pattern::Oz, 3, Direction::Up));
        evaluator.push(PatternSignal::new(Pattern::Oz, 4, Direction::Down));
        assert_eq!(evaluator.pending().len(), 1);
        assert_eq!(evaluator.pending()[0].signal_index, 3);
    }

    #[test]
    fn remove_created_at_drops_new_signals_only() {
        let mut evaluator = SignalEvaluator::new();
        evaluator.push(PatternSignal::new(Pattern::Oz, 3, Direction::Up));
        evaluator.push(PatternSignal::new(Pattern::Pp, 4, Direction::Down));
        evaluator.remove_created_at(4);
        assert!(evaluator.has_pending(Pattern::Oz));
        assert!(!evaluator.has_pending(Pattern::Pp));
    }

    #[test]
    fn mark_inverse_flips_the_pending_signal() {
        let mut evaluator = SignalEvaluator::new();
        evaluator.push(PatternSignal::new(Pattern::Xax2, 5, Direction::Up));
        evaluator.mark_inverse(Pattern::Xax2);
        assert!(evaluator.pending()[0].is_inverse_play);

        let results = evaluator.resolve(&block(6, Direction::Up, dec!(30)), 0.05);
        // The predicted direction arrived, so the inverse play lost.
        assert_eq!(results[0].profit, dec!(-30));
    }

    #[test]
    fn restore_pending_requeues_unresolved_signals() {
        let mut evaluator = SignalEvaluator::new();
        evaluator.push(PatternSignal::new(Pattern::Xax3, 6, Direction::Down));
        let results = evaluator.resolve(&block(7, Direction::Down, dec!(44)), 0.05);
        assert_eq!(results.len(), 1);

        evaluator.restore_pending(results.iter().map(EvaluatedResult::to_pending_signal));
        assert!(evaluator.has_pending(Pattern::Xax3));
        assert_eq!(evaluator.pending()[0].signal_index, 6);
    }
}
