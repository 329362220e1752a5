//! Pending signals and their evaluated results.
//!
//! A signal predicts the direction of the block after the one it formed on.
//! Evaluation against that next block produces an `EvaluatedResult` whose
//! profit and verdict are computed at construction, the single place the
//! win/loss rules live.

use pattern_bet_core::{Block, Direction, Pattern, Verdict};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A pending prediction emitted by the detector (or the ZZ manager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSignal {
    pub pattern: Pattern,
    /// Block index the signal formed on; resolves at `signal_index + 1`.
    pub signal_index: u32,
    pub expected_direction: Direction,
    /// True for bait-and-switch signals played against the expectation.
    pub is_inverse_play: bool,
    /// Direction saved from a ZZ indicator, when the signal is
    /// indicator-sourced.
    pub indicator_direction: Option<Direction>,
    pub created_block: u32,
}

impl PatternSignal {
    /// Creates a regular detector signal for the just-appended block.
    #[must_use]
    pub const fn new(pattern: Pattern, signal_index: u32, expected_direction: Direction) -> Self {
        Self {
            pattern,
            signal_index,
            expected_direction,
            is_inverse_play: false,
            indicator_direction: None,
            created_block: signal_index,
        }
    }

    /// Marks the signal as an inverse (switch) play.
    #[must_use]
    pub const fn inverse(mut self) -> Self {
        self.is_inverse_play = true;
        self
    }

    /// Attaches the saved indicator direction.
    #[must_use]
    pub const fn with_indicator(mut self, direction: Direction) -> Self {
        self.indicator_direction = Some(direction);
        self
    }
}

/// Outcome of resolving a signal against the next block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatedResult {
    pub pattern: Pattern,
    pub signal_index: u32,
    /// Index of the block the signal was resolved against.
    pub eval_index: u32,
    pub expected_direction: Direction,
    pub actual_direction: Direction,
    pub magnitude: Decimal,
    pub verdict: Verdict,
    /// `+magnitude` when correct, `-magnitude` otherwise.
    pub profit: Decimal,
    pub was_bet: bool,
    pub is_inverse_play: bool,
}

impl EvaluatedResult {
    /// Resolves a signal against the block that followed it.
    #[must_use]
    pub fn resolve(signal: &PatternSignal, block: &Block, neutral_band: f64) -> Self {
        let matches = block.direction == signal.expected_direction;
        let is_correct = if signal.is_inverse_play {
            !matches
        } else {
            matches
        };
        let profit = if is_correct {
            block.magnitude
        } else {
            -block.magnitude
        };
        let verdict = assign_verdict(is_correct, block.magnitude, neutral_band);

        Self {
            pattern: signal.pattern,
            signal_index: signal.signal_index,
            eval_index: block.index,
            expected_direction: signal.expected_direction,
            actual_direction: block.direction,
            magnitude: block.magnitude,
            verdict,
            profit,
            was_bet: false,
            is_inverse_play: signal.is_inverse_play,
        }
    }

    /// True when the prediction held (inverse plays invert the comparison).
    #[must_use]
    pub const fn is_correct(&self) -> bool {
        matches!(self.verdict, Verdict::Fair | Verdict::Neutral)
    }

    /// True when the result is a loss.
    #[must_use]
    pub const fn is_loss(&self) -> bool {
        !self.is_correct()
    }

    /// Re-creates the pending signal this result came from. Used by the
    /// undo rebuild to restore the evaluator queue.
    #[must_use]
    pub const fn to_pending_signal(&self) -> PatternSignal {
        PatternSignal {
            pattern: self.pattern,
            signal_index: self.signal_index,
            expected_direction: self.expected_direction,
            is_inverse_play: self.is_inverse_play,
            indicator_direction: None,
            created_block: self.signal_index,
        }
    }
}

/// Assigns the quality verdict for an evaluated signal.
///
/// Incorrect results with a magnitude of 70 or more are `fake` (a decisive
/// move against the pattern); milder misses are `unfair`. Correct results
/// are `fair` outside the neutral band around 50 and `neutral` inside it.
#[must_use]
pub fn assign_verdict(is_correct: bool, magnitude: Decimal, neutral_band: f64) -> Verdict {
    let pct = magnitude.to_string().parse::<f64>().unwrap_or(50.0);
    if is_correct {
        let lower = 50.0 - 100.0 * neutral_band;
        let upper = 50.0 + 100.0 * neutral_band;
        if pct < lower || pct > upper {
            Verdict::Fair
        } else {
            Verdict::Neutral
        }
    } else if pct >= 70.0 {
        Verdict::Fake
    } else {
        Verdict::Unfair
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn block(index: u32, direction: Direction, pct: Decimal) -> Block {
        Block::new(index, direction, pct)
    }

    // ============================================
    // Verdict Tests
    // ============================================

    #[test]
    fn verdict_incorrect_decisive_is_fake() {
        assert_eq!(assign_verdict(false, dec!(70), 0.05), Verdict::Fake);
        assert_eq!(assign_verdict(false, dec!(95), 0.05), Verdict::Fake);
    }

    #[test]
    fn verdict_incorrect_mild_is_unfair() {
        assert_eq!(assign_verdict(false, dec!(69.9), 0.05), Verdict::Unfair);
        assert_eq!(assign_verdict(false, dec!(10), 0.05), Verdict::Unfair);
    }

    #[test]
    fn verdict_correct_outside_band_is_fair() {
        assert_eq!(assign_verdict(true, dec!(44.9), 0.05), Verdict::Fair);
        assert_eq!(assign_verdict(true, dec!(55.1), 0.05), Verdict::Fair);
        assert_eq!(assign_verdict(true, dec!(90), 0.05), Verdict::Fair);
    }

    #[test]
    fn verdict_correct_inside_band_is_neutral() {
        assert_eq!(assign_verdict(true, dec!(45), 0.05), Verdict::Neutral);
        assert_eq!(assign_verdict(true, dec!(50), 0.05), Verdict::Neutral);
        assert_eq!(assign_verdict(true, dec!(55), 0.05), Verdict::Neutral);
    }

    #[test]
    fn verdict_band_widens_with_config() {
        assert_eq!(assign_verdict(true, dec!(42), 0.10), Verdict::Neutral);
        assert_eq!(assign_verdict(true, dec!(39.9), 0.10), Verdict::Fair);
    }

    // ============================================
    // Resolution Tests
    // ============================================

    #[test]
    fn correct_prediction_yields_positive_profit() {
        let signal = PatternSignal::new(Pattern::Xax2, 4, Direction::Up);
        let result = EvaluatedResult::resolve(&signal, &block(5, Direction::Up, dec!(62)), 0.05);
        assert_eq!(result.profit, dec!(62));
        assert_eq!(result.verdict, Verdict::Fair);
        assert!(!result.is_loss());
        assert_eq!(result.eval_index, 5);
    }

    #[test]
    fn incorrect_prediction_yields_negative_profit() {
        let signal = PatternSignal::new(Pattern::Xax2, 4, Direction::Up);
        let result = EvaluatedResult::resolve(&signal, &block(5, Direction::Down, dec!(62)), 0.05);
        assert_eq!(result.profit, dec!(-62));
        assert!(result.is_loss());
    }

    #[test]
    fn inverse_play_inverts_correctness() {
        let signal = PatternSignal::new(Pattern::Oz, 9, Direction::Up).inverse();
        let win = EvaluatedResult::resolve(&signal, &block(10, Direction::Down, dec!(40)), 0.05);
        assert_eq!(win.profit, dec!(40));
        assert!(!win.is_loss());

        let loss = EvaluatedResult::resolve(&signal, &block(10, Direction::Up, dec!(40)), 0.05);
        assert_eq!(loss.profit, dec!(-40));
        assert!(loss.is_loss());
    }

    #[test]
    fn incorrect_high_magnitude_is_fake() {
        let signal = PatternSignal::new(Pattern::Pp, 2, Direction::Down);
        let result = EvaluatedResult::resolve(&signal, &block(3, Direction::Up, dec!(85)), 0.05);
        assert_eq!(result.verdict, Verdict::Fake);
    }

    #[test]
    fn pending_signal_roundtrip_preserves_play_mode() {
        let signal = PatternSignal::new(Pattern::St, 7, Direction::Down).inverse();
        let result = EvaluatedResult::resolve(&signal, &block(8, Direction::Down, dec!(30)), 0.05);
        let restored = result.to_pending_signal();
        assert_eq!(restored.pattern, Pattern::St);
        assert_eq!(restored.signal_index, 7);
        assert_eq!(restored.expected_direction, Direction::Down);
        assert!(restored.is_inverse_play);
    }

    #[test]
    fn zero_magnitude_resolves_without_sign() {
        let signal = PatternSignal::new(Pattern::Xax3, 1, Direction::Up);
        let result = EvaluatedResult::resolve(&signal, &block(2, Direction::Up, dec!(0)), 0.05);
        assert_eq!(result.profit, dec!(0));
        assert!(!result.is_loss());
    }
}
