//! Structural pattern detection over the run-length history.
//!
//! Detection is a pure function of the tracker state: each pattern has a
//! small deterministic trigger evaluated against the just-appended block.
//! A fired trigger emits a signal for the base pattern and its Anti
//! partner, each predicting the next block per its own semantics. Patterns
//! with an unresolved pending signal are skipped, so there is at most one
//! live signal per pattern.

use crate::signal::PatternSignal;
use crate::tracker::BlockTracker;
use pattern_bet_core::{Direction, Pattern};
use rust_decimal::Decimal;

pub struct PatternDetector;

impl PatternDetector {
    /// Emits formation signals for the most recent block.
    ///
    /// `has_pending` reports whether a pattern already has an unresolved
    /// signal; such patterns are skipped. ZZ and AntiZZ never appear here:
    /// their indicator is routed through the pocket manager.
    #[must_use]
    pub fn detect(
        tracker: &BlockTracker,
        has_pending: impl Fn(Pattern) -> bool,
        ap5_confirm_threshold: Decimal,
    ) -> Vec<PatternSignal> {
        let Some(block) = tracker.last_block() else {
            return Vec::new();
        };
        let len = tracker.current_run_length();
        let prev = tracker.previous_run_length();

        let mut signals = Vec::new();
        for pattern in Pattern::ALL {
            if pattern.is_zz_family() || has_pending(pattern) {
                continue;
            }
            if !Self::base_trigger_fires(
                pattern.base(),
                len,
                prev,
                block.magnitude,
                ap5_confirm_threshold,
            ) {
                continue;
            }
            let expected = pattern.expected_direction(block.direction);
            signals.push(PatternSignal::new(pattern, block.index, expected));
        }
        signals
    }

    /// Detects the ZZ indicator: a run of length >= 2 followed by three or
    /// more length-1 runs, the current block being the newest singleton.
    ///
    /// Returns the direction to save (the current block's direction).
    #[must_use]
    pub fn zz_indicator(tracker: &BlockTracker) -> Option<Direction> {
        if tracker.current_run_length() != 1 {
            return None;
        }
        if tracker.trailing_singleton_runs() < 3 {
            return None;
        }
        if tracker.run_before_singletons()? < 2 {
            return None;
        }
        tracker.last_block().map(|b| b.direction)
    }

    fn base_trigger_fires(
        base: Pattern,
        len: u32,
        prev: Option<u32>,
        magnitude: Decimal,
        ap5_confirm_threshold: Decimal,
    ) -> bool {
        match base {
            Pattern::Xax2 | Pattern::Xax3 | Pattern::Xax4 | Pattern::Xax5 | Pattern::Xax6 => {
                // Fires on the block that brings the run to its nominal
                // length.
                base.xax_length() == Some(len)
            }
            Pattern::Ap5 => {
                len == 3 && prev.is_some_and(|p| p >= 2) && magnitude >= ap5_confirm_threshold
            }
            Pattern::Oz => len == 3 && prev == Some(1),
            Pattern::Pp => len == 2 && prev == Some(1),
            Pattern::St => len == 2 && prev.is_some_and(|p| p >= 2),
            _ => false,
        }
    }
}
