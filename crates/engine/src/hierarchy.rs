//! Priority arbiter: Pocket over Same-Direction over Bucket.
//!
//! One decision per block. The arbiter reads immutable views of its peers
//! and owns nothing but the decision log.

use crate::bucket::{BucketManager, PlayMode};
use crate::pause::{PauseManager, PauseTrack};
use crate::samedir::SameDirectionManager;
use crate::zz::ZzStateManager;
use pattern_bet_core::{Block, Direction, Pattern};
use pattern_bet_patterns::{PatternLifecycle, PatternSignal};
use serde::{Deserialize, Serialize};

/// Which subsystem produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionSource {
    Pocket,
    SameDir,
    Bucket,
    None,
}

/// The arbiter's output for one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyDecision {
    pub block_index: u32,
    pub source: DecisionSource,
    pub pattern: Option<Pattern>,
    pub direction: Option<Direction>,
    pub should_bet: bool,
    /// True when the bet plays against the pattern's prediction (switch).
    pub is_inverse: bool,
    /// Tracks excluded by a pause, with the pause reason.
    pub paused_systems: Vec<(PauseTrack, String)>,
    /// Continuation direction the same-direction regime would have bet,
    /// recorded for analytics when no bet opens.
    pub imaginary_sd_direction: Option<Direction>,
}

/// Stateless selector plus the decision log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchyArbiter {
    decisions: Vec<HierarchyDecision>,
}

impl HierarchyArbiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn decisions(&self) -> &[HierarchyDecision] {
        &self.decisions
    }

    /// Drops decisions recorded for the given block (undo path).
    pub fn remove_at(&mut self, block_index: u32) {
        self.decisions.retain(|d| d.block_index != block_index);
    }

    /// Picks at most one candidate for the just-appended block.
    ///
    /// `new_signals` are the signals created on this block; the chosen
    /// bet resolves against the next one. `long_run_engaged` suppresses
    /// bucket alternation bets once the current run is long enough.
    #[allow(clippy::too_many_arguments)]
    pub fn decide(
        &mut self,
        block: &Block,
        zz: &ZzStateManager,
        samedir: &SameDirectionManager,
        buckets: &BucketManager,
        lifecycle: &PatternLifecycle,
        new_signals: &[PatternSignal],
        pauses: &PauseManager,
        long_run_engaged: bool,
    ) -> HierarchyDecision {
        let paused_systems: Vec<(PauseTrack, String)> = PauseTrack::ALL
            .iter()
            .filter_map(|track| {
                pauses
                    .active_pause(*track)
                    .map(|p| (*track, p.reason.clone()))
            })
            .collect();

        let imaginary_sd_direction = samedir
            .is_active()
            .then_some(SameDirectionManager::bet_direction(block.direction));

        let mut decision = HierarchyDecision {
            block_index: block.index,
            source: DecisionSource::None,
            pattern: None,
            direction: None,
            should_bet: false,
            is_inverse: false,
            paused_systems,
            imaginary_sd_direction,
        };

        // 1. Pocket.
        if let Some(pattern) = zz.betting_pattern() {
            if pauses.can_pocket_trade() {
                if let Some(signal) = new_signals
                    .iter()
                    .find(|s| s.pattern == pattern && s.signal_index == block.index)
                {
                    decision.source = DecisionSource::Pocket;
                    decision.pattern = Some(pattern);
                    decision.direction = Some(signal.expected_direction);
                    decision.should_bet = true;
                    self.decisions.push(decision.clone());
                    return decision;
                }
            }
        }

        // 2. Same-Direction.
        if samedir.can_bet() && pauses.can_samedir_trade() {
            decision.source = DecisionSource::SameDir;
            decision.direction = Some(SameDirectionManager::bet_direction(block.direction));
            decision.should_bet = true;
            self.decisions.push(decision.clone());
            return decision;
        }

        // 3. Bucket: best eligible new signal by cumulative profit, then
        // canonical order.
        if pauses.can_bucket_trade() {
            let mut candidates: Vec<(&PatternSignal, PlayMode)> = new_signals
                .iter()
                .filter(|s| !s.pattern.is_zz_family() && s.signal_index == block.index)
                .filter(|s| !(long_run_engaged && s.pattern.is_alternation()))
                .filter_map(|s| buckets.play_mode(s.pattern).map(|mode| (s, mode)))
                .collect();
            candidates.sort_by(|(a, _), (b, _)| {
                let profit_a = lifecycle.cycle(a.pattern).cumulative_profit;
                let profit_b = lifecycle.cycle(b.pattern).cumulative_profit;
                profit_b
                    .cmp(&profit_a)
                    .then(a.pattern.index().cmp(&b.pattern.index()))
            });

            if let Some((signal, mode)) = candidates.first() {
                let inverse = *mode == PlayMode::Inverse;
                decision.source = DecisionSource::Bucket;
                decision.pattern = Some(signal.pattern);
                decision.direction = Some(if inverse {
                    signal.expected_direction.opposite()
                } else {
                    signal.expected_direction
                });
                decision.should_bet = true;
                decision.is_inverse = inverse;
                self.decisions.push(decision.clone());
                return decision;
            }
        }

        // 4. No bet.
        self.decisions.push(decision.clone());
        decision
    }
}
