//! Session hostility scoring, locking, and pattern recovery.
//!
//! Weighted indicators accumulate into a score that decays per block and
//! shrinks on wins. Crossing the lock threshold stops real betting until
//! one pattern recovers cleanly. The same module watches per-pattern
//! observation-vs-active win rates for bait-and-switch divergence.

use pattern_bet_core::{HostilityConfig, Pattern};
use pattern_bet_patterns::EvaluatedResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalogued hostility indicator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorKind {
    SevereLoss,
    ConsecutiveLosses,
    NegativePatternRun,
    BaitSwitch,
    BaitSwitchConfirmed,
    MultiPatternBait,
}

/// One recorded indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub kind: IndicatorKind,
    pub severity: f64,
    pub block_index: u32,
    pub pattern: Option<Pattern>,
}

/// Divergence status of one pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaitStatus {
    Clear,
    Baiting,
    Confirmed,
}

/// Recovery bookkeeping while the session is locked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternRecovery {
    pub is_recovered: bool,
    pub cumulative_profit: Decimal,
    pub has_bait_switch: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SampleStats {
    obs_wins: u32,
    obs_total: u32,
    active_wins: u32,
    active_total: u32,
}

impl SampleStats {
    /// Observation minus active win rate, once both sides have at least
    /// three samples.
    fn divergence(self) -> Option<f64> {
        if self.obs_total < 3 || self.active_total < 3 {
            return None;
        }
        let obs = f64::from(self.obs_wins) / f64::from(self.obs_total);
        let active = f64::from(self.active_wins) / f64::from(self.active_total);
        Some(obs - active)
    }
}

/// Hostility score, lock state, and per-pattern recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostilityManager {
    config: HostilityConfig,
    score: f64,
    indicators: Vec<IndicatorRecord>,
    is_locked: bool,
    consecutive_wins: u32,
    consecutive_losses: u32,
    recovery: Vec<PatternRecovery>,
    samples: Vec<SampleStats>,
    bait_status: Vec<BaitStatus>,
    multi_bait_fired: bool,
}

impl HostilityManager {
    #[must_use]
    pub fn new(config: HostilityConfig) -> Self {
        Self {
            config,
            score: 0.0,
            indicators: Vec::new(),
            is_locked: false,
            consecutive_wins: 0,
            consecutive_losses: 0,
            recovery: vec![PatternRecovery::default(); Pattern::COUNT],
            samples: vec![SampleStats::default(); Pattern::COUNT],
            bait_status: vec![BaitStatus::Clear; Pattern::COUNT],
            multi_bait_fired: false,
        }
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    #[must_use]
    pub fn indicators(&self) -> &[IndicatorRecord] {
        &self.indicators
    }

    #[must_use]
    pub fn bait_status(&self, pattern: Pattern) -> BaitStatus {
        self.bait_status[pattern.index()]
    }

    #[must_use]
    pub fn recovery(&self, pattern: Pattern) -> &PatternRecovery {
        &self.recovery[pattern.index()]
    }

    #[must_use]
    pub fn consecutive_wins(&self) -> u32 {
        self.consecutive_wins
    }

    fn severity_of(&self, kind: IndicatorKind) -> f64 {
        match kind {
            IndicatorKind::SevereLoss => self.config.severity_severe_loss,
            IndicatorKind::ConsecutiveLosses => self.config.severity_consecutive_losses,
            IndicatorKind::NegativePatternRun => self.config.severity_negative_pattern_run,
            IndicatorKind::BaitSwitch => self.config.severity_bait_switch,
            IndicatorKind::BaitSwitchConfirmed => self.config.severity_bait_switch_confirmed,
            IndicatorKind::MultiPatternBait => self.config.severity_multi_pattern_bait,
        }
    }

    /// Records an indicator, raises the score, and locks the session when
    /// the threshold is crossed.
    pub fn record_indicator(
        &mut self,
        kind: IndicatorKind,
        block_index: u32,
        pattern: Option<Pattern>,
    ) {
        let severity = self.severity_of(kind);
        self.indicators.push(IndicatorRecord {
            kind,
            severity,
            block_index,
            pattern,
        });
        self.score += severity;
        tracing::debug!(?kind, severity, score = self.score, "hostility indicator");
        self.check_lock();
    }

    fn check_lock(&mut self) {
        if !self.is_locked && self.score >= self.config.lock_threshold {
            self.is_locked = true;
            for (idx, rec) in self.recovery.iter_mut().enumerate() {
                rec.is_recovered = false;
                rec.cumulative_profit = Decimal::ZERO;
                rec.has_bait_switch = self.bait_status[idx] != BaitStatus::Clear;
            }
            tracing::warn!(score = self.score, "hostility lock engaged");
        }
    }

    fn check_unlock(&mut self) {
        if !self.is_locked {
            return;
        }
        let threshold = Decimal::ONE_HUNDRED;
        for rec in &mut self.recovery {
            if rec.cumulative_profit >= threshold && !rec.has_bait_switch {
                rec.is_recovered = true;
                self.is_locked = false;
                tracing::info!("hostility lock released by clean pattern recovery");
                return;
            }
        }
    }

    /// Feeds a settled trade: consecutive counters, win decay, and the
    /// severe-loss indicator.
    pub fn observe_trade(&mut self, block_index: u32, is_win: bool, magnitude: Decimal) {
        if is_win {
            self.consecutive_wins += 1;
            self.consecutive_losses = 0;
            let mut reduction = self.config.win_reduction;
            if self.consecutive_wins >= 3 {
                reduction += self.config.consecutive_win_bonus;
            }
            self.score = (self.score - reduction).max(0.0);
        } else {
            self.consecutive_losses += 1;
            self.consecutive_wins = 0;
            if magnitude >= self.config.severe_loss_threshold {
                self.record_indicator(IndicatorKind::SevereLoss, block_index, None);
            }
            if self.consecutive_losses == self.config.consecutive_loss_count {
                self.record_indicator(IndicatorKind::ConsecutiveLosses, block_index, None);
            }
        }
    }

    /// Feeds one evaluated pattern result: divergence samples and, while
    /// locked, recovery accumulation.
    pub fn observe_result(&mut self, result: &EvaluatedResult, was_active: bool) {
        let idx = result.pattern.index();
        let stats = &mut self.samples[idx];
        let win = result.is_correct();
        if was_active {
            stats.active_total += 1;
            if win {
                stats.active_wins += 1;
            }
        } else {
            stats.obs_total += 1;
            if win {
                stats.obs_wins += 1;
            }
        }

        self.refresh_bait_status(result.pattern, result.eval_index);

        if self.is_locked {
            let rec = &mut self.recovery[idx];
            rec.cumulative_profit =
                (rec.cumulative_profit + result.profit).max(Decimal::ZERO);
            rec.has_bait_switch = self.bait_status[idx] != BaitStatus::Clear;
            self.check_unlock();
        }
    }

    fn refresh_bait_status(&mut self, pattern: Pattern, block_index: u32) {
        let idx = pattern.index();
        let status = match self.samples[idx].divergence() {
            Some(gap) if gap > self.config.bait_confirmed_threshold => BaitStatus::Confirmed,
            Some(gap) if gap > self.config.bait_warning_threshold => BaitStatus::Baiting,
            _ => BaitStatus::Clear,
        };
        let previous = self.bait_status[idx];
        if status != previous {
            self.bait_status[idx] = status;
            match (previous, status) {
                (BaitStatus::Clear, BaitStatus::Baiting) => {
                    self.record_indicator(IndicatorKind::BaitSwitch, block_index, Some(pattern));
                }
                (_, BaitStatus::Confirmed) => {
                    self.record_indicator(
                        IndicatorKind::BaitSwitchConfirmed,
                        block_index,
                        Some(pattern),
                    );
                }
                _ => {}
            }
        }

        let baiting = self
            .bait_status
            .iter()
            .filter(|s| **s != BaitStatus::Clear)
            .count();
        if baiting >= 2 {
            if !self.multi_bait_fired {
                self.multi_bait_fired = true;
                self.record_indicator(IndicatorKind::MultiPatternBait, block_index, None);
            }
        } else {
            self.multi_bait_fired = false;
        }
    }

    /// Records a pattern break with a negative run profit.
    pub fn on_pattern_break(
        &mut self,
        pattern: Pattern,
        break_run_profit: Decimal,
        block_index: u32,
    ) {
        if break_run_profit < Decimal::ZERO {
            self.record_indicator(IndicatorKind::NegativePatternRun, block_index, Some(pattern));
        }
    }

    /// Per-block maintenance: indicator expiry, passive decay, and the
    /// session profit reset.
    pub fn on_block(&mut self, block_index: u32, session_pnl: Decimal) {
        let ttl = self.config.indicator_ttl;
        let mut expired = 0.0;
        self.indicators.retain(|ind| {
            let live = block_index.saturating_sub(ind.block_index) < ttl;
            if !live {
                expired += ind.severity;
            }
            live
        });
        self.score = (self.score - expired - self.config.decay_per_block).max(0.0);

        if session_pnl >= self.config.profit_reset_threshold {
            self.score = 0.0;
        }
    }
}
