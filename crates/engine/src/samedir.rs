//! Same-direction regime manager.
//!
//! Activates when a completed run's profit clears the activation threshold
//! and then bets continuation of the previous block. Losses accumulate
//! into a non-negative counter that deactivates the regime past the
//! deactivation threshold; pauses freeze the counter and route trades to
//! an imaginary ledger until a qualifying alternation-family loss resumes
//! play.

use crate::zz::ZzAction;
use pattern_bet_core::{Block, Direction, Pattern, SameDirConfig};
use pattern_bet_patterns::{EvaluatedResult, RunBreak};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why the subsystem paused itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdPauseReason {
    /// A losing reversal block with a decisive magnitude.
    HighPctReversal,
    /// Two or more consecutive same-direction losses.
    ConsecutiveLosses,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SameDirectionManager {
    config: SameDirConfig,
    active: bool,
    accumulated_loss: Decimal,
    current_run_blocks: Vec<Block>,
    run_history: Vec<Decimal>,
    paused: bool,
    pause_reason: Option<SdPauseReason>,
    sd_consecutive_losses: u32,
    imaginary_pnl: Decimal,
    activation_blocks: Vec<u32>,
}

impl SameDirectionManager {
    #[must_use]
    pub fn new(config: SameDirConfig) -> Self {
        Self {
            config,
            active: false,
            accumulated_loss: Decimal::ZERO,
            current_run_blocks: Vec::new(),
            run_history: Vec::new(),
            paused: false,
            pause_reason: None,
            sd_consecutive_losses: 0,
            imaginary_pnl: Decimal::ZERO,
            activation_blocks: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn pause_reason(&self) -> Option<SdPauseReason> {
        self.pause_reason
    }

    #[must_use]
    pub fn accumulated_loss(&self) -> Decimal {
        self.accumulated_loss
    }

    #[must_use]
    pub fn imaginary_pnl(&self) -> Decimal {
        self.imaginary_pnl
    }

    #[must_use]
    pub fn run_history(&self) -> &[Decimal] {
        &self.run_history
    }

    #[must_use]
    pub fn activation_blocks(&self) -> &[u32] {
        &self.activation_blocks
    }

    #[must_use]
    pub fn current_run_direction(&self) -> Option<Direction> {
        self.current_run_blocks.first().map(|b| b.direction)
    }

    /// Eligible to place a real continuation bet.
    #[must_use]
    pub fn can_bet(&self) -> bool {
        self.active && !self.paused
    }

    /// Continuation of the previous block's direction.
    #[must_use]
    pub const fn bet_direction(last_block: Direction) -> Direction {
        last_block
    }

    /// Observes a new block. Runs regardless of pauses or activity.
    ///
    /// `zz_family_active` hard-isolates single-block flip losses while a
    /// pocket pattern is live.
    pub fn on_block(&mut self, block: Block, run_break: Option<&RunBreak>, zz_family_active: bool) {
        let Some(run_break) = run_break else {
            self.current_run_blocks.push(block);
            return;
        };

        let completed = run_break.completed;
        if completed.length >= 2 {
            let continuation_profit: Decimal = self
                .current_run_blocks
                .iter()
                .skip(1)
                .map(|b| b.magnitude)
                .sum();
            let run_profit = continuation_profit - run_break.break_block.magnitude;
            self.run_history.push(run_profit);

            if !self.active {
                if run_profit >= self.config.activation_threshold {
                    self.active = true;
                    self.accumulated_loss = Decimal::ZERO;
                    self.activation_blocks.push(run_break.break_block.index);
                    tracing::info!(
                        block = run_break.break_block.index,
                        %run_profit,
                        "same-direction regime activated"
                    );
                }
            } else if !self.paused {
                if run_profit < Decimal::ZERO {
                    self.add_loss(-run_profit);
                } else if run_profit > self.accumulated_loss {
                    self.accumulated_loss = Decimal::ZERO;
                }
            }
        } else if self.active && !self.paused && !zz_family_active {
            // Single-block flip: the continuation bet lost on the break
            // block. ZZ-family activity isolates these losses.
            self.add_loss(run_break.break_block.magnitude);
        }

        self.current_run_blocks = vec![run_break.break_block];
    }

    fn add_loss(&mut self, amount: Decimal) {
        self.accumulated_loss += amount;
        if self.accumulated_loss > self.config.deactivation_threshold {
            self.deactivate();
        }
    }

    fn deactivate(&mut self) {
        tracing::info!(loss = %self.accumulated_loss, "same-direction regime deactivated");
        self.active = false;
        self.paused = false;
        self.pause_reason = None;
        self.sd_consecutive_losses = 0;
    }

    fn pause(&mut self, reason: SdPauseReason) {
        if !self.paused {
            tracing::info!(?reason, "same-direction paused");
        }
        self.paused = true;
        self.pause_reason = Some(reason);
    }

    /// Feeds the outcome of a real same-direction trade.
    ///
    /// Every loss settles on a reversal block (the bet was continuation),
    /// so a decisive losing magnitude pauses immediately; two consecutive
    /// losses pause as well.
    pub fn on_trade(&mut self, is_win: bool, magnitude: Decimal) {
        if is_win {
            self.sd_consecutive_losses = 0;
            return;
        }
        self.sd_consecutive_losses += 1;
        if magnitude >= self.config.high_reversal_threshold {
            self.pause(SdPauseReason::HighPctReversal);
        }
        if self.sd_consecutive_losses >= 2 {
            self.pause(SdPauseReason::ConsecutiveLosses);
        }
    }

    /// Records an imaginary continuation trade taken while paused.
    pub fn on_imaginary_trade(&mut self, is_win: bool, magnitude: Decimal) {
        self.imaginary_pnl += if is_win { magnitude } else { -magnitude };
    }

    /// Feeds a pattern result for pause decay and resume decisions.
    ///
    /// While paused, XAX wins bleed half their magnitude off the
    /// accumulated loss (the ZZ family contributes no decay). A loss by ZZ
    /// or a base XAX pattern resumes play; for ZZ the run must have ended
    /// on a later bet, not broken on its first.
    pub fn on_pattern_result(&mut self, result: &EvaluatedResult, zz_action: Option<ZzAction>) {
        if !self.paused {
            return;
        }

        let pattern = result.pattern;
        if result.is_correct() {
            if pattern.is_xax() {
                let decay = result.magnitude / Decimal::TWO;
                self.accumulated_loss = (self.accumulated_loss - decay).max(Decimal::ZERO);
            }
            return;
        }

        let resumes = match pattern {
            Pattern::Zz => matches!(zz_action, Some(ZzAction::RunEnds)),
            p if p.is_xax() => true,
            _ => false,
        };
        if resumes {
            tracing::info!(%pattern, "same-direction resumed");
            self.paused = false;
            self.pause_reason = None;
            self.sd_consecutive_losses = 0;
        }
    }
}
