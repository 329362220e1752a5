//! Dual append-only trade log: actual trades and simulated trades.
//!
//! Simulated entries record the trades the engine would have taken while
//! the session was locked or paused. Aggregates are pure folds over the
//! entry lists.

use crate::hierarchy::DecisionSource;
use pattern_bet_core::{Direction, Pattern};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One settled trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    /// Block index the trade settled on.
    pub block_index: u32,
    /// Pattern that produced the trade; `None` for same-direction bets.
    pub pattern: Option<Pattern>,
    pub source: DecisionSource,
    pub direction: Direction,
    pub magnitude: Decimal,
    pub is_win: bool,
    pub pnl: Decimal,
    pub is_actual: bool,
}

impl LedgerEntry {
    /// Creates an entry. Ids are derived from the settlement block and the
    /// ledger side so that an undone and re-settled trade reproduces the
    /// same entry.
    #[must_use]
    pub fn new(
        block_index: u32,
        pattern: Option<Pattern>,
        source: DecisionSource,
        direction: Direction,
        magnitude: Decimal,
        is_win: bool,
        is_actual: bool,
    ) -> Self {
        let pnl = if is_win { magnitude } else { -magnitude };
        Self {
            id: Uuid::from_u64_pair(u64::from(block_index), u64::from(is_actual)),
            block_index,
            pattern,
            source,
            direction,
            magnitude,
            is_win,
            pnl,
            is_actual,
        }
    }
}

/// Per-pattern rollup over a block range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRollup {
    pub pattern: Option<Pattern>,
    pub trades: u32,
    pub wins: u32,
    pub pnl: Decimal,
}

/// Ordered actual and simulated trade logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualLedger {
    pub actual: Vec<LedgerEntry>,
    pub simulated: Vec<LedgerEntry>,
}

impl DualLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry to the log matching its `is_actual` flag.
    pub fn push(&mut self, entry: LedgerEntry) {
        if entry.is_actual {
            self.actual.push(entry);
        } else {
            self.simulated.push(entry);
        }
    }

    #[must_use]
    pub fn actual_pnl(&self) -> Decimal {
        self.actual.iter().map(|e| e.pnl).sum()
    }

    #[must_use]
    pub fn simulated_pnl(&self) -> Decimal {
        self.simulated.iter().map(|e| e.pnl).sum()
    }

    /// Combined PnL across both logs.
    #[must_use]
    pub fn total_pnl(&self) -> Decimal {
        self.actual_pnl() + self.simulated_pnl()
    }

    /// Win rate over actual trades, 0.0 when empty.
    #[must_use]
    pub fn actual_win_rate(&self) -> f64 {
        if self.actual.is_empty() {
            return 0.0;
        }
        let wins = self.actual.iter().filter(|e| e.is_win).count();
        wins as f64 / self.actual.len() as f64
    }

    /// The most recent `n` actual entries, oldest first.
    #[must_use]
    pub fn last_actual(&self, n: usize) -> &[LedgerEntry] {
        let start = self.actual.len().saturating_sub(n);
        &self.actual[start..]
    }

    /// All entries (actual and simulated) settled on the given block, in
    /// append order.
    #[must_use]
    pub fn entries_at(&self, block_index: u32) -> Vec<&LedgerEntry> {
        self.actual
            .iter()
            .chain(self.simulated.iter())
            .filter(|e| e.block_index == block_index)
            .collect()
    }

    /// Per-pattern rollups over an inclusive block range, actual entries
    /// only, in canonical pattern order with same-direction trades last.
    #[must_use]
    pub fn rollup(&self, from_block: u32, to_block: u32) -> Vec<PatternRollup> {
        let mut rollups: Vec<PatternRollup> = Vec::new();
        let keys = Pattern::ALL
            .iter()
            .map(|p| Some(*p))
            .chain(std::iter::once(None));
        for key in keys {
            let entries: Vec<&LedgerEntry> = self
                .actual
                .iter()
                .filter(|e| {
                    e.pattern == key && e.block_index >= from_block && e.block_index <= to_block
                })
                .collect();
            if entries.is_empty() {
                continue;
            }
            rollups.push(PatternRollup {
                pattern: key,
                trades: entries.len() as u32,
                wins: entries.iter().filter(|e| e.is_win).count() as u32,
                pnl: entries.iter().map(|e| e.pnl).sum(),
            });
        }
        rollups
    }

    /// Removes entries settled on the given block (undo path) and returns
    /// them.
    pub fn remove_at(&mut self, block_index: u32) -> Vec<LedgerEntry> {
        let mut removed = Vec::new();
        for log in [&mut self.actual, &mut self.simulated] {
            let mut kept = Vec::with_capacity(log.len());
            for entry in log.drain(..) {
                if entry.block_index == block_index {
                    removed.push(entry);
                } else {
                    kept.push(entry);
                }
            }
            *log = kept;
        }
        removed
    }
}
