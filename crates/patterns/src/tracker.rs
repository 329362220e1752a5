//! Append-only block store with run-length bookkeeping.
//!
//! A run is a maximal consecutive same-direction span. The tracker keeps
//! the complete run-length history (last element is the current, still-open
//! run) and answers the structural queries every other subsystem builds on.

use pattern_bet_core::{validate_magnitude, Block, Direction, EngineError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One maximal same-direction span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub direction: Direction,
    pub length: u32,
}

/// Emitted when a new block flips direction and closes the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunBreak {
    /// The run that just completed.
    pub completed: Run,
    /// The block that broke it (first block of the new run).
    pub break_block: Block,
}

/// Append-only block and run tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockTracker {
    blocks: Vec<Block>,
    runs: Vec<Run>,
}

impl BlockTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block, extending the current run or starting a new one.
    ///
    /// Returns the appended block and, when the direction flipped, the run
    /// that just completed.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidMagnitude` if `magnitude` is outside
    /// [0, 100].
    pub fn add_block(
        &mut self,
        direction: Direction,
        magnitude: Decimal,
    ) -> Result<(Block, Option<RunBreak>), EngineError> {
        validate_magnitude(magnitude)?;

        let index = self.blocks.len() as u32;
        let block = Block::new(index, direction, magnitude);
        self.blocks.push(block);

        let run_break = match self.runs.last_mut() {
            Some(run) if run.direction == direction => {
                run.length += 1;
                None
            }
            Some(run) => {
                let completed = *run;
                self.runs.push(Run {
                    direction,
                    length: 1,
                });
                Some(RunBreak {
                    completed,
                    break_block: block,
                })
            }
            None => {
                self.runs.push(Run {
                    direction,
                    length: 1,
                });
                None
            }
        };

        Ok((block, run_break))
    }

    /// Removes the most recent block, rewinding run bookkeeping.
    ///
    /// Returns `None` on an empty tracker.
    pub fn pop_block(&mut self) -> Option<Block> {
        let block = self.blocks.pop()?;
        if let Some(run) = self.runs.last_mut() {
            if run.length > 1 {
                run.length -= 1;
            } else {
                self.runs.pop();
            }
        }
        Some(block)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[must_use]
    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    #[must_use]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Complete run-length sequence; the last element is the current run.
    #[must_use]
    pub fn run_lengths(&self) -> Vec<u32> {
        self.runs.iter().map(|r| r.length).collect()
    }

    #[must_use]
    pub fn current_run_length(&self) -> u32 {
        self.runs.last().map_or(0, |r| r.length)
    }

    #[must_use]
    pub fn current_run_direction(&self) -> Option<Direction> {
        self.runs.last().map(|r| r.direction)
    }

    /// Length of the most recently completed run, if any.
    #[must_use]
    pub fn previous_run_length(&self) -> Option<u32> {
        match self.runs.len() {
            0 | 1 => None,
            n => Some(self.runs[n - 2].length),
        }
    }

    /// Number of trailing runs of length 1 (including the current run).
    #[must_use]
    pub fn trailing_singleton_runs(&self) -> usize {
        self.runs
            .iter()
            .rev()
            .take_while(|r| r.length == 1)
            .count()
    }

    /// Length of the run immediately preceding the trailing singleton
    /// streak.
    #[must_use]
    pub fn run_before_singletons(&self) -> Option<u32> {
        let singles = self.trailing_singleton_runs();
        if singles == 0 || singles >= self.runs.len() {
            return None;
        }
        Some(self.runs[self.runs.len() - singles - 1].length)
    }

    /// Checks the structural bookkeeping invariant: run lengths sum to the
    /// block count and adjacent runs alternate direction.
    ///
    /// # Errors
    /// Returns an invariant violation describing the mismatch.
    pub fn check_invariants(&self) -> Result<(), EngineError> {
        let total: u64 = self.runs.iter().map(|r| u64::from(r.length)).sum();
        if total != self.blocks.len() as u64 {
            return Err(EngineError::invariant(
                "tracker",
                format!(
                    "run lengths sum to {total} but {} blocks recorded",
                    self.blocks.len()
                ),
            ));
        }
        for pair in self.runs.windows(2) {
            if pair[0].direction == pair[1].direction {
                return Err(EngineError::invariant(
                    "tracker",
                    "adjacent runs share a direction".to_string(),
                ));
            }
        }
        Ok(())
    }
}
