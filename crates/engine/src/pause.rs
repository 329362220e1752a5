//! Pause tracks: three independent subsystem pauses plus a terminal
//! session stop.
//!
//! Each track counts drawdown milestones and consecutive losses for its
//! own subsystem. Block-based pause durations tick down at the end of each
//! pipeline run; the global stop never clears.

use pattern_bet_core::PauseConfig;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of an active pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseKind {
    /// Terminal session stop; observation continues, trading never resumes.
    StopGame,
    /// Ten-block pause on a drawdown milestone crossing.
    MajorPause10,
    /// Three-block pause after consecutive subsystem losses.
    MinorPause3,
}

/// The subsystem a pause applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseTrack {
    Pocket,
    Bucket,
    SameDir,
}

impl PauseTrack {
    pub const ALL: [Self; 3] = [Self::Pocket, Self::Bucket, Self::SameDir];
}

/// A live pause on one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePause {
    pub kind: PauseKind,
    pub reason: String,
    pub start_block: u32,
    pub blocks_remaining: u32,
}

/// Per-track drawdown and loss bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct TrackState {
    pause: Option<ActivePause>,
    pnl: Decimal,
    milestones_crossed: u32,
    consecutive_losses: u32,
}

/// All four pause tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseManager {
    config: PauseConfig,
    stop_game: Option<ActivePause>,
    pocket: TrackState,
    bucket: TrackState,
    samedir: TrackState,
}

impl PauseManager {
    #[must_use]
    pub fn new(config: PauseConfig) -> Self {
        Self {
            config,
            stop_game: None,
            pocket: TrackState::default(),
            bucket: TrackState::default(),
            samedir: TrackState::default(),
        }
    }

    fn track(&self, track: PauseTrack) -> &TrackState {
        match track {
            PauseTrack::Pocket => &self.pocket,
            PauseTrack::Bucket => &self.bucket,
            PauseTrack::SameDir => &self.samedir,
        }
    }

    fn track_mut(&mut self, track: PauseTrack) -> &mut TrackState {
        match track {
            PauseTrack::Pocket => &mut self.pocket,
            PauseTrack::Bucket => &mut self.bucket,
            PauseTrack::SameDir => &mut self.samedir,
        }
    }

    /// Records a settled trade for a track, arming the milestone and
    /// consecutive-loss pauses when their conditions trip.
    pub fn record_result(&mut self, track: PauseTrack, pnl: Decimal, block_index: u32) {
        let interval = self.config.major_pause_interval;
        let major_blocks = self.config.major_pause_blocks;
        let minor_blocks = self.config.minor_pause_blocks;
        let minor_losses = self.config.minor_pause_losses;

        let state = self.track_mut(track);
        state.pnl += pnl;

        if pnl < Decimal::ZERO {
            state.consecutive_losses += 1;
        } else {
            state.consecutive_losses = 0;
        }

        // Milestone crossing: each additional -interval of track drawdown.
        let drawdown = -state.pnl;
        if drawdown > Decimal::ZERO {
            let crossed = (drawdown / interval)
                .trunc()
                .to_u32()
                .unwrap_or(u32::MAX);
            if crossed > state.milestones_crossed {
                state.milestones_crossed = crossed;
                state.pause = Some(ActivePause {
                    kind: PauseKind::MajorPause10,
                    reason: format!("drawdown milestone {crossed} crossed"),
                    start_block: block_index,
                    blocks_remaining: major_blocks,
                });
                tracing::info!(?track, crossed, "major pause armed");
                return;
            }
        }

        if state.consecutive_losses >= minor_losses && state.pause.is_none() {
            state.pause = Some(ActivePause {
                kind: PauseKind::MinorPause3,
                reason: format!("{} consecutive losses", state.consecutive_losses),
                start_block: block_index,
                blocks_remaining: minor_blocks,
            });
            tracing::info!(?track, "minor pause armed");
        }
    }

    /// Checks the terminal stop conditions against session totals.
    pub fn check_stop_game(&mut self, total_pnl: Decimal, actual_pnl: Decimal, block_index: u32) {
        if self.stop_game.is_some() {
            return;
        }
        let drawdown_hit = total_pnl <= self.config.stop_game_drawdown;
        let actual_hit = actual_pnl <= self.config.stop_game_actual_loss;
        if drawdown_hit || actual_hit {
            let reason = if drawdown_hit {
                format!("total pnl {total_pnl} at stop-game drawdown")
            } else {
                format!("actual pnl {actual_pnl} at stop-game loss limit")
            };
            tracing::warn!(%reason, "stop game triggered");
            self.stop_game = Some(ActivePause {
                kind: PauseKind::StopGame,
                reason,
                start_block: block_index,
                blocks_remaining: 0,
            });
        }
    }

    /// Ticks every non-global pause down by one block, clearing at zero.
    pub fn tick(&mut self) {
        for track in PauseTrack::ALL {
            let state = self.track_mut(track);
            if let Some(pause) = &mut state.pause {
                pause.blocks_remaining = pause.blocks_remaining.saturating_sub(1);
                if pause.blocks_remaining == 0 {
                    state.pause = None;
                }
            }
        }
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop_game.is_some()
    }

    #[must_use]
    pub fn stop_game(&self) -> Option<&ActivePause> {
        self.stop_game.as_ref()
    }

    #[must_use]
    pub fn active_pause(&self, track: PauseTrack) -> Option<&ActivePause> {
        self.track(track).pause.as_ref()
    }

    #[must_use]
    pub fn can_trade(&self, track: PauseTrack) -> bool {
        !self.is_stopped() && self.track(track).pause.is_none()
    }

    #[must_use]
    pub fn can_pocket_trade(&self) -> bool {
        self.can_trade(PauseTrack::Pocket)
    }

    #[must_use]
    pub fn can_bucket_trade(&self) -> bool {
        self.can_trade(PauseTrack::Bucket)
    }

    #[must_use]
    pub fn can_samedir_trade(&self) -> bool {
        self.can_trade(PauseTrack::SameDir)
    }
}
