//! Message-passing boundary around the single-threaded engine.
//!
//! The engine never shares state across threads: a session task owns it
//! and processes commands from an mpsc channel, one tick at a time. The
//! clone-able handle is what concurrent embeddings (UI, metrics) hold.

use crate::persistence::StateRecord;
use crate::reaction::{BlockOutcome, EngineStats, ReactionEngine};
use anyhow::Result;
use pattern_bet_core::{Block, EngineConfig, EngineError};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Commands accepted by the session actor.
#[derive(Debug)]
pub enum SessionCommand {
    AddBlock {
        direction: i32,
        magnitude: Decimal,
        respond: oneshot::Sender<Result<BlockOutcome, EngineError>>,
    },
    UndoLastBlock {
        respond: oneshot::Sender<Option<Block>>,
    },
    GetStats {
        respond: oneshot::Sender<EngineStats>,
    },
    ExportState {
        respond: oneshot::Sender<Box<StateRecord>>,
    },
    SetTradingWindow(bool),
    Reset,
    Shutdown,
}

/// Clone-able handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Creates a handle over an existing command channel.
    #[must_use]
    pub const fn new(tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { tx }
    }

    /// Ingests a block and returns the tick's outcome.
    ///
    /// # Errors
    /// Returns an error if the session is gone or the engine rejects the
    /// block.
    pub async fn add_block(&self, direction: i32, magnitude: Decimal) -> Result<BlockOutcome> {
        let (respond, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::AddBlock {
                direction,
                magnitude,
                respond,
            })
            .await?;
        Ok(rx.await??)
    }

    /// Undoes the most recent block.
    ///
    /// # Errors
    /// Returns an error if the session is gone.
    pub async fn undo_last_block(&self) -> Result<Option<Block>> {
        let (respond, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::UndoLastBlock { respond })
            .await?;
        Ok(rx.await?)
    }

    /// Fetches current aggregate stats.
    ///
    /// # Errors
    /// Returns an error if the session is gone.
    pub async fn stats(&self) -> Result<EngineStats> {
        let (respond, rx) = oneshot::channel();
        self.tx.send(SessionCommand::GetStats { respond }).await?;
        Ok(rx.await?)
    }

    /// Exports the versioned state record.
    ///
    /// # Errors
    /// Returns an error if the session is gone.
    pub async fn export_state(&self) -> Result<StateRecord> {
        let (respond, rx) = oneshot::channel();
        self.tx.send(SessionCommand::ExportState { respond }).await?;
        Ok(*rx.await?)
    }

    /// Updates the trading-window oracle.
    ///
    /// # Errors
    /// Returns an error if the session is gone.
    pub async fn set_trading_window(&self, open: bool) -> Result<()> {
        self.tx.send(SessionCommand::SetTradingWindow(open)).await?;
        Ok(())
    }

    /// Clears all session state.
    ///
    /// # Errors
    /// Returns an error if the session is gone.
    pub async fn reset(&self) -> Result<()> {
        self.tx.send(SessionCommand::Reset).await?;
        Ok(())
    }

    /// Shuts the session down.
    ///
    /// # Errors
    /// Returns an error if the session is already gone.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(SessionCommand::Shutdown).await?;
        Ok(())
    }
}

/// Spawns the session actor and returns its handle.
#[must_use]
pub fn spawn_session(config: EngineConfig) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(64);
    let handle = SessionHandle::new(tx);
    let join = tokio::spawn(run_session(ReactionEngine::new(config), rx));
    (handle, join)
}

async fn run_session(mut engine: ReactionEngine, mut rx: mpsc::Receiver<SessionCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            SessionCommand::AddBlock {
                direction,
                magnitude,
                respond,
            } => {
                let outcome = engine.add_block(direction, magnitude);
                let _ = respond.send(outcome);
            }
            SessionCommand::UndoLastBlock { respond } => {
                let _ = respond.send(engine.undo_last_block());
            }
            SessionCommand::GetStats { respond } => {
                let _ = respond.send(engine.stats());
            }
            SessionCommand::ExportState { respond } => {
                let _ = respond.send(Box::new(engine.export_state()));
            }
            SessionCommand::SetTradingWindow(open) => engine.set_trading_window(open),
            SessionCommand::Reset => engine.reset(),
            SessionCommand::Shutdown => break,
        }
    }
    tracing::debug!("session actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn session_processes_blocks_in_order() {
        let (session, join) = spawn_session(EngineConfig::default());

        let outcome = session.add_block(1, dec!(60)).await.unwrap();
        assert_eq!(outcome.block.index, 0);
        let outcome = session.add_block(-1, dec!(40)).await.unwrap();
        assert_eq!(outcome.block.index, 1);

        let stats = session.stats().await.unwrap();
        assert_eq!(stats.block_count, 2);

        session.shutdown().await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn session_rejects_invalid_input() {
        let (session, join) = spawn_session(EngineConfig::default());
        assert!(session.add_block(2, dec!(50)).await.is_err());
        assert!(session.add_block(1, dec!(101)).await.is_err());
        session.shutdown().await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn session_undo_and_export() {
        let (session, join) = spawn_session(EngineConfig::default());
        session.add_block(1, dec!(60)).await.unwrap();
        session.add_block(1, dec!(55)).await.unwrap();

        let removed = session.undo_last_block().await.unwrap().unwrap();
        assert_eq!(removed.index, 1);

        let record = session.export_state().await.unwrap();
        assert_eq!(record.blocks.len(), 1);

        session.shutdown().await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn undo_on_empty_session_is_none() {
        let (session, join) = spawn_session(EngineConfig::default());
        assert!(session.undo_last_block().await.unwrap().is_none());
        session.shutdown().await.unwrap();
        join.await.unwrap();
    }
}
