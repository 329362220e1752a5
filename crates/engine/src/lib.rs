pub mod bns_kill;
pub mod bucket;
pub mod hierarchy;
pub mod hostility;
pub mod ledger;
pub mod pause;
pub mod persistence;
pub mod reaction;
pub mod samedir;
pub mod session;
pub mod snapshot;
pub mod zz;

pub use bns_kill::{BnsKillMachines, KillMachine};
pub use bucket::{BnsSub, BucketManager, BucketTransition, PatternBucketState, PlayMode};
pub use hierarchy::{DecisionSource, HierarchyArbiter, HierarchyDecision};
pub use hostility::{BaitStatus, HostilityManager, IndicatorKind, IndicatorRecord};
pub use ledger::{DualLedger, LedgerEntry, PatternRollup};
pub use pause::{ActivePause, PauseKind, PauseManager, PauseTrack};
pub use persistence::{StateRecord, STATE_RECORD_VERSION};
pub use reaction::{BlockOutcome, EngineStats, PendingTrade, ReactionEngine};
pub use samedir::{SameDirectionManager, SdPauseReason};
pub use session::{spawn_session, SessionCommand, SessionHandle};
pub use snapshot::{EngineSnapshot, SnapshotStore};
pub use zz::{ZzAction, ZzStateManager};
