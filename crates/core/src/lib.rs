pub mod config;
pub mod config_loader;
pub mod error;
pub mod types;
pub mod validation;

pub use config::{
    BucketConfig, EngineConfig, HostilityConfig, PauseConfig, SameDirConfig, TradingWindowConfig,
};
pub use config_loader::ConfigLoader;
pub use error::EngineError;
pub use types::{Block, BucketKind, Direction, Pattern, Pocket, Verdict};
pub use validation::{validate_config, validate_magnitude};
