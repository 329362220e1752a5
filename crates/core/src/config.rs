use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub neutral_band: f64,
    /// Run length at which long-run mode engages and alternation bets are
    /// suppressed by the bucket arm.
    pub p1_consecutive_threshold: u32,
    pub daily_target: Decimal,
    pub bet_amount: Decimal,
    pub ap5_confirm_threshold: Decimal,
    #[serde(default)]
    pub hostility: HostilityConfig,
    #[serde(default)]
    pub bucket: BucketConfig,
    #[serde(default)]
    pub pause: PauseConfig,
    #[serde(default)]
    pub same_direction: SameDirConfig,
    #[serde(default)]
    pub trading_window: TradingWindowConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            neutral_band: 0.05,
            p1_consecutive_threshold: 6,
            daily_target: Decimal::from(500),
            bet_amount: Decimal::ONE_HUNDRED,
            ap5_confirm_threshold: Decimal::from(50),
            hostility: HostilityConfig::default(),
            bucket: BucketConfig::default(),
            pause: PauseConfig::default(),
            same_direction: SameDirConfig::default(),
            trading_window: TradingWindowConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostilityConfig {
    pub severe_loss_threshold: Decimal,
    pub lock_threshold: f64,
    /// Sliding window for indicators, in blocks.
    pub indicator_ttl: u32,
    pub decay_per_block: f64,
    pub win_reduction: f64,
    pub consecutive_win_bonus: f64,
    /// Consecutive losses needed before the indicator fires.
    pub consecutive_loss_count: u32,
    /// Session PnL at which the score resets to zero.
    pub profit_reset_threshold: Decimal,
    pub severity_severe_loss: f64,
    pub severity_consecutive_losses: f64,
    pub severity_negative_pattern_run: f64,
    pub severity_bait_switch: f64,
    pub severity_bait_switch_confirmed: f64,
    pub severity_multi_pattern_bait: f64,
    /// Observation-vs-active win rate gap marking a pattern as baiting.
    pub bait_warning_threshold: f64,
    pub bait_confirmed_threshold: f64,
}

impl Default for HostilityConfig {
    fn default() -> Self {
        Self {
            severe_loss_threshold: Decimal::from(85),
            lock_threshold: 10.0,
            indicator_ttl: 20,
            decay_per_block: 0.1,
            win_reduction: 0.5,
            consecutive_win_bonus: 1.0,
            consecutive_loss_count: 3,
            profit_reset_threshold: Decimal::from(200),
            severity_severe_loss: 3.0,
            severity_consecutive_losses: 2.0,
            severity_negative_pattern_run: 1.0,
            severity_bait_switch: 2.0,
            severity_bait_switch_confirmed: 3.0,
            severity_multi_pattern_bait: 4.0,
            bait_warning_threshold: 0.15,
            bait_confirmed_threshold: 0.30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketConfig {
    pub consecutive_wins_to_break_bns: u32,
    pub single_bait_threshold: Decimal,
    pub cumulative_bait_threshold: Decimal,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            consecutive_wins_to_break_bns: 2,
            single_bait_threshold: Decimal::from(70),
            cumulative_bait_threshold: Decimal::ONE_HUNDRED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseConfig {
    /// Total PnL at or below which STOP_GAME triggers.
    pub stop_game_drawdown: Decimal,
    /// Actual-ledger PnL at or below which STOP_GAME triggers.
    pub stop_game_actual_loss: Decimal,
    /// Drawdown milestone spacing for the 10-block major pause.
    pub major_pause_interval: Decimal,
    pub major_pause_blocks: u32,
    pub minor_pause_blocks: u32,
    /// Consecutive subsystem losses arming the minor pause.
    pub minor_pause_losses: u32,
}

impl Default for PauseConfig {
    fn default() -> Self {
        Self {
            stop_game_drawdown: Decimal::from(-500),
            stop_game_actual_loss: Decimal::from(-400),
            major_pause_interval: Decimal::from(300),
            major_pause_blocks: 10,
            minor_pause_blocks: 3,
            minor_pause_losses: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SameDirConfig {
    pub activation_threshold: Decimal,
    pub deactivation_threshold: Decimal,
    /// Reversal-loss magnitude that pauses the subsystem on its own.
    pub high_reversal_threshold: Decimal,
}

impl Default for SameDirConfig {
    fn default() -> Self {
        Self {
            activation_threshold: Decimal::from(140),
            deactivation_threshold: Decimal::from(140),
            high_reversal_threshold: Decimal::from(70),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingWindowConfig {
    pub enabled: bool,
    /// UTC hour ranges [start, end) during which new trades may open.
    pub windows: Vec<(u8, u8)>,
    pub allow_close_outside_window: bool,
}

impl Default for TradingWindowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            windows: Vec::new(),
            allow_close_outside_window: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_config_matches_documented_values() {
        let config = EngineConfig::default();
        assert!((config.neutral_band - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.bet_amount, dec!(100));
        assert_eq!(config.hostility.severe_loss_threshold, dec!(85));
        assert!((config.hostility.lock_threshold - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.bucket.consecutive_wins_to_break_bns, 2);
        assert_eq!(config.bucket.single_bait_threshold, dec!(70));
        assert_eq!(config.bucket.cumulative_bait_threshold, dec!(100));
        assert_eq!(config.pause.major_pause_blocks, 10);
        assert_eq!(config.pause.minor_pause_blocks, 3);
        assert_eq!(config.same_direction.activation_threshold, dec!(140));
        assert_eq!(config.same_direction.deactivation_threshold, dec!(140));
    }

    #[test]
    fn trading_window_disabled_by_default() {
        let config = EngineConfig::default();
        assert!(!config.trading_window.enabled);
        assert!(config.trading_window.allow_close_outside_window);
        assert!(config.trading_window.windows.is_empty());
    }

    #[test]
    fn config_serde_roundtrip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bet_amount, config.bet_amount);
        assert_eq!(back.pause.stop_game_drawdown, config.pause.stop_game_drawdown);
        assert_eq!(
            back.hostility.severity_multi_pattern_bait,
            config.hostility.severity_multi_pattern_bait
        );
    }

    #[test]
    fn partial_json_fills_sub_configs_with_defaults() {
        let json = r#"{
            "neutral_band": 0.1,
            "p1_consecutive_threshold": 8,
            "daily_target": "250",
            "bet_amount": "50",
            "ap5_confirm_threshold": "60"
        }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert!((config.neutral_band - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.bet_amount, dec!(50));
        assert_eq!(config.bucket.single_bait_threshold, dec!(70));
        assert_eq!(config.pause.major_pause_blocks, 10);
    }
}
