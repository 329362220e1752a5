//! Range checks for engine inputs and configuration.

use crate::config::EngineConfig;
use crate::error::EngineError;
use rust_decimal::Decimal;

/// Validates a block magnitude against the documented [0, 100] range.
///
/// # Errors
/// Returns `EngineError::InvalidMagnitude` when out of range.
pub fn validate_magnitude(magnitude: Decimal) -> Result<(), EngineError> {
    if magnitude < Decimal::ZERO || magnitude > Decimal::ONE_HUNDRED {
        return Err(EngineError::InvalidMagnitude(magnitude));
    }
    Ok(())
}

/// Validates a configuration object against documented ranges.
///
/// # Errors
/// Returns `EngineError::InvalidConfig` naming the first offending field.
pub fn validate_config(config: &EngineConfig) -> Result<(), EngineError> {
    if !(0.0..=0.5).contains(&config.neutral_band) {
        return Err(EngineError::InvalidConfig(format!(
            "neutral_band must be in [0.0, 0.5], got {}",
            config.neutral_band
        )));
    }
    if config.p1_consecutive_threshold < 2 {
        return Err(EngineError::InvalidConfig(format!(
            "p1_consecutive_threshold must be at least 2, got {}",
            config.p1_consecutive_threshold
        )));
    }
    if config.bet_amount <= Decimal::ZERO {
        return Err(EngineError::InvalidConfig(format!(
            "bet_amount must be positive, got {}",
            config.bet_amount
        )));
    }
    if config.ap5_confirm_threshold < Decimal::ZERO
        || config.ap5_confirm_threshold > Decimal::ONE_HUNDRED
    {
        return Err(EngineError::InvalidConfig(format!(
            "ap5_confirm_threshold must be in [0, 100], got {}",
            config.ap5_confirm_threshold
        )));
    }

    let hostility = &config.hostility;
    if hostility.lock_threshold <= 0.0 {
        return Err(EngineError::InvalidConfig(format!(
            "hostility.lock_threshold must be positive, got {}",
            hostility.lock_threshold
        )));
    }
    if hostility.indicator_ttl == 0 {
        return Err(EngineError::InvalidConfig(
            "hostility.indicator_ttl must be at least 1 block".to_string(),
        ));
    }
    if hostility.decay_per_block < 0.0 || hostility.win_reduction < 0.0 {
        return Err(EngineError::InvalidConfig(
            "hostility decay values must be non-negative".to_string(),
        ));
    }
    if hostility.bait_warning_threshold > hostility.bait_confirmed_threshold {
        return Err(EngineError::InvalidConfig(format!(
            "hostility.bait_warning_threshold ({}) must not exceed bait_confirmed_threshold ({})",
            hostility.bait_warning_threshold, hostility.bait_confirmed_threshold
        )));
    }

    let bucket = &config.bucket;
    if bucket.consecutive_wins_to_break_bns == 0 {
        return Err(EngineError::InvalidConfig(
            "bucket.consecutive_wins_to_break_bns must be at least 1".to_string(),
        ));
    }
    if bucket.single_bait_threshold < Decimal::ZERO
        || bucket.single_bait_threshold > Decimal::ONE_HUNDRED
    {
        return Err(EngineError::InvalidConfig(format!(
            "bucket.single_bait_threshold must be in [0, 100], got {}",
            bucket.single_bait_threshold
        )));
    }
    if bucket.cumulative_bait_threshold <= Decimal::ZERO {
        return Err(EngineError::InvalidConfig(format!(
            "bucket.cumulative_bait_threshold must be positive, got {}",
            bucket.cumulative_bait_threshold
        )));
    }

    let pause = &config.pause;
    if pause.stop_game_drawdown >= Decimal::ZERO || pause.stop_game_actual_loss >= Decimal::ZERO {
        return Err(EngineError::InvalidConfig(
            "pause stop-game thresholds must be negative".to_string(),
        ));
    }
    if pause.major_pause_interval <= Decimal::ZERO {
        return Err(EngineError::InvalidConfig(format!(
            "pause.major_pause_interval must be positive, got {}",
            pause.major_pause_interval
        )));
    }
    if pause.major_pause_blocks == 0 || pause.minor_pause_blocks == 0 {
        return Err(EngineError::InvalidConfig(
            "pause durations must be at least 1 block".to_string(),
        ));
    }
    if pause.minor_pause_losses == 0 {
        return Err(EngineError::InvalidConfig(
            "pause.minor_pause_losses must be at least 1".to_string(),
        ));
    }

    let sd = &config.same_direction;
    if sd.activation_threshold <= Decimal::ZERO || sd.deactivation_threshold <= Decimal::ZERO {
        return Err(EngineError::InvalidConfig(
            "same_direction thresholds must be positive".to_string(),
        ));
    }
    if sd.high_reversal_threshold < Decimal::ZERO
        || sd.high_reversal_threshold > Decimal::ONE_HUNDRED
    {
        return Err(EngineError::InvalidConfig(format!(
            "same_direction.high_reversal_threshold must be in [0, 100], got {}",
            sd.high_reversal_threshold
        )));
    }

    for (start, end) in &config.trading_window.windows {
        if *start > 23 || *end > 24 || start >= end {
            return Err(EngineError::InvalidConfig(format!(
                "trading window ({start}, {end}) is not a valid UTC hour range"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn magnitude_bounds_accepted() {
        assert!(validate_magnitude(dec!(0)).is_ok());
        assert!(validate_magnitude(dec!(100)).is_ok());
        assert!(validate_magnitude(dec!(55.5)).is_ok());
    }

    #[test]
    fn magnitude_out_of_range_rejected() {
        assert!(validate_magnitude(dec!(-0.1)).is_err());
        assert!(validate_magnitude(dec!(100.1)).is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn neutral_band_out_of_range_rejected() {
        let mut config = EngineConfig::default();
        config.neutral_band = 0.6;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("neutral_band"));
    }

    #[test]
    fn non_negative_stop_game_rejected() {
        let mut config = EngineConfig::default();
        config.pause.stop_game_drawdown = dec!(100);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn zero_bns_break_count_rejected() {
        let mut config = EngineConfig::default();
        config.bucket.consecutive_wins_to_break_bns = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("consecutive_wins_to_break_bns"));
    }

    #[test]
    fn inverted_bait_thresholds_rejected() {
        let mut config = EngineConfig::default();
        config.hostility.bait_warning_threshold = 0.5;
        config.hostility.bait_confirmed_threshold = 0.2;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn invalid_trading_window_rejected() {
        let mut config = EngineConfig::default();
        config.trading_window.windows = vec![(9, 9)];
        assert!(validate_config(&config).is_err());

        config.trading_window.windows = vec![(25, 26)];
        assert!(validate_config(&config).is_err());

        config.trading_window.windows = vec![(9, 17)];
        assert!(validate_config(&config).is_ok());
    }
}
