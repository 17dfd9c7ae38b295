//! Configuration validation.
//!
//! Validates all config fields before an analysis runs.

use crate::domain::error::TrendcastError;
use crate::domain::forecast::ModelChoice;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{Interval, SourceKind};

/// Highest polynomial degree accepted from configuration.
pub const MAX_DEGREE: i64 = 6;

/// Longest history window accepted from configuration, about a century.
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    validate_source(config)?;
    validate_data_path(config)?;
    validate_lookback(config)?;
    validate_interval(config)?;
    validate_cache_ttl(config)?;
    Ok(())
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    validate_indicator_periods(config)?;
    validate_bollinger_k(config)?;
    validate_horizon(config)?;
    validate_model(config)?;
    validate_degrees(config)?;
    validate_weight_floors(config)?;
    validate_band_window(config)?;
    validate_threshold(config)?;
    Ok(())
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    if let Some(s) = config.get_string("data", "source") {
        s.parse::<SourceKind>()?;
    }
    if config.get_int("sqlite", "pool_size", 4) < 1 {
        return Err(TrendcastError::invalid(
            "sqlite",
            "pool_size",
            "pool_size must be at least 1",
        ));
    }
    Ok(())
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TrendcastError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_lookback(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    let value = config.get_int("data", "lookback_days", 730);
    if !(1..=MAX_LOOKBACK_DAYS).contains(&value) {
        return Err(TrendcastError::invalid(
            "data",
            "lookback_days",
            format!(
                "lookback_days must be between 1 and {}",
                MAX_LOOKBACK_DAYS
            ),
        ));
    }
    Ok(())
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    if let Some(s) = config.get_string("data", "interval") {
        s.parse::<Interval>()?;
    }
    Ok(())
}

fn validate_cache_ttl(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    if config.get_int("data", "cache_ttl_secs", 3600) < 0 {
        return Err(TrendcastError::invalid(
            "data",
            "cache_ttl_secs",
            "cache_ttl_secs must be non-negative",
        ));
    }
    Ok(())
}

fn validate_indicator_periods(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    let sma_period = config.get_int("indicators", "sma_period", 20);
    for (key, default, minimum) in [
        ("sma_period", 20, 1),
        ("rsi_period", 14, 1),
        ("bollinger_period", sma_period, 2),
    ] {
        if config.get_int("indicators", key, default) < minimum {
            return Err(TrendcastError::invalid(
                "indicators",
                key,
                format!("{} must be at least {}", key, minimum),
            ));
        }
    }

    // The middle band is the SMA, so both must share one window.
    if config.get_int("indicators", "bollinger_period", sma_period) != sma_period {
        return Err(TrendcastError::invalid(
            "indicators",
            "bollinger_period",
            "bollinger_period must equal sma_period",
        ));
    }
    Ok(())
}

fn validate_bollinger_k(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    let value = config.get_double("indicators", "bollinger_k", 2.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(TrendcastError::invalid(
            "indicators",
            "bollinger_k",
            "bollinger_k must be positive",
        ));
    }
    Ok(())
}

fn validate_horizon(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    if config.get_int("forecast", "horizon", 7) < 1 {
        return Err(TrendcastError::invalid(
            "forecast",
            "horizon",
            "horizon must be at least 1",
        ));
    }
    Ok(())
}

fn validate_model(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    if let Some(s) = config.get_string("forecast", "model") {
        s.parse::<ModelChoice>()?;
    }
    Ok(())
}

fn validate_degrees(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    for key in ["degree", "degree_high"] {
        let value = config.get_int("forecast", key, 3);
        if !(1..=MAX_DEGREE).contains(&value) {
            return Err(TrendcastError::invalid(
                "forecast",
                key,
                format!("{} must be between 1 and {}", key, MAX_DEGREE),
            ));
        }
    }
    Ok(())
}

fn validate_weight_floors(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    for (key, default) in [("weight_floor", 0.1), ("weight_floor_high", 0.01)] {
        let value = config.get_double("forecast", key, default);
        if !(value > 0.0 && value <= 1.0) {
            return Err(TrendcastError::invalid(
                "forecast",
                key,
                format!("{} must be in (0, 1]", key),
            ));
        }
    }
    Ok(())
}

fn validate_band_window(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    if config.get_int("forecast", "band_window", 20) < 2 {
        return Err(TrendcastError::invalid(
            "forecast",
            "band_window",
            "band_window must be at least 2",
        ));
    }
    Ok(())
}

fn validate_threshold(config: &dyn ConfigPort) -> Result<(), TrendcastError> {
    let value = config.get_double("calibration", "threshold_pct", 5.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(TrendcastError::invalid(
            "calibration",
            "threshold_pct",
            "threshold_pct must be positive",
        ));
    }
    Ok(())
}
