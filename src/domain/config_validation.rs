//! Configuration validation.
//!
//! Validates config fields before any price data is read.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::error::SigtraderError;
use crate::ports::config_port::ConfigPort;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    require_present(config, "data", "directory")
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_initial_funds(config)?;
    validate_fees(config)?;
    validate_interest_rate(config)?;
    validate_dates(config)?;
    require_present(config, "backtest", "ticker")?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    require_present(config, "strategy", "entry")?;
    require_present(config, "strategy", "exit")?;
    Ok(())
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    require_present(config, "analysis", "tickers")?;
    require_present(config, "analysis", "filter")?;
    let days = config.get_int("analysis", "rolling_days", 1);
    if days < 1 || days > i64::from(u32::MAX) {
        return Err(SigtraderError::ConfigInvalid {
            section: "analysis".to_string(),
            key: "rolling_days".to_string(),
            reason: "rolling_days must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Parse an optional decimal key, reporting malformed text instead of
/// falling back to a default.
pub fn read_decimal(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Decimal>, SigtraderError> {
    config
        .get_string(section, key)
        .map(|raw| {
            Decimal::from_str(raw.trim()).map_err(|_| SigtraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("'{}' is not a decimal number", raw.trim()),
            })
        })
        .transpose()
}

pub fn parse_date(value: &str, section: &str, key: &str) -> Result<NaiveDate, SigtraderError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        SigtraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("invalid {key} format, expected YYYY-MM-DD"),
        }
    })
}

fn require_present(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), SigtraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SigtraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_initial_funds(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match read_decimal(config, "backtest", "initial_funds")? {
        None => Err(SigtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "initial_funds".to_string(),
        }),
        Some(value) if value <= Decimal::ZERO => Err(SigtraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_funds".to_string(),
            reason: "initial_funds must be positive".to_string(),
        }),
        Some(_) => Ok(()),
    }
}

fn validate_fees(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    for key in ["fee_flat", "fee_percent"] {
        require_non_negative(config, key)?;
    }
    Ok(())
}

fn validate_interest_rate(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    require_non_negative(config, "interest_rate")
}

fn require_non_negative(config: &dyn ConfigPort, key: &str) -> Result<(), SigtraderError> {
    if let Some(value) = read_decimal(config, "backtest", key)? {
        if value < Decimal::ZERO {
            return Err(SigtraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: key.to_string(),
                reason: format!("{key} must be non-negative"),
            });
        }
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let start_date = required_date(config, "start_date")?;
    let end_date = required_date(config, "end_date")?;

    if start_date >= end_date {
        return Err(SigtraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

fn required_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, SigtraderError> {
    match config.get_string("backtest", key) {
        None => Err(SigtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: key.to_string(),
        }),
        Some(s) => parse_date(&s, "backtest", key),
    }
}
