//! Configuration validation.
//!
//! Validates all config fields before a simulation runs.

use crate::domain::cadence::{parse_cadence_list, resolve};
use crate::domain::error::DcaError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const FEE_KEYS: [&str; 6] = [
    "commission_per_share",
    "commission_min_per_order",
    "commission_max_pct",
    "platform_fee_per_share",
    "platform_fee_min_per_order",
    "platform_fee_max_pct",
];

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), DcaError> {
    validate_ticker(config)?;
    validate_dates(config)?;
    validate_cadence(config)?;
    validate_non_negative(config, "simulation", "contribution")?;
    validate_fee_config(config)?;
    validate_compare(config)?;
    Ok(())
}

/// Every present `[fees]` key must be a non-negative decimal.
pub fn validate_fee_config(config: &dyn ConfigPort) -> Result<(), DcaError> {
    for key in FEE_KEYS {
        validate_non_negative(config, "fees", key)?;
    }
    Ok(())
}

fn validate_ticker(config: &dyn ConfigPort) -> Result<(), DcaError> {
    match config.get_string("simulation", "ticker") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(DcaError::ConfigMissing {
            section: "simulation".to_string(),
            key: "ticker".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), DcaError> {
    let start_str = config.get_string("simulation", "start_date");
    let end_str = config.get_string("simulation", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(DcaError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, DcaError> {
    match value {
        None => Err(DcaError::ConfigMissing {
            section: "simulation".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            DcaError::ConfigInvalid {
                section: "simulation".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_cadence(config: &dyn ConfigPort) -> Result<(), DcaError> {
    if let Some(name) = config.get_string("simulation", "cadence") {
        resolve(&name).map_err(|e| DcaError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "cadence".to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

/// Absent keys pass; present keys must be decimal numbers `>= 0`.
fn validate_non_negative(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), DcaError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    let invalid = |reason: String| DcaError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    };
    let value = Decimal::from_str(raw.trim())
        .map_err(|_| invalid(format!("{} must be a number", key)))?;
    if value < Decimal::ZERO {
        return Err(invalid(format!("{} must be non-negative", key)));
    }
    Ok(())
}

fn validate_compare(config: &dyn ConfigPort) -> Result<(), DcaError> {
    if let Some(list) = config.get_string("compare", "cadences") {
        let cadences = parse_cadence_list(&list).map_err(|e| DcaError::ConfigInvalid {
            section: "compare".to_string(),
            key: "cadences".to_string(),
            reason: e.to_string(),
        })?;
        if cadences.is_empty() {
            return Err(DcaError::ConfigInvalid {
                section: "compare".to_string(),
                key: "cadences".to_string(),
                reason: "at least one cadence is required".to_string(),
            });
        }
    }
    if let Some(name) = config.get_string("compare", "reference") {
        resolve(&name).map_err(|e| DcaError::ConfigInvalid {
            section: "compare".to_string(),
            key: "reference".to_string(),
            reason: e.to_string(),
        })?;
    }
    if let Some(raw) = config.get_string("compare", "trade_bars") {
        // A value that reads as both defaults is not a boolean.
        if config.get_bool("compare", "trade_bars", true) != config.get_bool("compare", "trade_bars", false) {
            return Err(DcaError::ConfigInvalid {
                section: "compare".to_string(),
                key: "trade_bars".to_string(),
                reason: format!("expected true or false, got '{}'", raw.trim()),
            });
        }
    }
    Ok(())
}
