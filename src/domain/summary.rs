//! Headline statistics for a finished run.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::simulation::PerformanceRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_contributed: Decimal,
    pub final_portfolio_value: Decimal,
    pub total_gain: Decimal,
    pub percentage_gain: Decimal,
    pub annualized_gain: f64,
    /// Fraction of bars where the portfolio was worth less than the cash put in.
    pub loss_frequency: f64,
    pub total_fees: Decimal,
    pub fee_ratio: Decimal,
    pub trade_count: usize,
}

impl Summary {
    /// Summarise `records`, annualising over `months` calendar months.
    pub fn compute(records: &[PerformanceRecord], months: u32) -> Option<Self> {
        let last = records.last()?;

        let percentage_gain = last.performance;
        let annualized_gain = annualize(percentage_gain, months);

        let losing = records
            .iter()
            .filter(|r| r.performance < Decimal::ZERO)
            .count();
        let loss_frequency = losing as f64 / records.len() as f64;

        let total_fees: Decimal = records.iter().map(|r| r.fees_paid).sum();
        let fee_ratio = if last.total_contributed.is_zero() {
            Decimal::ZERO
        } else {
            total_fees / last.total_contributed
        };

        Some(Summary {
            total_contributed: last.total_contributed,
            final_portfolio_value: last.portfolio_value,
            total_gain: last.portfolio_value - last.total_contributed,
            percentage_gain,
            annualized_gain,
            loss_frequency,
            total_fees,
            fee_ratio,
            trade_count: records.iter().filter(|r| r.is_trade()).count(),
        })
    }
}

/// `(1 + gain)^(12 / months) - 1`
fn annualize(gain: Decimal, months: u32) -> f64 {
    if months == 0 {
        return 0.0;
    }
    let growth = 1.0 + gain.to_f64().unwrap_or(0.0);
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(12.0 / months as f64) - 1.0
}

/// Calendar months from `start` to `end`, ignoring the day of month.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    months.max(0) as u32
}

/// Bars where shares were bought.
pub fn trade_records(records: &[PerformanceRecord]) -> Vec<&PerformanceRecord> {
    records.iter().filter(|r| r.is_trade()).collect()
}
