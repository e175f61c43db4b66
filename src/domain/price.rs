//! Daily close price bars.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DcaError;

/// One trading day's closing price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: Decimal,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: Decimal) -> Self {
        Self { date, close }
    }
}

/// Check the preconditions every simulation run relies on: at least one bar,
/// strictly increasing dates, and positive closes.
pub fn validate_series(prices: &[PriceBar]) -> Result<(), DcaError> {
    let first = prices.first().ok_or(DcaError::EmptyPriceSeries)?;
    if first.close <= Decimal::ZERO {
        return Err(DcaError::NonPositivePrice { date: first.date });
    }

    for pair in prices.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.date <= prev.date {
            return Err(DcaError::NonMonotonicDates {
                previous: prev.date,
                current: curr.date,
            });
        }
        if curr.close <= Decimal::ZERO {
            return Err(DcaError::NonPositivePrice { date: curr.date });
        }
    }
    Ok(())
}
