//! Price data access port trait.

use crate::domain::error::DcaError;
use crate::domain::price::PriceBar;
use chrono::NaiveDate;

pub trait PriceDataPort {
    /// Daily closes for `ticker` over `[start_date, end_date)`, oldest first.
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, DcaError>;

    fn list_tickers(&self) -> Result<Vec<String>, DcaError>;
}
