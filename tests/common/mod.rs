#![allow(dead_code)]

use chrono::NaiveDate;
use dcasim::domain::cadence::Cadence;
use dcasim::domain::comparison::ComparisonTable;
use dcasim::domain::error::DcaError;
use dcasim::domain::fees::FeeParameters;
pub use dcasim::domain::price::PriceBar;
use dcasim::domain::simulation::{DcaConfig, PerformanceRecord};
use dcasim::ports::data_port::PriceDataPort;
use dcasim::ports::report_port::ReportPort;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockPriceDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, DcaError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(DcaError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date < end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, DcaError> {
        let mut tickers: Vec<_> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

/// Records what would have been written instead of touching the filesystem.
#[derive(Default)]
pub struct RecordingReportPort {
    pub records: RefCell<Vec<(String, usize)>>,
    pub tables: RefCell<Vec<(String, ComparisonTable)>>,
}

impl ReportPort for RecordingReportPort {
    fn write_records(
        &self,
        records: &[PerformanceRecord],
        output_path: &str,
    ) -> Result<(), DcaError> {
        self.records
            .borrow_mut()
            .push((output_path.to_string(), records.len()));
        Ok(())
    }

    fn write_comparison(
        &self,
        table: &ComparisonTable,
        output_path: &str,
    ) -> Result<(), DcaError> {
        self.tables
            .borrow_mut()
            .push((output_path.to_string(), table.clone()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: Decimal) -> PriceBar {
    PriceBar::new(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(), close)
}

/// `count` consecutive calendar days starting at `start_date`, with close
/// `start_price + i * step`.
pub fn generate_bars(start_date: &str, count: usize, start_price: Decimal, step: Decimal) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| PriceBar {
            date: start + chrono::Duration::days(i as i64),
            close: start_price + Decimal::from(i) * step,
        })
        .collect()
}

pub fn flat_bars(count: usize, close: Decimal) -> Vec<PriceBar> {
    generate_bars("2024-01-01", count, close, Decimal::ZERO)
}

pub fn broker_fees() -> FeeParameters {
    FeeParameters {
        commission_per_share: dec!(0.005),
        commission_min_per_order: dec!(0.99),
        commission_max_pct: dec!(0.5),
        platform_fee_per_share: dec!(0.005),
        platform_fee_min_per_order: dec!(1.00),
        platform_fee_max_pct: dec!(0.5),
    }
}

pub fn sample_config(cadence: Cadence) -> DcaConfig {
    DcaConfig {
        cadence,
        contribution_amount: dec!(100),
        fees: FeeParameters::default(),
    }
}
