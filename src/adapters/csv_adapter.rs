//! CSV file price data adapter.
//!
//! Reads `<base_path>/<TICKER>.csv`. The header row must name a `date` column
//! and a `close` column (any case); other columns, such as the open/high/low/
//! volume fields of a typical vendor export, are ignored.

use crate::domain::error::DcaError;
use crate::domain::price::PriceBar;
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `<base>/<ticker>.csv`, falling back to a file whose stem matches
    /// `ticker` in any case (`spy.csv` serves `SPY`).
    fn csv_path(&self, ticker: &str) -> PathBuf {
        let exact = self.base_path.join(format!("{}.csv", ticker));
        if exact.is_file() {
            return exact;
        }
        fs::read_dir(&self.base_path)
            .into_iter()
            .flatten()
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                path.extension().is_some_and(|ext| ext == "csv")
                    && path
                        .file_stem()
                        .and_then(|stem| stem.to_str())
                        .is_some_and(|stem| stem.eq_ignore_ascii_case(ticker))
            })
            .unwrap_or(exact)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, DcaError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| DcaError::Data {
            reason: format!("missing {} column", name),
        })
}

impl PriceDataPort for CsvPriceAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, DcaError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| DcaError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| DcaError::Data {
                reason: format!("CSV header error: {}", e),
            })?
            .clone();
        let date_col = column_index(&headers, "date")?;
        let close_col = column_index(&headers, "close")?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| DcaError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            // Timestamps such as "2024-01-02 00:00:00" keep only the date part.
            let date_part = date_str.split_whitespace().next().unwrap_or_default();
            let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| {
                DcaError::Data {
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            if date < start_date || date >= end_date {
                continue;
            }

            let close_str = record.get(close_col).unwrap_or_default().trim();
            if close_str.is_empty() {
                warn!(%ticker, %date, "skipping bar with empty close");
                continue;
            }
            let close = Decimal::from_str(close_str)
                .or_else(|_| Decimal::from_scientific(close_str))
                .map_err(|e| DcaError::Data {
                    reason: format!("invalid close value '{}': {}", close_str, e),
                })?;

            bars.push(PriceBar { date, close });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, DcaError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| DcaError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DcaError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(ticker) = name_str.strip_suffix(".csv") {
                tickers.push(ticker.to_uppercase());
            }
        }

        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }
}
