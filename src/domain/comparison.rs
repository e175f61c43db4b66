//! Multi-cadence comparison on a shared calendar.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::info;

use super::cadence::{resolve, Cadence};
use super::error::DcaError;
use super::fees::FeeParameters;
use super::price::{validate_series, PriceBar};
use super::simulation::{run_simulation, DcaConfig, PerformanceRecord};

/// Which bars of each run contribute a cell to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Every bar of every run.
    #[default]
    AllBars,
    /// Only bars where shares were bought.
    TradeBars,
}

impl Projection {
    fn keeps(self, record: &PerformanceRecord) -> bool {
        match self {
            Projection::AllBars => true,
            Projection::TradeBars => record.is_trade(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub date: NaiveDate,
    /// One cell per column, in [`ComparisonTable::cadences`] order.
    pub values: Vec<Option<Decimal>>,
}

/// Performance per cadence, outer-joined by date and sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    pub cadences: Vec<Cadence>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn column_index(&self, cadence: Cadence) -> Option<usize> {
        self.cadences.iter().position(|&c| c == cadence)
    }

    pub fn get(&self, date: NaiveDate, cadence: Cadence) -> Option<Decimal> {
        let col = self.column_index(cadence)?;
        let row = self
            .rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])?;
        row.values[col]
    }

    /// `(date, value)` pairs for the cells `cadence` has.
    pub fn column(&self, cadence: Cadence) -> Vec<(NaiveDate, Decimal)> {
        let Some(col) = self.column_index(cadence) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|r| r.values[col].map(|v| (r.date, v)))
            .collect()
    }

    /// Subtract the `reference` column from every column, row by row. A row
    /// where either side is unset stays unset.
    pub fn relative_to(&self, reference: Cadence) -> Option<ComparisonTable> {
        let ref_col = self.column_index(reference)?;
        let rows = self
            .rows
            .iter()
            .map(|row| ComparisonRow {
                date: row.date,
                values: row
                    .values
                    .iter()
                    .map(|v| match (v, row.values[ref_col]) {
                        (Some(v), Some(r)) => Some(*v - r),
                        _ => None,
                    })
                    .collect(),
            })
            .collect();
        Some(ComparisonTable {
            cadences: self.cadences.clone(),
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Run each cadence over `prices` and join their performance by date.
pub fn compare<S: AsRef<str>>(
    cadence_names: &[S],
    prices: &[PriceBar],
    contribution_amount: Decimal,
    fees: &FeeParameters,
) -> Result<ComparisonTable, DcaError> {
    compare_with(
        cadence_names,
        prices,
        contribution_amount,
        fees,
        Projection::AllBars,
    )
}

pub fn compare_with<S: AsRef<str>>(
    cadence_names: &[S],
    prices: &[PriceBar],
    contribution_amount: Decimal,
    fees: &FeeParameters,
    projection: Projection,
) -> Result<ComparisonTable, DcaError> {
    let cadences: BTreeSet<Cadence> = cadence_names
        .iter()
        .map(|name| resolve(name.as_ref()))
        .collect::<Result<_, _>>()?;
    if cadences.is_empty() {
        return Err(DcaError::EmptyCadenceSet);
    }
    validate_series(prices)?;

    let cadences: Vec<Cadence> = cadences.into_iter().collect();
    info!(
        cadences = ?cadences,
        bars = prices.len(),
        "comparing cadences"
    );

    let runs: Vec<Vec<PerformanceRecord>> = cadences
        .par_iter()
        .map(|&cadence| {
            let config = DcaConfig {
                cadence,
                contribution_amount,
                fees: *fees,
            };
            run_simulation(prices, &config)
        })
        .collect::<Result<_, _>>()?;

    let width = cadences.len();
    let mut merged: BTreeMap<NaiveDate, Vec<Option<Decimal>>> = BTreeMap::new();
    for (col, records) in runs.iter().enumerate() {
        for record in records.iter().filter(|r| projection.keeps(r)) {
            merged
                .entry(record.date)
                .or_insert_with(|| vec![None; width])[col] = Some(record.performance);
        }
    }

    let rows = merged
        .into_iter()
        .map(|(date, values)| ComparisonRow { date, values })
        .collect();
    Ok(ComparisonTable { cadences, rows })
}
