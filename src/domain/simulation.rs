//! Dollar-cost averaging simulation engine.
//!
//! A run folds a [`SimulationState`] over the price bars, emitting one
//! [`PerformanceRecord`] per bar. Cash arrives every [`CONTRIBUTION_STEP`] bars;
//! it is deployed every `cadence.step()` bars in slices sized so that each
//! contribution period invests exactly one contribution.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::cadence::{resolve, Cadence, CONTRIBUTION_STEP};
use super::error::DcaError;
use super::fees::{compute_fee, FeeParameters};
use super::price::{validate_series, PriceBar};

/// Parameters for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcaConfig {
    pub cadence: Cadence,
    pub contribution_amount: Decimal,
    pub fees: FeeParameters,
}

impl DcaConfig {
    /// Gross amount deployed per investment event.
    ///
    /// Equal to `contribution / (CONTRIBUTION_STEP / step)`, ordered so the
    /// division is exact for cadences slower than the contribution step.
    /// `None` when the contribution is too large to scale by the step.
    pub fn investing_amount(&self) -> Option<Decimal> {
        self.contribution_amount
            .checked_mul(Decimal::from(self.cadence.step()))
            .map(|scaled| scaled / Decimal::from(CONTRIBUTION_STEP))
    }
}

fn overflow(date: NaiveDate) -> DcaError {
    DcaError::AmountOverflow { date }
}

/// Snapshot of the portfolio after processing one bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRecord {
    pub date: NaiveDate,
    /// Close paid on a trade bar, zero otherwise.
    pub price_bought_at: Decimal,
    pub investing_amount: Decimal,
    pub shares_bought: Decimal,
    pub fees_paid: Decimal,
    pub total_contributed: Decimal,
    pub cash_balance: Decimal,
    pub invested_amount_cumulative: Decimal,
    pub position_value: Decimal,
    pub portfolio_value: Decimal,
    pub portfolio_to_cash_ratio: Decimal,
    pub performance: Decimal,
}

impl PerformanceRecord {
    pub fn is_trade(&self) -> bool {
        !self.shares_bought.is_zero()
    }
}

/// Running totals owned by a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimulationState {
    pub cash_balance: Decimal,
    pub total_contributed: Decimal,
    pub shares_held: Decimal,
    pub invested_amount: Decimal,
}

#[derive(Debug, Clone, Copy, Default)]
struct Fill {
    price: Decimal,
    gross: Decimal,
    shares: Decimal,
    fee: Decimal,
}

impl SimulationState {
    /// Apply the transitions for bar `index` and snapshot the result.
    pub fn advance(
        &mut self,
        index: usize,
        bar: &PriceBar,
        config: &DcaConfig,
    ) -> Result<PerformanceRecord, DcaError> {
        if index != 0 && index % CONTRIBUTION_STEP == 0 {
            self.cash_balance = self
                .cash_balance
                .checked_add(config.contribution_amount)
                .ok_or_else(|| overflow(bar.date))?;
            self.total_contributed = self
                .total_contributed
                .checked_add(config.contribution_amount)
                .ok_or_else(|| overflow(bar.date))?;
        }

        let fill = if index % config.cadence.step() == 0 && !self.cash_balance.is_zero() {
            self.invest(bar, config)?
        } else {
            Fill::default()
        };

        self.snapshot(bar, &fill)
    }

    fn invest(&mut self, bar: &PriceBar, config: &DcaConfig) -> Result<Fill, DcaError> {
        let gross = config.investing_amount().ok_or_else(|| overflow(bar.date))?;
        let rough_shares = gross / bar.close;
        // The fee comes out of the slice; a fee larger than the slice takes
        // all of it and buys nothing.
        let fee = compute_fee(rough_shares, gross, &config.fees).min(gross);

        self.cash_balance -= gross;
        let net = gross - fee;
        let shares = net / bar.close;
        self.shares_held = self
            .shares_held
            .checked_add(shares)
            .ok_or_else(|| overflow(bar.date))?;
        self.invested_amount = self
            .invested_amount
            .checked_add(net)
            .ok_or_else(|| overflow(bar.date))?;

        debug!(
            date = %bar.date,
            price = %bar.close,
            gross = %gross,
            fee = %fee,
            shares = %shares,
            "investment executed"
        );

        Ok(Fill {
            price: bar.close,
            gross,
            shares,
            fee,
        })
    }

    fn snapshot(&self, bar: &PriceBar, fill: &Fill) -> Result<PerformanceRecord, DcaError> {
        let position_value = self
            .shares_held
            .checked_mul(bar.close)
            .ok_or_else(|| overflow(bar.date))?;
        let portfolio_value = self
            .cash_balance
            .checked_add(position_value)
            .ok_or_else(|| overflow(bar.date))?;
        let ratio = if self.total_contributed.is_zero() {
            Decimal::ONE
        } else {
            portfolio_value / self.total_contributed
        };

        Ok(PerformanceRecord {
            date: bar.date,
            price_bought_at: fill.price,
            investing_amount: fill.gross,
            shares_bought: fill.shares,
            fees_paid: fill.fee,
            total_contributed: self.total_contributed,
            cash_balance: self.cash_balance,
            invested_amount_cumulative: self.invested_amount,
            position_value,
            portfolio_value,
            portfolio_to_cash_ratio: ratio,
            performance: ratio - Decimal::ONE,
        })
    }
}

/// Run one simulation over `prices` with a fresh state.
pub fn run_simulation(
    prices: &[PriceBar],
    config: &DcaConfig,
) -> Result<Vec<PerformanceRecord>, DcaError> {
    validate_series(prices)?;

    let mut state = SimulationState::default();
    prices
        .iter()
        .enumerate()
        .map(|(i, bar)| state.advance(i, bar, config))
        .collect()
}

/// Resolve `cadence_name` and run a simulation.
pub fn simulate(
    prices: &[PriceBar],
    cadence_name: &str,
    contribution_amount: Decimal,
    fees: &FeeParameters,
) -> Result<Vec<PerformanceRecord>, DcaError> {
    let config = DcaConfig {
        cadence: resolve(cadence_name)?,
        contribution_amount,
        fees: *fees,
    };
    run_simulation(prices, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flat_prices(count: usize, close: Decimal) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..count)
            .map(|i| PriceBar::new(start + chrono::Duration::days(i as i64), close))
            .collect()
    }

    fn config(cadence: Cadence) -> DcaConfig {
        DcaConfig {
            cadence,
            contribution_amount: dec!(100),
            fees: FeeParameters::default(),
        }
    }

    #[test]
    fn investing_amount_slices_contribution() {
        assert_eq!(config(Cadence::Weekly).investing_amount(), Some(dec!(25)));
        assert_eq!(config(Cadence::Monthly).investing_amount(), Some(dec!(100)));
        assert_eq!(config(Cadence::Quarterly).investing_amount(), Some(dec!(300)));
        assert_eq!(config(Cadence::Biannually).investing_amount(), Some(dec!(600)));
    }

    #[test]
    fn first_bar_has_no_activity() {
        let records = run_simulation(&flat_prices(5, dec!(10)), &config(Cadence::Weekly)).unwrap();
        let first = &records[0];
        assert_eq!(first.total_contributed, Decimal::ZERO);
        assert_eq!(first.shares_bought, Decimal::ZERO);
        assert_eq!(first.price_bought_at, Decimal::ZERO);
        assert_eq!(first.portfolio_to_cash_ratio, Decimal::ONE);
        assert_eq!(first.performance, Decimal::ZERO);
    }

    #[test]
    fn monthly_scenario_invests_contribution_on_bar_twenty() {
        let records = run_simulation(&flat_prices(21, dec!(10)), &config(Cadence::Monthly)).unwrap();
        assert_eq!(records.len(), 21);
        assert!(records[..20].iter().all(|r| !r.is_trade()));

        let last = &records[20];
        assert_eq!(last.total_contributed, dec!(100));
        assert_eq!(last.price_bought_at, dec!(10));
        assert_eq!(last.shares_bought, dec!(10));
        assert_eq!(last.fees_paid, Decimal::ZERO);
        assert_eq!(last.cash_balance, Decimal::ZERO);
        assert_eq!(last.portfolio_value, dec!(100));
        assert_eq!(last.performance, Decimal::ZERO);
    }

    #[test]
    fn weekly_spreads_contribution_over_four_bars() {
        let records = run_simulation(&flat_prices(40, dec!(5)), &config(Cadence::Weekly)).unwrap();
        let trades: Vec<_> = records.iter().filter(|r| r.is_trade()).collect();
        assert_eq!(trades.len(), 4);
        assert_eq!(
            trades.iter().map(|r| r.date).collect::<Vec<_>>(),
            [20, 25, 30, 35].map(|i| records[i].date).to_vec()
        );
        assert!(trades.iter().all(|r| r.investing_amount == dec!(25)));
        assert_eq!(records[39].cash_balance, Decimal::ZERO);
        assert_eq!(records[39].invested_amount_cumulative, dec!(100));
    }

    #[test]
    fn quarterly_waits_for_three_contributions() {
        let records =
            run_simulation(&flat_prices(61, dec!(10)), &config(Cadence::Quarterly)).unwrap();
        assert_eq!(records[40].cash_balance, dec!(200));
        assert!(!records[40].is_trade());

        let bar = &records[60];
        assert_eq!(bar.total_contributed, dec!(300));
        assert_eq!(bar.investing_amount, dec!(300));
        assert_eq!(bar.shares_bought, dec!(30));
        assert_eq!(bar.cash_balance, Decimal::ZERO);
    }

    #[test]
    fn uninvested_cash_counts_toward_portfolio() {
        let records =
            run_simulation(&flat_prices(41, dec!(10)), &config(Cadence::Biannually)).unwrap();
        let bar = &records[40];
        assert_eq!(bar.cash_balance, dec!(200));
        assert_eq!(bar.position_value, Decimal::ZERO);
        assert_eq!(bar.portfolio_value, dec!(200));
        assert_eq!(bar.performance, Decimal::ZERO);
    }

    #[test]
    fn fees_reduce_shares_not_cash_outflow() {
        let mut cfg = config(Cadence::Monthly);
        cfg.fees = FeeParameters {
            commission_min_per_order: dec!(1),
            commission_max_pct: dec!(100),
            ..FeeParameters::default()
        };
        let records = run_simulation(&flat_prices(21, dec!(10)), &cfg).unwrap();
        let bar = &records[20];
        assert_eq!(bar.fees_paid, dec!(1));
        assert_eq!(bar.cash_balance, Decimal::ZERO);
        assert_eq!(bar.shares_bought, dec!(9.9));
        assert_eq!(bar.invested_amount_cumulative, dec!(99));
        assert_eq!(bar.portfolio_value, dec!(99));
        assert_eq!(bar.performance, dec!(-0.01));
    }

    #[test]
    fn fee_larger_than_slice_buys_nothing() {
        let mut cfg = config(Cadence::Weekly);
        cfg.contribution_amount = dec!(4);
        cfg.fees = FeeParameters {
            commission_min_per_order: dec!(5),
            ..FeeParameters::default()
        };
        let records = run_simulation(&flat_prices(21, dec!(10)), &cfg).unwrap();
        let bar = &records[20];
        assert_eq!(bar.price_bought_at, dec!(10));
        assert_eq!(bar.investing_amount, dec!(1));
        assert_eq!(bar.fees_paid, dec!(1));
        assert_eq!(bar.shares_bought, Decimal::ZERO);
        assert_eq!(bar.cash_balance, dec!(3));
    }

    #[test]
    fn fee_plus_net_equals_slice_on_every_trade() {
        let mut cfg = config(Cadence::Weekly);
        cfg.contribution_amount = dec!(4);
        cfg.fees = FeeParameters {
            commission_min_per_order: dec!(5),
            ..FeeParameters::default()
        };
        let records = run_simulation(&flat_prices(41, dec!(10)), &cfg).unwrap();
        let last = records.last().unwrap();
        let fees: Decimal = records.iter().map(|r| r.fees_paid).sum();

        assert_eq!(last.total_contributed, dec!(8));
        assert_eq!(last.portfolio_value, dec!(3));
        assert_eq!(fees, dec!(5));
        for r in records.iter().filter(|r| !r.investing_amount.is_zero()) {
            assert!(r.fees_paid <= r.investing_amount);
        }
    }

    #[test]
    fn huge_contribution_is_an_overflow_error() {
        let mut cfg = config(Cadence::Biannually);
        cfg.contribution_amount = Decimal::MAX;
        let err = run_simulation(&flat_prices(121, dec!(10)), &cfg).unwrap_err();
        assert!(matches!(err, DcaError::AmountOverflow { .. }));
    }

    #[test]
    fn contribution_accumulation_overflow_is_an_error() {
        let mut cfg = config(Cadence::Biannually);
        cfg.contribution_amount = Decimal::MAX / dec!(2);
        let err = run_simulation(&flat_prices(61, dec!(10)), &cfg).unwrap_err();
        assert!(matches!(err, DcaError::AmountOverflow { .. }));
    }

    #[test]
    fn position_tracks_price_moves() {
        let mut prices = flat_prices(22, dec!(10));
        prices[21].close = dec!(12);
        let records = run_simulation(&prices, &config(Cadence::Monthly)).unwrap();
        let bar = &records[21];
        assert_eq!(bar.position_value, dec!(120));
        assert_eq!(bar.portfolio_to_cash_ratio, dec!(1.2));
        assert_eq!(bar.performance, dec!(0.2));
        assert!(!bar.is_trade());
    }

    #[test]
    fn zero_contribution_never_trades() {
        let mut cfg = config(Cadence::Weekly);
        cfg.contribution_amount = Decimal::ZERO;
        let records = run_simulation(&flat_prices(45, dec!(10)), &cfg).unwrap();
        assert!(records.iter().all(|r| !r.is_trade()));
        assert!(records.iter().all(|r| r.performance.is_zero()));
    }

    #[test]
    fn simulate_rejects_unknown_cadence() {
        let err = simulate(
            &flat_prices(5, dec!(10)),
            "daily",
            dec!(100),
            &FeeParameters::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DcaError::InvalidCadence { .. }));
    }

    #[test]
    fn simulate_rejects_empty_prices() {
        let err = simulate(&[], "weekly", dec!(100), &FeeParameters::default()).unwrap_err();
        assert!(matches!(err, DcaError::EmptyPriceSeries));
    }

    #[test]
    fn simulate_matches_run_simulation() {
        let prices = flat_prices(30, dec!(7));
        let via_name = simulate(&prices, "Weekly", dec!(100), &FeeParameters::default()).unwrap();
        let direct = run_simulation(&prices, &config(Cadence::Weekly)).unwrap();
        assert_eq!(via_name, direct);
    }
}
