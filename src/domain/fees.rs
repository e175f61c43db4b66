//! Brokerage fee model.
//!
//! Each order pays a commission and a platform fee. Both are charged per share,
//! bounded below by a per-order minimum and above by a percentage of trade value.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fee schedule for one run. `*_max_pct` values are percentages (`0.5` = 0.5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeParameters {
    pub commission_per_share: Decimal,
    pub commission_min_per_order: Decimal,
    pub commission_max_pct: Decimal,
    pub platform_fee_per_share: Decimal,
    pub platform_fee_min_per_order: Decimal,
    pub platform_fee_max_pct: Decimal,
}

impl FeeParameters {
    /// Smallest fee any order pays.
    pub fn floor(&self) -> Decimal {
        self.commission_min_per_order + self.platform_fee_min_per_order
    }

    pub fn per_share(&self) -> Decimal {
        self.commission_per_share + self.platform_fee_per_share
    }

    pub fn max_pct(&self) -> Decimal {
        self.commission_max_pct + self.platform_fee_max_pct
    }

    /// Ticket fee quoted for a single-share order, ignoring the cap.
    pub fn minimum_trade_fee(&self) -> Decimal {
        self.floor() + self.per_share()
    }

    /// Profit a round trip must clear to cover two minimum tickets.
    pub fn breakeven_profit(&self) -> Decimal {
        self.minimum_trade_fee() * dec!(2)
    }
}

/// `max(floor, min(shares * per_share, trade_value * max_pct / 100))`
///
/// A zero `trade_value` zeroes the cap and yields the floor, so callers must
/// only price orders that actually execute.
pub fn compute_fee(shares: Decimal, trade_value: Decimal, params: &FeeParameters) -> Decimal {
    let linear_fee = shares * params.per_share();
    let cap = trade_value * params.max_pct() / dec!(100);
    params.floor().max(linear_fee.min(cap))
}
