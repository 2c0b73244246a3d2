//! Arbitrage opportunity types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Instrument, Quote};

/// Detected buy-here / sell-there crossing for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub instrument: Instrument,
    pub buy_source: String,
    pub sell_source: String,
    /// Ask at the buy source
    pub buy_price: Decimal,
    /// Bid at the sell source
    pub sell_price: Decimal,
    pub profit_pct: Decimal,
    pub detected_at: DateTime<Utc>,
}

impl Opportunity {
    /// Build the opportunity of buying at `buy`'s ask and selling at `sell`'s
    /// bid if it clears `threshold_pct` strictly.
    ///
    /// Returns `None` when either price is non-positive or the spread is at or
    /// below the threshold.
    pub fn evaluate(
        buy: &Quote,
        sell: &Quote,
        threshold_pct: Decimal,
        detected_at: DateTime<Utc>,
    ) -> Option<Self> {
        let buy_price = buy.ask;
        let sell_price = sell.bid;

        if buy_price <= Decimal::ZERO || sell_price <= Decimal::ZERO {
            return None;
        }

        let profit_pct = profit_pct(buy_price, sell_price)?;
        if profit_pct <= threshold_pct {
            return None;
        }

        Some(Self {
            instrument: buy.instrument.clone(),
            buy_source: buy.source_id.clone(),
            sell_source: sell.source_id.clone(),
            buy_price,
            sell_price,
            profit_pct,
            detected_at,
        })
    }

    pub fn price_diff(&self) -> Decimal {
        self.sell_price - self.buy_price
    }
}

/// `(sell - buy) / buy * 100`, `None` on a zero buy price or overflow
pub fn profit_pct(buy_price: Decimal, sell_price: Decimal) -> Option<Decimal> {
    (sell_price - buy_price)
        .checked_div(buy_price)?
        .checked_mul(Decimal::ONE_HUNDRED)
}
