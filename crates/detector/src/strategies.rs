//! Cross-venue detection strategy: compare every pair of venues quoting the
//! same instrument

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use arb_core::{ArbitrageConfig, Opportunity, PairScan, Quote, QuoteBook};

/// Buy at one venue's ask, sell at another venue's bid
#[derive(Debug, Clone)]
pub struct CrossVenueStrategy {
    min_profit_pct: Decimal,
    pair_scan: PairScan,
}

impl CrossVenueStrategy {
    pub fn new(min_profit_pct: Decimal, pair_scan: PairScan) -> Self {
        Self {
            min_profit_pct,
            pair_scan,
        }
    }

    pub fn from_config(config: &ArbitrageConfig) -> Self {
        Self::new(config.min_profit_pct, config.pair_scan)
    }

    pub fn name(&self) -> &'static str {
        "cross_venue"
    }

    pub fn min_profit_pct(&self) -> Decimal {
        self.min_profit_pct
    }

    pub fn pair_scan(&self) -> PairScan {
        self.pair_scan
    }

    /// All opportunities in one instrument's book.
    ///
    /// Pairs `(i, j)` with `i < j` are visited in book order. The forward
    /// direction (buy at `i`, sell at `j`) is always checked; the reverse one
    /// only with [`PairScan::Bidirectional`], right after the forward one.
    /// A direction is skipped only when a price it uses is not positive.
    pub fn find_opportunities(&self, book: &QuoteBook, detected_at: DateTime<Utc>) -> Vec<Opportunity> {
        let quotes: Vec<&Quote> = book.iter().collect();

        let mut opportunities = Vec::new();
        if quotes.len() < 2 {
            return opportunities;
        }

        for i in 0..quotes.len() {
            for j in (i + 1)..quotes.len() {
                if let Some(opp) = Opportunity::evaluate(quotes[i], quotes[j], self.min_profit_pct, detected_at) {
                    opportunities.push(opp);
                }

                if self.pair_scan == PairScan::Bidirectional {
                    if let Some(opp) =
                        Opportunity::evaluate(quotes[j], quotes[i], self.min_profit_pct, detected_at)
                    {
                        opportunities.push(opp);
                    }
                }
            }
        }

        opportunities
    }
}

impl Default for CrossVenueStrategy {
    fn default() -> Self {
        Self::from_config(&ArbitrageConfig::default())
    }
}
