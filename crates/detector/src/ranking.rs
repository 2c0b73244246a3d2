//! Yield ranking across protocols

use arb_core::YieldOffer;

/// Keeps the `top_k` highest-APY offers
#[derive(Debug, Clone, Copy)]
pub struct YieldRanker {
    top_k: usize,
}

impl YieldRanker {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Stable sort by APY descending, then truncate. Equal APYs keep their
    /// input order.
    pub fn rank(&self, mut offers: Vec<YieldOffer>) -> Vec<YieldOffer> {
        offers.sort_by(|a, b| b.apy.cmp(&a.apy));
        offers.truncate(self.top_k);
        offers
    }
}

impl Default for YieldRanker {
    fn default() -> Self {
        Self::new(10)
    }
}
