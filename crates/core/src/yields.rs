//! Yield offer types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of yield-bearing position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferType {
    Lending,
    Staking,
    LiquidityPool,
}

impl OfferType {
    pub fn name(&self) -> &'static str {
        match self {
            OfferType::Lending => "Lending",
            OfferType::Staking => "Staking",
            OfferType::LiquidityPool => "Liquidity Pool",
        }
    }
}

impl fmt::Display for OfferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A yield-bearing position observed at a protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldOffer {
    pub protocol: String,
    pub asset: String,
    /// Annual percentage yield, never negative
    pub apy: Decimal,
    pub offer_type: OfferType,
}

impl YieldOffer {
    /// Missing APY becomes zero and negative APY is clamped to zero
    pub fn new(
        protocol: impl Into<String>,
        asset: impl Into<String>,
        apy: Option<Decimal>,
        offer_type: OfferType,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            asset: asset.into(),
            apy: apy.unwrap_or(Decimal::ZERO).max(Decimal::ZERO),
            offer_type,
        }
    }

    /// Offer quoted as a per-unit rate (`0.031` → 3.1% APY)
    pub fn from_rate(
        protocol: impl Into<String>,
        asset: impl Into<String>,
        rate: Option<Decimal>,
        offer_type: OfferType,
    ) -> Self {
        let apy = rate.and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED));
        Self::new(protocol, asset, apy, offer_type)
    }
}
