//! Core types and utilities for the arbitrage agent
//!
//! This crate provides shared types used across all components:
//! - Instrument and quote definitions
//! - Arbitrage opportunity and yield offer types
//! - Agent configuration and validation
//! - Error taxonomy

pub mod types;
pub mod quotes;
pub mod opportunities;
pub mod yields;
pub mod config;
pub mod errors;

pub use types::*;
pub use quotes::*;
pub use opportunities::*;
pub use yields::*;
pub use self::config::*;
pub use errors::*;
