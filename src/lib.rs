//! Trade ledger service: position lifecycle, weighted-price accounting,
//! and trade statistics for manually-reported positions.

pub mod api;
pub mod dates;
pub mod error;
pub mod market;
pub mod persistence;
pub mod pricing;
pub mod stats;
pub mod sweep;
pub mod types;
