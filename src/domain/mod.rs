//! Core domain types and analytics stages.

pub mod price;
pub mod returns;
pub mod weights;
pub mod portfolio;
pub mod rolling;
pub mod drawdown;
pub mod risk;
pub mod anomaly;
pub mod metrics;
pub mod pipeline;
pub mod config_validation;
pub mod error;
