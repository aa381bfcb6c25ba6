//! equitrace: portfolio performance and risk analytics.
//!
//! Hexagonal architecture: the analytics pipeline lives in [`domain`], port
//! traits in [`ports`], concrete data/report implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
