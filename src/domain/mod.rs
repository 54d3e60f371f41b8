//! Core domain types and logic.

pub mod analysis;
pub mod backtest;
pub mod config_validation;
pub mod date_range;
pub mod error;
pub mod filter;
pub mod indicator;
pub mod metrics;
pub mod portfolio;
pub mod position;
pub mod price;
pub mod rule;
pub mod rule_eval;
pub mod rule_parser;
pub mod signal;
pub mod strategy;
