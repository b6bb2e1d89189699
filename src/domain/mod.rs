//! Core domain types and logic.

pub mod candle;
pub mod instrument;
pub mod indicator;
pub mod signal;
pub mod trade;
pub mod result;
pub mod sweep;
pub mod config_validation;
pub mod error;
