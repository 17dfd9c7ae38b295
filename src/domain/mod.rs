//! Core domain types and logic.

pub mod ohlcv;
pub mod bar_series;
pub mod bar_store;
pub mod indicator;
pub mod forecast;
pub mod calibration;
pub mod signal;
pub mod analysis;
pub mod replay;
pub mod config_validation;
pub mod error;
