//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_dataset_adapter;
pub mod file_config_adapter;
pub mod instrument_file;
pub mod candle_response;
