//! Concrete adapter implementations for ports.

pub mod cached_data_port;
pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
