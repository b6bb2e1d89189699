//! Port traits implemented by [`crate::adapters`].

pub mod config_port;
pub mod price_port;
pub mod dataset_port;
