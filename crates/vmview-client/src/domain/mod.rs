//! Domain layer for vmview-client.

pub mod config;

pub use config::ClientConfig;
