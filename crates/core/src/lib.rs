pub mod config;
pub mod config_loader;

pub use config::{AppConfig, KalshiConfig, LedgerConfig, OracleConfig, TradingConfig};
pub use config_loader::ConfigLoader;
