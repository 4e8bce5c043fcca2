//! # Relay Configuration
//!
//! Configuration management and ledger row decoding for relay services.
//!
//! ## Features
//!
//! - **Service Configuration**: layered TOML + environment loading ([`RelayConfig`])
//! - **Ledger Rows**: `settings` and `tokens` table rows decoded into typed snapshots
//! - **Defaults**: hydration batching, log level, file locations
//!
//! ## Usage
//!
//! ```rust,no_run
//! use relay_config::{load_config, RelayConfig};
//!
//! let config: RelayConfig = load_config(Some("staging")).unwrap();
//! let blacklist = config.routing.blacklisted_tokens().unwrap();
//! println!("{} chunked, {} blacklisted", config.hydration.chunk_size, blacklist.len());
//! ```

pub mod service;
pub mod service_config;
pub mod settings;

// Re-export commonly used types
pub use service_config::{
    load_config, FeedsConfig, GlobalConfig, HydrationConfig, KnownPriceConfig, RelayConfig,
    RoutingConfig,
};
pub use settings::{
    decode_settings, decode_tokens, SettingsError, SettingsRow, TableRows, TokenRow,
};
