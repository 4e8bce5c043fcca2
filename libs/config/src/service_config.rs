//! Service Configuration Module
//!
//! Loads relay service configuration from a base TOML file, an optional
//! per-environment overlay and `RELAY_`-prefixed environment variables, in
//! that order of precedence (later sources win).

use crate::service::{hydration, logging, paths};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use relay_amm::KnownPrice;
use relay_types::{Decimal, SymbolCode, TokenId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Main relay configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct RelayConfig {
    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default)]
    pub hydration: HydrationConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub feeds: FeedsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GlobalConfig {
    pub log_level: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Batching of pool hydration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HydrationConfig {
    pub chunk_size: usize,
    pub chunk_wait_ms: u64,
    pub max_concurrent: usize,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            chunk_size: hydration::CHUNK_SIZE,
            chunk_wait_ms: hydration::CHUNK_WAIT_MS,
            max_concurrent: hydration::MAX_CONCURRENT,
        }
    }
}

impl HydrationConfig {
    pub fn chunk_wait(&self) -> Duration {
        Duration::from_millis(self.chunk_wait_ms)
    }
}

/// Tokens whose pools are never routed through
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct RoutingConfig {
    /// Token ids in `contract-CODE` form
    #[serde(default)]
    pub blacklist: Vec<String>,
}

impl RoutingConfig {
    pub fn blacklisted_tokens(&self) -> Result<Vec<TokenId>> {
        self.blacklist
            .iter()
            .map(|raw| {
                raw.parse::<TokenId>()
                    .with_context(|| format!("Invalid blacklisted token id '{raw}'"))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct KnownPriceConfig {
    pub symbol: String,
    pub unit_price: Decimal,
}

/// USD prices known from outside the relay
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct FeedsConfig {
    #[serde(default)]
    pub known_prices: Vec<KnownPriceConfig>,
}

impl FeedsConfig {
    pub fn known_prices(&self) -> Result<Vec<KnownPrice>> {
        self.known_prices
            .iter()
            .map(|price| {
                let symbol: SymbolCode = price
                    .symbol
                    .parse()
                    .with_context(|| format!("Invalid known-price symbol '{}'", price.symbol))?;
                if price.unit_price <= Decimal::ZERO {
                    bail!("Known price for {symbol} must be positive, got {}", price.unit_price);
                }
                Ok(KnownPrice {
                    symbol,
                    unit_price: price.unit_price,
                })
            })
            .collect()
    }
}

impl RelayConfig {
    /// Load configuration from files with environment overrides
    ///
    /// The overlay for `environment` is read from `environments/<env>.toml`
    /// next to the base file.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(paths::DEFAULT_CONFIG_PATH));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
                .join(paths::ENVIRONMENTS_DIR)
                .join(format!("{env}.toml"));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // RELAY_HYDRATION__CHUNK_SIZE=8, RELAY_ROUTING__BLACKLIST=a-X,b-Y
        builder = builder.add_source(
            Environment::with_prefix(paths::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("routing.blacklist")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(?config, "Relay configuration loaded");
        Ok(config)
    }

    /// Reject values the hydrator or router cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.hydration.chunk_size == 0 {
            bail!("hydration.chunk_size must be at least 1");
        }
        if self.hydration.max_concurrent == 0 {
            bail!("hydration.max_concurrent must be at least 1");
        }
        self.routing.blacklisted_tokens()?;
        self.feeds.known_prices()?;
        Ok(())
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Convenience function to load configuration with defaults
///
/// Falls back to built-in defaults when the default base file does not exist.
pub fn load_config(environment: Option<&str>) -> Result<RelayConfig> {
    let base = PathBuf::from(paths::DEFAULT_CONFIG_PATH);
    if !base.exists() {
        warn!("No configuration at {:?}, using defaults", base);
        return Ok(RelayConfig::default());
    }
    RelayConfig::load(Some(base.as_path()), environment)
}
