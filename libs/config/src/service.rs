//! Service configuration and defaults
//!
//! Default values shared by the config loader, the hydrator and the quote
//! binary.

/// Configuration file locations
pub mod paths {
    /// Base configuration file
    pub const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";

    /// Directory next to the base file holding `<env>.toml` overlays
    pub const ENVIRONMENTS_DIR: &str = "environments";

    /// Prefix for environment variable overrides (`RELAY_HYDRATION__CHUNK_SIZE`)
    pub const ENV_PREFIX: &str = "RELAY";
}

/// Logging defaults
pub mod logging {
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

/// Hydrator defaults
pub mod hydration {
    /// Legacy pools fetched per chunk
    pub const CHUNK_SIZE: usize = 4;

    /// Pause between legacy chunks (milliseconds)
    pub const CHUNK_WAIT_MS: u64 = 250;

    /// Upper bound on in-flight fetches for bulk (modern) listings
    pub const MAX_CONCURRENT: usize = 16;
}
