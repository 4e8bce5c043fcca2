//! Ledger row decoding for the multi-token relay
//!
//! The relay contract exposes a single `settings` row and one `tokens` row per
//! registered symbol. Rows arrive as JSON in the ledger's own shapes (symbols
//! as `"4,TLOS"`, balances as `"200000.0000 TLOS"`) and are decoded here into
//! the typed [`Settings`] and [`TokenEntry`] snapshots pricing works on.

use relay_amm::{TokenEntry, TokenRegistry};
use relay_types::settings::FEE_DENOMINATOR;
use relay_types::{Decimal, Quantity, QuantityError, Settings, Symbol, TokenType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SettingsError {
    /// No row was returned; the relay is not initialised
    #[error("{0} row unavailable")]
    Missing(&'static str),

    #[error("malformed {table} rows: {source}")]
    Malformed {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error("{field} of {symbol} is denominated in {found}")]
    AssetMismatch {
        symbol: String,
        field: &'static str,
        found: String,
    },

    #[error("fee {0} must be below {max}", max = FEE_DENOMINATOR)]
    InvalidFee(u64),

    #[error("amplifier {0} must be positive")]
    InvalidAmplifier(Decimal),

    #[error(transparent)]
    Registry(#[from] relay_amm::AmmError),
}

/// `get_table_rows` response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct TableRows<T> {
    pub rows: Vec<T>,
    #[serde(default)]
    pub more: bool,
}

impl<T: DeserializeOwned> TableRows<T> {
    pub fn from_json(table: &'static str, json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|source| SettingsError::Malformed { table, source })
    }
}

/// Raw `settings` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsRow {
    pub fee: u64,
    pub amplifier: Decimal,
    pub proxy_contract: String,
    pub proxy_token: String,
    pub maker_token: String,
}

impl SettingsRow {
    pub fn decode(&self) -> Result<Settings, SettingsError> {
        let fee = u32::try_from(self.fee)
            .ok()
            .filter(|fee| *fee < FEE_DENOMINATOR)
            .ok_or(SettingsError::InvalidFee(self.fee))?;
        if self.amplifier <= Decimal::ZERO {
            return Err(SettingsError::InvalidAmplifier(self.amplifier));
        }
        Ok(Settings {
            fee,
            amplifier: self.amplifier,
            proxy_contract: self.proxy_contract.clone(),
            proxy_token: Symbol::parse(&self.proxy_token)?,
            maker_token: Symbol::parse(&self.maker_token)?,
        })
    }
}

/// Decode the first row of a `settings` table response
pub fn decode_settings(rows: &TableRows<SettingsRow>) -> Result<Settings, SettingsError> {
    let row = rows.rows.first().ok_or(SettingsError::Missing("settings"))?;
    let settings = row.decode()?;
    debug!(fee = settings.fee, amplifier = %settings.amplifier, "Decoded relay settings");
    Ok(settings)
}

/// Raw `tokens` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRow {
    pub sym: String,
    pub contract: String,
    pub balance: String,
    pub depth: String,
    pub reserve: String,
    pub maker_pool: String,
    pub token_type: String,
}

impl TokenRow {
    pub fn decode(&self) -> Result<TokenEntry, SettingsError> {
        let symbol = Symbol::parse(&self.sym)?;
        let amount = |field: &'static str, asset: &str| -> Result<Decimal, SettingsError> {
            let quantity = Quantity::parse_asset(asset, &self.contract)?;
            if quantity.token().code != symbol.code {
                return Err(SettingsError::AssetMismatch {
                    symbol: symbol.to_string(),
                    field,
                    found: quantity.token().code.to_string(),
                });
            }
            Ok(quantity.amount())
        };
        Ok(TokenEntry {
            balance: amount("balance", &self.balance)?,
            depth: amount("depth", &self.depth)?,
            reserve: amount("reserve", &self.reserve)?,
            maker_pool: amount("maker_pool", &self.maker_pool)?,
            token_type: self.token_type.parse::<TokenType>()?,
            contract: self.contract.clone(),
            symbol,
        })
    }
}

/// Decode and validate a full `tokens` table response
pub fn decode_tokens(rows: &TableRows<TokenRow>) -> Result<TokenRegistry, SettingsError> {
    let entries = rows
        .rows
        .iter()
        .map(TokenRow::decode)
        .collect::<Result<Vec<_>, _>>()?;
    debug!(tokens = entries.len(), "Decoded relay tokens");
    Ok(TokenRegistry::new(entries)?)
}
