use relay_amm::AmmError;
use relay_types::{QuantityError, TokenId};
use thiserror::Error;

pub type HydrationResult<T> = Result<T, HydrationError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HydrationError {
    /// Transport or backend failure reading the ledger
    #[error("Ledger source failed: {0}")]
    Source(String),

    #[error("No settings row for legacy pool {0}")]
    MissingSettings(String),

    /// No balance row, distinct from a zero balance
    #[error("No {token} balance held by {holder}")]
    MissingBalance { holder: String, token: TokenId },

    #[error("Pool row {row} is malformed: {reason}")]
    InvalidRow { row: String, reason: String },

    #[error("Malformed ledger snapshot: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Pool(#[from] AmmError),
}
