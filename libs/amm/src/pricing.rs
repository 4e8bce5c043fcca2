//! # Pricing Layer
//!
//! ## Purpose
//!
//! Spot price, quoted price, fee and slippage computation for the multi-token
//! relay. Every operation is a pure function of a [`TokenRegistry`] snapshot and
//! a [`Settings`] snapshot held by a [`PricingContext`].
//!
//! ## Orientation
//!
//! `get_spot_price(base, quote)` is `base_upper / quote_upper`: the amount of
//! `base` paid per unit of `quote`. When `quote` is the maker (liquidity) token
//! the price comes from the proxy pool's balance sheet instead:
//!
//! ```text
//! maker_price  = spot(base, proxy) * pool_balance / maker_balance
//! pool_balance = Σ_connectors maker_pool(t) * spot(proxy, t)
//! ```
//!
//! ## Fees
//!
//! Forward fees are `amount * fee / 10000`, truncated at the token precision.
//! Inverse fees gross a net amount up by `(10000 - fee) / 10000` and round to
//! the nearest minimal unit, which keeps the forward/inverse pair within one
//! minimal unit of each other at every precision boundary.

use crate::bonding::BondingCurve;
use crate::error::{checked_div, checked_mul, AmmError, AmmResult};
use crate::registry::{TokenEntry, TokenRegistry};
use crate::reserve::ReserveModel;
use relay_types::settings::FEE_DENOMINATOR;
use relay_types::{Decimal, Quantity, RoundingStrategy, Settings, SymbolCode};
use tracing::debug;

/// Forward fee on `amount` for a fee in parts per ten thousand, truncated
pub fn forward_fee(amount: &Quantity, fee: Decimal) -> AmmResult<Quantity> {
    let fraction = checked_div(fee, Decimal::from(FEE_DENOMINATOR), "fee fraction")?;
    Ok(amount.times(fraction)?)
}

/// Exact gross-up of `net`: the unrounded fee that makes `net` the post-fee amount
pub fn exact_inverse_fee(net: Decimal, fee: Decimal) -> AmmResult<Decimal> {
    let denominator = Decimal::from(FEE_DENOMINATOR);
    let kept = checked_div(denominator - fee, denominator, "inverse fee fraction")?;
    if kept <= Decimal::ZERO {
        return Err(AmmError::InvalidSettings(format!(
            "fee {fee} leaves nothing after conversion"
        )));
    }
    let gross = checked_div(net, kept, "inverse fee gross")?;
    Ok(gross - net)
}

/// Read-only pricing view over one token registry and one settings snapshot
#[derive(Debug, Clone, Copy)]
pub struct PricingContext<'a> {
    tokens: &'a TokenRegistry,
    settings: &'a Settings,
}

impl<'a> PricingContext<'a> {
    /// Validate the snapshot pair: usable fee and amplifier, a registered connector
    /// proxy and a registered liquidity maker token
    pub fn new(tokens: &'a TokenRegistry, settings: &'a Settings) -> AmmResult<Self> {
        if !settings.has_valid_fee() {
            return Err(AmmError::InvalidSettings(format!(
                "fee {} must be below {FEE_DENOMINATOR}",
                settings.fee
            )));
        }
        if settings.amplifier <= Decimal::ZERO {
            return Err(AmmError::InvalidSettings(format!(
                "amplifier {} must be positive",
                settings.amplifier
            )));
        }

        let proxy = tokens.lookup(settings.proxy_code()).ok_or_else(|| {
            AmmError::InvalidSettings(format!("proxy token {} is not registered", settings.proxy_code()))
        })?;
        if !proxy.is_connector() {
            return Err(AmmError::InvalidSettings(format!(
                "proxy token {} must be a connector",
                proxy.code()
            )));
        }
        if proxy.contract != settings.proxy_contract {
            return Err(AmmError::InvalidSettings(format!(
                "proxy token {} is issued by {}, settings name {}",
                proxy.code(),
                proxy.contract,
                settings.proxy_contract
            )));
        }

        let maker = tokens.lookup(settings.maker_code()).ok_or_else(|| {
            AmmError::InvalidSettings(format!("maker token {} is not registered", settings.maker_code()))
        })?;
        if !maker.is_liquidity() {
            return Err(AmmError::InvalidSettings(format!(
                "maker token {} must be a liquidity token",
                maker.code()
            )));
        }

        Ok(Self { tokens, settings })
    }

    pub fn tokens(&self) -> &'a TokenRegistry {
        self.tokens
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    /// Reject non-positive quantities and quantities of unregistered tokens
    pub fn check_quantity(&self, quantity: &Quantity) -> AmmResult<&'a TokenEntry> {
        if !quantity.is_positive() {
            return Err(AmmError::NonPositiveQuantity(quantity.to_string()));
        }
        let entry = self.tokens.get(&quantity.token().code)?;
        if entry.contract != quantity.token().contract {
            return Err(AmmError::UnknownToken(quantity.token().to_string()));
        }
        quantity.ensure_compatible(&entry.quantity(Decimal::ZERO))?;
        Ok(entry)
    }

    /// Remaining reserve after paying out `out`; negative remainders are rejected
    pub fn check_remaining_reserve(&self, out: &Quantity) -> AmmResult<Quantity> {
        let entry = self.tokens.get(&out.token().code)?;
        let reserve = entry.quantity(entry.reserve);
        let remaining = reserve.checked_sub(out)?;
        if remaining.is_negative() {
            return Err(AmmError::InsufficientReserve {
                token: entry.token_id(),
                reserve: reserve.amount(),
                requested: out.amount(),
            });
        }
        Ok(remaining)
    }

    pub fn get_fee(&self, quantity: &Quantity) -> AmmResult<Quantity> {
        forward_fee(quantity, Decimal::from(self.settings.fee))
    }

    /// Fee to add to a net amount so that, after the forward fee, `out` remains
    pub fn get_inverse_fee(&self, out: &Quantity) -> AmmResult<Quantity> {
        let fee = exact_inverse_fee(out.amount(), Decimal::from(self.settings.fee))?;
        Ok(out.with_amount_rounded(fee, RoundingStrategy::MidpointAwayFromZero))
    }

    /// `(base_upper, quote_upper)` from the registry's balances and depths
    pub fn get_uppers(&self, base: &SymbolCode, quote: &SymbolCode) -> AmmResult<(Decimal, Decimal)> {
        let base_entry = self.tokens.get(base)?;
        let quote_entry = self.tokens.get(quote)?;
        let amplifier = self.settings.amplifier;
        let base_upper = ReserveModel::virtual_upper(
            base_entry.balance,
            base_entry.depth,
            amplifier,
            base.as_str(),
        )?;
        let quote_upper = ReserveModel::virtual_upper(
            quote_entry.balance,
            quote_entry.depth,
            amplifier,
            quote.as_str(),
        )?;
        Ok((base_upper, quote_upper))
    }

    fn raw_price(&self, quantity: &Quantity, to: &SymbolCode) -> AmmResult<Decimal> {
        self.check_quantity(quantity)?;
        let (base_upper, quote_upper) = self.get_uppers(&quantity.token().code, to)?;
        BondingCurve::checked_output(base_upper, quote_upper, quantity.amount())
    }

    /// Output of `to` for `quantity`, no fee
    pub fn get_price(&self, quantity: &Quantity, to: &SymbolCode) -> AmmResult<Quantity> {
        let raw = self.raw_price(quantity, to)?;
        let out = self.tokens.get(to)?.quantity(raw);
        debug!(input = %quantity, output = %out, "Priced conversion");
        Ok(out)
    }

    /// Input of `from` needed to receive `out`, no fee, rounded up
    pub fn get_inverse_price(&self, out: &Quantity, from: &SymbolCode) -> AmmResult<Quantity> {
        self.check_quantity(out)?;
        let (from_upper, out_upper) = self.get_uppers(from, &out.token().code)?;
        let raw = BondingCurve::checked_input(from_upper, out_upper, out.amount())?;
        let entry = self.tokens.get(from)?;
        let input = entry
            .quantity(Decimal::ZERO)
            .with_amount_rounded_up(raw);
        debug!(output = %out, input = %input, "Priced inverse conversion");
        Ok(input)
    }

    /// Fee-adjusted output: the fee is deducted before pricing
    pub fn get_rate(&self, quantity: &Quantity, to: &SymbolCode) -> AmmResult<Quantity> {
        let fee = self.get_fee(quantity)?;
        let net = quantity.checked_sub(&fee)?;
        self.get_price(&net, to)
    }

    /// Fee-inclusive input for a desired output
    pub fn get_inverse_rate(&self, out: &Quantity, from: &SymbolCode) -> AmmResult<Quantity> {
        let price = self.get_inverse_price(out, from)?;
        let fee = self.get_inverse_fee(&price)?;
        Ok(price.checked_add(&fee)?)
    }

    pub fn is_maker_token(&self, code: &SymbolCode) -> AmmResult<bool> {
        Ok(self.tokens.get(code)?.is_liquidity())
    }

    pub fn is_connector_token(&self, code: &SymbolCode) -> AmmResult<bool> {
        Ok(self.tokens.get(code)?.is_connector())
    }

    /// Units of `base` per unit of `quote`, no fee, no slippage
    pub fn get_spot_price(&self, base: &SymbolCode, quote: &SymbolCode) -> AmmResult<Decimal> {
        if self.is_maker_token(quote)? {
            return self.get_maker_spot_price(base);
        }
        let (base_upper, quote_upper) = self.get_uppers(base, quote)?;
        if quote_upper <= Decimal::ZERO {
            return Err(AmmError::InsufficientLiquidity(format!(
                "{quote} has no virtual balance"
            )));
        }
        checked_div(base_upper, quote_upper, "spot price")
    }

    /// Units of `base` per maker token, from the proxy pool's balance sheet
    pub fn get_maker_spot_price(&self, base: &SymbolCode) -> AmmResult<Decimal> {
        let proxy_spot = self.get_spot_price(base, self.settings.proxy_code())?;
        let pool_balance = self.get_pool_balance()?;
        let maker_balance = self.get_maker_balance()?;
        if maker_balance.is_zero() {
            return Err(AmmError::ZeroMakerBalance(self.settings.maker_code().clone()));
        }
        let numerator = checked_mul(proxy_spot, pool_balance, "maker price")?;
        checked_div(numerator, maker_balance, "maker price")
    }

    /// Maker-designated connector balances valued in the proxy token
    pub fn get_pool_balance(&self) -> AmmResult<Decimal> {
        let proxy = self.settings.proxy_code();
        self.tokens
            .connectors()
            .filter(|entry| !entry.maker_pool.is_zero())
            .try_fold(Decimal::ZERO, |total, entry| {
                let spot = self.get_spot_price(proxy, entry.code())?;
                let value = checked_mul(entry.maker_pool, spot, "pool balance")?;
                total
                    .checked_add(value)
                    .ok_or(AmmError::Arithmetic("pool balance"))
            })
    }

    pub fn get_maker_balance(&self) -> AmmResult<Decimal> {
        Ok(self.tokens.get(self.settings.maker_code())?.balance)
    }

    /// `(quantity / spot) / price - 1`; positive means worse than spot
    pub fn get_slippage(&self, quantity: &Quantity, to: &SymbolCode) -> AmmResult<Decimal> {
        let price = self.raw_price(quantity, to)?;
        let spot = self.get_spot_price(&quantity.token().code, to)?;
        let ideal = checked_div(quantity.amount(), spot, "slippage ideal output")?;
        let ratio = checked_div(ideal, price, "slippage")?;
        Ok(ratio - Decimal::ONE)
    }
}
