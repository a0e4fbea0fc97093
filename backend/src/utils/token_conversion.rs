use alloy::primitives::{utils::parse_units, U256};
use anyhow::Result;

use crate::constants::TOKEN_DECIMALS;

/// Formats a raw fixed-point token amount with exactly `places` decimals.
///
/// Rounding is half-up and happens in the integer domain, so the result never
/// drifts the way an `f64` conversion would. `places` is clamped to `decimals`.
pub fn format_token_amount(raw: U256, decimals: u8, places: u8) -> String {
    let places = places.min(decimals);
    let drop = U256::from(10u64).pow(U256::from(decimals - places));
    let rounded = if drop > U256::from(1u64) {
        raw.saturating_add(drop / U256::from(2u64)) / drop
    } else {
        raw
    };

    if places == 0 {
        return rounded.to_string();
    }

    let unit = U256::from(10u64).pow(U256::from(places));
    let whole = rounded / unit;
    let frac = rounded % unit;
    format!("{}.{:0>width$}", whole, frac.to_string(), width = places as usize)
}

/// Parses a human decimal amount such as `"12.5"` into raw 18-decimal units.
pub fn parse_token_amount(amount: &str) -> Result<U256> {
    let parsed = parse_units(amount.trim(), TOKEN_DECIMALS)
        .map_err(|e| anyhow::anyhow!("Invalid token amount '{}': {}", amount, e))?;
    if parsed.is_negative() {
        return Err(anyhow::anyhow!("Token amount '{}' must not be negative", amount));
    }
    Ok(parsed.get_absolute())
}

/// Shorthand for `n` whole tokens in raw units.
pub fn whole_tokens(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(TOKEN_DECIMALS))
}
