use crate::error::{Result, SnaxSdkError};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// u64 base units never carry more than 19 significant fractional digits
const MAX_DECIMALS: u8 = 19;

//=============================================================================
// Address Helpers
//=============================================================================

/// Derive the associated token account for (owner, mint) under the SPL token program
pub fn derive_token_account(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(owner, mint)
}

/// Parse a base58 ledger address
pub fn parse_address(text: &str) -> Result<Pubkey> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SnaxSdkError::InvalidAddress("empty address".to_string()));
    }
    Pubkey::from_str(trimmed)
        .map_err(|e| SnaxSdkError::InvalidAddress(format!("{}: {}", trimmed, e)))
}

//=============================================================================
// Amount Scaling
//=============================================================================

/// Scale a decimal amount string to base units using integer arithmetic only.
///
/// Accepts `"10"`, `"1.5"`, `".5"`, `"2."`. Rejects signs, exponents, more
/// fractional digits than `decimals`, zero, and values above `u64::MAX`.
pub fn parse_token_amount(text: &str, decimals: u8) -> Result<u64> {
    let trimmed = text.trim();
    let invalid = |why: &str| SnaxSdkError::InvalidAmount(format!("{:?}: {}", trimmed, why));

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("not a number"));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid("not a positive decimal"));
    }
    if fraction.len() > decimals as usize {
        return Err(invalid("too many decimal places"));
    }

    if decimals > MAX_DECIMALS {
        return Err(invalid("unsupported token precision"));
    }

    let scale = 10u128.pow(decimals as u32);
    let whole_value = if whole.is_empty() {
        0u128
    } else {
        whole.parse::<u128>().map_err(|_| invalid("too large"))?
    };
    let fraction_value = if fraction.is_empty() {
        0u128
    } else {
        let padding = 10u128.pow((decimals as usize - fraction.len()) as u32);
        fraction.parse::<u128>().map_err(|_| invalid("too large"))? * padding
    };

    let raw = whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or_else(|| invalid("too large"))?;

    if raw == 0 {
        return Err(invalid("must be greater than zero"));
    }
    u64::try_from(raw).map_err(|_| invalid("too large"))
}

/// Render base units as an exact decimal string, trimming trailing zeros.
///
/// Works on the digit string, so any `decimals` renders exactly.
pub fn format_token_amount(raw: u64, decimals: u8) -> String {
    let digits = raw.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}
