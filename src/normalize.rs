//! Input normalisation helpers for amounts and addresses.
//!
//! Every user-supplied amount or recipient passes through one of these
//! functions before it reaches a wallet or proof call, so malformed input is
//! rejected locally instead of surfacing later as an `INVALID_ADDRESS` or
//! `UNKNOWN` error from a collaborator.

use crate::constants::{MAX_ADDRESS_LENGTH, MIN_ADDRESS_LENGTH, NATIVE_DECIMALS};
use crate::utils::ValidationError;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Sanitise a partially typed amount.
///
/// Keeps digits and the first decimal separator (`,` is accepted as `.`),
/// drops leading zeros (keeping a single `0` before the separator), and
/// truncates the fractional part to `decimals` digits. A trailing separator
/// is kept so the user can continue typing.
pub fn sanitize_amount_input(raw: &str, decimals: u8) -> String {
    let mut int_part = String::new();
    let mut frac_part = String::new();
    let mut seen_separator = false;

    for c in raw.trim().chars() {
        match c {
            '0'..='9' if seen_separator => {
                if frac_part.len() < usize::from(decimals) {
                    frac_part.push(c);
                }
            }
            '0'..='9' => int_part.push(c),
            '.' | ',' if !seen_separator && decimals > 0 => seen_separator = true,
            _ => {}
        }
    }

    let trimmed = int_part.trim_start_matches('0');
    let int_part = if !trimmed.is_empty() {
        trimmed
    } else if int_part.is_empty() && !seen_separator {
        ""
    } else {
        "0"
    };

    if seen_separator {
        format!("{}.{}", int_part, frac_part)
    } else {
        int_part.to_string()
    }
}

/// Parse an amount into base units (`decimals` fractional digits).
///
/// The input is sanitised first, so excess fractional digits are truncated.
pub fn parse_amount(raw: &str, decimals: u8) -> Result<u64, ValidationError> {
    let cleaned = sanitize_amount_input(raw, decimals);
    if cleaned.is_empty() || cleaned == "0." {
        return Err(ValidationError::EmptyAmount);
    }

    let (int_part, frac_part) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));

    let scale = 10u64
        .checked_pow(u32::from(decimals))
        .ok_or(ValidationError::AmountOverflow)?;
    let whole: u64 = int_part.parse().map_err(|_| ValidationError::AmountOverflow)?;

    let mut fraction: u64 = 0;
    for (i, digit) in frac_part.bytes().enumerate() {
        let place = 10u64.pow(u32::from(decimals) - 1 - i as u32);
        fraction += u64::from(digit - b'0') * place;
    }

    let units = whole
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction))
        .ok_or(ValidationError::AmountOverflow)?;

    if units == 0 {
        return Err(ValidationError::ZeroAmount);
    }
    Ok(units)
}

/// [`parse_amount`] for the native token (lamports).
pub fn parse_native_amount(raw: &str) -> Result<u64, ValidationError> {
    parse_amount(raw, NATIVE_DECIMALS)
}

/// Validate a base58 account address and return it trimmed.
pub fn validate_address(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidAddress(
            "Address cannot be empty".to_string(),
        ));
    }

    if !(MIN_ADDRESS_LENGTH..=MAX_ADDRESS_LENGTH).contains(&trimmed.len()) {
        return Err(ValidationError::InvalidAddress(format!(
            "Address must be {}-{} characters",
            MIN_ADDRESS_LENGTH, MAX_ADDRESS_LENGTH
        )));
    }

    if let Some(bad) = trimmed.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
        return Err(ValidationError::InvalidAddress(format!(
            "Character '{}' is not valid base58",
            bad
        )));
    }

    Ok(trimmed.to_string())
}
