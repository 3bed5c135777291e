//! Conversion from smallest on-chain units to native decimals.

use rust_decimal::Decimal;

use crate::error::UpstreamError;

/// Scale an integer amount of smallest units (wei, sun, satoshi, lamports)
/// into the native unit, exactly.
///
/// `raw` must be a non-negative base-10 integer string, as returned by the
/// explorer APIs.
pub fn scale_integer(raw: &str, decimals: u32) -> Result<Decimal, UpstreamError> {
    let raw = raw.trim();
    let value: u128 = raw
        .parse()
        .map_err(|e| UpstreamError::shape(format!("invalid integer amount {raw:?}: {e}")))?;
    scale_u128(value, decimals)
}

/// Same as [`scale_integer`] for amounts that arrive as JSON numbers.
pub fn scale_u128(value: u128, decimals: u32) -> Result<Decimal, UpstreamError> {
    let value = i128::try_from(value)
        .map_err(|_| UpstreamError::shape(format!("amount {value} out of range")))?;
    Decimal::try_from_i128_with_scale(value, decimals)
        .map(|d| d.normalize())
        .map_err(|e| UpstreamError::shape(format!("amount {value} out of range: {e}")))
}
