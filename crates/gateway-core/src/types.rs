//! Core type definitions for the gateway

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;

/// Asset quantity in base units (e.g. wei for an 18-decimal asset)
pub type Amount = u128;

/// Loan index inside a lending ledger
pub type LoanId = u64;

/// Constants
pub mod constants {
    use super::Amount;

    /// Fixed-point precision of [`super::Rate`] (18 decimal places)
    pub const RATE_PRECISION: Amount = 1_000_000_000_000_000_000;

    /// Basis points in 100%
    pub const BPS_DENOMINATOR: u32 = 10_000;

    /// Largest decimals an asset may declare
    pub const MAX_DECIMALS: u8 = 18;

    /// Decimals of the native asset
    pub const NATIVE_DECIMALS: u8 = 18;

    /// Sentinel address some exchanges use for the native asset
    pub const NATIVE_SENTINEL: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
}

/// Account or contract address (20 bytes, `0x`-prefixed lowercase hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalise an address string
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| GatewayError::InvalidRequest {
                message: format!("Address '{}' is missing the 0x prefix", raw),
            })?;

        if body.len() != 40 {
            return Err(GatewayError::InvalidRequest {
                message: format!(
                    "Address '{}' has {} hex characters, expected 40",
                    raw,
                    body.len()
                ),
            });
        }

        let bytes = hex::decode(body).map_err(|e| GatewayError::InvalidRequest {
            message: format!("Address '{}' is not valid hex: {}", raw, e),
        })?;

        Ok(Self(format!("0x{}", hex::encode(bytes))))
    }

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Deterministic address with `n` in the low 8 bytes (test fixtures, sandbox seeds)
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Self::from_bytes(bytes)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Asset identifier: the chain's native asset or a token contract
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AssetId {
    Native,
    Token(Address),
}

impl AssetId {
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("native") {
            return Ok(Self::Native);
        }

        let address = Address::parse(trimmed)?;
        if address.as_str() == constants::NATIVE_SENTINEL {
            Ok(Self::Native)
        } else {
            Ok(Self::Token(address))
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Token(address) => write!(f, "{}", address),
        }
    }
}

impl FromStr for AssetId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AssetId {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AssetId> for String {
    fn from(asset: AssetId) -> Self {
        asset.to_string()
    }
}

/// Conversion rate: destination units per source unit, fixed point with
/// [`constants::RATE_PRECISION`].
///
/// A rate is expressed between whole units; converting base-unit amounts
/// corrects for the decimals of both assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(pub Amount);

impl Rate {
    pub const ZERO: Rate = Rate(0);

    pub fn new(raw: Amount) -> Self {
        Self(raw)
    }

    /// Rate of `units` whole destination units per source unit
    pub fn from_units(units: u64) -> Self {
        Self(units as Amount * constants::RATE_PRECISION)
    }

    /// Rate equal to `numerator / denominator`, rounded down
    pub fn from_ratio(numerator: Amount, denominator: Amount) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let raw = BigUint::from(numerator) * BigUint::from(constants::RATE_PRECISION)
            / BigUint::from(denominator);
        raw.to_u128().map(Self)
    }

    pub fn raw(&self) -> Amount {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Convert a source amount into destination base units, rounding down.
    ///
    /// dest = src * rate * 10^(dest_dec - src_dec) / PRECISION
    ///
    /// Returns `None` if the result does not fit an [`Amount`].
    pub fn convert(&self, source_amount: Amount, source_decimals: u8, dest_decimals: u8) -> Option<Amount> {
        let mut numerator = BigUint::from(source_amount) * BigUint::from(self.0);
        let mut denominator = BigUint::from(constants::RATE_PRECISION);

        if dest_decimals >= source_decimals {
            numerator *= pow10(dest_decimals - source_decimals);
        } else {
            denominator *= pow10(source_decimals - dest_decimals);
        }

        (numerator / denominator).to_u128()
    }

    /// Rate implied by an executed conversion, rounded down.
    ///
    /// rate = dest * PRECISION * 10^src_dec / (src * 10^dest_dec)
    pub fn implied(
        source_amount: Amount,
        dest_amount: Amount,
        source_decimals: u8,
        dest_decimals: u8,
    ) -> Option<Self> {
        if source_amount == 0 {
            return None;
        }

        let numerator = BigUint::from(dest_amount)
            * BigUint::from(constants::RATE_PRECISION)
            * pow10(source_decimals);
        let denominator = BigUint::from(source_amount) * pow10(dest_decimals);

        if denominator.is_zero() {
            return None;
        }

        (numerator / denominator).to_u128().map(Self)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_units(self.0, 18))
    }
}

fn pow10(exp: u8) -> BigUint {
    BigUint::from(10u32).pow(exp as u32)
}

/// Render a base-unit amount as a decimal string with trailing zeros trimmed
pub fn format_units(amount: Amount, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let divisor = 10u128.pow(decimals as u32);
    let whole = amount / divisor;
    let frac = amount % divisor;
    if frac == 0 {
        return whole.to_string();
    }
    let frac_str = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use constants::RATE_PRECISION;

    const E18: Amount = 1_000_000_000_000_000_000;

    #[test]
    fn test_address_parse_normalises_case() {
        let addr = Address::parse("0xABCDEFabcdef0123456789ABCDEF0123456789ab").unwrap();
        assert_eq!(addr.as_str(), "0xabcdefabcdef0123456789abcdef0123456789ab");
    }

    #[test]
    fn test_address_parse_rejects_bad_input() {
        assert!(Address::parse("abcdefabcdef0123456789abcdef0123456789ab").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzzcdefabcdef0123456789abcdef0123456789ab").is_err());
    }

    #[test]
    fn test_address_from_low_u64() {
        let addr = Address::from_low_u64(3);
        assert_eq!(addr.as_str(), "0x0000000000000000000000000000000000000003");
    }

    #[test]
    fn test_asset_id_native_sentinel() {
        assert_eq!(AssetId::parse("native").unwrap(), AssetId::Native);
        assert_eq!(
            AssetId::parse("0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE").unwrap(),
            AssetId::Native
        );
        let token = AssetId::parse("0x0000000000000000000000000000000000000010").unwrap();
        assert!(!token.is_native());
        assert_eq!(token.to_string(), "0x0000000000000000000000000000000000000010");
    }

    #[test]
    fn test_asset_id_serde_as_string() {
        let json = serde_json::to_string(&AssetId::Native).unwrap();
        assert_eq!(json, "\"native\"");
        let parsed: AssetId =
            serde_json::from_str("\"0x0000000000000000000000000000000000000010\"").unwrap();
        assert_eq!(parsed, AssetId::Token(Address::from_low_u64(16)));
        assert!(serde_json::from_str::<AssetId>("\"0x12\"").is_err());
    }

    #[test]
    fn test_rate_convert_same_decimals() {
        let rate = Rate::from_units(5000);
        // 0.4002 native -> 2001 tokens
        assert_eq!(rate.convert(400_200_000_000_000_000, 18, 18), Some(2001 * E18));
    }

    #[test]
    fn test_rate_convert_large_amount_needs_wide_math() {
        // 4.99999 * 100000 = 499999, intermediate product exceeds u128
        let rate = Rate::from_units(100_000);
        assert_eq!(rate.convert(4_999_990_000_000_000_000, 18, 18), Some(499_999 * E18));
    }

    #[test]
    fn test_rate_convert_dust_is_exact() {
        let rate = Rate::from_units(100_000);
        // 0.000000004 * 100000 = 0.0004
        assert_eq!(rate.convert(4_000_000_000, 18, 18), Some(400_000_000_000_000));
    }

    #[test]
    fn test_rate_convert_across_decimals() {
        // 1 unit of an 18-decimal asset at rate 2 into a 6-decimal asset
        let rate = Rate::from_units(2);
        assert_eq!(rate.convert(E18, 18, 6), Some(2_000_000));
        // and back
        let rate = Rate::from_ratio(1, 2).unwrap();
        assert_eq!(rate.convert(2_000_000, 6, 18), Some(E18));
    }

    #[test]
    fn test_rate_from_ratio() {
        let rate = Rate::from_ratio(2, 10_000).unwrap();
        assert_eq!(rate.raw(), RATE_PRECISION / 5_000);
        assert!(Rate::from_ratio(1, 0).is_none());
    }

    #[test]
    fn test_rate_implied_matches_convert() {
        let rate = Rate::from_units(5000);
        let dest = rate.convert(E18 / 10, 18, 18).unwrap();
        assert_eq!(Rate::implied(E18 / 10, dest, 18, 18), Some(rate));
        assert_eq!(Rate::implied(0, dest, 18, 18), None);
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(2001 * E18, 18), "2001");
        assert_eq!(format_units(400_000_000_000_000, 18), "0.0004");
        assert_eq!(format_units(1_500_000, 6), "1.5");
        assert_eq!(Rate::from_ratio(2, 10_000).unwrap().to_string(), "0.0002");
    }
}
