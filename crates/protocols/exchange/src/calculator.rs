//! Exchange Calculator
//!
//! Pure rate math. No I/O.

use gateway_core::{constants::BPS_DENOMINATOR, Amount, Rate};
use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// Apply a slippage tolerance to a quoted rate
///
/// Formula: worst = expected * (10000 - bps) / 10000, rounded down.
/// Tolerances above 100% floor the rate at zero.
pub fn worst_acceptable_rate(expected: Rate, max_slippage_bps: u16) -> Rate {
    let bps = (max_slippage_bps as u32).min(BPS_DENOMINATOR);
    let kept = BPS_DENOMINATOR - bps;

    let worst = BigUint::from(expected.raw()) * BigUint::from(kept) / BigUint::from(BPS_DENOMINATOR);
    // worst <= expected, so it always fits
    Rate::new(worst.to_u128().unwrap_or(0))
}

/// Destination amount a rate yields for `source_amount`, saturating at
/// [`Amount::MAX`]
pub fn estimate_dest_amount(
    rate: Rate,
    source_amount: Amount,
    source_decimals: u8,
    dest_decimals: u8,
) -> Amount {
    rate.convert(source_amount, source_decimals, dest_decimals)
        .unwrap_or(Amount::MAX)
}

/// How far `realized` fell short of `expected`, in basis points.
///
/// Zero when the trade executed at or above the expected rate.
pub fn realized_slippage_bps(expected: Rate, realized: Rate) -> u32 {
    if expected.is_zero() || realized >= expected {
        return 0;
    }
    let shortfall = BigUint::from(expected.raw() - realized.raw()) * BigUint::from(BPS_DENOMINATOR)
        / BigUint::from(expected.raw());
    shortfall.to_u32().unwrap_or(BPS_DENOMINATOR)
}
