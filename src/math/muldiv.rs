use crate::math::uint::{U256, U512};
use ruint::UintTryFrom;
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum MuldivError {
    #[error("muldiv result overflows 256 bits")]
    Overflow,
    #[error("muldiv denominator is zero")]
    DenominatorZero,
}

/// Computes `x * y / d` with a 512-bit intermediate product, rounding up if requested.
pub fn muldiv(x: U256, y: U256, d: U256, round_up: bool) -> Result<U256, MuldivError> {
    if d.is_zero() {
        return Err(MuldivError::DenominatorZero);
    }

    let intermediate: U512 = U512::from(x) * U512::from(y);
    let (quotient, remainder) = intermediate.div_rem(U512::from(d));

    let result = if round_up && !remainder.is_zero() {
        quotient + U512::ONE
    } else {
        quotient
    };

    U256::uint_try_from(result).map_err(|_| MuldivError::Overflow)
}

/// `ceil(x / d)`. Cannot overflow.
pub fn div_rounding_up(x: U256, d: U256) -> Result<U256, MuldivError> {
    if d.is_zero() {
        return Err(MuldivError::DenominatorZero);
    }

    let (quotient, remainder) = x.div_rem(d);
    Ok(if remainder.is_zero() {
        quotient
    } else {
        quotient + U256::ONE
    })
}
