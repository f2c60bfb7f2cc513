use crate::math::muldiv::{div_rounding_up, muldiv, MuldivError};
use crate::math::uint::{U256, U512, Q96};
use ruint::UintTryFrom;
use thiserror::Error;

pub const SQRT_RATIO_ONE: U256 = Q96;

// Q64.96 prices are 160-bit quantities
const MAX_U160: U256 = U256::from_limbs([u64::MAX, u64::MAX, u32::MAX as u64, 0]);

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum PriceMathError {
    #[error("sqrt ratio is zero")]
    ZeroRatio,
    #[error("no liquidity")]
    NoLiquidity,
    #[error("sqrt ratio overflow")]
    Overflow,
    #[error("sqrt ratio underflow")]
    Underflow,
    #[error("muldiv error")]
    MuldivError(#[from] MuldivError),
}

fn to_u160(sqrt_ratio: U256) -> Result<U256, PriceMathError> {
    if sqrt_ratio > MAX_U160 {
        Err(PriceMathError::Overflow)
    } else {
        Ok(sqrt_ratio)
    }
}

/// Price after adding (or removing) `amount` of token0, always rounded up.
pub fn next_sqrt_ratio_from_amount0(
    sqrt_ratio: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, PriceMathError> {
    if amount.is_zero() {
        return Ok(sqrt_ratio);
    }
    if sqrt_ratio.is_zero() {
        return Err(PriceMathError::ZeroRatio);
    }

    let numerator1: U256 = U256::from(liquidity) << 96;
    let product = amount.checked_mul(sqrt_ratio);

    if add {
        if let Some(product) = product {
            if let Some(denominator) = numerator1.checked_add(product) {
                return to_u160(muldiv(numerator1, sqrt_ratio, denominator, true)?);
            }
        }

        // liquidity / (liquidity / price + amount), which cannot overflow
        let denominator = (numerator1 / sqrt_ratio)
            .checked_add(amount)
            .ok_or(PriceMathError::Overflow)?;
        to_u160(div_rounding_up(numerator1, denominator)?)
    } else {
        let product = product.ok_or(PriceMathError::Underflow)?;
        if numerator1 <= product {
            return Err(PriceMathError::Underflow);
        }

        to_u160(muldiv(numerator1, sqrt_ratio, numerator1 - product, true)?)
    }
}

/// Price after adding (or removing) `amount` of token1, always rounded down.
pub fn next_sqrt_ratio_from_amount1(
    sqrt_ratio: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, PriceMathError> {
    if liquidity == 0 {
        return Err(PriceMathError::NoLiquidity);
    }

    let liquidity = U256::from(liquidity);

    if add {
        let quotient = if amount <= MAX_U160 {
            (amount << 96) / liquidity
        } else {
            muldiv(amount, Q96, liquidity, false)?
        };

        to_u160(
            sqrt_ratio
                .checked_add(quotient)
                .ok_or(PriceMathError::Overflow)?,
        )
    } else {
        let quotient = if amount <= MAX_U160 {
            div_rounding_up(amount << 96, liquidity)?
        } else {
            muldiv(amount, Q96, liquidity, true)?
        };

        if sqrt_ratio <= quotient {
            return Err(PriceMathError::Underflow);
        }

        Ok(sqrt_ratio - quotient)
    }
}

/// Price reached by swapping `amount_in` into the pool.
///
/// Rounds so that the price never moves further than the input pays for.
pub fn next_sqrt_ratio_from_input(
    sqrt_ratio: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, PriceMathError> {
    if sqrt_ratio.is_zero() {
        return Err(PriceMathError::ZeroRatio);
    }
    if liquidity == 0 {
        return Err(PriceMathError::NoLiquidity);
    }

    if zero_for_one {
        next_sqrt_ratio_from_amount0(sqrt_ratio, liquidity, amount_in, true)
    } else {
        next_sqrt_ratio_from_amount1(sqrt_ratio, liquidity, amount_in, true)
    }
}

/// Price reached by taking `amount_out` out of the pool.
///
/// Rounds so that the price always moves at least as far as the output requires.
pub fn next_sqrt_ratio_from_output(
    sqrt_ratio: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256, PriceMathError> {
    if sqrt_ratio.is_zero() {
        return Err(PriceMathError::ZeroRatio);
    }
    if liquidity == 0 {
        return Err(PriceMathError::NoLiquidity);
    }

    if zero_for_one {
        next_sqrt_ratio_from_amount1(sqrt_ratio, liquidity, amount_out, false)
    } else {
        next_sqrt_ratio_from_amount0(sqrt_ratio, liquidity, amount_out, false)
    }
}

fn isqrt(n: U512) -> U512 {
    if n.is_zero() {
        return n;
    }

    let mut x = U512::ONE << n.bit_len().div_ceil(2);
    loop {
        let y = (x + n / x) >> 1;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Q64.96 square root of `amount1 / amount0`, rounded down.
///
/// Returns `None` if `amount0` is zero.
#[must_use]
pub fn encode_sqrt_ratio_x96(amount1: u128, amount0: u128) -> Option<U256> {
    if amount0 == 0 {
        return None;
    }

    let ratio_x192 = (U512::from(amount1) << 192) / U512::from(amount0);
    U256::uint_try_from(isqrt(ratio_x192)).ok()
}
