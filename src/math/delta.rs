use crate::math::muldiv::{div_rounding_up, muldiv, MuldivError};
use crate::math::uint::{U256, Q96};
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum AmountDeltaError {
    #[error("sqrt ratio is zero")]
    ZeroRatio,
    #[error("amount does not fit in 128 bits")]
    Overflow,
    #[error("muldiv error")]
    MuldivError(#[from] MuldivError),
}

fn sort_ratios(sqrt_ratio_a: U256, sqrt_ratio_b: U256) -> Result<(U256, U256), AmountDeltaError> {
    let (lower, upper) = if sqrt_ratio_a < sqrt_ratio_b {
        (sqrt_ratio_a, sqrt_ratio_b)
    } else {
        (sqrt_ratio_b, sqrt_ratio_a)
    };

    if lower.is_zero() {
        Err(AmountDeltaError::ZeroRatio)
    } else {
        Ok((lower, upper))
    }
}

fn to_u128(amount: U256) -> Result<u128, AmountDeltaError> {
    u128::try_from(amount).map_err(|_| AmountDeltaError::Overflow)
}

/// Full-width `liquidity * (upper - lower) / (upper * lower)`.
pub(crate) fn amount0_delta_full(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, AmountDeltaError> {
    let (lower, upper) = sort_ratios(sqrt_ratio_a, sqrt_ratio_b)?;

    if liquidity == 0 || lower == upper {
        return Ok(U256::ZERO);
    }

    let numerator = U256::from(liquidity) << 96;
    let intermediate = muldiv(numerator, upper - lower, upper, round_up)?;

    Ok(if round_up {
        div_rounding_up(intermediate, lower)?
    } else {
        intermediate / lower
    })
}

/// Full-width `liquidity * (upper - lower)` in Q96.
pub(crate) fn amount1_delta_full(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, AmountDeltaError> {
    let (lower, upper) = sort_ratios(sqrt_ratio_a, sqrt_ratio_b)?;

    if liquidity == 0 || lower == upper {
        return Ok(U256::ZERO);
    }

    Ok(muldiv(U256::from(liquidity), upper - lower, Q96, round_up)?)
}

/// Amount of token0 between two prices for the given liquidity.
///
/// Round up when the amount is owed to the pool and down when it is paid out.
pub fn amount0_delta(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, AmountDeltaError> {
    to_u128(amount0_delta_full(
        sqrt_ratio_a,
        sqrt_ratio_b,
        liquidity,
        round_up,
    )?)
}

/// Amount of token1 between two prices for the given liquidity.
///
/// Round up when the amount is owed to the pool and down when it is paid out.
pub fn amount1_delta(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, AmountDeltaError> {
    to_u128(amount1_delta_full(
        sqrt_ratio_a,
        sqrt_ratio_b,
        liquidity,
        round_up,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::sqrt_ratio::encode_sqrt_ratio_x96;

    fn enc(amount1: u128, amount0: u128) -> U256 {
        encode_sqrt_ratio_x96(amount1, amount0).unwrap()
    }

    const ONE_E18: u128 = 1_000_000_000_000_000_000;

    mod amount0_delta {
        use super::*;

        #[test]
        fn zero_liquidity() {
            assert_eq!(
                amount0_delta(
                    enc(1, 1),
                    enc(2, 1),
                    0,
                    true
                )
                .unwrap(),
                0
            );
        }

        #[test]
        fn equal_prices() {
            let price = enc(1, 1);
            assert_eq!(amount0_delta(price, price, ONE_E18, true).unwrap(), 0);
        }

        #[test]
        fn price_example() {
            let lower = enc(1, 1);
            let upper = enc(121, 100);

            assert_eq!(
                amount0_delta(lower, upper, ONE_E18, true).unwrap(),
                90_909_090_909_090_910
            );
            assert_eq!(
                amount0_delta(lower, upper, ONE_E18, false).unwrap(),
                90_909_090_909_090_909
            );
        }

        #[test]
        fn argument_order_does_not_matter() {
            let lower = enc(1, 1);
            let upper = enc(121, 100);

            assert_eq!(
                amount0_delta(upper, lower, ONE_E18, true).unwrap(),
                amount0_delta(lower, upper, ONE_E18, true).unwrap()
            );
        }

        #[test]
        fn prices_that_overflow_the_product() {
            let lower = enc(1 << 90, 1);
            let upper = enc(1 << 96, 1);

            assert_eq!(amount0_delta(lower, upper, ONE_E18, true).unwrap(), 24869);
            assert_eq!(amount0_delta(lower, upper, ONE_E18, false).unwrap(), 24868);
        }

        #[test]
        fn zero_ratio() {
            assert_eq!(
                amount0_delta(U256::ZERO, Q96, ONE_E18, true),
                Err(AmountDeltaError::ZeroRatio)
            );
        }
    }

    mod amount1_delta {
        use super::*;

        #[test]
        fn zero_liquidity() {
            assert_eq!(
                amount1_delta(
                    enc(1, 1),
                    enc(2, 1),
                    0,
                    true
                )
                .unwrap(),
                0
            );
        }

        #[test]
        fn price_example() {
            let lower = enc(1, 1);
            let upper = enc(121, 100);

            assert_eq!(
                amount1_delta(lower, upper, ONE_E18, true).unwrap(),
                100_000_000_000_000_000
            );
            assert_eq!(
                amount1_delta(lower, upper, ONE_E18, false).unwrap(),
                99_999_999_999_999_999
            );
        }

        #[test]
        fn overflow() {
            assert_eq!(
                amount1_delta(
                    crate::math::tick::MIN_SQRT_RATIO,
                    crate::math::tick::MAX_SQRT_RATIO,
                    u128::MAX,
                    false
                ),
                Err(AmountDeltaError::Overflow)
            );
        }
    }
}
