use crate::math::delta::{amount0_delta_full, amount1_delta_full, AmountDeltaError};
use crate::math::muldiv::{muldiv, MuldivError};
use crate::math::sqrt_ratio::{
    next_sqrt_ratio_from_input, next_sqrt_ratio_from_output, PriceMathError,
};
use ruint::aliases::U256;
use thiserror::Error;

/// Fees are expressed in pips, millionths of the swapped amount.
pub const FEE_DENOMINATOR: u32 = 1_000_000;

/// Outcome of a single bounded swap step.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapResult {
    /// Input consumed by the price movement, excluding the fee.
    pub amount_in: u128,
    pub amount_out: u128,
    pub fee_amount: u128,
    pub sqrt_ratio_next: U256,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Error, Hash)]
pub enum ComputeStepError {
    #[error("fee must be less than 1000000 pips")]
    InvalidFee,
    #[error("step amount does not fit in 128 bits")]
    AmountOverflow,
    #[error("amount delta error")]
    AmountDelta(#[from] AmountDeltaError),
    #[error("price math error")]
    PriceMath(#[from] PriceMathError),
    #[error("muldiv error")]
    Muldiv(#[from] MuldivError),
}

fn to_u128(amount: U256) -> Result<u128, ComputeStepError> {
    u128::try_from(amount).map_err(|_| ComputeStepError::AmountOverflow)
}

/// Moves the price from `sqrt_ratio` towards `sqrt_ratio_target`, stopping early if
/// `amount_remaining` runs out first.
///
/// A positive `amount_remaining` is an exact input amount (fee included), a negative one an
/// exact output amount. The direction is `sqrt_ratio >= sqrt_ratio_target` for token0 in.
pub fn compute_step(
    sqrt_ratio: U256,
    sqrt_ratio_target: U256,
    liquidity: u128,
    amount_remaining: i128,
    fee: u32,
) -> Result<SwapResult, ComputeStepError> {
    if fee >= FEE_DENOMINATOR {
        return Err(ComputeStepError::InvalidFee);
    }

    let zero_for_one = sqrt_ratio >= sqrt_ratio_target;
    let exact_in = amount_remaining >= 0;
    let remaining = U256::from(amount_remaining.unsigned_abs());
    let fee_complement = U256::from(FEE_DENOMINATOR - fee);
    let denominator = U256::from(FEE_DENOMINATOR);

    // amount needed to reach the target on the specified side
    let (sqrt_ratio_next, amount_to_target) = if exact_in {
        let remaining_less_fee = muldiv(remaining, fee_complement, denominator, false)?;
        let amount_in = if zero_for_one {
            amount0_delta_full(sqrt_ratio_target, sqrt_ratio, liquidity, true)?
        } else {
            amount1_delta_full(sqrt_ratio, sqrt_ratio_target, liquidity, true)?
        };

        let next = if remaining_less_fee >= amount_in {
            sqrt_ratio_target
        } else {
            next_sqrt_ratio_from_input(sqrt_ratio, liquidity, remaining_less_fee, zero_for_one)?
        };
        (next, amount_in)
    } else {
        let amount_out = if zero_for_one {
            amount1_delta_full(sqrt_ratio_target, sqrt_ratio, liquidity, false)?
        } else {
            amount0_delta_full(sqrt_ratio, sqrt_ratio_target, liquidity, false)?
        };

        let next = if remaining >= amount_out {
            sqrt_ratio_target
        } else {
            next_sqrt_ratio_from_output(sqrt_ratio, liquidity, remaining, zero_for_one)?
        };
        (next, amount_out)
    };

    let reached_target = sqrt_ratio_next == sqrt_ratio_target;

    let (amount_in, mut amount_out) = if zero_for_one {
        (
            if reached_target && exact_in {
                amount_to_target
            } else {
                amount0_delta_full(sqrt_ratio_next, sqrt_ratio, liquidity, true)?
            },
            if reached_target && !exact_in {
                amount_to_target
            } else {
                amount1_delta_full(sqrt_ratio_next, sqrt_ratio, liquidity, false)?
            },
        )
    } else {
        (
            if reached_target && exact_in {
                amount_to_target
            } else {
                amount1_delta_full(sqrt_ratio, sqrt_ratio_next, liquidity, true)?
            },
            if reached_target && !exact_in {
                amount_to_target
            } else {
                amount0_delta_full(sqrt_ratio, sqrt_ratio_next, liquidity, false)?
            },
        )
    };

    // the output can exceed the request by rounding in the price computation
    if !exact_in && amount_out > remaining {
        amount_out = remaining;
    }

    let fee_amount = if exact_in && !reached_target {
        // the whole remaining input is consumed, what the price move did not use is fee
        remaining - amount_in
    } else {
        muldiv(amount_in, U256::from(fee), fee_complement, true)?
    };

    Ok(SwapResult {
        amount_in: to_u128(amount_in)?,
        amount_out: to_u128(amount_out)?,
        fee_amount: to_u128(fee_amount)?,
        sqrt_ratio_next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::sqrt_ratio::encode_sqrt_ratio_x96;
    use ruint::uint;

    const ONE_E18: u128 = 1_000_000_000_000_000_000;

    fn enc(amount1: u128, amount0: u128) -> U256 {
        encode_sqrt_ratio_x96(amount1, amount0).unwrap()
    }

    #[test]
    fn exact_in_capped_at_target_price() {
        let target = enc(101, 100);
        let result = compute_step(enc(1, 1), target, 2 * ONE_E18, ONE_E18 as i128, 600).unwrap();

        assert_eq!(
            result,
            SwapResult {
                amount_in: 9975124224178055,
                amount_out: 9925619580021728,
                fee_amount: 5988667735148,
                sqrt_ratio_next: target,
            }
        );
        assert!(result.amount_in + result.fee_amount < ONE_E18);
    }

    #[test]
    fn exact_out_capped_at_target_price() {
        let target = enc(101, 100);
        let result =
            compute_step(enc(1, 1), target, 2 * ONE_E18, -(ONE_E18 as i128), 600).unwrap();

        assert_eq!(
            result,
            SwapResult {
                amount_in: 9975124224178055,
                amount_out: 9925619580021728,
                fee_amount: 5988667735148,
                sqrt_ratio_next: target,
            }
        );
        assert!(result.amount_out < ONE_E18);
    }

    #[test]
    fn exact_in_fully_spent() {
        let target = enc(1000, 100);
        let result = compute_step(enc(1, 1), target, 2 * ONE_E18, ONE_E18 as i128, 600).unwrap();

        assert_eq!(
            result,
            SwapResult {
                amount_in: 999400000000000000,
                amount_out: 666399946655997866,
                fee_amount: 600000000000000,
                sqrt_ratio_next: uint!(118818475322642227089037862318_U256),
            }
        );
        assert!(result.sqrt_ratio_next < target);
        assert_eq!(result.amount_in + result.fee_amount, ONE_E18);
    }

    #[test]
    fn exact_out_fully_received() {
        let target = enc(10000, 100);
        let result =
            compute_step(enc(1, 1), target, 2 * ONE_E18, -(ONE_E18 as i128), 600).unwrap();

        assert_eq!(
            result,
            SwapResult {
                amount_in: 2000000000000000000,
                amount_out: ONE_E18,
                fee_amount: 1200720432259356,
                sqrt_ratio_next: uint!(158456325028528675187087900672_U256),
            }
        );
        assert!(result.sqrt_ratio_next < target);
    }

    #[test]
    fn amount_out_capped_at_desired_amount() {
        let result = compute_step(
            uint!(417332158212080721273783715441582_U256),
            uint!(1452870262520218020823638996_U256),
            159344665391607089467575320103,
            -1,
            1,
        )
        .unwrap();

        assert_eq!(
            result,
            SwapResult {
                amount_in: 1,
                amount_out: 1,
                fee_amount: 1,
                sqrt_ratio_next: uint!(417332158212080721273783715441581_U256),
            }
        );
    }

    #[test]
    fn target_price_of_one_uses_partial_input() {
        let result = compute_step(
            U256::from(2),
            U256::from(1),
            1,
            3915081100057732413702495386755767,
            1,
        )
        .unwrap();

        assert_eq!(
            result,
            SwapResult {
                amount_in: 39614081257132168796771975168,
                amount_out: 0,
                fee_amount: 39614120871253040049813,
                sqrt_ratio_next: U256::ONE,
            }
        );
        assert!(result.amount_in + result.fee_amount < 3915081100057732413702495386755767);
    }

    #[test]
    fn exact_out_one_for_zero_rounds_to_target() {
        let price = uint!(20282409603651670423947251286016_U256);
        let result = compute_step(price, price * U256::from(11) / U256::from(10), 1024, -4, 3000)
            .unwrap();

        assert_eq!(
            result,
            SwapResult {
                amount_in: 26215,
                amount_out: 0,
                fee_amount: 79,
                sqrt_ratio_next: uint!(22310650564016837466341976414617_U256),
            }
        );
    }

    #[test]
    fn exact_out_zero_for_one_rounds_to_target() {
        let price = uint!(20282409603651670423947251286016_U256);
        let result = compute_step(
            price,
            price * U256::from(9) / U256::from(10),
            1024,
            -263000,
            3000,
        )
        .unwrap();

        assert_eq!(
            result,
            SwapResult {
                amount_in: 1,
                amount_out: 26214,
                fee_amount: 1,
                sqrt_ratio_next: uint!(18254168643286503381552526157414_U256),
            }
        );
    }

    #[test]
    fn zero_liquidity_jumps_to_target() {
        let target = enc(101, 100);
        assert_eq!(
            compute_step(enc(1, 1), target, 0, ONE_E18 as i128, 600).unwrap(),
            SwapResult {
                amount_in: 0,
                amount_out: 0,
                fee_amount: 0,
                sqrt_ratio_next: target,
            }
        );
    }

    #[test]
    fn zero_fee() {
        assert_eq!(
            compute_step(enc(1, 1), enc(99, 100), ONE_E18, 1000, 0).unwrap(),
            SwapResult {
                amount_in: 1000,
                amount_out: 999,
                fee_amount: 0,
                sqrt_ratio_next: uint!(79228162514264258365381436072_U256),
            }
        );
    }

    #[test]
    fn invalid_fee() {
        assert_eq!(
            compute_step(enc(1, 1), enc(99, 100), ONE_E18, 1000, FEE_DENOMINATOR),
            Err(ComputeStepError::InvalidFee)
        );
    }
}
