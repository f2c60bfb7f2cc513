use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum LiquidityError {
    #[error("liquidity underflow")]
    Underflow,
    #[error("liquidity overflow")]
    Overflow,
}

/// Applies a signed delta to an unsigned liquidity amount.
pub fn add_delta(liquidity: u128, delta: i128) -> Result<u128, LiquidityError> {
    if delta < 0 {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or(LiquidityError::Underflow)
    } else {
        liquidity
            .checked_add(delta.unsigned_abs())
            .ok_or(LiquidityError::Overflow)
    }
}
