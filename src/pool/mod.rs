pub mod bitmap;
pub mod config;
pub mod engine;
pub mod messages;
pub mod position;
pub mod tick;

use crate::math::delta::AmountDeltaError;
use crate::math::liquidity::LiquidityError;
use crate::math::swap::ComputeStepError;
use crate::math::tick::TickMathError;
use bitmap::BitmapError;
use config::PoolConfigError;
use position::PositionError;
use thiserror::Error;
use tick::TickError;

/// Errors returned by [`engine::PoolEngine`] operations. A failed operation leaves the pool unchanged.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum PoolError {
    #[error("pool is not initialized")]
    Uninitialized,
    #[error("pool is already initialized")]
    AlreadyInitialized,
    #[error("out of range")]
    OutOfRange(#[from] TickMathError),
    #[error("tick {tick} is not a multiple of tick spacing {tick_spacing}")]
    Misaligned { tick: i32, tick_spacing: u32 },
    #[error("invalid tick range [{tick_lower}, {tick_upper}]")]
    InvalidRange { tick_lower: i32, tick_upper: i32 },
    #[error("insufficient liquidity")]
    InsufficientLiquidity,
    #[error("invalid price limit")]
    InvalidPriceLimit,
    #[error("amount specified cannot be zero")]
    ZeroAmount,
    #[error("liquidity cannot be zero")]
    ZeroLiquidity,
    #[error("liquidity at tick {0} exceeds the per-tick maximum")]
    TickLiquidityOverflow(i32),
    #[error("position not found")]
    PositionNotFound,
    #[error("amount overflow")]
    AmountOverflow,
    #[error("invalid pool configuration")]
    Config(#[from] PoolConfigError),
    #[error("swap step computation failed")]
    ComputeStep(#[from] ComputeStepError),
    #[error("amount delta computation failed")]
    AmountDelta(#[from] AmountDeltaError),
    #[error("active liquidity out of bounds")]
    Liquidity(#[from] LiquidityError),
}

impl From<BitmapError> for PoolError {
    fn from(err: BitmapError) -> Self {
        match err {
            BitmapError::Misaligned { tick, tick_spacing } => {
                PoolError::Misaligned { tick, tick_spacing }
            }
        }
    }
}

impl From<TickError> for PoolError {
    fn from(err: TickError) -> Self {
        match err {
            TickError::InsufficientLiquidity(_) => PoolError::InsufficientLiquidity,
            TickError::LiquidityOverflow(tick) | TickError::NetLiquidityOverflow(tick) => {
                PoolError::TickLiquidityOverflow(tick)
            }
        }
    }
}

impl From<PositionError> for PoolError {
    fn from(err: PositionError) -> Self {
        match err {
            PositionError::NoLiquidity => PoolError::ZeroLiquidity,
            PositionError::InsufficientLiquidity => PoolError::InsufficientLiquidity,
            PositionError::LiquidityOverflow => PoolError::Liquidity(LiquidityError::Overflow),
        }
    }
}
