use crate::math::swap::FEE_DENOMINATOR;
use crate::math::tick::{max_usable_tick, min_usable_tick};
use thiserror::Error;

/// Largest tick spacing a pool may be created with.
pub const MAX_TICK_SPACING: u32 = 16384;

/// Immutable parameters of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Swap fee in pips (millionths).
    pub fee: u32,
    /// Only ticks that are multiples of this can bound a position.
    pub tick_spacing: u32,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum PoolConfigError {
    #[error("fee {0} must be less than 1000000 pips")]
    FeeTooLarge(u32),
    #[error("tick spacing cannot be zero")]
    TickSpacingCannotBeZero,
    #[error("tick spacing {0} is larger than 16384")]
    TickSpacingTooLarge(u32),
}

impl PoolConfig {
    pub fn new(fee: u32, tick_spacing: u32) -> Result<Self, PoolConfigError> {
        let config = Self { fee, tick_spacing };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PoolConfigError> {
        if self.fee >= FEE_DENOMINATOR {
            return Err(PoolConfigError::FeeTooLarge(self.fee));
        }
        if self.tick_spacing == 0 {
            return Err(PoolConfigError::TickSpacingCannotBeZero);
        }
        if self.tick_spacing > MAX_TICK_SPACING {
            return Err(PoolConfigError::TickSpacingTooLarge(self.tick_spacing));
        }
        Ok(())
    }

    #[must_use]
    pub fn min_tick(&self) -> i32 {
        min_usable_tick(self.tick_spacing)
    }

    #[must_use]
    pub fn max_tick(&self) -> i32 {
        max_usable_tick(self.tick_spacing)
    }

    /// Most gross liquidity a single tick may reference, so that active liquidity can never
    /// overflow even if every usable tick is at the cap.
    #[must_use]
    pub fn max_liquidity_per_tick(&self) -> u128 {
        let spacing = self.tick_spacing as i32;
        let num_ticks = ((self.max_tick() - self.min_tick()) / spacing) as u128 + 1;
        u128::MAX / num_ticks
    }
}
