use crate::math::fee_growth::FeeGrowth;
use crate::math::liquidity::add_delta;
use thiserror::Error;

/// Identifies a position: its owner, its range and an owner-chosen index that allows several
/// positions over the same range.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionKey<A> {
    pub owner: A,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub index: u64,
}

impl<A> PositionKey<A> {
    pub fn new(owner: A, tick_lower: i32, tick_upper: i32, index: u64) -> Self {
        Self {
            owner,
            tick_lower,
            tick_upper,
            index,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionInfo {
    pub liquidity: u128,
    /// Fee growth inside the range as of the last time the position was touched.
    pub fee_growth_inside0_last: FeeGrowth,
    pub fee_growth_inside1_last: FeeGrowth,
    /// Fees and withdrawn liquidity not yet collected.
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum PositionError {
    #[error("position has no liquidity")]
    NoLiquidity,
    #[error("position does not have enough liquidity")]
    InsufficientLiquidity,
    #[error("position liquidity overflow")]
    LiquidityOverflow,
}

/// A position after settling fees, with the fees that were settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionUpdate {
    pub info: PositionInfo,
    pub fees0: u128,
    pub fees1: u128,
}

impl PositionInfo {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0 && self.tokens_owed0 == 0 && self.tokens_owed1 == 0
    }

    /// Settles fees earned since the last update into `tokens_owed` and applies `liquidity_delta`.
    pub fn updated(
        &self,
        liquidity_delta: i128,
        fee_growth_inside0: FeeGrowth,
        fee_growth_inside1: FeeGrowth,
    ) -> Result<PositionUpdate, PositionError> {
        if liquidity_delta == 0 && self.liquidity == 0 {
            // poking an empty position
            return Err(PositionError::NoLiquidity);
        }

        let liquidity = add_delta(self.liquidity, liquidity_delta).map_err(|_| {
            if liquidity_delta < 0 {
                PositionError::InsufficientLiquidity
            } else {
                PositionError::LiquidityOverflow
            }
        })?;

        let fees0 = fee_growth_inside0
            .wrapping_sub(self.fee_growth_inside0_last)
            .fees_for(self.liquidity);
        let fees1 = fee_growth_inside1
            .wrapping_sub(self.fee_growth_inside1_last)
            .fees_for(self.liquidity);

        Ok(PositionUpdate {
            info: PositionInfo {
                liquidity,
                fee_growth_inside0_last: fee_growth_inside0,
                fee_growth_inside1_last: fee_growth_inside1,
                // owed amounts may wrap, they must be collected before reaching u128::MAX
                tokens_owed0: self.tokens_owed0.wrapping_add(fees0),
                tokens_owed1: self.tokens_owed1.wrapping_add(fees1),
            },
            fees0,
            fees1,
        })
    }
}
