use crate::math::fee_growth::FeeGrowth;
use crate::math::liquidity::{add_delta, LiquidityError};
use alloc::collections::BTreeMap;
use thiserror::Error;

/// Bookkeeping for a tick that bounds at least one position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickInfo {
    /// Total liquidity of positions using this tick as a bound.
    pub liquidity_gross: u128,
    /// Change in active liquidity when the price crosses this tick upwards.
    pub liquidity_net: i128,
    /// Fee growth on the other side of this tick from the current price.
    pub fee_growth_outside0: FeeGrowth,
    pub fee_growth_outside1: FeeGrowth,
}

impl TickInfo {
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.liquidity_gross != 0
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum TickError {
    #[error("not enough liquidity at tick {0}")]
    InsufficientLiquidity(i32),
    #[error("liquidity at tick {0} exceeds the per-tick maximum")]
    LiquidityOverflow(i32),
    #[error("net liquidity at tick {0} overflows")]
    NetLiquidityOverflow(i32),
}

/// A validated change to a single tick, applied with [`TickRegistry::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickUpdate {
    pub tick: i32,
    pub info: TickInfo,
    /// Whether the tick goes from uninitialized to initialized or back.
    pub flipped: bool,
}

/// Sparse per-tick state keyed by tick index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickRegistry {
    ticks: BTreeMap<i32, TickInfo>,
}

impl TickRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, tick: i32) -> Option<&TickInfo> {
        self.ticks.get(&tick)
    }

    fn info(&self, tick: i32) -> TickInfo {
        self.ticks.get(&tick).copied().unwrap_or_default()
    }

    /// Iterates over stored ticks in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &TickInfo)> {
        self.ticks.iter().map(|(tick, info)| (*tick, info))
    }

    /// Computes the effect of adding `liquidity_delta` to a position bounded by `tick`
    /// without modifying the registry.
    #[allow(clippy::too_many_arguments)]
    pub fn prepare_update(
        &self,
        tick: i32,
        tick_current: i32,
        liquidity_delta: i128,
        fee_growth_global0: FeeGrowth,
        fee_growth_global1: FeeGrowth,
        upper: bool,
        max_liquidity: u128,
    ) -> Result<TickUpdate, TickError> {
        let mut info = self.info(tick);

        let liquidity_gross_before = info.liquidity_gross;
        let liquidity_gross_after =
            add_delta(liquidity_gross_before, liquidity_delta).map_err(|err| match err {
                LiquidityError::Underflow => TickError::InsufficientLiquidity(tick),
                LiquidityError::Overflow => TickError::LiquidityOverflow(tick),
            })?;

        if liquidity_gross_after > max_liquidity {
            return Err(TickError::LiquidityOverflow(tick));
        }

        let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);

        if liquidity_gross_before == 0 && tick <= tick_current {
            // all growth so far happened below the tick
            info.fee_growth_outside0 = fee_growth_global0;
            info.fee_growth_outside1 = fee_growth_global1;
        }

        info.liquidity_gross = liquidity_gross_after;
        info.liquidity_net = if upper {
            info.liquidity_net.checked_sub(liquidity_delta)
        } else {
            info.liquidity_net.checked_add(liquidity_delta)
        }
        .ok_or(TickError::NetLiquidityOverflow(tick))?;

        Ok(TickUpdate {
            tick,
            info,
            flipped,
        })
    }

    /// Stores a prepared update and returns whether the tick flipped.
    pub fn commit(&mut self, update: TickUpdate) -> bool {
        self.ticks.insert(update.tick, update.info);
        update.flipped
    }

    /// [`Self::prepare_update`] followed by [`Self::commit`].
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        tick: i32,
        tick_current: i32,
        liquidity_delta: i128,
        fee_growth_global0: FeeGrowth,
        fee_growth_global1: FeeGrowth,
        upper: bool,
        max_liquidity: u128,
    ) -> Result<bool, TickError> {
        let update = self.prepare_update(
            tick,
            tick_current,
            liquidity_delta,
            fee_growth_global0,
            fee_growth_global1,
            upper,
            max_liquidity,
        )?;
        Ok(self.commit(update))
    }

    /// Moves the price across `tick`, flipping its outside fee growth, and returns its net liquidity.
    pub fn cross(
        &mut self,
        tick: i32,
        fee_growth_global0: FeeGrowth,
        fee_growth_global1: FeeGrowth,
    ) -> i128 {
        match self.ticks.get_mut(&tick) {
            Some(info) => {
                info.fee_growth_outside0 = fee_growth_global0.wrapping_sub(info.fee_growth_outside0);
                info.fee_growth_outside1 = fee_growth_global1.wrapping_sub(info.fee_growth_outside1);
                info.liquidity_net
            }
            None => 0,
        }
    }

    pub fn clear(&mut self, tick: i32) {
        self.ticks.remove(&tick);
    }

    /// Fee growth accumulated between `tick_lower` and `tick_upper`.
    #[must_use]
    pub fn fee_growth_inside(
        &self,
        tick_lower: i32,
        tick_upper: i32,
        tick_current: i32,
        fee_growth_global0: FeeGrowth,
        fee_growth_global1: FeeGrowth,
    ) -> (FeeGrowth, FeeGrowth) {
        fee_growth_inside(
            tick_lower,
            &self.info(tick_lower),
            tick_upper,
            &self.info(tick_upper),
            tick_current,
            fee_growth_global0,
            fee_growth_global1,
        )
    }
}

/// Fee growth inside a range given the state of both bounding ticks.
#[must_use]
pub fn fee_growth_inside(
    tick_lower: i32,
    lower: &TickInfo,
    tick_upper: i32,
    upper: &TickInfo,
    tick_current: i32,
    fee_growth_global0: FeeGrowth,
    fee_growth_global1: FeeGrowth,
) -> (FeeGrowth, FeeGrowth) {
    let (below0, below1) = if tick_current >= tick_lower {
        (lower.fee_growth_outside0, lower.fee_growth_outside1)
    } else {
        (
            fee_growth_global0.wrapping_sub(lower.fee_growth_outside0),
            fee_growth_global1.wrapping_sub(lower.fee_growth_outside1),
        )
    };

    let (above0, above1) = if tick_current < tick_upper {
        (upper.fee_growth_outside0, upper.fee_growth_outside1)
    } else {
        (
            fee_growth_global0.wrapping_sub(upper.fee_growth_outside0),
            fee_growth_global1.wrapping_sub(upper.fee_growth_outside1),
        )
    };

    (
        fee_growth_global0.wrapping_sub(below0).wrapping_sub(above0),
        fee_growth_global1.wrapping_sub(below1).wrapping_sub(above1),
    )
}
