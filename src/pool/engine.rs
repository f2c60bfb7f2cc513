use crate::math::delta::{amount0_delta, amount1_delta};
use crate::math::fee_growth::FeeGrowth;
use crate::math::liquidity::{add_delta, LiquidityError};
use crate::math::swap::compute_step;
use crate::math::tick::{
    to_sqrt_ratio, to_tick, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK,
};
use crate::pool::bitmap::TickBitmap;
use crate::pool::config::PoolConfig;
use crate::pool::position::{PositionInfo, PositionKey};
use crate::pool::tick::{fee_growth_inside, TickInfo, TickRegistry, TickUpdate};
use crate::pool::PoolError;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use derive_more::{Add, AddAssign};
use ruint::aliases::U256;
use tracing::{debug, trace};

/// Price, liquidity and fee accumulators of an initialized pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolState {
    /// Current Q64.96 square root price.
    pub sqrt_ratio: U256,
    /// Greatest tick whose price is at or below `sqrt_ratio`.
    pub tick: i32,
    /// Liquidity of all positions whose range contains `tick`.
    pub liquidity: u128,
    pub fee_growth_global0: FeeGrowth,
    pub fee_growth_global1: FeeGrowth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapParams {
    /// Token0 in, price moving down.
    pub zero_for_one: bool,
    /// Exact input if positive, exact output if negative.
    pub amount_specified: i128,
    /// Price at which the swap stops. Defaults to just inside the price bounds.
    pub sqrt_ratio_limit: Option<U256>,
}

/// Work done by a swap.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Add, AddAssign)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapResources {
    /// Number of swap steps computed.
    pub steps: u32,
    /// Number of initialized ticks crossed.
    pub initialized_ticks_crossed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapOutcome {
    /// Change in the pool's token0 balance, positive when the pool receives.
    pub amount0: i128,
    /// Change in the pool's token1 balance, positive when the pool receives.
    pub amount1: i128,
    /// Total input including fees.
    pub amount_in: u128,
    pub amount_out: u128,
    pub fee_amount: u128,
    pub state_after: PoolState,
    pub resources: SwapResources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MintResult {
    pub amount0: u128,
    pub amount1: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BurnResult {
    /// Token0 released by the removed liquidity, credited to the position.
    pub amount0: u128,
    pub amount1: u128,
    /// Fees settled into the position by this burn.
    pub fees_owed0: u128,
    pub fees_owed1: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollectResult {
    pub amount0: u128,
    pub amount1: u128,
}

// fee growth values at the moment a tick is crossed
#[derive(Debug, Clone, Copy)]
struct Crossing {
    tick: i32,
    fee_growth_global0: FeeGrowth,
    fee_growth_global1: FeeGrowth,
}

struct PlannedSwap {
    outcome: SwapOutcome,
    crossings: Vec<Crossing>,
}

struct ModifiedPosition {
    position: PositionInfo,
    amount0: u128,
    amount1: u128,
    fees0: u128,
    fees1: u128,
}

/// A single concentrated liquidity pool.
///
/// Every mutating method either applies completely or returns an error without touching any
/// state. Positions are keyed by an owner identity `A` chosen by the embedding system.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "A: serde::Serialize",
        deserialize = "A: serde::Deserialize<'de> + Ord"
    ))
)]
pub struct PoolEngine<A> {
    config: PoolConfig,
    max_liquidity_per_tick: u128,
    state: Option<PoolState>,
    ticks: TickRegistry,
    bitmap: TickBitmap,
    positions: BTreeMap<PositionKey<A>, PositionInfo>,
}

impl<A: Ord + Clone> PoolEngine<A> {
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;

        Ok(Self {
            config,
            max_liquidity_per_tick: config.max_liquidity_per_tick(),
            state: None,
            ticks: TickRegistry::new(),
            bitmap: TickBitmap::new(),
            positions: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> PoolConfig {
        self.config
    }

    #[must_use]
    pub fn max_liquidity_per_tick(&self) -> u128 {
        self.max_liquidity_per_tick
    }

    /// Current state, `None` until [`Self::initialize`] is called.
    #[must_use]
    pub fn state(&self) -> Option<&PoolState> {
        self.state.as_ref()
    }

    fn initialized_state(&self) -> Result<PoolState, PoolError> {
        self.state.ok_or(PoolError::Uninitialized)
    }

    #[must_use]
    pub fn tick(&self, tick: i32) -> Option<&TickInfo> {
        self.ticks.get(tick)
    }

    #[must_use]
    pub fn ticks(&self) -> &TickRegistry {
        &self.ticks
    }

    #[must_use]
    pub fn bitmap(&self) -> &TickBitmap {
        &self.bitmap
    }

    #[must_use]
    pub fn position(&self, key: &PositionKey<A>) -> Option<&PositionInfo> {
        self.positions.get(key)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&PositionKey<A>, &PositionInfo)> {
        self.positions.iter()
    }

    /// Sets the starting price. Returns the starting tick.
    pub fn initialize(&mut self, sqrt_ratio: U256) -> Result<i32, PoolError> {
        if self.state.is_some() {
            return Err(PoolError::AlreadyInitialized);
        }

        let tick = to_tick(sqrt_ratio)?;

        self.state = Some(PoolState {
            sqrt_ratio,
            tick,
            liquidity: 0,
            fee_growth_global0: FeeGrowth::ZERO,
            fee_growth_global1: FeeGrowth::ZERO,
        });

        debug!(sqrt_ratio = ?sqrt_ratio, tick, "initialized pool");

        Ok(tick)
    }

    fn check_ticks(&self, tick_lower: i32, tick_upper: i32) -> Result<(), PoolError> {
        let spacing = self.config.tick_spacing as i32;

        if tick_lower >= tick_upper
            || tick_lower < self.config.min_tick()
            || tick_upper > self.config.max_tick()
            || tick_lower % spacing != 0
            || tick_upper % spacing != 0
        {
            return Err(PoolError::InvalidRange {
                tick_lower,
                tick_upper,
            });
        }

        Ok(())
    }

    // token amounts represented by `liquidity` over the range at the current price
    fn amounts_for(
        state: &PoolState,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
        round_up: bool,
    ) -> Result<(u128, u128), PoolError> {
        let sqrt_ratio_lower = to_sqrt_ratio(tick_lower)?;
        let sqrt_ratio_upper = to_sqrt_ratio(tick_upper)?;

        Ok(if state.tick < tick_lower {
            (
                amount0_delta(sqrt_ratio_lower, sqrt_ratio_upper, liquidity, round_up)?,
                0,
            )
        } else if state.tick < tick_upper {
            (
                amount0_delta(state.sqrt_ratio, sqrt_ratio_upper, liquidity, round_up)?,
                amount1_delta(sqrt_ratio_lower, state.sqrt_ratio, liquidity, round_up)?,
            )
        } else {
            (
                0,
                amount1_delta(sqrt_ratio_lower, sqrt_ratio_upper, liquidity, round_up)?,
            )
        })
    }

    /// Fee growth inside a range at the current price.
    pub fn fee_growth_inside(
        &self,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<(FeeGrowth, FeeGrowth), PoolError> {
        let state = self.initialized_state()?;
        Ok(self.ticks.fee_growth_inside(
            tick_lower,
            tick_upper,
            state.tick,
            state.fee_growth_global0,
            state.fee_growth_global1,
        ))
    }

    /// Amounts a mint of `liquidity` into the range would charge, without minting.
    pub fn mint_estimate(
        &self,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
    ) -> Result<MintResult, PoolError> {
        let state = self.initialized_state()?;
        self.check_ticks(tick_lower, tick_upper)?;

        let (amount0, amount1) = Self::amounts_for(&state, tick_lower, tick_upper, liquidity, true)?;

        Ok(MintResult { amount0, amount1 })
    }

    fn modify_position(
        &mut self,
        key: &PositionKey<A>,
        liquidity_delta: i128,
    ) -> Result<ModifiedPosition, PoolError> {
        let mut state = self.initialized_state()?;
        self.check_ticks(key.tick_lower, key.tick_upper)?;

        let position = match self.positions.get(key) {
            Some(position) => *position,
            None if liquidity_delta > 0 => PositionInfo::default(),
            None => return Err(PoolError::PositionNotFound),
        };

        let tick_updates: Option<(TickUpdate, TickUpdate)> = if liquidity_delta != 0 {
            let lower = self.ticks.prepare_update(
                key.tick_lower,
                state.tick,
                liquidity_delta,
                state.fee_growth_global0,
                state.fee_growth_global1,
                false,
                self.max_liquidity_per_tick,
            )?;
            let upper = self.ticks.prepare_update(
                key.tick_upper,
                state.tick,
                liquidity_delta,
                state.fee_growth_global0,
                state.fee_growth_global1,
                true,
                self.max_liquidity_per_tick,
            )?;
            Some((lower, upper))
        } else {
            None
        };

        let (lower_info, upper_info) = match &tick_updates {
            Some((lower, upper)) => (lower.info, upper.info),
            None => (
                self.ticks.get(key.tick_lower).copied().unwrap_or_default(),
                self.ticks.get(key.tick_upper).copied().unwrap_or_default(),
            ),
        };

        let (inside0, inside1) = fee_growth_inside(
            key.tick_lower,
            &lower_info,
            key.tick_upper,
            &upper_info,
            state.tick,
            state.fee_growth_global0,
            state.fee_growth_global1,
        );

        let update = position.updated(liquidity_delta, inside0, inside1)?;

        let (amount0, amount1) = if liquidity_delta == 0 {
            (0, 0)
        } else {
            Self::amounts_for(
                &state,
                key.tick_lower,
                key.tick_upper,
                liquidity_delta.unsigned_abs(),
                liquidity_delta > 0,
            )?
        };

        if liquidity_delta != 0 && key.tick_lower <= state.tick && state.tick < key.tick_upper {
            state.liquidity = add_delta(state.liquidity, liquidity_delta)?;
        }

        // everything below is infallible for aligned ticks
        if let Some((lower, upper)) = tick_updates {
            for tick_update in [lower, upper] {
                if self.ticks.commit(tick_update) {
                    self.bitmap
                        .flip_tick(tick_update.tick, self.config.tick_spacing)?;
                    if liquidity_delta < 0 {
                        self.ticks.clear(tick_update.tick);
                    }
                }
            }
        }
        self.state = Some(state);

        Ok(ModifiedPosition {
            position: update.info,
            amount0,
            amount1,
            fees0: update.fees0,
            fees1: update.fees1,
        })
    }

    fn store_position(&mut self, key: PositionKey<A>, position: PositionInfo) {
        if position.is_empty() {
            self.positions.remove(&key);
        } else {
            self.positions.insert(key, position);
        }
    }

    /// Adds `liquidity` to the position. Returns the amounts the owner must pay, rounded up.
    pub fn mint(&mut self, key: PositionKey<A>, liquidity: u128) -> Result<MintResult, PoolError> {
        if liquidity == 0 {
            return Err(PoolError::ZeroLiquidity);
        }
        let liquidity_delta =
            i128::try_from(liquidity).map_err(|_| PoolError::Liquidity(LiquidityError::Overflow))?;

        let modified = self.modify_position(&key, liquidity_delta)?;

        debug!(
            tick_lower = key.tick_lower,
            tick_upper = key.tick_upper,
            index = key.index,
            liquidity,
            amount0 = modified.amount0,
            amount1 = modified.amount1,
            "minted"
        );

        self.store_position(key, modified.position);

        Ok(MintResult {
            amount0: modified.amount0,
            amount1: modified.amount1,
        })
    }

    /// Removes `liquidity` from the position, crediting the released amounts (rounded down) and
    /// accrued fees to its owed tokens. Burning zero only settles fees.
    pub fn burn(&mut self, key: PositionKey<A>, liquidity: u128) -> Result<BurnResult, PoolError> {
        let liquidity_delta = i128::try_from(liquidity)
            .map(|liquidity| -liquidity)
            .map_err(|_| PoolError::InsufficientLiquidity)?;

        let modified = self.modify_position(&key, liquidity_delta)?;

        let mut position = modified.position;
        position.tokens_owed0 = position.tokens_owed0.wrapping_add(modified.amount0);
        position.tokens_owed1 = position.tokens_owed1.wrapping_add(modified.amount1);

        debug!(
            tick_lower = key.tick_lower,
            tick_upper = key.tick_upper,
            index = key.index,
            liquidity,
            amount0 = modified.amount0,
            amount1 = modified.amount1,
            fees0 = modified.fees0,
            fees1 = modified.fees1,
            "burned"
        );

        self.store_position(key, position);

        Ok(BurnResult {
            amount0: modified.amount0,
            amount1: modified.amount1,
            fees_owed0: modified.fees0,
            fees_owed1: modified.fees1,
        })
    }

    /// Withdraws up to the requested amounts from the position's owed tokens.
    pub fn collect(
        &mut self,
        key: &PositionKey<A>,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<CollectResult, PoolError> {
        let position = self
            .positions
            .get_mut(key)
            .ok_or(PoolError::PositionNotFound)?;

        let amount0 = amount0_requested.min(position.tokens_owed0);
        let amount1 = amount1_requested.min(position.tokens_owed1);
        position.tokens_owed0 -= amount0;
        position.tokens_owed1 -= amount1;

        if position.is_empty() {
            self.positions.remove(key);
        }

        debug!(
            tick_lower = key.tick_lower,
            tick_upper = key.tick_upper,
            index = key.index,
            amount0,
            amount1,
            "collected"
        );

        Ok(CollectResult { amount0, amount1 })
    }

    fn plan_swap(&self, params: SwapParams) -> Result<PlannedSwap, PoolError> {
        let state = self.initialized_state()?;

        if params.amount_specified == 0 {
            return Err(PoolError::ZeroAmount);
        }

        let zero_for_one = params.zero_for_one;
        let sqrt_ratio_limit = params.sqrt_ratio_limit.unwrap_or(if zero_for_one {
            MIN_SQRT_RATIO + U256::ONE
        } else {
            MAX_SQRT_RATIO - U256::ONE
        });

        let valid_limit = if zero_for_one {
            sqrt_ratio_limit < state.sqrt_ratio && sqrt_ratio_limit > MIN_SQRT_RATIO
        } else {
            sqrt_ratio_limit > state.sqrt_ratio && sqrt_ratio_limit < MAX_SQRT_RATIO
        };
        if !valid_limit {
            return Err(PoolError::InvalidPriceLimit);
        }

        let exact_in = params.amount_specified > 0;
        let mut amount_remaining = params.amount_specified;
        let mut sqrt_ratio = state.sqrt_ratio;
        let mut tick = state.tick;
        let mut liquidity = state.liquidity;
        let mut fee_growth_global = if zero_for_one {
            state.fee_growth_global0
        } else {
            state.fee_growth_global1
        };

        let mut amount_in: u128 = 0;
        let mut amount_out: u128 = 0;
        let mut fee_amount: u128 = 0;
        let mut resources = SwapResources::default();
        let mut crossings = Vec::new();

        while amount_remaining != 0 && sqrt_ratio != sqrt_ratio_limit {
            let step_start = sqrt_ratio;

            let (tick_next, initialized) = self.bitmap.next_initialized_tick_within_one_word(
                tick,
                self.config.tick_spacing,
                zero_for_one,
            );
            let tick_next = tick_next.clamp(MIN_TICK, MAX_TICK);
            let sqrt_ratio_next_tick = to_sqrt_ratio(tick_next)?;

            let step_target = if zero_for_one {
                sqrt_ratio_next_tick.max(sqrt_ratio_limit)
            } else {
                sqrt_ratio_next_tick.min(sqrt_ratio_limit)
            };

            let step = compute_step(
                sqrt_ratio,
                step_target,
                liquidity,
                amount_remaining,
                self.config.fee,
            )?;
            sqrt_ratio = step.sqrt_ratio_next;

            let step_in = step
                .amount_in
                .checked_add(step.fee_amount)
                .ok_or(PoolError::AmountOverflow)?;

            // exact input consumes at most what remains, exact output receives at most what remains
            amount_remaining = if exact_in {
                i128::try_from(step_in)
                    .ok()
                    .and_then(|consumed| amount_remaining.checked_sub(consumed))
            } else {
                i128::try_from(step.amount_out)
                    .ok()
                    .and_then(|received| amount_remaining.checked_add(received))
            }
            .ok_or(PoolError::AmountOverflow)?;

            amount_in = amount_in
                .checked_add(step_in)
                .ok_or(PoolError::AmountOverflow)?;
            amount_out = amount_out
                .checked_add(step.amount_out)
                .ok_or(PoolError::AmountOverflow)?;
            fee_amount = fee_amount
                .checked_add(step.fee_amount)
                .ok_or(PoolError::AmountOverflow)?;

            // fees earned with no active liquidity are not attributed to anyone
            fee_growth_global =
                fee_growth_global.wrapping_add(FeeGrowth::per_liquidity(step.fee_amount, liquidity));

            resources += SwapResources {
                steps: 1,
                initialized_ticks_crossed: 0,
            };

            trace!(
                tick_next,
                initialized,
                sqrt_ratio = ?sqrt_ratio,
                amount_in = step.amount_in,
                amount_out = step.amount_out,
                fee_amount = step.fee_amount,
                "swap step"
            );

            if sqrt_ratio == sqrt_ratio_next_tick {
                if initialized {
                    let (fee_growth_global0, fee_growth_global1) = if zero_for_one {
                        (fee_growth_global, state.fee_growth_global1)
                    } else {
                        (state.fee_growth_global0, fee_growth_global)
                    };

                    let liquidity_net = self.ticks.get(tick_next).map_or(0, |t| t.liquidity_net);
                    let liquidity_delta = if zero_for_one {
                        liquidity_net
                            .checked_neg()
                            .ok_or(PoolError::Liquidity(LiquidityError::Overflow))?
                    } else {
                        liquidity_net
                    };
                    liquidity = add_delta(liquidity, liquidity_delta)?;

                    crossings.push(Crossing {
                        tick: tick_next,
                        fee_growth_global0,
                        fee_growth_global1,
                    });
                    resources += SwapResources {
                        steps: 0,
                        initialized_ticks_crossed: 1,
                    };

                    trace!(tick = tick_next, liquidity, "crossed tick");
                }

                tick = if zero_for_one { tick_next - 1 } else { tick_next };
            } else if sqrt_ratio != step_start {
                tick = to_tick(sqrt_ratio)?;
            }
        }

        let signed_in = i128::try_from(amount_in).map_err(|_| PoolError::AmountOverflow)?;
        let signed_out = i128::try_from(amount_out).map_err(|_| PoolError::AmountOverflow)?;
        let (amount0, amount1) = if zero_for_one {
            (signed_in, -signed_out)
        } else {
            (-signed_out, signed_in)
        };

        let state_after = PoolState {
            sqrt_ratio,
            tick,
            liquidity,
            fee_growth_global0: if zero_for_one {
                fee_growth_global
            } else {
                state.fee_growth_global0
            },
            fee_growth_global1: if zero_for_one {
                state.fee_growth_global1
            } else {
                fee_growth_global
            },
        };

        Ok(PlannedSwap {
            outcome: SwapOutcome {
                amount0,
                amount1,
                amount_in,
                amount_out,
                fee_amount,
                state_after,
                resources,
            },
            crossings,
        })
    }

    /// Computes the outcome of a swap without applying it. [`Self::swap`] with the same
    /// parameters on the same state applies exactly this outcome.
    pub fn quote_swap(&self, params: SwapParams) -> Result<SwapOutcome, PoolError> {
        Ok(self.plan_swap(params)?.outcome)
    }

    /// Swaps against the pool's liquidity, walking the price across initialized ticks until the
    /// specified amount is used up or the price limit is reached.
    pub fn swap(&mut self, params: SwapParams) -> Result<SwapOutcome, PoolError> {
        let PlannedSwap { outcome, crossings } = self.plan_swap(params)?;

        for crossing in &crossings {
            self.ticks.cross(
                crossing.tick,
                crossing.fee_growth_global0,
                crossing.fee_growth_global1,
            );
        }
        self.state = Some(outcome.state_after);

        debug!(
            zero_for_one = params.zero_for_one,
            amount_specified = params.amount_specified,
            amount0 = outcome.amount0,
            amount1 = outcome.amount1,
            tick = outcome.state_after.tick,
            liquidity = outcome.state_after.liquidity,
            ticks_crossed = outcome.resources.initialized_ticks_crossed,
            "swapped"
        );

        Ok(outcome)
    }
}
