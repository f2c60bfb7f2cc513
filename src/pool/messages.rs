use crate::pool::engine::{
    BurnResult, CollectResult, MintResult, PoolEngine, PoolState, SwapOutcome, SwapParams,
};
use crate::pool::position::{PositionInfo, PositionKey};
use crate::pool::tick::TickInfo;
use crate::pool::PoolError;
use ruint::aliases::U256;
use thiserror::Error;
use tracing::trace;

/// A state-changing call. Every request carries a caller chosen `query_id` that is echoed in the
/// matching [`Response`] or [`RequestError`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Request<A> {
    Initialize {
        query_id: u64,
        sqrt_ratio: U256,
    },
    Mint {
        query_id: u64,
        key: PositionKey<A>,
        liquidity: u128,
    },
    /// Burning zero liquidity settles the position's fees.
    Burn {
        query_id: u64,
        key: PositionKey<A>,
        liquidity: u128,
    },
    Collect {
        query_id: u64,
        key: PositionKey<A>,
        amount0_requested: u128,
        amount1_requested: u128,
        recipient: A,
    },
    Swap {
        query_id: u64,
        params: SwapParams,
        recipient: A,
    },
}

impl<A> Request<A> {
    #[must_use]
    pub fn query_id(&self) -> u64 {
        match self {
            Request::Initialize { query_id, .. }
            | Request::Mint { query_id, .. }
            | Request::Burn { query_id, .. }
            | Request::Collect { query_id, .. }
            | Request::Swap { query_id, .. } => *query_id,
        }
    }
}

/// Successful outcome of a [`Request`]. The custody layer settles the amounts with the named
/// owner or recipient.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Response<A> {
    Initialized {
        query_id: u64,
        tick: i32,
    },
    Minted {
        query_id: u64,
        owner: A,
        result: MintResult,
    },
    Burned {
        query_id: u64,
        owner: A,
        result: BurnResult,
    },
    Collected {
        query_id: u64,
        recipient: A,
        result: CollectResult,
    },
    Swapped {
        query_id: u64,
        recipient: A,
        outcome: SwapOutcome,
    },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
#[error("request {query_id} failed: {error}")]
pub struct RequestError {
    pub query_id: u64,
    pub error: PoolError,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Query<A> {
    PoolState,
    Tick(i32),
    Position(PositionKey<A>),
    MintEstimate {
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
    },
    SwapQuote(SwapParams),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueryResponse {
    PoolState(Option<PoolState>),
    Tick(Option<TickInfo>),
    Position(Option<PositionInfo>),
    MintEstimate(MintResult),
    SwapQuote(SwapOutcome),
}

impl<A: Ord + Clone> PoolEngine<A> {
    /// Applies a request to the pool.
    pub fn handle(&mut self, request: Request<A>) -> Result<Response<A>, RequestError> {
        let query_id = request.query_id();
        trace!(query_id, "handling request");

        let response = match request {
            Request::Initialize { sqrt_ratio, .. } => self
                .initialize(sqrt_ratio)
                .map(|tick| Response::Initialized { query_id, tick }),
            Request::Mint { key, liquidity, .. } => {
                let owner = key.owner.clone();
                self.mint(key, liquidity).map(|result| Response::Minted {
                    query_id,
                    owner,
                    result,
                })
            }
            Request::Burn { key, liquidity, .. } => {
                let owner = key.owner.clone();
                self.burn(key, liquidity).map(|result| Response::Burned {
                    query_id,
                    owner,
                    result,
                })
            }
            Request::Collect {
                key,
                amount0_requested,
                amount1_requested,
                recipient,
                ..
            } => self
                .collect(&key, amount0_requested, amount1_requested)
                .map(|result| Response::Collected {
                    query_id,
                    recipient,
                    result,
                }),
            Request::Swap {
                params, recipient, ..
            } => self.swap(params).map(|outcome| Response::Swapped {
                query_id,
                recipient,
                outcome,
            }),
        };

        response.map_err(|error| RequestError { query_id, error })
    }

    /// Answers a read-only query.
    pub fn query(&self, query: &Query<A>) -> Result<QueryResponse, PoolError> {
        Ok(match query {
            Query::PoolState => QueryResponse::PoolState(self.state().copied()),
            Query::Tick(tick) => QueryResponse::Tick(self.tick(*tick).copied()),
            Query::Position(key) => QueryResponse::Position(self.position(key).copied()),
            Query::MintEstimate {
                tick_lower,
                tick_upper,
                liquidity,
            } => QueryResponse::MintEstimate(self.mint_estimate(
                *tick_lower,
                *tick_upper,
                *liquidity,
            )?),
            Query::SwapQuote(params) => QueryResponse::SwapQuote(self.quote_swap(*params)?),
        })
    }
}

/// A bound the caller places on a swap's amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlippageLimit {
    MinOut(u128),
    MaxIn(u128),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum SlippageError {
    #[error("slippage exceeded: got {actual}, limit {limit}")]
    SlippageExceeded { actual: u128, limit: u128 },
}

/// Checks a swap outcome against the caller's bound. The engine itself never rejects a swap for
/// slippage.
pub fn check_slippage(outcome: &SwapOutcome, limit: SlippageLimit) -> Result<(), SlippageError> {
    match limit {
        SlippageLimit::MinOut(min) if outcome.amount_out < min => {
            Err(SlippageError::SlippageExceeded {
                actual: outcome.amount_out,
                limit: min,
            })
        }
        SlippageLimit::MaxIn(max) if outcome.amount_in > max => {
            Err(SlippageError::SlippageExceeded {
                actual: outcome.amount_in,
                limit: max,
            })
        }
        _ => Ok(()),
    }
}

/// Checks that a mint charges no more than the caller is willing to deposit.
pub fn check_mint_slippage(
    result: &MintResult,
    amount0_max: u128,
    amount1_max: u128,
) -> Result<(), SlippageError> {
    if result.amount0 > amount0_max {
        return Err(SlippageError::SlippageExceeded {
            actual: result.amount0,
            limit: amount0_max,
        });
    }
    if result.amount1 > amount1_max {
        return Err(SlippageError::SlippageExceeded {
            actual: result.amount1,
            limit: amount1_max,
        });
    }
    Ok(())
}
