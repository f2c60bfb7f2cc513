#![no_std]
extern crate alloc;

pub use ruint::aliases::U256;

pub mod math;
pub mod pool;

pub use pool::{
    config::PoolConfig,
    engine::{PoolEngine, PoolState, SwapOutcome, SwapParams},
    messages::{Query, QueryResponse, Request, Response},
    position::PositionKey,
    PoolError,
};
