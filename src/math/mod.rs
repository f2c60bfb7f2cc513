pub mod delta;
pub mod fee_growth;
pub mod liquidity;
pub mod muldiv;
pub mod sqrt_ratio;
pub mod swap;
pub mod tick;
pub mod uint;
