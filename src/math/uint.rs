pub use ruint::aliases::{U256, U512};

/// 2^96, the Q64.96 representation of 1.
pub const Q96: U256 = U256::from_limbs([0, 1 << 32, 0, 0]);
/// 2^128, the Q128.128 representation of 1.
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);

/// Converts a Q64.96 value into an approximate float.
#[must_use]
pub fn u256_to_float_base_x96(x96: U256) -> f64 {
    let [l0, l1, l2, l3] = x96.into_limbs();
    l0 as f64 / 79228162514264337593543950336f64
        + l1 as f64 / 4294967296f64
        + l2 as f64 * 4294967296f64
        + l3 as f64 * 79228162514264337593543950336f64
}

/// Approximate price of token0 in terms of token1 for a Q64.96 square root price.
#[must_use]
pub fn sqrt_ratio_to_price(sqrt_ratio_x96: U256) -> f64 {
    let root = u256_to_float_base_x96(sqrt_ratio_x96);
    root * root
}
