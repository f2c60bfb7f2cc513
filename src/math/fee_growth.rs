use crate::math::uint::{U256, U512};

/// Fees earned per unit of liquidity, as a Q128.128 value that is allowed to wrap.
///
/// Only differences between two snapshots carry meaning, so every operation on this type
/// is modulo 2^256.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeeGrowth(pub U256);

impl FeeGrowth {
    pub const ZERO: Self = Self(U256::ZERO);

    #[must_use]
    pub fn wrapping_add(self, other: Self) -> Self {
        Self(self.0.wrapping_add(other.0))
    }

    #[must_use]
    pub fn wrapping_sub(self, other: Self) -> Self {
        Self(self.0.wrapping_sub(other.0))
    }

    /// Growth contributed by `fee_amount` shared across `liquidity`. Zero when there is no liquidity.
    #[must_use]
    pub fn per_liquidity(fee_amount: u128, liquidity: u128) -> Self {
        if liquidity == 0 {
            return Self::ZERO;
        }
        // fee_amount * 2^128 fits in 256 bits
        Self((U256::from(fee_amount) << 128) / U256::from(liquidity))
    }

    /// Fees owed to `liquidity` for the growth `self`, truncated to 128 bits.
    #[must_use]
    pub fn fees_for(self, liquidity: u128) -> u128 {
        let fees: U512 = (U512::from(self.0) * U512::from(liquidity)) >> 128;
        fees.wrapping_to::<u128>()
    }
}

impl From<U256> for FeeGrowth {
    fn from(value: U256) -> Self {
        Self(value)
    }
}
