use crate::math::uint::U256;
use thiserror::Error;

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = 887272;

/// `to_sqrt_ratio(MIN_TICK)`
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4295128739, 0, 0, 0]);
/// `to_sqrt_ratio(MAX_TICK)`
pub const MAX_SQRT_RATIO: U256 = U256::from_limbs([
    6743328256752651558,
    17280870778742802505,
    4294805859,
    0,
]);

// sqrt(1.0001)^-(2^i) in Q128.128, one entry per bit of the absolute tick
const MASKS: [U256; 20] = [
    U256::from_limbs([12262481743371124737, 18445821805675392311, 0, 0]),
    U256::from_limbs([6459403834229662010, 18444899583751176498, 0, 0]),
    U256::from_limbs([17226890335427755468, 18443055278223354162, 0, 0]),
    U256::from_limbs([2032852871939366096, 18439367220385604838, 0, 0]),
    U256::from_limbs([14545316742740207172, 18431993317065449817, 0, 0]),
    U256::from_limbs([5129152022828963008, 18417254355718160513, 0, 0]),
    U256::from_limbs([4894419605888772193, 18387811781193591352, 0, 0]),
    U256::from_limbs([1280255884321894483, 18329067761203520168, 0, 0]),
    U256::from_limbs([15924666964335305636, 18212142134806087854, 0, 0]),
    U256::from_limbs([8010504389359918676, 17980523815641551639, 0, 0]),
    U256::from_limbs([10668036004952895731, 17526086738831147013, 0, 0]),
    U256::from_limbs([4878133418470705625, 16651378430235024244, 0, 0]),
    U256::from_limbs([9537173718739605541, 15030750278693429944, 0, 0]),
    U256::from_limbs([9972618978014552549, 12247334978882834399, 0, 0]),
    U256::from_limbs([10428997489610666743, 8131365268884726200, 0, 0]),
    U256::from_limbs([9305304367709015974, 3584323654723342297, 0, 0]),
    U256::from_limbs([14301143598189091785, 696457651847595233, 0, 0]),
    U256::from_limbs([7393154844743099908, 26294789957452057, 0, 0]),
    U256::from_limbs([2209338891292245656, 37481735321082, 0, 0]),
    U256::from_limbs([10518117631919034274, 76158723, 0, 0]),
];

const ONE_X128: U256 = U256::from_limbs([0, 0, 1, 0]);

// 2^64 / log2(sqrt(1.0001)), scales a Q64.64 log2 into a Q128.128 tick
const LOG_SQRT_10001_MULTIPLIER: U256 = U256::from_limbs([11745905768312294533, 13863, 0, 0]);
// error bounds of the log2 approximation, in Q128.128 ticks
const TICK_LOW_ERROR: U256 = U256::from_limbs([6552757943157144234, 184476617836266586, 0, 0]);
const TICK_HIGH_ERROR: U256 = U256::from_limbs([
    4998474450511881007,
    15793544031827761793,
    0,
    0,
]);

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum TickMathError {
    #[error("tick {0} is outside [-887272, 887272]")]
    TickOutOfRange(i32),
    #[error("sqrt ratio is outside [MIN_SQRT_RATIO, MAX_SQRT_RATIO]")]
    SqrtRatioOutOfRange,
}

/// Returns the Q64.96 square root price `sqrt(1.0001^tick)`, rounded up.
pub fn to_sqrt_ratio(tick: i32) -> Result<U256, TickMathError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(TickMathError::TickOutOfRange(tick));
    }

    let tick_abs = tick.unsigned_abs();

    let mut ratio = ONE_X128;

    for (i, mask) in MASKS.iter().enumerate() {
        if (tick_abs & (1 << i)) != 0 {
            ratio = (ratio * mask) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 to Q64.96, rounding up so that to_tick stays a left inverse
    let rounded = if (ratio & U256::from(u32::MAX)).is_zero() {
        U256::ZERO
    } else {
        U256::ONE
    };

    Ok((ratio >> 32) + rounded)
}

// floor(value / 2^128) for a value given as sign and magnitude
fn floor_shr_128(negative: bool, magnitude: U256) -> i32 {
    if negative {
        let ceil: U256 = (magnitude + (ONE_X128 - U256::ONE)) >> 128;
        -(ceil.as_limbs()[0] as i32)
    } else {
        (magnitude >> 128usize).as_limbs()[0] as i32
    }
}

/// Returns the greatest tick whose square root price is less than or equal to `sqrt_ratio`.
pub fn to_tick(sqrt_ratio: U256) -> Result<i32, TickMathError> {
    if sqrt_ratio < MIN_SQRT_RATIO || sqrt_ratio > MAX_SQRT_RATIO {
        return Err(TickMathError::SqrtRatioOutOfRange);
    }

    if sqrt_ratio == MAX_SQRT_RATIO {
        return Ok(MAX_TICK);
    }

    let ratio: U256 = sqrt_ratio << 32;
    let msb = ratio.bit_len() - 1;

    let mut r = if msb >= 128 {
        ratio >> (msb - 127)
    } else {
        ratio << (127 - msb)
    };

    // Q64.64 log2 of the Q128.128 ratio
    let mut log_2: i128 = (msb as i128 - 128) << 64;

    for shift in (50..=63).rev() {
        r = (r * r) >> 127;
        let f: U256 = r >> 128;
        let bit = f.as_limbs()[0];
        log_2 |= (bit as i128) << shift;
        r >>= bit as usize;
    }

    let negative = log_2 < 0;
    let log_sqrt_10001 = U256::from(log_2.unsigned_abs()) * LOG_SQRT_10001_MULTIPLIER;

    let tick_low = if negative {
        floor_shr_128(true, log_sqrt_10001 + TICK_LOW_ERROR)
    } else if log_sqrt_10001 >= TICK_LOW_ERROR {
        floor_shr_128(false, log_sqrt_10001 - TICK_LOW_ERROR)
    } else {
        floor_shr_128(true, TICK_LOW_ERROR - log_sqrt_10001)
    };

    let tick_high = if !negative {
        floor_shr_128(false, log_sqrt_10001 + TICK_HIGH_ERROR)
    } else if log_sqrt_10001 > TICK_HIGH_ERROR {
        floor_shr_128(true, log_sqrt_10001 - TICK_HIGH_ERROR)
    } else {
        floor_shr_128(false, TICK_HIGH_ERROR - log_sqrt_10001)
    };

    if tick_low == tick_high {
        return Ok(tick_low);
    }

    if to_sqrt_ratio(tick_high)? <= sqrt_ratio {
        Ok(tick_high)
    } else {
        Ok(tick_low)
    }
}

/// Lowest tick that is a multiple of `tick_spacing`.
#[must_use]
pub fn min_usable_tick(tick_spacing: u32) -> i32 {
    let spacing = tick_spacing as i32;
    (MIN_TICK / spacing) * spacing
}

/// Highest tick that is a multiple of `tick_spacing`.
#[must_use]
pub fn max_usable_tick(tick_spacing: u32) -> i32 {
    let spacing = tick_spacing as i32;
    (MAX_TICK / spacing) * spacing
}
