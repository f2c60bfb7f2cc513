use crate::math::uint::U256;
use alloc::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Error)]
pub enum BitmapError {
    #[error("tick {tick} is not a multiple of tick spacing {tick_spacing}")]
    Misaligned { tick: i32, tick_spacing: u32 },
}

/// One bit per usable tick, packed into 256-bit words keyed by `compressed >> 8`.
///
/// Empty words are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickBitmap {
    words: BTreeMap<i16, U256>,
}

fn compress(tick: i32, tick_spacing: u32) -> i32 {
    // floor division, so negative ticks land in the word below
    tick.div_euclid(tick_spacing as i32)
}

fn position(compressed: i32) -> (i16, u8) {
    ((compressed >> 8) as i16, (compressed & 0xff) as u8)
}

fn most_significant_bit(x: U256) -> u8 {
    (255 - x.leading_zeros()) as u8
}

fn least_significant_bit(x: U256) -> u8 {
    x.trailing_zeros() as u8
}

impl TickBitmap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn word(&self, word_pos: i16) -> U256 {
        self.words.get(&word_pos).copied().unwrap_or_default()
    }

    /// Toggles the initialized bit of `tick`.
    pub fn flip_tick(&mut self, tick: i32, tick_spacing: u32) -> Result<(), BitmapError> {
        if tick % tick_spacing as i32 != 0 {
            return Err(BitmapError::Misaligned { tick, tick_spacing });
        }

        let (word_pos, bit_pos) = position(tick / tick_spacing as i32);
        let flipped = self.word(word_pos) ^ (U256::ONE << bit_pos as usize);

        if flipped.is_zero() {
            self.words.remove(&word_pos);
        } else {
            self.words.insert(word_pos, flipped);
        }

        Ok(())
    }

    #[must_use]
    pub fn is_initialized(&self, tick: i32, tick_spacing: u32) -> bool {
        if tick % tick_spacing as i32 != 0 {
            return false;
        }
        let (word_pos, bit_pos) = position(tick / tick_spacing as i32);
        self.word(word_pos).bit(bit_pos as usize)
    }

    /// Finds the next initialized tick in the same 256-bit word as `tick`.
    ///
    /// With `lte` the search covers `tick` itself and everything below it in its word, otherwise
    /// everything strictly above it up to the end of the next compressed tick's word. When no bit is
    /// set the word boundary in the search direction is returned with `false`, and callers continue
    /// the search from there.
    #[must_use]
    pub fn next_initialized_tick_within_one_word(
        &self,
        tick: i32,
        tick_spacing: u32,
        lte: bool,
    ) -> (i32, bool) {
        let spacing = tick_spacing as i32;
        let compressed = compress(tick, tick_spacing);

        if lte {
            let (word_pos, bit_pos) = position(compressed);
            // all bits at or below bit_pos
            let mask = U256::MAX >> (255 - bit_pos as usize);
            let masked = self.word(word_pos) & mask;

            if masked.is_zero() {
                ((compressed - bit_pos as i32) * spacing, false)
            } else {
                let distance = bit_pos - most_significant_bit(masked);
                ((compressed - distance as i32) * spacing, true)
            }
        } else {
            let (word_pos, bit_pos) = position(compressed + 1);
            // all bits at or above bit_pos
            let mask = U256::MAX << bit_pos as usize;
            let masked = self.word(word_pos) & mask;

            if masked.is_zero() {
                ((compressed + 1 + (255 - bit_pos) as i32) * spacing, false)
            } else {
                let distance = least_significant_bit(masked) - bit_pos;
                ((compressed + 1 + distance as i32) * spacing, true)
            }
        }
    }

    /// Number of non-empty words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap_with(ticks: &[i32]) -> TickBitmap {
        let mut bitmap = TickBitmap::new();
        for &tick in ticks {
            bitmap.flip_tick(tick, 1).unwrap();
        }
        bitmap
    }

    const TICKS: [i32; 9] = [-200, -55, -4, 70, 78, 84, 139, 240, 535];

    mod flip_tick {
        use super::*;

        #[test]
        fn is_false_at_first() {
            assert!(!TickBitmap::new().is_initialized(1, 1));
        }

        #[test]
        fn is_flipped_by_flip_tick() {
            let bitmap = bitmap_with(&[1]);
            assert!(bitmap.is_initialized(1, 1));
        }

        #[test]
        fn is_flipped_back() {
            let bitmap = bitmap_with(&[1, 1]);
            assert!(!bitmap.is_initialized(1, 1));
            assert_eq!(bitmap.word_count(), 0);
        }

        #[test]
        fn is_not_changed_by_another_flip_to_a_different_tick() {
            let bitmap = bitmap_with(&[2]);
            assert!(!bitmap.is_initialized(1, 1));
        }

        #[test]
        fn is_not_changed_by_another_flip_to_a_different_tick_on_another_word() {
            let bitmap = bitmap_with(&[1 + 256]);
            assert!(bitmap.is_initialized(257, 1));
            assert!(!bitmap.is_initialized(1, 1));
        }

        #[test]
        fn negative_ticks() {
            let bitmap = bitmap_with(&[-230, -259]);
            assert!(bitmap.is_initialized(-230, 1));
            assert!(bitmap.is_initialized(-259, 1));
            assert!(!bitmap.is_initialized(-229, 1));
            assert!(!bitmap.is_initialized(-231, 1));
            assert!(!bitmap.is_initialized(-258, 1));
            assert!(!bitmap.is_initialized(-260, 1));
            assert_eq!(bitmap.word_count(), 2);
        }

        #[test]
        fn misaligned() {
            let mut bitmap = TickBitmap::new();
            assert_eq!(
                bitmap.flip_tick(15, 10),
                Err(BitmapError::Misaligned {
                    tick: 15,
                    tick_spacing: 10
                })
            );
            assert_eq!(
                bitmap.flip_tick(-5, 10),
                Err(BitmapError::Misaligned {
                    tick: -5,
                    tick_spacing: 10
                })
            );
            assert_eq!(bitmap, TickBitmap::new());
        }

        #[test]
        fn spacing() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(-60, 60).unwrap();
            bitmap.flip_tick(120, 60).unwrap();
            assert!(bitmap.is_initialized(-60, 60));
            assert!(bitmap.is_initialized(120, 60));
            assert!(!bitmap.is_initialized(60, 60));
            assert!(!bitmap.is_initialized(-59, 60));
        }
    }

    mod next_initialized_tick_within_one_word_greater_than {
        use super::*;

        #[test]
        fn returns_tick_to_right_if_at_initialized_tick() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(78, 1, false),
                (84, true)
            );
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(-55, 1, false),
                (-4, true)
            );
        }

        #[test]
        fn returns_the_tick_directly_to_the_right() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(77, 1, false),
                (78, true)
            );
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(-56, 1, false),
                (-55, true)
            );
        }

        #[test]
        fn returns_the_next_words_initialized_tick_if_on_the_right_boundary() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(255, 1, false),
                (511, false)
            );
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(-257, 1, false),
                (-200, true)
            );
        }

        #[test]
        fn does_not_exceed_boundary() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(508, 1, false),
                (511, false)
            );
        }

        #[test]
        fn skips_entire_word() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(255, 1, false),
                (511, false)
            );
        }

        #[test]
        fn skips_half_word() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(383, 1, false),
                (511, false)
            );
        }

        #[test]
        fn past_last_initialized_tick() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(536, 1, false),
                (767, false)
            );
        }

        #[test]
        fn after_flipping_another_tick() {
            let mut bitmap = bitmap_with(&TICKS);
            bitmap.flip_tick(340, 1).unwrap();
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(328, 1, false),
                (340, true)
            );
        }
    }

    mod next_initialized_tick_within_one_word_less_than_or_equal {
        use super::*;

        #[test]
        fn returns_same_tick_if_initialized() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(78, 1, true),
                (78, true)
            );
        }

        #[test]
        fn returns_tick_directly_to_the_left_if_not_initialized() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(79, 1, true),
                (78, true)
            );
        }

        #[test]
        fn will_not_exceed_the_word_boundary() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(258, 1, true),
                (256, false)
            );
        }

        #[test]
        fn at_the_word_boundary() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(256, 1, true),
                (256, false)
            );
        }

        #[test]
        fn word_boundary_less_one() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(72, 1, true),
                (70, true)
            );
        }

        #[test]
        fn word_boundary_negative() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(-257, 1, true),
                (-512, false)
            );
        }

        #[test]
        fn entire_empty_word() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(1023, 1, true),
                (768, false)
            );
        }

        #[test]
        fn halfway_through_empty_word() {
            let bitmap = bitmap_with(&TICKS);
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(900, 1, true),
                (768, false)
            );
        }

        #[test]
        fn boundary_is_initialized() {
            let mut bitmap = bitmap_with(&TICKS);
            bitmap.flip_tick(329, 1).unwrap();
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(456, 1, true),
                (329, true)
            );
        }
    }

    mod spacing {
        use super::*;

        #[test]
        fn negative_tick_not_on_spacing_rounds_down() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(-120, 60).unwrap();
            // -61 compresses to -2, which is the word holding -120
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(-61, 60, true),
                (-120, true)
            );
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(-180, 60, false),
                (-120, true)
            );
        }

        #[test]
        fn boundaries_scale_with_spacing() {
            let bitmap = TickBitmap::new();
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(0, 60, false),
                (255 * 60, false)
            );
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(0, 60, true),
                (0, false)
            );
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(-1, 60, true),
                (-256 * 60, false)
            );
        }
    }
}
