//! Precomputed 8-bit lookup tables (component C2).
//!
//! Two tables, built once and shared process-wide:
//! - `word_sum[b]`: the excess contributed by byte `b` (range -8..=8).
//! - `near_fwd_pos[(d+8)*256 + b]`: the first bit position within byte `b`
//!   (0-indexed, LSB first) at which the running excess reaches `d`, or `8`
//!   if no such position exists.
//!
//! Bit order matches [`crate::bits::BitVector::word8`]: bit `p` of the byte
//! is the `p`-th bit of the window, increasing with bit position.
//!
//! §9's Open Question about `near_fwd_pos` indexing is resolved here as
//! `(desired + 8) * 256 + byte`, not `desired + (8 << 8)`.

use std::sync::LazyLock;

const D_RANGE: usize = 17; // d in -8..=8 inclusive
const NEAR_FWD_POS_LEN: usize = D_RANGE * 256;

/// Sentinel stored in `near_fwd_pos` meaning "not reached within this byte".
pub(crate) const NOT_FOUND: u8 = 8;

pub(crate) struct LookupTables {
    pub(crate) word_sum: [i8; 256],
    pub(crate) near_fwd_pos: [u8; NEAR_FWD_POS_LEN],
}

impl LookupTables {
    fn build() -> Self {
        let mut word_sum = [0i8; 256];
        let mut near_fwd_pos = [NOT_FOUND; NEAR_FWD_POS_LEN];

        for b in 0..256usize {
            let mut excess: i32 = 0;
            for p in 0..8usize {
                let bit = (b >> p) & 1;
                excess += 2 * bit as i32 - 1;
                if (-8..=8).contains(&excess) {
                    let idx = near_fwd_pos_index(excess, b);
                    if near_fwd_pos[idx] == NOT_FOUND {
                        near_fwd_pos[idx] = p as u8;
                    }
                }
            }
            word_sum[b] = excess as i8;
        }

        Self {
            word_sum,
            near_fwd_pos,
        }
    }

    /// First bit position in byte `b` where the running excess (starting
    /// from 0) reaches `d`, or `None` if the byte never reaches it.
    #[inline]
    pub(crate) fn near_fwd_pos(&self, d: i32, b: u8) -> Option<usize> {
        if !(-8..=8).contains(&d) {
            return None;
        }
        let x = self.near_fwd_pos[near_fwd_pos_index(d, b as usize)];
        (x < NOT_FOUND).then_some(x as usize)
    }

    #[inline]
    pub(crate) fn word_sum(&self, b: u8) -> i32 {
        i32::from(self.word_sum[b as usize])
    }
}

#[inline]
fn near_fwd_pos_index(d: i32, byte: usize) -> usize {
    ((d + 8) as usize) * 256 + byte
}

pub(crate) static TABLES: LazyLock<LookupTables> = LazyLock::new(LookupTables::build);
