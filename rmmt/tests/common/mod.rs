//! Shared helpers for the integration test suite: deterministic random
//! balanced sequences and brute-force oracles independent of the rmMt itself.

use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};
use rmmt::BitVector;

pub fn rng_from_seed(seed: u8) -> ChaCha8Rng {
    ChaCha8Rng::from_seed([seed; 32])
}

/// A uniformly random balanced parenthesis sequence of length `n` (even),
/// built via the cycle lemma: shuffle `n/2` opens and `n/2` closes, then
/// rotate to the unique starting point with non-negative prefix excess
/// throughout.
pub fn random_balanced(n: usize, rng: &mut impl RngCore) -> Vec<bool> {
    assert_eq!(n % 2, 0, "balanced sequences have even length");
    let mut bits = vec![true; n / 2];
    bits.extend(std::iter::repeat_n(false, n / 2));

    for i in (1..bits.len()).rev() {
        let j = (rng.next_u64() % (i as u64 + 1)) as usize;
        bits.swap(i, j);
    }

    let mut excess: i64 = 0;
    let mut min_excess: i64 = 0;
    let mut min_at = 0usize;
    for (idx, &b) in bits.iter().enumerate() {
        excess += if b { 1 } else { -1 };
        if excess < min_excess {
            min_excess = excess;
            min_at = idx + 1;
        }
    }
    bits.rotate_left(min_at);
    bits
}

pub fn bitvector_from_bools(bits: &[bool]) -> BitVector {
    let mut bv = BitVector::new(bits.len());
    for (i, &b) in bits.iter().enumerate() {
        bv.set(i, b);
    }
    bv
}

/// O(n) stack-based matcher: `result[i]` is the position of the closing
/// parenthesis matching the opener at `i`, or `-1` if `bits[i]` is a closer.
pub fn brute_force_find_close(bits: &[bool]) -> Vec<i32> {
    let n = bits.len();
    let mut result = vec![-1i32; n];
    let mut stack = Vec::new();
    for (i, &b) in bits.iter().enumerate() {
        if b {
            stack.push(i);
        } else if let Some(open) = stack.pop() {
            result[open] = i as i32;
        }
    }
    result
}
