//! Query engine (component C5): `sum`, `fwd_search`, `bwd_search`,
//! `find_close`/`find_open`, `rank_*`, `select_*`.
//!
//! All positions are 0-based bit indices. Out-of-range or unmatched queries
//! return the sentinel `-1` (spec §4.5 "Failure semantics") — never a panic,
//! never a retry.

use crate::layout::{CHUNK_BITS, RmMt, is_left_child, left_child, parent, right_sibling};
use crate::tables::TABLES;

impl RmMt {
    /// Excess (depth) at position `i`, or `-1` if `i >= len()`.
    pub fn sum(&self, i: usize) -> i32 {
        if i >= self.n {
            return -1;
        }
        self.sum_unchecked(i)
    }

    /// `sum`, assuming `i < self.n`.
    fn sum_unchecked(&self, i: usize) -> i32 {
        let c = i / CHUNK_BITS;
        let mut excess: i32 = if c > 0 { i32::from(self.e[c - 1]) } else { 0 };

        let chunk_start = c * CHUNK_BITS;
        let aligned_end = (i / 8) * 8;
        let mut pos = chunk_start;
        while pos < aligned_end {
            excess += TABLES.word_sum(self.bits.word8(pos / 8));
            pos += 8;
        }
        while pos <= i {
            excess += if self.bit(pos) { 1 } else { -1 };
            pos += 1;
        }
        excess
    }

    /// Scan `[start, end)` forward, starting from a known excess value at
    /// position `start - 1`, for the first position whose excess equals
    /// `target_minus_1`. Mixes bit-by-bit edge handling with byte-aligned
    /// `near_fwd_pos` lookups, per spec §4.5's "Intra-byte scan".
    fn scan_forward(&self, start: usize, end: usize, mut excess: i32, target_minus_1: i32) -> Option<usize> {
        let mut pos = start;

        while pos < end && pos % 8 != 0 {
            excess += if self.bit(pos) { 1 } else { -1 };
            if excess == target_minus_1 {
                return Some(pos);
            }
            pos += 1;
        }

        let aligned_end = (end / 8) * 8;
        while pos < aligned_end {
            let byte = self.bits.word8(pos / 8);
            let desired = target_minus_1 - excess;
            if let Some(offset) = TABLES.near_fwd_pos(desired, byte) {
                return Some(pos + offset);
            }
            excess += TABLES.word_sum(byte);
            pos += 8;
        }

        while pos < end {
            excess += if self.bit(pos) { 1 } else { -1 };
            if excess == target_minus_1 {
                return Some(pos);
            }
            pos += 1;
        }

        None
    }

    /// Smallest `j > i` with `excess(j) = excess(i) + d - 1`, or `-1` if none
    /// exists. Spec §4.5's three-case strategy: same leaf, right sibling
    /// leaf, then up-then-down through the summary tree.
    pub fn fwd_search(&self, i: usize, d: i32) -> i32 {
        if i >= self.n {
            return -1;
        }
        let ex_i = self.sum_unchecked(i);
        let target_minus_1 = ex_i + d - 1;

        let c = i / CHUNK_BITS;
        let (_, chunk_end) = self.chunk_range(c);

        // Case 1: same leaf.
        if let Some(j) = self.scan_forward(i + 1, chunk_end, ex_i, target_minus_1) {
            return j as i32;
        }

        // Case 2: right sibling leaf.
        if c % 2 == 0 && c + 1 < self.num_chunks {
            let sib_leaf = self.leaf_of_chunk(c + 1);
            if i32::from(self.m[sib_leaf]) <= target_minus_1 && target_minus_1 <= i32::from(self.mx[sib_leaf]) {
                let (sib_lo, sib_hi) = self.chunk_range(c + 1);
                let prior_excess = i32::from(self.e[c]);
                if let Some(j) = self.scan_forward(sib_lo, sib_hi, prior_excess, target_minus_1) {
                    return j as i32;
                }
            }
        }

        // Case 3: up then down through the summary tree.
        let mut node = parent(self.leaf_of_chunk(c));
        let mut found = false;
        loop {
            if node == 0 {
                break;
            }
            if is_left_child(node) {
                node = right_sibling(node);
                if i32::from(self.m[node]) <= target_minus_1 && target_minus_1 <= i32::from(self.mx[node]) {
                    found = true;
                    break;
                }
            }
            node = parent(node);
        }
        if !found {
            return -1;
        }

        while !self.is_leaf(node) {
            node = left_child(node);
            if !(i32::from(self.m[node]) <= target_minus_1 && target_minus_1 <= i32::from(self.mx[node])) {
                node = right_sibling(node);
                if i32::from(self.m[node]) > target_minus_1 || target_minus_1 > i32::from(self.mx[node]) {
                    return -1;
                }
            }
        }

        let chunk = self.chunk_of_leaf(node);
        let (lo, hi) = self.chunk_range(chunk);
        let prior_excess = if chunk > 0 { i32::from(self.e[chunk - 1]) } else { 0 };
        match self.scan_forward(lo, hi, prior_excess, target_minus_1) {
            Some(j) => j as i32,
            None => -1,
        }
    }

    /// Naive linear backward scan (spec §4.5: "reference implementation").
    /// Smallest-magnitude backward match for `excess(j) = excess(i) + d`.
    pub fn bwd_search(&self, i: usize, d: i32) -> i32 {
        if i >= self.n {
            return -1;
        }
        let target = self.sum_unchecked(i) + d;
        let mut excess = target;
        let mut j = i as i64;
        while j >= 0 {
            let pos = j as usize;
            excess += if self.bit(pos) { 1 } else { -1 };
            if excess == target {
                return pos as i32;
            }
            j -= 1;
        }
        -1
    }

    /// Position of the closing parenthesis matching the opening parenthesis
    /// at `i`, or `-1` if `B[i]` is not an opening parenthesis.
    pub fn find_close(&self, i: usize) -> i32 {
        if i >= self.n || !self.bit(i) {
            return -1;
        }
        self.fwd_search(i, 0)
    }

    /// Position of the opening parenthesis matching the closing parenthesis
    /// at `i`, or `-1` if `B[i]` is not a closing parenthesis.
    pub fn find_open(&self, i: usize) -> i32 {
        if i >= self.n || self.bit(i) {
            return -1;
        }
        self.bwd_search(i, 0)
    }

    /// Number of `1` bits in `B[0..=i]` (clamped to the last valid index).
    pub fn rank_1(&self, i: usize) -> i32 {
        let idx = i.min(self.n - 1);
        let s = i64::from(self.sum_unchecked(idx));
        ((i as i64 + 1 + s) / 2) as i32
    }

    /// Number of `0` bits in `B[0..=i]` (clamped to the last valid index).
    pub fn rank_0(&self, i: usize) -> i32 {
        let idx = i.min(self.n - 1);
        let s = i64::from(self.sum_unchecked(idx));
        ((i as i64 + 1 - s) / 2) as i32
    }

    /// Position of the `i`-th (1-based) `1` bit, or `-1` if there is none.
    pub fn select_1(&self, i: usize) -> i32 {
        let i = i as i64;
        let rlimit = 2 * i - 1;
        if rlimit < 0 {
            return -1;
        }
        let mut excess: i64 = 0;
        let mut d = rlimit;
        let mut j: i64 = 0;
        while j <= rlimit {
            if j as usize >= self.n {
                return -1;
            }
            excess += if self.bit(j as usize) { 1 } else { -1 };
            if excess == d {
                return j as i32;
            }
            j += 1;
            d -= 1;
        }
        -1
    }

    /// Position of the `i`-th (1-based) `0` bit, or `-1` if there is none.
    pub fn select_0(&self, i: usize) -> i32 {
        let i = i as i64;
        let llimit = 2 * i - 1;
        let mut excess: i64 = if llimit < 0 {
            0
        } else if (llimit as usize) < self.n {
            i64::from(self.sum_unchecked(llimit as usize))
        } else {
            return -1;
        };

        let rlimit = llimit + i64::from(self.mx[0]);
        let mut d: i64 = 0;
        let mut j = llimit + 1;
        while j <= rlimit {
            if excess == d {
                return (j - 1) as i32;
            }
            if j < 0 || j as usize >= self.n {
                return -1;
            }
            excess += if self.bit(j as usize) { 1 } else { -1 };
            d += 1;
            j += 1;
        }
        -1
    }
}
