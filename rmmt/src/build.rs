//! Parallel construction of the rmMt (component C4).
//!
//! Three barrier-separated stages, matching spec §4.4 exactly:
//! 2.1 (parallel, disjoint per-worker chunk scan), 2.2 (sequential exclusive
//! prefix over worker boundaries, then a parallel fix-up), 2.3 (parallel
//! per-subtree summary aggregation, then a small sequential top).
//!
//! Disjointness of writes within a stage is expressed two ways, depending on
//! whether the work naturally splits into contiguous slices:
//! - Stages 2.1 and 2.2 use `rayon`'s `par_chunks_mut`, which is checked by
//!   the type system — no `unsafe` needed.
//! - Stage 2.3's subtree loop addresses array positions with arithmetic that
//!   the borrow checker cannot see is disjoint (different subtrees touch
//!   interleaved ranges across several tree levels), so it uses raw
//!   pointers behind a `Send + Sync` wrapper, same as the teacher's
//!   `SyncUnsafeCell` idiom for split-array parallel writes.

use crate::bits::BitVector;
use crate::error::BuildError;
use crate::layout::{CHUNK_BITS, RmMt, ceil_log2, derive_dimensions, left_child, right_child};
use std::time::Instant;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Build an [`RmMt`] from `bits` using `workers` worker threads.
///
/// `workers` corresponds to `P` in spec §4.4; pass
/// [`std::thread::available_parallelism`] (or similar) for a sensible
/// default. Construction either completes or returns
/// [`BuildError::InputTooSmall`] — it never panics on well-formed input.
pub fn build(bits: BitVector, workers: usize) -> Result<RmMt, BuildError> {
    let n = bits.len();
    if n <= CHUNK_BITS {
        return Err(BuildError::InputTooSmall {
            n,
            chunk_bits: CHUNK_BITS,
        });
    }
    let workers = workers.max(1);

    let (num_chunks, height, internal_nodes) = derive_dimensions(n);
    let total_nodes = internal_nodes + num_chunks;
    let cpt = num_chunks.div_ceil(workers);

    debug!(n, num_chunks, height, internal_nodes, workers, cpt, "building rmMt");

    let mut e = vec![0i16; num_chunks];
    let mut m = vec![0i16; total_nodes];
    let mut mx = vec![0i16; total_nodes];
    let mut nmin = vec![0u16; total_nodes];

    let t0 = Instant::now();
    scan_chunks(&bits, n, cpt, &mut e, &mut m[internal_nodes..], &mut mx[internal_nodes..], &mut nmin[internal_nodes..]);
    debug!(elapsed = ?t0.elapsed(), "stage 2.1: local chunk scan");

    let t0 = Instant::now();
    prefix_worker_boundaries(num_chunks, cpt, &mut e, &mut m[internal_nodes..], &mut mx[internal_nodes..]);
    debug!(elapsed = ?t0.elapsed(), "stage 2.2: worker-boundary prefix fix-up");

    let t0 = Instant::now();
    let p_level = ceil_log2(workers).min(height);
    aggregate_subtrees(height, p_level, total_nodes, &mut m, &mut mx, &mut nmin);
    aggregate_top(p_level, total_nodes, &mut m, &mut mx, &mut nmin);
    debug!(elapsed = ?t0.elapsed(), "stage 2.3: summary-tree aggregation");

    Ok(RmMt {
        bits,
        n,
        num_chunks,
        height,
        internal_nodes,
        e,
        m,
        mx,
        nmin,
    })
}

/// Stage 2.1: each worker scans its contiguous range of chunks bit-by-bit,
/// writing a worker-local running excess and each chunk's local min/max/count
/// of minima.
fn scan_chunks(
    bits: &BitVector,
    n: usize,
    cpt: usize,
    e: &mut [i16],
    m_leaves: &mut [i16],
    mx_leaves: &mut [i16],
    nmin_leaves: &mut [u16],
) {
    let worker = |t: usize, e_chunk: &mut [i16], m_chunk: &mut [i16], mx_chunk: &mut [i16], nmin_chunk: &mut [u16]| {
        let mut partial_excess: i16 = 0;
        for (c_local, (((e_slot, m_slot), mx_slot), nmin_slot)) in e_chunk
            .iter_mut()
            .zip(m_chunk.iter_mut())
            .zip(mx_chunk.iter_mut())
            .zip(nmin_chunk.iter_mut())
            .enumerate()
        {
            let c = t * cpt + c_local;
            let lo = c * CHUNK_BITS;
            let hi = (lo + CHUNK_BITS).min(n);

            let mut min_c: i16 = 0;
            let mut max_c: i16 = 0;
            let mut num_mins_c: u16 = 0;
            for (k, i) in (lo..hi).enumerate() {
                partial_excess += if bits.get(i) { 1 } else { -1 };
                if k == 0 {
                    min_c = partial_excess;
                    max_c = partial_excess;
                    num_mins_c = 1;
                } else {
                    if partial_excess < min_c {
                        min_c = partial_excess;
                        num_mins_c = 1;
                    } else if partial_excess == min_c {
                        num_mins_c += 1;
                    }
                    if partial_excess > max_c {
                        max_c = partial_excess;
                    }
                }
            }

            *e_slot = partial_excess;
            *m_slot = min_c;
            *mx_slot = max_c;
            *nmin_slot = num_mins_c;
        }
    };

    #[cfg(feature = "parallel")]
    {
        e.par_chunks_mut(cpt)
            .zip(m_leaves.par_chunks_mut(cpt))
            .zip(mx_leaves.par_chunks_mut(cpt))
            .zip(nmin_leaves.par_chunks_mut(cpt))
            .enumerate()
            .for_each(|(t, (((e_chunk, m_chunk), mx_chunk), nmin_chunk))| {
                worker(t, e_chunk, m_chunk, mx_chunk, nmin_chunk);
            });
    }
    #[cfg(not(feature = "parallel"))]
    {
        e.chunks_mut(cpt)
            .zip(m_leaves.chunks_mut(cpt))
            .zip(mx_leaves.chunks_mut(cpt))
            .zip(nmin_leaves.chunks_mut(cpt))
            .enumerate()
            .for_each(|(t, (((e_chunk, m_chunk), mx_chunk), nmin_chunk))| {
                worker(t, e_chunk, m_chunk, mx_chunk, nmin_chunk);
            });
    }
}

/// Stage 2.2: resolve the Open Question in spec §9 by computing a full
/// exclusive prefix over worker-boundary excess values first (sequential,
/// O(workers)), then adding each worker's delta to every chunk it owns
/// (parallel, disjoint ranges). This sidesteps the off-by-one in the `P−2`
/// loop bound that the source exhibits.
fn prefix_worker_boundaries(num_chunks: usize, cpt: usize, e: &mut [i16], m_leaves: &mut [i16], mx_leaves: &mut [i16]) {
    let num_workers = num_chunks.div_ceil(cpt);
    let mut prefix = vec![0i16; num_workers];
    for t in 1..num_workers {
        let prev_last = (t * cpt).min(num_chunks) - 1;
        prefix[t] = prefix[t - 1] + e[prev_last];
    }

    let apply = |t: usize, e_chunk: &mut [i16], m_chunk: &mut [i16], mx_chunk: &mut [i16]| {
        let delta = prefix[t];
        if delta == 0 {
            return;
        }
        for v in e_chunk.iter_mut() {
            *v += delta;
        }
        for v in m_chunk.iter_mut() {
            *v += delta;
        }
        for v in mx_chunk.iter_mut() {
            *v += delta;
        }
        // `n'` is shift-invariant and is left untouched, per spec §4.4.
    };

    #[cfg(feature = "parallel")]
    {
        e.par_chunks_mut(cpt)
            .zip(m_leaves.par_chunks_mut(cpt))
            .zip(mx_leaves.par_chunks_mut(cpt))
            .enumerate()
            .for_each(|(t, ((e_chunk, m_chunk), mx_chunk))| apply(t, e_chunk, m_chunk, mx_chunk));
    }
    #[cfg(not(feature = "parallel"))]
    {
        e.chunks_mut(cpt)
            .zip(m_leaves.chunks_mut(cpt))
            .zip(mx_leaves.chunks_mut(cpt))
            .enumerate()
            .for_each(|(t, ((e_chunk, m_chunk), mx_chunk))| apply(t, e_chunk, m_chunk, mx_chunk));
    }
}

/// Combine a node's current `(m, M, n)` with one more child's `(m, M, n)`,
/// per invariant 3. `dest = None` means this is the child's first
/// contribution to the node (plain copy).
#[inline]
fn combine(dest: Option<(i16, i16, u16)>, child: (i16, i16, u16)) -> (i16, i16, u16) {
    let Some((mut m, mut mx, mut nmin)) = dest else {
        return child;
    };
    let (cm, cmx, cnmin) = child;
    if cm < m {
        m = cm;
        nmin = cnmin;
    } else if cm == m {
        nmin += cnmin;
    }
    if cmx > mx {
        mx = cmx;
    }
    (m, mx, nmin)
}

/// A raw pointer wrapper asserting that the parallel writers using it touch
/// disjoint indices. Mirrors the teacher's `SyncUnsafeCell`-based pattern for
/// split-array parallel writes without per-element synchronization.
struct SyncMutPtr<T>(*mut T);

// SAFETY: callers only ever dereference `SyncMutPtr` at indices proven
// disjoint across threads by the subtree decomposition in
// `aggregate_subtrees`; no two threads write (or read-then-write) the same
// index.
unsafe impl<T> Send for SyncMutPtr<T> {}
// SAFETY: see above.
unsafe impl<T> Sync for SyncMutPtr<T> {}

impl<T> SyncMutPtr<T> {
    /// # Safety
    /// `offset` must be in bounds of the allocation the pointer was built
    /// from, and the resulting access must not race with another thread's
    /// access to the same index.
    #[inline]
    unsafe fn get(&self, offset: usize) -> T
    where
        T: Copy,
    {
        // SAFETY: forwarded to the caller's contract.
        unsafe { *self.0.add(offset) }
    }

    /// # Safety
    /// Same contract as [`Self::get`].
    #[inline]
    unsafe fn set(&self, offset: usize, value: T) {
        // SAFETY: forwarded to the caller's contract.
        unsafe { *self.0.add(offset) = value };
    }
}

/// Stage 2.3, parallel part: each of `num_subtrees = k^p_level` subtrees is
/// aggregated independently, bottom-up from `height-1` to `p_level`. No
/// degenerate-child skip here — ragged boundaries are naturally absorbed by
/// the `child < total_nodes` clamp, matching spec §4.4 precisely (the skip
/// rule applies only to the sequential top in [`aggregate_top`]).
fn aggregate_subtrees(height: u32, p_level: u32, total_nodes: usize, m: &mut [i16], mx: &mut [i16], nmin: &mut [u16]) {
    if height == p_level {
        return;
    }
    let num_subtrees = 1usize << p_level;

    let m_ptr = SyncMutPtr(m.as_mut_ptr());
    let mx_ptr = SyncMutPtr(mx.as_mut_ptr());
    let nmin_ptr = SyncMutPtr(nmin.as_mut_ptr());

    let body = |u: usize| {
        for lvl in (p_level..height).rev() {
            let num_curr_nodes = 1usize << (lvl - p_level);
            for node in 0..num_curr_nodes {
                let pos = (1usize << lvl) - 1 + node + u * num_curr_nodes;
                let lchild = left_child(pos);
                let rchild = right_child(pos);

                let mut dest: Option<(i16, i16, u16)> = None;
                for child in lchild..=rchild {
                    if child >= total_nodes {
                        continue;
                    }
                    // SAFETY: `child` is a descendant of subtree `u`'s root at
                    // depth `p_level`; distinct `u` own disjoint descendant
                    // sets, so no other thread touches `child` concurrently.
                    let childv = unsafe { (m_ptr.get(child), mx_ptr.get(child), nmin_ptr.get(child)) };
                    dest = Some(combine(dest, childv));
                }
                if let Some((dm, dmx, dnmin)) = dest {
                    // SAFETY: `pos` belongs exclusively to subtree `u`, by the
                    // same disjointness argument as above.
                    unsafe {
                        m_ptr.set(pos, dm);
                        mx_ptr.set(pos, dmx);
                        nmin_ptr.set(pos, dnmin);
                    }
                }
            }
        }
    };

    #[cfg(feature = "parallel")]
    (0..num_subtrees).into_par_iter().for_each(body);
    #[cfg(not(feature = "parallel"))]
    (0..num_subtrees).for_each(body);
}

/// Stage 2.3, sequential top: `O(p_level)` levels processed on a single
/// thread, with the degenerate-child skip rule (spec §4.4, Invariant 4).
fn aggregate_top(p_level: u32, total_nodes: usize, m: &mut [i16], mx: &mut [i16], nmin: &mut [u16]) {
    for lvl in (0..p_level).rev() {
        let num_curr_nodes = 1usize << lvl;
        for node in 0..num_curr_nodes {
            let pos = (1usize << lvl) - 1 + node;
            let lchild = left_child(pos);
            let rchild = right_child(pos);

            let mut dest: Option<(i16, i16, u16)> = None;
            for child in lchild..=rchild {
                if child >= total_nodes || m[child] == mx[child] {
                    continue;
                }
                dest = Some(combine(dest, (m[child], mx[child], nmin[child])));
            }
            if let Some((dm, dmx, dnmin)) = dest {
                m[pos] = dm;
                mx[pos] = dmx;
                nmin[pos] = dnmin;
            }
        }
    }
}
