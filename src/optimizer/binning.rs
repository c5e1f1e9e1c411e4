//! Non-stream tile binning (§4.3.8): assigns every analyzed command to the
//! tiles it overlaps, with a circle-only fast path and a threaded path for
//! very large circle counts.

use crate::analysis::AnalyzedCommand;
use crate::batch::RenderBatch;
use crate::pool::binning_pool::BinningPool;
use crate::store::CommandType;

/// Above this many circles (and only circles, no tile stream supplied), the
/// binning pass uses the thread-local binning pool (§4.3.8, §5).
pub const THREADED_BINNING_THRESHOLD: usize = 50_000;

pub struct BinningResult {
    pub tile_offsets: Vec<u32>,
    pub tile_refs: Vec<u32>,
    pub tile_refs_are_circle_indices: bool,
}

/// Bins every valid `AnalyzedCommand` into tiles, building an exclusive
/// prefix-sum offsets array and a flat refs array. When `analyzed` is
/// non-empty and every valid entry is a `Circle`, uses the circle-only fast
/// path: `tile_refs` stores circle store indices instead of positions into
/// `analyzed`.
pub fn bin_tiles(
    batch: &RenderBatch,
    analyzed: &[AnalyzedCommand],
    tiles_x: u32,
    tiles_y: u32,
) -> BinningResult {
    let tile_count = (tiles_x as usize) * (tiles_y as usize);

    let circle_only = !analyzed.is_empty() && analyzed.iter().all(|a| !a.valid || a.kind == CommandType::Circle);

    if circle_only {
        let circle_count = analyzed.iter().filter(|a| a.valid).count();
        if circle_count > THREADED_BINNING_THRESHOLD {
            return bin_circles_threaded(analyzed, tiles_x, tiles_y, tile_count);
        }
        return bin_generic(analyzed, tiles_x, tiles_y, tile_count, true);
    }

    let _ = batch;
    bin_generic(analyzed, tiles_x, tiles_y, tile_count, false)
}

fn tile_span_iter(a: &AnalyzedCommand, tiles_x: u32, tiles_y: u32) -> impl Iterator<Item = usize> + '_ {
    let tx1 = a.tx1.min(tiles_x.saturating_sub(1));
    let ty1 = a.ty1.min(tiles_y.saturating_sub(1));
    (a.ty0..=ty1).flat_map(move |ty| (a.tx0..=tx1).map(move |tx| (ty * tiles_x + tx) as usize))
}

fn bin_generic(
    analyzed: &[AnalyzedCommand],
    tiles_x: u32,
    tiles_y: u32,
    tile_count: usize,
    circle_only: bool,
) -> BinningResult {
    let mut counts = vec![0u32; tile_count];
    for a in analyzed {
        if !a.valid {
            continue;
        }
        for t in tile_span_iter(a, tiles_x, tiles_y) {
            counts[t] += 1;
        }
    }

    let mut tile_offsets = Vec::with_capacity(tile_count + 1);
    let mut running = 0u32;
    tile_offsets.push(0);
    for c in &counts {
        running += c;
        tile_offsets.push(running);
    }

    let mut cursors = tile_offsets[..tile_count].to_vec();
    let mut tile_refs = vec![0u32; running as usize];
    for (pos, a) in analyzed.iter().enumerate() {
        if !a.valid {
            continue;
        }
        let ref_value = if circle_only { a.index } else { pos as u32 };
        for t in tile_span_iter(a, tiles_x, tiles_y) {
            tile_refs[cursors[t] as usize] = ref_value;
            cursors[t] += 1;
        }
    }

    BinningResult {
        tile_offsets,
        tile_refs,
        tile_refs_are_circle_indices: circle_only,
    }
}

/// Threaded two-pass binning for very large circle-only workloads (§4.3.8,
/// §5): each worker computes private per-tile counts, the counts are summed
/// into a global prefix sum, then each worker refills using cursors derived
/// from that prefix sum plus its own per-thread counts — so refs within a
/// tile land in `(thread index, local index)` order deterministically.
fn bin_circles_threaded(
    analyzed: &[AnalyzedCommand],
    tiles_x: u32,
    tiles_y: u32,
    tile_count: usize,
) -> BinningResult {
    let pool = BinningPool::get();
    let worker_count = pool.worker_count().max(1);

    let chunk_size = analyzed.len().div_ceil(worker_count);
    let chunks: Vec<&[AnalyzedCommand]> = analyzed.chunks(chunk_size.max(1)).collect();
    let n_chunks = chunks.len();

    let mut per_thread_counts: Vec<Vec<u32>> = vec![vec![0u32; tile_count]; n_chunks];
    let per_thread_counts_ptr = per_thread_counts.as_mut_ptr();

    pool.run(|worker_index| {
        if worker_index >= n_chunks {
            return;
        }
        // SAFETY: each worker_index owns a disjoint slot of per_thread_counts,
        // and `run` does not return until every worker has finished.
        let counts = unsafe { &mut *per_thread_counts_ptr.add(worker_index) };
        for a in chunks[worker_index] {
            if !a.valid {
                continue;
            }
            for t in tile_span_iter(a, tiles_x, tiles_y) {
                counts[t] += 1;
            }
        }
    });

    let mut global_counts = vec![0u32; tile_count];
    for counts in &per_thread_counts {
        for (g, c) in global_counts.iter_mut().zip(counts.iter()) {
            *g += c;
        }
    }

    let mut tile_offsets = Vec::with_capacity(tile_count + 1);
    let mut running = 0u32;
    tile_offsets.push(0);
    for c in &global_counts {
        running += c;
        tile_offsets.push(running);
    }

    // Per-thread starting cursor for each tile: the global prefix sum plus
    // the sum of every earlier thread's count for that tile.
    let mut thread_base = vec![vec![0u32; tile_count]; n_chunks];
    for t in 0..tile_count {
        let mut running_local = tile_offsets[t];
        for thread in 0..n_chunks {
            thread_base[thread][t] = running_local;
            running_local += per_thread_counts[thread][t];
        }
    }

    let mut tile_refs = vec![0u32; running as usize];
    let tile_refs_ptr = tile_refs.as_mut_ptr() as usize;
    let len = tile_refs.len();

    pool.run(|worker_index| {
        if worker_index >= n_chunks {
            return;
        }
        let mut cursors = thread_base[worker_index].clone();
        // SAFETY: disjoint index ranges per worker, computed from thread_base.
        let refs = unsafe { std::slice::from_raw_parts_mut(tile_refs_ptr as *mut u32, len) };
        for a in chunks[worker_index] {
            if !a.valid {
                continue;
            }
            for t in tile_span_iter(a, tiles_x, tiles_y) {
                refs[cursors[t] as usize] = a.index;
                cursors[t] += 1;
            }
        }
    });

    BinningResult {
        tile_offsets,
        tile_refs,
        tile_refs_are_circle_indices: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalyzedCommand;

    fn circle_at(order: u32, index: u32, tx: u32, ty: u32) -> AnalyzedCommand {
        AnalyzedCommand {
            kind: CommandType::Circle,
            index,
            order,
            x0: 0,
            y0: 0,
            x1: 1,
            y1: 1,
            clip: None,
            base_alpha: 255,
            tx0: tx,
            ty0: ty,
            tx1: tx,
            ty1: ty,
            valid: true,
        }
    }

    #[test]
    fn circle_only_workload_uses_circle_indices() {
        let batch = RenderBatch::default();
        let analyzed = vec![circle_at(0, 7, 0, 0), circle_at(1, 9, 1, 1)];
        let result = bin_tiles(&batch, &analyzed, 2, 2);
        assert!(result.tile_refs_are_circle_indices);
        assert_eq!(result.tile_refs, vec![7, 9]);
    }

    #[test]
    fn multi_tile_command_appears_in_every_overlapped_tile() {
        let batch = RenderBatch::default();
        let mut a = circle_at(0, 0, 0, 0);
        a.tx1 = 1;
        a.ty1 = 1;
        let analyzed = vec![a];
        let result = bin_tiles(&batch, &analyzed, 2, 2);
        assert_eq!(result.tile_offsets, vec![0, 1, 2, 3, 4]);
    }
}
